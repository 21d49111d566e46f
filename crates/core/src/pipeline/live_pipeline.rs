use thiserror::Error;

use crate::classification::domain::stability_window::DEFAULT_WINDOW_CAPACITY;
use crate::shared::frame::Frame;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("pipeline is already running")]
    AlreadyRunning,
    #[error("pipeline is not running")]
    NotStarted,
    #[error("pipeline worker panicked; components were lost")]
    WorkerPanicked,
}

/// Tuning knobs for a pipeline session.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Stability window capacity (≥ 1); larger debounces harder.
    pub window_capacity: usize,
    /// Smoothed label that should set the `alert` flag on outputs.
    pub alert_label: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            alert_label: None,
        }
    }
}

/// Abstracts the live frame-intake pipeline the frame source talks to.
///
/// This is a port (application-layer interface); infrastructure provides
/// the concrete threading model. Contract:
/// - `start` on a running pipeline fails with `AlreadyRunning`.
/// - `submit_frame` never blocks the caller; while a pass is in flight
///   new frames are dropped, and outside a running session it fails with
///   `NotStarted`.
/// - `stop` halts intake and returns only when no further sink deliveries
///   can occur; stopping an idle pipeline is a no-op.
pub trait LivePipeline: Send + Sync {
    fn start(&self) -> Result<(), PipelineError>;
    fn submit_frame(&self, frame: Frame) -> Result<(), PipelineError>;
    fn stop(&self) -> Result<(), PipelineError>;
}
