use std::time::Duration;

/// Whether the pipeline currently has a subject in view.
///
/// Transitions are driven by detector output each frame: zero regions
/// moves to `Idle`, one or more to `Tracking`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Tracking,
}

/// The structured result delivered to the sink for each processed frame.
///
/// `alert` is set when the smoothed label matches the configured alert
/// label (e.g. the class a UI renders in red).
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineOutput {
    pub state: PipelineState,
    pub label: String,
    pub confidence: f64,
    pub timestamp: Duration,
    pub alert: bool,
}
