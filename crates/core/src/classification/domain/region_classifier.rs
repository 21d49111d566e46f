use std::time::Duration;

use thiserror::Error;

use crate::shared::constants::UNKNOWN_LABEL;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassifierError {
    #[error("classification model is unavailable")]
    ModelUnavailable,
    #[error("malformed classifier input: {0}")]
    MalformedInput(String),
}

/// One classifier verdict for a region, stamped with the timestamp of the
/// frame it was computed from.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassificationResult {
    pub label: String,
    pub confidence: f64,
    pub timestamp: Duration,
}

impl ClassificationResult {
    /// The verdict substituted when the classifier fails on a frame.
    pub fn unknown(timestamp: Duration) -> Self {
        Self {
            label: UNKNOWN_LABEL.to_string(),
            confidence: 0.0,
            timestamp,
        }
    }
}

/// Domain interface for labeling one detected region of a frame.
pub trait RegionClassifier: Send {
    fn classify(
        &mut self,
        frame: &Frame,
        region: &Region,
    ) -> Result<ClassificationResult, ClassifierError>;
}
