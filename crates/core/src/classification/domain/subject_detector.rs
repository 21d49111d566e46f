use thiserror::Error;

use crate::shared::frame::Frame;
use crate::shared::region::Region;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DetectorError {
    #[error("frame carried no usable image data")]
    NoFrameData,
    #[error("detection device failed: {0}")]
    DeviceFailure(String),
}

/// Domain interface for subject detection.
///
/// Returns every region of interest found in the frame; an empty result
/// means "no subject in view" and is not an error. Implementations may be
/// stateful (e.g., throttling or tracking across frames), hence `&mut self`.
pub trait SubjectDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Region>, DetectorError>;
}
