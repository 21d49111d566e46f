use crate::classification::domain::subject_detector::{DetectorError, SubjectDetector};
use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// One scripted detector outcome.
#[derive(Clone, Debug)]
pub enum DetectorStep {
    Regions(Vec<Region>),
    Fail(DetectorError),
}

/// Detector that replays a scripted sequence of outcomes, cycling when the
/// script is exhausted. Used by the CLI simulator and by tests that need a
/// frame source with known behavior.
///
/// Scripted regions are restamped with the index of the frame being
/// detected, so back-references stay truthful across cycles.
pub struct ScriptedDetector {
    steps: Vec<DetectorStep>,
    cursor: usize,
}

impl ScriptedDetector {
    pub fn new(steps: Vec<DetectorStep>) -> Self {
        Self { steps, cursor: 0 }
    }

    /// Number of `detect` calls served so far.
    pub fn calls(&self) -> usize {
        self.cursor
    }
}

impl SubjectDetector for ScriptedDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Region>, DetectorError> {
        if self.steps.is_empty() {
            return Ok(Vec::new());
        }

        let step = self.steps[self.cursor % self.steps.len()].clone();
        self.cursor += 1;

        match step {
            DetectorStep::Regions(regions) => Ok(regions
                .into_iter()
                .map(|r| Region {
                    frame_index: frame.index(),
                    ..r
                })
                .collect()),
            DetectorStep::Fail(e) => Err(e),
        }
    }
}
