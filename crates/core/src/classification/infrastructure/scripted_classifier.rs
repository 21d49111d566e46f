use crate::classification::domain::region_classifier::{
    ClassificationResult, ClassifierError, RegionClassifier,
};
use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// One scripted classifier outcome: a `(label, confidence)` verdict or a
/// typed failure.
pub type ClassifierStep = Result<(String, f64), ClassifierError>;

/// Classifier that replays a scripted sequence of verdicts, cycling when
/// the script is exhausted. The cursor advances per `classify` call, not
/// per frame: the pipeline only consults the classifier for frames that
/// produced a region.
pub struct ScriptedClassifier {
    steps: Vec<ClassifierStep>,
    cursor: usize,
}

impl ScriptedClassifier {
    pub fn new(steps: Vec<ClassifierStep>) -> Self {
        Self { steps, cursor: 0 }
    }

    pub fn calls(&self) -> usize {
        self.cursor
    }
}

impl RegionClassifier for ScriptedClassifier {
    fn classify(
        &mut self,
        frame: &Frame,
        _region: &Region,
    ) -> Result<ClassificationResult, ClassifierError> {
        if self.steps.is_empty() {
            return Err(ClassifierError::ModelUnavailable);
        }

        let step = self.steps[self.cursor % self.steps.len()].clone();
        self.cursor += 1;

        step.map(|(label, confidence)| ClassificationResult {
            label,
            confidence,
            timestamp: frame.timestamp(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::shared::frame::Orientation;

    fn frame(millis: u64) -> Frame {
        Frame::new(
            vec![0u8; 12],
            2,
            2,
            3,
            Duration::from_millis(millis),
            Orientation::Up,
            0,
        )
    }

    fn region() -> Region {
        Region {
            x: 0.1,
            y: 0.1,
            width: 0.5,
            height: 0.5,
            confidence: 0.9,
            frame_index: 0,
        }
    }

    #[test]
    fn test_empty_script_reports_model_unavailable() {
        let mut classifier = ScriptedClassifier::new(vec![]);
        assert_eq!(
            classifier.classify(&frame(0), &region()),
            Err(ClassifierError::ModelUnavailable)
        );
    }

    #[test]
    fn test_verdicts_replay_and_cycle() {
        let mut classifier = ScriptedClassifier::new(vec![
            Ok(("mask".to_string(), 0.95)),
            Ok(("no-mask".to_string(), 0.6)),
        ]);

        assert_eq!(classifier.classify(&frame(0), &region()).unwrap().label, "mask");
        assert_eq!(
            classifier.classify(&frame(1), &region()).unwrap().label,
            "no-mask"
        );
        assert_eq!(classifier.classify(&frame(2), &region()).unwrap().label, "mask");
        assert_eq!(classifier.calls(), 3);
    }

    #[test]
    fn test_result_stamped_with_frame_timestamp() {
        let mut classifier = ScriptedClassifier::new(vec![Ok(("mask".to_string(), 0.9))]);
        let result = classifier.classify(&frame(125), &region()).unwrap();
        assert_eq!(result.timestamp, Duration::from_millis(125));
    }

    #[test]
    fn test_fail_step_returns_error() {
        let mut classifier = ScriptedClassifier::new(vec![Err(
            ClassifierError::MalformedInput("empty crop".into()),
        )]);
        assert_eq!(
            classifier.classify(&frame(0), &region()),
            Err(ClassifierError::MalformedInput("empty crop".into()))
        );
    }
}
