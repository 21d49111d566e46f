use std::time::Instant;

use crate::classification::domain::region_classifier::{ClassificationResult, RegionClassifier};
use crate::classification::domain::stability_window::StabilityWindow;
use crate::classification::domain::subject_detector::SubjectDetector;
use crate::pipeline::live_pipeline::PipelineConfig;
use crate::pipeline::output::{PipelineOutput, PipelineState};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::constants::NO_SUBJECT_LABEL;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// What one pipeline pass produced.
#[derive(Clone, Debug, PartialEq)]
pub enum FrameOutcome {
    /// A well-formed result to deliver to the sink.
    Emitted(PipelineOutput),
    /// The frame was skipped (detector failure); nothing is delivered and
    /// no state changed.
    Skipped,
}

/// The per-frame control flow: detect → select best region → classify →
/// smooth → structured output.
///
/// Owns the only long-lived mutable inference state (Idle/Tracking and the
/// stability window). Single-writer: exactly one caller drives `process`,
/// which is what the threaded pipeline's worker guarantees.
pub struct LabelFrameUseCase {
    detector: Box<dyn SubjectDetector>,
    classifier: Box<dyn RegionClassifier>,
    window: StabilityWindow,
    state: PipelineState,
    alert_label: Option<String>,
    logger: Box<dyn PipelineLogger>,
}

impl LabelFrameUseCase {
    pub fn new(
        detector: Box<dyn SubjectDetector>,
        classifier: Box<dyn RegionClassifier>,
        logger: Box<dyn PipelineLogger>,
        config: &PipelineConfig,
    ) -> Result<Self, &'static str> {
        Ok(Self {
            detector,
            classifier,
            window: StabilityWindow::new(config.window_capacity)?,
            state: PipelineState::Idle,
            alert_label: config.alert_label.clone(),
            logger,
        })
    }

    /// Runs one inference pass over `frame`.
    ///
    /// Detector errors skip the frame. Classifier errors degrade to an
    /// "unknown" classification that enters the window like any other
    /// label, so an occasional gap is outvoted by a consistent window.
    pub fn process(&mut self, frame: &Frame) -> FrameOutcome {
        let detect_started = Instant::now();
        let regions = match self.detector.detect(frame) {
            Ok(regions) => regions,
            Err(e) => {
                log::warn!("detector failed on frame {}: {e}", frame.index());
                return FrameOutcome::Skipped;
            }
        };
        self.logger
            .timing("detect", detect_started.elapsed().as_secs_f64() * 1000.0);
        self.logger.metric("regions", regions.len() as f64);

        let Some(best) = Region::best_of(&regions) else {
            if self.state == PipelineState::Tracking {
                self.logger.info("subject lost");
            }
            self.state = PipelineState::Idle;
            self.window.clear();
            return FrameOutcome::Emitted(PipelineOutput {
                state: PipelineState::Idle,
                label: NO_SUBJECT_LABEL.to_string(),
                confidence: 0.0,
                timestamp: frame.timestamp(),
                alert: false,
            });
        };

        let classify_started = Instant::now();
        let classification = match self.classifier.classify(frame, best) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("classifier failed on frame {}: {e}", frame.index());
                ClassificationResult::unknown(frame.timestamp())
            }
        };
        self.logger.timing(
            "classify",
            classify_started.elapsed().as_secs_f64() * 1000.0,
        );

        if self.state == PipelineState::Idle {
            self.logger.info("subject acquired");
        }
        self.state = PipelineState::Tracking;
        self.window.push(classification);

        let smoothed = self
            .window
            .smoothed()
            .expect("window is non-empty after push");
        let alert = self.alert_label.as_deref() == Some(smoothed.label.as_str());

        FrameOutcome::Emitted(PipelineOutput {
            state: PipelineState::Tracking,
            label: smoothed.label.clone(),
            confidence: smoothed.confidence,
            timestamp: frame.timestamp(),
            alert,
        })
    }

    /// Returns to a fresh session: Idle, empty window.
    pub fn reset(&mut self) {
        self.state = PipelineState::Idle;
        self.window.clear();
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn window(&self) -> &StabilityWindow {
        &self.window
    }

    pub fn log_summary(&self) {
        self.logger.summary();
    }
}
