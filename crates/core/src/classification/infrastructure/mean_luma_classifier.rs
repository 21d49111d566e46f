use crate::classification::domain::region_classifier::{
    ClassificationResult, ClassifierError, RegionClassifier,
};
use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Rec. 601 luma weights.
const LUMA_R: f64 = 0.299;
const LUMA_G: f64 = 0.587;
const LUMA_B: f64 = 0.114;

/// Pixel-statistics classifier: labels a region by the mean luminance of
/// its crop against a threshold.
///
/// A deterministic reference backend for wiring and testing the pipeline
/// without a trained model; real deployments substitute an ML-backed
/// `RegionClassifier` behind the same seam.
pub struct MeanLumaClassifier {
    threshold: f64,
    bright_label: String,
    dark_label: String,
}

impl MeanLumaClassifier {
    /// `threshold` is in luma units (0.0–255.0); crops at or above it get
    /// `bright_label`, the rest `dark_label`.
    pub fn new(threshold: f64, bright_label: &str, dark_label: &str) -> Self {
        Self {
            threshold,
            bright_label: bright_label.to_string(),
            dark_label: dark_label.to_string(),
        }
    }

    fn mean_luma(&self, frame: &Frame, region: &Region) -> Result<f64, ClassifierError> {
        let (x0, y0, w, h) = region.pixel_bounds(frame.width(), frame.height());
        if w == 0 || h == 0 {
            return Err(ClassifierError::MalformedInput(format!(
                "region maps to an empty crop of frame {}",
                region.frame_index
            )));
        }

        let pixels = frame.as_ndarray();
        let mut sum = 0.0;
        for row in y0..y0 + h {
            for col in x0..x0 + w {
                sum += LUMA_R * pixels[[row, col, 0]] as f64
                    + LUMA_G * pixels[[row, col, 1]] as f64
                    + LUMA_B * pixels[[row, col, 2]] as f64;
            }
        }
        Ok(sum / (w * h) as f64)
    }
}

impl RegionClassifier for MeanLumaClassifier {
    fn classify(
        &mut self,
        frame: &Frame,
        region: &Region,
    ) -> Result<ClassificationResult, ClassifierError> {
        if frame.channels() != 3 {
            return Err(ClassifierError::MalformedInput(format!(
                "expected 3-channel RGB frames, got {} channels",
                frame.channels()
            )));
        }

        let luma = self.mean_luma(frame, region)?;
        let bright = luma >= self.threshold;

        let label = if bright {
            self.bright_label.clone()
        } else {
            self.dark_label.clone()
        };

        // Confidence scales with distance from the threshold, saturating at
        // the far end of the luma range.
        let span = if bright {
            255.0 - self.threshold
        } else {
            self.threshold
        };
        let confidence = if span == 0.0 {
            1.0
        } else {
            ((luma - self.threshold).abs() / span).min(1.0)
        };

        Ok(ClassificationResult {
            label,
            confidence,
            timestamp: frame.timestamp(),
        })
    }
}
