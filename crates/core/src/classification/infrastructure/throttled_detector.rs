use crate::classification::domain::subject_detector::{DetectorError, SubjectDetector};
use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Decorator that runs detection every N frames, reusing the last regions
/// in between. Halves (or better) detector load on live streams where the
/// subject moves little between adjacent frames.
///
/// Reused regions are restamped with the current frame's index. A failed
/// scheduled detection does not advance the counter, so the next frame
/// retries instead of coasting on stale regions for a full interval.
pub struct ThrottledDetector {
    inner: Box<dyn SubjectDetector>,
    interval: usize,
    frame_count: usize,
    last_regions: Vec<Region>,
}

impl ThrottledDetector {
    pub fn new(inner: Box<dyn SubjectDetector>, interval: usize) -> Result<Self, &'static str> {
        if interval < 1 {
            return Err("interval must be >= 1");
        }
        Ok(Self {
            inner,
            interval,
            frame_count: 0,
            last_regions: Vec::new(),
        })
    }
}

impl SubjectDetector for ThrottledDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Region>, DetectorError> {
        if self.frame_count % self.interval == 0 {
            self.last_regions = self.inner.detect(frame)?;
        }
        self.frame_count += 1;

        Ok(self
            .last_regions
            .iter()
            .map(|r| Region {
                frame_index: frame.index(),
                ..r.clone()
            })
            .collect())
    }
}
