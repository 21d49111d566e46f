use std::collections::HashMap;
use std::collections::VecDeque;

use crate::classification::domain::region_classifier::ClassificationResult;

pub const DEFAULT_WINDOW_CAPACITY: usize = 3;

/// Bounded FIFO of recent classifications, used to debounce label flicker.
///
/// The smoothed label is the mode of the window; ties go to the most
/// recently pushed label among the tied set. Capacity is fixed at
/// construction so debounce aggressiveness is tunable without code change.
pub struct StabilityWindow {
    capacity: usize,
    entries: VecDeque<ClassificationResult>,
}

impl StabilityWindow {
    pub fn new(capacity: usize) -> Result<Self, &'static str> {
        if capacity < 1 {
            return Err("window capacity must be >= 1");
        }
        Ok(Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        })
    }

    /// Appends a result, evicting the oldest entry beyond capacity.
    pub fn push(&mut self, result: ClassificationResult) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(result);
    }

    /// The entry whose label wins the majority vote, or `None` when the
    /// window is empty. The returned entry is the most recent one bearing
    /// the winning label, so its confidence and timestamp are current.
    pub fn smoothed(&self) -> Option<&ClassificationResult> {
        if self.entries.is_empty() {
            return None;
        }

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for entry in &self.entries {
            *counts.entry(entry.label.as_str()).or_default() += 1;
        }

        // Scanning oldest-to-newest and replacing on >= count means a tied
        // label is settled by whichever entry was pushed latest.
        let mut winner = 0;
        let mut winner_count = 0;
        for (idx, entry) in self.entries.iter().enumerate() {
            let count = counts[entry.label.as_str()];
            if count >= winner_count {
                winner_count = count;
                winner = idx;
            }
        }

        self.entries.get(winner)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClassificationResult> {
        self.entries.iter()
    }
}
