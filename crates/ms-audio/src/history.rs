use std::collections::VecDeque;

use ms_core::features::AudioFeatures;

/// Bounded FIFO of recent feature sets, averaged for a smoothed view.
///
/// Oldest entry is evicted on overflow (VecDeque for O(1) pop_front).
///
/// # Example
/// ```
/// use ms_audio::history::FeatureHistory;
/// use ms_core::features::AudioFeatures;
///
/// let mut history = FeatureHistory::new(2);
/// assert!(history.average().is_none());
/// history.push(AudioFeatures { energy: 0.2, ..AudioFeatures::default() });
/// history.push(AudioFeatures { energy: 0.4, ..AudioFeatures::default() });
/// assert!((history.average().unwrap().energy - 0.3).abs() < 1e-6);
/// ```
#[derive(Clone, Debug)]
pub struct FeatureHistory {
    entries: VecDeque<AudioFeatures>,
    capacity: usize,
}

impl FeatureHistory {
    /// Create an empty history holding at most `capacity` entries (min 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append `features`, returning the evicted oldest entry if full.
    pub fn push(&mut self, features: AudioFeatures) -> Option<AudioFeatures> {
        let evicted = if self.entries.len() == self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(features);
        evicted
    }

    /// Field-wise arithmetic mean of the entries; `None` when empty.
    #[must_use]
    pub fn average(&self) -> Option<AudioFeatures> {
        AudioFeatures::mean(self.entries.iter())
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when no entry is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
