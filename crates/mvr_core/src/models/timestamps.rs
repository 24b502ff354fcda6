//! Per-frame sync-clock timestamp arrays.

use serde::Serialize;

/// Sync-clock timestamps for one video, one entry per physical frame.
///
/// Entries are `NaN` where no sync-clock timestamp is attributable to the
/// frame: always the leading metadata frame, and (in uncorrected diagnostic
/// output) frames the timing system never registered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameTimestampArray {
    times: Vec<f64>,
}

impl FrameTimestampArray {
    /// Wrap a reconstructed timestamp vector.
    pub fn from_times(times: Vec<f64>) -> Self {
        Self { times }
    }

    /// Number of entries (equals the video frame count when corrected).
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Whether the array has no entries at all.
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Timestamp for a frame, if the index is in range.
    pub fn get(&self, index: usize) -> Option<f64> {
        self.times.get(index).copied()
    }

    /// The raw entries.
    pub fn as_slice(&self) -> &[f64] {
        &self.times
    }

    /// Number of frames that carry a real sync-derived timestamp.
    pub fn num_timestamped(&self) -> usize {
        self.times.iter().filter(|t| !t.is_nan()).count()
    }

    /// Whether no frame carries a real timestamp.
    pub fn all_nan(&self) -> bool {
        self.num_timestamped() == 0
    }

    /// Index of the frame whose timestamp is closest to `target`, ignoring
    /// `NaN` entries. `None` when no frame carries a timestamp.
    pub fn closest_index(&self, target: f64) -> Option<usize> {
        self.times
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.is_nan())
            .min_by(|(_, a), (_, b)| {
                (*a - target)
                    .abs()
                    .partial_cmp(&(*b - target).abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(index, _)| index)
    }
}

impl std::ops::Index<usize> for FrameTimestampArray {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.times[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_real_timestamps() {
        let times = FrameTimestampArray::from_times(vec![f64::NAN, 1.0, 2.0, f64::NAN]);
        assert_eq!(times.len(), 4);
        assert_eq!(times.num_timestamped(), 2);
        assert!(!times.all_nan());
    }

    #[test]
    fn all_nan_detected() {
        let times = FrameTimestampArray::from_times(vec![f64::NAN, f64::NAN]);
        assert!(times.all_nan());
        assert_eq!(times.closest_index(1.0), None);
    }

    #[test]
    fn closest_index_skips_nan_entries() {
        let times = FrameTimestampArray::from_times(vec![f64::NAN, 10.0, 10.5, 11.0]);
        assert_eq!(times.closest_index(10.6), Some(2));
        assert_eq!(times.closest_index(0.0), Some(1));
    }

    #[test]
    fn empty_array_has_no_closest_index() {
        let times = FrameTimestampArray::from_times(vec![]);
        assert!(times.is_empty());
        assert_eq!(times.closest_index(0.0), None);
    }
}
