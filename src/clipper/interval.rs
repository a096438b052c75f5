//! Time interval merging.

/// A contiguous span of activity for one species within a window, in seconds.
///
/// Within one species' merged set, intervals are non-overlapping, separated
/// by more than the merge tolerance, and sorted ascending by start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergedInterval {
    /// Start offset in seconds, relative to the window start.
    pub start: f64,
    /// End offset in seconds.
    pub end: f64,
}

impl MergedInterval {
    /// Duration of the interval in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Merge overlapping or near-adjacent time ranges.
///
/// Single left-to-right sweep over the ranges sorted by start: a range whose
/// start is at most `tolerance` past the running interval's end extends it to
/// `max` of the two ends; anything further away opens a new interval.
/// Touching ranges (`start == prev_end`) always merge.
pub fn merge_intervals(mut ranges: Vec<(f64, f64)>, tolerance: f64) -> Vec<MergedInterval> {
    ranges.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let mut merged: Vec<MergedInterval> = Vec::new();
    for (start, end) in ranges {
        match merged.last_mut() {
            Some(last) if start <= last.end + tolerance => {
                last.end = last.end.max(end);
            }
            _ => merged.push(MergedInterval { start, end }),
        }
    }

    merged
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_empty() {
        assert!(merge_intervals(vec![], 1.0).is_empty());
    }

    #[test]
    fn test_merge_single_range() {
        let merged = merge_intervals(vec![(2.0, 5.0)], 1.0);
        assert_eq!(merged, vec![MergedInterval { start: 2.0, end: 5.0 }]);
    }

    #[test]
    fn test_merge_absorbs_sub_tolerance_gap() {
        let merged = merge_intervals(vec![(0.0, 2.0), (2.5, 4.0), (10.0, 12.0)], 1.0);
        assert_eq!(
            merged,
            vec![
                MergedInterval { start: 0.0, end: 4.0 },
                MergedInterval {
                    start: 10.0,
                    end: 12.0
                },
            ]
        );
    }

    #[test]
    fn test_merge_touching_ranges_always_merge() {
        // Zero gap merges even with zero tolerance.
        let merged = merge_intervals(vec![(0.0, 3.0), (3.0, 6.0)], 0.0);
        assert_eq!(merged, vec![MergedInterval { start: 0.0, end: 6.0 }]);
    }

    #[test]
    fn test_merge_contained_range_keeps_outer_end() {
        let merged = merge_intervals(vec![(0.0, 10.0), (2.0, 4.0)], 1.0);
        assert_eq!(merged, vec![MergedInterval { start: 0.0, end: 10.0 }]);
    }

    #[test]
    fn test_merge_sorts_unordered_input() {
        let merged = merge_intervals(vec![(6.0, 9.0), (0.0, 3.0)], 1.0);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].start, 0.0);
        assert_eq!(merged[1].start, 6.0);
    }

    #[test]
    fn test_merge_output_is_tolerance_separated() {
        let merged = merge_intervals(vec![(0.0, 1.0), (1.5, 2.0), (3.5, 4.0), (9.0, 9.5)], 1.0);
        for pair in merged.windows(2) {
            assert!(pair[1].start > pair[0].end + 1.0);
        }
    }
}
