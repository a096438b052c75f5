//! Detection grouping and consolidation.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::{debug, error};

use crate::clipper::{ClipExtractor, ClipWriter, merge_intervals};
use crate::inference::RawDetection;

/// One consolidated detection event for a species within a window.
#[derive(Debug, Clone)]
pub struct Detection {
    /// Species common name.
    pub common_name: String,
    /// Species scientific name.
    pub scientific_name: String,
    /// Confidence of the representative raw hit.
    pub confidence: f32,
    /// Classifier label of the representative raw hit.
    pub label: String,
    /// Path to the evidence clip, if a clip directory is configured and the
    /// clip was written successfully.
    pub clip_path: Option<PathBuf>,
    /// First merged interval's start, in window-relative seconds.
    pub start_time: f64,
    /// Last merged interval's end, in window-relative seconds.
    pub end_time: f64,
}

/// Raw hits accumulated for one species before consolidation.
struct SpeciesGroup {
    ranges: Vec<(f64, f64)>,
    representative: RawDetection,
}

/// Consolidates one window's raw classifier hits into per-species detections.
pub struct DetectionGrouper {
    merge_tolerance: f64,
    extractor: ClipExtractor,
    clip_writer: Option<ClipWriter>,
    sample_rate: u32,
}

impl DetectionGrouper {
    /// Create a grouper.
    ///
    /// `clip_writer` is `None` when no clip directory is configured; emitted
    /// detections then carry no clip path.
    #[must_use]
    pub fn new(merge_tolerance: f64, sample_rate: u32, clip_writer: Option<ClipWriter>) -> Self {
        Self {
            merge_tolerance,
            extractor: ClipExtractor::new(sample_rate),
            clip_writer,
            sample_rate,
        }
    }

    /// Consolidate one window's raw detections.
    ///
    /// Emits at most one [`Detection`] per distinct common name, in
    /// first-seen order. The representative fields (confidence, label,
    /// scientific name) come from the maximum-confidence raw hit of the
    /// group. A failed clip write is logged and the detection is emitted
    /// with `clip_path = None`; the record itself is never lost to a clip
    /// problem.
    pub fn group_window(&self, raw: Vec<RawDetection>, window: &[i16]) -> Vec<Detection> {
        if raw.is_empty() {
            return Vec::new();
        }

        // Partition by common name, preserving first-seen species order.
        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, SpeciesGroup> = HashMap::new();

        for det in raw {
            let range = (det.start, det.end);
            match groups.get_mut(&det.common_name) {
                Some(group) => {
                    group.ranges.push(range);
                    if det.confidence > group.representative.confidence {
                        group.representative = det;
                    }
                }
                None => {
                    order.push(det.common_name.clone());
                    groups.insert(
                        det.common_name.clone(),
                        SpeciesGroup {
                            ranges: vec![range],
                            representative: det,
                        },
                    );
                }
            }
        }

        let mut detections = Vec::with_capacity(order.len());
        for common_name in order {
            let Some(group) = groups.remove(&common_name) else {
                continue;
            };

            let merged = merge_intervals(group.ranges, self.merge_tolerance);
            let (Some(first), Some(last)) = (merged.first(), merged.last()) else {
                continue;
            };
            let (start_time, end_time) = (first.start, last.end);

            let clip_path = self.clip_writer.as_ref().and_then(|writer| {
                match self
                    .extractor
                    .extract(window, &merged)
                    .and_then(|clip| writer.write_clip(&clip, self.sample_rate, &common_name))
                {
                    Ok(path) => Some(path),
                    Err(e) => {
                        error!("failed to write clip for '{common_name}': {e}");
                        None
                    }
                }
            });

            let rep = group.representative;
            detections.push(Detection {
                common_name,
                scientific_name: rep.scientific_name,
                confidence: rep.confidence,
                label: rep.label,
                clip_path,
                start_time,
                end_time,
            });
        }

        debug!("consolidated window into {} detection(s)", detections.len());
        detections
    }
}
