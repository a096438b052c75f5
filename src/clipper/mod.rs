//! Detection consolidation and evidence clip extraction.
//!
//! Turns one window's raw classifier hits into at most one consolidated
//! detection per species, merging overlapping time ranges and writing a
//! single contiguous evidence clip per species.

mod extractor;
mod grouper;
mod interval;
mod writer;

pub use extractor::ClipExtractor;
pub use grouper::{Detection, DetectionGrouper};
pub use interval::{MergedInterval, merge_intervals};
pub use writer::ClipWriter;
