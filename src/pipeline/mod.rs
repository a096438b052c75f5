//! Continuous sampling pipeline.

mod sampler;

pub use sampler::{SamplingLoop, SamplingOptions};
