//! Decoding: raster to channel planes to text
//!
//! - Channel sampling at the inferred module scale
//! - The localize, extract, parse pipeline
//! - Multi-threshold robustness reports

/// Channel plane sampling
pub mod extract;
/// Top-level decode pipeline
pub mod pipeline;
/// Multi-threshold robustness checking
pub mod robustness;

pub use extract::{ExtractedChannels, extract_channels};
pub use pipeline::{Decoder, raster_from_rgba};
pub use robustness::{ROBUSTNESS_THRESHOLDS, RobustnessReport, Sensitivity, ThresholdRun};
