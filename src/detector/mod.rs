//! Code detection in arbitrary rasters
//!
//! - Finder glyph detection (1:1:3:1:1 window scan)
//! - Localization of the three glyphs and square cropping
//! - Module scale and grid size inference from raster dimensions

/// Finder glyph scanning over a binarized raster
pub mod finder;
/// Finder role assignment and region cropping
pub mod localize;
/// Scale and grid size inference
pub mod scale;

pub use finder::{FinderDetector, FinderPattern};
pub use localize::{crop, find_patterns, locate};
pub(crate) use scale::glyphs_match;
pub use scale::{detect_scale, exact_frame, exact_frames, manual_scale, resolve_scale};
