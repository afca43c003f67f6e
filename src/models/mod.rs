//! Shared data types

/// Render and decode results
pub mod code;
/// Grid sizes, channels and scale
pub mod grid;
/// Packed bit grid
pub mod matrix;
/// Pixel-space point
pub mod point;

pub use code::{ChannelDecode, Decoded, DetectedRegion, RenderedChannel, RenderedCode};
pub use grid::{Channel, GridSize, MAX_SCALE, ScaleInfo};
pub use matrix::BitMatrix;
pub use point::Point;
