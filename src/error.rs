use thiserror::Error;

/// Errors surfaced by the encode and decode entry points.
///
/// Checksum or marker mismatches inside a channel are never reported here;
/// they show up as [`PacketIntegrity`](crate::packet::PacketIntegrity) on the
/// decoded channel instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CmyError {
    /// Grid size outside the legal sequence
    #[error("grid size {0} is not one of 21, 25, .., 77")]
    InvalidGridSize(usize),

    /// Pixels per module out of range
    #[error("module scale {0} is outside 1..={max}", max = crate::models::MAX_SCALE)]
    InvalidScale(u32),

    /// Raster with no pixels
    #[error("raster has zero width or height")]
    EmptyRaster,

    /// Raw buffer length differs from `width * height * 4`
    #[error("raster buffer holds {actual} bytes, expected {expected} for RGBA")]
    RasterSizeMismatch {
        /// Bytes the dimensions call for
        expected: usize,
        /// Bytes supplied
        actual: usize,
    },

    /// Dimensions overflow the pixel buffer or `u32`
    #[error("raster dimensions {width}x{height} do not fit in memory")]
    DimensionTooLarge {
        /// Requested width
        width: usize,
        /// Requested height
        height: usize,
    },
}
