//! cmy_code - three-plane color codes
//!
//! Text is split into thirds, each third becomes a framed, checksummed
//! packet on its own bit plane, and the planes are printed as cyan, magenta
//! and yellow ink on one RGBA raster. Decoding reverses that: optionally
//! locate the code by its finder glyphs, infer the module scale, threshold
//! each color component back into a plane and parse the packets.
//!
//! ```
//! let code = cmy_code::render("HELLO", None, 10).unwrap();
//! let decoded = cmy_code::decode(&code.image, 128).unwrap();
//! assert_eq!(decoded.text, "HELLO");
//! ```

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Environment-derived defaults and decode options
pub mod config;
/// Raster decoding (channel extraction, pipeline, robustness)
pub mod decoder;
/// Code detection (finder glyphs, localization, scale)
pub mod detector;
/// Raster encoding (channel matrices, rendering)
pub mod encoder;
/// Crate error type
pub mod error;
/// Grid geometry (reserved mask, capacity, bit placement)
pub mod layout;
/// Core data structures (GridSize, BitMatrix, Decoded, etc.)
pub mod models;
/// Channel packet framing and checksums
pub mod packet;
/// Image file helpers for the CLI and tests
pub mod tools;
/// Utility functions (grayscale, binarization)
pub mod utils;

pub use config::{DecodeOptions, LocalizeMode};
pub use decoder::{Decoder, RobustnessReport, Sensitivity, ThresholdRun};
pub use encoder::render;
pub use error::CmyError;
pub use models::{
    Channel, ChannelDecode, Decoded, DetectedRegion, GridSize, RenderedChannel, RenderedCode, ScaleInfo,
};
pub use packet::PacketIntegrity;

use image::RgbaImage;

/// Decode a raster at `threshold` with otherwise default options.
pub fn decode(image: &RgbaImage, threshold: u8) -> Result<Decoded, CmyError> {
    Decoder::with_options(DecodeOptions::default().with_threshold(threshold)).decode(image)
}

/// Decode a raw RGBA8 buffer (4 bytes per pixel, row-major).
///
/// # Arguments
/// * `data` - Raw RGBA bytes
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `threshold` - Channel value below which a sample reads as ink
pub fn decode_rgba(
    data: &[u8],
    width: usize,
    height: usize,
    threshold: u8,
) -> Result<Decoded, CmyError> {
    Decoder::with_options(DecodeOptions::default().with_threshold(threshold))
        .decode_rgba(data, width, height)
}

/// Decode at every robustness threshold with default options.
pub fn test_robustness(image: &RgbaImage) -> RobustnessReport {
    Decoder::new().test_robustness(image)
}
