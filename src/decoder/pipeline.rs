use std::borrow::Cow;

use image::RgbaImage;
use log::debug;

use super::extract::extract_channels;
use super::robustness::{RobustnessReport, run_thresholds};
use crate::config::{DecodeOptions, LocalizeMode};
use crate::detector::{crop, exact_frames, glyphs_match, locate};
use crate::error::CmyError;
use crate::models::Decoded;

/// Decoder with fixed options.
///
/// ```no_run
/// use cmy_code::{Decoder, DecodeOptions, LocalizeMode};
///
/// let decoder = Decoder::with_options(DecodeOptions {
///     localize: LocalizeMode::Never,
///     ..DecodeOptions::default()
/// });
/// let image = image::open("code.png").unwrap().to_rgba8();
/// let decoded = decoder.decode(&image).unwrap();
/// println!("{}", decoded.text);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Decoder {
    options: DecodeOptions,
}

impl Decoder {
    /// Decoder with environment-derived defaults
    pub fn new() -> Self {
        Self::with_options(DecodeOptions::default())
    }

    /// Decoder with explicit options
    pub fn with_options(options: DecodeOptions) -> Self {
        Self { options }
    }

    /// Options every decode runs with
    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Decode a raster.
    ///
    /// Fails only on rasters the pipeline cannot sample at all. Packet damage
    /// is reported per channel through
    /// [`ChannelDecode::integrity`](crate::models::ChannelDecode), never as an
    /// error.
    pub fn decode(&self, image: &RgbaImage) -> Result<Decoded, CmyError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(CmyError::EmptyRaster);
        }

        let region = match self.options.localize {
            LocalizeMode::Never => None,
            LocalizeMode::Auto if is_code_frame(image) => {
                debug!("{}x{} is a whole code frame, skipping localization", width, height);
                None
            }
            LocalizeMode::Auto | LocalizeMode::Always => locate(image),
        };

        let source: Cow<'_, RgbaImage> = match &region {
            Some(region) => Cow::Owned(crop(image, region)),
            None => {
                debug!("decoding whole {}x{} raster", width, height);
                Cow::Borrowed(image)
            }
        };

        let extracted = extract_channels(&source, self.options.threshold, self.options.auto_scale);
        let channels = extracted.parse();

        let mut text: String = channels.iter().map(|c| c.text.as_str()).collect();
        let kept = text.trim_end_matches('\0').len();
        text.truncate(kept);

        Ok(Decoded {
            bytes_decoded: text.len(),
            text,
            scale: extracted.info.scale,
            size: extracted.info.size,
            was_localized: region.is_some(),
            channels,
        })
    }

    /// Decode a tightly packed RGBA8 buffer of `width * height` pixels.
    pub fn decode_rgba(&self, data: &[u8], width: usize, height: usize) -> Result<Decoded, CmyError> {
        self.decode(&raster_from_rgba(data, width, height)?)
    }

    /// Decode at each robustness threshold and compare the results.
    pub fn test_robustness(&self, image: &RgbaImage) -> RobustnessReport {
        run_thresholds(self, image)
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Raster is exactly one code: its side is `size * scale` for some grid and
/// the three finder glyphs sit where that grid puts them.
fn is_code_frame(image: &RgbaImage) -> bool {
    let (width, height) = image.dimensions();
    exact_frames(width, height).any(|info| glyphs_match(image, &info))
}

/// Validate and copy a raw RGBA8 buffer into an image.
pub fn raster_from_rgba(data: &[u8], width: usize, height: usize) -> Result<RgbaImage, CmyError> {
    if width == 0 || height == 0 {
        return Err(CmyError::EmptyRaster);
    }
    let too_large = CmyError::DimensionTooLarge { width, height };
    let expected = width
        .checked_mul(height)
        .and_then(|pixels| pixels.checked_mul(4))
        .ok_or_else(|| too_large.clone())?;
    if data.len() != expected {
        return Err(CmyError::RasterSizeMismatch {
            expected,
            actual: data.len(),
        });
    }
    let (w, h) = match (u32::try_from(width), u32::try_from(height)) {
        (Ok(w), Ok(h)) => (w, h),
        _ => return Err(too_large),
    };
    RgbaImage::from_raw(w, h, data.to_vec()).ok_or(too_large)
}
