use image::RgbaImage;

use super::{Channel, GridSize, Point};
use crate::layout::SizePlan;
use crate::packet::PacketIntegrity;

/// A rendered CMY code, its cyan channel's sizing figures and the plan of
/// every channel.
#[derive(Debug, Clone)]
pub struct RenderedCode {
    /// `size * scale` square RGBA raster
    pub image: RgbaImage,
    /// Grid size shared by all three channels
    pub size: GridSize,
    /// Pixels per module edge
    pub scale: u32,
    /// Packet capacity of one channel, in bytes
    pub available_bytes: usize,
    /// Recovery bytes written into the cyan channel
    pub recovery_bytes: usize,
    /// Per-channel plans, in cyan, magenta, yellow order
    pub channels: [RenderedChannel; 3],
}

/// How one channel's packet was laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderedChannel {
    /// Channel the packet is printed in
    pub channel: Channel,
    /// Payload bytes actually written, after any truncation
    pub payload_bytes: usize,
    /// Grid size and recovery bytes written
    pub plan: SizePlan,
    /// Whether the payload was cut to fit
    pub truncated: bool,
}

impl RenderedCode {
    /// Share of a channel's capacity spent on recovery bytes, 0.0..=1.0
    pub fn protection_ratio(&self) -> f32 {
        if self.available_bytes == 0 {
            return 0.0;
        }
        self.recovery_bytes as f32 / self.available_bytes as f32
    }
}

/// Decoded text of one channel plus how well its packet verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelDecode {
    /// Channel the text came from
    pub channel: Channel,
    /// Text read from this channel
    pub text: String,
    /// Packet integrity of this channel
    pub integrity: PacketIntegrity,
}

/// Successful decode of a raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    /// Concatenated cyan + magenta + yellow text, trailing NULs removed
    pub text: String,
    /// Pixels per module the extractor sampled with
    pub scale: u32,
    /// Grid size the extractor assumed
    pub size: GridSize,
    /// UTF-8 byte length of `text`
    pub bytes_decoded: usize,
    /// Whether a finder-pattern crop was decoded instead of the whole raster
    pub was_localized: bool,
    /// Per-channel detail, in cyan, magenta, yellow order
    pub channels: [ChannelDecode; 3],
}

impl Decoded {
    /// True when every channel carried a matching marker and checksum
    pub fn all_verified(&self) -> bool {
        self.channels
            .iter()
            .all(|c| c.integrity == PacketIntegrity::Verified)
    }
}

/// Axis-aligned square crop around three detected finder patterns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectedRegion {
    /// Left edge in pixels
    pub x: u32,
    /// Top edge in pixels
    pub y: u32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Finder centers as top-left, top-right, bottom-left
    pub finders: [Point; 3],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protection_ratio() {
        let code = RenderedCode {
            image: RgbaImage::new(1, 1),
            size: GridSize::MIN,
            scale: 1,
            available_bytes: 20,
            recovery_bytes: 5,
            channels: Channel::ORDER.map(|channel| RenderedChannel {
                channel,
                payload_bytes: 7,
                plan: SizePlan::for_size(GridSize::MIN, 7),
                truncated: false,
            }),
        };
        assert!((code.protection_ratio() - 0.25).abs() < f32::EPSILON);

        let empty = RenderedCode {
            available_bytes: 0,
            ..code.clone()
        };
        assert_eq!(empty.protection_ratio(), 0.0);
    }
}
