use image::RgbaImage;
use log::debug;

use crate::detector::{manual_scale, resolve_scale};
use crate::layout::ReservedMask;
use crate::models::{BitMatrix, Channel, ChannelDecode, ScaleInfo};
use crate::packet::{parse, read_matrix};

/// Raw packet bytes of the three channels, in cyan, magenta, yellow order,
/// together with the sampling geometry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedChannels {
    /// Packet bytes per channel
    pub bytes: [Vec<u8>; 3],
    /// Grid size and module scale used for sampling
    pub info: ScaleInfo,
}

impl ExtractedChannels {
    /// Parse every channel's packet. Never fails.
    pub fn parse(&self) -> [ChannelDecode; 3] {
        std::array::from_fn(|i| {
            let channel = Channel::ORDER[i];
            let parsed = parse(&self.bytes[i]);
            debug!(
                "{} channel: {} bytes of text, {:?}",
                channel.name(),
                parsed.text.len(),
                parsed.integrity
            );
            ChannelDecode {
                channel,
                text: parsed.text,
                integrity: parsed.integrity,
            }
        })
    }
}

/// Sample the three channel planes of `image`.
///
/// One pixel is read per data module, at `(x * scale, y * scale)`. A
/// component below `threshold` is ink for its plane: red for magenta, green
/// for cyan, blue for yellow. Modules falling outside the raster read as
/// paper.
pub fn extract_channels(image: &RgbaImage, threshold: u8, auto_scale: bool) -> ExtractedChannels {
    let (width, height) = image.dimensions();
    let info = if auto_scale {
        resolve_scale(image)
    } else {
        manual_scale(width)
    };
    debug!(
        "sampling {} at {} px/module, threshold {}",
        info.size, info.scale, threshold
    );

    let mask = ReservedMask::for_size(info.size);
    let n = info.size.get();
    let mut planes = [BitMatrix::square(n), BitMatrix::square(n), BitMatrix::square(n)];

    for y in 0..n {
        for x in 0..n {
            if mask.is_reserved(x, y) {
                continue;
            }
            let px = (x as u64) * info.scale as u64;
            let py = (y as u64) * info.scale as u64;
            if px >= width as u64 || py >= height as u64 {
                continue;
            }
            let pixel = image.get_pixel(px as u32, py as u32);
            for (plane, channel) in planes.iter_mut().zip(Channel::ORDER) {
                if pixel.0[channel.rgb_index()] < threshold {
                    plane.set(x, y, true);
                }
            }
        }
    }

    ExtractedChannels {
        bytes: planes.map(|plane| read_matrix(&plane, mask)),
        info,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::render;
    use crate::layout::capacity;
    use crate::models::GridSize;
    use crate::packet::PacketIntegrity;
    use image::Rgba;

    #[test]
    fn test_extract_rendered_code() {
        let code = render("cmy channels", None, 4).unwrap();
        let extracted = extract_channels(&code.image, 128, true);

        assert_eq!(extracted.info.size, code.size);
        assert_eq!(extracted.info.scale, 4);
        for bytes in &extracted.bytes {
            assert_eq!(bytes.len(), capacity(code.size));
        }

        let channels = extracted.parse();
        let texts: Vec<&str> = channels.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, ["cmy ", "chan", "nels"]);
        assert!(channels.iter().all(|c| c.integrity == PacketIntegrity::Verified));
    }

    #[test]
    fn test_blank_raster_reads_empty() {
        let image = RgbaImage::from_pixel(210, 210, Rgba([255, 255, 255, 255]));
        let extracted = extract_channels(&image, 128, true);
        assert!(extracted.bytes.iter().flatten().all(|&b| b == 0));
        for channel in extracted.parse() {
            assert_eq!(channel.text, "");
            assert_eq!(channel.integrity, PacketIntegrity::Empty);
        }
    }

    #[test]
    fn test_undersized_raster_reads_paper_outside() {
        // auto scale off assumes 10 px modules: 40 px -> 4 modules -> 21x21
        let image = RgbaImage::from_pixel(40, 40, Rgba([0, 0, 0, 255]));
        let extracted = extract_channels(&image, 128, false);
        assert_eq!(extracted.info.size, GridSize::MIN);
        assert_eq!(extracted.info.scale, 2);
        assert_eq!(extracted.bytes[0].len(), 23);
    }

    #[test]
    fn test_threshold_zero_reads_nothing() {
        let image = RgbaImage::from_pixel(210, 210, Rgba([0, 0, 0, 255]));
        let extracted = extract_channels(&image, 0, true);
        assert!(extracted.bytes.iter().flatten().all(|&b| b == 0));
    }
}
