use image::{Rgba, RgbaImage};
use log::debug;

use super::{ChannelMatrix, encode_channel, split_channels};
use crate::error::CmyError;
use crate::models::{Channel, GridSize, MAX_SCALE, RenderedChannel, RenderedCode};

/// 7x7 finder glyph, 1 = black: outer ring, white ring, solid 3x3 core.
/// Its centre row reads 1:1:3:1:1, which is what the localizer scans for.
pub const FINDER_GLYPH: [[u8; 7]; 7] = [
    [1, 1, 1, 1, 1, 1, 1],
    [1, 0, 0, 0, 0, 0, 1],
    [1, 0, 1, 1, 1, 0, 1],
    [1, 0, 1, 1, 1, 0, 1],
    [1, 0, 1, 1, 1, 0, 1],
    [1, 0, 0, 0, 0, 0, 1],
    [1, 1, 1, 1, 1, 1, 1],
];

const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Render `text` as a CMY code.
///
/// The text is split into three parts, one packet per channel. With `target`
/// unset every channel picks its own grid and, if they disagree, all three
/// are rebuilt at the largest. The top-level byte figures are the cyan
/// channel's; [`RenderedCode::channels`] carries all three.
pub fn render(text: &str, target: Option<GridSize>, scale: u32) -> Result<RenderedCode, CmyError> {
    if !(1..=MAX_SCALE).contains(&scale) {
        return Err(CmyError::InvalidScale(scale));
    }

    let parts = split_channels(text);
    let mut channels = parts.map(|part| encode_channel(part, target));

    if target.is_none() {
        let largest = channels
            .iter()
            .map(|c| c.plan.size)
            .max()
            .unwrap_or(GridSize::MIN);
        if channels.iter().any(|c| c.plan.size != largest) {
            debug!("channel sizes disagree, rebuilding all at {}", largest);
            channels = parts.map(|part| encode_channel(part, Some(largest)));
        }
    }

    let [cyan, magenta, yellow] = &channels;
    let size = cyan.plan.size;
    let image = paint(cyan, magenta, yellow, size, scale);

    debug!(
        "rendered {} chars at {} x{}: {} bytes/channel, {} recovery",
        text.chars().count(),
        size,
        scale,
        cyan.plan.available_bytes,
        cyan.plan.recovery_bytes
    );

    Ok(RenderedCode {
        image,
        size,
        scale,
        available_bytes: cyan.plan.available_bytes,
        recovery_bytes: cyan.plan.recovery_bytes,
        channels: std::array::from_fn(|i| RenderedChannel {
            channel: Channel::ORDER[i],
            payload_bytes: channels[i].payload_bytes,
            plan: channels[i].plan,
            truncated: channels[i].truncated,
        }),
    })
}

fn paint(
    cyan: &ChannelMatrix,
    magenta: &ChannelMatrix,
    yellow: &ChannelMatrix,
    size: GridSize,
    scale: u32,
) -> RgbaImage {
    let n = size.get();
    let side = n as u32 * scale;
    let mut image = RgbaImage::new(side, side);

    for y in 0..n {
        for x in 0..n {
            // ink (1) absorbs the complementary primary
            let level = |m: &ChannelMatrix| if m.matrix.get(x, y) { 0 } else { 255 };
            let color = Rgba([level(magenta), level(cyan), level(yellow), 255]);
            fill_module(&mut image, x as u32, y as u32, scale, color);
        }
    }

    let far = (n - 7) as u32;
    for (mx, my) in [(0, 0), (far, 0), (0, far)] {
        stamp_finder(&mut image, mx, my, scale);
    }
    image
}

/// Draw the finder glyph with its top-left module at (module_x, module_y).
/// Pixels falling outside the image are skipped.
pub fn stamp_finder(image: &mut RgbaImage, module_x: u32, module_y: u32, scale: u32) {
    for (dy, row) in FINDER_GLYPH.iter().enumerate() {
        for (dx, &cell) in row.iter().enumerate() {
            let color = if cell == 1 { BLACK } else { WHITE };
            fill_module(
                image,
                module_x + dx as u32,
                module_y + dy as u32,
                scale,
                color,
            );
        }
    }
}

fn fill_module(image: &mut RgbaImage, module_x: u32, module_y: u32, scale: u32, color: Rgba<u8>) {
    let (width, height) = image.dimensions();
    let x0 = module_x * scale;
    let y0 = module_y * scale;
    for py in y0..(y0 + scale).min(height) {
        for px in x0..(x0 + scale).min(width) {
            image.put_pixel(px, py, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::ReservedMask;

    #[test]
    fn test_render_dimensions() {
        let code = render("HELLO", Some(GridSize::MIN), 10).unwrap();
        assert_eq!(code.image.dimensions(), (210, 210));
        assert_eq!(code.size, GridSize::MIN);
        assert_eq!(code.available_bytes, 23);
        // "HE" in a forced 21x21 grid: 23 - 2 - 8
        assert_eq!(code.recovery_bytes, 13);
    }

    #[test]
    fn test_render_rejects_bad_scale() {
        assert_eq!(render("x", None, 0).unwrap_err(), CmyError::InvalidScale(0));
        assert_eq!(render("x", None, 21).unwrap_err(), CmyError::InvalidScale(21));
    }

    #[test]
    fn test_finder_glyphs_win_in_corners() {
        let code = render("finder", None, 3).unwrap();
        let n = code.size.get() as u32;
        for (mx, my) in [(0, 0), (n - 7, 0), (0, n - 7)] {
            for dy in 0..7u32 {
                for dx in 0..7u32 {
                    let expected = if FINDER_GLYPH[dy as usize][dx as usize] == 1 {
                        BLACK
                    } else {
                        WHITE
                    };
                    let px = *code.image.get_pixel((mx + dx) * 3 + 1, (my + dy) * 3 + 1);
                    assert_eq!(px, expected);
                }
            }
        }
    }

    #[test]
    fn test_reserved_cells_outside_glyphs_are_white() {
        let code = render("white border", None, 2).unwrap();
        let n = code.size.get();
        let mask = ReservedMask::for_size(code.size);
        for y in 0..n {
            for x in 0..n {
                let in_glyph = (x < 7 && y < 7) || (x >= n - 7 && y < 7) || (x < 7 && y >= n - 7);
                if mask.is_reserved(x, y) && !in_glyph {
                    let px = code.image.get_pixel(x as u32 * 2, y as u32 * 2);
                    assert_eq!(*px, WHITE, "cell ({}, {})", x, y);
                }
            }
        }
    }

    #[test]
    fn test_truncation_reported_per_channel() {
        // at 21x21 each channel carries 15 payload bytes; only yellow's
        // 20 bytes of two-byte chars overflow
        let text = format!("{}{}", "a".repeat(20), "é".repeat(10));
        let code = render(&text, Some(GridSize::MIN), 4).unwrap();
        let [cyan, magenta, yellow] = code.channels;

        assert_eq!(cyan.channel, Channel::Cyan);
        assert!(!cyan.truncated && !magenta.truncated);
        assert_eq!(cyan.plan.recovery_bytes, 5);
        assert_eq!(magenta.plan.recovery_bytes, 5);
        assert_eq!(code.recovery_bytes, 5);

        assert_eq!(yellow.channel, Channel::Yellow);
        assert!(yellow.truncated);
        assert_eq!(yellow.payload_bytes, 15);
        assert_eq!(yellow.plan.recovery_bytes, 0);
    }

    #[test]
    fn test_mismatched_channels_share_largest_grid() {
        // cyan and magenta hold 10 ASCII bytes each and fit 21x21 on their own;
        // yellow holds 10 two-byte chars and needs 25x25
        let text = format!("{}{}", "a".repeat(20), "é".repeat(10));
        let code = render(&text, None, 1).unwrap();
        assert_eq!(code.size.get(), 25);
        assert_eq!(code.image.dimensions(), (25, 25));
        // cyan rebuilt at 25x25 fills the rest with recovery: 42 - 10 - 8
        assert_eq!(code.recovery_bytes, 24);
    }
}
