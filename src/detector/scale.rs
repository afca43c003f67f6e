use image::RgbaImage;
use log::debug;

use crate::encoder::FINDER_GLYPH;
use crate::models::{GridSize, MAX_SCALE, ScaleInfo};
use crate::utils::grayscale::luma;

/// Every exact `size * scale` square match, smallest size first.
pub fn exact_frames(width: u32, height: u32) -> impl Iterator<Item = ScaleInfo> {
    GridSize::ALL
        .into_iter()
        .filter(move |_| width == height)
        .filter_map(move |size| {
            (1..=MAX_SCALE)
                .find(|&scale| size.get() as u32 * scale == width)
                .map(|scale| ScaleInfo { scale, size })
        })
}

/// First exact `size * scale` square match.
pub fn exact_frame(width: u32, height: u32) -> Option<ScaleInfo> {
    exact_frames(width, height).next()
}

/// Infer module scale and grid size from raster dimensions.
///
/// An exact square match wins. Otherwise the first size whose rounded
/// `average side / size` is a legal scale is taken, which in practice
/// favours the smallest grid. Falls back to scale 10 at 21x21.
pub fn detect_scale(width: u32, height: u32) -> ScaleInfo {
    if let Some(info) = exact_frame(width, height) {
        return info;
    }

    let avg = (width as f64 + height as f64) / 2.0;
    GridSize::ALL
        .iter()
        .find_map(|&size| {
            let scale = (avg / size.get() as f64).round();
            (1.0..=MAX_SCALE as f64)
                .contains(&scale)
                .then(|| ScaleInfo {
                    scale: scale as u32,
                    size,
                })
        })
        .unwrap_or_default()
}

/// Scale detection that looks at pixels as well as dimensions.
///
/// A side like 450 px is both 45x45 at 10 and 25x25 at 18. Among several
/// exact matches the first whose three corner glyphs sample correctly wins;
/// without any glyph match this is [`detect_scale`].
pub fn resolve_scale(image: &RgbaImage) -> ScaleInfo {
    let (width, height) = image.dimensions();
    let mut exact = exact_frames(width, height);
    let Some(first) = exact.next() else {
        return detect_scale(width, height);
    };

    std::iter::once(first)
        .chain(exact)
        .find(|info| glyphs_match(image, info))
        .inspect(|info| {
            if *info != first {
                debug!("{} at {} px/module matched the finder glyphs", info.size, info.scale);
            }
        })
        .unwrap_or(first)
}

/// Sample the centre of every finder glyph module under `info`.
pub(crate) fn glyphs_match(image: &RgbaImage, info: &ScaleInfo) -> bool {
    let far = (info.size.get() - 7) as u32;
    let scale = info.scale;

    [(0, 0), (far, 0), (0, far)].iter().all(|&(gx, gy)| {
        FINDER_GLYPH.iter().enumerate().all(|(dy, row)| {
            row.iter().enumerate().all(|(dx, &cell)| {
                let px = (gx + dx as u32) * scale + scale / 2;
                let py = (gy + dy as u32) * scale + scale / 2;
                let Some(pixel) = image.get_pixel_checked(px, py) else {
                    return false;
                };
                let dark = luma(pixel.0[0], pixel.0[1], pixel.0[2]) < 128;
                dark == (cell == 1)
            })
        })
    })
}

/// Fixed-scale sizing used when auto scale is off: assume 10 px modules and
/// snap the implied module count to the nearest legal grid.
pub fn manual_scale(width: u32) -> ScaleInfo {
    const ASSUMED_SCALE: u32 = 10;
    let modules = ((width as f64) / ASSUMED_SCALE as f64).round() as usize;
    let size = GridSize::nearest(modules);
    let scale = ((width as f64) / size.get() as f64).round() as u32;
    ScaleInfo {
        scale: scale.clamp(1, MAX_SCALE),
        size,
    }
}
