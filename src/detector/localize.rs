//! Code localization in a larger raster from three finder glyphs

use image::RgbaImage;
use image::imageops;
use log::debug;

use super::finder::{FinderDetector, FinderPattern};
use crate::models::{DetectedRegion, Point};
use crate::utils::binarization::{FINDER_THRESHOLD, threshold_binarize};
use crate::utils::grayscale::rgba_to_grayscale;

/// Largest off-axis offset, in pixels, between top-left and its neighbours
const ALIGN_LIMIT: f32 = 50.0;
/// Padding added around the finder extent on each side
const PAD_RATIO: f32 = 0.10;

/// Finder glyphs in a raster, binarized at luma 128.
pub fn find_patterns(image: &RgbaImage) -> Vec<FinderPattern> {
    let (width, height) = image.dimensions();
    let gray = rgba_to_grayscale(image);
    let binary = threshold_binarize(&gray, width as usize, height as usize, FINDER_THRESHOLD);
    FinderDetector::detect(&binary)
}

/// Locate a code inside `image`.
///
/// Needs at least three finder glyphs. The topmost (then leftmost) one is
/// taken as top-left; top-right and bottom-left must each lie within 50 px of
/// its row or column. The returned square spans the finder extent plus 10% on
/// every side, clamped to the image. No perspective correction is attempted.
pub fn locate(image: &RgbaImage) -> Option<DetectedRegion> {
    let patterns = find_patterns(image);
    if patterns.len() < 3 {
        debug!("localize: {} finder patterns, need 3", patterns.len());
        return None;
    }

    let mut centers: Vec<Point> = patterns.iter().map(|p| p.center).collect();
    centers.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));
    let finders = assign_roles(&centers)?;
    region_for(finders, image.width(), image.height())
}

/// Pick top-left, top-right and bottom-left from centers sorted by (y, x).
fn assign_roles(sorted: &[Point]) -> Option<[Point; 3]> {
    let (&top_left, rest) = sorted.split_first()?;

    let tr_index = rest
        .iter()
        .position(|p| p.x > top_left.x && (p.y - top_left.y).abs() < ALIGN_LIMIT);
    let bl_index = rest.iter().enumerate().position(|(i, p)| {
        Some(i) != tr_index && p.y > top_left.y && (p.x - top_left.x).abs() < ALIGN_LIMIT
    });

    match (tr_index, bl_index) {
        (Some(tr), Some(bl)) => Some([top_left, rest[tr], rest[bl]]),
        _ => {
            debug!(
                "localize: no {} for top-left at ({:.1}, {:.1})",
                if tr_index.is_none() { "top-right" } else { "bottom-left" },
                top_left.x,
                top_left.y
            );
            None
        }
    }
}

fn region_for(finders: [Point; 3], width: u32, height: u32) -> Option<DetectedRegion> {
    let [top_left, top_right, bottom_left] = finders;
    let extent = (top_right.x - top_left.x)
        .abs()
        .max((bottom_left.y - top_left.y).abs());
    let pad = extent * PAD_RATIO;

    let x0 = (top_left.x - pad).max(0.0) as u32;
    let y0 = (top_left.y - pad).max(0.0) as u32;
    let side = (extent + 2.0 * pad).round() as u32;

    let x = x0.min(width.saturating_sub(1));
    let y = y0.min(height.saturating_sub(1));
    let region_width = side.min(width - x);
    let region_height = side.min(height - y);
    if region_width == 0 || region_height == 0 {
        return None;
    }

    debug!(
        "localize: region {}x{} at ({}, {})",
        region_width, region_height, x, y
    );
    Some(DetectedRegion {
        x,
        y,
        width: region_width,
        height: region_height,
        finders,
    })
}

/// Copy the region out of `image`.
pub fn crop(image: &RgbaImage, region: &DetectedRegion) -> RgbaImage {
    imageops::crop_imm(image, region.x, region.y, region.width, region.height).to_image()
}
