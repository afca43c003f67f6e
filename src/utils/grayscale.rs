/// Convert RGBA rasters to 8-bit luma
/// Y = 0.299*R + 0.587*G + 0.114*B
/// Uses fast integer arithmetic: Y = (76*R + 150*G + 29*B) >> 8
use image::RgbaImage;
use rayon::prelude::*;

/// Coefficients for grayscale conversion, scaled by 256
const COEF_R: u32 = 76;
const COEF_G: u32 = 150;
const COEF_B: u32 = 29;

/// Rasters with at least this many pixels are converted row-parallel
const PARALLEL_MIN_PIXELS: usize = 640 * 480;

/// Fixed-point luma of one pixel
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((COEF_R * r as u32 + COEF_G * g as u32 + COEF_B * b as u32) >> 8) as u8
}

/// Convert an RGBA image to grayscale (alpha is ignored)
pub fn rgba_to_grayscale(image: &RgbaImage) -> Vec<u8> {
    let (width, height) = image.dimensions();
    if (width as usize) * (height as usize) >= PARALLEL_MIN_PIXELS {
        return rgba_to_grayscale_parallel(image);
    }
    image
        .as_raw()
        .chunks_exact(4)
        .map(|px| luma(px[0], px[1], px[2]))
        .collect()
}

/// Row-parallel grayscale conversion on the rayon pool
pub fn rgba_to_grayscale_parallel(image: &RgbaImage) -> Vec<u8> {
    let width = image.width() as usize;
    let mut gray = vec![0u8; width * image.height() as usize];
    if width == 0 {
        return gray;
    }
    let rgba = image.as_raw();

    gray.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
        let src = &rgba[y * width * 4..(y + 1) * width * 4];
        for (dst, px) in row.iter_mut().zip(src.chunks_exact(4)) {
            *dst = luma(px[0], px[1], px[2]);
        }
    });

    gray
}
