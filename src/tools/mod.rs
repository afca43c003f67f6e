use image::{ImageFormat, RgbaImage};
use std::path::Path;

use crate::layout::{PACKET_OVERHEAD, capacity};
use crate::models::GridSize;

/// Load any format `image` understands as RGBA8.
pub fn load_rgba<P: AsRef<Path>>(path: P) -> Result<RgbaImage, image::ImageError> {
    Ok(image::open(path)?.to_rgba8())
}

/// Save a raster as PNG regardless of the path's extension.
pub fn save_png<P: AsRef<Path>>(image: &RgbaImage, path: P) -> Result<(), image::ImageError> {
    image.save_with_format(path, ImageFormat::Png)
}

/// One row of the capacity table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityRow {
    /// Grid size
    pub size: GridSize,
    /// Packet bytes per channel
    pub capacity: usize,
    /// Largest payload per channel under the 30% recovery rule
    pub max_payload: usize,
}

/// Capacity of every legal grid size, ascending.
pub fn capacity_table() -> Vec<CapacityRow> {
    GridSize::ALL
        .iter()
        .map(|&size| {
            let capacity = capacity(size);
            let max_payload = (0..capacity)
                .rev()
                .find(|&len| {
                    let needed = len + PACKET_OVERHEAD;
                    needed + needed * 3 / 10 <= capacity
                })
                .unwrap_or(0);
            CapacityRow {
                size,
                capacity,
                max_payload,
            }
        })
        .collect()
}
