use std::sync::OnceLock;

use crate::models::{BitMatrix, GridSize};

/// Side of the square corner zone reserved for each finder glyph.
pub const CORNER_ZONE: usize = 8;

/// Structural cells of a grid size.
/// true = reserved (corner zone, border, data frame), false = data module.
#[derive(Debug, Clone)]
pub struct ReservedMask {
    mask: BitMatrix,
    size: GridSize,
    reserved: usize,
}

static MASKS: [OnceLock<ReservedMask>; 15] = [const { OnceLock::new() }; 15];

impl ReservedMask {
    /// Shared mask for `size`, built on first request.
    pub fn for_size(size: GridSize) -> &'static ReservedMask {
        MASKS[size.index()].get_or_init(|| Self::build(size))
    }

    /// Build the mask from scratch. Pure in `size`.
    pub fn build(size: GridSize) -> Self {
        let n = size.get();
        let mut mask = BitMatrix::square(n);

        for y in 0..n {
            for x in 0..n {
                let reserved = is_corner_zone(x, y, n)
                    || x == 0
                    || y == 0
                    || x == n - 1
                    || y == n - 1
                    || Self::is_data_frame(x, y, n);
                mask.set(x, y, reserved);
            }
        }

        let reserved = mask.count_ones();
        Self {
            mask,
            size,
            reserved,
        }
    }

    // Rows 8 and n-9 from column 8 rightwards, columns 8 and n-9 strictly
    // between those rows.
    fn is_data_frame(x: usize, y: usize, n: usize) -> bool {
        let inner_lo = CORNER_ZONE;
        let inner_hi = n - CORNER_ZONE - 1;
        ((y == inner_lo || y == inner_hi) && x >= inner_lo)
            || ((x == inner_lo || x == inner_hi) && y > inner_lo && y < n - CORNER_ZONE)
    }

    /// Grid the mask belongs to
    pub fn size(&self) -> GridSize {
        self.size
    }

    /// True for finder, perimeter and frame cells
    pub fn is_reserved(&self, x: usize, y: usize) -> bool {
        self.mask.get(x, y)
    }

    /// Number of reserved cells
    pub fn reserved_count(&self) -> usize {
        self.reserved
    }

    /// Number of data-bearing cells
    pub fn data_count(&self) -> usize {
        let n = self.size.get();
        n * n - self.reserved
    }

    /// Per-channel byte budget: data cells / 8, rounded down
    pub fn capacity(&self) -> usize {
        self.data_count() / 8
    }
}

/// Inside one of the three 8x8 finder zones (top-left, top-right, bottom-left).
pub fn is_corner_zone(x: usize, y: usize, n: usize) -> bool {
    let far = n.saturating_sub(CORNER_ZONE);
    (x < CORNER_ZONE && y < CORNER_ZONE)
        || (x >= far && y < CORNER_ZONE)
        || (x < CORNER_ZONE && y >= far)
}

/// Capacity in bytes for a grid size, from the shared mask
pub fn capacity(size: GridSize) -> usize {
    ReservedMask::for_size(size).capacity()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_smallest_and_largest() {
        let mask = ReservedMask::build(GridSize::MIN);
        assert_eq!(mask.reserved_count(), 257);
        assert_eq!(mask.data_count(), 184);
        assert_eq!(mask.capacity(), 23);

        let mask = ReservedMask::build(GridSize::MAX);
        assert_eq!(mask.data_count(), 5224);
        assert_eq!(mask.capacity(), 653);
    }

    #[test]
    fn test_data_cells_follow_closed_form() {
        // n^2 - 8n - 89 data cells for every legal size
        for size in GridSize::ALL {
            let n = size.get();
            assert_eq!(ReservedMask::build(size).data_count(), n * n - 8 * n - 89);
        }
    }

    #[test]
    fn test_structure_cells() {
        let mask = ReservedMask::build(GridSize::new(25).unwrap());
        // corner zones
        assert!(mask.is_reserved(0, 0));
        assert!(mask.is_reserved(7, 7));
        assert!(mask.is_reserved(24, 7));
        assert!(mask.is_reserved(0, 24));
        // perimeter, including the bottom-right corner which has no zone
        assert!(mask.is_reserved(12, 0));
        assert!(mask.is_reserved(24, 20));
        assert!(mask.is_reserved(24, 24));
        // data frame at rows/cols 8 and 16
        assert!(mask.is_reserved(10, 8));
        assert!(mask.is_reserved(10, 16));
        assert!(mask.is_reserved(8, 12));
        assert!(mask.is_reserved(16, 12));
        // data cells
        assert!(!mask.is_reserved(12, 12));
        assert!(!mask.is_reserved(10, 3));
        assert!(!mask.is_reserved(3, 10));
        assert!(!mask.is_reserved(20, 20));
    }

    #[test]
    fn test_shared_mask_matches_fresh_build() {
        for size in GridSize::ALL {
            let shared = ReservedMask::for_size(size);
            assert_eq!(shared.size(), size);
            assert_eq!(
                shared.reserved_count(),
                ReservedMask::build(size).reserved_count()
            );
            assert!(std::ptr::eq(shared, ReservedMask::for_size(size)));
        }
    }
}
