use super::mask::ReservedMask;

/// Canonical cell order for packet bits: data cells sorted by their distance
/// to the nearest edge, outer ring first. Cells at equal distance keep
/// row-major order, so encoder and decoder agree without side information.
pub fn placement_order(mask: &ReservedMask) -> Vec<(usize, usize)> {
    let n = mask.size().get();
    let mut cells = Vec::with_capacity(mask.data_count());
    for y in 0..n {
        for x in 0..n {
            if !mask.is_reserved(x, y) {
                cells.push((x, y));
            }
        }
    }

    // sort_by_key is stable
    cells.sort_by_key(|&(x, y)| edge_distance(x, y, n));
    cells
}

/// Distance of (x, y) to the closest of the four grid edges
pub fn edge_distance(x: usize, y: usize, n: usize) -> usize {
    x.min(y).min(n - 1 - x).min(n - 1 - y)
}
