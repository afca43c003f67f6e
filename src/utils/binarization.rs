use crate::models::BitMatrix;

/// Luma below this counts as black when scanning for finder glyphs
pub const FINDER_THRESHOLD: u8 = 128;

/// Global threshold binarization.
/// Returns a BitMatrix where true = black (value < threshold).
pub fn threshold_binarize(gray: &[u8], width: usize, height: usize, threshold: u8) -> BitMatrix {
    let mut binary = BitMatrix::new(width, height);

    for (y, row) in gray.chunks_exact(width.max(1)).take(height).enumerate() {
        for (x, &value) in row.iter().enumerate() {
            if value < threshold {
                binary.set(x, y, true);
            }
        }
    }

    binary
}
