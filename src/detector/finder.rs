/// Finder glyph detection: sliding square windows whose horizontal centerline
/// reads black-white-black-white-black in a 1:1:3:1:1 ratio
use log::trace;
use rayon::prelude::*;

use crate::models::{BitMatrix, Point};

/// Smallest window edge tried, in pixels
pub const MIN_WINDOW: usize = 15;
/// Window origins and window sizes both advance by this many pixels
const STRIDE: usize = 2;
/// Allowed deviation of each run from its expected length, as a share of the unit
const TOLERANCE: f32 = 0.3;
const EXPECTED: [f32; 5] = [1.0, 1.0, 3.0, 1.0, 1.0];

/// A detected finder glyph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinderPattern {
    /// Glyph centre in pixels
    pub center: Point,
    /// Window edge length of the detection, in pixels
    pub window: f32,
    /// Number of raw window matches merged into this pattern
    pub hits: u32,
}

impl FinderPattern {
    /// Single-hit pattern centred at `(x, y)`
    pub fn new(x: f32, y: f32, window: f32) -> Self {
        Self {
            center: Point::new(x, y),
            window,
            hits: 1,
        }
    }
}

/// Run-length table of one binarized row.
struct RowRuns {
    /// Run index of every pixel
    run_of: Vec<u32>,
    /// (start, length, black) per run
    runs: Vec<(usize, usize, bool)>,
}

impl RowRuns {
    fn build(matrix: &BitMatrix, y: usize) -> Self {
        let width = matrix.width();
        let mut run_of = Vec::with_capacity(width);
        let mut runs: Vec<(usize, usize, bool)> = Vec::new();

        for x in 0..width {
            let black = matrix.get(x, y);
            match runs.last_mut() {
                Some(run) if run.2 == black => run.1 += 1,
                _ => runs.push((x, 1, black)),
            }
            run_of.push((runs.len() - 1) as u32);
        }

        Self { run_of, runs }
    }

    /// Lengths of the five runs covering `[x, x + size)`, clipped to the
    /// window, if there are exactly five and the first is black.
    fn window_runs(&self, x: usize, size: usize) -> Option<[usize; 5]> {
        let end = x + size;
        let first = *self.run_of.get(x)? as usize;
        let last = *self.run_of.get(end - 1)? as usize;
        if last - first != 4 || !self.runs[first].2 {
            return None;
        }

        let mut lengths = [0usize; 5];
        for (i, len) in lengths.iter_mut().enumerate() {
            let (start, run_len, _) = self.runs[first + i];
            let lo = start.max(x);
            let hi = (start + run_len).min(end);
            *len = hi - lo;
        }
        Some(lengths)
    }
}

/// Window scan for finder glyphs over a binarized raster.
pub struct FinderDetector;

impl FinderDetector {
    /// Scan a binarized raster (true = dark) for finder glyphs.
    ///
    /// Window origins sit on a stride-2 grid, window edges run from
    /// [`MIN_WINDOW`] to a third of the shorter side. After a match the scan
    /// on that row jumps past the matched window. Matches closer than half a
    /// window are merged.
    pub fn detect(matrix: &BitMatrix) -> Vec<FinderPattern> {
        let width = matrix.width();
        let height = matrix.height();
        let max_window = width.min(height) / 3;
        if max_window < MIN_WINDOW {
            return Vec::new();
        }

        let sizes: Vec<usize> = (MIN_WINDOW..=max_window).step_by(STRIDE).collect();
        let rows: Vec<RowRuns> = (0..height)
            .into_par_iter()
            .map(|y| RowRuns::build(matrix, y))
            .collect();

        let candidates: Vec<FinderPattern> = (0..height)
            .step_by(STRIDE)
            .collect::<Vec<_>>()
            .into_par_iter()
            .flat_map_iter(|wy| Self::scan_origin_row(&rows, wy, width, height, &sizes))
            .collect();

        trace!("{} raw finder window matches", candidates.len());
        Self::merge_candidates(candidates)
    }

    fn scan_origin_row(
        rows: &[RowRuns],
        wy: usize,
        width: usize,
        height: usize,
        sizes: &[usize],
    ) -> Vec<FinderPattern> {
        let mut found = Vec::new();
        let mut wx = 0;

        while wx < width {
            let hit = sizes
                .iter()
                .copied()
                .take_while(|&s| wx + s <= width && wy + s <= height)
                .find(|&s| {
                    rows[wy + s / 2]
                        .window_runs(wx, s)
                        .is_some_and(|lengths| Self::check_ratio(&lengths))
                });

            match hit {
                Some(s) => {
                    let half = s as f32 / 2.0;
                    found.push(FinderPattern::new(wx as f32 + half, wy as f32 + half, s as f32));
                    // stay on the even origin grid
                    wx = (wx + s).next_multiple_of(STRIDE);
                }
                None => wx += STRIDE,
            }
        }

        found
    }

    /// 1:1:3:1:1 check. The unit is the mean of the four outer runs and
    /// every run must lie within 30% of a unit of its expected length.
    pub fn check_ratio(lengths: &[usize; 5]) -> bool {
        let unit = (lengths[0] + lengths[1] + lengths[3] + lengths[4]) as f32 / 4.0;
        if unit <= 0.0 {
            return false;
        }
        let slack = TOLERANCE * unit;
        lengths
            .iter()
            .zip(EXPECTED)
            .all(|(&len, expected)| (len as f32 - expected * unit).abs() <= slack)
    }

    /// Fold matches within half a window of each other into one pattern,
    /// averaging positions weighted by hit count.
    fn merge_candidates(candidates: Vec<FinderPattern>) -> Vec<FinderPattern> {
        let mut merged: Vec<FinderPattern> = Vec::new();

        for candidate in candidates {
            let near = merged.iter_mut().find(|existing| {
                let radius = existing.window.max(candidate.window) / 2.0;
                existing.center.distance_squared(&candidate.center) < radius * radius
            });

            match near {
                Some(existing) => {
                    let total = (existing.hits + candidate.hits) as f32;
                    let w_old = existing.hits as f32 / total;
                    let w_new = candidate.hits as f32 / total;
                    existing.center = Point::new(
                        existing.center.x * w_old + candidate.center.x * w_new,
                        existing.center.y * w_old + candidate.center.y * w_new,
                    );
                    existing.window = existing.window * w_old + candidate.window * w_new;
                    existing.hits += candidate.hits;
                }
                None => merged.push(candidate),
            }
        }

        merged
    }
}
