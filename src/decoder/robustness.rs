//! Multi-threshold consistency check

use std::fmt;

use image::RgbaImage;
use log::debug;
use rayon::prelude::*;

use super::pipeline::Decoder;
use crate::error::CmyError;
use crate::models::Decoded;

/// Channel thresholds a robustness run decodes at, in report order.
pub const ROBUSTNESS_THRESHOLDS: [u8; 5] = [75, 100, 128, 155, 180];

/// How eagerly a threshold treats a channel sample as ink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Sensitivity {
    /// Below 85
    VeryLow,
    /// 85 to 109
    Low,
    /// 110 to 144
    Medium,
    /// 145 to 169
    High,
    /// 170 and above
    VeryHigh,
}

impl Sensitivity {
    /// Band a threshold falls in
    pub fn from_threshold(threshold: u8) -> Self {
        match threshold {
            0..=84 => Sensitivity::VeryLow,
            85..=109 => Sensitivity::Low,
            110..=144 => Sensitivity::Medium,
            145..=169 => Sensitivity::High,
            _ => Sensitivity::VeryHigh,
        }
    }

    /// Human-readable band name
    pub fn label(self) -> &'static str {
        match self {
            Sensitivity::VeryLow => "very low",
            Sensitivity::Low => "low",
            Sensitivity::Medium => "medium",
            Sensitivity::High => "high",
            Sensitivity::VeryHigh => "very high",
        }
    }
}

impl fmt::Display for Sensitivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of one threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThresholdRun {
    /// Channel threshold of this run
    pub threshold: u8,
    /// Label for the threshold
    pub sensitivity: Sensitivity,
    /// Decode result at this threshold
    pub outcome: Result<Decoded, CmyError>,
}

/// Decodes of one raster across [`ROBUSTNESS_THRESHOLDS`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RobustnessReport {
    /// One entry per threshold, in threshold order
    pub runs: Vec<ThresholdRun>,
    /// At least two successes, all with identical text
    pub consistent: bool,
    /// Text of the first successful run
    pub best: Option<String>,
}

impl RobustnessReport {
    fn from_runs(runs: Vec<ThresholdRun>) -> Self {
        let texts: Vec<&str> = runs
            .iter()
            .filter_map(|run| run.outcome.as_ref().ok())
            .map(|decoded| decoded.text.as_str())
            .collect();

        let consistent = texts.len() >= 2 && texts.windows(2).all(|pair| pair[0] == pair[1]);
        let best = texts.first().map(|text| text.to_string());

        Self {
            runs,
            consistent,
            best,
        }
    }

    /// Number of thresholds that decoded
    pub fn success_count(&self) -> usize {
        self.runs.iter().filter(|run| run.outcome.is_ok()).count()
    }
}

pub(crate) fn run_thresholds(decoder: &Decoder, image: &RgbaImage) -> RobustnessReport {
    let base = *decoder.options();
    let run = |threshold: u8| ThresholdRun {
        threshold,
        sensitivity: Sensitivity::from_threshold(threshold),
        outcome: Decoder::with_options(base.with_threshold(threshold)).decode(image),
    };

    let runs: Vec<ThresholdRun> = if base.parallel {
        ROBUSTNESS_THRESHOLDS.par_iter().map(|&t| run(t)).collect()
    } else {
        ROBUSTNESS_THRESHOLDS.iter().map(|&t| run(t)).collect()
    };

    let report = RobustnessReport::from_runs(runs);
    debug!(
        "robustness: {}/{} decoded, consistent = {}",
        report.success_count(),
        ROBUSTNESS_THRESHOLDS.len(),
        report.consistent
    );
    report
}
