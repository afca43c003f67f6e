//! Multi-threshold robustness on clean, mildly noisy and pure-noise rasters.

use cmy_code::decoder::ROBUSTNESS_THRESHOLDS;
use cmy_code::{DecodeOptions, Decoder, LocalizeMode, RobustnessReport, Sensitivity, render};
use image::{Rgba, RgbaImage};

/// Small deterministic xorshift generator
struct XorShift(u64);

impl XorShift {
    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    fn byte(&mut self) -> u8 {
        (self.next() >> 24) as u8
    }
}

fn decoder(parallel: bool) -> Decoder {
    Decoder::with_options(DecodeOptions {
        threshold: 128,
        auto_scale: true,
        localize: LocalizeMode::Auto,
        parallel,
    })
}

fn successful_texts(report: &RobustnessReport) -> Vec<&str> {
    report
        .runs
        .iter()
        .filter_map(|run| run.outcome.as_ref().ok())
        .map(|decoded| decoded.text.as_str())
        .collect()
}

#[test]
fn clean_render_is_consistent() {
    let code = render("robust text", None, 6).unwrap();
    let report = decoder(true).test_robustness(&code.image);

    assert!(report.consistent);
    assert_eq!(report.success_count(), 5);
    assert_eq!(report.best.as_deref(), Some("robust text"));

    let sensitivities: Vec<Sensitivity> = report.runs.iter().map(|r| r.sensitivity).collect();
    assert_eq!(sensitivities.first(), Some(&Sensitivity::VeryLow));
    assert_eq!(sensitivities.last(), Some(&Sensitivity::VeryHigh));
}

#[test]
fn mild_noise_stays_consistent() {
    let code = render("noisy but fine", None, 5).unwrap();
    let mut rng = XorShift(0x9E37_79B9_7F4A_7C15);
    let mut image = code.image.clone();
    for px in image.pixels_mut() {
        for c in 0..3 {
            // +-30 keeps ink below 75 and paper above 180
            let jitter = (rng.byte() % 61) as i16 - 30;
            px.0[c] = (px.0[c] as i16 + jitter).clamp(0, 255) as u8;
        }
    }

    for parallel in [false, true] {
        let report = decoder(parallel).test_robustness(&image);
        assert!(report.consistent, "parallel = {}", parallel);
        assert_eq!(report.best.as_deref(), Some("noisy but fine"));
    }
}

#[test]
fn pure_noise_consistency_follows_the_texts() {
    for seed in [1u64, 7, 0xDEAD_BEEF, 0x1234_5678_9ABC] {
        let mut rng = XorShift(seed);
        let image = RgbaImage::from_fn(210, 210, |_, _| {
            Rgba([rng.byte(), rng.byte(), rng.byte(), 255])
        });

        let report = decoder(true).test_robustness(&image);
        assert_eq!(report.runs.len(), ROBUSTNESS_THRESHOLDS.len());

        let texts = successful_texts(&report);
        let all_equal = texts.windows(2).all(|pair| pair[0] == pair[1]);
        assert_eq!(report.consistent, texts.len() >= 2 && all_equal);
        if !all_equal {
            assert!(!report.consistent);
        }
        assert_eq!(report.best.as_deref(), texts.first().copied());
    }
}

#[test]
fn parallel_and_serial_reports_match() {
    let mut rng = XorShift(42);
    let image = RgbaImage::from_fn(250, 250, |_, _| {
        Rgba([rng.byte(), rng.byte(), rng.byte(), 255])
    });

    let serial = decoder(false).test_robustness(&image);
    let parallel = decoder(true).test_robustness(&image);
    assert_eq!(serial, parallel);
}
