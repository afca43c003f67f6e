//! Process-wide decode defaults, read once from the environment
//!
//! | variable                  | meaning                                  | default |
//! |---------------------------|------------------------------------------|---------|
//! | `CMY_DEFAULT_THRESHOLD`   | channel binarization threshold (0-255)   | 128     |
//! | `CMY_LOCALIZE`            | 0 disables the finder search             | 1       |
//! | `CMY_PARALLEL_ROBUSTNESS` | 0 runs robustness thresholds serially    | 1       |
//! | `CMY_DEBUG`               | non-zero raises CLI logging to debug     | 0       |

use std::sync::OnceLock;

fn parse_env_u8(name: &str, default: u8) -> u8 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u8>().ok())
        .unwrap_or(default)
}

fn parse_env_bool_u8(name: &str, default: bool) -> bool {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u8>().ok())
        .map(|v| v != 0)
        .unwrap_or(default)
}

static DEFAULT_THRESHOLD: OnceLock<u8> = OnceLock::new();

/// Default channel threshold
pub fn default_threshold() -> u8 {
    *DEFAULT_THRESHOLD.get_or_init(|| parse_env_u8("CMY_DEFAULT_THRESHOLD", 128))
}

static LOCALIZE: OnceLock<bool> = OnceLock::new();

/// Whether decodes run the finder search
pub fn localize_enabled() -> bool {
    *LOCALIZE.get_or_init(|| parse_env_bool_u8("CMY_LOCALIZE", true))
}

static PARALLEL_ROBUSTNESS: OnceLock<bool> = OnceLock::new();

/// Whether robustness thresholds run on rayon
pub fn parallel_robustness() -> bool {
    *PARALLEL_ROBUSTNESS.get_or_init(|| parse_env_bool_u8("CMY_PARALLEL_ROBUSTNESS", true))
}

static DEBUG: OnceLock<bool> = OnceLock::new();

/// Whether CLI logging starts at debug level
pub fn debug_enabled() -> bool {
    *DEBUG.get_or_init(|| parse_env_bool_u8("CMY_DEBUG", false))
}

/// When to run the finder search before sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocalizeMode {
    /// Skip the search on rasters that are exactly one code (an exact
    /// `size * scale` square with its finder glyphs in place), search otherwise
    #[default]
    Auto,
    /// Always search, as a plain render-then-decode would
    Always,
    /// Never search; sample the whole raster
    Never,
}

/// Knobs of a single decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Channel sample below this value reads as ink
    pub threshold: u8,
    /// Infer scale and size from the raster instead of assuming 10 px modules
    pub auto_scale: bool,
    /// Finder search policy
    pub localize: LocalizeMode,
    /// Run robustness thresholds on the rayon pool
    pub parallel: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            auto_scale: true,
            localize: if localize_enabled() {
                LocalizeMode::Auto
            } else {
                LocalizeMode::Never
            },
            parallel: parallel_robustness(),
        }
    }
}

impl DecodeOptions {
    /// Same options at another threshold
    pub fn with_threshold(self, threshold: u8) -> Self {
        Self { threshold, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_fallbacks() {
        assert_eq!(parse_env_u8("CMY_TEST_UNSET_KNOB", 42), 42);
        assert!(parse_env_bool_u8("CMY_TEST_UNSET_KNOB", true));
        assert!(!parse_env_bool_u8("CMY_TEST_UNSET_KNOB", false));
    }

    #[test]
    fn test_with_threshold_keeps_other_fields() {
        let options = DecodeOptions {
            threshold: 128,
            auto_scale: false,
            localize: LocalizeMode::Never,
            parallel: false,
        };
        let moved = options.with_threshold(75);
        assert_eq!(moved.threshold, 75);
        assert!(!moved.auto_scale);
        assert_eq!(moved.localize, LocalizeMode::Never);
    }
}
