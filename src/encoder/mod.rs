//! Encoding: text to three channel module matrices to an RGBA raster

/// RGBA raster rendering and finder glyphs
pub mod render;

pub use render::{FINDER_GLYPH, render, stamp_finder};

use crate::layout::{ReservedMask, SizePlan};
use crate::models::{BitMatrix, GridSize};
use crate::packet::Packet;

/// Module matrix of one channel and the plan it was built with.
#[derive(Debug, Clone)]
pub struct ChannelMatrix {
    /// Placed packet bits
    pub matrix: BitMatrix,
    /// Size and recovery plan the packet was built with
    pub plan: SizePlan,
    /// Whether the payload was cut to fit
    pub truncated: bool,
    /// Payload bytes written, after any truncation
    pub payload_bytes: usize,
}

/// Build one channel's modules. With `target` unset the smallest fitting
/// grid is chosen.
pub fn encode_channel(text: &str, target: Option<GridSize>) -> ChannelMatrix {
    let payload = text.as_bytes();
    let plan = match target {
        Some(size) => SizePlan::for_size(size, payload.len()),
        None => SizePlan::for_payload(payload.len()),
    };

    let packet = Packet::build(payload, &plan);
    let recovery = packet.recovery().len();
    ChannelMatrix {
        matrix: packet.to_matrix(ReservedMask::for_size(plan.size)),
        plan: SizePlan {
            recovery_bytes: recovery,
            ..plan
        },
        truncated: packet.is_truncated(),
        payload_bytes: packet.payload().len(),
    }
}

/// Split text into cyan, magenta, yellow thirds by character count.
/// Each of the first two parts holds `ceil(chars / 3)` characters.
pub fn split_channels(text: &str) -> [&str; 3] {
    let chars = text.chars().count();
    let chunk = chars.div_ceil(3);

    let byte_at = |char_index: usize| {
        text.char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(text.len())
    };
    let first = byte_at(chunk);
    let second = byte_at(2 * chunk);

    [&text[..first], &text[first..second], &text[second..]]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::{PacketIntegrity, parse, read_matrix};

    #[test]
    fn test_split_ascii() {
        assert_eq!(split_channels("HELLO"), ["HE", "LL", "O"]);
        assert_eq!(split_channels("abcdef"), ["ab", "cd", "ef"]);
        assert_eq!(split_channels("abcd"), ["ab", "cd", ""]);
        assert_eq!(split_channels("a"), ["a", "", ""]);
        assert_eq!(split_channels(""), ["", "", ""]);
    }

    #[test]
    fn test_split_counts_characters_not_bytes() {
        let parts = split_channels("héllo wörld");
        assert_eq!(parts, ["héll", "o wö", "rld"]);
        assert_eq!(parts.concat(), "héllo wörld");
    }

    #[test]
    fn test_encode_channel_auto_size() {
        let channel = encode_channel("HE", None);
        assert_eq!(channel.plan.size, GridSize::MIN);
        assert_eq!(channel.plan.recovery_bytes, 3);
        assert!(!channel.truncated);

        let mask = ReservedMask::for_size(channel.plan.size);
        let parsed = parse(&read_matrix(&channel.matrix, mask));
        assert_eq!(parsed.text, "HE");
        assert_eq!(parsed.integrity, PacketIntegrity::Verified);
    }

    #[test]
    fn test_encode_channel_truncates_to_target() {
        let text = "z".repeat(100);
        let channel = encode_channel(&text, Some(GridSize::MIN));
        assert!(channel.truncated);
        assert_eq!(channel.plan.recovery_bytes, 0);

        let mask = ReservedMask::for_size(GridSize::MIN);
        let parsed = parse(&read_matrix(&channel.matrix, mask));
        assert_eq!(parsed.text, "z".repeat(15));
    }
}
