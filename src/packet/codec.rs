//! Channel packet layout
//!
//! ```text
//! +--------+-------------+-----------+--------+------------+---------+
//! | len u16| payload     | 0xDE 0xAD | CRC u32| recovery   | 0x00 .. |
//! +--------+-------------+-----------+--------+------------+---------+
//! ```
//!
//! Multi-byte fields are big-endian. The whole packet is exactly the grid's
//! capacity in bytes and is laid out bit by bit, MSB first, along the
//! placement order.

use log::{debug, warn};

use super::crc::crc32;
use super::recovery::recovery_bytes;
use crate::layout::{PACKET_OVERHEAD, ReservedMask, SizePlan, placement_order};
use crate::models::BitMatrix;

/// End-of-payload marker
pub const MARKER: [u8; 2] = [0xDE, 0xAD];

/// Buffers shorter than this skip header parsing entirely
const MIN_FRAMED_LEN: usize = 9;

/// An assembled, not yet placed, channel packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    payload: Vec<u8>,
    recovery: Vec<u8>,
    capacity: usize,
    truncated: bool,
}

impl Packet {
    /// Assemble a packet for `plan`. A payload longer than the plan allows is
    /// cut to fit and loses its recovery block; length, marker and CRC always
    /// survive.
    pub fn build(payload: &[u8], plan: &SizePlan) -> Self {
        let capacity = plan.available_bytes;
        let max_payload = plan.max_payload();

        let (payload, recovery_count, truncated) = if payload.len() > max_payload {
            warn!(
                "payload of {} bytes exceeds {} grid limit of {}, truncating",
                payload.len(),
                plan.size,
                max_payload
            );
            (&payload[..max_payload], 0, true)
        } else {
            let room = capacity - PACKET_OVERHEAD - payload.len();
            (payload, plan.recovery_bytes.min(room), false)
        };

        Self {
            recovery: recovery_bytes(payload, recovery_count),
            payload: payload.to_vec(),
            capacity,
            truncated,
        }
    }

    /// Payload after any truncation
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Recovery bytes written after the CRC
    pub fn recovery(&self) -> &[u8] {
        &self.recovery
    }

    /// Whether the input had to be cut to fit
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// CRC-32 of the payload
    pub fn crc(&self) -> u32 {
        crc32(&self.payload)
    }

    /// Serialized packet, zero padded to the grid capacity
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.capacity);
        out.extend_from_slice(&(self.payload.len() as u16).to_be_bytes());
        out.extend_from_slice(&self.payload);
        out.extend_from_slice(&MARKER);
        out.extend_from_slice(&self.crc().to_be_bytes());
        out.extend_from_slice(&self.recovery);
        out.resize(self.capacity, 0);
        out
    }

    /// Lay the packet bits onto a fresh module matrix. Reserved cells and
    /// data cells past the last packet bit stay 0.
    pub fn to_matrix(&self, mask: &ReservedMask) -> BitMatrix {
        let n = mask.size().get();
        let mut matrix = BitMatrix::square(n);
        let bytes = self.to_bytes();
        let bits = bytes
            .iter()
            .flat_map(|&byte| (0..8).rev().map(move |i| (byte >> i) & 1 == 1));

        for ((x, y), bit) in placement_order(mask).into_iter().zip(bits) {
            matrix.set(x, y, bit);
        }
        matrix
    }
}

/// Read packet bytes back out of a module matrix, 8 cells per byte, MSB
/// first, in placement order. A trailing partial byte is dropped.
pub fn read_matrix(matrix: &BitMatrix, mask: &ReservedMask) -> Vec<u8> {
    let order = placement_order(mask);
    order
        .chunks_exact(8)
        .map(|cells| {
            cells
                .iter()
                .fold(0u8, |byte, &(x, y)| (byte << 1) | matrix.get(x, y) as u8)
        })
        .collect()
}

/// How far a parsed packet verified. Informational only: text is returned
/// in every case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketIntegrity {
    /// Marker present and CRC matches
    Verified,
    /// Marker present, CRC differs
    ChecksumMismatch {
        /// CRC read from the packet
        stored: u32,
        /// CRC of the payload as read
        computed: u32,
    },
    /// No marker after the declared payload
    MarkerMissing,
    /// Header unusable, text recovered by stripping zero bytes
    Heuristic,
    /// Declared payload length of zero
    Empty,
}

/// Result of parsing one channel's bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPacket {
    /// Payload text, lossily decoded
    pub text: String,
    /// How the text was recovered
    pub integrity: PacketIntegrity,
}

/// Parse a channel buffer into text.
///
/// Never fails. Short or inconsistent buffers fall back to decoding their
/// non-zero bytes, and a missing marker or bad CRC still yields the declared
/// payload as (lossy) UTF-8.
pub fn parse(bytes: &[u8]) -> ParsedPacket {
    if bytes.len() < MIN_FRAMED_LEN {
        return heuristic(bytes);
    }

    let len = u16::from_be_bytes([bytes[0], bytes[1]]) as usize;
    if len == 0 {
        return ParsedPacket {
            text: String::new(),
            integrity: PacketIntegrity::Empty,
        };
    }

    let end = 2 + len;
    if end + 6 > bytes.len() {
        debug!(
            "declared length {} overruns {} byte buffer, using heuristic text",
            len,
            bytes.len()
        );
        return heuristic(&bytes[2..]);
    }

    let payload = &bytes[2..end];
    let integrity = if bytes[end..end + 2] == MARKER {
        let stored = u32::from_be_bytes([
            bytes[end + 2],
            bytes[end + 3],
            bytes[end + 4],
            bytes[end + 5],
        ]);
        let computed = crc32(payload);
        if stored == computed {
            PacketIntegrity::Verified
        } else {
            PacketIntegrity::ChecksumMismatch { stored, computed }
        }
    } else {
        PacketIntegrity::MarkerMissing
    };

    ParsedPacket {
        text: String::from_utf8_lossy(payload).into_owned(),
        integrity,
    }
}

fn heuristic(bytes: &[u8]) -> ParsedPacket {
    let kept: Vec<u8> = bytes.iter().copied().filter(|&b| b != 0).collect();
    ParsedPacket {
        text: String::from_utf8_lossy(&kept).into_owned(),
        integrity: PacketIntegrity::Heuristic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GridSize;

    #[test]
    fn test_packet_bytes_layout() {
        let plan = SizePlan::for_payload(2);
        let packet = Packet::build(b"HE", &plan);
        let bytes = packet.to_bytes();

        assert_eq!(bytes.len(), 23);
        assert_eq!(&bytes[..2], &[0x00, 0x02]);
        assert_eq!(&bytes[2..4], b"HE");
        assert_eq!(&bytes[4..6], &MARKER);
        assert_eq!(&bytes[6..10], &crc32(b"HE").to_be_bytes());
        assert_eq!(&bytes[10..13], packet.recovery());
        assert!(bytes[13..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_parse_verified() {
        let plan = SizePlan::for_payload(11);
        let bytes = Packet::build(b"hello world", &plan).to_bytes();
        let parsed = parse(&bytes);
        assert_eq!(parsed.text, "hello world");
        assert_eq!(parsed.integrity, PacketIntegrity::Verified);
    }

    #[test]
    fn test_parse_ignores_recovery_and_padding() {
        let plan = SizePlan::for_size(GridSize::MIN, 3);
        let packet = Packet::build(b"abc", &plan);
        assert_eq!(packet.recovery().len(), 12);
        let mut bytes = packet.to_bytes();
        for byte in &mut bytes[2 + 3 + 6..] {
            *byte = !*byte;
        }
        let parsed = parse(&bytes);
        assert_eq!(parsed.text, "abc");
        assert_eq!(parsed.integrity, PacketIntegrity::Verified);
    }

    #[test]
    fn test_parse_zero_length_is_empty() {
        let mut bytes = vec![0u8; 20];
        bytes[5] = 0x41;
        let parsed = parse(&bytes);
        assert_eq!(parsed.text, "");
        assert_eq!(parsed.integrity, PacketIntegrity::Empty);
    }

    #[test]
    fn test_parse_checksum_mismatch_still_returns_payload() {
        let plan = SizePlan::for_payload(3);
        let mut bytes = Packet::build(b"abc", &plan).to_bytes();
        bytes[2 + 3 + 2] ^= 0xFF; // first CRC byte
        let parsed = parse(&bytes);
        assert_eq!(parsed.text, "abc");
        assert!(matches!(
            parsed.integrity,
            PacketIntegrity::ChecksumMismatch { .. }
        ));
    }

    #[test]
    fn test_parse_marker_missing_still_returns_payload() {
        let plan = SizePlan::for_payload(3);
        let mut bytes = Packet::build(b"abc", &plan).to_bytes();
        bytes[5] = 0x00;
        let parsed = parse(&bytes);
        assert_eq!(parsed.text, "abc");
        assert_eq!(parsed.integrity, PacketIntegrity::MarkerMissing);
    }

    #[test]
    fn test_parse_short_buffer_strips_zeros() {
        let parsed = parse(&[0, b'h', 0, b'i', 0]);
        assert_eq!(parsed.text, "hi");
        assert_eq!(parsed.integrity, PacketIntegrity::Heuristic);
    }

    #[test]
    fn test_parse_overlong_length_strips_zeros_after_header() {
        // declares 200 bytes in a 12 byte buffer
        let bytes = [0x00, 0xC8, b'o', b'k', 0, 0, 0, 0, 0, 0, 0, 0];
        let parsed = parse(&bytes);
        assert_eq!(parsed.text, "ok");
        assert_eq!(parsed.integrity, PacketIntegrity::Heuristic);
    }

    #[test]
    fn test_parse_invalid_utf8_is_lossy() {
        let plan = SizePlan::for_payload(2);
        let bytes = Packet::build(&[0xFF, b'a'], &plan).to_bytes();
        let parsed = parse(&bytes);
        assert_eq!(parsed.text, "\u{FFFD}a");
        assert_eq!(parsed.integrity, PacketIntegrity::Verified);
    }

    #[test]
    fn test_truncation_drops_recovery() {
        let plan = SizePlan::for_size(GridSize::MIN, 40);
        let payload = vec![b'x'; 40];
        let packet = Packet::build(&payload, &plan);
        assert!(packet.is_truncated());
        assert_eq!(packet.payload().len(), 15);
        assert!(packet.recovery().is_empty());
        assert_eq!(parse(&packet.to_bytes()).text, "x".repeat(15));
    }

    #[test]
    fn test_matrix_roundtrip() {
        for size in [GridSize::MIN, GridSize::new(53).unwrap()] {
            let mask = ReservedMask::for_size(size);
            let plan = SizePlan::for_size(size, 9);
            let packet = Packet::build(b"cmy-codes", &plan);
            let matrix = packet.to_matrix(mask);

            let n = size.get();
            for y in 0..n {
                for x in 0..n {
                    if mask.is_reserved(x, y) {
                        assert!(!matrix.get(x, y), "reserved cell ({}, {}) inked", x, y);
                    }
                }
            }

            let bytes = read_matrix(&matrix, mask);
            assert_eq!(bytes, packet.to_bytes());
        }
    }

    #[test]
    fn test_header_lands_on_outer_ring() {
        let size = GridSize::MIN;
        let mask = ReservedMask::for_size(size);
        let plan = SizePlan::for_size(size, 1);
        // length 0x0001: the 16th bit is the only set header bit
        let matrix = Packet::build(b"\x00", &plan).to_matrix(mask);
        let order = placement_order(mask);
        for &(x, y) in &order[..15] {
            assert!(!matrix.get(x, y));
        }
        let (x, y) = order[15];
        assert!(matrix.get(x, y));
    }
}
