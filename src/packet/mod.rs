//! Per-channel binary packet: framing, CRC-32 and the recovery block

/// Packet assembly, placement and parsing
pub mod codec;
/// CRC-32 (IEEE 802.3)
pub mod crc;
/// Decode-inert recovery bytes
pub mod recovery;

pub use codec::{MARKER, Packet, PacketIntegrity, ParsedPacket, parse, read_matrix};
pub use crc::crc32;
pub use recovery::recovery_bytes;
