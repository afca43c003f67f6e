//! Recovery block appended after the CRC.
//!
//! This is not an error-correcting code. The bytes are derived from the
//! payload and its CRC so that they look like redundancy, but the decoder
//! never reads them back.

use super::crc::crc32;

/// Compute `count` recovery bytes for `payload`.
///
/// Byte `i` is the low byte of a rolling CRC state xor'd with
/// `payload[j] ^ (j + i)` over every payload byte `j`. The state rotates right
/// by one byte after each output byte.
pub fn recovery_bytes(payload: &[u8], count: usize) -> Vec<u8> {
    let mut state = crc32(payload);
    // payload[j] ^ ((j + i) & 0xFF) folded over j splits into
    // xor(payload) ^ xor_j((j + i) & 0xFF); the first half is loop invariant.
    let payload_fold = payload.iter().fold(0u8, |acc, &b| acc ^ b);

    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        let index_fold = (0..payload.len()).fold(0u8, |acc, j| acc ^ ((j + i) & 0xFF) as u8);
        out.push((state & 0xFF) as u8 ^ payload_fold ^ index_fold);
        state = (state >> 8) ^ (state << 24);
    }
    out
}
