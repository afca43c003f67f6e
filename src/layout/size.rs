use super::mask::capacity;
use crate::models::GridSize;

/// Fixed packet overhead: 2-byte length, 2-byte marker, 4-byte CRC.
pub const PACKET_OVERHEAD: usize = 8;

/// Chosen grid size and byte budget for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizePlan {
    /// Grid the channel is drawn on
    pub size: GridSize,
    /// Capacity of the grid in bytes
    pub available_bytes: usize,
    /// Recovery bytes to append after the CRC
    pub recovery_bytes: usize,
}

impl SizePlan {
    /// Smallest grid whose capacity fits the payload, its overhead and a
    /// recovery block of 30% of both. Payloads too large for any grid get
    /// the largest grid and whatever recovery room is left (usually none).
    pub fn for_payload(payload_len: usize) -> Self {
        let needed = payload_len + PACKET_OVERHEAD;
        // floor(needed * 0.30)
        let recovery = needed * 3 / 10;

        for size in GridSize::ALL {
            let available = capacity(size);
            if available >= needed + recovery {
                return Self {
                    size,
                    available_bytes: available,
                    recovery_bytes: recovery,
                };
            }
        }

        let available = capacity(GridSize::MAX);
        Self {
            size: GridSize::MAX,
            available_bytes: available,
            recovery_bytes: available.saturating_sub(needed),
        }
    }

    /// Plan for a caller-chosen grid: recovery fills whatever the payload
    /// leaves free.
    pub fn for_size(size: GridSize, payload_len: usize) -> Self {
        let available = capacity(size);
        Self {
            size,
            available_bytes: available,
            recovery_bytes: available.saturating_sub(payload_len + PACKET_OVERHEAD),
        }
    }

    /// Largest payload the grid can carry
    pub fn max_payload(&self) -> usize {
        self.available_bytes.saturating_sub(PACKET_OVERHEAD)
    }
}
