//! Grid geometry shared by the encoder and the decoder
//!
//! - Reserved mask (finder zones, border, data frame) per grid size
//! - Per-channel capacity and grid size selection
//! - Bit placement order over the data cells

/// Reserved cell mask and capacity
pub mod mask;
/// Edge-priority bit placement order
pub mod placement;
/// Grid size selection for a payload length
pub mod size;

pub use mask::{ReservedMask, capacity};
pub use placement::placement_order;
pub use size::{PACKET_OVERHEAD, SizePlan};
