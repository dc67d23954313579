//! Identifiers shared across both protocol adapters.
//!
//! Field widths follow the reference EOBI/HSVF headers: `SecurityIdT` is a
//! signed 64-bit integer, `MarketSegmentIdT` a signed 32-bit integer,
//! `MsgSeqNumT` an unsigned 32-bit integer on the BIN side; TXT sequence
//! numbers are wider (ASCII 10-digit fields) and modeled as `u64`.

use serde::{Deserialize, Serialize};

/// A logical feed subscription (one channel owns one BIN segment map, or a
/// single flat TXT processor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelId(pub u32);

/// BIN: one market segment corresponds to one product.
pub type MarketSegmentId = i32;

/// BIN per-segment message sequence number.
pub type MsgSeqNum = u32;

/// TXT per-channel message sequence number (10 ASCII digits on the wire).
pub type TxtSeqNum = u64;

/// Interned numeric descriptor derived from an instrument's string
/// identifier ("indesc" in the glossary). Both protocols route consumer
/// callbacks by this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstrumentDesc(pub i64);

impl InstrumentDesc {
    pub fn new(id: i64) -> Self {
        Self(id)
    }
}

impl From<i64> for InstrumentDesc {
    fn from(v: i64) -> Self {
        Self(v)
    }
}

/// Sentinel values used by the BIN wire format to mark "no value present".
pub mod no_value {
    pub const UINT: u32 = 0xFFFF_FFFF;
    pub const SINT: i32 = i32::MIN; // 0x80000000
    pub const SLONG: i64 = i64::MIN; // 0x8000000000000000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_value_sentinels_match_spec() {
        assert_eq!(no_value::UINT, 0xFFFF_FFFF);
        assert_eq!(no_value::SINT as u32, 0x8000_0000);
        assert_eq!(no_value::SLONG as u64, 0x8000_0000_0000_0000);
    }
}
