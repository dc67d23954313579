//! `TemplateID`-keyed payload layouts.
//!
//! Field groupings follow the reference EOBI order book: every order-level
//! message carries `(SecurityID, Side, Price, OrderID, Priority)`
//! verbatim, varying only in which of those fields are present and
//! whether a quantity or executed-quantity trails them. `NO_VALUE`
//! sentinels (`types::ids::no_value`) are passed through uninterpreted;
//! it's the segment processor's job to recognize them.

use byteorder::{BigEndian, ByteOrder};

use crate::error::{DecodeError, DecodeResult};

pub(crate) const PARTIAL_ORDER_EXECUTION_TEMPLATE_ID: u16 = 6;
pub(crate) const FULL_ORDER_EXECUTION_TEMPLATE_ID: u16 = 7;

/// Carries `LastMsgSeqNumProcessed` so the segment processor can detect a
/// gap even on an otherwise quiet segment (§4.3.3: "gap check: if
/// `LastMsgSeqNumProcessed > last_seq` enter recovery at that sequence").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Heartbeat {
    pub last_msg_seq_num_processed: u32,
}

impl Heartbeat {
    pub const TEMPLATE_ID: u16 = 14;

    pub fn decode(buf: &[u8]) -> DecodeResult<Self> {
        require(buf, 4, "BIN Heartbeat payload")?;
        Ok(Self {
            last_msg_seq_num_processed: BigEndian::read_u32(&buf[0..4]),
        })
    }
}

fn require(buf: &[u8], need: usize, context: &'static str) -> DecodeResult<()> {
    if buf.len() < need {
        return Err(DecodeError::truncated(context, need, buf.len()));
    }
    Ok(())
}

/// BIN `Side`: 1=Bid, 2=Ask (same encoding EOBI uses for both order side
/// and the aggressor-side field on execution messages).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireSide {
    Bid,
    Ask,
}

impl WireSide {
    fn decode(byte: u8) -> Self {
        match byte {
            2 => WireSide::Ask,
            _ => WireSide::Bid,
        }
    }
}

macro_rules! order_payload {
    ($name:ident, $template_id:expr, { $($field:ident : $ty:ty),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name {
            $(pub $field: $ty),+
        }

        impl $name {
            pub const TEMPLATE_ID: u16 = $template_id;
        }
    };
}

order_payload!(OrderAdd, 1, {
    security_id: i64,
    side: WireSide,
    price: i64,
    order_id: i64,
    priority: i64,
    qty: i64,
});

impl OrderAdd {
    pub fn decode(buf: &[u8]) -> DecodeResult<Self> {
        require(buf, 41, "BIN OrderAdd payload")?;
        Ok(Self {
            security_id: BigEndian::read_i64(&buf[0..8]),
            side: WireSide::decode(buf[8]),
            price: BigEndian::read_i64(&buf[9..17]),
            order_id: BigEndian::read_i64(&buf[17..25]),
            priority: BigEndian::read_i64(&buf[25..33]),
            qty: BigEndian::read_i64(&buf[33..41]),
        })
    }
}

order_payload!(OrderDelete, 2, {
    security_id: i64,
    side: WireSide,
    order_id: i64,
});

impl OrderDelete {
    pub fn decode(buf: &[u8]) -> DecodeResult<Self> {
        require(buf, 17, "BIN OrderDelete payload")?;
        Ok(Self {
            security_id: BigEndian::read_i64(&buf[0..8]),
            side: WireSide::decode(buf[8]),
            order_id: BigEndian::read_i64(&buf[9..17]),
        })
    }
}

order_payload!(OrderModify, 3, {
    security_id: i64,
    side: WireSide,
    price: i64,
    order_id: i64,
    priority: i64,
    qty: i64,
    prev_priority: i64,
});

impl OrderModify {
    pub fn decode(buf: &[u8]) -> DecodeResult<Self> {
        require(buf, 49, "BIN OrderModify payload")?;
        Ok(Self {
            security_id: BigEndian::read_i64(&buf[0..8]),
            side: WireSide::decode(buf[8]),
            price: BigEndian::read_i64(&buf[9..17]),
            order_id: BigEndian::read_i64(&buf[17..25]),
            priority: BigEndian::read_i64(&buf[25..33]),
            qty: BigEndian::read_i64(&buf[33..41]),
            prev_priority: BigEndian::read_i64(&buf[41..49]),
        })
    }
}

/// Same shape as [`OrderAdd`]; template differs so the segment processor
/// can skip the priority-requeue a plain modify would trigger (§4.3.1:
/// "price/qty change that keeps the order's original queue position").
order_payload!(OrderModifySamePrio, 4, {
    security_id: i64,
    side: WireSide,
    price: i64,
    order_id: i64,
    priority: i64,
    qty: i64,
});

impl OrderModifySamePrio {
    pub fn decode(buf: &[u8]) -> DecodeResult<Self> {
        require(buf, 41, "BIN OrderModifySamePrio payload")?;
        Ok(Self {
            security_id: BigEndian::read_i64(&buf[0..8]),
            side: WireSide::decode(buf[8]),
            price: BigEndian::read_i64(&buf[9..17]),
            order_id: BigEndian::read_i64(&buf[17..25]),
            priority: BigEndian::read_i64(&buf[25..33]),
            qty: BigEndian::read_i64(&buf[33..41]),
        })
    }
}

order_payload!(OrderMassDelete, 5, {
    security_id: i64,
});

impl OrderMassDelete {
    pub fn decode(buf: &[u8]) -> DecodeResult<Self> {
        require(buf, 8, "BIN OrderMassDelete payload")?;
        Ok(Self {
            security_id: BigEndian::read_i64(&buf[0..8]),
        })
    }
}

/// Shared payload for templates 6 (`PartialOrderExecution`) and 7
/// (`FullOrderExecution`); the two differ only in whether the resting
/// order is left on the book afterwards, which the segment processor
/// decides from the template id, not from any field here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderExecution {
    pub security_id: i64,
    pub side: WireSide,
    pub price: i64,
    pub order_id: i64,
    pub priority: i64,
    pub executed_qty: i64,
}

impl OrderExecution {
    pub fn decode(buf: &[u8]) -> DecodeResult<Self> {
        require(buf, 41, "BIN OrderExecution payload")?;
        Ok(Self {
            security_id: BigEndian::read_i64(&buf[0..8]),
            side: WireSide::decode(buf[8]),
            price: BigEndian::read_i64(&buf[9..17]),
            order_id: BigEndian::read_i64(&buf[17..25]),
            priority: BigEndian::read_i64(&buf[25..33]),
            executed_qty: BigEndian::read_i64(&buf[33..41]),
        })
    }
}

/// Aggressor-side fill summary, published in addition to the per-order
/// `OrderExecution` (one order's private view) and the public
/// [`TradeReport`] (trade-tape entry). `trade_condition == 1` marks an
/// implied (multi-leg strategy) fill rather than an outright match
/// (§4.3.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionSummary {
    pub security_id: i64,
    pub price: i64,
    pub qty: i64,
    pub aggressor_side: WireSide,
    pub trade_id: i64,
    pub ts_trade: u64,
    pub trade_condition: u8,
}

impl ExecutionSummary {
    pub const TEMPLATE_ID: u16 = 8;

    pub fn decode(buf: &[u8]) -> DecodeResult<Self> {
        require(buf, 42, "BIN ExecutionSummary payload")?;
        Ok(Self {
            security_id: BigEndian::read_i64(&buf[0..8]),
            price: BigEndian::read_i64(&buf[8..16]),
            qty: BigEndian::read_i64(&buf[16..24]),
            aggressor_side: WireSide::decode(buf[24]),
            trade_id: BigEndian::read_i64(&buf[25..33]),
            ts_trade: BigEndian::read_u64(&buf[33..41]),
            trade_condition: buf[41],
        })
    }
}

/// Public trade-tape entry. Narrower fields than `ExecutionSummary`
/// deliberately: this is what downstream consumers outside the order
/// book care about, not a full replay of the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeReport {
    pub security_id: i64,
    pub price: i32,
    pub qty: i32,
}

impl TradeReport {
    pub const TEMPLATE_ID: u16 = 9;

    pub fn decode(buf: &[u8]) -> DecodeResult<Self> {
        require(buf, 16, "BIN TradeReport payload")?;
        Ok(Self {
            security_id: BigEndian::read_i64(&buf[0..8]),
            price: BigEndian::read_i32(&buf[8..12]),
            qty: BigEndian::read_i32(&buf[12..16]),
        })
    }
}

/// `SecurityStatus`/`SecurityTradingStatus`/`FastMarketIndicator`
/// (§4.3.5): the instrument-level status mapping looks at `security_status`
/// first (`EXPIRED` overrides everything), then falls back to
/// `security_trading_status`, consulting `fast_market_indicator` only to
/// distinguish `Open` from `FastMarket` within `CONTINUOUS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstrumentStateChange {
    pub security_id: i64,
    pub security_status: u8,
    pub security_trading_status: u8,
    pub fast_market_indicator: u8,
}

impl InstrumentStateChange {
    pub const TEMPLATE_ID: u16 = 10;

    pub fn decode(buf: &[u8]) -> DecodeResult<Self> {
        require(buf, 11, "BIN InstrumentStateChange payload")?;
        Ok(Self {
            security_id: BigEndian::read_i64(&buf[0..8]),
            security_status: buf[8],
            security_trading_status: buf[9],
            fast_market_indicator: buf[10],
        })
    }
}

/// Segment-wide status change; applies to every security known on the
/// `MarketSegmentID` already carried in the enclosing `PacketHeader`
/// (§4.3.3 "Status fan-out to all known securities"). The mapping
/// (§4.3.5) keys off `trading_session_sub_id`, not a separate status
/// enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductStateChange {
    pub trading_session_sub_id: u16,
}

impl ProductStateChange {
    pub const TEMPLATE_ID: u16 = 11;

    pub fn decode(buf: &[u8]) -> DecodeResult<Self> {
        require(buf, 2, "BIN ProductStateChange payload")?;
        Ok(Self {
            trading_session_sub_id: BigEndian::read_u16(&buf[0..2]),
        })
    }
}

order_payload!(QuoteRequest, 12, {
    security_id: i64,
    side: WireSide,
});

impl QuoteRequest {
    pub fn decode(buf: &[u8]) -> DecodeResult<Self> {
        require(buf, 9, "BIN QuoteRequest payload")?;
        Ok(Self {
            security_id: BigEndian::read_i64(&buf[0..8]),
            side: WireSide::decode(buf[8]),
        })
    }
}

order_payload!(CrossRequest, 13, {
    security_id: i64,
});

impl CrossRequest {
    pub fn decode(buf: &[u8]) -> DecodeResult<Self> {
        require(buf, 8, "BIN CrossRequest payload")?;
        Ok(Self {
            security_id: BigEndian::read_i64(&buf[0..8]),
        })
    }
}

/// Opens a snapshot cycle for one `MarketSegmentID`. `last_msg_seq_num`
/// is the incremental-feed sequence this snapshot reflects; once the
/// cycle completes the segment processor resumes the incremental feed
/// from `last_msg_seq_num + 1` (§4.3.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductSummary {
    pub last_msg_seq_num: u32,
}

impl ProductSummary {
    pub const TEMPLATE_ID: u16 = 15;

    pub fn decode(buf: &[u8]) -> DecodeResult<Self> {
        require(buf, 4, "BIN ProductSummary payload")?;
        Ok(Self {
            last_msg_seq_num: BigEndian::read_u32(&buf[0..4]),
        })
    }
}

/// `MDEntryType` (§4.3.6): which statistic or book side one
/// `MDInstrumentEntryGrp` entry carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MdEntryType {
    LowPrice,
    HighPrice,
    OpeningPrice,
    ClosingPrice,
    TradeVolume,
    Bid,
    Ask,
    Unknown(u8),
}

impl MdEntryType {
    fn decode(byte: u8) -> Self {
        match byte {
            1 => MdEntryType::LowPrice,
            2 => MdEntryType::HighPrice,
            3 => MdEntryType::OpeningPrice,
            4 => MdEntryType::ClosingPrice,
            5 => MdEntryType::TradeVolume,
            6 => MdEntryType::Bid,
            7 => MdEntryType::Ask,
            other => MdEntryType::Unknown(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MdEntry {
    pub entry_type: MdEntryType,
    pub value: i64,
}

/// Aggregated book summary for one instrument, carried on the snapshot
/// feed alongside per-order [`SnapshotOrder`] entries. Entries carry
/// either a book side (`Bid`/`Ask`) or one of the four statistic prices
/// plus traded volume; the segment processor dispatches on
/// [`MdEntry::entry_type`] (§4.3.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstrumentSummary {
    pub security_id: i64,
    pub trading_status: u8,
    pub no_md_entries: u8,
    pub entries: [MdEntry; Self::MAX_ENTRIES],
}

impl InstrumentSummary {
    pub const TEMPLATE_ID: u16 = 16;
    pub const MAX_ENTRIES: usize = 16;
    const FIXED_LEN: usize = 13;
    const ENTRY_LEN: usize = 9;

    pub fn decode(buf: &[u8]) -> DecodeResult<Self> {
        require(buf, Self::FIXED_LEN, "BIN InstrumentSummary fixed block")?;
        let security_id = BigEndian::read_i64(&buf[0..8]);
        let trading_status = buf[8];
        let no_md_entries = buf[9];
        // buf[10..13] reserved

        let entry_count = no_md_entries as usize;
        if entry_count > Self::MAX_ENTRIES {
            return Err(DecodeError::truncated(
                "BIN InstrumentSummary entry count exceeds MAX_ENTRIES",
                entry_count,
                Self::MAX_ENTRIES,
            ));
        }
        let need = Self::FIXED_LEN + entry_count * Self::ENTRY_LEN;
        require(buf, need, "BIN InstrumentSummary entries")?;

        let mut entries = [MdEntry {
            entry_type: MdEntryType::Unknown(0),
            value: 0,
        }; Self::MAX_ENTRIES];
        for i in 0..entry_count {
            let off = Self::FIXED_LEN + i * Self::ENTRY_LEN;
            entries[i] = MdEntry {
                entry_type: MdEntryType::decode(buf[off]),
                value: BigEndian::read_i64(&buf[off + 1..off + 9]),
            };
        }

        Ok(Self {
            security_id,
            trading_status,
            no_md_entries,
            entries,
        })
    }

    pub fn active_entries(&self) -> &[MdEntry] {
        &self.entries[..self.no_md_entries as usize]
    }
}

/// One resting order, replayed order-by-order during snapshot recovery
/// so the segment processor can rebuild the exact order-level book
/// (§4.3.2: "the book after snapshot replay must be identical to the
/// book the incremental feed would have produced").
order_payload!(SnapshotOrder, 17, {
    security_id: i64,
    side: WireSide,
    price: i64,
    order_id: i64,
    priority: i64,
    qty: i64,
});

impl SnapshotOrder {
    pub fn decode(buf: &[u8]) -> DecodeResult<Self> {
        require(buf, 41, "BIN SnapshotOrder payload")?;
        Ok(Self {
            security_id: BigEndian::read_i64(&buf[0..8]),
            side: WireSide::decode(buf[8]),
            price: BigEndian::read_i64(&buf[9..17]),
            order_id: BigEndian::read_i64(&buf[17..25]),
            priority: BigEndian::read_i64(&buf[25..33]),
            qty: BigEndian::read_i64(&buf[33..41]),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuctionBBO {
    pub security_id: i64,
    pub bid_price: i64,
    pub bid_qty: i32,
    pub ask_price: i64,
    pub ask_qty: i32,
}

impl AuctionBBO {
    pub const TEMPLATE_ID: u16 = 18;

    pub fn decode(buf: &[u8]) -> DecodeResult<Self> {
        require(buf, 32, "BIN AuctionBBO payload")?;
        Ok(Self {
            security_id: BigEndian::read_i64(&buf[0..8]),
            bid_price: BigEndian::read_i64(&buf[8..16]),
            bid_qty: BigEndian::read_i32(&buf[16..20]),
            ask_price: BigEndian::read_i64(&buf[20..28]),
            ask_qty: BigEndian::read_i32(&buf[28..32]),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuctionClearingPrice {
    pub security_id: i64,
    pub price: i64,
    pub qty: i64,
}

impl AuctionClearingPrice {
    pub const TEMPLATE_ID: u16 = 19;

    pub fn decode(buf: &[u8]) -> DecodeResult<Self> {
        require(buf, 24, "BIN AuctionClearingPrice payload")?;
        Ok(Self {
            security_id: BigEndian::read_i64(&buf[0..8]),
            price: BigEndian::read_i64(&buf[8..16]),
            qty: BigEndian::read_i64(&buf[16..24]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;

    #[test]
    fn instrument_summary_rejects_entry_count_past_buffer() {
        let mut buf = vec![0u8; 13];
        buf[9] = 5; // claims 5 entries but buffer has none
        assert!(matches!(
            InstrumentSummary::decode(&buf),
            Err(DecodeError::Truncated { .. })
        ));
    }

    #[test]
    fn instrument_summary_decodes_active_entries_only() {
        let mut buf = Vec::new();
        buf.write_i64::<BigEndian>(1).unwrap();
        buf.write_u8(b'T').unwrap();
        buf.write_u8(2).unwrap();
        buf.extend_from_slice(&[0u8; 3]);
        for (entry_type, value) in [(2u8, 100i64), (5u8, 5000i64)] {
            buf.write_u8(entry_type).unwrap();
            buf.write_i64::<BigEndian>(value).unwrap();
        }
        let summary = InstrumentSummary::decode(&buf).unwrap();
        assert_eq!(summary.active_entries().len(), 2);
        assert!(matches!(summary.active_entries()[0].entry_type, MdEntryType::HighPrice));
        assert_eq!(summary.active_entries()[1].value, 5000);
    }

    #[test]
    fn wire_side_defaults_unknown_byte_to_bid() {
        assert!(matches!(WireSide::decode(0), WireSide::Bid));
        assert!(matches!(WireSide::decode(2), WireSide::Ask));
    }
}
