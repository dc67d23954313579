//! # Feed Handler Types
//!
//! Shared identifiers and the normalized `MarketEvent` stream that both the
//! BIN (Eurex EOBI-style) and TXT (Montreal MX HSVF-style) wire decoders
//! translate down to. Kept free of any protocol-specific or networking
//! code so `codec`, `network`, and `feed-core` can all depend on it without
//! cycles.

pub mod errors;
pub mod event;
pub mod ids;
pub mod instrument;

pub use errors::CodeError;
pub use event::{
    AggressorSide, ChannelStatus, EventEnvelope, EventRoute, LevelBookAction, LevelSide,
    MarketEvent, MarketEventPayload, OrderBookAction, QuoteRequestSide, QuoteRequestType, Side,
    StatAction, StatPriceId, StatQtyId, StatTimeId, StatusValue, TradeQualifier, TradeType,
};
pub use ids::{ChannelId, InstrumentDesc, MarketSegmentId, MsgSeqNum, TxtSeqNum};
pub use instrument::{InstrumentDefinition, Leg, LegSide, ProductType, TickRow, TickTable};
