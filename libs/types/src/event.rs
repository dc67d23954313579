//! Normalized market-event stream (§3, §4.5 of the feed handler spec).
//!
//! Both wire protocols are translated down to this single tagged union
//! before reaching the consumer, so the Segment/Channel processors and the
//! downstream sink never need protocol-specific branching.

use crate::ids::{ChannelId, InstrumentDesc};
use serde::{Deserialize, Serialize};

/// Book side. `ImpliedBid`/`ImpliedAsk` only appear in `LevelBook` events
/// (TXT depth records carry an extra implied level).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Bid,
    Ask,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelSide {
    Bid,
    Ask,
    ImpliedBid,
    ImpliedAsk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderBookAction {
    New,
    Change,
    Delete,
    Execute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelBookAction {
    NewOrChange,
    DeleteFrom,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeQualifier {
    Regular,
    Implied,
}

/// `AggressorSide` mapping from §4.3.3: 1=Take, 2=Hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggressorSide {
    Take,
    Hit,
}

/// TXT trade-type mapping from §4.4.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeType {
    Normal,
    OtcGuaranteedCross,
    OtcBlockTrade,
    OtcExchangeForSwap,
    OtcExchangeForPhysicalEquityIndex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatPriceId {
    Open,
    High,
    Low,
    Close,
    Settle,
    IndSettle,
    IndOpenPrc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatQtyId {
    Volume,
    IndicativeOpenQty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatTimeId {
    SettleTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatAction {
    New,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuoteRequestType {
    Tradable,
    CrossTradeRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuoteRequestSide {
    Buy,
    Sell,
    Cross,
}

/// Security/product trading status, unified across BIN's
/// `SecurityTradingStatus`/`TradingSessionSubID` and TXT's status marker
/// byte (§4.3.5, §4.4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusValue {
    Expired,
    Closed,
    PreTrading,
    Open,
    FastMarket,
    PreOpen,
    Auction,
    Freeze,
    PostTrading,
    Reserve,
    Unknown,
}

/// Channel-level status reported via `OnChannelStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelStatus {
    Stable,
    Recovering,
    Down,
}

/// Envelope common to every `MarketEvent` (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub channel_id: ChannelId,
    pub indesc: InstrumentDesc,
    pub packet_sequence: u64,
    pub message_sequence: u64,
    pub ts_exchange_send: u64,
    pub ts_server_recv: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketEventPayload {
    OrderBook {
        action: OrderBookAction,
        side: Side,
        price: i64,
        qty: i64,
        order_id: i64,
        priority: i64,
    },
    LevelBook {
        action: LevelBookAction,
        side: LevelSide,
        level: u8,
        price: i64,
        qty: i64,
        num_orders: u32,
    },
    Trade {
        trade_type: TradeType,
        status: u8,
        qualifier: TradeQualifier,
        side: AggressorSide,
        price: i64,
        qty: i64,
        ts_trade: u64,
        counterparty_ids: [i64; 2],
        exec_id: i64,
    },
    Status {
        value: StatusValue,
    },
    StatPrice {
        id: StatPriceId,
        action: StatAction,
        value: i64,
    },
    StatQty {
        id: StatQtyId,
        action: StatAction,
        value: i64,
    },
    StatTime {
        id: StatTimeId,
        action: StatAction,
        value: u64,
    },
    QuoteRequest {
        request_type: QuoteRequestType,
        side: QuoteRequestSide,
        price: i64,
        qty: i64,
        ts_transact: u64,
    },
    BookReset,
    EventEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketEvent {
    pub envelope: EventEnvelope,
    pub payload: MarketEventPayload,
}

impl MarketEvent {
    pub fn event_end(channel_id: ChannelId, indesc: InstrumentDesc) -> Self {
        Self {
            envelope: EventEnvelope {
                channel_id,
                indesc,
                packet_sequence: 0,
                message_sequence: 0,
                ts_exchange_send: 0,
                ts_server_recv: 0,
            },
            payload: MarketEventPayload::EventEnd,
        }
    }
}

/// Which of the two consumer channels an event is routed to (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventRoute {
    Incremental,
    Snapshot,
}
