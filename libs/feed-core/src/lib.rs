//! Protocol-agnostic feed handler core (§4 of the feed handler spec):
//! order-book state, the BIN Segment Processor, the TXT Channel Processor,
//! and the downstream sink interface they publish to.
//!
//! Nothing in this crate touches a socket or a clock of its own -- both
//! processors take `now_ns` from the caller, the way
//! [`network::time::CachedClock`] hands it out, and the caller (the
//! adapter binaries in `services/`) owns every transport.

pub mod bin;
pub mod order_book;
pub mod sink;
pub mod txt;

pub use order_book::OrderBook;
pub use sink::MarketDataSink;
