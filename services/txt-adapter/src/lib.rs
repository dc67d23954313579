//! TXT (Montreal MX HSVF-style) ASCII feed adapter: wires
//! [`config::ChannelConfig`] to a [`feed_core::txt::TxtChannelProcessor`]
//! per channel, driving TCP retransmission recovery itself rather than a
//! second multicast feed (see [`adapter`]).

pub mod adapter;
pub mod sink;

pub use adapter::{ChannelHealth, TxtAdapter};
