//! BIN (EOBI-style) multicast feed adapter: wires [`config::ChannelConfig`]
//! to a [`feed_core::bin::BinChannelProcessor`] per channel over the
//! network/worker executor split in [`adapter`].

pub mod adapter;
pub mod sink;

pub use adapter::{BinAdapter, ChannelHealth};
