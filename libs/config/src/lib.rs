//! Per-channel configuration for the BIN and TXT feed adapters.

pub mod channel;

pub use channel::{ChannelConfig, ChannelProtocol, FeedEndpoint, TxtRecoverySettings, load_channels};
