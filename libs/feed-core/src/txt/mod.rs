//! TXT (MX HSVF-style) feed handler core: §4.4 of the feed handler spec.

mod channel;
mod status;
mod trade;

pub use channel::{SeqGap, TxtChannelProcessor};
