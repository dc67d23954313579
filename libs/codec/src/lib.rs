//! Wire decoders for the two exchange protocols this feed handler speaks.
//!
//! - [`bin`] reads the EOBI-style big-endian binary packets (multicast
//!   A/B feed plus snapshot recovery feed).
//! - [`txt`] reads the HSVF-style ASCII record-per-message packets
//!   (multicast feed plus TCP retransmission recovery).
//!
//! Neither module owns a socket; both decode from a byte slice the caller
//! already received, and hand back zero-copy views plus enough information
//! for the segment/channel processors in `feed-core` to advance past each
//! message.

pub mod bin;
pub mod error;
pub mod txt;

pub use error::{DecodeError, DecodeResult};
