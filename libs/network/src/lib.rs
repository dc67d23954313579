//! Transports and recovery state machines for the BIN and TXT feeds.
//!
//! This crate owns the sockets (§5: "only the adapter binaries own an
//! actual socket, and they do it through these wrappers") and the two
//! Recovery Driver state machines (§4.5, §4.6). It does not decode wire
//! payloads (that's [`codec`]) and does not hold order-book or
//! sequence-tracking state (that's `feed-core`'s Segment/Channel
//! Processor).

pub mod error;
pub mod recovery;
pub mod time;
pub mod transports;

pub use error::{NetworkError, Result};
pub use time::CachedClock;
pub use transports::{MulticastSocket, TxtRecoveryConnection};
