//! Thin tokio transport wrappers. Neither the segment/channel processors
//! nor the recovery state machines in [`crate::recovery`] touch these
//! directly -- they're pure state machines that take bytes in and
//! describe actions out. Only the adapter binaries (`services/`) own an
//! actual socket, and they do it through these wrappers.

pub mod tcp;
pub mod udp;

pub use tcp::TxtRecoveryConnection;
pub use udp::MulticastSocket;
