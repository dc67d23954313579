//! Recovery Driver (§4.5, §4.6): the two gap-recovery mechanisms the core
//! hands off to. Neither owns a socket or a process-lifecycle timer --
//! both are pure state machines that describe what the caller should do
//! next.

pub mod bin_snapshot;
pub mod txt_retransmission;

pub use bin_snapshot::{FeedAction, SnapshotFeedControl};
pub use txt_retransmission::{
    MessageVerdict, TxtRecoveryAction, TxtRecoveryConfig, TxtRecoveryDriver, TxtRecoveryState,
};
