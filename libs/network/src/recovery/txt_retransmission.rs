//! TCP retransmission state machine for the TXT gap-recovery dialog
//! (§4.5, §4.7), grounded in `mx_recovery_handler.h`'s `_ProcessMessage`
//! switch and in shape on the teacher's [`crate::recovery`] state-machine
//! pattern (`RecoveryManager` driving a small explicit enum rather than a
//! callback web).
//!
//! This type owns no socket and no timer, per the core's non-goals: it
//! only tracks protocol state and hands the caller a list of
//! [`TxtRecoveryAction`]s to perform. The caller (an adapter binary) owns
//! the actual [`crate::transports::TxtRecoveryConnection`] and an abandon
//! deadline it polls against [`TxtRecoveryDriver::abandon_deadline`].

use std::collections::HashSet;
use std::time::{Duration, Instant};

use codec::txt::control::{encode_login, encode_logout, encode_retransmission_request};

use crate::error::{NetworkError, Result};

#[derive(Debug, Clone)]
pub struct TxtRecoveryConfig {
    pub username: String,
    pub password: String,
    pub line: [u8; 2],
    pub timeout: Duration,
    pub page_size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxtRecoveryState {
    Idle,
    Connecting { from: u64, to: u64 },
    LoggingIn { from: u64, to: u64 },
    Retransmitting { cursor: u64, to: u64, page_to: u64 },
    LoggingOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxtRecoveryAction {
    Connect,
    Send(Vec<u8>),
    Disconnect,
    /// Recovery has ended, successfully or not; §4.7's completion steps
    /// (signal Stable, replay `buffered`, emit `EventEnd`) are the
    /// caller's responsibility, not this driver's.
    RecoveryComplete { failed: bool },
}

/// Outcome of sanity-checking one retransmitted record's sequence number
/// against the requested gap (§4.5 "each retransmitted message is also
/// sanity-checked").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageVerdict {
    /// In range and not seen before; the caller should dispatch it.
    Accept,
    /// Already applied in this recovery cycle; drop silently.
    Duplicate,
    /// Outside `[from, to]`; the sender is misbehaving.
    OutOfRange,
}

/// Drives one TXT recovery cycle. A fresh `request_gap` call is valid
/// from any state -- the reference handler always cancels and reconnects
/// rather than queuing a second gap behind the first.
pub struct TxtRecoveryDriver {
    config: TxtRecoveryConfig,
    state: TxtRecoveryState,
    abandon_deadline: Option<Instant>,
    seen: HashSet<u64>,
}

impl TxtRecoveryDriver {
    pub fn new(config: TxtRecoveryConfig) -> Self {
        Self {
            config,
            state: TxtRecoveryState::Idle,
            abandon_deadline: None,
            seen: HashSet::new(),
        }
    }

    pub fn state(&self) -> &TxtRecoveryState {
        &self.state
    }

    /// Deadline the caller should compare its own clock against; firing
    /// it calls [`Self::on_abandon_expired`]. `None` means no recovery is
    /// in flight.
    pub fn abandon_deadline(&self) -> Option<Instant> {
        self.abandon_deadline
    }

    /// §4.4.1: a gap was just detected (or widened). Always resets to a
    /// fresh cycle -- cancels any abandon timer, tears down any prior
    /// session, and starts a new one.
    pub fn request_gap(&mut self, from: u64, to: u64) -> Vec<TxtRecoveryAction> {
        let mut actions = Vec::new();
        if self.state != TxtRecoveryState::Idle {
            actions.push(TxtRecoveryAction::Disconnect);
        }
        self.seen.clear();
        self.abandon_deadline = Some(Instant::now() + self.config.timeout);
        self.state = TxtRecoveryState::Connecting { from, to };
        actions.push(TxtRecoveryAction::Connect);
        actions
    }

    /// TCP connected; send `Login` with the configured credentials and
    /// the caller-supplied `HHMMSS` timestamp (the driver doesn't own a
    /// clock).
    pub fn on_connected(&mut self, timestamp: &[u8; 6]) -> Result<Vec<TxtRecoveryAction>> {
        let (from, to) = match self.state {
            TxtRecoveryState::Connecting { from, to } => (from, to),
            _ => return Err(NetworkError::connection("on_connected outside Connecting state")),
        };
        let login = frame_record(0, b"LI", &encode_login(&self.config.username, &self.config.password, timestamp));
        self.state = TxtRecoveryState::LoggingIn { from, to };
        Ok(vec![TxtRecoveryAction::Send(login)])
    }

    /// `KI`: send the first paged `RT`.
    pub fn on_login_ack(&mut self) -> Result<Vec<TxtRecoveryAction>> {
        let (from, to) = match self.state {
            TxtRecoveryState::LoggingIn { from, to } => (from, to),
            _ => return Err(NetworkError::connection("on_login_ack outside LoggingIn state")),
        };
        let page_to = page_boundary(from, to, self.config.page_size);
        let request = frame_record(
            0,
            b"RT",
            &encode_retransmission_request(&self.config.line, from, page_to),
        );
        self.state = TxtRecoveryState::Retransmitting {
            cursor: from.saturating_sub(1),
            to,
            page_to,
        };
        Ok(vec![TxtRecoveryAction::Send(request)])
    }

    /// `RB`: the requested page is open. Only cancels the abandon timer.
    pub fn on_retransmission_begin(&mut self) -> Result<()> {
        match self.state {
            TxtRecoveryState::Retransmitting { .. } => {
                self.abandon_deadline = None;
                Ok(())
            }
            _ => Err(NetworkError::connection("on_retransmission_begin outside Retransmitting state")),
        }
    }

    /// Sanity-check and track one retransmitted record's sequence.
    pub fn on_message(&mut self, seq: u64) -> Result<MessageVerdict> {
        let (cursor, to) = match self.state {
            TxtRecoveryState::Retransmitting { cursor, to, .. } => (cursor, to),
            _ => return Err(NetworkError::connection("on_message outside Retransmitting state")),
        };
        if seq < cursor.saturating_add(1) || seq > to {
            return Ok(MessageVerdict::OutOfRange);
        }
        if !self.seen.insert(seq) {
            return Ok(MessageVerdict::Duplicate);
        }
        if let TxtRecoveryState::Retransmitting { cursor, .. } = &mut self.state {
            *cursor = seq;
        }
        Ok(MessageVerdict::Accept)
    }

    /// `RE`: either the whole gap is closed (`cursor == to`), or another
    /// page must be requested.
    pub fn on_retransmission_end(&mut self) -> Result<Vec<TxtRecoveryAction>> {
        let (cursor, to) = match self.state {
            TxtRecoveryState::Retransmitting { cursor, to, .. } => (cursor, to),
            _ => return Err(NetworkError::connection("on_retransmission_end outside Retransmitting state")),
        };
        if cursor >= to {
            self.state = TxtRecoveryState::LoggingOut;
            return Ok(vec![
                TxtRecoveryAction::Send(frame_record(0, b"LO", &encode_logout())),
                TxtRecoveryAction::RecoveryComplete { failed: false },
            ]);
        }
        let from = cursor + 1;
        let page_to = page_boundary(from, to, self.config.page_size);
        self.state = TxtRecoveryState::Retransmitting { cursor, to, page_to };
        let request = frame_record(
            0,
            b"RT",
            &encode_retransmission_request(&self.config.line, from, page_to),
        );
        Ok(vec![TxtRecoveryAction::Send(request)])
    }

    /// `ER`: log only (the caller does the logging; this just validates
    /// state) and continue the dialog.
    pub fn on_error(&self) -> Result<()> {
        if self.state == TxtRecoveryState::Idle {
            return Err(NetworkError::connection("on_error while Idle"));
        }
        Ok(())
    }

    /// `KO`: the logout dialog is done, tear down the connection.
    pub fn on_logout_ack(&mut self) -> Result<Vec<TxtRecoveryAction>> {
        self.state = TxtRecoveryState::Idle;
        self.abandon_deadline = None;
        Ok(vec![TxtRecoveryAction::Disconnect])
    }

    /// The caller observed `abandon_deadline` elapse: disconnect and
    /// report failure so §4.7's completion steps still run.
    pub fn on_abandon_expired(&mut self) -> Vec<TxtRecoveryAction> {
        self.state = TxtRecoveryState::Idle;
        self.abandon_deadline = None;
        self.seen.clear();
        vec![
            TxtRecoveryAction::Disconnect,
            TxtRecoveryAction::RecoveryComplete { failed: true },
        ]
    }
}

/// `min(ceil(from / pageSize) * pageSize, to)`.
fn page_boundary(from: u64, to: u64, page_size: u64) -> u64 {
    if page_size == 0 {
        return to;
    }
    let aligned = from.div_ceil(page_size) * page_size;
    aligned.min(to)
}

fn frame_record(seq_num: u64, msg_type: &[u8; 2], body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + 12 + body.len() + 1);
    out.push(0x02);
    out.extend_from_slice(format!("{:010}", seq_num).as_bytes());
    out.extend_from_slice(msg_type);
    out.extend_from_slice(body);
    out.push(0x03);
    out
}
