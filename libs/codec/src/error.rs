//! Decode errors for the BIN and TXT wire formats.
//!
//! Both decoders are non-owning views over a caller-supplied byte slice, so
//! most failures here are truncation or an unrecognized discriminant rather
//! than anything the decoder itself can repair.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Buffer shorter than the structure being read out of it.
    #[error("{context}: need {need} bytes, got {got}")]
    Truncated {
        need: usize,
        got: usize,
        context: &'static str,
    },

    /// BIN `TemplateID` not present in the dispatch table.
    #[error("unknown BIN template id {template_id} (body_len {body_len}, offset {offset})")]
    UnknownTemplate {
        template_id: u16,
        body_len: u16,
        offset: usize,
    },

    /// TXT two-byte `msgType` not present in the dispatch table.
    #[error("unknown TXT message type {msg_type:?} (record at offset {offset})")]
    UnknownRecordType { msg_type: [u8; 2], offset: usize },

    /// A TXT record was not framed with the expected STX/ETX pair.
    #[error("malformed TXT frame at offset {offset}: {reason}")]
    MalformedFrame { offset: usize, reason: &'static str },

    /// A fixed-width ASCII numeric field contained a non-digit byte.
    #[error("non-numeric ASCII field {field} at offset {offset}: {bytes:?}")]
    NonNumericAscii {
        field: &'static str,
        offset: usize,
        bytes: Vec<u8>,
    },

    #[error(transparent)]
    Code(#[from] types::CodeError),
}

impl DecodeError {
    pub fn truncated(context: &'static str, need: usize, got: usize) -> Self {
        Self::Truncated { context, need, got }
    }
}

pub type DecodeResult<T> = std::result::Result<T, DecodeError>;
