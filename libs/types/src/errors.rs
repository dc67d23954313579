//! Error types shared by the decoders and the segment/channel processors.

use thiserror::Error;

/// Errors in decoding month/currency/fraction-indicator codes (§7:
/// "Unrecognized month/currency/fraction indicator: assert in debug,
/// default to Unknown, continue").
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodeError {
    #[error("unrecognized month code: {0:#04x}")]
    UnknownMonth(u8),
    #[error("unrecognized fraction indicator: {0:#04x}")]
    UnknownFractionIndicator(u8),
    #[error("unrecognized size exponent: {0:#04x}")]
    UnknownSizeExponent(u8),
}
