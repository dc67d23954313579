//! Fixed-width ASCII field decoding shared by every HSVF-style record.
//!
//! Every numeric field on this wire is right-justified ASCII digits (no
//! sign byte of its own beyond the sign bytes a handful of fields carry
//! separately), and every price field is followed by a one-byte fraction
//! indicator that says how to scale the raw digits into a price. Decimal
//! scaling constants mirror the original handler's `GetPrice`/
//! `GetMultiplierFromIndicatorCode`/`GetMonth` tables exactly, fraction
//! indicator included: `'0'..'9'` divide by a power of ten, `'A'..'G'`
//! divide the same way but negate, and `'U'..'Z'` multiply by a power of
//! ten instead of dividing.

use crate::error::{DecodeError, DecodeResult};
use types::CodeError;

/// Parse a fixed-width, right-justified ASCII digit field into a `u64`.
/// Leading space padding is tolerated (treated as zero); any other
/// non-digit byte is an error.
pub fn parse_digits(field: &'static str, buf: &[u8]) -> DecodeResult<u64> {
    let mut value: u64 = 0;
    for &b in buf {
        match b {
            b'0'..=b'9' => value = value * 10 + (b - b'0') as u64,
            b' ' => {}
            _ => {
                return Err(DecodeError::NonNumericAscii {
                    field,
                    offset: 0,
                    bytes: buf.to_vec(),
                })
            }
        }
    }
    Ok(value)
}

pub fn parse_digits_i64(field: &'static str, buf: &[u8]) -> DecodeResult<i64> {
    parse_digits(field, buf).map(|v| v as i64)
}

/// Decode a `'+'`/`'-'` sign byte followed by a magnitude field into a
/// signed value (used by `netChangeSign` + `netChange` pairs).
pub fn parse_signed(field: &'static str, sign: u8, magnitude: &[u8]) -> DecodeResult<i64> {
    let value = parse_digits_i64(field, magnitude)?;
    Ok(if sign == b'-' { -value } else { value })
}

/// Raw price digits scaled by a fraction indicator byte, mirroring the
/// reference `GetPrice`: digits `'0'..'9'` divide by `10^n`, `'A'..'G'`
/// divide by `10^n` *and* negate, `'U'..'Z'` multiply by `10^n` instead
/// (n = 1 for `'Z'` up to n = 6 for `'U'`). The result is kept as an
/// integer numerator/scale pair rather than a float: `raw` and the
/// returned `FractionScale` together let the caller apply the scale
/// exactly once, at whatever precision the consuming event wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FractionScale {
    /// Divide the raw value by `10^n`.
    Divide(u32),
    /// Divide by `10^n` and flip the sign.
    DivideNegate(u32),
    /// Multiply the raw value by `10^n`.
    Multiply(u32),
}

pub fn decode_fraction_indicator(indicator: u8) -> DecodeResult<FractionScale> {
    Ok(match indicator {
        b'0'..=b'9' => FractionScale::Divide((indicator - b'0') as u32),
        b'A'..=b'G' => FractionScale::DivideNegate((indicator - b'A') as u32),
        b'Z' => FractionScale::Multiply(1),
        b'Y' => FractionScale::Multiply(2),
        b'X' => FractionScale::Multiply(3),
        b'W' => FractionScale::Multiply(4),
        b'V' => FractionScale::Multiply(5),
        b'U' => FractionScale::Multiply(6),
        other => return Err(CodeError::UnknownFractionIndicator(other).into()),
    })
}

fn pow10(n: u32) -> i64 {
    10i64.pow(n)
}

/// Apply a decoded `FractionScale` to a raw integer, returning a price
/// expressed as an integer numerator over 10^`scale_out` (the instrument
/// definition's own `decimals`, via `AdjustPrice`-equivalent rescaling
/// happens in `feed-core`, not here -- this just reproduces the wire's
/// own arithmetic).
pub fn apply_fraction(raw: i64, scale: FractionScale) -> i64 {
    match scale {
        FractionScale::Divide(n) if n == 0 => raw,
        FractionScale::Divide(n) => raw / pow10(n),
        FractionScale::DivideNegate(n) if n == 0 => -raw,
        FractionScale::DivideNegate(n) => -(raw / pow10(n)),
        FractionScale::Multiply(n) => raw * pow10(n),
    }
}

/// Decode a price field (digits + trailing fraction indicator byte) in
/// one step.
pub fn decode_price(field: &'static str, digits: &[u8], indicator: u8) -> DecodeResult<i64> {
    let raw = parse_digits_i64(field, digits)?;
    let scale = decode_fraction_indicator(indicator)?;
    Ok(apply_fraction(raw, scale))
}

/// Size-exponent letters used on contract-size style fields: `C'..'J'`
/// encode powers of ten from 10^2 up to 10^8, with `J` an alias for 10^8
/// (the reference table maps both `I` and `J` to the same multiplier).
pub fn decode_size_exponent(marker: u8) -> DecodeResult<u32> {
    Ok(match marker {
        b'C' => 100,
        b'D' => 1_000,
        b'E' => 10_000,
        b'F' => 100_000,
        b'G' => 1_000_000,
        b'H' => 10_000_000,
        b'I' => 100_000_000,
        b'J' => 100_000_000,
        other => return Err(CodeError::UnknownSizeExponent(other).into()),
    })
}

/// Futures month code: single alphabet, `F`=Jan through `Z`=Dec skipping
/// the letters with no contract month.
pub fn decode_futures_month(code: u8) -> DecodeResult<u8> {
    Ok(match code {
        b'F' => 1,
        b'G' => 2,
        b'H' => 3,
        b'J' => 4,
        b'K' => 5,
        b'M' => 6,
        b'N' => 7,
        b'Q' => 8,
        b'U' => 9,
        b'V' => 10,
        b'X' => 11,
        b'Z' => 12,
        other => return Err(CodeError::UnknownMonth(other).into()),
    })
}

/// Option month code: dual alphabet, `A..L` and `M..X` both cover Jan
/// through Dec (one alphabet per option right, call vs. put).
pub fn decode_option_month(code: u8) -> DecodeResult<u8> {
    Ok(match code {
        b'A' | b'M' => 1,
        b'B' | b'N' => 2,
        b'C' | b'O' => 3,
        b'D' | b'P' => 4,
        b'E' | b'Q' => 5,
        b'F' | b'R' => 6,
        b'G' | b'S' => 7,
        b'H' | b'T' => 8,
        b'I' | b'U' => 9,
        b'J' | b'V' => 10,
        b'K' | b'W' => 11,
        b'L' | b'X' => 12,
        other => return Err(CodeError::UnknownMonth(other).into()),
    })
}

/// Rescale a wire price from the fraction indicator's implied decimals to
/// the instrument's own decimals, mirroring the reference `AdjustPrice`:
/// if the instrument carries more decimals than the message, scale up; if
/// fewer, scale down; if the instrument isn't known, pass the price
/// through unchanged.
pub fn adjust_price(raw_price: i64, msg_decimals: i32, instrument_decimals: Option<i32>) -> i64 {
    let Some(instrument_decimals) = instrument_decimals else {
        return raw_price;
    };
    let diff = instrument_decimals - msg_decimals;
    if diff > 0 {
        raw_price * pow10(diff as u32)
    } else if diff < 0 {
        raw_price / pow10((-diff) as u32)
    } else {
        raw_price
    }
}

/// `msgDecimals` as used by `AdjustPrice`: digits decode to a decimal
/// count directly, letters decode to `code - 'A'`.
pub fn fraction_indicator_decimals(indicator: u8) -> i32 {
    if indicator.is_ascii_alphabetic() {
        (indicator - b'A') as i32
    } else {
        (indicator - b'0') as i32
    }
}

/// A price field carried at its own wire precision, not yet rescaled to
/// an instrument's chosen decimals. The reference handler reads these
/// fields' raw digits straight off the wire and only calls `AdjustPrice`
/// once the instrument's `decimals` are known (sometimes several
/// messages later); `WirePrice` lets decoders do the same without
/// guessing at an instrument's decimals at decode time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WirePrice {
    pub raw: i64,
    pub msg_decimals: i32,
}

impl WirePrice {
    pub fn decode(field: &'static str, digits: &[u8], indicator: u8) -> DecodeResult<Self> {
        Ok(Self {
            raw: parse_digits_i64(field, digits)?,
            msg_decimals: fraction_indicator_decimals(indicator),
        })
    }

    /// Rescale to `instrument_decimals` (`AdjustPrice`); passes the raw
    /// wire value through unchanged while the instrument isn't known yet.
    pub fn adjust(self, instrument_decimals: Option<i32>) -> i64 {
        adjust_price(self.raw, self.msg_decimals, instrument_decimals)
    }
}
