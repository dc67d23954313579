//! TCP retransmission dialog control messages (§4.5.2).
//!
//! These frame the same way as every other TXT record (`STX`...`ETX`,
//! stripped by [`super::header::next_frame`] before any of the `decode_*`
//! functions here see the bytes) but carry no `LongMsgHeader` timestamp
//! -- the short [`super::header::MsgHeader`] is enough since this dialog
//! never needs a snapshot feed to agree on gap boundaries, only a
//! from/to sequence range.

use crate::error::{DecodeError, DecodeResult};
use crate::txt::header::MsgHeader;

/// `KI`: server's reply to a client `Login`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginAcknowledgement {
    pub header: MsgHeader,
}

impl LoginAcknowledgement {
    pub const MSG_TYPE: [u8; 2] = *b"KI";

    pub fn decode(buf: &[u8]) -> DecodeResult<Self> {
        Ok(Self {
            header: MsgHeader::decode(buf)?,
        })
    }
}

/// `RB`: server acknowledges the retransmission window has opened; the
/// messages between `fromSequence` and `toSequence` follow as ordinary
/// TXT records, identified only by their own sequence numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetransmissionBegin {
    pub header: MsgHeader,
}

impl RetransmissionBegin {
    pub const MSG_TYPE: [u8; 2] = *b"RB";

    pub fn decode(buf: &[u8]) -> DecodeResult<Self> {
        Ok(Self {
            header: MsgHeader::decode(buf)?,
        })
    }
}

/// `RE`: signals the end of one retransmission page. The client compares
/// `header.seq_num` against its requested `toSequence`: equal means the
/// whole gap is closed, otherwise the client must issue another `RT` for
/// the next page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetransmissionEnd {
    pub header: MsgHeader,
}

impl RetransmissionEnd {
    pub const MSG_TYPE: [u8; 2] = *b"RE";

    pub fn decode(buf: &[u8]) -> DecodeResult<Self> {
        Ok(Self {
            header: MsgHeader::decode(buf)?,
        })
    }
}

/// `KO`: server's reply to a client `Logout`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogoutAcknowledgement {
    pub header: MsgHeader,
}

impl LogoutAcknowledgement {
    pub const MSG_TYPE: [u8; 2] = *b"KO";

    pub fn decode(buf: &[u8]) -> DecodeResult<Self> {
        Ok(Self {
            header: MsgHeader::decode(buf)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorMessage {
    pub header: MsgHeader,
    pub error_code: [u8; 4],
    pub error_text: [u8; 80],
}

impl ErrorMessage {
    pub const MSG_TYPE: [u8; 2] = *b"ER";
    pub const SIZE: usize = MsgHeader::SIZE + 4 + 80;

    pub fn decode(buf: &[u8]) -> DecodeResult<Self> {
        if buf.len() < Self::SIZE {
            return Err(DecodeError::truncated("TXT ErrorMessage", Self::SIZE, buf.len()));
        }
        let header = MsgHeader::decode(buf)?;
        let mut error_code = [0u8; 4];
        error_code.copy_from_slice(&buf[12..16]);
        let mut error_text = [0u8; 80];
        error_text.copy_from_slice(&buf[16..96]);
        Ok(Self {
            header,
            error_code,
            error_text,
        })
    }
}

/// `username`/`password` are space-padded right to 16 bytes; `protocol`
/// is always the literal `"D7"` (matches the reference handler's
/// `_SendLogin`).
pub fn encode_login(username: &str, password: &str, timestamp: &[u8; 6]) -> Vec<u8> {
    let mut out = Vec::with_capacity(16 + 16 + 6 + 2);
    pad_left_space(&mut out, username.as_bytes(), 16);
    pad_left_space(&mut out, password.as_bytes(), 16);
    out.extend_from_slice(timestamp);
    out.extend_from_slice(b"D7");
    out
}

pub fn encode_logout() -> Vec<u8> {
    Vec::new()
}

/// `line` is the 2-character line identifier; sequence bounds are
/// zero-padded to 10 ASCII digits (matches `_SendRetransmissionRequest`).
pub fn encode_retransmission_request(line: &[u8; 2], from_seq: u64, to_seq: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(2 + 10 + 10);
    out.extend_from_slice(line);
    out.extend_from_slice(format!("{:010}", from_seq).as_bytes());
    out.extend_from_slice(format!("{:010}", to_seq).as_bytes());
    out
}

fn pad_left_space(out: &mut Vec<u8>, value: &[u8], width: usize) {
    let pad = width.saturating_sub(value.len());
    out.extend(std::iter::repeat(b' ').take(pad));
    out.extend_from_slice(&value[..value.len().min(width)]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_login_credentials_to_sixteen_bytes() {
        let login = encode_login("bob", "secret", &[b'0'; 6]);
        assert_eq!(&login[0..16], b"             bob");
        assert_eq!(&login[16..32], b"          secret");
        assert_eq!(&login[38..40], b"D7");
    }

    #[test]
    fn zero_pads_retransmission_sequence_bounds() {
        let req = encode_retransmission_request(b"L1", 5, 123);
        assert_eq!(&req[0..2], b"L1");
        assert_eq!(&req[2..12], b"0000000005");
        assert_eq!(&req[12..22], b"0000000123");
    }
}
