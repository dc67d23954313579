use crate::error::{DecodeError, DecodeResult};
use crate::txt::ascii::parse_digits;

pub const STX: u8 = 0x02;
pub const ETX: u8 = 0x03;

/// Header on every short-form TXT record: a 10-digit ASCII sequence
/// number and a 2-byte message type discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MsgHeader {
    pub seq_num: u64,
    pub msg_type: [u8; 2],
}

impl MsgHeader {
    pub const SIZE: usize = 12;

    pub fn decode(buf: &[u8]) -> DecodeResult<Self> {
        if buf.len() < Self::SIZE {
            return Err(DecodeError::truncated("TXT MsgHeader", Self::SIZE, buf.len()));
        }
        Ok(Self {
            seq_num: parse_digits("seqNum", &buf[0..10])?,
            msg_type: [buf[10], buf[11]],
        })
    }
}

/// Header on long-form records (market data and administrative
/// messages): the same 12 bytes plus a 20-byte exchange timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LongMsgHeader {
    pub seq_num: u64,
    pub msg_type: [u8; 2],
    pub timestamp: [u8; 20],
}

impl LongMsgHeader {
    pub const SIZE: usize = 32;

    pub fn decode(buf: &[u8]) -> DecodeResult<Self> {
        if buf.len() < Self::SIZE {
            return Err(DecodeError::truncated("TXT LongMsgHeader", Self::SIZE, buf.len()));
        }
        let mut timestamp = [0u8; 20];
        timestamp.copy_from_slice(&buf[12..32]);
        Ok(Self {
            seq_num: parse_digits("seqNum", &buf[0..10])?,
            msg_type: [buf[10], buf[11]],
            timestamp,
        })
    }
}

/// Scan `buf` for the next `STX ... ETX` framed record starting at or
/// after `from`. Returns the record's contents (STX/ETX stripped) and
/// the offset one past the closing ETX, so callers can keep calling this
/// with the returned offset to walk an entire TCP/multicast buffer.
pub fn next_frame(buf: &[u8], from: usize) -> DecodeResult<Option<(&[u8], usize)>> {
    let Some(stx_rel) = buf[from..].iter().position(|&b| b == STX) else {
        return Ok(None);
    };
    let stx = from + stx_rel;
    let Some(etx_rel) = buf[stx + 1..].iter().position(|&b| b == ETX) else {
        return Ok(None);
    };
    let etx = stx + 1 + etx_rel;
    Ok(Some((&buf[stx + 1..etx], etx + 1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_short_header() {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"0000000042");
        buf.extend_from_slice(b"KI");
        let h = MsgHeader::decode(&buf).unwrap();
        assert_eq!(h.seq_num, 42);
        assert_eq!(&h.msg_type, b"KI");
    }

    #[test]
    fn frames_one_record_between_stx_and_etx() {
        let mut buf = vec![0u8; 3];
        buf[0] = b'x';
        buf.push(STX);
        buf.extend_from_slice(b"hello");
        buf.push(ETX);
        buf.push(b'y');
        let (record, next) = next_frame(&buf, 0).unwrap().unwrap();
        assert_eq!(record, b"hello");
        assert_eq!(buf[next], b'y');
    }

    #[test]
    fn returns_none_when_no_more_frames() {
        let buf = b"no frame markers here".to_vec();
        assert!(next_frame(&buf, 0).unwrap().is_none());
    }
}
