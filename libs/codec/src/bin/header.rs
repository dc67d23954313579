use byteorder::{BigEndian, ByteOrder};

use crate::error::{DecodeError, DecodeResult};

/// Header of a BIN packet: one per UDP datagram, in front of one or more
/// application messages. `ApplSeqNum` is the packet-level sequence number
/// the [`crate::SegmentProcessor`]-equivalent gap detector tracks;
/// `MarketSegmentID` says which segment's order book the packet's
/// messages belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    appl_seq_num: u32,
    market_segment_id: i32,
    completion_indicator: u8,
}

impl PacketHeader {
    pub const SIZE: usize = 9;

    pub fn decode(buf: &[u8]) -> DecodeResult<Self> {
        if buf.len() < Self::SIZE {
            return Err(DecodeError::truncated("BIN PacketHeader", Self::SIZE, buf.len()));
        }
        Ok(Self {
            appl_seq_num: BigEndian::read_u32(&buf[0..4]),
            market_segment_id: BigEndian::read_i32(&buf[4..8]),
            completion_indicator: buf[8],
        })
    }

    pub fn appl_seq_num(&self) -> u32 {
        self.appl_seq_num
    }

    pub fn market_segment_id(&self) -> i32 {
        self.market_segment_id
    }

    /// `true` when this is the last packet of a multi-packet burst
    /// sharing one `ApplSeqNum` (mirrors EOBI's `LastFragment` bit).
    pub fn is_last_in_packet(&self) -> bool {
        self.completion_indicator != 0
    }
}

/// Header in front of every application-level message inside a packet
/// body. `BodyLen` is the length of the whole message (this header
/// included), which is what lets [`super::iter_messages`] advance without
/// knowing the payload shape up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    body_len: u16,
    template_id: u16,
    msg_seq_num: u32,
}

impl MessageHeader {
    pub const SIZE: usize = 8;

    pub fn decode(buf: &[u8]) -> DecodeResult<Self> {
        if buf.len() < Self::SIZE {
            return Err(DecodeError::truncated("BIN MessageHeader", Self::SIZE, buf.len()));
        }
        Ok(Self {
            body_len: BigEndian::read_u16(&buf[0..2]),
            template_id: BigEndian::read_u16(&buf[2..4]),
            msg_seq_num: BigEndian::read_u32(&buf[4..8]),
        })
    }

    pub fn body_len(&self) -> u16 {
        self.body_len
    }

    pub fn template_id(&self) -> u16 {
        self.template_id
    }

    pub fn msg_seq_num(&self) -> u32 {
        self.msg_seq_num
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_buffer() {
        assert!(matches!(
            PacketHeader::decode(&[0u8; 4]),
            Err(DecodeError::Truncated { .. })
        ));
        assert!(matches!(
            MessageHeader::decode(&[0u8; 2]),
            Err(DecodeError::Truncated { .. })
        ));
    }
}
