//! BIN wire decoder (EOBI-style multicast binary feed).
//!
//! A BIN packet is a [`PacketHeader`] followed by one or more
//! `MessageHeader` + payload pairs back to back, each advanced by the
//! header's own `BodyLen` (the length of the whole message, header
//! included). Every multi-byte field is big-endian. [`iter_messages`]
//! walks a packet's body and yields a decoded [`BinMessage`] per entry;
//! callers pass the same bytes whether the packet arrived on the
//! incremental multicast feed or the snapshot recovery feed — template
//! IDs tell the two families of messages apart.

mod header;
mod templates;

pub use header::{PacketHeader, MessageHeader};
pub use templates::*;

use crate::error::{DecodeError, DecodeResult};

/// One decoded BIN application message, tagged by its `TemplateID`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinMessage {
    OrderAdd(OrderAdd),
    OrderDelete(OrderDelete),
    OrderModify(OrderModify),
    OrderModifySamePrio(OrderModifySamePrio),
    OrderMassDelete(OrderMassDelete),
    PartialOrderExecution(OrderExecution),
    FullOrderExecution(OrderExecution),
    ExecutionSummary(ExecutionSummary),
    TradeReport(TradeReport),
    InstrumentStateChange(InstrumentStateChange),
    ProductStateChange(ProductStateChange),
    QuoteRequest(QuoteRequest),
    CrossRequest(CrossRequest),
    Heartbeat(Heartbeat),
    ProductSummary(ProductSummary),
    InstrumentSummary(InstrumentSummary),
    SnapshotOrder(SnapshotOrder),
    AuctionBBO(AuctionBBO),
    AuctionClearingPrice(AuctionClearingPrice),
}

/// A single entry read out of a packet body: the message header plus its
/// decoded payload, and the byte offset the next entry starts at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedEntry {
    pub header: MessageHeader,
    pub message: BinMessage,
}

/// Decode the `TemplateID`-tagged payload following a `MessageHeader`.
///
/// `payload` is exactly `header.body_len() - MessageHeader::SIZE` bytes;
/// `iter_messages` slices it out before calling this.
pub fn decode_payload(header: MessageHeader, payload: &[u8]) -> DecodeResult<BinMessage> {
    Ok(match header.template_id() {
        templates::OrderAdd::TEMPLATE_ID => BinMessage::OrderAdd(OrderAdd::decode(payload)?),
        templates::OrderDelete::TEMPLATE_ID => {
            BinMessage::OrderDelete(OrderDelete::decode(payload)?)
        }
        templates::OrderModify::TEMPLATE_ID => {
            BinMessage::OrderModify(OrderModify::decode(payload)?)
        }
        templates::OrderModifySamePrio::TEMPLATE_ID => {
            BinMessage::OrderModifySamePrio(OrderModifySamePrio::decode(payload)?)
        }
        templates::OrderMassDelete::TEMPLATE_ID => {
            BinMessage::OrderMassDelete(OrderMassDelete::decode(payload)?)
        }
        templates::PARTIAL_ORDER_EXECUTION_TEMPLATE_ID => {
            BinMessage::PartialOrderExecution(OrderExecution::decode(payload)?)
        }
        templates::FULL_ORDER_EXECUTION_TEMPLATE_ID => {
            BinMessage::FullOrderExecution(OrderExecution::decode(payload)?)
        }
        templates::ExecutionSummary::TEMPLATE_ID => {
            BinMessage::ExecutionSummary(ExecutionSummary::decode(payload)?)
        }
        templates::TradeReport::TEMPLATE_ID => {
            BinMessage::TradeReport(TradeReport::decode(payload)?)
        }
        templates::InstrumentStateChange::TEMPLATE_ID => {
            BinMessage::InstrumentStateChange(InstrumentStateChange::decode(payload)?)
        }
        templates::ProductStateChange::TEMPLATE_ID => {
            BinMessage::ProductStateChange(ProductStateChange::decode(payload)?)
        }
        templates::QuoteRequest::TEMPLATE_ID => {
            BinMessage::QuoteRequest(QuoteRequest::decode(payload)?)
        }
        templates::CrossRequest::TEMPLATE_ID => {
            BinMessage::CrossRequest(CrossRequest::decode(payload)?)
        }
        templates::Heartbeat::TEMPLATE_ID => BinMessage::Heartbeat(Heartbeat::decode(payload)?),
        templates::ProductSummary::TEMPLATE_ID => {
            BinMessage::ProductSummary(ProductSummary::decode(payload)?)
        }
        templates::InstrumentSummary::TEMPLATE_ID => {
            BinMessage::InstrumentSummary(InstrumentSummary::decode(payload)?)
        }
        templates::SnapshotOrder::TEMPLATE_ID => {
            BinMessage::SnapshotOrder(SnapshotOrder::decode(payload)?)
        }
        templates::AuctionBBO::TEMPLATE_ID => BinMessage::AuctionBBO(AuctionBBO::decode(payload)?),
        templates::AuctionClearingPrice::TEMPLATE_ID => {
            BinMessage::AuctionClearingPrice(AuctionClearingPrice::decode(payload)?)
        }
        other => {
            return Err(DecodeError::UnknownTemplate {
                template_id: other,
                body_len: header.body_len(),
                offset: 0,
            })
        }
    })
}

/// Iterator over the `MessageHeader`+payload entries in a packet body.
pub struct MessageIter<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> MessageIter<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }
}

impl<'a> Iterator for MessageIter<'a> {
    type Item = DecodeResult<DecodedEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.buf.len() {
            return None;
        }
        let remaining = &self.buf[self.offset..];
        if remaining.len() < MessageHeader::SIZE {
            self.offset = self.buf.len();
            return Some(Err(DecodeError::truncated(
                "BIN MessageHeader",
                MessageHeader::SIZE,
                remaining.len(),
            )));
        }
        let header = match MessageHeader::decode(remaining) {
            Ok(h) => h,
            Err(e) => {
                self.offset = self.buf.len();
                return Some(Err(e));
            }
        };
        let body_len = header.body_len() as usize;
        if body_len < MessageHeader::SIZE || remaining.len() < body_len {
            self.offset = self.buf.len();
            return Some(Err(DecodeError::truncated(
                "BIN message body",
                body_len,
                remaining.len(),
            )));
        }
        let payload = &remaining[MessageHeader::SIZE..body_len];
        let start_offset = self.offset;
        self.offset += body_len;
        match decode_payload(header, payload) {
            Ok(message) => Some(Ok(DecodedEntry { header, message })),
            Err(DecodeError::UnknownTemplate {
                template_id,
                body_len,
                ..
            }) => Some(Err(DecodeError::UnknownTemplate {
                template_id,
                body_len: body_len as u16,
                offset: start_offset,
            })),
            Err(e) => Some(Err(e)),
        }
    }
}

/// Walk every `MessageHeader`+payload entry in a packet's body, in order.
pub fn iter_messages(body: &[u8]) -> MessageIter<'_> {
    MessageIter::new(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::{BigEndian, WriteBytesExt};
    use std::io::Write;

    fn push_header(buf: &mut Vec<u8>, body_len: u16, template_id: u16, msg_seq_num: u32) {
        buf.write_u16::<BigEndian>(body_len).unwrap();
        buf.write_u16::<BigEndian>(template_id).unwrap();
        buf.write_u32::<BigEndian>(msg_seq_num).unwrap();
    }

    #[test]
    fn decodes_packet_header() {
        let mut buf = Vec::new();
        buf.write_u32::<BigEndian>(42).unwrap();
        buf.write_i32::<BigEndian>(1001).unwrap();
        buf.write_u8(1).unwrap();
        let h = PacketHeader::decode(&buf).unwrap();
        assert_eq!(h.appl_seq_num(), 42);
        assert_eq!(h.market_segment_id(), 1001);
        assert!(h.is_last_in_packet());
    }

    #[test]
    fn iterates_two_messages_in_one_packet() {
        let mut buf = Vec::new();
        // OrderAdd, template 1: 8+41 = 49 byte BodyLen
        push_header(&mut buf, 49, OrderAdd::TEMPLATE_ID, 100);
        buf.write_i64::<BigEndian>(555).unwrap(); // security id
        buf.write_u8(1).unwrap(); // side: bid
        buf.write_i64::<BigEndian>(10_000).unwrap(); // price
        buf.write_i64::<BigEndian>(777).unwrap(); // order id
        buf.write_i64::<BigEndian>(1).unwrap(); // priority
        buf.write_i64::<BigEndian>(25).unwrap(); // qty

        // Heartbeat, template 14: 8+4 = 12 byte BodyLen
        push_header(&mut buf, 12, Heartbeat::TEMPLATE_ID, 101);
        buf.write_u32::<BigEndian>(101).unwrap();

        let entries: Vec<_> = iter_messages(&buf).collect::<DecodeResult<Vec<_>>>().unwrap();
        assert_eq!(entries.len(), 2);
        match entries[0].message {
            BinMessage::OrderAdd(o) => {
                assert_eq!(o.security_id, 555);
                assert_eq!(o.price, 10_000);
                assert_eq!(o.qty, 25);
            }
            _ => panic!("expected OrderAdd"),
        }
        assert!(matches!(
            entries[1].message,
            BinMessage::Heartbeat(Heartbeat { last_msg_seq_num_processed: 101 })
        ));
    }

    #[test]
    fn truncated_payload_is_an_error() {
        let mut buf = Vec::new();
        push_header(&mut buf, 49, OrderAdd::TEMPLATE_ID, 1);
        buf.write_u8(0).unwrap(); // only one payload byte instead of 41
        let mut it = iter_messages(&buf);
        assert!(matches!(
            it.next(),
            Some(Err(DecodeError::Truncated { .. }))
        ));
    }

    #[test]
    fn unknown_template_id_is_reported_with_offset() {
        let mut buf = Vec::new();
        push_header(&mut buf, 8, 9999, 1);
        let mut it = iter_messages(&buf);
        match it.next() {
            Some(Err(DecodeError::UnknownTemplate {
                template_id,
                offset,
                ..
            })) => {
                assert_eq!(template_id, 9999);
                assert_eq!(offset, 0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
