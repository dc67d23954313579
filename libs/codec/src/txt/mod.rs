//! TXT wire decoder (Montreal MX HSVF-style ASCII record-per-message
//! feed).
//!
//! Every record on the wire is framed `STX ... ETX`; [`header::next_frame`]
//! walks a buffer frame by frame, and [`decode_record`] dispatches each
//! frame's contents by its two-letter `msgType` to the matching decoder
//! in [`records`] (market data) or [`control`] (the TCP retransmission
//! dialog). [`ascii`] holds the shared fixed-width-ASCII and
//! fraction-indicator/month-code primitives every record decoder is
//! built out of.

pub mod ascii;
pub mod control;
pub mod header;
pub mod records;

use crate::error::{DecodeError, DecodeResult};
use header::{next_frame, MsgHeader};

/// One decoded TXT record, tagged by its `msgType`.
#[derive(Debug, Clone, PartialEq)]
pub enum TxtRecord {
    FutureMarketDepth(records::FutureMarketDepth),
    FuturesSummary(records::FuturesSummary),
    FuturesTrade(records::FuturesTrade),
    FuturesInstrumentKeys(records::FuturesInstrumentKeys),
    StrategyInstrumentKeys(records::StrategyInstrumentKeys),
    GroupStatus(records::GroupStatus),
    GroupStatusStrategies(records::GroupStatusStrategies),
    TickTable(records::TickTable),
    StartOfDay(records::StartOfDay),
    EndOfTransmission(records::EndOfTransmission),
    EndOfSales(records::EndOfSales),
    Heartbeat(records::Heartbeat),
    BeginningOfSummary(records::BeginningOfSummary),
    FuturesRequestForQuote(records::FuturesRequestForQuote),
    LoginAcknowledgement(control::LoginAcknowledgement),
    RetransmissionBegin(control::RetransmissionBegin),
    RetransmissionEnd(control::RetransmissionEnd),
    LogoutAcknowledgement(control::LogoutAcknowledgement),
    ErrorMessage(control::ErrorMessage),
}

/// Dispatch one `STX`/`ETX`-stripped record to its decoder by `msgType`.
/// `record` must start at the sequence-number field (i.e. right after
/// the stripped `STX`).
pub fn decode_record(record: &[u8]) -> DecodeResult<TxtRecord> {
    if record.len() < MsgHeader::SIZE {
        return Err(DecodeError::truncated(
            "TXT record (too short for MsgHeader)",
            MsgHeader::SIZE,
            record.len(),
        ));
    }
    let msg_type: [u8; 2] = [record[10], record[11]];

    Ok(match &msg_type {
        b"H " | b"HF" | b"HB" | b"HS" => {
            TxtRecord::FutureMarketDepth(records::FutureMarketDepth::decode(record)?)
        }
        b"N " | b"NF" | b"NB" | b"NS" => {
            TxtRecord::FuturesSummary(records::FuturesSummary::decode(record)?)
        }
        b"C " | b"CF" | b"CB" | b"CS" => {
            TxtRecord::FuturesTrade(records::FuturesTrade::decode(record)?)
        }
        b"J " | b"JF" | b"JB" => {
            TxtRecord::FuturesInstrumentKeys(records::FuturesInstrumentKeys::decode(record)?)
        }
        b"JS" => {
            TxtRecord::StrategyInstrumentKeys(records::StrategyInstrumentKeys::decode(record)?)
        }
        b"GR" => TxtRecord::GroupStatus(records::GroupStatus::decode(record)?),
        b"GS" => TxtRecord::GroupStatusStrategies(records::GroupStatusStrategies::decode(record)?),
        b"TT" => TxtRecord::TickTable(records::TickTable::decode(record)?),
        b"SD" => TxtRecord::StartOfDay(records::StartOfDay::decode(record)?),
        b"U " => TxtRecord::EndOfTransmission(records::EndOfTransmission::decode(record)?),
        b"S " => TxtRecord::EndOfSales(records::EndOfSales::decode(record)?),
        b"V " => TxtRecord::Heartbeat(records::Heartbeat::decode(record)?),
        b"Q " | b"QF" | b"QB" | b"QS" => {
            TxtRecord::BeginningOfSummary(records::BeginningOfSummary::decode(record)?)
        }
        b"D " => TxtRecord::FuturesRequestForQuote(records::FuturesRequestForQuote::decode(
            record,
        )?),
        b"KI" => TxtRecord::LoginAcknowledgement(control::LoginAcknowledgement::decode(record)?),
        b"RB" => TxtRecord::RetransmissionBegin(control::RetransmissionBegin::decode(record)?),
        b"RE" => TxtRecord::RetransmissionEnd(control::RetransmissionEnd::decode(record)?),
        b"KO" => TxtRecord::LogoutAcknowledgement(control::LogoutAcknowledgement::decode(record)?),
        b"ER" => TxtRecord::ErrorMessage(control::ErrorMessage::decode(record)?),
        _ => {
            return Err(DecodeError::UnknownRecordType {
                msg_type,
                offset: 0,
            })
        }
    })
}

/// The sequence number every TXT record carries, regardless of record
/// type -- used by the channel processor's gap detector without needing
/// to fully decode a record it isn't otherwise interested in.
pub fn peek_seq_num(record: &[u8]) -> DecodeResult<u64> {
    MsgHeader::decode(record).map(|h| h.seq_num)
}

/// Iterator over every `STX`/`ETX`-framed record in a buffer, yielding
/// the decoded record plus the byte offset its frame started at.
pub struct RecordIter<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> RecordIter<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }
}

impl<'a> Iterator for RecordIter<'a> {
    type Item = DecodeResult<TxtRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        match next_frame(self.buf, self.offset) {
            Ok(Some((record, next_offset))) => {
                self.offset = next_offset;
                Some(decode_record(record))
            }
            Ok(None) => None,
            Err(e) => {
                self.offset = self.buf.len();
                Some(Err(e))
            }
        }
    }
}

pub fn iter_records(buf: &[u8]) -> RecordIter<'_> {
    RecordIter::new(buf)
}
