//! Segment Processor (§4.3): per-`MarketSegmentID` gap detection,
//! snapshot-loop recovery, and message-to-event dispatch for the BIN
//! incremental feed.
//!
//! One instance owns exactly one segment's sequencing state. The
//! orchestrator owns the map from `MarketSegmentId` to processor and
//! decides, from each call's return value, whether to ask the channel's
//! shared snapshot feed to start or stop (`network::recovery::bin_snapshot`
//! is the thing that actually tracks that across segments).

use std::collections::{HashSet, VecDeque};

use codec::bin::{
    iter_messages, BinMessage, MdEntryType, MessageHeader, OrderExecution, WireSide,
};
use types::event::{
    AggressorSide, EventEnvelope, MarketEvent, MarketEventPayload, OrderBookAction,
    QuoteRequestSide, QuoteRequestType, Side, StatAction, StatPriceId, StatQtyId, StatusValue,
    TradeQualifier, TradeType,
};
use types::ids::{ChannelId, InstrumentDesc, MarketSegmentId};

use crate::bin::status::{instrument_status, product_status};
use crate::sink::MarketDataSink;

struct BufferedPacket {
    appl_seq_num: u32,
    body: Vec<u8>,
    complete: bool,
}

/// Gap detection, snapshot recovery and dispatch for one BIN segment
/// (§4.3.1 - §4.3.6).
pub struct SegmentProcessor {
    channel_id: ChannelId,
    segment_id: MarketSegmentId,
    last_seq: u32,
    in_recovery: bool,
    snapshot_seq: u32,
    snapshot_last_msg_seq: Option<u32>,
    snapshot_current_security: Option<i64>,
    buffered: VecDeque<BufferedPacket>,
    known_securities: HashSet<i64>,
    /// Instruments touched since the last `CompletionIndicator == COMPLETE`
    /// packet, accumulated across however many packets make up the
    /// current atomic update group (§4.3.1 step 4, the data model's
    /// `current_descs`). Flushed to one `EventEnd` per instrument only
    /// when a packet arrives with the completion flag set.
    current_descs: HashSet<i64>,
}

impl SegmentProcessor {
    pub fn new(channel_id: ChannelId, segment_id: MarketSegmentId) -> Self {
        Self {
            channel_id,
            segment_id,
            last_seq: 0,
            in_recovery: false,
            snapshot_seq: 0,
            snapshot_last_msg_seq: None,
            snapshot_current_security: None,
            buffered: VecDeque::new(),
            known_securities: HashSet::new(),
            current_descs: HashSet::new(),
        }
    }

    pub fn segment_id(&self) -> MarketSegmentId {
        self.segment_id
    }

    pub fn is_in_recovery(&self) -> bool {
        self.in_recovery
    }

    pub fn last_seq(&self) -> u32 {
        self.last_seq
    }

    /// One packet off the incremental multicast feed. `complete` is the
    /// packet header's `CompletionIndicator == COMPLETE` flag (§4.3.1 step
    /// 4); it's threaded straight through to [`Self::apply_packet`] even
    /// while buffering, so a replayed packet flushes `EventEnd` on exactly
    /// the same boundary it would have in real time. Returns `true` when
    /// this call caused the segment to enter (or re-confirm) recovery --
    /// the caller should then call
    /// [`network::recovery::SnapshotFeedControl::note_gap`] for this
    /// segment.
    pub fn on_realtime_packet(
        &mut self,
        appl_seq_num: u32,
        body: &[u8],
        complete: bool,
        now_ns: u64,
        sink: &mut dyn MarketDataSink,
    ) -> bool {
        if self.in_recovery {
            self.buffered.push_back(BufferedPacket {
                appl_seq_num,
                body: body.to_vec(),
                complete,
            });
            return false;
        }

        let first_seq = match MessageHeader::decode(body) {
            Ok(h) => h.msg_seq_num(),
            Err(e) => {
                tracing::warn!(segment = self.segment_id, error = %e, "malformed BIN packet, dropping");
                return false;
            }
        };

        // §4.3.1: "gap detection: `msg_seq - last_seq > 1`".
        if self.last_seq != 0 && first_seq > self.last_seq + 1 {
            tracing::warn!(
                segment = self.segment_id,
                last_seq = self.last_seq,
                first_seq,
                "sequence gap detected, entering recovery"
            );
            self.in_recovery = true;
            self.snapshot_seq = first_seq;
            self.buffered.push_back(BufferedPacket {
                appl_seq_num,
                body: body.to_vec(),
                complete,
            });
            return true;
        }

        self.apply_packet(appl_seq_num, body, complete, now_ns, sink)
    }

    /// One packet off the shared snapshot recovery feed, only consumed
    /// while `is_in_recovery()`. Returns `true` once this segment's
    /// snapshot cycle has fully closed and the incremental feed has been
    /// resumed -- the caller should then call
    /// [`network::recovery::SnapshotFeedControl::note_recovery_complete`].
    ///
    /// The snapshot feed loops continuously over every segment's data
    /// (§4.3.2, `SnapshotFeedControl`'s doc comment): this segment's cycle
    /// is bounded by seeing its own `ProductSummary` twice -- the first
    /// marks the start and records `last_msg_seq_num`, the second marks
    /// having gone all the way around.
    pub fn on_snapshot_packet(
        &mut self,
        appl_seq_num: u32,
        body: &[u8],
        now_ns: u64,
        sink: &mut dyn MarketDataSink,
    ) -> bool {
        if !self.in_recovery {
            return false;
        }

        for entry in iter_messages(body) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!(segment = self.segment_id, error = %e, "malformed snapshot message, skipping");
                    continue;
                }
            };

            match entry.message {
                BinMessage::ProductSummary(ps) => match self.snapshot_last_msg_seq {
                    None => {
                        // §4.3.2: a loop that started before our gap was
                        // detected can't cover it; wait for the next one.
                        if ps.last_msg_seq_num >= self.snapshot_seq.saturating_sub(1) {
                            self.snapshot_last_msg_seq = Some(ps.last_msg_seq_num);
                        } else {
                            tracing::debug!(
                                segment = self.segment_id,
                                snapshot_seq = self.snapshot_seq,
                                loop_last_msg_seq = ps.last_msg_seq_num,
                                "snapshot loop too stale to cover this gap, waiting for next loop"
                            );
                        }
                    }
                    Some(last_msg_seq) => {
                        if let Some(prev) = self.snapshot_current_security.take() {
                            sink.on_snapshot(MarketEvent::event_end(
                                self.channel_id,
                                InstrumentDesc(prev),
                            ));
                        }
                        self.complete_recovery(last_msg_seq, now_ns, sink);
                        return true;
                    }
                },
                BinMessage::InstrumentSummary(is) => {
                    if let Some(prev) = self.snapshot_current_security.replace(is.security_id) {
                        if prev != is.security_id {
                            sink.on_snapshot(MarketEvent::event_end(
                                self.channel_id,
                                InstrumentDesc(prev),
                            ));
                        }
                    }
                    self.known_securities.insert(is.security_id);

                    let envelope =
                        self.envelope(is.security_id, appl_seq_num, entry.header.msg_seq_num(), 0, now_ns);
                    sink.on_snapshot(MarketEvent {
                        envelope,
                        payload: MarketEventPayload::Status {
                            value: instrument_status(0, is.trading_status, 0),
                        },
                    });
                    for md in is.active_entries() {
                        let Some(payload) = stat_payload_for_entry(md) else {
                            continue;
                        };
                        sink.on_snapshot(MarketEvent { envelope, payload });
                    }
                }
                BinMessage::SnapshotOrder(so) => {
                    self.known_securities.insert(so.security_id);
                    let envelope =
                        self.envelope(so.security_id, appl_seq_num, entry.header.msg_seq_num(), 0, now_ns);
                    sink.on_snapshot(MarketEvent {
                        envelope,
                        payload: MarketEventPayload::OrderBook {
                            action: OrderBookAction::New,
                            side: side_from_wire(so.side),
                            price: so.price,
                            qty: so.qty,
                            order_id: so.order_id,
                            priority: so.priority,
                        },
                    });
                }
                other => {
                    tracing::debug!(segment = self.segment_id, ?other, "ignoring message on snapshot feed");
                }
            }
        }

        false
    }

    fn complete_recovery(&mut self, last_msg_seq: u32, now_ns: u64, sink: &mut dyn MarketDataSink) {
        self.last_seq = last_msg_seq;
        self.in_recovery = false;
        self.snapshot_seq = 0;
        self.snapshot_last_msg_seq = None;
        self.snapshot_current_security = None;

        let buffered = std::mem::take(&mut self.buffered);
        for pkt in buffered {
            self.apply_packet(pkt.appl_seq_num, &pkt.body, pkt.complete, now_ns, sink);
        }
    }

    /// Applies every message in one packet whose sequence number is newer
    /// than what's already been processed, accumulating every touched
    /// instrument into `current_descs` and flushing one `EventEnd` per
    /// instrument only once `complete` (the packet's `CompletionIndicator
    /// == COMPLETE`) is set (§4.3.1 step 4). Returns `true` if a
    /// `Heartbeat`'s `LastMsgSeqNumProcessed` revealed the segment has
    /// silently fallen behind even though the packets themselves looked
    /// contiguous (§4.3.1).
    fn apply_packet(
        &mut self,
        appl_seq_num: u32,
        body: &[u8],
        complete: bool,
        now_ns: u64,
        sink: &mut dyn MarketDataSink,
    ) -> bool {
        let mut entered_recovery = false;

        for entry in iter_messages(body) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!(segment = self.segment_id, error = %e, "malformed BIN message, skipping");
                    continue;
                }
            };

            let seq = entry.header.msg_seq_num();
            if seq <= self.last_seq {
                continue; // already applied (duplicate, or covered by the snapshot)
            }
            self.last_seq = seq;

            if let BinMessage::Heartbeat(h) = entry.message {
                if h.last_msg_seq_num_processed > self.last_seq {
                    tracing::warn!(
                        segment = self.segment_id,
                        last_seq = self.last_seq,
                        reported = h.last_msg_seq_num_processed,
                        "heartbeat revealed a silent gap, entering recovery"
                    );
                    self.in_recovery = true;
                    self.snapshot_seq = h.last_msg_seq_num_processed;
                    entered_recovery = true;
                }
                continue;
            }

            self.dispatch(appl_seq_num, entry.header, entry.message, now_ns, sink);
        }

        if complete {
            for indesc in self.current_descs.drain() {
                sink.on_incremental(MarketEvent::event_end(self.channel_id, InstrumentDesc(indesc)));
            }
        }

        entered_recovery
    }

    fn envelope(
        &self,
        security_id: i64,
        appl_seq_num: u32,
        msg_seq_num: u32,
        ts_exchange_send: u64,
        now_ns: u64,
    ) -> EventEnvelope {
        EventEnvelope {
            channel_id: self.channel_id,
            indesc: InstrumentDesc(security_id),
            packet_sequence: appl_seq_num as u64,
            message_sequence: msg_seq_num as u64,
            ts_exchange_send,
            ts_server_recv: now_ns,
        }
    }

    fn dispatch(
        &mut self,
        appl_seq_num: u32,
        header: MessageHeader,
        message: BinMessage,
        now_ns: u64,
        sink: &mut dyn MarketDataSink,
    ) {
        let msg_seq = header.msg_seq_num();

        match message {
            BinMessage::OrderAdd(o) => {
                self.current_descs.insert(o.security_id);
                self.known_securities.insert(o.security_id);
                let envelope = self.envelope(o.security_id, appl_seq_num, msg_seq, 0, now_ns);
                sink.on_incremental(MarketEvent {
                    envelope,
                    payload: MarketEventPayload::OrderBook {
                        action: OrderBookAction::New,
                        side: side_from_wire(o.side),
                        price: o.price,
                        qty: o.qty,
                        order_id: o.order_id,
                        priority: o.priority,
                    },
                });
            }
            BinMessage::OrderDelete(o) => {
                self.current_descs.insert(o.security_id);
                let envelope = self.envelope(o.security_id, appl_seq_num, msg_seq, 0, now_ns);
                sink.on_incremental(MarketEvent {
                    envelope,
                    payload: MarketEventPayload::OrderBook {
                        action: OrderBookAction::Delete,
                        side: side_from_wire(o.side),
                        price: 0,
                        qty: 0,
                        order_id: o.order_id,
                        priority: 0,
                    },
                });
            }
            BinMessage::OrderModify(o) => {
                self.current_descs.insert(o.security_id);
                let envelope = self.envelope(o.security_id, appl_seq_num, msg_seq, 0, now_ns);
                // A modify that moves queue position is a delete of the
                // resting order at its old priority followed by a new one
                // at the back of the new priority level.
                sink.on_incremental(MarketEvent {
                    envelope,
                    payload: MarketEventPayload::OrderBook {
                        action: OrderBookAction::Delete,
                        side: side_from_wire(o.side),
                        price: 0,
                        qty: 0,
                        order_id: o.order_id,
                        priority: o.prev_priority,
                    },
                });
                sink.on_incremental(MarketEvent {
                    envelope,
                    payload: MarketEventPayload::OrderBook {
                        action: OrderBookAction::New,
                        side: side_from_wire(o.side),
                        price: o.price,
                        qty: o.qty,
                        order_id: o.order_id,
                        priority: o.priority,
                    },
                });
            }
            BinMessage::OrderModifySamePrio(o) => {
                self.current_descs.insert(o.security_id);
                let envelope = self.envelope(o.security_id, appl_seq_num, msg_seq, 0, now_ns);
                sink.on_incremental(MarketEvent {
                    envelope,
                    payload: MarketEventPayload::OrderBook {
                        action: OrderBookAction::Change,
                        side: side_from_wire(o.side),
                        price: o.price,
                        qty: o.qty,
                        order_id: o.order_id,
                        priority: o.priority,
                    },
                });
            }
            BinMessage::OrderMassDelete(o) => {
                self.current_descs.insert(o.security_id);
                let envelope = self.envelope(o.security_id, appl_seq_num, msg_seq, 0, now_ns);
                sink.on_incremental(MarketEvent {
                    envelope,
                    payload: MarketEventPayload::BookReset,
                });
            }
            BinMessage::PartialOrderExecution(o) | BinMessage::FullOrderExecution(o) => {
                self.emit_execution(appl_seq_num, msg_seq, o, now_ns, sink);
            }
            BinMessage::ExecutionSummary(e) => {
                self.current_descs.insert(e.security_id);
                let envelope = self.envelope(e.security_id, appl_seq_num, msg_seq, e.ts_trade, now_ns);
                sink.on_incremental(MarketEvent {
                    envelope,
                    payload: MarketEventPayload::Trade {
                        trade_type: TradeType::Normal,
                        status: 0,
                        qualifier: if e.trade_condition == 1 {
                            TradeQualifier::Implied
                        } else {
                            TradeQualifier::Regular
                        },
                        side: match e.aggressor_side {
                            WireSide::Bid => AggressorSide::Take,
                            WireSide::Ask => AggressorSide::Hit,
                        },
                        price: e.price,
                        qty: e.qty,
                        ts_trade: e.ts_trade,
                        counterparty_ids: [0, 0],
                        exec_id: e.trade_id,
                    },
                });
            }
            BinMessage::TradeReport(r) => {
                // Public trade-tape entry only; `ExecutionSummary` already
                // emitted the `Trade` event for this fill (§4.3.3).
                tracing::debug!(security_id = r.security_id, price = r.price, qty = r.qty, "trade report (log only)");
            }
            BinMessage::InstrumentStateChange(s) => {
                self.current_descs.insert(s.security_id);
                self.known_securities.insert(s.security_id);
                let envelope = self.envelope(s.security_id, appl_seq_num, msg_seq, 0, now_ns);
                sink.on_incremental(MarketEvent {
                    envelope,
                    payload: MarketEventPayload::Status {
                        value: instrument_status(s.security_status, s.security_trading_status, s.fast_market_indicator),
                    },
                });
            }
            BinMessage::ProductStateChange(p) => {
                let value = product_status(p.trading_session_sub_id);
                let securities: Vec<i64> = self.known_securities.iter().copied().collect();
                for security_id in securities {
                    self.current_descs.insert(security_id);
                    let envelope = self.envelope(security_id, appl_seq_num, msg_seq, 0, now_ns);
                    sink.on_incremental(MarketEvent {
                        envelope,
                        payload: MarketEventPayload::Status { value },
                    });
                }
            }
            BinMessage::QuoteRequest(q) => {
                self.current_descs.insert(q.security_id);
                let envelope = self.envelope(q.security_id, appl_seq_num, msg_seq, 0, now_ns);
                sink.on_incremental(MarketEvent {
                    envelope,
                    payload: MarketEventPayload::QuoteRequest {
                        request_type: QuoteRequestType::Tradable,
                        side: match q.side {
                            WireSide::Bid => QuoteRequestSide::Buy,
                            WireSide::Ask => QuoteRequestSide::Sell,
                        },
                        price: 0,
                        qty: 0,
                        ts_transact: now_ns,
                    },
                });
            }
            BinMessage::CrossRequest(c) => {
                self.current_descs.insert(c.security_id);
                let envelope = self.envelope(c.security_id, appl_seq_num, msg_seq, 0, now_ns);
                sink.on_incremental(MarketEvent {
                    envelope,
                    payload: MarketEventPayload::QuoteRequest {
                        request_type: QuoteRequestType::CrossTradeRequest,
                        side: QuoteRequestSide::Cross,
                        price: 0,
                        qty: 0,
                        ts_transact: now_ns,
                    },
                });
            }
            BinMessage::Heartbeat(_) => unreachable!("Heartbeat is intercepted before dispatch"),
            BinMessage::ProductSummary(_) | BinMessage::InstrumentSummary(_) | BinMessage::SnapshotOrder(_) => {
                tracing::debug!(segment = self.segment_id, "snapshot-only message seen on incremental feed, ignoring");
            }
            BinMessage::AuctionBBO(a) => {
                tracing::debug!(security_id = a.security_id, "auction BBO (log only)");
            }
            BinMessage::AuctionClearingPrice(a) => {
                tracing::debug!(security_id = a.security_id, "auction clearing price (log only)");
            }
        }
    }

    fn emit_execution(
        &mut self,
        appl_seq_num: u32,
        msg_seq: u32,
        o: OrderExecution,
        now_ns: u64,
        sink: &mut dyn MarketDataSink,
    ) {
        self.current_descs.insert(o.security_id);
        let envelope = self.envelope(o.security_id, appl_seq_num, msg_seq, 0, now_ns);
        sink.on_incremental(MarketEvent {
            envelope,
            payload: MarketEventPayload::OrderBook {
                action: OrderBookAction::Execute,
                side: side_from_wire(o.side),
                price: o.price,
                qty: o.executed_qty,
                order_id: o.order_id,
                priority: o.priority,
            },
        });
    }
}

fn side_from_wire(side: WireSide) -> Side {
    match side {
        WireSide::Bid => Side::Bid,
        WireSide::Ask => Side::Ask,
    }
}

/// §4.3.6: `MDEntryType` maps to one of the four statistic prices or the
/// traded-volume statistic; `Bid`/`Ask` entries duplicate what the
/// per-order `SnapshotOrder` stream already rebuilds and carry no event
/// of their own.
fn stat_payload_for_entry(entry: &codec::bin::MdEntry) -> Option<MarketEventPayload> {
    match entry.entry_type {
        MdEntryType::LowPrice => Some(MarketEventPayload::StatPrice {
            id: StatPriceId::Low,
            action: StatAction::New,
            value: entry.value,
        }),
        MdEntryType::HighPrice => Some(MarketEventPayload::StatPrice {
            id: StatPriceId::High,
            action: StatAction::New,
            value: entry.value,
        }),
        MdEntryType::OpeningPrice => Some(MarketEventPayload::StatPrice {
            id: StatPriceId::Open,
            action: StatAction::New,
            value: entry.value,
        }),
        MdEntryType::ClosingPrice => Some(MarketEventPayload::StatPrice {
            id: StatPriceId::Close,
            action: StatAction::New,
            value: entry.value,
        }),
        MdEntryType::TradeVolume => Some(MarketEventPayload::StatQty {
            id: StatQtyId::Volume,
            action: StatAction::New,
            value: entry.value,
        }),
        MdEntryType::Bid | MdEntryType::Ask | MdEntryType::Unknown(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::{BigEndian, WriteBytesExt};
    use crate::sink::RecordingSink;
    use types::event::ChannelStatus;

    fn push_msg(buf: &mut Vec<u8>, body_len: u16, template_id: u16, msg_seq_num: u32, payload: &[u8]) {
        buf.write_u16::<BigEndian>(body_len).unwrap();
        buf.write_u16::<BigEndian>(template_id).unwrap();
        buf.write_u32::<BigEndian>(msg_seq_num).unwrap();
        buf.extend_from_slice(payload);
    }

    fn order_add_payload(security_id: i64, side: u8, price: i64, order_id: i64, priority: i64, qty: i64) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.write_i64::<BigEndian>(security_id).unwrap();
        buf.write_u8(side).unwrap();
        buf.write_i64::<BigEndian>(price).unwrap();
        buf.write_i64::<BigEndian>(order_id).unwrap();
        buf.write_i64::<BigEndian>(priority).unwrap();
        buf.write_i64::<BigEndian>(qty).unwrap();
        buf
    }

    #[test]
    fn applies_in_order_messages_and_emits_event_end() {
        let mut sp = SegmentProcessor::new(ChannelId(1), 1001);
        let mut sink = RecordingSink::default();
        let mut body = Vec::new();
        push_msg(&mut body, 49, 1, 1, &order_add_payload(555, 1, 10_000, 777, 1, 25));
        sp.on_realtime_packet(1, &body, true, 1000, &mut sink);

        assert_eq!(sink.incremental.len(), 2); // OrderBook::New + EventEnd
        assert!(matches!(
            sink.incremental[0].payload,
            MarketEventPayload::OrderBook { action: OrderBookAction::New, .. }
        ));
        assert!(matches!(sink.incremental[1].payload, MarketEventPayload::EventEnd));
        assert_eq!(sp.last_seq(), 1);
        assert!(!sp.is_in_recovery());
    }

    #[test]
    fn event_end_is_withheld_until_the_completion_indicator_fires() {
        let mut sp = SegmentProcessor::new(ChannelId(1), 1001);
        let mut sink = RecordingSink::default();

        let mut first = Vec::new();
        push_msg(&mut first, 49, 1, 1, &order_add_payload(555, 1, 10_000, 777, 1, 25));
        sp.on_realtime_packet(1, &first, false, 1000, &mut sink);
        assert_eq!(sink.incremental.len(), 1); // OrderBook::New only, no EventEnd yet
        assert!(!sink.incremental.iter().any(|e| matches!(e.payload, MarketEventPayload::EventEnd)));

        let mut second = Vec::new();
        push_msg(&mut second, 49, 1, 2, &order_add_payload(556, 1, 20_000, 778, 1, 10));
        sp.on_realtime_packet(2, &second, true, 1000, &mut sink);

        let event_ends: Vec<_> = sink
            .incremental
            .iter()
            .filter(|e| matches!(e.payload, MarketEventPayload::EventEnd))
            .collect();
        assert_eq!(event_ends.len(), 2); // one per instrument touched across both packets
    }

    #[test]
    fn a_sequence_gap_triggers_recovery_and_buffers_the_packet() {
        let mut sp = SegmentProcessor::new(ChannelId(1), 1001);
        let mut sink = RecordingSink::default();
        let mut first = Vec::new();
        push_msg(&mut first, 49, 1, 1, &order_add_payload(555, 1, 10_000, 777, 1, 25));
        sp.on_realtime_packet(1, &first, true, 1000, &mut sink);

        let mut gapped = Vec::new();
        push_msg(&mut gapped, 49, 1, 5, &order_add_payload(556, 1, 20_000, 778, 1, 10));
        let entered = sp.on_realtime_packet(2, &gapped, true, 1000, &mut sink);
        assert!(entered);
        assert!(sp.is_in_recovery());
        // buffered, not yet applied
        assert_eq!(sink.incremental.len(), 2);
    }

    #[test]
    fn product_state_change_fans_out_to_known_securities() {
        let mut sp = SegmentProcessor::new(ChannelId(1), 1001);
        let mut sink = RecordingSink::default();
        let mut body = Vec::new();
        push_msg(&mut body, 49, 1, 1, &order_add_payload(555, 1, 10_000, 777, 1, 25));
        push_msg(&mut body, 10, 11, 2, &[0u8; 2]); // ProductStateChange, sub_id=0
        sp.on_realtime_packet(1, &body, true, 1000, &mut sink);

        let statuses: Vec<_> = sink
            .incremental
            .iter()
            .filter(|e| matches!(e.payload, MarketEventPayload::Status { .. }))
            .collect();
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].envelope.indesc, InstrumentDesc(555));
    }

    #[test]
    fn recovery_completes_on_a_segments_second_product_summary() {
        let mut sp = SegmentProcessor::new(ChannelId(1), 1001);
        let mut sink = RecordingSink::default();

        let mut gapped = Vec::new();
        push_msg(&mut gapped, 49, 1, 5, &order_add_payload(556, 1, 20_000, 778, 1, 10));
        sp.on_realtime_packet(2, &gapped, true, 1000, &mut sink);
        assert!(sp.is_in_recovery());

        let mut snap1 = Vec::new();
        push_msg(&mut snap1, 12, 15, 1, &4u32.to_be_bytes()); // ProductSummary last_msg_seq_num=4
        sp.on_snapshot_packet(1, &snap1, 1000, &mut sink);
        assert!(sp.is_in_recovery());

        let mut snap2 = Vec::new();
        push_msg(&mut snap2, 12, 15, 2, &4u32.to_be_bytes()); // second ProductSummary closes the loop
        let completed = sp.on_snapshot_packet(2, &snap2, 1000, &mut sink);
        assert!(completed);
        assert!(!sp.is_in_recovery());
        assert_eq!(sp.last_seq(), 4);

        // buffered realtime packet (seq 5) should now have been replayed
        assert!(sink
            .incremental
            .iter()
            .any(|e| matches!(e.payload, MarketEventPayload::OrderBook { order_id: 778, .. })));
    }

    #[test]
    fn a_snapshot_loop_already_in_progress_before_the_gap_is_ignored() {
        let mut sp = SegmentProcessor::new(ChannelId(1), 1001);
        let mut sink = RecordingSink::default();

        let mut gapped = Vec::new();
        push_msg(&mut gapped, 49, 1, 5, &order_add_payload(556, 1, 20_000, 778, 1, 10));
        sp.on_realtime_packet(2, &gapped, true, 1000, &mut sink); // snapshot_seq == 5

        // A loop that closed at msg_seq 3 started before our gap and can't
        // cover it -- must be ignored, not accepted as the loop's start.
        let mut stale = Vec::new();
        push_msg(&mut stale, 12, 15, 1, &3u32.to_be_bytes());
        sp.on_snapshot_packet(1, &stale, 1000, &mut sink);
        assert!(sp.is_in_recovery());

        // A fresh loop starting at msg_seq 6 covers the gap (5 >= 6-1).
        let mut fresh_start = Vec::new();
        push_msg(&mut fresh_start, 12, 15, 2, &6u32.to_be_bytes());
        sp.on_snapshot_packet(2, &fresh_start, 1000, &mut sink);
        assert!(sp.is_in_recovery());

        let mut fresh_end = Vec::new();
        push_msg(&mut fresh_end, 12, 15, 3, &6u32.to_be_bytes());
        let completed = sp.on_snapshot_packet(3, &fresh_end, 1000, &mut sink);
        assert!(completed);
        assert!(!sp.is_in_recovery());
        assert_eq!(sp.last_seq(), 6);
    }

    #[test]
    fn channel_status_is_not_emitted_by_the_segment_processor_itself() {
        let sink = RecordingSink::default();
        assert!(sink.statuses.is_empty());
        let _ = ChannelStatus::Stable; // orchestrator's concern, not the segment's
    }
}
