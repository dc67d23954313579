//! Channel-level orchestration for BIN (§4.3, §4.6): routes incoming
//! packets to the right segment and drives the shared snapshot feed's
//! on/off switch from each segment's recovery state, mirroring
//! `eobi_channel.cpp`'s `OnIncrementalData` / `OnSnapshotFeedData` split.

use std::collections::HashMap;

use network::recovery::{FeedAction, SnapshotFeedControl};
use types::ids::{ChannelId, MarketSegmentId};

use crate::bin::segment::SegmentProcessor;
use crate::sink::MarketDataSink;

/// Owns every segment seen on one BIN channel plus the shared snapshot
/// feed's reference count. A channel corresponds to one exchange
/// (Eurex, say); segments correspond to the `MarketSegmentID`s
/// multiplexed onto it.
pub struct BinChannelProcessor {
    channel_id: ChannelId,
    segments: HashMap<MarketSegmentId, SegmentProcessor>,
    snapshot: SnapshotFeedControl,
}

impl BinChannelProcessor {
    pub fn new(channel_id: ChannelId) -> Self {
        Self {
            channel_id,
            segments: HashMap::new(),
            snapshot: SnapshotFeedControl::new(),
        }
    }

    pub fn is_snapshot_feed_running(&self) -> bool {
        self.snapshot.is_feed_running()
    }

    /// One packet off the incremental multicast feed for `segment_id`.
    /// Returns what the caller should do with the shared snapshot
    /// socket as a result.
    pub fn on_incremental_packet(
        &mut self,
        segment_id: MarketSegmentId,
        appl_seq_num: u32,
        body: &[u8],
        complete: bool,
        now_ns: u64,
        sink: &mut dyn MarketDataSink,
    ) -> FeedAction {
        let segment = self
            .segments
            .entry(segment_id)
            .or_insert_with(|| SegmentProcessor::new(self.channel_id, segment_id));
        if segment.on_realtime_packet(appl_seq_num, body, complete, now_ns, sink) {
            self.snapshot.note_gap(segment_id)
        } else {
            FeedAction::None
        }
    }

    /// One packet off the shared snapshot feed. `segment_id` comes from
    /// the packet header; segments that aren't currently recovering
    /// ignore it (the snapshot loop serves every segment on the
    /// channel, not just the one that asked for it).
    pub fn on_snapshot_packet(
        &mut self,
        segment_id: MarketSegmentId,
        appl_seq_num: u32,
        body: &[u8],
        now_ns: u64,
        sink: &mut dyn MarketDataSink,
    ) -> FeedAction {
        let Some(segment) = self.segments.get_mut(&segment_id) else {
            return FeedAction::None;
        };
        if segment.on_snapshot_packet(appl_seq_num, body, now_ns, sink) {
            self.snapshot.note_recovery_complete(segment_id)
        } else {
            FeedAction::None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::RecordingSink;
    use byteorder::{BigEndian, WriteBytesExt};
    use types::event::{MarketEventPayload, OrderBookAction};

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
    fn a_gap_on_one_segment_starts_the_shared_snapshot_feed() {
        let mut chan = BinChannelProcessor::new(ChannelId(1));
        let mut sink = RecordingSink::default();
        let mut gapped = Vec::new();
        push_msg(&mut gapped, 49, 1, 5, &order_add_payload(556, 1, 20_000, 778, 1, 10));
        let action = chan.on_incremental_packet(1001, 2, &gapped, true, 1000, &mut sink);
        assert_eq!(action, FeedAction::Start);
        assert!(chan.is_snapshot_feed_running());
    }

    #[test]
    fn a_second_segments_gap_does_not_restart_an_already_running_feed() {
        let mut chan = BinChannelProcessor::new(ChannelId(1));
        let mut sink = RecordingSink::default();
        let mut gapped = Vec::new();
        push_msg(&mut gapped, 49, 1, 5, &order_add_payload(556, 1, 20_000, 778, 1, 10));
        chan.on_incremental_packet(1001, 2, &gapped, true, 1000, &mut sink);
        let action = chan.on_incremental_packet(1002, 2, &gapped, true, 1000, &mut sink);
        assert_eq!(action, FeedAction::None);
    }

    #[test]
    fn snapshot_packets_for_a_segment_not_in_recovery_are_ignored() {
        let mut chan = BinChannelProcessor::new(ChannelId(1));
        let mut sink = RecordingSink::default();
        let mut snap = Vec::new();
        push_msg(&mut snap, 12, 15, 1, &4u32.to_be_bytes());
        let action = chan.on_snapshot_packet(1001, 1, &snap, 1000, &mut sink);
        assert_eq!(action, FeedAction::None);
        assert!(sink.snapshot.is_empty());
    }

    #[test]
    fn recovery_completing_stops_the_feed_once_every_segment_is_caught_up() {
        let mut chan = BinChannelProcessor::new(ChannelId(1));
        let mut sink = RecordingSink::default();

        let mut gapped = Vec::new();
        push_msg(&mut gapped, 49, 1, 5, &order_add_payload(556, 1, 20_000, 778, 1, 10));
        chan.on_incremental_packet(1001, 2, &gapped, true, 1000, &mut sink);

        let mut snap1 = Vec::new();
        push_msg(&mut snap1, 12, 15, 1, &4u32.to_be_bytes());
        chan.on_snapshot_packet(1001, 1, &snap1, 1000, &mut sink);

        let mut snap2 = Vec::new();
        push_msg(&mut snap2, 12, 15, 2, &4u32.to_be_bytes());
        let action = chan.on_snapshot_packet(1001, 2, &snap2, 1000, &mut sink);
        assert_eq!(action, FeedAction::Stop);
        assert!(!chan.is_snapshot_feed_running());
        assert!(sink
            .incremental
            .iter()
            .any(|e| matches!(e.payload, MarketEventPayload::OrderBook { action: OrderBookAction::New, order_id: 778, .. })));
    }
}
