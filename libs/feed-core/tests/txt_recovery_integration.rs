//! End-to-end TXT channel recovery (§4.4, §4.7, §8): a realtime gap is
//! detected and buffered, the would-be TCP replay is fed back in through
//! `on_recovered_record`, and `complete_recovery` replays the buffer and
//! signals completion with the right `EventEnd` placement.

use codec::txt::header::{next_frame, ETX, STX};
use feed_core::sink::RecordingSink;
use feed_core::txt::{SeqGap, TxtChannelProcessor};
use types::event::MarketEventPayload;
use types::ids::ChannelId;

fn header(seq: &str, msg_type: &[u8; 2]) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(seq.as_bytes());
    buf.extend_from_slice(msg_type);
    buf.extend_from_slice(&[b'0'; 20]);
    buf
}

fn depth_record(seq: &str, status_marker: u8) -> Vec<u8> {
    let mut buf = header(seq, b"H ");
    buf.push(b'X');
    buf.extend_from_slice(b"ESH25 ");
    buf.push(b'H');
    buf.extend_from_slice(b"25");
    buf.extend_from_slice(b"18");
    buf.push(status_marker);
    buf.push(b'1');
    buf.push(b'1');
    buf.extend_from_slice(b"0001000");
    buf.push(b'2');
    buf.extend_from_slice(b"00005");
    buf.extend_from_slice(b"02");
    buf.extend_from_slice(b"0001001");
    buf.push(b'2');
    buf.extend_from_slice(b"00007");
    buf.extend_from_slice(b"03");
    buf
}

fn framed_record(raw: &[u8]) -> Vec<u8> {
    let mut framed = vec![STX];
    framed.extend_from_slice(raw);
    framed.push(ETX);
    framed
}

fn decode_one(raw: &[u8]) -> Vec<u8> {
    let framed = framed_record(raw);
    let (record, _) = next_frame(&framed, 0).unwrap().unwrap();
    record.to_vec()
}

#[test]
fn gap_is_buffered_then_drained_on_recovery_completion() {
    let mut proc = TxtChannelProcessor::new(ChannelId(7));
    let mut sink = RecordingSink::default();

    let seq1 = decode_one(&depth_record("0000000001", b'T'));
    assert!(proc.on_realtime_record(&seq1, 100, &mut sink).is_none());

    // Seq 5 arrives before 2-4 do: a gap from 2 to 4 opens and this
    // record is buffered rather than applied immediately.
    let seq5 = decode_one(&depth_record("0000000005", b'T'));
    let gap = proc.on_realtime_record(&seq5, 200, &mut sink);
    assert_eq!(gap, Some(SeqGap { from: 2, to: 4 }));
    assert!(proc.is_in_recovery());

    let incremental_before = sink.incremental.len();

    // The TCP retransmission dialog replays 2..4; each is applied
    // in-line as it arrives, same as the realtime path.
    for seq in ["0000000002", "0000000003", "0000000004"] {
        let record = decode_one(&depth_record(seq, b'T'));
        proc.on_recovered_record(&record, 300, &mut sink);
    }
    assert!(sink.incremental.len() > incremental_before);

    // Recovery completes: the buffered seq-5 record drains and an
    // `EventEnd` fires on the incremental channel (not startup recovery).
    proc.complete_recovery(2, 4, 400, &mut sink);
    assert!(!proc.is_in_recovery());
    assert!(sink.snapshot.is_empty());
    assert!(sink
        .incremental
        .iter()
        .any(|e| matches!(e.payload, MarketEventPayload::EventEnd)));
}

#[test]
fn startup_recovery_emits_event_end_on_the_snapshot_channel() {
    let mut proc = TxtChannelProcessor::new(ChannelId(7));
    let mut sink = RecordingSink::default();

    // The channel comes up mid-stream at seq 10 with nothing buffered --
    // this models the `from_seq == 1` startup retransmission case.
    for seq in ["0000000001", "0000000002"] {
        let record = decode_one(&depth_record(seq, b'T'));
        proc.on_recovered_record(&record, 100, &mut sink);
    }

    proc.complete_recovery(1, 2, 200, &mut sink);
    assert!(!proc.is_in_recovery());
    assert_eq!(sink.snapshot.len(), 1);
    assert!(matches!(sink.snapshot[0].payload, MarketEventPayload::EventEnd));
}
