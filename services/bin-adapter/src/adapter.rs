//! Network/worker executor split for one BIN channel (§5, §10 "Async
//! runtime"): a network task owns the multicast sockets and only ever
//! parses the packet header far enough to route the packet, handing the
//! body to the worker over an `mpsc` channel; the worker task owns the
//! [`BinChannelProcessor`] and every downstream decode/dispatch call.
//! Mirrors the teacher's `libs/network/src/transports` /
//! `services/adapters/.../input/connection.rs` split.
//!
//! Per [`network::transports::MulticastSocket::join`]'s own doc comment,
//! the core never arbitrates between the A and B redundant feeds -- this
//! adapter wires to the `a_*` feed for each channel and leaves A/B
//! failover to deployment-level tooling, which is out of scope here.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use codec::bin::PacketHeader;
use config::ChannelConfig;
use feed_core::bin::BinChannelProcessor;
use network::recovery::FeedAction;
use network::time::CachedClock;
use network::transports::MulticastSocket;
use types::ids::ChannelId;

use crate::sink::TracingSink;

enum NetworkEvent {
    Incremental { appl_seq_num: u32, segment_id: i32, body: Vec<u8>, complete: bool },
    Snapshot { appl_seq_num: u32, segment_id: i32, body: Vec<u8> },
}

enum SnapshotControl {
    Start,
    Stop,
}

/// Health counters exposed by [`BinAdapter::health_check`], updated only
/// from the worker task.
#[derive(Debug, Default)]
pub struct ChannelHealth {
    pub packets_processed: AtomicU64,
    pub decode_errors: AtomicU64,
}

pub struct BinAdapter {
    channels: Vec<ChannelConfig>,
    is_running: Arc<AtomicBool>,
    clock: CachedClock,
    health: Vec<Arc<ChannelHealth>>,
    tasks: Vec<JoinHandle<()>>,
    start_time: Instant,
}

impl BinAdapter {
    pub fn new(channels: Vec<ChannelConfig>) -> Self {
        let health = channels.iter().map(|_| Arc::new(ChannelHealth::default())).collect();
        Self {
            channels,
            is_running: Arc::new(AtomicBool::new(false)),
            clock: CachedClock::with_default_interval(),
            health,
            tasks: Vec::new(),
            start_time: Instant::now(),
        }
    }

    pub async fn start(&mut self) -> Result<()> {
        self.is_running.store(true, Ordering::SeqCst);
        for (id, channel) in self.channels.iter().enumerate() {
            let channel_id = ChannelId(id as u32 + 1);
            let health = self.health[id].clone();
            let running = self.is_running.clone();
            let channel = channel.clone();
            info!(channel = %channel.channel_name, "starting BIN channel");
            let handle = tokio::spawn(run_channel(channel_id, channel, health, running, self.clock.clone()));
            self.tasks.push(handle);
        }
        Ok(())
    }

    pub async fn stop(&mut self) {
        self.is_running.store(false, Ordering::SeqCst);
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }

    pub fn health_check(&self) -> Vec<(String, u64, u64)> {
        self.channels
            .iter()
            .zip(self.health.iter())
            .map(|(c, h)| {
                (
                    c.channel_name.clone(),
                    h.packets_processed.load(Ordering::Relaxed),
                    h.decode_errors.load(Ordering::Relaxed),
                )
            })
            .collect()
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

async fn run_channel(
    channel_id: ChannelId,
    config: ChannelConfig,
    health: Arc<ChannelHealth>,
    running: Arc<AtomicBool>,
    clock: CachedClock,
) {
    let (events_tx, events_rx) = mpsc::channel(1024);
    let (control_tx, control_rx) = mpsc::channel(16);

    let network_config = config.clone();
    let network_task = tokio::spawn(async move {
        if let Err(e) = run_network_executor(network_config, events_tx, control_rx).await {
            warn!(error = %e, "BIN network executor exited");
        }
    });

    run_worker_executor(channel_id, config, health, running, clock, events_rx, control_tx).await;
    network_task.abort();
}

async fn run_network_executor(
    config: ChannelConfig,
    events_tx: mpsc::Sender<NetworkEvent>,
    mut control_rx: mpsc::Receiver<SnapshotControl>,
) -> Result<()> {
    let incremental = open_feed(&config, "a_incremental").await?;
    let mut snapshot_task: Option<JoinHandle<()>> = None;

    let mut buf = vec![0u8; 65_535];
    loop {
        tokio::select! {
            control = control_rx.recv() => {
                match control {
                    Some(SnapshotControl::Start) => {
                        if snapshot_task.is_none() {
                            if let Ok(snapshot) = open_feed(&config, "a_snapshot").await {
                                let tx = events_tx.clone();
                                snapshot_task = Some(tokio::spawn(run_snapshot_reader(snapshot, tx)));
                            } else {
                                warn!(channel = %config.channel_name, "no a_snapshot feed configured, cannot recover");
                            }
                        }
                    }
                    Some(SnapshotControl::Stop) => {
                        if let Some(task) = snapshot_task.take() {
                            task.abort();
                        }
                    }
                    None => break,
                }
            }
            result = incremental.recv(&mut buf) => {
                let n = result.context("BIN incremental socket read failed")?;
                if n < PacketHeader::SIZE {
                    continue;
                }
                let header = match PacketHeader::decode(&buf[..n]) {
                    Ok(h) => h,
                    Err(_) => continue,
                };
                let body = buf[PacketHeader::SIZE..n].to_vec();
                if events_tx
                    .send(NetworkEvent::Incremental {
                        appl_seq_num: header.appl_seq_num(),
                        segment_id: header.market_segment_id(),
                        body,
                        complete: header.is_last_in_packet(),
                    })
                    .await
                    .is_err()
                {
                    break;
                }
            }
        }
    }

    if let Some(task) = snapshot_task {
        task.abort();
    }
    Ok(())
}

async fn run_snapshot_reader(socket: MulticastSocket, events_tx: mpsc::Sender<NetworkEvent>) {
    let mut buf = vec![0u8; 65_535];
    loop {
        let n = match socket.recv(&mut buf).await {
            Ok(n) => n,
            Err(e) => {
                warn!(error = %e, "BIN snapshot socket read failed");
                return;
            }
        };
        if n < PacketHeader::SIZE {
            continue;
        }
        let header = match PacketHeader::decode(&buf[..n]) {
            Ok(h) => h,
            Err(_) => continue,
        };
        let body = buf[PacketHeader::SIZE..n].to_vec();
        if events_tx
            .send(NetworkEvent::Snapshot {
                appl_seq_num: header.appl_seq_num(),
                segment_id: header.market_segment_id(),
                body,
            })
            .await
            .is_err()
        {
            return;
        }
    }
}

async fn open_feed(config: &ChannelConfig, key: &str) -> Result<MulticastSocket> {
    let endpoint = config
        .feeds
        .get(key)
        .with_context(|| format!("channel {:?} has no {} feed configured", config.channel_name, key))?;
    let bind_addr = SocketAddr::new(std::net::IpAddr::V4(Ipv4Addr::UNSPECIFIED), endpoint.port);
    MulticastSocket::join(bind_addr, endpoint.group, config.interface_a)
        .await
        .with_context(|| format!("failed to join {} for channel {:?}", key, config.channel_name))
}

async fn run_worker_executor(
    channel_id: ChannelId,
    config: ChannelConfig,
    health: Arc<ChannelHealth>,
    running: Arc<AtomicBool>,
    clock: CachedClock,
    mut events_rx: mpsc::Receiver<NetworkEvent>,
    control_tx: mpsc::Sender<SnapshotControl>,
) {
    let mut processor = BinChannelProcessor::new(channel_id);
    let mut sink = TracingSink::default();

    while running.load(Ordering::Relaxed) {
        let event = match events_rx.recv().await {
            Some(e) => e,
            None => break,
        };

        let now_ns = clock.now_ns();
        let action = match event {
            NetworkEvent::Incremental { appl_seq_num, segment_id, body, complete } => {
                health.packets_processed.fetch_add(1, Ordering::Relaxed);
                processor.on_incremental_packet(segment_id, appl_seq_num, &body, complete, now_ns, &mut sink)
            }
            NetworkEvent::Snapshot { appl_seq_num, segment_id, body } => {
                processor.on_snapshot_packet(segment_id, appl_seq_num, &body, now_ns, &mut sink)
            }
        };

        match action {
            FeedAction::Start => {
                let _ = control_tx.send(SnapshotControl::Start).await;
            }
            FeedAction::Stop => {
                let _ = control_tx.send(SnapshotControl::Stop).await;
            }
            FeedAction::None => {}
        }
    }

    let _ = config;
}
