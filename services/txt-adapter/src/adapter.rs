//! Network/worker executor split for one TXT channel (§5, §10 "Async
//! runtime"), mirroring `bin-adapter`'s split: a network task owns the
//! incremental multicast socket and forwards `STX`/`ETX`-framed records
//! verbatim; the worker task owns the [`TxtChannelProcessor`] and, when a
//! gap is detected, drives the TCP retransmission dialog itself (§4.5).
//!
//! Unlike BIN, TXT's recovery path is a short-lived TCP session rather
//! than a second multicast feed, so there is no `SnapshotControl`
//! equivalent here: the worker spawns one recovery task per gap and folds
//! its output back into its own event stream.

use std::collections::VecDeque;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use codec::txt::header::next_frame;
use codec::txt::{decode_record, peek_seq_num, TxtRecord};
use config::ChannelConfig;
use feed_core::txt::{SeqGap, TxtChannelProcessor};
use network::recovery::{MessageVerdict, TxtRecoveryAction, TxtRecoveryConfig, TxtRecoveryDriver};
use network::time::CachedClock;
use network::transports::{MulticastSocket, TxtRecoveryConnection};
use types::event::ChannelStatus;
use types::ids::ChannelId;

use crate::sink::TracingSink;

enum WorkerEvent {
    Realtime(Vec<u8>),
    Recovered(Vec<u8>),
    RecoveryDone { from: u64, to: u64, failed: bool },
}

/// Health counters exposed by [`TxtAdapter::health_check`], updated only
/// from the worker task.
#[derive(Debug, Default)]
pub struct ChannelHealth {
    pub records_processed: AtomicU64,
    pub decode_errors: AtomicU64,
}

pub struct TxtAdapter {
    channels: Vec<ChannelConfig>,
    is_running: Arc<AtomicBool>,
    clock: CachedClock,
    health: Vec<Arc<ChannelHealth>>,
    tasks: Vec<JoinHandle<()>>,
    start_time: Instant,
}

impl TxtAdapter {
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
            info!(channel = %channel.channel_name, "starting TXT channel");
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
                    h.records_processed.load(Ordering::Relaxed),
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

    let network_config = config.clone();
    let network_events_tx = events_tx.clone();
    let network_task = tokio::spawn(async move {
        if let Err(e) = run_network_executor(network_config, network_events_tx).await {
            warn!(error = %e, "TXT network executor exited");
        }
    });

    run_worker_executor(channel_id, config, health, running, clock, events_tx, events_rx).await;
    network_task.abort();
}

async fn run_network_executor(config: ChannelConfig, events_tx: mpsc::Sender<WorkerEvent>) -> Result<()> {
    let endpoint = config
        .feeds
        .get("a_incremental")
        .with_context(|| format!("TXT channel {:?} has no a_incremental feed configured", config.channel_name))?;
    let bind_addr = SocketAddr::new(std::net::IpAddr::V4(Ipv4Addr::UNSPECIFIED), endpoint.port);
    let socket = MulticastSocket::join(bind_addr, endpoint.group, config.interface_a)
        .await
        .with_context(|| format!("failed to join a_incremental for channel {:?}", config.channel_name))?;

    let mut buf = vec![0u8; 65_535];
    loop {
        let n = socket.recv(&mut buf).await.context("TXT incremental socket read failed")?;
        let mut offset = 0;
        while let Ok(Some((record, next))) = next_frame(&buf[..n], offset) {
            if events_tx.send(WorkerEvent::Realtime(record.to_vec())).await.is_err() {
                return Ok(());
            }
            offset = next;
        }
    }
}

async fn run_worker_executor(
    channel_id: ChannelId,
    config: ChannelConfig,
    health: Arc<ChannelHealth>,
    running: Arc<AtomicBool>,
    clock: CachedClock,
    events_tx: mpsc::Sender<WorkerEvent>,
    mut events_rx: mpsc::Receiver<WorkerEvent>,
) {
    let mut processor = TxtChannelProcessor::new(channel_id);
    let mut sink = TracingSink::default();
    let recovery_settings = config.txt_recovery().ok();
    let mut recovery_in_flight = false;

    while running.load(Ordering::Relaxed) {
        let event = match events_rx.recv().await {
            Some(e) => e,
            None => break,
        };

        let now_ns = clock.now_ns();
        match event {
            WorkerEvent::Realtime(raw) => {
                health.records_processed.fetch_add(1, Ordering::Relaxed);
                let record_kind = decode_record(&raw);
                let gap = processor.on_realtime_record(&raw, now_ns, &mut sink);

                if let Some(SeqGap { from, to }) = gap {
                    match &recovery_settings {
                        Some(settings) if !recovery_in_flight => {
                            recovery_in_flight = true;
                            let settings = settings.clone();
                            let tx = events_tx.clone();
                            tokio::spawn(async move {
                                run_recovery_session(SeqGap { from, to }, settings, tx).await;
                            });
                        }
                        Some(_) => {
                            // already recovering -- the processor buffers
                            // this record until the in-flight session
                            // completes (§4.4.1).
                        }
                        None => {
                            health.decode_errors.fetch_add(1, Ordering::Relaxed);
                            warn!(channel = %config.channel_name, "TXT gap detected but channel has no recovery configuration");
                        }
                    }
                }

                if let Ok(TxtRecord::StartOfDay(_)) = record_kind {
                    if processor.on_start_of_day() {
                        sink.on_channel_status(channel_id, ChannelStatus::Stable);
                    }
                }
            }
            WorkerEvent::Recovered(raw) => {
                processor.on_recovered_record(&raw, now_ns, &mut sink);
            }
            WorkerEvent::RecoveryDone { from, to, failed } => {
                recovery_in_flight = false;
                if failed {
                    warn!(channel = %config.channel_name, to, "TXT recovery session failed, applying best-effort completion");
                }
                processor.complete_recovery(from, to, now_ns, &mut sink);
                if !processor.is_in_recovery() {
                    sink.on_channel_status(channel_id, ChannelStatus::Stable);
                }
            }
        }
    }
}

/// Drives one TCP retransmission dialog end to end (§4.5.2), feeding
/// accepted replay records back to the worker over `tx` and reporting
/// completion via [`WorkerEvent::RecoveryDone`] regardless of outcome --
/// §4.7's completion steps run whether or not the gap was actually
/// closed.
async fn run_recovery_session(gap: SeqGap, settings: config::TxtRecoverySettings, tx: mpsc::Sender<WorkerEvent>) {
    let mut driver = TxtRecoveryDriver::new(TxtRecoveryConfig {
        username: settings.username.clone(),
        password: settings.password.clone(),
        line: settings.line,
        timeout: std::time::Duration::from_secs(settings.timeout_secs),
        page_size: settings.page_size,
    });

    let mut pending: VecDeque<TxtRecoveryAction> = driver.request_gap(gap.from, gap.to).into();
    let mut conn: Option<TxtRecoveryConnection> = None;

    loop {
        while let Some(action) = pending.pop_front() {
            match action {
                TxtRecoveryAction::Connect => match TxtRecoveryConnection::connect(settings.tcp_addr).await {
                    Ok(c) => {
                        conn = Some(c);
                        match driver.on_connected(&login_timestamp()) {
                            Ok(next) => pending.extend(next),
                            Err(e) => warn!(error = %e, "TXT recovery driver rejected on_connected"),
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, addr = %settings.tcp_addr, "TXT recovery TCP connect failed");
                        pending.extend(driver.on_abandon_expired());
                    }
                },
                TxtRecoveryAction::Send(bytes) => {
                    if let Some(c) = conn.as_mut() {
                        if let Err(e) = c.send(&bytes).await {
                            warn!(error = %e, "TXT recovery send failed");
                            pending.extend(driver.on_abandon_expired());
                        }
                    }
                }
                TxtRecoveryAction::Disconnect => {
                    conn = None;
                }
                TxtRecoveryAction::RecoveryComplete { failed } => {
                    let _ = tx.send(WorkerEvent::RecoveryDone { from: gap.from, to: gap.to, failed }).await;
                    return;
                }
            }
        }

        let deadline = driver.abandon_deadline().map(tokio::time::Instant::from_std);
        tokio::select! {
            result = read_one(&mut conn), if conn.is_some() => {
                match result {
                    Some(Ok(raw)) => pending.extend(dispatch_recovered_record(&raw, &mut driver, &tx).await),
                    Some(Err(e)) => {
                        warn!(error = %e, "TXT recovery TCP read failed");
                        pending.extend(driver.on_abandon_expired());
                    }
                    None => {}
                }
            }
            _ = tokio::time::sleep_until(deadline.unwrap_or_else(tokio::time::Instant::now)), if deadline.is_some() => {
                warn!("TXT recovery abandon deadline elapsed");
                pending.extend(driver.on_abandon_expired());
            }
        }
    }
}

async fn read_one(conn: &mut Option<TxtRecoveryConnection>) -> Option<network::error::Result<Vec<u8>>> {
    match conn.as_mut() {
        Some(c) => Some(c.read_record().await),
        None => None,
    }
}

async fn dispatch_recovered_record(
    raw: &[u8],
    driver: &mut TxtRecoveryDriver,
    tx: &mpsc::Sender<WorkerEvent>,
) -> Vec<TxtRecoveryAction> {
    match decode_record(raw) {
        Ok(TxtRecord::LoginAcknowledgement(_)) => driver
            .on_login_ack()
            .unwrap_or_else(|e| { warn!(error = %e, "on_login_ack"); Vec::new() }),
        Ok(TxtRecord::RetransmissionBegin(_)) => {
            if let Err(e) = driver.on_retransmission_begin() {
                warn!(error = %e, "on_retransmission_begin");
            }
            Vec::new()
        }
        Ok(TxtRecord::RetransmissionEnd(_)) => driver
            .on_retransmission_end()
            .unwrap_or_else(|e| { warn!(error = %e, "on_retransmission_end"); Vec::new() }),
        Ok(TxtRecord::LogoutAcknowledgement(_)) => driver
            .on_logout_ack()
            .unwrap_or_else(|e| { warn!(error = %e, "on_logout_ack"); Vec::new() }),
        Ok(TxtRecord::ErrorMessage(err)) => {
            if let Err(e) = driver.on_error() {
                warn!(error = %e, "on_error");
            }
            warn!(code = ?err.error_code, "TXT retransmission peer reported an error");
            Vec::new()
        }
        Ok(_market_data) => {
            if let Ok(seq) = peek_seq_num(raw) {
                match driver.on_message(seq) {
                    Ok(MessageVerdict::Accept) => {
                        let _ = tx.send(WorkerEvent::Recovered(raw.to_vec())).await;
                    }
                    Ok(MessageVerdict::Duplicate) | Ok(MessageVerdict::OutOfRange) => {}
                    Err(e) => warn!(error = %e, "on_message"),
                }
            }
            Vec::new()
        }
        Err(e) => {
            warn!(error = %e, "failed to decode retransmitted TXT record");
            Vec::new()
        }
    }
}

/// `HHMMSS` login timestamp (the driver doesn't own a clock, per §5).
fn login_timestamp() -> [u8; 6] {
    let now = chrono::Local::now();
    let formatted = now.format("%H%M%S").to_string();
    let mut out = [b'0'; 6];
    let bytes = formatted.as_bytes();
    out[..bytes.len().min(6)].copy_from_slice(&bytes[..bytes.len().min(6)]);
    out
}
