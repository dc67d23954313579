//! Per-channel configuration (§6 "Configuration"): interface addresses,
//! multicast feed endpoints, and -- for TXT channels -- the retransmission
//! session's credentials, line, timeout and page size.

use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;

use anyhow::{ensure, Context, Result};
use config_crate::{Config, Environment, File};
use serde::Deserialize;

/// A multicast group/port pair for one side (A or B) of one feed
/// (incremental or snapshot).
#[derive(Debug, Clone, Deserialize)]
pub struct FeedEndpoint {
    pub group: Ipv4Addr,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelProtocol {
    Bin,
    Txt,
}

/// One multicast/TCP-recovery channel. `protocol` selects which of the
/// `recovery_*` fields are required; `txt_recovery()` validates that and
/// returns a ready-to-use bundle.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelConfig {
    pub channel_name: String,
    pub protocol: ChannelProtocol,
    pub interface_a: Ipv4Addr,
    pub interface_b: Ipv4Addr,
    /// Keyed by e.g. `"a_incremental"`, `"b_incremental"`, `"a_snapshot"`,
    /// `"b_snapshot"` -- BIN channels populate all four, TXT channels
    /// populate only the incremental pair (recovery rides a dedicated
    /// TCP connection, not a snapshot multicast feed).
    pub feeds: HashMap<String, FeedEndpoint>,

    pub recovery_username: Option<String>,
    pub recovery_password: Option<String>,
    pub recovery_line: Option<String>,
    pub recovery_timeout_secs: Option<u64>,
    pub recovery_page_size: Option<u64>,
    pub recovery_tcp_addr: Option<SocketAddr>,
}

/// The subset of `ChannelConfig` a TXT recovery driver needs, validated
/// up front so `network::recovery::TxtRecoveryDriver` never has to.
#[derive(Debug, Clone)]
pub struct TxtRecoverySettings {
    pub username: String,
    pub password: String,
    pub line: [u8; 2],
    pub timeout_secs: u64,
    pub page_size: u64,
    pub tcp_addr: SocketAddr,
}

impl ChannelConfig {
    pub fn txt_recovery(&self) -> Result<TxtRecoverySettings> {
        ensure!(
            self.protocol == ChannelProtocol::Txt,
            "channel {:?} is not a TXT channel",
            self.channel_name
        );
        let line = self
            .recovery_line
            .as_deref()
            .context("recovery_line is required for TXT channels")?;
        let line_bytes = line.as_bytes();
        ensure!(
            line_bytes.len() == 2,
            "recovery_line must be exactly 2 characters, got {:?}",
            line
        );
        Ok(TxtRecoverySettings {
            username: self
                .recovery_username
                .clone()
                .context("recovery_username is required for TXT channels")?,
            password: self
                .recovery_password
                .clone()
                .context("recovery_password is required for TXT channels")?,
            line: [line_bytes[0], line_bytes[1]],
            timeout_secs: self
                .recovery_timeout_secs
                .context("recovery_timeout_secs is required for TXT channels")?,
            page_size: self
                .recovery_page_size
                .context("recovery_page_size is required for TXT channels")?,
            tcp_addr: self
                .recovery_tcp_addr
                .context("recovery_tcp_addr is required for TXT channels")?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChannelsFile {
    channel: Vec<ChannelConfig>,
}

/// Loads every `[[channel]]` table from `path`, with `FEED_`-prefixed
/// environment variables overriding individual fields (mirrors the
/// reference deployment tooling's practice of templating credentials in
/// at process start rather than committing them to the TOML file).
pub fn load_channels(path: &Path) -> Result<Vec<ChannelConfig>> {
    let settings = Config::builder()
        .add_source(File::from(path).required(true))
        .add_source(
            Environment::with_prefix("FEED")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .with_context(|| format!("failed to build configuration from {:?}", path))?;
    let file: ChannelsFile = settings
        .try_deserialize()
        .context("failed to deserialize channel configuration")?;
    Ok(file.channel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_config(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("channels.toml");
        fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn loads_a_bin_channel_with_four_feed_endpoints() {
        let (_dir, path) = write_config(
            r#"
[[channel]]
channel_name = "XEUR.DE"
protocol = "bin"
interface_a = "10.0.0.1"
interface_b = "10.0.0.2"

[channel.feeds.a_incremental]
group = "233.1.1.1"
port = 15000

[channel.feeds.b_incremental]
group = "233.1.1.2"
port = 15000

[channel.feeds.a_snapshot]
group = "233.1.2.1"
port = 16000

[channel.feeds.b_snapshot]
group = "233.1.2.2"
port = 16000
"#,
        );
        let channels = load_channels(&path).unwrap();
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].protocol, ChannelProtocol::Bin);
        assert_eq!(channels[0].feeds.len(), 4);
    }

    #[test]
    fn txt_channel_without_recovery_fields_is_rejected() {
        let (_dir, path) = write_config(
            r#"
[[channel]]
channel_name = "MX"
protocol = "txt"
interface_a = "10.0.0.1"
interface_b = "10.0.0.2"
"#,
        );
        let channels = load_channels(&path).unwrap();
        assert!(channels[0].txt_recovery().is_err());
    }

    #[test]
    fn txt_channel_with_full_recovery_settings_parses_the_line_bytes() {
        let (_dir, path) = write_config(
            r#"
[[channel]]
channel_name = "MX"
protocol = "txt"
interface_a = "10.0.0.1"
interface_b = "10.0.0.2"
recovery_username = "bob"
recovery_password = "secret"
recovery_line = "L1"
recovery_timeout_secs = 5
recovery_page_size = 1000
recovery_tcp_addr = "10.0.0.9:7000"
"#,
        );
        let channels = load_channels(&path).unwrap();
        let recovery = channels[0].txt_recovery().unwrap();
        assert_eq!(recovery.line, *b"L1");
        assert_eq!(recovery.page_size, 1000);
    }
}
