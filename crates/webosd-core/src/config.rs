use std::net::{SocketAddr, ToSocketAddrs};

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{OsdError, Result};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_DRIVER: &str = "fake";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100; // 10 samples per second
pub const DEFAULT_SHUTDOWN_GRACE_MS: u64 = 1_000;

// Broadcaster queue sizes. Small on purpose: a slow consumer is dropped,
// never buffered for.
pub const DEFAULT_PUBLISH_CAPACITY: usize = 8;
pub const DEFAULT_MAILBOX_CAPACITY: usize = 3;
pub const DEFAULT_REQUEST_CAPACITY: usize = 2;

/// Top-level config (webosd.toml + WEBOSD_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OsdConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub events: EventsConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// How long in-flight responses get to finish once shutdown starts.
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
        }
    }
}

impl ServerConfig {
    /// Override bind/port from a `host:port` string (the `--addr` flag).
    pub fn set_addr(&mut self, addr: &str) -> Result<()> {
        let invalid = |reason: &str| OsdError::InvalidAddress {
            addr: addr.to_string(),
            reason: reason.to_string(),
        };
        let (host, port) = addr
            .rsplit_once(':')
            .ok_or_else(|| invalid("missing port"))?;
        let port: u16 = port.parse().map_err(|_| invalid("port is not a number"))?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        self.bind = if host.is_empty() {
            "0.0.0.0".to_string()
        } else {
            host.to_string()
        };
        self.port = port;
        Ok(())
    }

    /// Resolve the configured bind address. Host names are looked up.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.bind, self.port);
        let invalid = |reason: String| OsdError::InvalidAddress {
            addr: addr.clone(),
            reason,
        };
        if let Ok(ip) = self.bind.parse::<std::net::IpAddr>() {
            return Ok(SocketAddr::new(ip, self.port));
        }
        (self.bind.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| invalid(e.to_string()))?
            .next()
            .ok_or_else(|| invalid("host did not resolve".to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Driver name passed to `webosd_device::open` (`fake`, `sin`).
    #[serde(default = "default_driver")]
    pub driver: String,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            driver: default_driver(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

/// Queue sizes for the event broadcaster.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventsConfig {
    #[serde(default = "default_publish_capacity")]
    pub publish_capacity: usize,
    #[serde(default = "default_mailbox_capacity")]
    pub mailbox_capacity: usize,
    #[serde(default = "default_request_capacity")]
    pub request_capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            publish_capacity: DEFAULT_PUBLISH_CAPACITY,
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
            request_capacity: DEFAULT_REQUEST_CAPACITY,
        }
    }
}

impl EventsConfig {
    /// Same config with every capacity raised to at least 1.
    /// Tokio channels panic on a zero capacity.
    pub fn clamped(self) -> Self {
        Self {
            publish_capacity: self.publish_capacity.max(1),
            mailbox_capacity: self.mailbox_capacity.max(1),
            request_capacity: self.request_capacity.max(1),
        }
    }
}

/// Initial on-screen display settings. Colors stay strings here; the
/// gateway parses them at startup and rejects bad values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_background_color")]
    pub background_color: String,
    #[serde(default = "default_volt_color")]
    pub volt_color: String,
    #[serde(default = "default_amp_color")]
    pub amp_color: String,
    #[serde(default = "default_font")]
    pub font: String,
    #[serde(default = "default_font_size")]
    pub font_size: u64,
    #[serde(default = "default_font_weight")]
    pub font_weight: u64,
    #[serde(default = "default_line_height")]
    pub line_height: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            background_color: default_background_color(),
            volt_color: default_volt_color(),
            amp_color: default_amp_color(),
            font: default_font(),
            font_size: default_font_size(),
            font_weight: default_font_weight(),
            line_height: default_line_height(),
        }
    }
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_shutdown_grace_ms() -> u64 {
    DEFAULT_SHUTDOWN_GRACE_MS
}
fn default_driver() -> String {
    DEFAULT_DRIVER.to_string()
}
fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}
fn default_publish_capacity() -> usize {
    DEFAULT_PUBLISH_CAPACITY
}
fn default_mailbox_capacity() -> usize {
    DEFAULT_MAILBOX_CAPACITY
}
fn default_request_capacity() -> usize {
    DEFAULT_REQUEST_CAPACITY
}
fn default_background_color() -> String {
    "#000000ff".to_string()
}
fn default_volt_color() -> String {
    "#008000".to_string()
}
fn default_amp_color() -> String {
    "#ffff00".to_string()
}
fn default_font() -> String {
    "monospace".to_string()
}
fn default_font_size() -> u64 {
    70
}
fn default_font_weight() -> u64 {
    400
}
fn default_line_height() -> u64 {
    110
}

impl OsdConfig {
    /// Load config from a TOML file with WEBOSD_* env var overrides.
    ///
    /// Nested keys use a double underscore: `WEBOSD_DEVICE__DRIVER=sin`.
    /// A missing file is not an error; every field has a default.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: OsdConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("WEBOSD_").split("__"))
            .extract()
            .map_err(|e| OsdError::Config(e.to_string()))?;

        tracing::debug!(path = %path, "config loaded");
        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.webosd/webosd.toml", home)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let cfg = OsdConfig::default();
        assert_eq!(cfg.server.port, DEFAULT_PORT);
        assert_eq!(cfg.device.driver, "fake");
        assert_eq!(cfg.device.poll_interval_ms, 100);
        assert_eq!(cfg.events.publish_capacity, 8);
        assert_eq!(cfg.events.mailbox_capacity, 3);
        assert_eq!(cfg.events.request_capacity, 2);
    }

    #[test]
    fn load_merges_file_and_env() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "webosd.toml",
                r#"
                [server]
                port = 9000

                [events]
                mailbox_capacity = 5
                "#,
            )?;
            jail.set_env("WEBOSD_DEVICE__DRIVER", "sin");
            jail.set_env("WEBOSD_DEVICE__POLL_INTERVAL_MS", "250");

            let cfg = OsdConfig::load(Some("webosd.toml")).map_err(|e| e.to_string())?;
            assert_eq!(cfg.server.port, 9000);
            assert_eq!(cfg.server.bind, DEFAULT_BIND);
            assert_eq!(cfg.events.mailbox_capacity, 5);
            assert_eq!(cfg.events.publish_capacity, DEFAULT_PUBLISH_CAPACITY);
            assert_eq!(cfg.device.driver, "sin");
            assert_eq!(cfg.device.poll_interval_ms, 250);
            Ok(())
        });
    }

    #[test]
    fn missing_file_yields_defaults() {
        figment::Jail::expect_with(|_jail| {
            let cfg = OsdConfig::load(Some("nope.toml")).map_err(|e| e.to_string())?;
            assert_eq!(cfg.server.port, DEFAULT_PORT);
            assert_eq!(cfg.display.font, "monospace");
            Ok(())
        });
    }

    #[test]
    fn set_addr_parses_host_and_port() {
        let mut server = ServerConfig::default();
        server.set_addr("localhost:8081").unwrap();
        assert_eq!(server.bind, "localhost");
        assert_eq!(server.port, 8081);

        server.set_addr("[::1]:9999").unwrap();
        assert_eq!(server.bind, "::1");
        assert_eq!(server.socket_addr().unwrap().port(), 9999);

        server.set_addr(":80").unwrap();
        assert_eq!(server.bind, "0.0.0.0");
    }

    #[test]
    fn set_addr_rejects_garbage() {
        let mut server = ServerConfig::default();
        assert!(matches!(
            server.set_addr("localhost"),
            Err(OsdError::InvalidAddress { .. })
        ));
        assert!(server.set_addr("localhost:http").is_err());
        assert!(server.set_addr("localhost:70000").is_err());
    }

    #[test]
    fn zero_capacities_are_clamped() {
        let events = EventsConfig {
            publish_capacity: 0,
            mailbox_capacity: 0,
            request_capacity: 4,
        }
        .clamped();
        assert_eq!(events.publish_capacity, 1);
        assert_eq!(events.mailbox_capacity, 1);
        assert_eq!(events.request_capacity, 4);
    }
}
