//! # Exporter Configuration
//!
//! Configuration is assembled once at startup and is read-only afterwards:
//!
//! 1. [`RawConfig::load`] reads the optional YAML file and applies flag and
//!    environment overrides.
//! 2. [`RawConfig::log_settings`] validates the logging options, so logging can
//!    be initialized before anything else is reported.
//! 3. [`Config::assemble`] applies defaults, validates the rest and expands the
//!    configured groups into probe targets.
//!
//! Any problem is a [`ConfigError`]; a partially valid configuration is never
//! used.

mod error;
mod expand;
mod raw;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tracing::level_filters::LevelFilter;

use crate::network::target::{Target, split_host_port};

pub use error::ConfigError;
pub use expand::expand_targets;
pub use raw::{InterfaceGroups, ItemEntry, ItemGroups, ItemSpec, Overrides, RawConfig};

pub const DEFAULT_LISTEN_ADDR: &str = ":9407";
pub const DEFAULT_METRICS_PATH: &str = "/metrics";
pub const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Colored, human oriented lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(ConfigError::InvalidLogFormat(s.to_string())),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Pretty => f.write_str("pretty"),
            LogFormat::Json => f.write_str("json"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

/// Parses a log level, also accepting the `warning`, `fatal` and `panic`
/// spellings found in older configuration files.
pub fn parse_log_level(s: &str) -> Result<LevelFilter, ConfigError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "warning" => Ok(LevelFilter::WARN),
        "fatal" | "panic" => Ok(LevelFilter::ERROR),
        other => other
            .parse::<LevelFilter>()
            .map_err(|_| ConfigError::InvalidLogLevel(s.to_string())),
    }
}

/// Validated exporter configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Dial timeout shared by all targets.
    pub connection_timeout: Duration,
    /// Upper bound for one DNS lookup; `None` leaves lookups unbounded.
    pub resolution_timeout: Option<Duration>,
    pub log: LogSettings,
    /// Socket address the HTTP server binds to.
    pub listen_addr: String,
    pub metrics_path: String,
    /// Probe targets in configuration order.
    pub targets: Vec<Target>,
}

impl Config {
    pub fn assemble(raw: RawConfig) -> Result<Self, ConfigError> {
        let log = raw.log_settings()?;

        let connection_timeout = raw
            .connection_timeout
            .filter(|timeout| !timeout.is_zero())
            .unwrap_or(DEFAULT_CONNECTION_TIMEOUT);
        let resolution_timeout = raw.resolution_timeout.filter(|timeout| !timeout.is_zero());

        let listen_addr = normalize_listen_addr(
            raw.listen_addr
                .as_deref()
                .filter(|addr| !addr.is_empty())
                .unwrap_or(DEFAULT_LISTEN_ADDR),
        )?;

        let metrics_path = raw
            .metrics_path
            .filter(|path| !path.is_empty())
            .unwrap_or_else(|| DEFAULT_METRICS_PATH.to_string());
        if !is_valid_metrics_path(&metrics_path) {
            return Err(ConfigError::InvalidMetricsPath(metrics_path));
        }

        let targets = expand_targets(&raw.items, raw.interfaces.as_ref())?;

        Ok(Self {
            connection_timeout,
            resolution_timeout,
            log,
            listen_addr,
            metrics_path,
            targets,
        })
    }
}

/// A literal route: absolute, not the root, and free of the `:param`,
/// `*wildcard` and `{capture}` syntax the router would interpret.
fn is_valid_metrics_path(path: &str) -> bool {
    let Some(rest) = path.strip_prefix('/') else {
        return false;
    };
    !rest.is_empty()
        && !path.contains(['{', '}'])
        && rest
            .split('/')
            .all(|segment| !segment.starts_with([':', '*']))
}

/// `:9407` binds every IPv4 interface, as `0.0.0.0:9407`.
fn normalize_listen_addr(addr: &str) -> Result<String, ConfigError> {
    let normalized = if addr.starts_with(':') {
        format!("0.0.0.0{addr}")
    } else {
        addr.to_string()
    };

    let (_, port) = split_host_port(&normalized)
        .map_err(|_| ConfigError::InvalidListenAddress(addr.to_string()))?;
    port.parse::<u16>()
        .map_err(|_| ConfigError::InvalidListenAddress(addr.to_string()))?;

    Ok(normalized)
}
