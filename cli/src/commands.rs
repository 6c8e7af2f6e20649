use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use netaccess_common::config::Overrides;

/// Every flag is optional; unset flags leave the configuration file value or
/// the built-in default in place.
#[derive(Parser, Debug)]
#[command(name = "network-access-exporter")]
#[command(version, about = "Reports TCP reachability of configured resources as Prometheus metrics.")]
pub struct CommandLine {
    /// YAML configuration file
    #[arg(long = "config-file", env = "NETWORK_ACCESS_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    /// TCP connection timeout, e.g. 500ms
    #[arg(long, env = "NETWORK_ACCESS_TIMEOUT", value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,

    /// DNS resolution timeout; unbounded when unset
    #[arg(
        long = "resolution-timeout",
        env = "NETWORK_ACCESS_RESOLUTION_TIMEOUT",
        value_parser = humantime::parse_duration
    )]
    pub resolution_timeout: Option<Duration>,

    /// trace, debug, info, warn, error
    #[arg(long = "log-level", env = "NETWORK_ACCESS_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// pretty or json
    #[arg(long = "log-format", env = "NETWORK_ACCESS_LOG_FORMAT")]
    pub log_format: Option<String>,

    /// Address to serve metrics on
    #[arg(long = "web.listen-address", env = "NETWORK_ACCESS_LISTEN_ADDRESS")]
    pub listen_address: Option<String>,

    /// Path under which metrics are exposed
    #[arg(long = "web.telemetry-path", env = "NETWORK_ACCESS_TELEMETRY_PATH")]
    pub telemetry_path: Option<String>,

    /// Comma separated host:port list, probed in group "all"
    #[arg(long, env = "NETWORK_ACCESS_RESOURCES")]
    pub resources: Option<String>,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn overrides(&self) -> Overrides {
        Overrides {
            config_file: self.config_file.clone(),
            connection_timeout: self.timeout,
            resolution_timeout: self.resolution_timeout,
            log_level: self.log_level.clone(),
            log_format: self.log_format.clone(),
            listen_addr: self.listen_address.clone(),
            metrics_path: self.telemetry_path.clone(),
            resources: self.resources.clone(),
        }
    }
}
