use std::path::PathBuf;

use thiserror::Error;

use crate::network::target::AddressError;

/// Fatal configuration problems. Any of these aborts startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the YAML configuration.
    #[error("failed to parse YAML config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Nothing to probe after loading and expansion.
    #[error("empty items list")]
    EmptyTargets,

    #[error("invalid resource '{resource}': {reason}")]
    InvalidTarget {
        resource: String,
        #[source]
        reason: AddressError,
    },

    #[error("interface '{iface}' references unknown group '{group}'")]
    UnknownGroup { iface: String, group: String },

    #[error("invalid log level '{0}'")]
    InvalidLogLevel(String),

    #[error("invalid log format '{0}', expected pretty or json")]
    InvalidLogFormat(String),

    #[error("invalid listen address '{0}', expected [host]:port")]
    InvalidListenAddress(String),

    #[error("invalid metrics path '{0}', must start with '/' and differ from '/'")]
    InvalidMetricsPath(String),
}
