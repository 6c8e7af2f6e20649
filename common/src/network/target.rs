//! # Probe Target Model
//!
//! Defines the unit the exporter probes on every scrape.
//!
//! A configured resource is a string of the form `[scheme://]host:port`:
//! * **Scheme**: optional, one of `tcp`, `tcp4` or `tcp6` (defaults to `tcp`).
//! * **Host**: a DNS name, an IPv4 literal or a bracketed IPv6 literal (`[::1]`).
//! * **Port**: a base-10 integer in `[0, 65535]`.
//!
//! Parsing happens once, when the configuration is loaded. A [`Target`] never
//! changes afterwards, which lets concurrent scrapes share the list freely.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use thiserror::Error;

use crate::config::ConfigError;

/// Group assigned to resources that were not configured under a named section.
pub const DEFAULT_GROUP: &str = "all";

const SCHEME_SEPARATOR: &str = "://";

/// Reasons a resource string cannot be turned into a [`Target`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("missing port in address")]
    MissingPort,
    #[error("missing host in address")]
    MissingHost,
    #[error("too many colons in address (IPv6 literals must be enclosed in brackets)")]
    TooManyColons,
    #[error("missing ']' in address")]
    UnclosedBracket,
    #[error("unexpected bracket in address")]
    UnexpectedBracket,
    #[error("port '{0}' is not a base-10 integer")]
    InvalidPort(String),
    #[error("port {0} is out of range [0, 65535]")]
    PortOutOfRange(String),
    #[error("unsupported network '{0}', expected tcp, tcp4 or tcp6")]
    UnsupportedNetwork(String),
}

/// Logical network a target is dialed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Network {
    /// Any address family.
    #[default]
    Tcp,
    /// IPv4 addresses only.
    Tcp4,
    /// IPv6 addresses only.
    Tcp6,
}

impl Network {
    pub fn as_str(self) -> &'static str {
        match self {
            Network::Tcp => "tcp",
            Network::Tcp4 => "tcp4",
            Network::Tcp6 => "tcp6",
        }
    }

    /// Whether a resolved address may be dialed on this network.
    pub fn accepts(self, ip: &IpAddr) -> bool {
        match self {
            Network::Tcp => true,
            Network::Tcp4 => ip.is_ipv4(),
            Network::Tcp6 => ip.is_ipv6(),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(Network::Tcp),
            "tcp4" => Ok(Network::Tcp4),
            "tcp6" => Ok(Network::Tcp6),
            _ => Err(AddressError::UnsupportedNetwork(s.to_string())),
        }
    }
}

/// One configured endpoint, probed on every scrape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    resource: String,
    network: Network,
    host: String,
    port: u16,
    alias: String,
    group: String,
    iface: Option<String>,
}

impl Target {
    /// Parses a raw resource string.
    ///
    /// The alias defaults to the resource itself and the group to [`DEFAULT_GROUP`].
    pub fn parse(resource: &str) -> Result<Self, ConfigError> {
        Self::try_parse(resource).map_err(|reason| ConfigError::InvalidTarget {
            resource: resource.to_string(),
            reason,
        })
    }

    fn try_parse(resource: &str) -> Result<Self, AddressError> {
        let (network, address) = split_scheme(resource)?;
        let (host, port) = split_host_port(address)?;
        let port = parse_port(port)?;

        Ok(Self {
            resource: resource.to_string(),
            network,
            host: host.to_string(),
            port,
            alias: resource.to_string(),
            group: DEFAULT_GROUP.to_string(),
            iface: None,
        })
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    /// Binds outbound probes for this target to a local interface.
    pub fn with_iface(mut self, iface: impl Into<String>) -> Self {
        self.iface = Some(iface.into());
        self
    }

    /// Overrides the network taken from the scheme prefix.
    pub fn with_network(mut self, network: Network) -> Self {
        self.network = network;
        self
    }

    /// The resource exactly as configured; used as the metric identity.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn iface(&self) -> Option<&str> {
        self.iface.as_deref()
    }
}

impl FromStr for Target {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Target::parse(s)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.iface {
            Some(iface) => write!(f, "{} via {}", self.resource, iface),
            None => f.write_str(&self.resource),
        }
    }
}

/// Separates an optional `scheme://` prefix from the address.
///
/// A prefix that is not a syntactically valid URI scheme (e.g. empty) is
/// stripped and the network falls back to `tcp`.
fn split_scheme(s: &str) -> Result<(Network, &str), AddressError> {
    let Some((scheme, address)) = s.split_once(SCHEME_SEPARATOR) else {
        return Ok((Network::Tcp, s));
    };

    if !is_uri_scheme(scheme) {
        return Ok((Network::Tcp, address));
    }

    Ok((scheme.parse()?, address))
}

fn is_uri_scheme(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Splits `host:port` or `[host]:port` into its two components.
///
/// Both components must be non-empty. Unbracketed hosts may not contain a
/// colon, so `::1:80` is rejected instead of being guessed at.
pub fn split_host_port(address: &str) -> Result<(&str, &str), AddressError> {
    let (host, port) = if let Some(rest) = address.strip_prefix('[') {
        let Some((host, after)) = rest.split_once(']') else {
            return Err(AddressError::UnclosedBracket);
        };
        let Some(port) = after.strip_prefix(':') else {
            return Err(if after.is_empty() {
                AddressError::MissingPort
            } else {
                AddressError::UnexpectedBracket
            });
        };
        if host.contains('[') || port.contains(['[', ']']) {
            return Err(AddressError::UnexpectedBracket);
        }
        (host, port)
    } else {
        let Some((host, port)) = address.rsplit_once(':') else {
            return Err(AddressError::MissingPort);
        };
        if host.contains(':') {
            return Err(AddressError::TooManyColons);
        }
        if address.contains(['[', ']']) {
            return Err(AddressError::UnexpectedBracket);
        }
        (host, port)
    };

    if host.is_empty() {
        return Err(AddressError::MissingHost);
    }
    if port.is_empty() {
        return Err(AddressError::MissingPort);
    }

    Ok((host, port))
}

fn parse_port(s: &str) -> Result<u16, AddressError> {
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AddressError::InvalidPort(s.to_string()));
    }
    s.parse::<u16>()
        .map_err(|_| AddressError::PortOutOfRange(s.to_string()))
}

/// Textual IPv6 check: the string is an IP literal and contains a colon.
///
/// Kept for labelling addresses that only exist as strings; resolved
/// addresses should be classified with [`IpAddr::is_ipv6`].
pub fn is_ipv6(s: &str) -> bool {
    s.parse::<IpAddr>().is_ok() && s.contains(':')
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
