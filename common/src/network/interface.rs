//! Local address selection for interface-bound probes.
//!
//! Interfaces are usually dual-stack and the order of their addresses is up to
//! the OS, so the source address is picked by family rather than by position.

use std::net::{IpAddr, SocketAddr};

use pnet::datalink::{self, NetworkInterface};
use thiserror::Error;

use crate::utils::interface::NetworkInterfaceExtension;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterfaceError {
    #[error("network interface '{0}' not found")]
    NotFound(String),
    #[error("network interface '{name}' has no {family} address")]
    NoAddress { name: String, family: &'static str },
}

/// Returns the local endpoint of interface `name` to bind when dialing `remote`.
///
/// The port is always 0. Link-local IPv6 endpoints carry the interface index
/// as scope id, without which the kernel refuses the bind.
pub fn local_address_for(name: &str, remote: IpAddr) -> Result<SocketAddr, InterfaceError> {
    let interfaces: Vec<NetworkInterface> = datalink::interfaces();
    select_local_address(&interfaces, name, remote)
}

fn select_local_address(
    interfaces: &[NetworkInterface],
    name: &str,
    remote: IpAddr,
) -> Result<SocketAddr, InterfaceError> {
    let interface = interfaces
        .iter()
        .find(|interface| interface.name == name)
        .ok_or_else(|| InterfaceError::NotFound(name.to_string()))?;

    interface
        .bind_address_like(&remote)
        .ok_or_else(|| InterfaceError::NoAddress {
            name: name.to_string(),
            family: if remote.is_ipv4() { "IPv4" } else { "IPv6" },
        })
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
