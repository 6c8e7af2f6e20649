use std::net::{IpAddr, SocketAddr, SocketAddrV6};

use pnet::datalink::NetworkInterface;
use pnet::ipnetwork::{IpNetwork, Ipv4Network, Ipv6Network};

pub trait NetworkInterfaceExtension {
    fn get_ipv4_nets(&self) -> Vec<Ipv4Network>;
    fn get_ipv6_nets(&self) -> Vec<Ipv6Network>;
    /// Local endpoint (port 0) of this interface to bind when dialing `remote`.
    ///
    /// Takes the first address of the same family. For IPv6 an address whose
    /// link-local scope matches `remote` wins, and a link-local pick carries
    /// this interface's index as scope id.
    fn bind_address_like(&self, remote: &IpAddr) -> Option<SocketAddr>;
}

impl NetworkInterfaceExtension for NetworkInterface {
    fn get_ipv4_nets(&self) -> Vec<Ipv4Network> {
        self.ips
            .iter()
            .filter_map(|ip| {
                if let IpNetwork::V4(ipv4) = ip {
                    Some(*ipv4)
                } else {
                    None
                }
            })
            .collect()
    }

    fn get_ipv6_nets(&self) -> Vec<Ipv6Network> {
        self.ips
            .iter()
            .filter_map(|ip| {
                if let IpNetwork::V6(ipv6) = ip {
                    Some(*ipv6)
                } else {
                    None
                }
            })
            .collect()
    }

    fn bind_address_like(&self, remote: &IpAddr) -> Option<SocketAddr> {
        match remote {
            IpAddr::V4(_) => self
                .get_ipv4_nets()
                .first()
                .map(|net| SocketAddr::new(IpAddr::V4(net.ip()), 0)),
            IpAddr::V6(remote) => {
                let nets = self.get_ipv6_nets();
                let wants_link_local = remote.is_unicast_link_local();
                let net = nets
                    .iter()
                    .find(|net| net.ip().is_unicast_link_local() == wants_link_local)
                    .or_else(|| nets.first())?;

                let scope_id = if net.ip().is_unicast_link_local() {
                    self.index
                } else {
                    0
                };
                Some(SocketAddr::V6(SocketAddrV6::new(net.ip(), 0, 0, scope_id)))
            }
        }
    }
}
