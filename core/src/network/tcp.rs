use std::io;
use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

use netaccess_common::network::interface::local_address_for;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpSocket;
use tokio::time::timeout;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialOutcome {
    /// Connection established and closed cleanly.
    pub available: bool,
    /// Time spent in `connect`, zero when no connection was attempted.
    pub elapsed: Duration,
}

impl DialOutcome {
    fn not_attempted() -> Self {
        Self {
            available: false,
            elapsed: Duration::ZERO,
        }
    }
}

/// Opens and closes one TCP connection to `ip:port`.
///
/// A port outside `[0, 65535]` is unavailable without touching the network.
/// With `iface` set, the socket is bound to that interface's address first.
pub async fn dial(ip: IpAddr, port: i32, limit: Duration, iface: Option<&str>) -> DialOutcome {
    let Ok(port) = u16::try_from(port) else {
        debug!(%ip, port, "Port out of range, not dialing");
        return DialOutcome::not_attempted();
    };
    let remote = SocketAddr::new(ip, port);

    let socket = match prepare_socket(remote, iface) {
        Ok(socket) => socket,
        Err(e) => {
            debug!(%remote, iface, error = %e, "Cannot prepare socket");
            return DialOutcome::not_attempted();
        }
    };

    let start = Instant::now();
    let connected = timeout(limit, socket.connect(remote)).await;
    let elapsed = start.elapsed();

    let available = match connected {
        Ok(Ok(mut stream)) => match stream.shutdown().await {
            Ok(()) => true,
            Err(e) => {
                debug!(%remote, error = %e, "Connection did not close cleanly");
                false
            }
        },
        Ok(Err(e)) => {
            debug!(%remote, iface, error = %e, "Connection failed");
            false
        }
        Err(_elapsed) => {
            debug!(%remote, iface, timeout_ms = limit.as_millis() as u64, "Connection timed out");
            false
        }
    };

    DialOutcome { available, elapsed }
}

fn prepare_socket(remote: SocketAddr, iface: Option<&str>) -> io::Result<TcpSocket> {
    let socket = match remote {
        SocketAddr::V4(_) => TcpSocket::new_v4()?,
        SocketAddr::V6(_) => TcpSocket::new_v6()?,
    };

    if let Some(iface) = iface {
        let local = local_address_for(iface, remote.ip())
            .map_err(|e| io::Error::new(io::ErrorKind::AddrNotAvailable, e))?;
        socket.bind(local)?;
    }

    Ok(socket)
}

pub async fn is_tcp_port_available(ip: IpAddr, port: i32, limit: Duration) -> bool {
    dial(ip, port, limit, None).await.available
}

/// Like [`is_tcp_port_available`], with the connection leaving through `iface`.
pub async fn is_tcp_port_available_iface(
    iface: &str,
    ip: IpAddr,
    port: i32,
    limit: Duration,
) -> bool {
    dial(ip, port, limit, Some(iface)).await.available
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use tokio::net::TcpListener;

    const LOOPBACK: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
    const LIMIT: Duration = Duration::from_millis(500);

    async fn closed_port() -> u16 {
        let listener = TcpListener::bind((LOOPBACK, 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        port
    }

    #[tokio::test]
    async fn out_of_range_port_should_be_unavailable() {
        assert!(!is_tcp_port_available(LOOPBACK, -1, LIMIT).await);
        assert!(!is_tcp_port_available(LOOPBACK, 70_000, LIMIT).await);
        assert!(!is_tcp_port_available(LOOPBACK, 65_536, LIMIT).await);
    }

    #[tokio::test]
    async fn listening_port_should_be_available() {
        let listener = TcpListener::bind((LOOPBACK, 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let outcome = dial(LOOPBACK, i32::from(port), LIMIT, None).await;
        assert!(outcome.available);
        assert!(outcome.elapsed < LIMIT);
    }

    #[tokio::test]
    async fn closed_port_should_be_unavailable() {
        let port = closed_port().await;
        assert!(!is_tcp_port_available(LOOPBACK, i32::from(port), LIMIT).await);
    }

    #[tokio::test]
    async fn unknown_interface_should_be_unavailable() {
        let listener = TcpListener::bind((LOOPBACK, 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let outcome = dial(LOOPBACK, i32::from(port), LIMIT, Some("does-not-exist0")).await;
        assert!(!outcome.available);
        assert_eq!(outcome.elapsed, Duration::ZERO);
    }

    #[tokio::test]
    async fn out_of_range_port_should_not_be_timed() {
        let outcome = dial(LOOPBACK, 70_000, LIMIT, None).await;
        assert_eq!(outcome, DialOutcome { available: false, elapsed: Duration::ZERO });
    }

    #[tokio::test]
    async fn loopback_interface_should_reach_listening_port() {
        let Some(loopback) = loopback_interface_name() else {
            eprintln!("Skipping: no IPv4 loopback interface visible");
            return;
        };
        let listener = TcpListener::bind((LOOPBACK, 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();

        assert!(is_tcp_port_available_iface(&loopback, LOOPBACK, i32::from(port), LIMIT).await);
    }

    fn loopback_interface_name() -> Option<String> {
        pnet::datalink::interfaces()
            .into_iter()
            .find(|interface| {
                interface.is_loopback() && interface.ips.iter().any(|net| net.is_ipv4())
            })
            .map(|interface| interface.name)
    }
}
