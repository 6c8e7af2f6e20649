//! Host resolution for probe targets.
//!
//! Every scrape resolves again; nothing is cached, so DNS changes show up on
//! the next scrape.

use std::io;
use std::net::IpAddr;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use netaccess_common::network::target::{Network, Target};
use thiserror::Error;
use tokio::time::timeout;

/// Resolution failure for one target during one scrape.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("cannot resolve {resource}: {source}")]
    Failed {
        resource: String,
        #[source]
        source: io::Error,
    },
    #[error("cannot resolve {resource}: timed out after {}ms", .timeout.as_millis())]
    TimedOut { resource: String, timeout: Duration },
    #[error("cannot resolve {resource}: no addresses usable on {network}")]
    NoAddresses { resource: String, network: Network },
}

impl LookupError {
    /// The configured resource the lookup was made for.
    pub fn resource(&self) -> &str {
        match self {
            LookupError::Failed { resource, .. }
            | LookupError::TimedOut { resource, .. }
            | LookupError::NoAddresses { resource, .. } => resource,
        }
    }
}

/// Source of host to address lookups.
#[async_trait]
pub trait Resolve: Send + Sync {
    /// All addresses `host` resolves to, in resolver order.
    async fn lookup_ip(&self, host: &str) -> io::Result<Vec<IpAddr>>;
}

/// Resolves through the operating system (`getaddrinfo`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

#[async_trait]
impl Resolve for SystemResolver {
    async fn lookup_ip(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        let mut ips: Vec<IpAddr> = Vec::new();
        for addr in tokio::net::lookup_host((host, 0)).await? {
            if !ips.contains(&addr.ip()) {
                ips.push(addr.ip());
            }
        }
        Ok(ips)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Addresses usable on the target's network, in resolver order.
    pub addresses: Vec<IpAddr>,
    /// Wall-clock time of the lookup.
    pub elapsed: Duration,
}

/// Resolves the host of `target`, bounded by `limit` when set.
pub async fn resolve<R: Resolve + ?Sized>(
    resolver: &R,
    target: &Target,
    limit: Option<Duration>,
) -> Result<Resolution, LookupError> {
    let start = Instant::now();
    let lookup = resolver.lookup_ip(target.host());
    let result = match limit {
        Some(limit) => timeout(limit, lookup)
            .await
            .map_err(|_elapsed| LookupError::TimedOut {
                resource: target.resource().to_string(),
                timeout: limit,
            })?,
        None => lookup.await,
    };
    let elapsed = start.elapsed();

    let addresses: Vec<IpAddr> = result
        .map_err(|source| LookupError::Failed {
            resource: target.resource().to_string(),
            source,
        })?
        .into_iter()
        .filter(|ip| target.network().accepts(ip))
        .collect();

    if addresses.is_empty() {
        return Err(LookupError::NoAddresses {
            resource: target.resource().to_string(),
            network: target.network(),
        });
    }

    Ok(Resolution { addresses, elapsed })
}
