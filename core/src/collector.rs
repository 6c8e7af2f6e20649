//! One collection pass over every configured target.
//!
//! A pass runs the targets strictly in configuration order and the addresses
//! of a target in resolver order, so two scrapes of an unchanged network emit
//! samples in the same order. A failing target never stops the pass.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use netaccess_common::config::Config;
use netaccess_common::network::target::Target;
use tracing::{debug, error, warn};

use crate::metrics::{self, Sample};
use crate::network::tcp;
use crate::resolver::{self, LookupError, Resolve, SystemResolver};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeSettings {
    pub dial_timeout: Duration,
    /// `None` leaves lookups unbounded.
    pub resolution_timeout: Option<Duration>,
}

impl ProbeSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            dial_timeout: config.connection_timeout,
            resolution_timeout: config.resolution_timeout,
        }
    }
}

/// Result of dialing one resolved address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeResult {
    pub ip: IpAddr,
    pub ipv6: bool,
    pub available: bool,
    /// Only set when the dial succeeded.
    pub dial_duration: Option<Duration>,
}

/// Everything one pass learned about one target.
#[derive(Debug)]
pub enum TargetReport<'a> {
    LookupFailed {
        target: &'a Target,
        error: LookupError,
    },
    Probed {
        target: &'a Target,
        lookup_duration: Duration,
        results: Vec<ProbeResult>,
    },
}

impl<'a> TargetReport<'a> {
    pub fn target(&self) -> &'a Target {
        match self {
            TargetReport::LookupFailed { target, .. } | TargetReport::Probed { target, .. } => {
                target
            }
        }
    }
}

/// Probes the shared, read-only target list on demand.
///
/// Cloning is cheap; clones share the target list and the resolver.
#[derive(Debug)]
pub struct Collector<R = SystemResolver> {
    targets: Arc<[Target]>,
    settings: ProbeSettings,
    resolver: Arc<R>,
}

impl<R> Clone for Collector<R> {
    fn clone(&self) -> Self {
        Self {
            targets: Arc::clone(&self.targets),
            settings: self.settings,
            resolver: Arc::clone(&self.resolver),
        }
    }
}

impl Collector<SystemResolver> {
    pub fn new(targets: Vec<Target>, settings: ProbeSettings) -> Self {
        Self::with_resolver(targets, settings, SystemResolver)
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.targets.clone(), ProbeSettings::from_config(config))
    }
}

impl<R: Resolve> Collector<R> {
    pub fn with_resolver(targets: Vec<Target>, settings: ProbeSettings, resolver: R) -> Self {
        Self {
            targets: targets.into(),
            settings,
            resolver: Arc::new(resolver),
        }
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn settings(&self) -> ProbeSettings {
        self.settings
    }

    /// Probes every target once.
    pub async fn probe_all(&self) -> Vec<TargetReport<'_>> {
        let mut reports = Vec::with_capacity(self.targets.len());
        for target in self.targets.iter() {
            reports.push(self.probe_target(target).await);
        }
        reports
    }

    pub async fn probe_target<'t>(&self, target: &'t Target) -> TargetReport<'t> {
        let resolution =
            match resolver::resolve(self.resolver.as_ref(), target, self.settings.resolution_timeout)
                .await
            {
                Ok(resolution) => resolution,
                Err(e) => {
                    error!(resource = target.resource(), error = %e, "Cant get IP address");
                    return TargetReport::LookupFailed { target, error: e };
                }
            };

        let mut results = Vec::with_capacity(resolution.addresses.len());
        for ip in resolution.addresses {
            debug!(
                resource = target.resource(),
                %ip,
                port = target.port(),
                iface = target.iface(),
                "Checking TCP port"
            );

            let outcome = tcp::dial(
                ip,
                i32::from(target.port()),
                self.settings.dial_timeout,
                target.iface(),
            )
            .await;

            if !outcome.available {
                warn!(
                    resource = target.resource(),
                    %ip,
                    port = target.port(),
                    iface = target.iface(),
                    "TCP port not available"
                );
            }

            results.push(ProbeResult {
                ip,
                ipv6: ip.is_ipv6(),
                available: outcome.available,
                dial_duration: outcome.available.then_some(outcome.elapsed),
            });
        }

        TargetReport::Probed {
            target,
            lookup_duration: resolution.elapsed,
            results,
        }
    }

    /// Runs one pass and flattens it into metric samples.
    pub async fn collect(&self) -> Vec<Sample> {
        self.probe_all()
            .await
            .iter()
            .flat_map(metrics::samples_for)
            .collect()
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
