#![cfg(test)]
use netaccess_common::config::{Config, Overrides, RawConfig};
use netaccess_core::collector::Collector;
use netaccess_core::metrics::{self, Family, Sample};
use netaccess_core::network::tcp;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;
use tokio::net::TcpListener;

fn collector_for(resources: &str) -> anyhow::Result<Collector> {
    let overrides = Overrides {
        resources: Some(resources.to_string()),
        connection_timeout: Some(Duration::from_millis(500)),
        ..Overrides::default()
    };
    let config = Config::assemble(RawConfig::load(&overrides)?)?;
    Ok(Collector::from_config(&config))
}

fn of_family(samples: &[Sample], family: Family) -> Vec<&Sample> {
    samples.iter().filter(|s| s.family == family).collect()
}

/// An unresolvable host yields exactly one lookup_error sample and is never dialed.
#[tokio::test]
async fn unresolvable_host_reports_lookup_error() -> anyhow::Result<()> {
    let samples = collector_for("example.invalid:9999")?.collect().await;

    let errors = of_family(&samples, Family::LookupError);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].label("resource"), Some("example.invalid:9999"));
    assert_eq!(errors[0].value, 1.0);
    assert!(of_family(&samples, Family::Allowed).is_empty());
    assert!(of_family(&samples, Family::DialDuration).is_empty());

    let output = metrics::render(&samples);
    assert!(output.contains("network_access_lookup_error{resource=\"example.invalid:9999\""));
    Ok(())
}

#[tokio::test]
async fn closed_port_reports_not_allowed() -> anyhow::Result<()> {
    let samples = collector_for("127.0.0.1:1")?.collect().await;

    let allowed = of_family(&samples, Family::Allowed);
    assert_eq!(allowed.len(), 1);
    assert_eq!(allowed[0].label("resource"), Some("127.0.0.1:1"));
    assert_eq!(allowed[0].label("ip"), Some("127.0.0.1"));
    assert_eq!(allowed[0].label("ipv6"), Some("0"));
    assert_eq!(allowed[0].value, 0.0);
    assert!(of_family(&samples, Family::DialDuration).is_empty());
    assert_eq!(of_family(&samples, Family::LookupDuration).len(), 1);
    Ok(())
}

#[tokio::test]
async fn listening_port_reports_allowed_and_dial_duration() -> anyhow::Result<()> {
    let _listener = TcpListener::bind("127.0.0.1:34567").await?;
    let samples = collector_for("127.0.0.1:34567")?.collect().await;

    let allowed = of_family(&samples, Family::Allowed);
    assert_eq!(allowed.len(), 1);
    assert_eq!(allowed[0].value, 1.0);

    let dials = of_family(&samples, Family::DialDuration);
    assert_eq!(dials.len(), 1);
    assert_eq!(dials[0].label("ip"), Some("127.0.0.1"));
    assert!(dials[0].value >= 0.0 && dials[0].value < 0.5);

    let output = metrics::render(&samples);
    assert!(output.contains(
        "network_access_allowed{resource=\"127.0.0.1:34567\",alias=\"127.0.0.1:34567\",group=\"all\",iface=\"\",ip=\"127.0.0.1\",ipv6=\"0\"} 1\n"
    ));
    Ok(())
}

/// One broken target never hides the others; order follows configuration.
#[tokio::test]
async fn failing_target_does_not_abort_the_pass() -> anyhow::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();

    let collector = collector_for(&format!("example.invalid:80,127.0.0.1:{port},[::1]:{port}"))?;
    let reports = collector.probe_all().await;

    let resources: Vec<&str> = reports.iter().map(|r| r.target().resource()).collect();
    assert_eq!(
        resources,
        ["example.invalid:80".to_string(), format!("127.0.0.1:{port}"), format!("[::1]:{port}")]
    );

    let samples = collector.collect().await;
    let allowed = of_family(&samples, Family::Allowed);
    assert_eq!(allowed.len(), 2);
    assert_eq!(allowed[0].value, 1.0);
    assert_eq!(allowed[1].label("ipv6"), Some("1"));
    Ok(())
}

#[tokio::test]
async fn dial_rejects_out_of_range_ports_immediately() {
    let ip = IpAddr::V4(Ipv4Addr::LOCALHOST);
    let limit = Duration::from_secs(5);

    assert!(!tcp::is_tcp_port_available(ip, -1, limit).await);
    assert!(!tcp::is_tcp_port_available(ip, 70_000, limit).await);

    let outcome = tcp::dial(ip, 70_000, limit, None).await;
    assert!(outcome.elapsed < Duration::from_millis(100));
}
