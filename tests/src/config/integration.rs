#![cfg(test)]
use netaccess_common::config::{Config, ConfigError, Overrides, RawConfig};
use netaccess_common::network::target::Network;
use std::path::PathBuf;
use std::time::Duration;

/// Writes `contents` to a file unique to this test process.
fn config_file(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "netaccess-{}-{name}.yaml",
        std::process::id()
    ));
    std::fs::write(&path, contents).unwrap();
    path
}

fn load(overrides: Overrides) -> Result<Config, ConfigError> {
    Config::assemble(RawConfig::load(&overrides)?)
}

#[test]
fn empty_target_list_fails_descriptively() {
    let err = load(Overrides::default()).unwrap_err();
    assert!(matches!(err, ConfigError::EmptyTargets));
    assert_eq!(err.to_string(), "empty items list");

    let err = load(Overrides {
        resources: Some(" , ,".to_string()),
        ..Overrides::default()
    })
    .unwrap_err();
    assert!(matches!(err, ConfigError::EmptyTargets));
}

#[test]
fn file_and_flags_are_layered() {
    let path = config_file(
        "layered",
        r#"
connectionTimeout: 2s
logLevel: warning
listenAddr: "127.0.0.1:9999"
items:
  backend:
    - db.internal:5432
    - resource: tcp4://cache.internal:6379
      alias: cache
  frontend:
    - www.example.com:443
"#,
    );

    let config = load(Overrides {
        config_file: Some(path.clone()),
        connection_timeout: Some(Duration::from_millis(250)),
        resources: Some("extra.example:22".to_string()),
        ..Overrides::default()
    })
    .unwrap();
    std::fs::remove_file(path).unwrap();

    assert_eq!(config.connection_timeout, Duration::from_millis(250));
    assert_eq!(config.listen_addr, "127.0.0.1:9999");
    assert_eq!(config.metrics_path, "/metrics");

    let identities: Vec<(&str, &str, &str)> = config
        .targets
        .iter()
        .map(|t| (t.resource(), t.alias(), t.group()))
        .collect();
    assert_eq!(
        identities,
        vec![
            ("db.internal:5432", "db.internal:5432", "backend"),
            ("tcp4://cache.internal:6379", "cache", "backend"),
            ("www.example.com:443", "www.example.com:443", "frontend"),
            ("extra.example:22", "extra.example:22", "all"),
        ]
    );
    assert_eq!(config.targets[1].network(), Network::Tcp4);
}

#[test]
fn interface_mode_expands_per_interface() {
    let path = config_file(
        "interfaces",
        r#"
items:
  web:
    - a.example:80
  db:
    - b.example:5432
  unused:
    - c.example:1
interfaces:
  eth0: [web, db]
  eth1: [web]
"#,
    );

    let config = load(Overrides {
        config_file: Some(path.clone()),
        ..Overrides::default()
    })
    .unwrap();
    std::fs::remove_file(path).unwrap();

    let bound: Vec<(&str, Option<&str>)> = config
        .targets
        .iter()
        .map(|t| (t.resource(), t.iface()))
        .collect();
    assert_eq!(
        bound,
        vec![
            ("a.example:80", Some("eth0")),
            ("a.example:80", Some("eth1")),
            ("b.example:5432", Some("eth0")),
        ]
    );
}

#[test]
fn malformed_resource_rejects_the_configuration() {
    let err = load(Overrides {
        resources: Some("good.example:80,bad.example:http".to_string()),
        ..Overrides::default()
    })
    .unwrap_err();

    assert!(err.to_string().contains("bad.example:http"), "{err}");
}

#[test]
fn unreadable_and_unparseable_files_fail() {
    let err = load(Overrides {
        config_file: Some(PathBuf::from("/nonexistent/netaccess.yaml")),
        ..Overrides::default()
    })
    .unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));

    let path = config_file("broken", "items: [unclosed\n");
    let err = load(Overrides {
        config_file: Some(path.clone()),
        ..Overrides::default()
    })
    .unwrap_err();
    std::fs::remove_file(path).unwrap();
    assert!(matches!(err, ConfigError::Parse(_)));
}
