mod commands;
mod server;
mod terminal;

use commands::CommandLine;
use netaccess_common::config::{Config, RawConfig};
use terminal::logging;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    let raw = RawConfig::load(&commands.overrides())?;
    logging::init(&raw.log_settings()?)?;
    info!(version = env!("CARGO_PKG_VERSION"), "Starting network-access-exporter");

    let cfg = Config::assemble(raw)?;
    info!(
        targets = cfg.targets.len(),
        timeout_ms = cfg.connection_timeout.as_millis() as u64,
        "Configuration loaded"
    );

    server::serve(&cfg).await
}
