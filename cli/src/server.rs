//! HTTP surface: a landing page and the scrape endpoint.
//!
//! Every request to the metrics path runs one full collection pass; nothing is
//! precomputed between scrapes.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use axum::extract::State;
use axum::http::header;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use netaccess_common::config::Config;
use netaccess_core::collector::Collector;
use netaccess_core::metrics;
use netaccess_core::resolver::Resolve;
use tokio::net::TcpListener;
use tracing::{error, info};

struct ServerState<R> {
    collector: Collector<R>,
    landing: Arc<str>,
}

impl<R> Clone for ServerState<R> {
    fn clone(&self) -> Self {
        Self {
            collector: self.collector.clone(),
            landing: Arc::clone(&self.landing),
        }
    }
}

pub fn router<R: Resolve + 'static>(collector: Collector<R>, metrics_path: &str) -> Router {
    let state = ServerState {
        collector,
        landing: landing_page(metrics_path).into(),
    };

    Router::new()
        .route("/", get(landing::<R>))
        .route(metrics_path, get(scrape::<R>))
        .with_state(state)
}

async fn landing<R: Resolve + 'static>(State(state): State<ServerState<R>>) -> Html<String> {
    Html(state.landing.to_string())
}

async fn scrape<R: Resolve + 'static>(State(state): State<ServerState<R>>) -> impl IntoResponse {
    let mut samples = state.collector.collect().await;
    samples.push(metrics::build_info());

    (
        [(header::CONTENT_TYPE, metrics::CONTENT_TYPE)],
        metrics::render(&samples),
    )
}

fn landing_page(metrics_path: &str) -> String {
    format!(
        "<html>\n\
         <head><title>Network Access Exporter</title></head>\n\
         <body>\n\
         <h1>Network Access Exporter</h1>\n\
         <p>Version {}</p>\n\
         <p><a href=\"{metrics_path}\">Metrics</a></p>\n\
         </body>\n\
         </html>\n",
        env!("CARGO_PKG_VERSION"),
    )
}

/// Binds the configured address and serves until Ctrl-C.
pub async fn serve(config: &Config) -> anyhow::Result<()> {
    let app = router(Collector::from_config(config), &config.metrics_path);

    let listener = TcpListener::bind(config.listen_addr.as_str())
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    info!(
        addr = %listener.local_addr()?,
        path = %config.metrics_path,
        targets = config.targets.len(),
        "Listening for scrapes"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Exporter stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Cannot listen for Ctrl-C, running until killed");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
