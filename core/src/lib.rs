//! The probe engine.
//!
//! ```text
//! Collector::collect()           one pass per scrape
//!   └── for each Target
//!         ├── resolver::resolve()       DNS, optionally bounded
//!         └── for each address
//!               └── network::tcp::dial() connect + close, bounded
//!
//! metrics::render()              Prometheus text exposition
//! ```
//!
//! Nothing here keeps state between scrapes.

pub mod collector;
pub mod metrics;
pub mod network;
pub mod resolver;

pub use collector::{Collector, ProbeSettings};
pub use resolver::{LookupError, Resolve, SystemResolver};
