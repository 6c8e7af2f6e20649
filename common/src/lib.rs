//! Shared building blocks for the network access exporter.
//!
//! * [`network`]: the probe target model and local interface lookups.
//! * [`config`]: loading, validating and expanding the exporter configuration.
//! * [`utils`]: small extension traits over third-party types.

pub mod config;
pub mod network;
pub mod utils;
