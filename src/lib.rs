//! WireGuard Prometheus exporter
//!
//! Periodically reads WireGuard device state, publishes per-peer statistics
//! (handshake recency, transfer counters, endpoint metadata) as Prometheus
//! metrics, and serves them over HTTP.
//!
//! # Architecture
//!
//! - [`wg`] — device access: the [`wg::DeviceSource`] seam, the `wg(8)`
//!   command adapter and the dump-format parsers
//! - [`metrics`] — the process-wide [`metrics::PeerMetrics`] registry with
//!   its per-interface cycle transaction
//! - [`scraper`] — the background poll loop feeding the registry
//! - [`server`] — the axum router exposing `/metrics` and `/health`
//! - [`config`] / [`args`] — TOML + environment + flag configuration
//!
//! The poll loop is the registry's only writer; HTTP handlers are pure
//! readers and never wait on a device query.

pub mod args;
pub mod config;
pub mod logging;
pub mod metrics;
pub mod scraper;
pub mod server;
pub mod types;
pub mod wg;

pub use args::Args;
pub use config::{Config, load_config, load_config_with_fallback};
pub use metrics::PeerMetrics;
pub use scraper::Scraper;
pub use server::build_router;
pub use wg::{DeviceSource, WgCommandSource, WgError};
