//! Configuration module
//!
//! Types, defaults, loading and validation for the exporter configuration.
//! Settings come from an optional TOML file, `WG_EXPORTER_*` environment
//! variables, and command-line flags (highest precedence, applied by the
//! binary).

mod defaults;
mod loading;
mod types;
mod validation;

pub use loading::{load_config, load_config_with_fallback, parse_interface_csv};
pub use types::{AuthConfig, Config, ExporterConfig, ScrapeConfig};

pub use defaults::{scrape_interval, scrape_timeout};
