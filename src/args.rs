//! Command-line argument parsing
//!
//! Flags override the config file, which in turn overrides built-in
//! defaults.

use clap::Parser;

use crate::config::{Config, parse_interface_csv};
use crate::types::Port;

/// Prometheus exporter for WireGuard peer statistics
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Port to listen on (overrides config file)
    #[arg(short, long, env = "WG_EXPORTER_PORT")]
    pub port: Option<Port>,

    /// Address to bind to (overrides config file; default: all interfaces)
    #[arg(short, long, env = "WG_EXPORTER_HOST")]
    pub listen: Option<String>,

    /// Comma-separated list of WireGuard interfaces to scrape
    /// (default: discover all present devices on every poll)
    #[arg(short, long, env = "WG_EXPORTER_INTERFACES")]
    pub interfaces: Option<String>,

    /// Basic auth username for the metrics endpoint
    #[arg(long, env = "WG_EXPORTER_AUTH_USER")]
    pub auth_user: Option<String>,

    /// Basic auth password for the metrics endpoint
    #[arg(long, env = "WG_EXPORTER_AUTH_PASS")]
    pub auth_pass: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "wg-exporter.toml", env = "WG_EXPORTER_CONFIG")]
    pub config: String,
}

impl Args {
    /// Fold the flags into a loaded configuration
    ///
    /// Every flag that was given replaces the corresponding config value;
    /// the merged result is re-validated by the caller before use.
    pub fn apply_to(&self, config: &mut Config) -> anyhow::Result<()> {
        if let Some(port) = self.port {
            config.exporter.port = port;
        }
        if let Some(listen) = &self.listen {
            config.exporter.host = listen.clone();
        }
        if let Some(list) = &self.interfaces {
            config.scrape.interfaces = parse_interface_csv(list)?;
        }
        if let Some(user) = &self.auth_user {
            config.auth.username = Some(user.clone());
        }
        if let Some(pass) = &self.auth_pass {
            config.auth.password = Some(pass.clone());
        }
        Ok(())
    }
}
