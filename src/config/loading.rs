//! Configuration loading from files and environment variables
//!
//! Settings load from a TOML file when one exists; `WG_EXPORTER_*`
//! environment variables override it for container deployments. Flags are
//! applied on top by the binary.

use anyhow::{Context, Result};
use tracing::{info, warn};

use super::types::Config;
use crate::types::{InterfaceName, Port};

/// Load configuration from a TOML file, then apply environment overrides
/// and validate
pub fn load_config(config_path: &str) -> Result<Config> {
    let config_content = std::fs::read_to_string(config_path)
        .with_context(|| format!("failed to read config file '{}'", config_path))?;

    let mut config: Config = toml::from_str(&config_content)
        .with_context(|| format!("failed to parse config file '{}'", config_path))?;

    apply_env_overrides(&mut config)?;
    config.validate()?;

    Ok(config)
}

/// Load configuration, falling back to defaults when no file exists
///
/// A present-but-broken config file is still an error; silently ignoring it
/// would mask operator mistakes.
pub fn load_config_with_fallback(config_path: &str) -> Result<Config> {
    if std::path::Path::new(config_path).exists() {
        load_config(config_path)
    } else {
        info!(
            "config file '{}' not found, using defaults",
            config_path
        );
        let mut config = Config::default();
        apply_env_overrides(&mut config)?;
        config.validate()?;
        Ok(config)
    }
}

/// Apply `WG_EXPORTER_*` environment variable overrides
///
/// - `WG_EXPORTER_INTERFACES` — comma-separated interface list
/// - `WG_EXPORTER_HOST` — listen host
/// - `WG_EXPORTER_PORT` — listen port
/// - `WG_EXPORTER_AUTH_USER` / `WG_EXPORTER_AUTH_PASS` — basic auth
fn apply_env_overrides(config: &mut Config) -> Result<()> {
    if let Ok(list) = std::env::var("WG_EXPORTER_INTERFACES") {
        let interfaces = parse_interface_csv(&list)?;
        info!(
            "using {} interface(s) from WG_EXPORTER_INTERFACES",
            interfaces.len()
        );
        config.scrape.interfaces = interfaces;
    }

    if let Ok(host) = std::env::var("WG_EXPORTER_HOST") {
        config.exporter.host = host;
    }

    if let Ok(port) = std::env::var("WG_EXPORTER_PORT") {
        config.exporter.port = port
            .parse::<Port>()
            .with_context(|| format!("invalid WG_EXPORTER_PORT '{}'", port))?;
    }

    if let Ok(user) = std::env::var("WG_EXPORTER_AUTH_USER") {
        config.auth.username = Some(user);
    }
    if let Ok(pass) = std::env::var("WG_EXPORTER_AUTH_PASS") {
        config.auth.password = Some(pass);
    }

    Ok(())
}

/// Parse a comma-separated interface list, ignoring empty segments
pub fn parse_interface_csv(list: &str) -> Result<Vec<InterfaceName>> {
    let mut interfaces = Vec::new();
    for token in list.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let name = InterfaceName::new(token)
            .with_context(|| format!("invalid interface name '{}'", token))?;
        if interfaces.contains(&name) {
            warn!("interface '{}' listed more than once, ignoring duplicate", name);
            continue;
        }
        interfaces.push(name);
    }
    Ok(interfaces)
}
