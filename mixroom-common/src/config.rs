//! Configuration loading and tiered key resolution
//!
//! Settings resolve in priority order: environment variable, then TOML
//! config file, then compiled default. Persistence is out of scope for
//! this service, so there is no database tier.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

/// Default HTTP bind port for the generation service
pub const DEFAULT_PORT: u16 = 5740;

/// TOML configuration file contents
///
/// All fields optional; missing keys fall through to the next tier.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Last.fm API key (absence disables the secondary catalog)
    pub lastfm_api_key: Option<String>,
    /// HTTP bind port
    pub port: Option<u16>,
    /// Chart region for trending lookups ("global" or "sweden")
    pub chart_region: Option<String>,
    /// Ceiling on concurrent outbound primary-catalog calls
    pub max_concurrent_requests: Option<usize>,
}

impl TomlConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Cannot read {}: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid TOML in {}: {}", path.display(), e)))
    }

    /// Load configuration from an optional path, defaulting to empty
    ///
    /// A missing `--config` argument is not an error; every key has a
    /// fallback tier.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Resolve the Last.fm API key: ENV → TOML
///
/// A missing key is not an error; it disables secondary-catalog
/// features (discovery and trend fallback degrade gracefully).
pub fn resolve_lastfm_api_key(toml_config: &TomlConfig) -> Option<String> {
    let env_key = non_empty(std::env::var("MIXROOM_LASTFM_API_KEY").ok());
    let toml_key = non_empty(toml_config.lastfm_api_key.clone());

    if env_key.is_some() && toml_key.is_some() {
        warn!("Last.fm API key set in both environment and TOML config; using environment");
    }

    if let Some(key) = env_key {
        info!("Last.fm API key loaded from environment variable");
        return Some(key);
    }

    if let Some(key) = toml_key {
        info!("Last.fm API key loaded from TOML config");
        return Some(key);
    }

    info!("Last.fm API key not configured; secondary catalog disabled");
    None
}

/// Resolve the chart region: ENV → TOML → "global"
///
/// Unrecognized regions fall back to "global" with a warning rather
/// than failing startup.
pub fn resolve_chart_region(toml_config: &TomlConfig) -> String {
    let candidate = non_empty(std::env::var("MIXROOM_CHART_REGION").ok())
        .or_else(|| non_empty(toml_config.chart_region.clone()))
        .unwrap_or_else(|| "global".to_string())
        .to_lowercase();

    match candidate.as_str() {
        "global" | "sweden" => candidate,
        other => {
            warn!(region = %other, "Unknown chart region, falling back to global");
            "global".to_string()
        }
    }
}

/// Resolve the HTTP bind port: CLI → ENV → TOML → default
pub fn resolve_port(cli_arg: Option<u16>, toml_config: &TomlConfig) -> u16 {
    if let Some(port) = cli_arg {
        return port;
    }
    if let Ok(port) = std::env::var("MIXROOM_PORT") {
        if let Ok(port) = port.parse() {
            return port;
        }
        warn!(value = %port, "Ignoring non-numeric MIXROOM_PORT");
    }
    toml_config.port.unwrap_or(DEFAULT_PORT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_full_config() {
        let file = write_config(
            r#"
            lastfm_api_key = "abc123"
            port = 6000
            chart_region = "sweden"
            max_concurrent_requests = 4
            "#,
        );

        let config = TomlConfig::load(file.path()).unwrap();
        assert_eq!(config.lastfm_api_key.as_deref(), Some("abc123"));
        assert_eq!(config.port, Some(6000));
        assert_eq!(config.chart_region.as_deref(), Some("sweden"));
        assert_eq!(config.max_concurrent_requests, Some(4));
    }

    #[test]
    fn test_load_empty_config() {
        let file = write_config("");
        let config = TomlConfig::load(file.path()).unwrap();
        assert!(config.lastfm_api_key.is_none());
        assert!(config.port.is_none());
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = TomlConfig::load(Path::new("/nonexistent/mixroom.toml"));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_load_or_default_without_path() {
        let config = TomlConfig::load_or_default(None).unwrap();
        assert!(config.lastfm_api_key.is_none());
    }

    #[test]
    #[serial]
    fn test_api_key_env_overrides_toml() {
        std::env::set_var("MIXROOM_LASTFM_API_KEY", "from-env");
        let config = TomlConfig {
            lastfm_api_key: Some("from-toml".to_string()),
            ..Default::default()
        };

        assert_eq!(resolve_lastfm_api_key(&config).as_deref(), Some("from-env"));
        std::env::remove_var("MIXROOM_LASTFM_API_KEY");
    }

    #[test]
    #[serial]
    fn test_api_key_falls_back_to_toml_then_none() {
        std::env::remove_var("MIXROOM_LASTFM_API_KEY");
        let config = TomlConfig {
            lastfm_api_key: Some("from-toml".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_lastfm_api_key(&config).as_deref(), Some("from-toml"));

        assert_eq!(resolve_lastfm_api_key(&TomlConfig::default()), None);
    }

    #[test]
    #[serial]
    fn test_blank_api_key_treated_as_missing() {
        std::env::set_var("MIXROOM_LASTFM_API_KEY", "  ");
        assert_eq!(resolve_lastfm_api_key(&TomlConfig::default()), None);
        std::env::remove_var("MIXROOM_LASTFM_API_KEY");
    }

    #[test]
    #[serial]
    fn test_chart_region_resolution() {
        std::env::remove_var("MIXROOM_CHART_REGION");
        assert_eq!(resolve_chart_region(&TomlConfig::default()), "global");

        let config = TomlConfig {
            chart_region: Some("Sweden".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_chart_region(&config), "sweden");

        let config = TomlConfig {
            chart_region: Some("mars".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_chart_region(&config), "global");
    }

    #[test]
    #[serial]
    fn test_port_resolution_priority() {
        std::env::remove_var("MIXROOM_PORT");
        let config = TomlConfig {
            port: Some(7000),
            ..Default::default()
        };

        assert_eq!(resolve_port(Some(8000), &config), 8000);
        assert_eq!(resolve_port(None, &config), 7000);
        assert_eq!(resolve_port(None, &TomlConfig::default()), DEFAULT_PORT);

        std::env::set_var("MIXROOM_PORT", "9000");
        assert_eq!(resolve_port(None, &config), 9000);
        std::env::remove_var("MIXROOM_PORT");
    }
}
