//! Bootstrap configuration loading
//!
//! Each setting resolves in this priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Tiers 1 and 2 arrive together as [`Overrides`] (the binary's argument
//! parser reads both); tier 3 is [`TomlConfig`].

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::models::DeploymentVariant;
use crate::{Error, Result};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;
/// Oracle call timeout
pub const DEFAULT_ML_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Configuration file contents; every key is optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database_path: Option<PathBuf>,
    pub variant: Option<DeploymentVariant>,
    /// Code required to onboard as verifier or admin
    pub admin_code: Option<String>,
    #[serde(default)]
    pub ml: MlConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Price oracle settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MlConfig {
    /// Base URL, e.g. `http://127.0.0.1:8000`
    pub url: Option<String>,
    pub timeout_ms: Option<u64>,
}

/// Identity token settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdentityConfig {
    /// HMAC secret used to verify bearer tokens
    pub token_secret: Option<String>,
    /// Expected `iss` claim, if any
    pub issuer: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: Option<String>,
}

/// Values from the command line or environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database_path: Option<PathBuf>,
    pub variant: Option<DeploymentVariant>,
    pub ml_url: Option<String>,
    pub ml_timeout_ms: Option<u64>,
    pub admin_code: Option<String>,
    pub token_secret: Option<String>,
    pub token_issuer: Option<String>,
    pub log_level: Option<String>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub variant: DeploymentVariant,
    pub ml_url: Option<String>,
    pub ml_timeout: Duration,
    pub admin_code: Option<String>,
    pub token_secret: String,
    pub token_issuer: Option<String>,
    pub log_level: String,
}

impl ServiceConfig {
    /// Merge overrides over the TOML file over compiled defaults
    ///
    /// Fails when the market variant has no oracle URL or when no token
    /// secret is configured.
    pub fn resolve(overrides: Overrides, file: TomlConfig) -> Result<Self> {
        let variant = overrides.variant.or(file.variant).unwrap_or_default();

        let ml_url = overrides
            .ml_url
            .or(file.ml.url)
            .map(|u| u.trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty());
        if variant == DeploymentVariant::Market && ml_url.is_none() {
            return Err(Error::Config(
                "ML service URL not configured (set ML_URL, --ml-url or [ml] url); \
                 required by the market deployment variant"
                    .to_string(),
            ));
        }

        let token_secret = overrides
            .token_secret
            .or(file.identity.token_secret)
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                Error::Config(
                    "Identity token secret not configured (set FAIRPRICE_TOKEN_SECRET or [identity] token_secret)"
                        .to_string(),
                )
            })?;

        let admin_code = overrides.admin_code.or(file.admin_code).filter(|c| !c.is_empty());
        if admin_code.is_none() {
            warn!("No admin code configured; verifier and admin onboarding is disabled");
        }

        Ok(Self {
            host: overrides.host.or(file.host).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: overrides.port.or(file.port).unwrap_or(DEFAULT_PORT),
            database_path: overrides
                .database_path
                .or(file.database_path)
                .unwrap_or_else(default_database_path),
            variant,
            ml_url,
            ml_timeout: Duration::from_millis(
                overrides
                    .ml_timeout_ms
                    .or(file.ml.timeout_ms)
                    .unwrap_or(DEFAULT_ML_TIMEOUT_MS),
            ),
            admin_code,
            token_secret,
            token_issuer: overrides.token_issuer.or(file.identity.issuer),
            log_level: overrides
                .log_level
                .or(file.logging.level)
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        })
    }

    /// `host:port` listen address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Load the TOML config file
///
/// An explicit path must exist. Without one, the platform default
/// (`~/.config/fairprice/config.toml`) is tried; a missing default file is
/// not an error and yields an empty config.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => {
                info!("No config file found, using command-line, environment and defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    info!("Loaded config file: {}", path.display());
    Ok(config)
}

/// Platform config file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("fairprice").join("config.toml"))
}

/// Platform data location for the SQLite database
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("fairprice"))
        .unwrap_or_else(|| PathBuf::from("./fairprice_data"))
        .join("fairprice.db")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_secret() -> Overrides {
        Overrides {
            token_secret: Some("s3cret".into()),
            ml_url: Some("http://ml.local/".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_apply_when_nothing_set() {
        let config = ServiceConfig::resolve(with_secret(), TomlConfig::default()).unwrap();
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.variant, DeploymentVariant::Market);
        assert_eq!(config.ml_timeout, Duration::from_millis(5000));
        assert_eq!(config.ml_url.as_deref(), Some("http://ml.local"));
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_overrides_beat_file() {
        let file: TomlConfig = toml::from_str(
            r#"
            port = 6000
            variant = "store"
            [ml]
            timeout_ms = 800
            "#,
        )
        .unwrap();
        let overrides = Overrides {
            port: Some(7000),
            ..with_secret()
        };
        let config = ServiceConfig::resolve(overrides, file).unwrap();
        assert_eq!(config.port, 7000);
        assert_eq!(config.variant, DeploymentVariant::Store);
        assert_eq!(config.ml_timeout, Duration::from_millis(800));
    }

    #[test]
    fn test_market_variant_requires_ml_url() {
        let overrides = Overrides {
            token_secret: Some("s3cret".into()),
            ..Default::default()
        };
        let err = ServiceConfig::resolve(overrides, TomlConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_store_variant_runs_without_ml_url() {
        let overrides = Overrides {
            token_secret: Some("s3cret".into()),
            variant: Some(DeploymentVariant::Store),
            ..Default::default()
        };
        let config = ServiceConfig::resolve(overrides, TomlConfig::default()).unwrap();
        assert!(config.ml_url.is_none());
    }

    #[test]
    fn test_token_secret_required() {
        let overrides = Overrides {
            ml_url: Some("http://ml.local".into()),
            token_secret: Some("   ".into()),
            ..Default::default()
        };
        assert!(ServiceConfig::resolve(overrides, TomlConfig::default()).is_err());
    }
}
