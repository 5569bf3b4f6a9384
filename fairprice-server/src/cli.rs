//! Command-line arguments
//!
//! Every flag also reads an environment variable, so clap covers the first
//! two configuration tiers; the TOML file and defaults are applied by
//! [`ServiceConfig::resolve`](fairprice_common::config::ServiceConfig::resolve).

use clap::Parser;
use fairprice_common::config::Overrides;
use fairprice_common::DeploymentVariant;
use std::path::PathBuf;

/// Command-line arguments for fairprice-server
#[derive(Parser, Debug)]
#[command(name = "fairprice-server")]
#[command(about = "Crowdsourced commodity price reporting service")]
#[command(version)]
pub struct Args {
    /// TOML config file (default: ~/.config/fairprice/config.toml)
    #[arg(short, long, env = "FAIRPRICE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long, env = "FAIRPRICE_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "FAIRPRICE_PORT")]
    pub port: Option<u16>,

    /// SQLite database file
    #[arg(long, env = "FAIRPRICE_DATABASE")]
    pub database: Option<PathBuf>,

    /// Deployment variant: market or store
    #[arg(long, env = "FAIRPRICE_VARIANT")]
    pub variant: Option<DeploymentVariant>,

    /// Price oracle base URL
    #[arg(long, env = "ML_URL")]
    pub ml_url: Option<String>,

    /// Price oracle timeout in milliseconds
    #[arg(long, env = "ML_TIMEOUT_MS")]
    pub ml_timeout_ms: Option<u64>,

    /// Code required to onboard as verifier or admin
    #[arg(long, env = "ADMIN_SECRET_CODE", hide_env_values = true)]
    pub admin_code: Option<String>,

    /// HMAC secret for identity tokens
    #[arg(long, env = "FAIRPRICE_TOKEN_SECRET", hide_env_values = true)]
    pub token_secret: Option<String>,

    /// Expected identity token issuer
    #[arg(long, env = "FAIRPRICE_TOKEN_ISSUER")]
    pub token_issuer: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "FAIRPRICE_LOG")]
    pub log_level: Option<String>,
}

impl Args {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            host: self.host.clone(),
            port: self.port,
            database_path: self.database.clone(),
            variant: self.variant,
            ml_url: self.ml_url.clone(),
            ml_timeout_ms: self.ml_timeout_ms,
            admin_code: self.admin_code.clone(),
            token_secret: self.token_secret.clone(),
            token_issuer: self.token_issuer.clone(),
            log_level: self.log_level.clone(),
        }
    }
}
