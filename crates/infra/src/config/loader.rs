//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `ORDERBRIDGE_ERP_BASE_URL`: Remote API root (required)
//! - `ORDERBRIDGE_ERP_ORG_ID`: Organisation identifier (required)
//! - `ORDERBRIDGE_ERP_WAREHOUSE_ID`: Warehouse for order rows (optional)
//! - `ORDERBRIDGE_ERP_ANALYTIC_ID`: Analytic dimension (optional)
//! - `ORDERBRIDGE_ERP_PAGE_SIZE`: Catalog slow-path page size
//! - `ORDERBRIDGE_ERP_TIMEOUT_SECONDS`: Per-request timeout
//! - `ORDERBRIDGE_ERP_MAX_ATTEMPTS`: Attempts per remote call
//! - `ORDERBRIDGE_SYNC_POLL_ATTEMPTS`: Reconciliation re-queries
//! - `ORDERBRIDGE_SYNC_POLL_DELAY`: Seconds between re-queries
//! - `ORDERBRIDGE_SYNC_POLL_FINAL_DELAY`: Seconds before the last attempt
//! - `ORDERBRIDGE_SYNC_RATE_LIMIT_DELAY`: Seconds before a rate-limit retry
//! - `ORDERBRIDGE_SYNC_CUSTOMER_CODE_PREFIX`: Customer code prefix
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml`
//! 2. `./orderbridge.json` or `./orderbridge.toml`
//! 3. The same names in the parent directory

use std::path::{Path, PathBuf};
use std::str::FromStr;

use orderbridge_domain::{Config, ErpConfig, OrderBridgeError, Result, SyncConfig};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `OrderBridgeError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// The endpoint coordinates are required; everything else falls back to
/// the defaults in `orderbridge_domain::config`.
///
/// # Errors
/// Returns `OrderBridgeError::Config` if required variables are missing
/// or any variable has an invalid value.
pub fn load_from_env() -> Result<Config> {
    let base_url = env_var("ORDERBRIDGE_ERP_BASE_URL")?;
    let organisation_id = parse_env::<u64>("ORDERBRIDGE_ERP_ORG_ID")?.ok_or_else(|| {
        OrderBridgeError::Config("ORDERBRIDGE_ERP_ORG_ID is required".to_string())
    })?;

    let defaults = SyncConfig::default();
    let erp = ErpConfig {
        base_url,
        organisation_id,
        warehouse_id: parse_env("ORDERBRIDGE_ERP_WAREHOUSE_ID")?,
        analytic_id: parse_env("ORDERBRIDGE_ERP_ANALYTIC_ID")?,
        page_size: parse_env("ORDERBRIDGE_ERP_PAGE_SIZE")?.unwrap_or(10_000),
        timeout_seconds: parse_env("ORDERBRIDGE_ERP_TIMEOUT_SECONDS")?.unwrap_or(30),
        max_attempts: parse_env("ORDERBRIDGE_ERP_MAX_ATTEMPTS")?.unwrap_or(3),
    };

    Ok(Config {
        erp,
        sync: SyncConfig {
            poll_attempts: parse_env("ORDERBRIDGE_SYNC_POLL_ATTEMPTS")?
                .unwrap_or(defaults.poll_attempts),
            poll_delay_seconds: parse_env("ORDERBRIDGE_SYNC_POLL_DELAY")?
                .unwrap_or(defaults.poll_delay_seconds),
            poll_final_delay_seconds: parse_env("ORDERBRIDGE_SYNC_POLL_FINAL_DELAY")?
                .unwrap_or(defaults.poll_final_delay_seconds),
            rate_limit_delay_seconds: parse_env("ORDERBRIDGE_SYNC_RATE_LIMIT_DELAY")?
                .unwrap_or(defaults.rate_limit_delay_seconds),
            customer_code_prefix: std::env::var("ORDERBRIDGE_SYNC_CUSTOMER_CODE_PREFIX")
                .unwrap_or(defaults.customer_code_prefix),
        },
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `OrderBridgeError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - The file cannot be parsed
pub fn load_from_file(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => probe_config_paths().ok_or_else(|| {
            OrderBridgeError::Config("no config file found in probed locations".to_string())
        })?,
    };

    let contents = std::fs::read_to_string(&path).map_err(|e| {
        OrderBridgeError::Config(format!("failed to read {}: {}", path.display(), e))
    })?;

    let config = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(&contents).map_err(|e| {
            OrderBridgeError::Config(format!("invalid JSON in {}: {}", path.display(), e))
        })?,
        Some("toml") => toml::from_str(&contents).map_err(|e| {
            OrderBridgeError::Config(format!("invalid TOML in {}: {}", path.display(), e))
        })?,
        other => {
            return Err(OrderBridgeError::Config(format!(
                "unsupported config format {:?} for {}",
                other,
                path.display()
            )))
        }
    };

    tracing::info!(path = %path.display(), "Configuration loaded from file");
    Ok(config)
}

fn probe_config_paths() -> Option<PathBuf> {
    let names = ["config.json", "config.toml", "orderbridge.json", "orderbridge.toml"];
    let bases = [PathBuf::from("."), PathBuf::from("..")];
    for base in &bases {
        for name in &names {
            let candidate = base.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    None
}

fn env_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| OrderBridgeError::Config(format!("{name} is not set")))
}

/// Parse an optional environment variable, erroring on malformed values
/// rather than silently dropping them.
fn parse_env<T: FromStr>(name: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| OrderBridgeError::Config(format!("invalid {name}: {e}"))),
        Err(_) => Ok(None),
    }
}
