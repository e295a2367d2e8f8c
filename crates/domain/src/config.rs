//! Configuration structures
//!
//! Loaded by `orderbridge-infra`'s config loader from environment variables
//! or a config file; every field has a sensible default except the remote
//! endpoint coordinates.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CATALOG_PAGE_SIZE, DEFAULT_MAX_ATTEMPTS, DEFAULT_RATE_LIMIT_DELAY_SECS,
};

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub erp: ErpConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

/// Remote ERP endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErpConfig {
    /// API root, e.g. `https://erp.example.com/api`.
    pub base_url: String,
    /// Organisation the API calls are scoped to.
    pub organisation_id: u64,
    /// Warehouse referenced by order rows, when the remote requires one.
    #[serde(default)]
    pub warehouse_id: Option<i64>,
    /// Analytic dimension stamped on order documents, when configured.
    #[serde(default)]
    pub analytic_id: Option<i64>,
    /// Page size for the catalog slow path; must cover the whole catalog.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Total attempts (initial try + retries) per remote call.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
}

/// Sync engine tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SyncConfig {
    /// Reconciliation re-queries before the final long-delay attempt.
    pub poll_attempts: u32,
    pub poll_delay_seconds: u64,
    pub poll_final_delay_seconds: u64,
    /// Fixed delay before retrying a rate-limited call.
    pub rate_limit_delay_seconds: u64,
    /// Prefix for customer codes derived from order references.
    pub customer_code_prefix: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_attempts: 3,
            poll_delay_seconds: 2,
            poll_final_delay_seconds: 5,
            rate_limit_delay_seconds: DEFAULT_RATE_LIMIT_DELAY_SECS,
            customer_code_prefix: "SHOP".to_string(),
        }
    }
}

fn default_page_size() -> u32 {
    DEFAULT_CATALOG_PAGE_SIZE
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_max_attempts() -> usize {
    DEFAULT_MAX_ATTEMPTS
}
