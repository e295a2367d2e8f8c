//! Domain constants

/// Unit of measure applied when the remote item record does not carry one.
pub const DEFAULT_UNIT_OF_MEASURE: &str = "unit";

/// Catalog page size large enough to cover the whole catalog in one page.
pub const DEFAULT_CATALOG_PAGE_SIZE: u32 = 10_000;

/// Fixed delay applied before retrying a rate-limited remote call, in seconds.
pub const DEFAULT_RATE_LIMIT_DELAY_SECS: u64 = 2;

/// Total attempts (initial try + retries) for a single remote call.
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;
