//! ERP-specific error types and classification
//!
//! Categorizes remote API failures with retry recommendations and
//! conversion into the domain error taxonomy.

use std::fmt;

use orderbridge_domain::OrderBridgeError;
use reqwest::StatusCode;

/// ERP error category
///
/// Classifies errors by type to enable appropriate retry strategies and
/// branch decisions upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErpErrorCategory {
    /// Requested entity or order is absent (404)
    NotFound,

    /// Duplicate natural key (409)
    Conflict,

    /// Rate limit exceeded (429)
    RateLimited,

    /// Authentication failed (401, 403)
    Authentication,

    /// Invalid request or data (4xx except 401, 403, 404, 409, 429)
    Validation,

    /// Remote server is unavailable (5xx errors)
    ServerUnavailable,

    /// Network request timed out
    NetworkTimeout,

    /// Network is offline or unreachable
    NetworkOffline,

    /// Unknown or unclassified error
    Unknown,
}

impl ErpErrorCategory {
    /// Returns true if this error type should be retried
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited
                | Self::ServerUnavailable
                | Self::NetworkTimeout
                | Self::NetworkOffline
        )
    }

    /// Returns recommended retry delay in seconds
    pub fn retry_delay_secs(&self) -> Option<u64> {
        match self {
            Self::RateLimited => Some(2),
            Self::NetworkTimeout => Some(10),
            Self::NetworkOffline => Some(30),
            Self::ServerUnavailable => Some(60),
            _ => None,
        }
    }
}

impl fmt::Display for ErpErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "Not Found"),
            Self::Conflict => write!(f, "Conflict"),
            Self::RateLimited => write!(f, "Rate Limited"),
            Self::Authentication => write!(f, "Authentication Failed"),
            Self::Validation => write!(f, "Validation Error"),
            Self::ServerUnavailable => write!(f, "Server Unavailable"),
            Self::NetworkTimeout => write!(f, "Network Timeout"),
            Self::NetworkOffline => write!(f, "Network Offline"),
            Self::Unknown => write!(f, "Unknown Error"),
        }
    }
}

/// Internal ERP error with retry metadata
///
/// Used within the integration for detailed handling; external callers
/// receive `OrderBridgeError` via conversion.
#[derive(Debug, Clone)]
pub struct ErpError {
    category: ErpErrorCategory,
    message: String,
    context: Option<String>,
}

impl ErpError {
    /// Create a new ERP error
    pub fn new(category: ErpErrorCategory, message: impl Into<String>) -> Self {
        Self { category, message: message.into(), context: None }
    }

    /// Add context to the error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Get the error category
    pub fn category(&self) -> ErpErrorCategory {
        self.category
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns true if this error should be retried
    pub fn is_retryable(&self) -> bool {
        self.category.is_retryable()
    }

    /// Classify HTTP status code into error category
    pub fn from_status_code(status: StatusCode) -> Self {
        let category = match status.as_u16() {
            404 => ErpErrorCategory::NotFound,
            409 => ErpErrorCategory::Conflict,
            429 => ErpErrorCategory::RateLimited,
            401 | 403 => ErpErrorCategory::Authentication,
            400 | 422 => ErpErrorCategory::Validation,
            500..=599 => ErpErrorCategory::ServerUnavailable,
            _ => ErpErrorCategory::Unknown,
        };

        Self::new(
            category,
            format!("HTTP {}: {}", status.as_u16(), status.canonical_reason().unwrap_or("Unknown")),
        )
    }

    /// Convert to domain error type
    pub fn into_domain_error(self) -> OrderBridgeError {
        let detail = match &self.context {
            Some(context) => format!("{} ({})", self.message, context),
            None => self.message.clone(),
        };
        match self.category {
            ErpErrorCategory::NotFound => OrderBridgeError::NotFound(detail),
            ErpErrorCategory::Conflict => OrderBridgeError::Conflict(detail),
            ErpErrorCategory::RateLimited => OrderBridgeError::RateLimited(detail),
            ErpErrorCategory::Authentication => OrderBridgeError::Auth(detail),
            ErpErrorCategory::Validation => OrderBridgeError::InvalidInput(detail),
            ErpErrorCategory::ServerUnavailable => OrderBridgeError::Remote(detail),
            ErpErrorCategory::NetworkTimeout | ErpErrorCategory::NetworkOffline => {
                OrderBridgeError::Network(detail)
            }
            ErpErrorCategory::Unknown => OrderBridgeError::Internal(detail),
        }
    }
}

impl fmt::Display for ErpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.category, self.message)?;
        if let Some(ctx) = &self.context {
            write!(f, " ({})", ctx)?;
        }
        Ok(())
    }
}

impl std::error::Error for ErpError {}

/// Convert reqwest errors to ERP errors
impl From<reqwest::Error> for ErpError {
    fn from(err: reqwest::Error) -> Self {
        let (category, message) = if err.is_timeout() {
            (ErpErrorCategory::NetworkTimeout, "Request timed out".to_string())
        } else if err.is_connect() {
            (ErpErrorCategory::NetworkOffline, "Failed to connect to ERP server".to_string())
        } else if let Some(status) = err.status() {
            return Self::from_status_code(status).with_context(err.to_string());
        } else if err.is_request() {
            (ErpErrorCategory::Validation, "Invalid request".to_string())
        } else {
            (ErpErrorCategory::Unknown, "Network error".to_string())
        };

        Self::new(category, message).with_context(err.to_string())
    }
}

/// Convenience conversion to the domain error
impl From<ErpError> for OrderBridgeError {
    fn from(err: ErpError) -> Self {
        err.into_domain_error()
    }
}
