//! Remote-entity types produced and consumed by the sync engine

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque bearer credential for the remote API.
///
/// Short-lived and owned by the caller; the engine passes it into every
/// remote call and never stores it. `Debug` redacts the token so it cannot
/// leak through logs.
#[derive(Clone)]
pub struct RemoteCredential(String);

impl RemoteCredential {
    /// Wrap a bearer token obtained out of band.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Access the raw token for an `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RemoteCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RemoteCredential(***)")
    }
}

/// Kind of remote entity a natural key refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Item,
    Customer,
}

impl EntityKind {
    /// Lowercase label used in coalescing keys and log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Item => "item",
            Self::Customer => "customer",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A remote entity resolved by natural key.
///
/// Cached only for the lifetime of one coalesced resolution, never across
/// calls.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolvedEntity {
    /// Remote-assigned identifier, opaque to the engine.
    pub remote_id: String,
    pub code: String,
    pub display_name: String,
    pub unit_of_measure: String,
    pub price: f64,
}

/// Terminal result of an order upsert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// Remote-assigned order identifier.
    pub remote_order_id: String,
    /// `true` if this submission brought the order into being, `false` if a
    /// pre-existing match was found.
    pub created: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_debug_is_redacted() {
        let credential = RemoteCredential::new("super-secret-token");
        assert_eq!(format!("{:?}", credential), "RemoteCredential(***)");
        assert_eq!(credential.expose(), "super-secret-token");
    }

    #[test]
    fn entity_kind_labels() {
        assert_eq!(EntityKind::Item.to_string(), "item");
        assert_eq!(EntityKind::Customer.to_string(), "customer");
    }
}
