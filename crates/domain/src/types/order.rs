//! Source-platform order types
//!
//! A [`LogicalOrder`] is the caller-owned input to the sync engine. It is
//! read-only to the engine; nothing here is persisted.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One order line as received from the source platform.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    /// Natural key of the item in the remote catalog.
    pub sku: String,
    pub quantity: u32,
    pub unit_price: f64,
}

/// Billing details carried on the source order.
///
/// Used both for the customer record created in the remote system and for
/// the customer snapshot embedded in the order document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BillingInfo {
    pub first_name: String,
    pub last_name: String,
    pub street: String,
    pub postal_code: String,
    pub city: String,
    pub country_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl BillingInfo {
    /// First and last name joined, trimmed of stray whitespace.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

/// A source order to be pushed into the remote system exactly once.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogicalOrder {
    /// Globally unique per source order; the idempotency anchor for the
    /// whole upsert.
    pub external_reference: String,
    pub billing: BillingInfo,
    pub line_items: Vec<LineItem>,
    /// ISO currency code, e.g. `EUR`.
    pub currency: String,
    pub created_at: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_name_joins_and_trims() {
        let billing = BillingInfo {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            ..BillingInfo::default()
        };
        assert_eq!(billing.full_name(), "Ada Lovelace");

        let only_first =
            BillingInfo { first_name: "Ada".to_string(), ..BillingInfo::default() };
        assert_eq!(only_first.full_name(), "Ada");
    }
}
