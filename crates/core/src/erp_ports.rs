//! ERP gateway port
//!
//! The narrow interface through which the engine reaches the remote
//! accounting system. Infrastructure supplies the REST implementation;
//! tests supply scripted in-memory ones.
//!
//! Lookup misses are modeled as `Ok(None)` - absence is a branch signal for
//! the resolver and the upsert state machine, not an error. Duplicate-key
//! and rate-limit signals surface as `Conflict` / `RateLimited` errors.

use async_trait::async_trait;
use chrono::NaiveDate;
use orderbridge_domain::{RemoteCredential, Result};

/// Item as known to the remote catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemRecord {
    /// Remote-assigned identifier, opaque to the engine.
    pub id: String,
    pub code: String,
    pub name: Option<String>,
    pub unit_of_measure: Option<String>,
    pub price: Option<f64>,
}

/// Customer as known to the remote system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerRecord {
    pub id: String,
}

/// Order as surfaced by a reference query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRecord {
    pub id: String,
    pub reference: Option<String>,
}

/// Fields for creating a customer, derived from billing info.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerDraft {
    pub name: String,
    pub code: String,
    pub street: String,
    pub postal_code: String,
    pub city: String,
    pub country_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Best-effort contact record attached to a newly created customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactCard {
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// One row of an order document, joining a resolved item with the source
/// line.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRow {
    pub item_id: String,
    pub item_code: String,
    pub item_name: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub unit_of_measure: String,
}

/// The order-creation payload assembled by the upsert state machine.
///
/// Semantic fields only; the gateway implementation maps them onto the
/// remote wire format (document type tags, warehouse references and the
/// like live there).
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDocument {
    pub reference: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub customer_id: String,
    pub customer_name: String,
    pub customer_address: String,
    pub customer_postal_code: String,
    pub customer_city: String,
    pub customer_country_name: Option<String>,
    pub currency: String,
    pub rows: Vec<OrderRow>,
    pub note: Option<String>,
}

/// Outcome of an order-creation call, as far as the wire reveals it.
///
/// The remote is known to acknowledge creations with an empty payload when
/// the order materializes asynchronously; that case is `Accepted` and the
/// caller must reconcile by re-querying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOrderReply {
    /// The response carried the new order's identifier.
    Confirmed { order_id: String },
    /// The request was accepted but no identifier was returned.
    Accepted,
}

/// Trait for remote ERP operations.
#[async_trait]
pub trait ErpGateway: Send + Sync {
    /// Point query for an item by its code.
    async fn find_item_by_code(
        &self,
        credential: &RemoteCredential,
        code: &str,
    ) -> Result<Option<ItemRecord>>;

    /// Bulk catalog listing, sized to cover the whole catalog in one page.
    async fn list_items(&self, credential: &RemoteCredential) -> Result<Vec<ItemRecord>>;

    /// Point query for a customer by its code.
    async fn find_customer_by_code(
        &self,
        credential: &RemoteCredential,
        code: &str,
    ) -> Result<Option<CustomerRecord>>;

    /// Create a customer. Returns `Ok(None)` when the remote accepted the
    /// creation without echoing the new identifier; duplicate codes surface
    /// as `Conflict`.
    async fn create_customer(
        &self,
        credential: &RemoteCredential,
        draft: &CustomerDraft,
    ) -> Result<Option<CustomerRecord>>;

    /// Attach a contact record to an existing customer.
    async fn add_customer_contact(
        &self,
        credential: &RemoteCredential,
        customer_id: &str,
        contact: &ContactCard,
    ) -> Result<()>;

    /// Query orders by their human-readable reference.
    async fn find_order_by_reference(
        &self,
        credential: &RemoteCredential,
        reference: &str,
    ) -> Result<Option<OrderRecord>>;

    /// Submit an order document under an idempotency token.
    async fn create_order(
        &self,
        credential: &RemoteCredential,
        document: &OrderDocument,
        idempotency_token: &str,
    ) -> Result<CreateOrderReply>;
}
