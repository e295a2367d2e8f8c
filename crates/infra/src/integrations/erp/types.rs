//! Wire payloads for the remote ERP REST API
//!
//! The remote speaks PascalCase JSON and is loose about identifier types:
//! ids arrive as numbers or strings depending on the endpoint, bulk
//! listings nest their rows under `Rows` or `Items` or come as bare arrays.
//! Everything is normalized here so the client stays shape-agnostic.

use chrono::NaiveDate;
use orderbridge_core::erp_ports::{ItemRecord, OrderDocument, OrderRecord};
use orderbridge_domain::ErpConfig;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Printed under the document body by the remote system.
const ORDER_CONFIRMATION_LINE: &str = "We hereby confirm the order shown in this document.";

/// Accepts a JSON number or string and normalizes it to an opaque string id.
pub(crate) fn opaque_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdRepr {
        Number(i64),
        Text(String),
    }
    Ok(match IdRepr::deserialize(deserializer)? {
        IdRepr::Number(n) => n.to_string(),
        IdRepr::Text(s) => s,
    })
}

/// Optional variant of [`opaque_id`].
pub(crate) fn opaque_id_opt<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdRepr {
        Number(i64),
        Text(String),
    }
    Ok(Option::<IdRepr>::deserialize(deserializer)?.map(|repr| match repr {
        IdRepr::Number(n) => n.to_string(),
        IdRepr::Text(s) => s,
    }))
}

/// Extract an opaque id from an ad-hoc JSON value, if one is present.
pub(crate) fn opaque_id_value(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

// =============================================================================
// Inbound payloads
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ItemPayload {
    #[serde(rename = "ItemId", deserialize_with = "opaque_id")]
    pub item_id: String,
    #[serde(rename = "Code")]
    pub code: String,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    /// Some listing endpoints label the name field `Title`.
    #[serde(rename = "Title", default)]
    pub title: Option<String>,
    #[serde(rename = "UnitOfMeasurement", default)]
    pub unit_of_measurement: Option<String>,
    #[serde(rename = "Price", default)]
    pub price: Option<f64>,
}

impl From<ItemPayload> for ItemRecord {
    fn from(payload: ItemPayload) -> Self {
        Self {
            id: payload.item_id,
            code: payload.code,
            name: payload.name.or(payload.title),
            unit_of_measure: payload.unit_of_measurement,
            price: payload.price,
        }
    }
}

/// Bulk item listing in any of the remote's observed shapes.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ItemListingPayload {
    Keyed {
        #[serde(rename = "Rows", default)]
        rows: Option<Vec<ItemPayload>>,
        #[serde(rename = "Items", default)]
        items: Option<Vec<ItemPayload>>,
    },
    Bare(Vec<ItemPayload>),
}

impl ItemListingPayload {
    /// The listing's rows, or `None` when the payload is not a list at all.
    pub(crate) fn into_rows(self) -> Option<Vec<ItemPayload>> {
        match self {
            Self::Keyed { rows, items } => rows.or(items),
            Self::Bare(rows) => Some(rows),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CustomerPayload {
    #[serde(rename = "CustomerId", default, deserialize_with = "opaque_id_opt")]
    pub customer_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct OrderPayload {
    #[serde(rename = "ID", deserialize_with = "opaque_id")]
    pub id: String,
    #[serde(rename = "Reference", default)]
    pub reference: Option<String>,
}

impl From<OrderPayload> for OrderRecord {
    fn from(payload: OrderPayload) -> Self {
        Self { id: payload.id, reference: payload.reference }
    }
}

/// Order listing; a missing `Rows` key means an empty result, not a
/// malformed one.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum OrderListingPayload {
    Keyed {
        #[serde(rename = "Rows", default)]
        rows: Option<Vec<OrderPayload>>,
    },
    Bare(Vec<OrderPayload>),
}

impl OrderListingPayload {
    pub(crate) fn into_rows(self) -> Vec<OrderPayload> {
        match self {
            Self::Keyed { rows } => rows.unwrap_or_default(),
            Self::Bare(rows) => rows,
        }
    }
}

// =============================================================================
// Outbound payloads
// =============================================================================

/// `{ "ID": ... }` reference; serialized as a number when the opaque id is
/// numeric, matching what the remote hands out.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct IdRef {
    #[serde(rename = "ID")]
    pub id: Value,
}

impl IdRef {
    pub(crate) fn new(id: &str) -> Self {
        let id = id.parse::<i64>().map(Value::from).unwrap_or_else(|_| Value::from(id));
        Self { id }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateCustomerRequest<'a> {
    #[serde(rename = "Name")]
    pub name: &'a str,
    #[serde(rename = "Code")]
    pub code: &'a str,
    #[serde(rename = "Address")]
    pub address: &'a str,
    #[serde(rename = "PostalCode")]
    pub postal_code: &'a str,
    #[serde(rename = "City")]
    pub city: &'a str,
    #[serde(rename = "CountryName", skip_serializing_if = "Option::is_none")]
    pub country_name: Option<&'a str>,
    #[serde(rename = "SubjectToVAT")]
    pub subject_to_vat: &'a str,
    #[serde(rename = "Email", skip_serializing_if = "Option::is_none")]
    pub email: Option<&'a str>,
    #[serde(rename = "Phone", skip_serializing_if = "Option::is_none")]
    pub phone: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ContactRequest<'a> {
    #[serde(rename = "FullName")]
    pub full_name: &'a str,
    #[serde(rename = "Email", skip_serializing_if = "Option::is_none")]
    pub email: Option<&'a str>,
    #[serde(rename = "PhoneNumber", skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<&'a str>,
    /// `"D"` marks the default contact.
    #[serde(rename = "Default")]
    pub is_default: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct CurrencyRef {
    #[serde(rename = "Name")]
    pub name: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct OrderRowPayload {
    #[serde(rename = "Item")]
    pub item: IdRef,
    #[serde(rename = "ItemCode")]
    pub item_code: String,
    #[serde(rename = "ItemName")]
    pub item_name: String,
    #[serde(rename = "Quantity")]
    pub quantity: u32,
    #[serde(rename = "Price")]
    pub price: f64,
    #[serde(rename = "UnitOfMeasurement")]
    pub unit_of_measurement: String,
    #[serde(rename = "Warehouse", skip_serializing_if = "Option::is_none")]
    pub warehouse: Option<IdRef>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateOrderRequest {
    #[serde(rename = "DocumentType")]
    pub document_type: String,
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "DueDate")]
    pub due_date: NaiveDate,
    /// `"P"` - the document was received, not issued.
    #[serde(rename = "ReceivedIssued")]
    pub received_issued: String,
    #[serde(rename = "Customer")]
    pub customer: IdRef,
    #[serde(rename = "CustomerName")]
    pub customer_name: String,
    #[serde(rename = "CustomerAddress")]
    pub customer_address: String,
    #[serde(rename = "CustomerPostalCode")]
    pub customer_postal_code: String,
    #[serde(rename = "CustomerCity")]
    pub customer_city: String,
    #[serde(rename = "CustomerCountryName", skip_serializing_if = "Option::is_none")]
    pub customer_country_name: Option<String>,
    #[serde(rename = "Analytic", skip_serializing_if = "Option::is_none")]
    pub analytic: Option<i64>,
    #[serde(rename = "Currency")]
    pub currency: CurrencyRef,
    #[serde(rename = "Reference")]
    pub reference: String,
    #[serde(rename = "Notes", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(rename = "DescriptionBelow")]
    pub description_below: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "OrderRows")]
    pub order_rows: Vec<OrderRowPayload>,
    #[serde(rename = "IsPriceWithVAT")]
    pub is_price_with_vat: bool,
}

impl CreateOrderRequest {
    /// Map the engine's semantic document onto the remote wire shape.
    pub(crate) fn from_document(document: &OrderDocument, config: &ErpConfig) -> Self {
        let warehouse = config.warehouse_id.map(|id| IdRef::new(&id.to_string()));
        Self {
            document_type: "ReceivedOrder".to_string(),
            date: document.issue_date,
            due_date: document.due_date,
            received_issued: "P".to_string(),
            customer: IdRef::new(&document.customer_id),
            customer_name: document.customer_name.clone(),
            customer_address: document.customer_address.clone(),
            customer_postal_code: document.customer_postal_code.clone(),
            customer_city: document.customer_city.clone(),
            customer_country_name: document.customer_country_name.clone(),
            analytic: config.analytic_id,
            currency: CurrencyRef { name: document.currency.clone() },
            reference: document.reference.clone(),
            notes: document.note.clone(),
            description_below: ORDER_CONFIRMATION_LINE.to_string(),
            status: "P".to_string(),
            order_rows: document
                .rows
                .iter()
                .map(|row| OrderRowPayload {
                    item: IdRef::new(&row.item_id),
                    item_code: row.item_code.clone(),
                    item_name: row.item_name.clone(),
                    quantity: row.quantity,
                    price: row.unit_price,
                    unit_of_measurement: row.unit_of_measure.clone(),
                    warehouse: warehouse.clone(),
                })
                .collect(),
            is_price_with_vat: true,
        }
    }
}
