//! Entity resolution
//!
//! Resolves remote items and customers by natural key (code). Items follow
//! a fast path (point query) with a slow-path fallback (bulk catalog scan);
//! customers that cannot be found are created from billing info, with a
//! duplicate-key conflict treated as losing a benign race rather than as a
//! failure. Resolution for a given code is coalesced so the process never
//! issues more than one concurrent lookup per key.

use std::sync::Arc;

use orderbridge_domain::constants::DEFAULT_UNIT_OF_MEASURE;
use orderbridge_domain::{
    BillingInfo, EntityKind, OrderBridgeError, RemoteCredential, ResolvedEntity, Result,
};
use tracing::{debug, warn};

use crate::coalesce::RequestCoalescer;
use crate::erp_ports::{ContactCard, CustomerDraft, CustomerRecord, ErpGateway, ItemRecord};

/// Resolves remote entities by code, creating customers when absent.
pub struct EntityResolver {
    gateway: Arc<dyn ErpGateway>,
    coalescer: RequestCoalescer<ResolvedEntity>,
}

impl EntityResolver {
    pub fn new(gateway: Arc<dyn ErpGateway>) -> Self {
        Self { gateway, coalescer: RequestCoalescer::new() }
    }

    /// Resolve an item by catalog code.
    ///
    /// Items are never auto-created, only discovered; a miss on both the
    /// point query and the catalog scan is `NotFound`.
    pub async fn resolve_item(
        &self,
        credential: &RemoteCredential,
        code: &str,
    ) -> Result<ResolvedEntity> {
        let key = format!("{}:{}", EntityKind::Item, code);
        let gateway = Arc::clone(&self.gateway);
        let credential = credential.clone();
        let code = code.to_owned();
        self.coalescer
            .run(&key, move || resolve_item_uncoalesced(gateway, credential, code))
            .await
    }

    /// Resolve a customer by code, creating it from billing info if absent.
    pub async fn resolve_customer(
        &self,
        credential: &RemoteCredential,
        code: &str,
        billing: &BillingInfo,
    ) -> Result<ResolvedEntity> {
        let key = format!("{}:{}", EntityKind::Customer, code);
        let gateway = Arc::clone(&self.gateway);
        let credential = credential.clone();
        let code = code.to_owned();
        let billing = billing.clone();
        self.coalescer
            .run(&key, move || resolve_customer_uncoalesced(gateway, credential, code, billing))
            .await
    }
}

async fn resolve_item_uncoalesced(
    gateway: Arc<dyn ErpGateway>,
    credential: RemoteCredential,
    code: String,
) -> Result<ResolvedEntity> {
    match gateway.find_item_by_code(&credential, &code).await {
        Ok(Some(item)) => {
            debug!(%code, item_id = %item.id, "item resolved via point query");
            return Ok(resolved_from_item(item));
        }
        Ok(None) => debug!(%code, "item missing via point query, scanning catalog"),
        Err(err) if err.is_transient() => {
            warn!(%code, error = %err, "item point query failed, scanning catalog");
        }
        Err(err) => return Err(err),
    }

    let catalog = gateway.list_items(&credential).await?;
    debug!(%code, catalog_size = catalog.len(), "scanning catalog for exact code match");
    catalog
        .into_iter()
        .find(|item| item.code == code)
        .map(resolved_from_item)
        .ok_or_else(|| {
            OrderBridgeError::NotFound(format!(
                "item {code} not found via point query or catalog scan"
            ))
        })
}

async fn resolve_customer_uncoalesced(
    gateway: Arc<dyn ErpGateway>,
    credential: RemoteCredential,
    code: String,
    billing: BillingInfo,
) -> Result<ResolvedEntity> {
    match gateway.find_customer_by_code(&credential, &code).await {
        Ok(Some(customer)) => {
            debug!(%code, customer_id = %customer.id, "customer resolved via point query");
            return Ok(resolved_customer(customer, &code, &billing));
        }
        Ok(None) => debug!(%code, "customer missing, creating"),
        Err(err) if err.is_transient() => {
            warn!(%code, error = %err, "customer point query failed, attempting creation");
        }
        Err(err) => return Err(err),
    }

    let draft = CustomerDraft {
        name: billing.full_name(),
        code: code.clone(),
        street: billing.street.clone(),
        postal_code: billing.postal_code.clone(),
        city: billing.city.clone(),
        country_name: billing.country_name.clone(),
        email: billing.email.clone(),
        phone: billing.phone.clone(),
    };

    let (customer, newly_created) = match gateway.create_customer(&credential, &draft).await {
        Ok(Some(customer)) => (customer, true),
        Ok(None) => {
            // Created, but the remote did not echo the identifier.
            debug!(%code, "customer created without identifier, re-fetching by code");
            let customer =
                gateway.find_customer_by_code(&credential, &code).await?.ok_or_else(|| {
                    OrderBridgeError::NotFound(format!(
                        "customer {code} not visible after creation"
                    ))
                })?;
            (customer, true)
        }
        Err(OrderBridgeError::Conflict(detail)) => {
            // Another caller won the creation race; the entity exists now.
            debug!(%code, %detail, "customer already exists, fetching by code");
            let customer =
                gateway.find_customer_by_code(&credential, &code).await?.ok_or_else(|| {
                    OrderBridgeError::NotFound(format!(
                        "customer {code} conflicted on creation but is absent on lookup"
                    ))
                })?;
            (customer, false)
        }
        Err(err) => return Err(err),
    };

    if newly_created {
        attach_default_contact(&gateway, &credential, &customer, &code, &billing);
    }

    Ok(resolved_customer(customer, &code, &billing))
}

/// Attach a contact record to a just-created customer as a detached
/// best-effort task. Failure is logged, never joined into the resolution.
fn attach_default_contact(
    gateway: &Arc<dyn ErpGateway>,
    credential: &RemoteCredential,
    customer: &CustomerRecord,
    code: &str,
    billing: &BillingInfo,
) {
    let full_name = billing.full_name();
    let contact = ContactCard {
        full_name: if full_name.is_empty() { code.to_owned() } else { full_name },
        email: billing.email.clone(),
        phone: billing.phone.clone(),
    };
    let gateway = Arc::clone(gateway);
    let credential = credential.clone();
    let customer_id = customer.id.clone();
    tokio::spawn(async move {
        match gateway.add_customer_contact(&credential, &customer_id, &contact).await {
            Ok(()) => debug!(customer_id = %customer_id, "contact attached to customer"),
            Err(err) => {
                warn!(customer_id = %customer_id, error = %err, "failed to attach customer contact");
            }
        }
    });
}

fn resolved_from_item(item: ItemRecord) -> ResolvedEntity {
    ResolvedEntity {
        remote_id: item.id,
        display_name: item.name.unwrap_or_default(),
        unit_of_measure: item
            .unit_of_measure
            .unwrap_or_else(|| DEFAULT_UNIT_OF_MEASURE.to_string()),
        price: item.price.unwrap_or(0.0),
        code: item.code,
    }
}

fn resolved_customer(
    customer: CustomerRecord,
    code: &str,
    billing: &BillingInfo,
) -> ResolvedEntity {
    ResolvedEntity {
        remote_id: customer.id,
        code: code.to_owned(),
        display_name: billing.full_name(),
        unit_of_measure: DEFAULT_UNIT_OF_MEASURE.to_string(),
        price: 0.0,
    }
}
