//! Idempotent order upsert
//!
//! The top-level state machine pushing one logical order into the remote
//! system exactly once: check for a pre-existing order, resolve every
//! entity the document needs, submit under an idempotency token, and
//! reconcile ambiguous outcomes by re-querying. Submission is coalesced by
//! external reference so concurrent callers for the same order share a
//! single remote creation.

use std::sync::Arc;
use std::time::Duration;

use orderbridge_domain::{
    LogicalOrder, OrderBridgeError, RemoteCredential, Result, SyncConfig, UpsertOutcome,
};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::coalesce::RequestCoalescer;
use crate::erp_ports::{CreateOrderReply, ErpGateway, OrderDocument, OrderRow};
use crate::poll::{PollConfig, ReconciliationPoller};
use crate::resolve::EntityResolver;

/// Engine tuning knobs.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub poll: PollConfig,
    /// Fixed delay before the single retry of a rate-limited submission.
    pub rate_limit_retry_delay: Duration,
    /// Prefix for customer codes derived from order references.
    pub customer_code_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll: PollConfig::default(),
            rate_limit_retry_delay: Duration::from_secs(2),
            customer_code_prefix: "SHOP".to_string(),
        }
    }
}

impl From<&SyncConfig> for EngineConfig {
    fn from(sync: &SyncConfig) -> Self {
        Self {
            poll: PollConfig {
                max_attempts: sync.poll_attempts,
                delay: Duration::from_secs(sync.poll_delay_seconds),
                final_delay: Duration::from_secs(sync.poll_final_delay_seconds),
            },
            rate_limit_retry_delay: Duration::from_secs(sync.rate_limit_delay_seconds),
            customer_code_prefix: sync.customer_code_prefix.clone(),
        }
    }
}

/// Pushes logical orders into the remote system exactly once.
pub struct OrderSyncEngine {
    gateway: Arc<dyn ErpGateway>,
    resolver: EntityResolver,
    poller: ReconciliationPoller,
    submissions: RequestCoalescer<UpsertOutcome>,
    config: EngineConfig,
}

impl OrderSyncEngine {
    pub fn new(gateway: Arc<dyn ErpGateway>, config: EngineConfig) -> Self {
        let resolver = EntityResolver::new(Arc::clone(&gateway));
        let poller = ReconciliationPoller::new(Arc::clone(&gateway), config.poll.clone());
        Self { gateway, resolver, poller, submissions: RequestCoalescer::new(), config }
    }

    /// Upsert one logical order.
    ///
    /// Returns the remote order identifier and whether this call created
    /// it. Hard failures carry the external reference for traceability.
    #[instrument(skip_all, fields(reference = %order.external_reference))]
    pub async fn upsert_order(
        &self,
        credential: &RemoteCredential,
        order: &LogicalOrder,
    ) -> Result<UpsertOutcome> {
        validate(order)?;
        let reference = order.external_reference.as_str();

        // Advisory pre-check: an explicit match is always trusted, a failed
        // query is treated as "no match found" and the flow proceeds to
        // creation.
        match self.gateway.find_order_by_reference(credential, reference).await {
            Ok(Some(existing)) => {
                info!(order_id = %existing.id, "order already exists, skipping submission");
                return Ok(UpsertOutcome { remote_order_id: existing.id, created: false });
            }
            Ok(None) => debug!("no existing order found"),
            Err(err) => {
                warn!(error = %err, "existing-order check failed, proceeding to creation");
            }
        }

        let document = self.build_document(credential, order).await?;

        let gateway = Arc::clone(&self.gateway);
        let poller = self.poller.clone();
        let credential = credential.clone();
        let retry_delay = self.config.rate_limit_retry_delay;
        self.submissions
            .run(reference, move || {
                submit_and_reconcile(gateway, poller, credential, document, retry_delay)
            })
            .await
    }

    /// Resolve the customer and every line item, then assemble the
    /// creation payload. Any resolution failure aborts the whole upsert -
    /// partial orders are never submitted.
    async fn build_document(
        &self,
        credential: &RemoteCredential,
        order: &LogicalOrder,
    ) -> Result<OrderDocument> {
        let customer_code =
            customer_code(&self.config.customer_code_prefix, &order.external_reference);
        let customer =
            self.resolver.resolve_customer(credential, &customer_code, &order.billing).await?;

        let mut rows = Vec::with_capacity(order.line_items.len());
        for line in &order.line_items {
            let item = self.resolver.resolve_item(credential, &line.sku).await?;
            rows.push(OrderRow {
                item_id: item.remote_id,
                item_code: item.code,
                item_name: item.display_name,
                quantity: line.quantity,
                unit_price: line.unit_price,
                unit_of_measure: item.unit_of_measure,
            });
        }

        Ok(OrderDocument {
            reference: order.external_reference.clone(),
            issue_date: order.created_at,
            due_date: order.created_at,
            customer_id: customer.remote_id,
            customer_name: order.billing.full_name(),
            customer_address: order.billing.street.clone(),
            customer_postal_code: order.billing.postal_code.clone(),
            customer_city: order.billing.city.clone(),
            customer_country_name: order.billing.country_name.clone(),
            currency: order.currency.clone(),
            rows,
            note: Some(format!("Order {} from the storefront", order.external_reference)),
        })
    }
}

/// Submit the document and reconcile whatever the remote answers.
///
/// Runs inside the submission coalescer; at most one execution per
/// reference is in flight process-wide.
async fn submit_and_reconcile(
    gateway: Arc<dyn ErpGateway>,
    poller: ReconciliationPoller,
    credential: RemoteCredential,
    document: OrderDocument,
    rate_limit_retry_delay: Duration,
) -> Result<UpsertOutcome> {
    let reference = document.reference.clone();
    // One capped retry of the whole submission step on a rate-limit signal;
    // bounded counter, never recursion.
    let mut rate_limit_budget = 1u32;

    loop {
        let idempotency_token = Uuid::new_v4().to_string();
        debug!(%reference, %idempotency_token, "submitting order document");

        match gateway.create_order(&credential, &document, &idempotency_token).await {
            Ok(CreateOrderReply::Confirmed { order_id }) => {
                info!(%reference, %order_id, "order created");
                return Ok(UpsertOutcome { remote_order_id: order_id, created: true });
            }
            Ok(CreateOrderReply::Accepted) => {
                info!(%reference, "creation accepted without identifier, reconciling");
                return match poller.poll_for_order(&credential, &reference).await {
                    Some(order) => {
                        Ok(UpsertOutcome { remote_order_id: order.id, created: true })
                    }
                    None => Err(OrderBridgeError::Ambiguous(format!(
                        "order {reference} was accepted by the remote but never surfaced \
                         during reconciliation"
                    ))),
                };
            }
            Err(OrderBridgeError::Conflict(detail)) => {
                // Another path already created the order; find it.
                debug!(%reference, %detail, "duplicate order signal, re-querying");
                if let Ok(Some(order)) =
                    gateway.find_order_by_reference(&credential, &reference).await
                {
                    return Ok(UpsertOutcome { remote_order_id: order.id, created: false });
                }
                return match poller.poll_for_order(&credential, &reference).await {
                    Some(order) => {
                        Ok(UpsertOutcome { remote_order_id: order.id, created: false })
                    }
                    None => Err(OrderBridgeError::Internal(format!(
                        "order {reference} conflicted on creation but is absent on re-query"
                    ))),
                };
            }
            Err(OrderBridgeError::RateLimited(detail)) if rate_limit_budget > 0 => {
                rate_limit_budget -= 1;
                warn!(%reference, %detail, "submission rate limited, retrying once");
                tokio::time::sleep(rate_limit_retry_delay).await;
            }
            Err(err) => {
                // The remote may have applied a request the client perceived
                // as failed; one final re-query before declaring failure.
                warn!(%reference, error = %err, "submission failed, making final re-query");
                if let Ok(Some(order)) =
                    gateway.find_order_by_reference(&credential, &reference).await
                {
                    info!(%reference, order_id = %order.id, "order exists despite failed submission");
                    return Ok(UpsertOutcome { remote_order_id: order.id, created: true });
                }
                return Err(OrderBridgeError::Internal(format!(
                    "order {reference}: submission failed: {err}"
                )));
            }
        }
    }
}

fn customer_code(prefix: &str, external_reference: &str) -> String {
    format!("{}_{}", prefix, external_reference.trim_start_matches('#'))
}

fn validate(order: &LogicalOrder) -> Result<()> {
    if order.external_reference.trim().is_empty() {
        return Err(OrderBridgeError::InvalidInput(
            "order is missing an external reference".to_string(),
        ));
    }
    if order.line_items.is_empty() {
        return Err(OrderBridgeError::InvalidInput(format!(
            "order {} has no line items",
            order.external_reference
        )));
    }
    for line in &order.line_items {
        if line.sku.trim().is_empty() {
            return Err(OrderBridgeError::InvalidInput(format!(
                "order {} has a line item without a sku",
                order.external_reference
            )));
        }
        if line.quantity == 0 {
            return Err(OrderBridgeError::InvalidInput(format!(
                "order {}: line item {} has zero quantity",
                order.external_reference, line.sku
            )));
        }
        if line.unit_price < 0.0 {
            return Err(OrderBridgeError::InvalidInput(format!(
                "order {}: line item {} has a negative unit price",
                order.external_reference, line.sku
            )));
        }
    }
    Ok(())
}
