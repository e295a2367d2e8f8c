//! Reconciliation polling
//!
//! Used when an order-creation response does not unambiguously confirm the
//! outcome: the remote is eventually consistent and a just-created order can
//! take a few seconds to surface in reference queries.

use std::sync::Arc;
use std::time::Duration;

use orderbridge_domain::RemoteCredential;
use tracing::{debug, info, warn};

use crate::erp_ports::{ErpGateway, OrderRecord};

/// Reconciliation schedule.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Re-queries before the final long-delay attempt.
    pub max_attempts: u32,
    /// Delay preceding each regular re-query.
    pub delay: Duration,
    /// Delay preceding the one extra attempt after the regular ones missed.
    pub final_delay: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
            final_delay: Duration::from_secs(5),
        }
    }
}

/// Re-queries the remote system for a just-submitted order.
#[derive(Clone)]
pub struct ReconciliationPoller {
    gateway: Arc<dyn ErpGateway>,
    config: PollConfig,
}

impl ReconciliationPoller {
    pub fn new(gateway: Arc<dyn ErpGateway>, config: PollConfig) -> Self {
        Self { gateway, config }
    }

    /// Poll for an order by reference until it surfaces or the schedule is
    /// exhausted.
    ///
    /// Transient query failures count as misses; the caller decides whether
    /// absence after exhaustion is a hard failure.
    pub async fn poll_for_order(
        &self,
        credential: &RemoteCredential,
        reference: &str,
    ) -> Option<OrderRecord> {
        for attempt in 1..=self.config.max_attempts {
            tokio::time::sleep(self.config.delay).await;
            if let Some(order) = self.query(credential, reference, attempt).await {
                return Some(order);
            }
        }

        debug!(reference, "regular reconciliation attempts exhausted, one final attempt");
        tokio::time::sleep(self.config.final_delay).await;
        self.query(credential, reference, self.config.max_attempts + 1).await
    }

    async fn query(
        &self,
        credential: &RemoteCredential,
        reference: &str,
        attempt: u32,
    ) -> Option<OrderRecord> {
        match self.gateway.find_order_by_reference(credential, reference).await {
            Ok(Some(order)) => {
                info!(reference, attempt, order_id = %order.id, "order surfaced during reconciliation");
                Some(order)
            }
            Ok(None) => {
                debug!(reference, attempt, "order not visible yet");
                None
            }
            Err(err) => {
                warn!(reference, attempt, error = %err, "reconciliation query failed, treating as miss");
                None
            }
        }
    }
}
