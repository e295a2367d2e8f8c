//! Scripted in-memory gateway for engine tests
//!
//! Provides a deterministic `ErpGateway` implementation with per-method
//! call counters and scriptable replies, enabling state-machine tests
//! without network dependencies.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use orderbridge_core::erp_ports::{
    ContactCard, CreateOrderReply, CustomerDraft, CustomerRecord, ErpGateway, ItemRecord,
    OrderDocument, OrderRecord,
};
use orderbridge_domain::{RemoteCredential, Result};
use parking_lot::Mutex;

/// An order that becomes visible to reference queries only after a number
/// of lookups, simulating the remote's eventual consistency.
pub struct PendingOrder {
    pub visible_after_queries: usize,
    pub order: OrderRecord,
}

/// Per-method call counters.
#[derive(Default)]
pub struct CallCounts {
    pub find_item: AtomicUsize,
    pub list_items: AtomicUsize,
    pub find_customer: AtomicUsize,
    pub create_customer: AtomicUsize,
    pub add_contact: AtomicUsize,
    pub find_order: AtomicUsize,
    pub create_order: AtomicUsize,
}

/// Deterministic in-memory `ErpGateway`.
///
/// Scripted queues take precedence over the backing state; when a queue is
/// empty the call falls through to the state maps. Unscripted creations
/// succeed with generated identifiers and are recorded, so later queries
/// observe them.
#[derive(Default)]
pub struct MockGateway {
    pub direct_items: Mutex<HashMap<String, ItemRecord>>,
    pub catalog: Mutex<Vec<ItemRecord>>,
    pub customers: Mutex<HashMap<String, CustomerRecord>>,
    pub orders: Mutex<Vec<OrderRecord>>,
    pub contacts: Mutex<Vec<(String, ContactCard)>>,

    pub item_lookup_script: Mutex<VecDeque<Result<Option<ItemRecord>>>>,
    pub customer_lookup_script: Mutex<VecDeque<Result<Option<CustomerRecord>>>>,
    pub customer_create_script: Mutex<VecDeque<Result<Option<CustomerRecord>>>>,
    pub order_lookup_script: Mutex<VecDeque<Result<Option<OrderRecord>>>>,
    pub create_order_script: Mutex<VecDeque<Result<CreateOrderReply>>>,

    pub pending_order: Mutex<Option<PendingOrder>>,
    pub create_order_delay: Mutex<Option<Duration>>,
    pub contact_should_fail: AtomicBool,

    pub calls: CallCounts,
    next_id: AtomicUsize,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_item(&self, item: ItemRecord) {
        self.direct_items.lock().insert(item.code.clone(), item.clone());
        self.catalog.lock().push(item);
    }

    pub fn seed_catalog_only(&self, item: ItemRecord) {
        self.catalog.lock().push(item);
    }

    pub fn seed_customer(&self, code: &str, id: &str) {
        self.customers.lock().insert(code.to_string(), CustomerRecord { id: id.to_string() });
    }

    pub fn seed_order(&self, id: &str, reference: &str) {
        self.orders.lock().push(OrderRecord {
            id: id.to_string(),
            reference: Some(reference.to_string()),
        });
    }

    pub fn order_visible_after(&self, queries: usize, id: &str, reference: &str) {
        *self.pending_order.lock() = Some(PendingOrder {
            visible_after_queries: queries,
            order: OrderRecord { id: id.to_string(), reference: Some(reference.to_string()) },
        });
    }

    fn generated_id(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[async_trait]
impl ErpGateway for MockGateway {
    async fn find_item_by_code(
        &self,
        _credential: &RemoteCredential,
        code: &str,
    ) -> Result<Option<ItemRecord>> {
        self.calls.find_item.fetch_add(1, Ordering::SeqCst);
        if let Some(scripted) = self.item_lookup_script.lock().pop_front() {
            return scripted;
        }
        Ok(self.direct_items.lock().get(code).cloned())
    }

    async fn list_items(&self, _credential: &RemoteCredential) -> Result<Vec<ItemRecord>> {
        self.calls.list_items.fetch_add(1, Ordering::SeqCst);
        Ok(self.catalog.lock().clone())
    }

    async fn find_customer_by_code(
        &self,
        _credential: &RemoteCredential,
        code: &str,
    ) -> Result<Option<CustomerRecord>> {
        self.calls.find_customer.fetch_add(1, Ordering::SeqCst);
        if let Some(scripted) = self.customer_lookup_script.lock().pop_front() {
            return scripted;
        }
        Ok(self.customers.lock().get(code).cloned())
    }

    async fn create_customer(
        &self,
        _credential: &RemoteCredential,
        draft: &CustomerDraft,
    ) -> Result<Option<CustomerRecord>> {
        self.calls.create_customer.fetch_add(1, Ordering::SeqCst);
        if let Some(scripted) = self.customer_create_script.lock().pop_front() {
            return scripted;
        }
        let record = CustomerRecord { id: self.generated_id("C") };
        self.customers.lock().insert(draft.code.clone(), record.clone());
        Ok(Some(record))
    }

    async fn add_customer_contact(
        &self,
        _credential: &RemoteCredential,
        customer_id: &str,
        contact: &ContactCard,
    ) -> Result<()> {
        self.calls.add_contact.fetch_add(1, Ordering::SeqCst);
        if self.contact_should_fail.load(Ordering::SeqCst) {
            return Err(orderbridge_domain::OrderBridgeError::Remote(
                "HTTP 500: contact endpoint unavailable".to_string(),
            ));
        }
        self.contacts.lock().push((customer_id.to_string(), contact.clone()));
        Ok(())
    }

    async fn find_order_by_reference(
        &self,
        _credential: &RemoteCredential,
        reference: &str,
    ) -> Result<Option<OrderRecord>> {
        let query_number = self.calls.find_order.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(scripted) = self.order_lookup_script.lock().pop_front() {
            return scripted;
        }
        let known = self
            .orders
            .lock()
            .iter()
            .find(|order| order.reference.as_deref() == Some(reference))
            .cloned();
        if known.is_some() {
            return Ok(known);
        }
        if let Some(pending) = self.pending_order.lock().as_ref() {
            if pending.order.reference.as_deref() == Some(reference)
                && query_number >= pending.visible_after_queries
            {
                return Ok(Some(pending.order.clone()));
            }
        }
        Ok(None)
    }

    async fn create_order(
        &self,
        _credential: &RemoteCredential,
        document: &OrderDocument,
        _idempotency_token: &str,
    ) -> Result<CreateOrderReply> {
        self.calls.create_order.fetch_add(1, Ordering::SeqCst);
        let delay = *self.create_order_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(scripted) = self.create_order_script.lock().pop_front() {
            return scripted;
        }
        let order_id = self.generated_id("R");
        self.orders.lock().push(OrderRecord {
            id: order_id.clone(),
            reference: Some(document.reference.clone()),
        });
        Ok(CreateOrderReply::Confirmed { order_id })
    }
}

/// A throwaway credential for tests.
pub fn test_credential() -> RemoteCredential {
    RemoteCredential::new("test-token")
}

/// An `ItemRecord` with all optional attributes present.
pub fn item(id: &str, code: &str, name: &str) -> ItemRecord {
    ItemRecord {
        id: id.to_string(),
        code: code.to_string(),
        name: Some(name.to_string()),
        unit_of_measure: Some("pcs".to_string()),
        price: Some(1500.0),
    }
}
