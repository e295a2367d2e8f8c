//! Entity resolver and reconciliation poller tests
//!
//! Covers the item fast path and catalog-scan fallback, the customer
//! create-or-race flow, best-effort contact attachment, and the poller's
//! bounded schedule.

mod support;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use orderbridge_core::erp_ports::ErpGateway;
use orderbridge_core::poll::{PollConfig, ReconciliationPoller};
use orderbridge_core::resolve::EntityResolver;
use orderbridge_domain::{BillingInfo, OrderBridgeError};
use support::{item, test_credential, MockGateway};

fn billing() -> BillingInfo {
    BillingInfo {
        first_name: "Ana".to_string(),
        last_name: "Petrov".to_string(),
        street: "Main Street 5".to_string(),
        postal_code: "11000".to_string(),
        city: "Belgrade".to_string(),
        country_name: Some("Serbia".to_string()),
        email: Some("ana@example.com".to_string()),
        phone: Some("+381 11 555 0101".to_string()),
    }
}

fn resolver_over(gateway: &Arc<MockGateway>) -> EntityResolver {
    let gateway: Arc<dyn ErpGateway> = gateway.clone();
    EntityResolver::new(gateway)
}

#[tokio::test]
async fn item_resolves_via_point_query() {
    let gateway = Arc::new(MockGateway::new());
    gateway.seed_item(item("I1", "ABC-1", "Capo"));

    let resolver = resolver_over(&gateway);
    let entity = resolver.resolve_item(&test_credential(), "ABC-1").await.unwrap();

    assert_eq!(entity.remote_id, "I1");
    assert_eq!(entity.code, "ABC-1");
    assert_eq!(entity.display_name, "Capo");
    assert_eq!(entity.unit_of_measure, "pcs");
    assert_eq!(gateway.calls.list_items.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn item_without_unit_of_measure_gets_default() {
    let gateway = Arc::new(MockGateway::new());
    let mut bare = item("I2", "XYZ-2", "Strap");
    bare.unit_of_measure = None;
    bare.price = None;
    gateway.seed_item(bare);

    let resolver = resolver_over(&gateway);
    let entity = resolver.resolve_item(&test_credential(), "XYZ-2").await.unwrap();

    assert_eq!(entity.unit_of_measure, "unit");
    assert_eq!(entity.price, 0.0);
}

#[tokio::test]
async fn item_falls_back_to_catalog_scan() {
    let gateway = Arc::new(MockGateway::new());
    gateway.seed_catalog_only(item("I3", "DEF-3", "Tuner"));

    let resolver = resolver_over(&gateway);
    let entity = resolver.resolve_item(&test_credential(), "DEF-3").await.unwrap();

    assert_eq!(entity.remote_id, "I3");
    assert_eq!(gateway.calls.find_item.load(Ordering::SeqCst), 1);
    assert_eq!(gateway.calls.list_items.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn missing_item_is_not_found() {
    let gateway = Arc::new(MockGateway::new());

    let resolver = resolver_over(&gateway);
    let err = resolver.resolve_item(&test_credential(), "GHOST-9").await.unwrap_err();

    assert!(matches!(err, OrderBridgeError::NotFound(_)));
    assert!(err.to_string().contains("GHOST-9"));
    assert_eq!(gateway.calls.list_items.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn rate_limited_point_query_falls_back_to_scan() {
    let gateway = Arc::new(MockGateway::new());
    gateway.seed_catalog_only(item("I4", "JKL-4", "Stand"));
    gateway
        .item_lookup_script
        .lock()
        .push_back(Err(OrderBridgeError::RateLimited("HTTP 429".to_string())));

    let resolver = resolver_over(&gateway);
    let entity = resolver.resolve_item(&test_credential(), "JKL-4").await.unwrap();

    assert_eq!(entity.remote_id, "I4");
    // The transport layer already retried the point query; the resolver
    // moves straight to the scan rather than looping.
    assert_eq!(gateway.calls.find_item.load(Ordering::SeqCst), 1);
    assert_eq!(gateway.calls.list_items.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn auth_failure_propagates_without_scan() {
    let gateway = Arc::new(MockGateway::new());
    gateway.seed_catalog_only(item("I5", "MNO-5", "Pick"));
    gateway
        .item_lookup_script
        .lock()
        .push_back(Err(OrderBridgeError::Auth("HTTP 401: token expired".to_string())));

    let resolver = resolver_over(&gateway);
    let err = resolver.resolve_item(&test_credential(), "MNO-5").await.unwrap_err();

    assert!(matches!(err, OrderBridgeError::Auth(_)));
    assert_eq!(gateway.calls.list_items.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn customer_missing_is_created_with_contact() {
    let gateway = Arc::new(MockGateway::new());

    let resolver = resolver_over(&gateway);
    let entity =
        resolver.resolve_customer(&test_credential(), "SHOP_1001", &billing()).await.unwrap();

    assert_eq!(entity.remote_id, "C1");
    assert_eq!(entity.display_name, "Ana Petrov");
    assert_eq!(gateway.calls.create_customer.load(Ordering::SeqCst), 1);

    // Contact attachment is detached; give it a beat to land.
    tokio::time::sleep(Duration::from_millis(20)).await;
    let contacts = gateway.contacts.lock();
    assert_eq!(contacts.len(), 1);
    assert_eq!(contacts[0].0, "C1");
    assert_eq!(contacts[0].1.full_name, "Ana Petrov");
}

#[tokio::test]
async fn customer_creation_race_falls_back_to_lookup() {
    let gateway = Arc::new(MockGateway::new());
    // First lookup misses; the conflicting creation reveals a concurrent
    // winner whose record the second lookup returns.
    gateway.seed_customer("SHOP_1002", "C7");
    gateway.customer_lookup_script.lock().push_back(Ok(None));
    gateway
        .customer_create_script
        .lock()
        .push_back(Err(OrderBridgeError::Conflict("HTTP 409: duplicate code".to_string())));

    let resolver = resolver_over(&gateway);
    let entity =
        resolver.resolve_customer(&test_credential(), "SHOP_1002", &billing()).await.unwrap();

    assert_eq!(entity.remote_id, "C7");
    assert_eq!(gateway.calls.create_customer.load(Ordering::SeqCst), 1);
    assert_eq!(gateway.calls.find_customer.load(Ordering::SeqCst), 2);

    // The losing side must not attach a second contact.
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(gateway.calls.add_contact.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn customer_created_without_id_echo_is_refetched() {
    let gateway = Arc::new(MockGateway::new());
    gateway.seed_customer("SHOP_1003", "C9");
    gateway.customer_lookup_script.lock().push_back(Ok(None));
    gateway.customer_create_script.lock().push_back(Ok(None));

    let resolver = resolver_over(&gateway);
    let entity =
        resolver.resolve_customer(&test_credential(), "SHOP_1003", &billing()).await.unwrap();

    assert_eq!(entity.remote_id, "C9");
    assert_eq!(gateway.calls.find_customer.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn contact_attachment_failure_does_not_fail_resolution() {
    let gateway = Arc::new(MockGateway::new());
    gateway.contact_should_fail.store(true, Ordering::SeqCst);

    let resolver = resolver_over(&gateway);
    let entity =
        resolver.resolve_customer(&test_credential(), "SHOP_1004", &billing()).await.unwrap();

    assert_eq!(entity.remote_id, "C1");
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(gateway.calls.add_contact.load(Ordering::SeqCst), 1);
    assert!(gateway.contacts.lock().is_empty());
}

#[tokio::test]
async fn existing_customer_skips_creation() {
    let gateway = Arc::new(MockGateway::new());
    gateway.seed_customer("SHOP_1005", "C3");

    let resolver = resolver_over(&gateway);
    let entity =
        resolver.resolve_customer(&test_credential(), "SHOP_1005", &billing()).await.unwrap();

    assert_eq!(entity.remote_id, "C3");
    assert_eq!(gateway.calls.create_customer.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn poller_stops_at_first_match() {
    let gateway = Arc::new(MockGateway::new());
    gateway.order_visible_after(2, "O7", "#2001");

    let gateway_port: Arc<dyn ErpGateway> = gateway.clone();
    let poller = ReconciliationPoller::new(gateway_port, PollConfig::default());
    let started = tokio::time::Instant::now();
    let found = poller.poll_for_order(&test_credential(), "#2001").await;

    assert_eq!(found.map(|order| order.id), Some("O7".to_string()));
    assert_eq!(gateway.calls.find_order.load(Ordering::SeqCst), 2);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(4));
    assert!(elapsed < Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn exhausted_poller_returns_none_after_full_schedule() {
    let gateway = Arc::new(MockGateway::new());

    let gateway_port: Arc<dyn ErpGateway> = gateway.clone();
    let poller = ReconciliationPoller::new(gateway_port, PollConfig::default());
    let started = tokio::time::Instant::now();
    let found = poller.poll_for_order(&test_credential(), "#2002").await;

    assert!(found.is_none());
    // Three regular attempts plus the final long-delay attempt.
    assert_eq!(gateway.calls.find_order.load(Ordering::SeqCst), 4);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(11));
    assert!(elapsed < Duration::from_secs(12));
}

#[tokio::test(start_paused = true)]
async fn transient_poll_errors_count_as_misses() {
    let gateway = Arc::new(MockGateway::new());
    gateway
        .order_lookup_script
        .lock()
        .push_back(Err(OrderBridgeError::Network("connection reset".to_string())));
    gateway.order_visible_after(2, "O4", "#2003");

    let gateway_port: Arc<dyn ErpGateway> = gateway.clone();
    let poller = ReconciliationPoller::new(gateway_port, PollConfig::default());
    let found = poller.poll_for_order(&test_credential(), "#2003").await;

    assert_eq!(found.map(|order| order.id), Some("O4".to_string()));
}
