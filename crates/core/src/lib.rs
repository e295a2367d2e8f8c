//! # OrderBridge Core
//!
//! The idempotent upsert engine - no infrastructure dependencies.
//!
//! This crate contains:
//! - The `ErpGateway` port consumed by the engine
//! - The request coalescer, entity resolver and reconciliation poller
//! - The order upsert state machine
//!
//! ## Architecture Principles
//! - Only depends on `orderbridge-domain`
//! - No HTTP or platform code; all remote access via the gateway trait
//! - Pure, testable sync logic

pub mod coalesce;
pub mod erp_ports;
pub mod poll;
pub mod resolve;
pub mod upsert;

// Re-export specific items to avoid ambiguity
pub use coalesce::RequestCoalescer;
pub use erp_ports::{
    ContactCard, CreateOrderReply, CustomerDraft, CustomerRecord, ErpGateway, ItemRecord,
    OrderDocument, OrderRecord, OrderRow,
};
pub use poll::{PollConfig, ReconciliationPoller};
pub use resolve::EntityResolver;
pub use upsert::{EngineConfig, OrderSyncEngine};
