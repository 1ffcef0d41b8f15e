//! Core business logic module
//!
//! This module contains the settlement components:
//! - `traits` - Storage seams (`LedgerStore`, `BetStore`)
//! - `store` - Mutex-backed in-memory store
//! - `policy` - Pure settlement policy (which ledger entries a bet must carry)
//! - `reversal` - Reverse-then-reapply ledger engine
//! - `bet_service` - Create, update and manual-result operations
//! - `collaborators` - Notification, audit, quota and enrichment capabilities
//! - `engine` - Event replay over the bet service
//! - `async` - DashMap-backed store and batch processor

pub mod r#async;
pub mod bet_service;
pub mod collaborators;
pub mod engine;
pub mod policy;
pub mod reversal;
pub mod store;
pub mod traits;

pub use bet_service::BetService;
pub use collaborators::{
    AuditSink, BetEnricher, BetQuota, Collaborators, FixedQuota, Notifier, QuotaPolicy, Severity,
};
pub use engine::{LedgerEngine, PlatformReport};
pub use policy::LedgerInstruction;
pub use r#async::{BatchProcessor, ConcurrentStore};
pub use reversal::{LedgerOutcome, LedgerReceipt, LedgerRequest, ReversalEngine, SkipReason};
pub use store::InMemoryStore;
pub use traits::{BetStore, LedgerStore, PlatformRef};
