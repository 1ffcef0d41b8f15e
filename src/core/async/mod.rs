//! Concurrent implementations of core components
//!
//! This module provides the thread-safe store and the batch processor used by
//! the async replay strategy.
//!
//! # Architecture
//!
//! - **ConcurrentStore**: DashMap-backed `LedgerStore` + `BetStore` with one
//!   lock per platform book
//! - **BatchProcessor**: Partitions replayed events by user and runs users in
//!   parallel tokio tasks
//!
//! # Thread Safety
//!
//! - Ledger writes on different platforms proceed in parallel
//! - Ledger writes on the same platform are serialized
//! - No global locks

pub mod batch_processor;
pub mod concurrent_store;

pub use batch_processor::{BatchProcessor, ProcessingResult};
pub use concurrent_store::ConcurrentStore;
