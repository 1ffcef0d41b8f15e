//! Batch processing with user-based partitioning for async event replay
//!
//! This module provides the `BatchProcessor` struct, which replays batches of
//! bankroll events concurrently while keeping each user's events in order.
//!
//! # Design
//!
//! Platforms, bets and bankroll modes all belong to a single user, so events of
//! different users never touch the same state. The processor partitions a batch
//! by user, replays each user's events sequentially in one tokio task, and runs
//! the tasks for different users in parallel.
//!
//! # Architecture
//!
//! ```text
//! BatchProcessor
//!     └── LedgerEngine<ConcurrentStore>  (shared, cheap to clone)
//! ```

use std::collections::HashMap;

use super::ConcurrentStore;
use crate::core::engine::LedgerEngine;
use crate::types::{BetEvent, LedgerError, UserId};
use tracing::{error, warn};

/// Result of processing a single event
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// The event that was processed
    pub event: BetEvent,

    /// The result of processing (success or error)
    pub result: Result<(), LedgerError>,
}

/// Batch processor with user-based partitioning
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    engine: LedgerEngine<ConcurrentStore>,
}

impl BatchProcessor {
    pub fn new(engine: LedgerEngine<ConcurrentStore>) -> Self {
        Self { engine }
    }

    /// Partition a batch of events by user
    ///
    /// # Guarantees
    ///
    /// - Each event appears in exactly one sub-batch
    /// - Events for each user keep their original order
    pub fn partition_by_user(&self, batch: Vec<BetEvent>) -> HashMap<UserId, Vec<BetEvent>> {
        let mut user_batches: HashMap<UserId, Vec<BetEvent>> = HashMap::new();

        for event in batch {
            user_batches.entry(event.user()).or_default().push(event);
        }

        user_batches
    }

    /// Process all events of a single user sequentially
    ///
    /// Failed events are logged and recorded in the results; processing carries
    /// on with the next event.
    pub async fn process_user_events(&self, events: Vec<BetEvent>) -> Vec<ProcessingResult> {
        let mut results = Vec::with_capacity(events.len());

        for event in events {
            let result = self.engine.process(event.clone());
            if let Err(e) = &result {
                warn!(user = event.user(), kind = event.kind(), error = %e, "event rejected");
            }
            results.push(ProcessingResult { event, result });
        }

        results
    }

    /// Process a batch of events with user-based partitioning
    ///
    /// Results may come back in a different order than the input, but the
    /// results of one user keep that user's order.
    pub async fn process_batch(&self, batch: Vec<BetEvent>) -> Vec<ProcessingResult> {
        let user_batches = self.partition_by_user(batch);

        let mut tasks = Vec::with_capacity(user_batches.len());
        for (_user, events) in user_batches {
            let processor = self.clone();
            tasks.push(tokio::spawn(async move {
                processor.process_user_events(events).await
            }));
        }

        let mut results = Vec::new();
        for task in tasks {
            match task.await {
                Ok(user_results) => results.extend(user_results),
                Err(e) => error!(error = ?e, "replay task panicked"),
            }
        }

        results
    }
}
