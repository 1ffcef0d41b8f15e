//! Asynchronous batch processing strategy
//!
//! This module provides a multi-threaded implementation of the
//! ProcessingStrategy trait. Events are read in batches and each batch is
//! partitioned by user and replayed in parallel.
//!
//! # Architecture
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── BatchConfig (batch_size, max_concurrent_batches)
//!     ├── EngineConfig (default_mode, max_bets_per_month)
//!     ├── AsyncReader (batch CSV reading)
//!     ├── BatchProcessor (user partitioning + tokio tasks)
//!     └── LedgerEngine<ConcurrentStore> (DashMap-backed state)
//! ```
//!
//! # Ordering
//!
//! - Batches are processed one after the other, so a user's events that span
//!   several batches still run in file order
//! - Within a batch, different users run in parallel
//! - Platform writes are serialized per platform by the store

use crate::core::engine::LedgerEngine;
use crate::core::r#async::{BatchProcessor, ConcurrentStore};
use crate::io::async_reader::AsyncReader;
use crate::io::csv_format::write_platforms_csv;
use crate::strategy::{EngineConfig, ProcessingStrategy};
use crate::types::LedgerError;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Configuration for batch processing
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchConfig {
    /// Number of events per batch
    pub batch_size: usize,
    /// Number of runtime worker threads
    pub max_concurrent_batches: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent_batches: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a BatchConfig; zero values fall back to the defaults
    pub fn new(batch_size: usize, max_concurrent_batches: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                batch_size,
                default = default.batch_size,
                "invalid batch size, using default"
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent_batches = if max_concurrent_batches == 0 {
            warn!(
                max_concurrent_batches,
                default = default.max_concurrent_batches,
                "invalid concurrency, using default"
            );
            default.max_concurrent_batches
        } else {
            max_concurrent_batches
        };

        Self {
            batch_size,
            max_concurrent_batches,
        }
    }
}

/// Asynchronous batch processing strategy
#[derive(Debug, Clone)]
pub struct AsyncProcessingStrategy {
    batch: BatchConfig,
    engine: EngineConfig,
}

impl AsyncProcessingStrategy {
    pub fn new(batch: BatchConfig, engine: EngineConfig) -> Self {
        Self { batch, engine }
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), LedgerError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.batch.max_concurrent_batches)
            .build()
            .map_err(|e| LedgerError::IoError {
                message: format!("Failed to create tokio runtime: {}", e),
            })?;

        runtime.block_on(async {
            let store = Arc::new(ConcurrentStore::with_default_mode(self.engine.default_mode));
            let engine = LedgerEngine::with_collaborators(store, self.engine.collaborators());
            let processor = BatchProcessor::new(engine.clone());

            let file = tokio::fs::File::open(input_path)
                .await
                .map_err(|e| LedgerError::IoError {
                    message: format!("Failed to open file '{}': {}", input_path.display(), e),
                })?;

            // csv-async reads futures::io, tokio files speak tokio::io
            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = AsyncReader::new(compat_file);

            let mut processed = 0usize;
            let mut rejected = 0usize;
            loop {
                let batch = reader.read_batch(self.batch.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                // Wait for the batch before reading the next one to keep per-user order.
                for result in processor.process_batch(batch).await {
                    match result.result {
                        Ok(()) => processed += 1,
                        Err(_) => rejected += 1,
                    }
                }
            }

            info!(processed, rejected, "replay finished");

            write_platforms_csv(&engine.platform_reports(), output)
        })
    }
}
