//! Synchronous processing strategy
//!
//! Single-threaded replay: events are read one at a time by `SyncReader` and
//! applied in file order to a `LedgerEngine` over the mutex-backed
//! `InMemoryStore`. Memory use is O(platforms + bets), not O(rows).

use crate::core::engine::LedgerEngine;
use crate::core::store::InMemoryStore;
use crate::io::csv_format::write_platforms_csv;
use crate::io::sync_reader::SyncReader;
use crate::strategy::{EngineConfig, ProcessingStrategy};
use crate::types::LedgerError;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Synchronous processing strategy
///
/// # Examples
///
/// ```no_run
/// use bankroll_ledger::strategy::{EngineConfig, ProcessingStrategy, SyncProcessingStrategy};
/// use std::path::Path;
/// use std::io;
///
/// let strategy = SyncProcessingStrategy::new(EngineConfig::default());
/// let mut output = io::stdout();
///
/// strategy.process(Path::new("events.csv"), &mut output)
///     .expect("Processing failed");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncProcessingStrategy {
    config: EngineConfig,
}

impl SyncProcessingStrategy {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }
}

impl ProcessingStrategy for SyncProcessingStrategy {
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), LedgerError> {
        let store = Arc::new(InMemoryStore::with_default_mode(self.config.default_mode));
        let engine = LedgerEngine::with_collaborators(store, self.config.collaborators());

        let reader = SyncReader::new(input_path)?;

        let mut processed = 0usize;
        let mut rejected = 0usize;
        for result in reader {
            match result {
                Ok(event) => {
                    let (user, kind) = (event.user(), event.kind());
                    match engine.process(event) {
                        Ok(()) => processed += 1,
                        Err(e) => {
                            rejected += 1;
                            warn!(user, kind, error = %e, "event rejected");
                        }
                    }
                }
                Err(e) => {
                    rejected += 1;
                    warn!(error = %e, "skipping row");
                }
            }
        }

        info!(processed, rejected, "replay finished");

        write_platforms_csv(&engine.platform_reports(), output)
    }
}
