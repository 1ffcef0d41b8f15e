//! Processing strategy module for event replay
//!
//! This module defines the Strategy pattern for complete replay pipelines,
//! encompassing both CSV parsing and ledger processing. This allows different
//! processing implementations (synchronous, asynchronous batch) to be selected at
//! runtime.

use crate::cli::StrategyType;
use crate::core::collaborators::{Collaborators, FixedQuota};
use crate::types::{BankrollMode, LedgerError};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use sync::SyncProcessingStrategy;

/// Settings shared by every strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// Bankroll mode of users that never set one
    pub default_mode: BankrollMode,

    /// Monthly bet limit per user; `None` means unlimited
    pub max_bets_per_month: Option<u32>,
}

impl EngineConfig {
    /// Log-only notifier and audit sink, plus the configured quota
    pub fn collaborators(&self) -> Collaborators {
        let collaborators = Collaborators::tracing();
        match self.max_bets_per_month {
            Some(limit) => collaborators.with_quota(Arc::new(FixedQuota(limit))),
            None => collaborators,
        }
    }
}

/// Processing strategy trait for complete replay pipelines
///
/// Each strategy reads bankroll events from a CSV file, replays them, and
/// writes the final platform states to output.
pub trait ProcessingStrategy: Send + Sync {
    /// Replay events from `input_path` and write platform states to `output`
    ///
    /// Individual events that fail are logged and skipped; they do not make
    /// this method fail.
    ///
    /// # Errors
    ///
    /// - `IoError` if the input file cannot be opened or output cannot be written
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), LedgerError>;
}

/// Create a processing strategy based on the specified strategy type
///
/// `batch` is only used by the async strategy; `None` means defaults.
pub fn create_strategy(
    strategy_type: StrategyType,
    batch: Option<BatchConfig>,
    engine: EngineConfig,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy::new(engine)),
        StrategyType::Async => {
            let batch = batch.unwrap_or_default();
            Box::new(AsyncProcessingStrategy::new(batch, engine))
        }
    }
}
