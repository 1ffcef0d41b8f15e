use crate::strategy::{BatchConfig, EngineConfig};
use crate::types::BankrollMode;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Replay a bankroll event log and print the final platform balances
#[derive(Parser, Debug)]
#[command(name = "bankroll-ledger")]
#[command(about = "Replay bet events against per-platform bankrolls", long_about = None)]
pub struct CliArgs {
    /// Input CSV file path containing bankroll events
    #[arg(value_name = "INPUT", help = "Path to the input CSV file")]
    pub input_file: PathBuf,

    /// Processing strategy used to replay events
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "async",
        help = "Processing strategy: 'sync' for synchronous or 'async' for asynchronous"
    )]
    pub strategy: StrategyType,

    /// Number of events per batch (async mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of events per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Number of worker threads (async mode only)
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Number of worker threads (default: CPU cores)"
    )]
    pub max_concurrent_batches: Option<usize>,

    /// Bankroll mode of users without a `mode` event
    #[arg(
        long = "default-mode",
        value_name = "MODE",
        default_value = "immediate",
        help = "Default bankroll mode: 'immediate' or 'on_loss'"
    )]
    pub default_mode: BankrollMode,

    /// Monthly bet limit per user
    #[arg(
        long = "max-bets-per-month",
        value_name = "COUNT",
        help = "Reject bets beyond this many per user and calendar month (default: unlimited)"
    )]
    pub max_bets_per_month: Option<u32>,

    /// Log verbosity; repeat for more detail
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Available processing strategies
#[derive(Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

impl CliArgs {
    /// Create a BatchConfig from CLI arguments, falling back to defaults
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_some() || self.max_concurrent_batches.is_some() {
            let default = BatchConfig::default();
            BatchConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.max_concurrent_batches
                    .unwrap_or(default.max_concurrent_batches),
            )
        } else {
            BatchConfig::default()
        }
    }

    pub fn to_engine_config(&self) -> EngineConfig {
        EngineConfig {
            default_mode: self.default_mode,
            max_bets_per_month: self.max_bets_per_month,
        }
    }

    /// Default log filter when `RUST_LOG` is not set
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
