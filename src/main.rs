//! Bankroll ledger CLI
//!
//! Replays a CSV log of bankroll events (platforms, mode changes, bets and
//! their results) and prints the final state of every platform.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- events.csv > platforms.csv
//! cargo run -- --strategy sync events.csv > platforms.csv
//! cargo run -- --strategy async --batch-size 2000 --max-concurrent 8 events.csv > platforms.csv
//! cargo run -- --default-mode on_loss --max-bets-per-month 30 -v events.csv
//! ```
//!
//! Logs go to stderr; `RUST_LOG` overrides the `-v` level.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (file not found, file not readable, output not writable)

use bankroll_ledger::cli;
use bankroll_ledger::strategy;
use std::process;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() {
    let args = cli::parse_args();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let batch = if matches!(args.strategy, cli::StrategyType::Async) {
        Some(args.to_batch_config())
    } else {
        None
    };
    let strategy = strategy::create_strategy(args.strategy.clone(), batch, args.to_engine_config());

    let mut output = std::io::stdout();
    if let Err(e) = strategy.process(&args.input_file, &mut output) {
        error!(error = %e, "replay failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
