//! End-to-end integration tests
//!
//! These tests validate the complete replay pipeline using predefined CSV
//! fixtures. Each test:
//! 1. Reads input.csv from a fixture directory
//! 2. Replays all events through the engine
//! 3. Generates the platform CSV
//! 4. Compares actual output with expected.csv
//!
//! Fixtures are located in tests/fixtures/ and cover:
//! - The create / win / correct-to-lost walkthrough
//! - Both bankroll modes and their convergence
//! - Corrections, refunds and bets moved back to pending
//! - Bets on unknown platforms, and on platforms opened after the bet
//! - Mode switches while bets are live
//! - The same bet id used by two users
//! - Rejected events (duplicates, bad amounts, invalid transitions)
//!
//! Each test is run twice: once with the synchronous strategy and once with the async strategy.

#[cfg(test)]
mod tests {
    use bankroll_ledger::cli::StrategyType;
    use bankroll_ledger::strategy::{create_strategy, EngineConfig};
    use bankroll_ledger::BankrollMode;
    use rstest::rstest;
    use std::fs;
    use std::io::Write;
    use std::path::Path;
    use tempfile::NamedTempFile;

    /// Run a fixture by replaying input.csv and comparing with expected.csv
    ///
    /// # Panics
    ///
    /// Panics if:
    /// - Input or expected files cannot be read
    /// - Output doesn't match expected
    fn run_test_fixture(fixture_name: &str, strategy_type: StrategyType, config: EngineConfig) {
        let fixture_dir = format!("tests/fixtures/{}", fixture_name);
        let input_path = format!("{}/input.csv", fixture_dir);
        let expected_path = format!("{}/expected.csv", fixture_dir);

        assert!(
            Path::new(&input_path).exists(),
            "Input file not found: {}",
            input_path
        );
        assert!(
            Path::new(&expected_path).exists(),
            "Expected file not found: {}",
            expected_path
        );

        let strategy = create_strategy(strategy_type.clone(), None, config);

        let mut temp_output = NamedTempFile::new().expect("Failed to create temp file");

        strategy
            .process(Path::new(&input_path), &mut temp_output)
            .unwrap_or_else(|e| panic!("Failed to replay events: {}", e));

        temp_output.flush().expect("Failed to flush temp file");

        let actual_output = fs::read_to_string(temp_output.path())
            .unwrap_or_else(|e| panic!("Failed to read temp output file: {}", e));

        let expected_output = fs::read_to_string(&expected_path)
            .unwrap_or_else(|e| panic!("Failed to read expected file {}: {}", expected_path, e));

        assert_eq!(
            actual_output, expected_output,
            "\n\nOutput mismatch for fixture: {} (strategy: {:?})\n\nActual output:\n{}\n\nExpected output:\n{}\n",
            fixture_name, strategy_type, actual_output, expected_output
        );
    }

    /// End-to-end test for all fixtures with both strategies
    #[rstest]
    #[case("pmu_scenario")]
    #[case("on_loss_mode")]
    #[case("mode_convergence")]
    #[case("corrections")]
    #[case("created_settled")]
    #[case("missing_platform")]
    #[case("precision")]
    #[case("rejected_events")]
    #[case("mode_switch")]
    #[case("late_platform")]
    #[case("shared_bet_ids")]
    fn test_fixtures(
        #[case] fixture: &str,
        #[values(StrategyType::Sync, StrategyType::Async)] strategy: StrategyType,
    ) {
        run_test_fixture(fixture, strategy, EngineConfig::default());
    }

    /// Users without a `mode` event follow the configured default
    #[rstest]
    fn test_default_mode_on_loss(
        #[values(StrategyType::Sync, StrategyType::Async)] strategy: StrategyType,
    ) {
        let config = EngineConfig {
            default_mode: BankrollMode::OnLoss,
            ..EngineConfig::default()
        };
        run_test_fixture("default_on_loss", strategy, config);
    }

    /// Bets beyond the monthly quota are rejected and leave the bankroll alone
    #[rstest]
    fn test_monthly_quota(
        #[values(StrategyType::Sync, StrategyType::Async)] strategy: StrategyType,
    ) {
        let config = EngineConfig {
            max_bets_per_month: Some(2),
            ..EngineConfig::default()
        };
        run_test_fixture("monthly_quota", strategy, config);
    }
}
