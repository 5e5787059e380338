//! End-to-end integration tests
//!
//! These tests validate the complete replay pipeline using predefined CSV
//! fixtures. Each test:
//! 1. Reads input.csv from a fixture directory
//! 2. Replays every operation through the economy service
//! 3. Compares the balances CSV with expected.csv
//!
//! Fixtures are located in tests/fixtures/ and cover transfers, batches,
//! trades with fee overrides, insufficient balances, fee preferences and
//! malformed rows. Each fixture runs once with an internal vault backed by a
//! fresh snapshot file.

#[cfg(test)]
mod tests {
    use economy_core::replay::replay;
    use economy_core::EconomyConfig;
    use rstest::rstest;
    use rust_decimal::Decimal;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    /// Replay a fixture's input.csv and compare with its expected.csv
    ///
    /// Returns the vault store directory so callers can inspect the snapshot.
    async fn run_test_fixture(fixture_name: &str) -> TempDir {
        let fixture_dir = format!("tests/fixtures/{}", fixture_name);
        let input_path = format!("{}/input.csv", fixture_dir);
        let expected_path = format!("{}/expected.csv", fixture_dir);

        assert!(
            Path::new(&input_path).exists(),
            "Input file not found: {}",
            input_path
        );

        let store_dir = TempDir::new().expect("Failed to create temp dir");
        let mut config = EconomyConfig::default();
        config.vault.data_file = store_dir.path().join("ecore_internal_data.json");

        let mut output = Vec::new();
        replay(&config, Path::new(&input_path), &mut output)
            .await
            .unwrap_or_else(|e| panic!("Failed to replay {}: {}", fixture_name, e));

        let actual_output = String::from_utf8(output).expect("Output is not UTF-8");
        let expected_output = fs::read_to_string(&expected_path)
            .unwrap_or_else(|e| panic!("Failed to read expected file {}: {}", expected_path, e));

        assert_eq!(
            actual_output, expected_output,
            "\n\nOutput mismatch for fixture: {}\n\nActual output:\n{}\n\nExpected output:\n{}\n",
            fixture_name, actual_output, expected_output
        );

        store_dir
    }

    #[rstest]
    #[case("happy_path")]
    #[case("batch_transfers")]
    #[case("trade_overrides")]
    #[case("insufficient_balance")]
    #[case("malformed_data")]
    #[case("fee_preferences")]
    #[tokio::test]
    async fn test_fixtures(#[case] fixture: &str) {
        run_test_fixture(fixture).await;
    }

    #[tokio::test]
    async fn test_snapshot_matches_system_row() {
        let store_dir = run_test_fixture("trade_overrides").await;

        let snapshot: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(store_dir.path().join("ecore_internal_data.json")).unwrap(),
        )
        .unwrap();
        let balance: Decimal = snapshot["internal_vault_balance"]
            .as_str()
            .unwrap()
            .parse()
            .unwrap();

        assert_eq!(balance, Decimal::new(35, 0));
    }
}
