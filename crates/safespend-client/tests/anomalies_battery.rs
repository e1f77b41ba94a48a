mod support;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use safespend_client::commands::anomalies::{self, AnomaliesRunOptions};
use safespend_client::intelligence::anomalies::detect_anomalies;
use safespend_client::intelligence::policy::ANOMALIES_POLICY_V1;
use safespend_client::intelligence::types::CohortKind;
use safespend_client::{AnomalyMethod, EngineConfig, Transaction};
use serde_json::Value;
use support::ledger_kit::{
    coffee_with_spike, engine_on, pending, success_data, temp_dir, txn, write_ledger_json,
};

fn transit_with_spike() -> Vec<Transaction> {
    let fares = [
        dec!(2.50),
        dec!(2.75),
        dec!(3.00),
        dec!(2.75),
        dec!(2.50),
        dec!(3.00),
        dec!(2.75),
        dec!(2.75),
        dec!(2.50),
        dec!(3.00),
    ];
    let mut rows = fares
        .iter()
        .enumerate()
        .map(|(index, fare)| {
            txn(
                &format!("txn_metro_{index:02}"),
                &format!("2026-02-{:02}", index + 1),
                -*fare,
                "Metro Transit",
                Some("Transport"),
            )
        })
        .collect::<Vec<Transaction>>();
    rows.push(txn(
        "txn_metro_spike",
        "2026-03-05",
        dec!(-40.00),
        "Metro Transit",
        Some("Transport"),
    ));
    rows
}

fn flagged_ids(rows: &[Transaction]) -> Vec<String> {
    detect_anomalies(rows)
        .into_iter()
        .map(|insight| insight.transaction_id)
        .collect()
}

#[test]
fn five_sigma_outlier_over_ten_peers_is_a_zscore_finding() {
    let insights = detect_anomalies(&coffee_with_spike());
    assert_eq!(insights.len(), 1);

    let finding = &insights[0];
    assert_eq!(finding.transaction_id, "txn_spike");
    assert_eq!(finding.method, AnomalyMethod::ZScore);
    assert!(finding.score >= 2.0);
    assert_eq!(finding.amount, dec!(60.00));
    assert_eq!(finding.delta_amount, dec!(50.00));
    // 60 of 160 posted outflow in the window.
    assert_eq!(finding.budget_impact_percent, dec!(37.50));
    assert_eq!(finding.cohort, CohortKind::Merchant);
    assert_eq!(finding.cohort_size, 10);
    assert_eq!(finding.severity, "high");
    assert_eq!(finding.merchant_name, "Corner Coffee");
    assert!(finding.commentary.contains("Corner Coffee"));
}

#[test]
fn cohorts_under_three_samples_never_flag() {
    let rows = vec![
        txn("a", "2026-03-01", dec!(-10.00), "Lone Kiosk", None),
        txn("b", "2026-03-02", dec!(-10.00), "Lone Kiosk", None),
        txn("c", "2026-03-03", dec!(-90.00), "Lone Kiosk", None),
    ];
    assert!(flagged_ids(&rows).is_empty());
}

#[test]
fn pending_and_inflow_rows_are_neither_scored_nor_baseline() {
    let mut rows = coffee_with_spike();
    if let Some(spike) = rows.pop() {
        rows.push(pending(spike));
    }
    rows.push(txn("refund", "2026-03-19", dec!(500.00), "Corner Coffee", Some("Coffee Shops")));
    assert!(flagged_ids(&rows).is_empty());
}

#[test]
fn cohorts_with_unrepresentable_spread_are_skipped() {
    let rows = vec![
        txn("small_a", "2026-03-01", dec!(-1.00), "Harbor Kiosk", None),
        txn("small_b", "2026-03-02", dec!(-1.00), "Harbor Kiosk", None),
        txn("small_c", "2026-03-03", dec!(-1.00), "Harbor Kiosk", None),
        txn("huge", "2026-03-04", dec!(-1000000000000000.00), "Harbor Kiosk", None),
    ];
    // Peers of each small row square past Decimal range; the huge row's peers
    // have no spread.
    assert!(flagged_ids(&rows).is_empty());
}

#[test]
fn findings_are_ordered_by_date_then_id() {
    let mut rows = coffee_with_spike();
    rows.extend(transit_with_spike());

    assert_eq!(
        flagged_ids(&rows),
        vec!["txn_metro_spike".to_string(), "txn_spike".to_string()]
    );
}

#[test]
fn raising_the_zscore_threshold_falls_back_to_iqr() {
    let config = EngineConfig {
        anomalies: safespend_client::intelligence::policy::AnomaliesPolicy {
            zscore_threshold: 100.0,
            ..ANOMALIES_POLICY_V1
        },
        ..EngineConfig::default()
    };
    let engine = engine_on("2026-03-31", Vec::new(), Vec::new()).with_config(config);

    let insights = engine.detect_anomalies(&coffee_with_spike());
    assert!(insights.is_ok());
    if let Ok(rows) = insights {
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].method, AnomalyMethod::Iqr);
        assert_eq!(rows[0].transaction_id, "txn_spike");
    }
}

#[test]
fn engine_rejects_rows_without_ids() {
    let engine = engine_on("2026-03-31", Vec::new(), Vec::new());
    let rows = [txn(" ", "2026-03-01", dec!(-1.00), "Kiosk", None)];
    let result = engine.detect_anomalies(&rows);
    assert!(result.is_err());
    if let Err(error) = result {
        assert_eq!(error.code, "invalid_argument");
    }
}

#[test]
fn command_scores_a_ledger_file_within_the_range() {
    let dir = temp_dir("safespend-anomalies");
    assert!(dir.is_ok());
    if let Ok(dir) = dir {
        let ledger = write_ledger_json(dir.path(), "ledger.json", &coffee_with_spike());
        assert!(ledger.is_ok());
        if let Ok(path) = ledger {
            let response = anomalies::run_with_options(AnomaliesRunOptions {
                transactions: path.display().to_string(),
                home_override: Some(dir.path()),
                ..AnomaliesRunOptions::default()
            });
            assert!(response.is_ok());
            if let Ok(envelope) = response {
                assert_eq!(envelope.command, "anomalies");
                let data = success_data(envelope);
                assert_eq!(data["policy_version"], "anomalies/v1");
                assert_eq!(data["from"], Value::Null);
                assert_eq!(data["rows"][0]["transaction_id"], "txn_spike");
                assert_eq!(data["rows"][0]["method"], "ZSCORE");
                assert_eq!(data["rows"][0]["cohort"], "merchant");
                assert_eq!(
                    data["rows"][0]["amount"]
                        .as_str()
                        .and_then(|raw| raw.parse::<Decimal>().ok()),
                    Some(dec!(60))
                );
            }

            // The spike sits outside this range and is never fetched.
            let before_spike = anomalies::run_with_options(AnomaliesRunOptions {
                transactions: path.display().to_string(),
                from: Some("2026-03-01".to_string()),
                to: Some("2026-03-17".to_string()),
                home_override: Some(dir.path()),
                ..AnomaliesRunOptions::default()
            });
            assert!(before_spike.is_ok());
            if let Ok(envelope) = before_spike {
                let data = success_data(envelope);
                assert_eq!(data["to"], "2026-03-17");
                assert_eq!(data["rows"].as_array().map(Vec::len), Some(0));
            }
        }
    }
}

#[test]
fn command_rejects_inverted_ranges_and_strict_home_config() {
    let dir = temp_dir("safespend-anomalies-config");
    assert!(dir.is_ok());
    if let Ok(dir) = dir {
        let inverted = anomalies::run_with_options(AnomaliesRunOptions {
            transactions: "-".to_string(),
            from: Some("2026-03-10".to_string()),
            to: Some("2026-03-01".to_string()),
            home_override: Some(dir.path()),
            stdin_override: Some("[]".to_string()),
            ..AnomaliesRunOptions::default()
        });
        assert!(inverted.is_err());
        if let Err(error) = inverted {
            assert_eq!(error.code, "invalid_argument");
        }

        let written = std::fs::write(
            dir.path().join("config.json"),
            r#"{"anomalies": {"min_cohort_samples": 1}}"#,
        );
        assert!(written.is_ok());
        let too_loose = anomalies::run_with_options(AnomaliesRunOptions {
            transactions: "-".to_string(),
            home_override: Some(dir.path()),
            stdin_override: Some("[]".to_string()),
            ..AnomaliesRunOptions::default()
        });
        assert!(too_loose.is_err());
        if let Err(error) = too_loose {
            assert_eq!(error.code, "config_invalid");
        }
    }
}

#[test]
fn stricter_cohort_floor_from_home_config_silences_findings() {
    let dir = temp_dir("safespend-anomalies-floor");
    assert!(dir.is_ok());
    if let Ok(dir) = dir {
        let written = std::fs::write(
            dir.path().join("config.json"),
            r#"{"anomalies": {"min_cohort_samples": 20}}"#,
        );
        assert!(written.is_ok());
        let ledger = write_ledger_json(dir.path(), "ledger.json", &coffee_with_spike());
        assert!(ledger.is_ok());
        if let Ok(path) = ledger {
            let response = anomalies::run_with_options(AnomaliesRunOptions {
                transactions: path.display().to_string(),
                home_override: Some(dir.path()),
                ..AnomaliesRunOptions::default()
            });
            assert!(response.is_ok());
            if let Ok(envelope) = response {
                let data = success_data(envelope);
                assert_eq!(data["rows"].as_array().map(Vec::len), Some(0));
                assert!(data["sources"]["config"].is_string());
            }
        }
    }
}
