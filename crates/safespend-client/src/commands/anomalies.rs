use std::path::{Path, PathBuf};

use crate::ClientResult;
use crate::commands::common::{DEFAULT_USER_ID, config_label, load_engine_config};
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::{AnomaliesData, InputSources};
use crate::engine::ForecastEngine;
use crate::intelligence::date::{build_filter, format_iso_date};
use crate::intelligence::policy::ANOMALIES_POLICY_VERSION;
use crate::ledger::FileTransactionSource;
use crate::sources::SystemClock;

const COMMAND: &str = "anomalies";

#[derive(Debug, Default)]
pub struct AnomaliesRunOptions<'a> {
    pub transactions: String,
    pub from: Option<String>,
    pub to: Option<String>,
    pub config_path: Option<PathBuf>,
    pub home_override: Option<&'a Path>,
    pub stdin_override: Option<String>,
}

pub fn run(
    transactions: &str,
    from: Option<&str>,
    to: Option<&str>,
    config_path: Option<&Path>,
) -> ClientResult<SuccessEnvelope> {
    run_with_options(AnomaliesRunOptions {
        transactions: transactions.to_string(),
        from: from.map(std::string::ToString::to_string),
        to: to.map(std::string::ToString::to_string),
        config_path: config_path.map(Path::to_path_buf),
        home_override: None,
        stdin_override: None,
    })
}

#[doc(hidden)]
pub fn run_with_options(options: AnomaliesRunOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let filter = build_filter(options.from.as_deref(), options.to.as_deref(), COMMAND)?;
    let loaded = load_engine_config(options.config_path.as_deref(), options.home_override)?;
    let ledger = FileTransactionSource::open_with_stdin(&options.transactions, options.stdin_override)?;

    // Balances play no part in scoring.
    let engine = ForecastEngine::new(&ledger, (), SystemClock).with_config(loaded.config);
    let rows = engine.detect_anomalies_in_range(DEFAULT_USER_ID, filter)?;

    let data = AnomaliesData {
        from: filter.from.as_ref().map(format_iso_date),
        to: filter.to.as_ref().map(format_iso_date),
        policy_version: ANOMALIES_POLICY_VERSION.to_string(),
        sources: InputSources {
            transactions: ledger.label().to_string(),
            balances: None,
            config: config_label(&loaded),
        },
        rows,
    };

    success(COMMAND, data)
}
