use std::path::{Path, PathBuf};

use crate::ClientResult;
use crate::commands::common::{
    DEFAULT_USER_ID, config_label, ensure_single_stdin, load_engine_config, resolve_today,
};
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::{ForecastData, InputSources};
use crate::engine::ForecastEngine;
use crate::intelligence::date::{FocusMonth, add_days, format_iso_date};
use crate::ledger::{FileBalanceSource, FileTransactionSource};
use crate::sources::{FixedClock, TransactionSource};

const COMMAND: &str = "forecast";

#[derive(Debug, Default)]
pub struct ForecastRunOptions<'a> {
    pub transactions: String,
    pub balances: String,
    pub month: Option<String>,
    pub today: Option<String>,
    pub user_id: Option<String>,
    pub config_path: Option<PathBuf>,
    pub home_override: Option<&'a Path>,
    pub stdin_override: Option<String>,
}

pub fn run(
    transactions: &str,
    balances: &str,
    month: Option<&str>,
    today: Option<&str>,
    user_id: Option<&str>,
    config_path: Option<&Path>,
) -> ClientResult<SuccessEnvelope> {
    run_with_options(ForecastRunOptions {
        transactions: transactions.to_string(),
        balances: balances.to_string(),
        month: month.map(std::string::ToString::to_string),
        today: today.map(std::string::ToString::to_string),
        user_id: user_id.map(std::string::ToString::to_string),
        config_path: config_path.map(Path::to_path_buf),
        home_override: None,
        stdin_override: None,
    })
}

#[doc(hidden)]
pub fn run_with_options(options: ForecastRunOptions<'_>) -> ClientResult<SuccessEnvelope> {
    ensure_single_stdin(&[&options.transactions, &options.balances], COMMAND)?;
    let today = resolve_today(options.today.as_deref(), COMMAND)?;
    let focus_month = match options.month.as_deref() {
        Some(value) => FocusMonth::parse(value, Some(COMMAND))?,
        None => FocusMonth::containing(today),
    };
    let user_id = options
        .user_id
        .unwrap_or_else(|| DEFAULT_USER_ID.to_string());
    let loaded = load_engine_config(options.config_path.as_deref(), options.home_override)?;

    let ledger =
        FileTransactionSource::open_with_stdin(&options.transactions, options.stdin_override.clone())?;
    let balances = FileBalanceSource::open_with_stdin(&options.balances, options.stdin_override)?;

    let month_end = add_days(focus_month.first_day(), focus_month.days_in_month() - 1);
    let month_rows = ledger.fetch_transaction_history(&user_id, focus_month.first_day(), month_end)?;

    let engine =
        ForecastEngine::new(&ledger, &balances, FixedClock::on(today)).with_config(loaded.config);
    let result = engine.compute_safe_to_spend(&user_id, &focus_month.as_string(), &month_rows)?;

    let data = ForecastData {
        user_id,
        focus_month: focus_month.as_string(),
        today: format_iso_date(&today),
        sources: InputSources {
            transactions: ledger.label().to_string(),
            balances: Some(balances.label().to_string()),
            config: config_label(&loaded),
        },
        result,
    };

    success(COMMAND, data)
}
