use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsoDate(pub String);

impl IsoDate {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub fn parse_iso_date(value: &str) -> Result<IsoDate, String> {
    if value.len() != 10 {
        return Err("date must use YYYY-MM-DD format".to_string());
    }

    let bytes = value.as_bytes();
    if bytes[4] != b'-' || bytes[7] != b'-' {
        return Err("date must use YYYY-MM-DD format".to_string());
    }

    if NaiveDate::parse_from_str(value, "%Y-%m-%d").is_err() {
        return Err("date must use valid calendar values".to_string());
    }

    Ok(IsoDate(value.to_string()))
}

pub fn parse_month(value: &str) -> Result<String, String> {
    let candidate = format!("{value}-01");
    if value.len() != 7 || parse_iso_date(&candidate).is_err() {
        return Err("month must use YYYY-MM format".to_string());
    }
    Ok(value.to_string())
}

pub const FORECAST_AFTER_HELP: &str = "\
Inputs:
  --transactions  JSON array or CSV with columns
                  id,account_id,merchant_name,amount,currency,occurred_at,pending,category
                  Positive amounts are income, negative amounts are spending.
                  occurred_at accepts YYYY-MM-DD or RFC 3339 timestamps.
  --balances      JSON array or CSV with columns account_id,balance

  Pass `-` to read one of the inputs from stdin.

Policy overrides:
  --config <path>, then $SAFESPEND_CONFIG, then $SAFESPEND_HOME/config.json,
  then ~/.safespend/config.json.
";

pub const ANOMALIES_AFTER_HELP: &str = "\
Each posted outflow is compared with the other outflows at the same merchant,
or in the same category when the merchant has fewer than 3 other rows.
Findings use z-scores first and the interquartile range as a fallback.
";

#[derive(Debug, Parser)]
#[command(
    name = "safespend",
    version,
    about = "Daily safe-to-spend forecasts and spending anomaly checks"
)]
pub struct Cli {
    /// Increase log detail on stderr (-v debug, -vv trace). RUST_LOG wins when set.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compute today's safe-to-spend figure
    #[command(after_long_help = FORECAST_AFTER_HELP)]
    Forecast {
        /// Transaction ledger path, or `-` for stdin
        #[arg(long)]
        transactions: String,
        /// Account balances path, or `-` for stdin
        #[arg(long)]
        balances: String,
        /// Focus month (YYYY-MM); defaults to the month containing today
        #[arg(long, value_parser = parse_month)]
        month: Option<String>,
        /// Evaluate as of this date instead of the system clock
        #[arg(long, value_parser = parse_iso_date)]
        today: Option<IsoDate>,
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Flag unusual spending
    #[command(after_long_help = ANOMALIES_AFTER_HELP)]
    Anomalies {
        /// Transaction ledger path, or `-` for stdin
        #[arg(long)]
        transactions: String,
        #[arg(long, value_parser = parse_iso_date)]
        from: Option<IsoDate>,
        #[arg(long, value_parser = parse_iso_date)]
        to: Option<IsoDate>,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
pub fn parse_from<I, T>(itr: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(itr)
}
