use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use safespend_client::{AccountBalance, ForecastEngine, Transaction};
use safespend_client::sources::{FixedClock, InMemoryLedger};
use serde_json::{Value, json};
use tempfile::{Builder, TempDir};

pub type LedgerEngine = ForecastEngine<InMemoryLedger, InMemoryLedger, FixedClock>;

pub fn day(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap_or(NaiveDate::MIN)
}

pub fn txn(id: &str, date: &str, amount: Decimal, merchant: &str, category: Option<&str>) -> Transaction {
    let occurred_at = day(date)
        .and_hms_opt(12, 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .unwrap_or_default();
    Transaction {
        id: id.to_string(),
        account_id: "acct_checking".to_string(),
        merchant_name: merchant.to_string(),
        amount,
        currency: "USD".to_string(),
        occurred_at,
        pending: false,
        category: category.map(str::to_string),
    }
}

pub fn pending(mut transaction: Transaction) -> Transaction {
    transaction.pending = true;
    transaction
}

pub fn balance(account_id: &str, amount: Decimal) -> AccountBalance {
    AccountBalance {
        account_id: account_id.to_string(),
        balance: amount,
    }
}

/// Engine over one in-memory ledger serving both rows and balances, pinned
/// to `today`.
pub fn engine_on(today: &str, rows: Vec<Transaction>, balances: Vec<AccountBalance>) -> LedgerEngine {
    let ledger = InMemoryLedger::new(rows, balances);
    ForecastEngine::new(ledger.clone(), ledger, FixedClock::on(day(today)))
}

pub fn temp_dir(prefix: &str) -> std::io::Result<TempDir> {
    Builder::new().prefix(prefix).tempdir()
}

pub fn row_json(transaction: &Transaction) -> Value {
    json!({
        "id": transaction.id,
        "account_id": transaction.account_id,
        "merchant_name": transaction.merchant_name,
        "amount": transaction.amount.to_string(),
        "currency": transaction.currency,
        "occurred_at": transaction.occurred_on().format("%Y-%m-%d").to_string(),
        "pending": transaction.pending,
        "category": transaction.category,
    })
}

pub fn write_ledger_json(base: &Path, name: &str, rows: &[Transaction]) -> std::io::Result<PathBuf> {
    let values = rows.iter().map(row_json).collect::<Vec<Value>>();
    let body = serde_json::to_string_pretty(&values).map_err(std::io::Error::other)?;
    let path = base.join(name);
    fs::write(&path, body)?;
    Ok(path)
}

pub fn write_balances_csv(base: &Path, name: &str, balances: &[AccountBalance]) -> std::io::Result<PathBuf> {
    let mut body = String::from("account_id,balance\n");
    for entry in balances {
        body.push_str(&format!("{},{}\n", entry.account_id, entry.balance));
    }
    let path = base.join(name);
    fs::write(&path, body)?;
    Ok(path)
}

/// Ten steady coffee purchases averaging 10.00 plus one 60.00 spike on
/// 2026-03-18.
pub fn coffee_with_spike() -> Vec<Transaction> {
    let amounts = [9, 10, 11, 10, 9, 11, 10, 10, 9, 11];
    let mut rows = amounts
        .iter()
        .enumerate()
        .map(|(index, amount)| {
            txn(
                &format!("txn_coffee_{index:02}"),
                &format!("2026-03-{:02}", index + 1),
                -Decimal::from(*amount),
                "Corner Coffee",
                Some("Coffee Shops"),
            )
        })
        .collect::<Vec<Transaction>>();
    rows.push(txn(
        "txn_spike",
        "2026-03-18",
        Decimal::from(-60),
        "Corner Coffee",
        Some("Coffee Shops"),
    ));
    rows
}

pub fn success_data(envelope: safespend_client::SuccessEnvelope) -> Value {
    let payload = serde_json::to_value(envelope);
    assert!(payload.is_ok());
    if let Ok(value) = payload {
        return value["data"].clone();
    }
    Value::Null
}
