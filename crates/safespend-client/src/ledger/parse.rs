use std::collections::HashMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;

use crate::intelligence::date::parse_occurred_at;
use crate::intelligence::money::{MAX_ABS_AMOUNT, MONEY_SCALE, is_representable_amount};
use crate::intelligence::types::{AccountBalance, Transaction};
use crate::{ClientError, ClientResult};

pub(crate) const TRANSACTION_REQUIRED_FIELDS: [&str; 6] = [
    "id",
    "account_id",
    "merchant_name",
    "amount",
    "currency",
    "occurred_at",
];
pub(crate) const BALANCE_REQUIRED_FIELDS: [&str; 2] = ["account_id", "balance"];

/// One input row before validation. Absent and null fields are both `None`.
#[derive(Debug, Clone, Default)]
pub(crate) struct RawRecord {
    pub(crate) row: usize,
    pub(crate) fields: HashMap<String, String>,
}

impl RawRecord {
    fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }
}

pub(crate) fn parse_records(content: &str, required: &[&str]) -> ClientResult<Vec<RawRecord>> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(ClientError::invalid_input_format(
            "Ledger source is empty.",
            "empty",
        ));
    }

    if trimmed.starts_with('[') {
        return parse_json_array(trimmed);
    }

    if serde_json::from_str::<Value>(trimmed).is_ok() {
        return Err(ClientError::invalid_input_format(
            "JSON input must be a top-level array of objects.",
            "json_non_array",
        ));
    }

    if looks_like_csv(trimmed) {
        return parse_csv(trimmed, required);
    }

    Err(ClientError::invalid_input_format(
        "Unsupported ledger format. Provide a JSON array or CSV with headers.",
        "unknown",
    ))
}

fn parse_json_array(content: &str) -> ClientResult<Vec<RawRecord>> {
    let parsed = serde_json::from_str::<Value>(content).map_err(|error| {
        ClientError::invalid_input_format(&format!("Invalid JSON input: {error}"), "json_invalid")
    })?;

    let Some(items) = parsed.as_array() else {
        return Err(ClientError::invalid_input_format(
            "JSON input must be a top-level array of objects.",
            "json_non_array",
        ));
    };

    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let Some(object) = item.as_object() else {
            return Err(ClientError::invalid_input_format(
                "JSON array entries must all be objects.",
                "json_array_non_object",
            ));
        };
        let fields = object
            .iter()
            .filter_map(|(key, value)| scalar_text(value).map(|text| (key.clone(), text)))
            .collect::<HashMap<String, String>>();
        records.push(RawRecord {
            row: index + 1,
            fields,
        });
    }
    Ok(records)
}

fn parse_csv(content: &str, required: &[&str]) -> ClientResult<Vec<RawRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|_| {
            ClientError::invalid_input_format("CSV header row is missing or unreadable.", "csv")
        })?
        .iter()
        .map(str::to_string)
        .collect::<Vec<String>>();

    let missing = required
        .iter()
        .filter(|field| !headers.iter().any(|header| header == *field))
        .map(|field| (*field).to_string())
        .collect::<Vec<String>>();
    if !missing.is_empty() {
        return Err(ClientError::invalid_argument_with_recovery(
            &format!("CSV header is missing required columns: {}.", missing.join(", ")),
            vec![format!("Use the header row: {}.", required.join(","))],
        )
        .with_data(serde_json::json!({
            "expected_headers": required,
            "actual_headers": headers,
        })));
    }

    let mut records = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result.map_err(|error| {
            ClientError::invalid_input_format(&format!("CSV rows are malformed: {error}"), "csv")
        })?;
        let fields = headers
            .iter()
            .zip(record.iter())
            .filter(|(_, value)| !value.is_empty())
            .map(|(name, value)| (name.clone(), value.to_string()))
            .collect::<HashMap<String, String>>();
        records.push(RawRecord {
            row: index + 1,
            fields,
        });
    }
    Ok(records)
}

pub(crate) fn transaction_from_record(source: &str, record: &RawRecord) -> ClientResult<Transaction> {
    let id = required_text(source, record, "id")?;
    let account_id = required_text(source, record, "account_id")?;
    let merchant_name = record.get("merchant_name").unwrap_or_default().trim().to_string();
    let amount = money_field(source, record, "amount")?;
    let currency = required_text(source, record, "currency")?.to_uppercase();

    let occurred_raw = required_text(source, record, "occurred_at")?;
    let occurred_at = parse_occurred_at(&occurred_raw).ok_or_else(|| {
        ClientError::invalid_row(
            source,
            record.row,
            "occurred_at",
            "expected RFC 3339 or YYYY-MM-DD",
        )
    })?;

    let pending = match record.get("pending").map(str::trim) {
        None | Some("") => false,
        Some(value) => parse_flag(value).ok_or_else(|| {
            ClientError::invalid_row(source, record.row, "pending", "expected true or false")
        })?,
    };
    let category = record
        .get("category")
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string);

    Ok(Transaction {
        id,
        account_id,
        merchant_name,
        amount,
        currency,
        occurred_at,
        pending,
        category,
    })
}

pub(crate) fn balance_from_record(source: &str, record: &RawRecord) -> ClientResult<AccountBalance> {
    Ok(AccountBalance {
        account_id: required_text(source, record, "account_id")?,
        balance: money_field(source, record, "balance")?,
    })
}

fn required_text(source: &str, record: &RawRecord, field: &str) -> ClientResult<String> {
    record
        .get(field)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ClientError::invalid_row(source, record.row, field, "value is required"))
}

/// Decimal with at most two fractional digits, stored at cent scale.
fn money_field(source: &str, record: &RawRecord, field: &str) -> ClientResult<Decimal> {
    let raw = required_text(source, record, field)?;
    let mut value = Decimal::from_str(&raw).map_err(|_| {
        ClientError::invalid_row(source, record.row, field, "expected a decimal number")
    })?;
    if value.normalize().scale() > MONEY_SCALE {
        return Err(ClientError::invalid_row(
            source,
            record.row,
            field,
            "at most two decimal places are allowed",
        ));
    }
    if !is_representable_amount(value) {
        return Err(ClientError::invalid_row(
            source,
            record.row,
            field,
            &format!("magnitude must not exceed {MAX_ABS_AMOUNT}"),
        ));
    }
    value.rescale(MONEY_SCALE);
    Ok(value)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        other => Some(other.to_string()),
    }
}

fn looks_like_csv(content: &str) -> bool {
    content
        .lines()
        .find(|line| !line.trim().is_empty())
        .is_some_and(|line| line.contains(','))
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::{
        BALANCE_REQUIRED_FIELDS, TRANSACTION_REQUIRED_FIELDS, balance_from_record, parse_records,
        transaction_from_record,
    };

    #[test]
    fn json_rows_accept_numbers_and_strings() {
        let content = r#"[
            {"id": "t1", "account_id": "chk", "merchant_name": "Fresh Mart", "amount": -42.5,
             "currency": "usd", "occurred_at": "2026-03-02", "pending": true, "category": "Groceries"},
            {"id": "t2", "account_id": "chk", "merchant_name": "Employer", "amount": "2200.00",
             "currency": "USD", "occurred_at": "2026-03-06T09:30:00-05:00", "category": null}
        ]"#;
        let records = parse_records(content, &TRANSACTION_REQUIRED_FIELDS);
        assert!(records.is_ok());
        if let Ok(rows) = records {
            let first = transaction_from_record("ledger.json", &rows[0]);
            assert!(first.is_ok());
            if let Ok(transaction) = first {
                assert_eq!(transaction.amount.to_string(), "-42.50");
                assert_eq!(transaction.currency, "USD");
                assert!(transaction.pending);
                assert_eq!(transaction.category.as_deref(), Some("Groceries"));
            }

            let second = transaction_from_record("ledger.json", &rows[1]);
            assert!(second.is_ok());
            if let Ok(transaction) = second {
                assert_eq!(transaction.amount, dec!(2200.00));
                assert!(!transaction.pending);
                assert_eq!(transaction.category, None);
                assert_eq!(transaction.occurred_at.to_rfc3339(), "2026-03-06T14:30:00+00:00");
            }
        }
    }

    #[test]
    fn csv_rows_use_header_names() {
        let content = "account_id,balance\nchk,1800.00\nsav, 250\n";
        let records = parse_records(content, &BALANCE_REQUIRED_FIELDS);
        assert!(records.is_ok());
        if let Ok(rows) = records {
            assert_eq!(rows.len(), 2);
            let balance = balance_from_record("balances.csv", &rows[1]);
            assert!(balance.is_ok());
            if let Ok(account) = balance {
                assert_eq!(account.account_id, "sav");
                assert_eq!(account.balance.to_string(), "250.00");
            }
        }
    }

    #[test]
    fn csv_missing_columns_are_reported() {
        let records = parse_records("id,amount\nt1,-4.00\n", &TRANSACTION_REQUIRED_FIELDS);
        assert!(records.is_err());
        if let Err(error) = records {
            assert!(error.message.contains("account_id"));
        }
    }

    #[test]
    fn row_errors_name_row_and_field() {
        let content = "id,account_id,merchant_name,amount,currency,occurred_at\n\
                       t1,chk,Cafe,-4.005,USD,2026-03-01\n";
        let records = parse_records(content, &TRANSACTION_REQUIRED_FIELDS);
        assert!(records.is_ok());
        if let Ok(rows) = records {
            let parsed = transaction_from_record("ledger.csv", &rows[0]);
            assert!(parsed.is_err());
            if let Err(error) = parsed {
                assert_eq!(error.code, "invalid_argument");
                assert_eq!(
                    error.data.as_ref().and_then(|data| data["field"].as_str()),
                    Some("amount")
                );
            }
        }

        let blank_id = parse_records(
            r#"[{"id": " ", "account_id": "chk", "merchant_name": "x", "amount": 1, "currency": "USD", "occurred_at": "2026-03-01"}]"#,
            &TRANSACTION_REQUIRED_FIELDS,
        );
        assert!(blank_id.is_ok());
        if let Ok(rows) = blank_id {
            assert!(transaction_from_record("ledger.json", &rows[0]).is_err());
        }
    }

    #[test]
    fn amounts_beyond_the_money_bound_are_rejected() {
        let content = "id,account_id,merchant_name,amount,currency,occurred_at\n\
                       t1,chk,Cafe,-1.00,USD,2026-03-01\n\
                       t2,chk,Cafe,-1000000000000000.00,USD,2026-03-02\n";
        let records = parse_records(content, &TRANSACTION_REQUIRED_FIELDS);
        assert!(records.is_ok());
        if let Ok(rows) = records {
            assert!(transaction_from_record("ledger.csv", &rows[0]).is_ok());
            let oversized = transaction_from_record("ledger.csv", &rows[1]);
            assert!(oversized.is_err());
            if let Err(error) = oversized {
                assert_eq!(error.code, "invalid_argument");
                assert_eq!(
                    error.data.as_ref().and_then(|data| data["row"].as_u64()),
                    Some(2)
                );
                assert!(error.message.contains("magnitude"));
            }
        }
    }

    #[test]
    fn non_array_json_is_rejected() {
        let parsed = parse_records(r#"{"id": "t1"}"#, &TRANSACTION_REQUIRED_FIELDS);
        assert!(parsed.is_err());
        if let Err(error) = parsed {
            assert_eq!(
                error
                    .data
                    .as_ref()
                    .and_then(|data| data["received_format"].as_str()),
                Some("json_non_array")
            );
        }
    }
}
