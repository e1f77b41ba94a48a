//! File-backed collaborators: ledger exports in JSON or CSV, or piped stdin.

pub(crate) mod input;
pub(crate) mod parse;

use chrono::NaiveDate;

use crate::ClientResult;
use crate::intelligence::types::{AccountBalance, Transaction};
use crate::ledger::input::read_source;
use crate::ledger::parse::{
    BALANCE_REQUIRED_FIELDS, TRANSACTION_REQUIRED_FIELDS, balance_from_record, parse_records,
    transaction_from_record,
};
use crate::sources::{BalanceSource, TransactionSource, rows_between};

pub use crate::ledger::input::STDIN_PATH;

#[derive(Debug, Clone)]
pub struct FileTransactionSource {
    label: String,
    rows: Vec<Transaction>,
}

impl FileTransactionSource {
    /// Opens `path`; `-` reads `stdin_override` when provided, else the
    /// process stdin.
    pub fn open_with_stdin(path: &str, stdin_override: Option<String>) -> ClientResult<Self> {
        let source = read_source(path, stdin_override)?;
        Self::from_content(&source.label, &source.content)
    }

    pub fn from_content(label: &str, content: &str) -> ClientResult<Self> {
        let records = parse_records(content, &TRANSACTION_REQUIRED_FIELDS)?;
        let rows = records
            .iter()
            .map(|record| transaction_from_record(label, record))
            .collect::<ClientResult<Vec<Transaction>>>()?;
        tracing::debug!(source = label, rows = rows.len(), "loaded transactions");
        Ok(Self {
            label: label.to_string(),
            rows,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl TransactionSource for FileTransactionSource {
    fn fetch_transaction_history(
        &self,
        _user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> ClientResult<Vec<Transaction>> {
        Ok(rows_between(&self.rows, from, to))
    }
}

#[derive(Debug, Clone)]
pub struct FileBalanceSource {
    label: String,
    balances: Vec<AccountBalance>,
}

impl FileBalanceSource {
    pub fn open_with_stdin(path: &str, stdin_override: Option<String>) -> ClientResult<Self> {
        let source = read_source(path, stdin_override)?;
        Self::from_content(&source.label, &source.content)
    }

    pub fn from_content(label: &str, content: &str) -> ClientResult<Self> {
        let records = parse_records(content, &BALANCE_REQUIRED_FIELDS)?;
        let balances = records
            .iter()
            .map(|record| balance_from_record(label, record))
            .collect::<ClientResult<Vec<AccountBalance>>>()?;
        tracing::debug!(source = label, accounts = balances.len(), "loaded balances");
        Ok(Self {
            label: label.to_string(),
            balances,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl BalanceSource for FileBalanceSource {
    fn fetch_account_balances(&self, _user_id: &str) -> ClientResult<Vec<AccountBalance>> {
        Ok(self.balances.clone())
    }
}
