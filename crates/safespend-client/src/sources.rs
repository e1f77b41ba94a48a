use chrono::{DateTime, NaiveDate, Utc};

use crate::ClientResult;
use crate::intelligence::types::{AccountBalance, Transaction};

/// Supplies ledger rows for one user. `from` and `to` are inclusive calendar
/// days.
pub trait TransactionSource {
    fn fetch_transaction_history(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> ClientResult<Vec<Transaction>>;
}

pub trait BalanceSource {
    fn fetch_account_balances(&self, user_id: &str) -> ClientResult<Vec<AccountBalance>>;
}

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

impl<T: TransactionSource + ?Sized> TransactionSource for &T {
    fn fetch_transaction_history(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> ClientResult<Vec<Transaction>> {
        (**self).fetch_transaction_history(user_id, from, to)
    }
}

impl<B: BalanceSource + ?Sized> BalanceSource for &B {
    fn fetch_account_balances(&self, user_id: &str) -> ClientResult<Vec<AccountBalance>> {
        (**self).fetch_account_balances(user_id)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to one instant, for reproducible runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock {
    now: DateTime<Utc>,
}

impl FixedClock {
    /// Midnight UTC on `date`.
    pub fn on(date: NaiveDate) -> Self {
        Self {
            now: date.and_time(chrono::NaiveTime::MIN).and_utc(),
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

/// Ledger snapshot held in memory. Serves every user id the same rows.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    transactions: Vec<Transaction>,
    balances: Vec<AccountBalance>,
}

impl InMemoryLedger {
    pub fn new(transactions: Vec<Transaction>, balances: Vec<AccountBalance>) -> Self {
        Self {
            transactions,
            balances,
        }
    }
}

impl TransactionSource for InMemoryLedger {
    fn fetch_transaction_history(
        &self,
        _user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> ClientResult<Vec<Transaction>> {
        Ok(rows_between(&self.transactions, from, to))
    }
}

impl BalanceSource for InMemoryLedger {
    fn fetch_account_balances(&self, _user_id: &str) -> ClientResult<Vec<AccountBalance>> {
        Ok(self.balances.clone())
    }
}

pub(crate) fn rows_between(rows: &[Transaction], from: NaiveDate, to: NaiveDate) -> Vec<Transaction> {
    rows.iter()
        .filter(|transaction| {
            let date = transaction.occurred_on();
            date >= from && date <= to
        })
        .cloned()
        .collect()
}
