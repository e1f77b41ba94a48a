use std::collections::HashSet;

use chrono::NaiveDate;

use crate::config::EngineConfig;
use crate::intelligence::anomalies::detect_anomalies_with_policy;
use crate::intelligence::compose::{ForecastInputs, compute_safe_to_spend};
use crate::intelligence::date::{DateFilter, FocusMonth, checked_add_days};
use crate::intelligence::money::{MAX_ABS_AMOUNT, is_representable_amount};
use crate::intelligence::types::{AccountBalance, AnomalyInsight, SafeToSpendResult, Transaction};
use crate::sources::{BalanceSource, Clock, TransactionSource};
use crate::{ClientError, ClientResult};

/// Days past today fetched so scheduled deposits inside the cycle count as
/// future income. Matches the longest allowed cycle.
pub const FUTURE_HORIZON_DAYS: i64 = 45;

/// Safe-to-spend and anomaly entry points over caller-supplied collaborators.
///
/// The engine holds no state between calls; every request fetches a fresh
/// snapshot from its sources and reads `today` from its clock once.
#[derive(Debug, Clone)]
pub struct ForecastEngine<T, B, C> {
    transactions: T,
    balances: B,
    clock: C,
    config: EngineConfig,
}

impl<T, B, C> ForecastEngine<T, B, C> {
    pub fn new(transactions: T, balances: B, clock: C) -> Self {
        Self {
            transactions,
            balances,
            clock,
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Scores the supplied window. Balances and the clock are not consulted.
    pub fn detect_anomalies(&self, transactions: &[Transaction]) -> ClientResult<Vec<AnomalyInsight>> {
        validate_rows(transactions)?;
        Ok(detect_anomalies_with_policy(
            transactions,
            &self.config.anomalies,
        ))
    }
}

impl<T, B, C> ForecastEngine<T, B, C>
where
    T: TransactionSource,
{
    /// Fetches the filtered window from the transaction source and scores it.
    pub fn detect_anomalies_in_range(
        &self,
        user_id: &str,
        filter: DateFilter,
    ) -> ClientResult<Vec<AnomalyInsight>> {
        validate_user_id(user_id)?;
        let from = filter.from.unwrap_or(NaiveDate::MIN);
        let to = filter.to.unwrap_or(NaiveDate::MAX);
        let window = self
            .transactions
            .fetch_transaction_history(user_id, from, to)?;
        self.detect_anomalies(&window)
    }
}

impl<T, B, C> ForecastEngine<T, B, C>
where
    T: TransactionSource,
    B: BalanceSource,
    C: Clock,
{
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Computes today's safe-to-spend figure for `user_id`.
    ///
    /// `focus_month` is `YYYY-MM`. History is fetched over the policy
    /// lookback through the future horizon and merged with
    /// `transactions_for_month`; on duplicate ids the caller's row wins.
    pub fn compute_safe_to_spend(
        &self,
        user_id: &str,
        focus_month: &str,
        transactions_for_month: &[Transaction],
    ) -> ClientResult<SafeToSpendResult> {
        validate_user_id(user_id)?;
        let focus_month = FocusMonth::parse(focus_month, None)?;
        validate_rows(transactions_for_month)?;

        let today = self.clock.today();
        let policy = &self.config.forecast;
        let (Some(from), Some(to)) = (
            checked_add_days(today, -policy.history_lookback_days),
            checked_add_days(today, FUTURE_HORIZON_DAYS),
        ) else {
            return Err(ClientError::invalid_argument(&format!(
                "A {}-day history lookback from {today} leaves the supported calendar range.",
                policy.history_lookback_days
            )));
        };

        let fetched = self
            .transactions
            .fetch_transaction_history(user_id, from, to)?;
        validate_rows(&fetched)?;
        let history = merge_history(transactions_for_month, fetched);
        let balances = self.balances.fetch_account_balances(user_id)?;
        validate_balances(&balances)?;

        tracing::debug!(
            today = %today,
            focus_month = %focus_month.as_string(),
            history_rows = history.len(),
            accounts = balances.len(),
            "computing safe-to-spend"
        );

        Ok(compute_safe_to_spend(
            &ForecastInputs {
                history: &history,
                balances: &balances,
                focus_month,
                today,
            },
            policy,
        ))
    }
}

/// Concatenates the two row sets, keeping the first row seen for each id.
pub fn merge_history(primary: &[Transaction], secondary: Vec<Transaction>) -> Vec<Transaction> {
    let mut seen = HashSet::new();
    let mut merged = Vec::with_capacity(primary.len() + secondary.len());
    for transaction in primary.iter().cloned().chain(secondary) {
        if seen.insert(transaction.id.clone()) {
            merged.push(transaction);
        }
    }
    merged
}

fn validate_user_id(user_id: &str) -> ClientResult<()> {
    if user_id.trim().is_empty() {
        return Err(ClientError::invalid_argument("`user_id` must not be empty."));
    }
    Ok(())
}

fn validate_rows(transactions: &[Transaction]) -> ClientResult<()> {
    for (index, transaction) in transactions.iter().enumerate() {
        if transaction.id.trim().is_empty() {
            return Err(ClientError::invalid_argument(&format!(
                "Transaction at position {} has an empty id.",
                index + 1
            )));
        }
        if !is_representable_amount(transaction.amount) {
            return Err(ClientError::invalid_argument(&format!(
                "Transaction `{}` has an amount beyond {MAX_ABS_AMOUNT} in magnitude.",
                transaction.id
            )));
        }
    }
    Ok(())
}

fn validate_balances(balances: &[AccountBalance]) -> ClientResult<()> {
    if let Some(account) = balances
        .iter()
        .find(|account| !is_representable_amount(account.balance))
    {
        return Err(ClientError::invalid_argument(&format!(
            "Account `{}` has a balance beyond {MAX_ABS_AMOUNT} in magnitude.",
            account.account_id
        )));
    }
    Ok(())
}
