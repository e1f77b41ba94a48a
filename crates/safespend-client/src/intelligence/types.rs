use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::intelligence::classify::classify_category;

/// A caller-owned ledger row. Positive amounts are inflows, negative amounts
/// are outflows; the engine never rewrites `amount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub id: String,
    pub account_id: String,
    pub merchant_name: String,
    pub amount: Decimal,
    pub currency: String,
    pub occurred_at: DateTime<Utc>,
    pub pending: bool,
    pub category: Option<String>,
}

impl Transaction {
    pub fn occurred_on(&self) -> NaiveDate {
        self.occurred_at.date_naive()
    }

    pub fn is_inflow(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    pub fn is_outflow(&self) -> bool {
        self.amount < Decimal::ZERO
    }

    pub fn abs_amount(&self) -> Decimal {
        self.amount.abs()
    }

    pub fn category_class(&self) -> CategoryClass {
        classify_category(self.category.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountBalance {
    pub account_id: String,
    pub balance: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryClass {
    Fixed,
    Sinking,
    Variable,
}

impl CategoryClass {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Sinking => "sinking",
            Self::Variable => "variable",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CycleWindow {
    pub cycle_start: NaiveDate,
    pub cycle_end: NaiveDate,
    pub previous_cycle_start: NaiveDate,
    pub cycle_length_days: i64,
}

impl CycleWindow {
    pub fn in_previous_cycle(&self, date: NaiveDate) -> bool {
        date >= self.previous_cycle_start && date < self.cycle_start
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetSource {
    PreviousCycle,
    CurrentCycle,
    Default,
}

impl BudgetSource {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PreviousCycle => "previous_cycle",
            Self::CurrentCycle => "current_cycle",
            Self::Default => "default",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObligationLine {
    pub merchant: String,
    pub class: CategoryClass,
    pub expected: Decimal,
    pub paid: Decimal,
    pub remaining: Decimal,
    pub occurrences: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SafeToSpendResult {
    pub cycle_start: NaiveDate,
    pub cycle_end: NaiveDate,
    pub safe_to_spend_today: Decimal,
    pub hard_cap: Decimal,
    pub daily_base_allowance: Decimal,
    pub daily_adjusted_allowance: Decimal,
    pub roll_today: Decimal,
    pub pace_ratio: Decimal,
    pub adjustment_factor: Decimal,
    pub days_remaining: i64,
    pub variable_budget: Decimal,
    pub variable_spent: Decimal,
    pub variable_remaining: Decimal,
    pub danger: bool,
    pub notes: Vec<String>,
    pub budget_source: BudgetSource,
    pub cash_on_hand: Decimal,
    pub future_income: Decimal,
    pub fixed_remaining: Decimal,
    pub sinking_remaining: Decimal,
    pub buffer: Decimal,
    pub obligations: Vec<ObligationLine>,
    pub policy_version: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AnomalyMethod {
    #[serde(rename = "ZSCORE")]
    ZScore,
    #[serde(rename = "IQR")]
    Iqr,
}

impl AnomalyMethod {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ZScore => "ZSCORE",
            Self::Iqr => "IQR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CohortKind {
    Merchant,
    Category,
}

impl CohortKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Merchant => "merchant",
            Self::Category => "category",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyInsight {
    pub transaction_id: String,
    pub method: AnomalyMethod,
    pub score: f64,
    pub amount: Decimal,
    pub delta_amount: Decimal,
    pub budget_impact_percent: Decimal,
    pub merchant_name: String,
    pub commentary: String,
    pub occurred_on: NaiveDate,
    pub cohort: CohortKind,
    pub cohort_size: usize,
    pub severity: String,
}
