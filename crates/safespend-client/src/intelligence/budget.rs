use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::intelligence::money::{round_money, sum_money};
use crate::intelligence::policy::ForecastPolicy;
use crate::intelligence::types::{BudgetSource, CategoryClass, CycleWindow, Transaction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableBudget {
    pub amount: Decimal,
    pub source: BudgetSource,
}

/// Discretionary budget for the cycle: last cycle's posted variable spend,
/// else this cycle's spend so far, else the policy default.
pub fn estimate_variable_budget(
    history: &[Transaction],
    window: &CycleWindow,
    today: NaiveDate,
    policy: &ForecastPolicy,
) -> VariableBudget {
    let previous_cycle = posted_variable_spend(history, |date| window.in_previous_cycle(date));
    if previous_cycle > Decimal::ZERO {
        return VariableBudget {
            amount: previous_cycle,
            source: BudgetSource::PreviousCycle,
        };
    }

    let current_cycle =
        posted_variable_spend(history, |date| date >= window.cycle_start && date <= today);
    if current_cycle > Decimal::ZERO {
        tracing::debug!(
            amount = %current_cycle,
            "no previous-cycle variable spend; budgeting from current cycle"
        );
        return VariableBudget {
            amount: current_cycle,
            source: BudgetSource::CurrentCycle,
        };
    }

    tracing::debug!(
        amount = %policy.default_variable_budget,
        "no variable spend history; using default budget"
    );
    VariableBudget {
        amount: round_money(policy.default_variable_budget),
        source: BudgetSource::Default,
    }
}

fn posted_variable_spend<F>(history: &[Transaction], in_range: F) -> Decimal
where
    F: Fn(NaiveDate) -> bool,
{
    sum_money(
        history
            .iter()
            .filter(|transaction| !transaction.pending && transaction.is_outflow())
            .filter(|transaction| transaction.category_class() == CategoryClass::Variable)
            .filter(|transaction| in_range(transaction.occurred_on()))
            .map(Transaction::abs_amount),
    )
}
