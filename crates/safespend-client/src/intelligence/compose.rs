use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::intelligence::budget::estimate_variable_budget;
use crate::intelligence::cycle::resolve_cycle_window;
use crate::intelligence::date::FocusMonth;
use crate::intelligence::money::{round_money, sum_money};
use crate::intelligence::obligations::project_remaining_obligations;
use crate::intelligence::pacing::{daily_variable_spend, simulate_pacing};
use crate::intelligence::policy::{FORECAST_POLICY_VERSION, ForecastPolicy};
use crate::intelligence::types::{
    AccountBalance, CategoryClass, CycleWindow, SafeToSpendResult, Transaction,
};

/// Everything one safe-to-spend computation reads. The caller owns the
/// snapshot; nothing here is fetched.
#[derive(Debug, Clone, Copy)]
pub struct ForecastInputs<'a> {
    pub history: &'a [Transaction],
    pub balances: &'a [AccountBalance],
    pub focus_month: FocusMonth,
    pub today: NaiveDate,
}

/// Figures feeding the hard cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardCapInputs {
    pub cash_on_hand: Decimal,
    pub future_income: Decimal,
    pub fixed_remaining: Decimal,
    pub sinking_remaining: Decimal,
    pub buffer: Decimal,
}

impl HardCapInputs {
    pub fn hard_cap(&self) -> Decimal {
        round_money(
            self.cash_on_hand
                .saturating_add(self.future_income)
                .saturating_sub(self.fixed_remaining)
                .saturating_sub(self.sinking_remaining)
                .saturating_sub(self.buffer),
        )
    }
}

pub fn compute_safe_to_spend(
    inputs: &ForecastInputs<'_>,
    policy: &ForecastPolicy,
) -> SafeToSpendResult {
    let today = inputs.today;
    let window = resolve_cycle_window(inputs.history, inputs.focus_month, today, policy);
    let budget = estimate_variable_budget(inputs.history, &window, today, policy);
    tracing::debug!(
        budget = %budget.amount,
        source = budget.source.as_str(),
        "variable budget resolved"
    );

    let spend_by_day = daily_variable_spend(inputs.history, &window, today);
    let pacing = simulate_pacing(&spend_by_day, &window, budget.amount, today, policy);

    let fixed = project_remaining_obligations(
        inputs.history,
        &window,
        today,
        CategoryClass::Fixed,
        policy,
    );
    let sinking = project_remaining_obligations(
        inputs.history,
        &window,
        today,
        CategoryClass::Sinking,
        policy,
    );

    let cap_inputs = HardCapInputs {
        cash_on_hand: cash_on_hand(inputs.balances),
        future_income: future_income(inputs.history, &window, today),
        fixed_remaining: fixed.remaining,
        sinking_remaining: sinking.remaining,
        buffer: round_money(policy.safety_buffer),
    };
    let hard_cap = cap_inputs.hard_cap();
    let (safe_to_spend_today, danger) = clamp_to_hard_cap(pacing.safe_to_spend_today, hard_cap);

    let variable_remaining = round_money((budget.amount - pacing.variable_spent).max(Decimal::ZERO));
    let notes = advisory_notes(
        hard_cap,
        pacing.today.pace_ratio,
        budget.amount,
        variable_remaining,
        policy,
    );

    if danger {
        tracing::warn!(
            hard_cap = %hard_cap,
            cash_on_hand = %cap_inputs.cash_on_hand,
            fixed_remaining = %cap_inputs.fixed_remaining,
            sinking_remaining = %cap_inputs.sinking_remaining,
            "hard cap exhausted; obligations exceed available cash"
        );
    }

    let mut obligations = fixed.lines;
    obligations.extend(sinking.lines);

    SafeToSpendResult {
        cycle_start: window.cycle_start,
        cycle_end: window.cycle_end,
        safe_to_spend_today,
        hard_cap,
        daily_base_allowance: pacing.today.daily_base,
        daily_adjusted_allowance: pacing.today.daily_adjusted,
        roll_today: pacing.roll_today,
        pace_ratio: pacing.today.pace_ratio,
        adjustment_factor: pacing.today.adjustment_factor,
        days_remaining: pacing.today.days_remaining,
        variable_budget: budget.amount,
        variable_spent: pacing.variable_spent,
        variable_remaining,
        danger,
        notes,
        budget_source: budget.source,
        cash_on_hand: cap_inputs.cash_on_hand,
        future_income: cap_inputs.future_income,
        fixed_remaining: cap_inputs.fixed_remaining,
        sinking_remaining: cap_inputs.sinking_remaining,
        buffer: cap_inputs.buffer,
        obligations,
        policy_version: FORECAST_POLICY_VERSION.to_string(),
    }
}

pub fn cash_on_hand(balances: &[AccountBalance]) -> Decimal {
    sum_money(balances.iter().map(|account| account.balance))
}

/// Inflows dated after today but inside the current cycle, as reported by
/// the source (scheduled or pending deposits).
pub fn future_income(history: &[Transaction], window: &CycleWindow, today: NaiveDate) -> Decimal {
    sum_money(
        history
            .iter()
            .filter(|transaction| transaction.is_inflow())
            .filter(|transaction| {
                let date = transaction.occurred_on();
                date > today && date <= window.cycle_end
            })
            .map(|transaction| transaction.amount),
    )
}

/// Applies the hard cap to the pacing figure. A negative cap leaves pacing
/// unclamped and raises `danger`; the result is never negative.
pub fn clamp_to_hard_cap(pacing_safe: Decimal, hard_cap: Decimal) -> (Decimal, bool) {
    let (capped, danger) = if hard_cap >= Decimal::ZERO {
        (pacing_safe.min(hard_cap), false)
    } else {
        (pacing_safe, true)
    };
    (round_money(capped.max(Decimal::ZERO)), danger)
}

pub fn advisory_notes(
    hard_cap: Decimal,
    pace_ratio: Decimal,
    variable_budget: Decimal,
    variable_remaining: Decimal,
    policy: &ForecastPolicy,
) -> Vec<String> {
    let mut notes = Vec::new();
    if hard_cap < Decimal::ZERO {
        notes.push(format!(
            "Upcoming obligations and the safety buffer exceed available cash by {}. Trim spending until the next deposit.",
            round_money(-hard_cap)
        ));
    }
    if policy.is_ahead_of_pace(pace_ratio) {
        notes.push(format!(
            "Variable spending is running ahead of plan ({pace_ratio}x the planned daily rate)."
        ));
    }
    if policy.is_behind_pace(pace_ratio) {
        notes.push(format!(
            "Variable spending is behind plan ({pace_ratio}x the planned daily rate). Consider moving the surplus to savings."
        ));
    }
    if variable_budget > Decimal::ZERO && variable_remaining <= Decimal::ZERO {
        notes.push("This cycle's variable budget is fully allocated.".to_string());
    }
    notes
}
