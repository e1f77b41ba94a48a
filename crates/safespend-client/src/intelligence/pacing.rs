use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::intelligence::date::days_between;
use crate::intelligence::money::{round_money, round_ratio};
use crate::intelligence::policy::ForecastPolicy;
use crate::intelligence::types::{CategoryClass, CycleWindow, Transaction};

/// Allowance figures for a single day of the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyAllowance {
    pub daily_base: Decimal,
    pub pace_ratio: Decimal,
    pub adjustment_factor: Decimal,
    pub daily_adjusted: Decimal,
    pub days_remaining: i64,
}

/// One simulated day: the allowance offered, what was spent, and the roll
/// carried out of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingDay {
    pub day: NaiveDate,
    pub allowance: DailyAllowance,
    pub spend: Decimal,
    pub roll: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacingOutcome {
    pub days: Vec<PacingDay>,
    pub today: DailyAllowance,
    pub roll_today: Decimal,
    pub spent_before_today: Decimal,
    pub variable_spent: Decimal,
    pub safe_to_spend_today: Decimal,
}

/// Variable outflows per day within `[cycle_start, today]`. Pending rows are
/// included since the money is already committed.
pub fn daily_variable_spend(
    history: &[Transaction],
    window: &CycleWindow,
    today: NaiveDate,
) -> BTreeMap<NaiveDate, Decimal> {
    let mut by_day: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    for transaction in history {
        if !transaction.is_outflow() || transaction.category_class() != CategoryClass::Variable {
            continue;
        }
        let date = transaction.occurred_on();
        if date < window.cycle_start || date > today {
            continue;
        }
        *by_day.entry(date).or_insert(Decimal::ZERO) += transaction.abs_amount();
    }
    by_day
}

/// Walks the cycle from its first day up to `today`, folding the roll balance
/// and cumulative spend forward, then prices today's allowance from spend
/// strictly before today.
pub fn simulate_pacing(
    spend_by_day: &BTreeMap<NaiveDate, Decimal>,
    window: &CycleWindow,
    variable_budget: Decimal,
    today: NaiveDate,
    policy: &ForecastPolicy,
) -> PacingOutcome {
    let spend_on = |day: NaiveDate| spend_by_day.get(&day).copied().unwrap_or(Decimal::ZERO);

    let (roll, spent_before_today, days) = window
        .cycle_start
        .iter_days()
        .take_while(|day| *day < today)
        .fold(
            (Decimal::ZERO, Decimal::ZERO, Vec::new()),
            |(roll, cumulative, mut days), day| {
                let allowance = allowance_for_day(day, cumulative, variable_budget, window, policy);
                let spend = spend_on(day);
                let roll = carry_roll(roll, &allowance, spend, policy);
                days.push(PacingDay {
                    day,
                    allowance,
                    spend,
                    roll,
                });
                (roll, cumulative + spend, days)
            },
        );

    let today_allowance =
        allowance_for_day(today, spent_before_today, variable_budget, window, policy);
    let variable_spent = round_money(spent_before_today + spend_on(today));
    let safe_to_spend_today = round_money(today_allowance.daily_adjusted + roll);

    tracing::debug!(
        simulated_days = days.len(),
        pace_ratio = %today_allowance.pace_ratio,
        adjustment = %today_allowance.adjustment_factor,
        roll = %roll,
        safe_to_spend = %safe_to_spend_today,
        "pacing simulation complete"
    );

    PacingOutcome {
        days,
        today: today_allowance,
        roll_today: roll,
        spent_before_today: round_money(spent_before_today),
        variable_spent,
        safe_to_spend_today,
    }
}

pub fn allowance_for_day(
    day: NaiveDate,
    spent_before: Decimal,
    variable_budget: Decimal,
    window: &CycleWindow,
    policy: &ForecastPolicy,
) -> DailyAllowance {
    let remaining = (variable_budget - spent_before).max(Decimal::ZERO);
    let days_remaining = (days_between(day, window.cycle_end) + 1).max(1);
    let daily_base = round_money(
        remaining
            .checked_div(Decimal::from(days_remaining))
            .unwrap_or(Decimal::ZERO),
    );

    let elapsed_days = days_between(window.cycle_start, day);
    let pace_ratio = pace_ratio(
        spent_before,
        elapsed_days,
        variable_budget,
        window.cycle_length_days,
    );
    let adjustment_factor = policy.adjustment_for_pace(pace_ratio);
    let daily_adjusted = round_money(daily_base * adjustment_factor);

    DailyAllowance {
        daily_base,
        pace_ratio,
        adjustment_factor,
        daily_adjusted,
        days_remaining,
    }
}

/// Actual daily spend rate over planned daily rate; neutral when either side
/// has nothing to measure yet.
pub fn pace_ratio(
    spent_before: Decimal,
    elapsed_days: i64,
    variable_budget: Decimal,
    cycle_length_days: i64,
) -> Decimal {
    if variable_budget <= Decimal::ZERO || elapsed_days <= 0 || cycle_length_days <= 0 {
        return round_ratio(Decimal::ONE);
    }
    let planned_rate = variable_budget.checked_div(Decimal::from(cycle_length_days));
    let actual_rate = spent_before.checked_div(Decimal::from(elapsed_days));
    match (actual_rate, planned_rate) {
        (Some(actual), Some(planned)) if planned > Decimal::ZERO => {
            round_ratio(actual.checked_div(planned).unwrap_or(Decimal::ONE))
        }
        _ => round_ratio(Decimal::ONE),
    }
}

/// Half of any leftover is banked; an overspend drains the roll. The result
/// always lands in `[0, roll_cap(daily_base)]`.
fn carry_roll(
    roll: Decimal,
    allowance: &DailyAllowance,
    spend: Decimal,
    policy: &ForecastPolicy,
) -> Decimal {
    let leftover = allowance.daily_adjusted + roll - spend;
    let next = if leftover > Decimal::ZERO {
        roll + leftover * policy.roll_carry_share
    } else {
        roll + leftover
    };
    round_money(next)
        .max(Decimal::ZERO)
        .min(policy.roll_cap(allowance.daily_base))
}
