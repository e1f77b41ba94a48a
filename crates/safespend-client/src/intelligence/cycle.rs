use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::intelligence::date::{FocusMonth, add_days, days_between};
use crate::intelligence::policy::ForecastPolicy;
use crate::intelligence::types::{CycleWindow, Transaction};

/// Reconstructs the current pay cycle from income deposits.
///
/// With fewer than two income days the window degrades to calendar-month
/// length anchored on the focus month. A stale window is rolled forward in
/// whole cycle lengths until it covers `today`.
pub fn resolve_cycle_window(
    history: &[Transaction],
    focus_month: FocusMonth,
    today: NaiveDate,
    policy: &ForecastPolicy,
) -> CycleWindow {
    let income_days = income_days_through(history, today);
    let mut latest_first = income_days.iter().rev().copied();
    let latest_income = latest_first.next();
    let previous_income = latest_first.next();

    let mut cycle_start = latest_income.unwrap_or_else(|| focus_month.first_day());
    let raw_length = match (previous_income, latest_income) {
        (Some(previous), Some(latest)) => days_between(previous, latest),
        _ => focus_month.days_in_month(),
    };
    let cycle_length_days = policy.clamp_cycle_length(raw_length);

    if cycle_start > today {
        cycle_start = today;
    }

    let mut cycle_end = add_days(cycle_start, cycle_length_days - 1);
    let lag_days = days_between(cycle_end, today);
    if lag_days > 0 {
        let steps = (lag_days + cycle_length_days - 1) / cycle_length_days;
        let shift = steps * cycle_length_days;
        cycle_start = add_days(cycle_start, shift);
        cycle_end = add_days(cycle_end, shift);
        tracing::debug!(
            steps,
            cycle_start = %cycle_start,
            "cycle window rolled forward past stale income data"
        );
    }

    let previous_cycle_start =
        previous_income.unwrap_or_else(|| add_days(cycle_start, -cycle_length_days));

    tracing::debug!(
        income_days = income_days.len(),
        cycle_start = %cycle_start,
        cycle_end = %cycle_end,
        cycle_length_days,
        "resolved cycle window"
    );

    CycleWindow {
        cycle_start,
        cycle_end,
        previous_cycle_start,
        cycle_length_days,
    }
}

/// Distinct calendar days with an inflow on or before `today`. Same-day
/// deposits collapse into one income event.
fn income_days_through(history: &[Transaction], today: NaiveDate) -> BTreeSet<NaiveDate> {
    history
        .iter()
        .filter(|transaction| transaction.is_inflow())
        .map(Transaction::occurred_on)
        .filter(|date| *date <= today)
        .collect()
}
