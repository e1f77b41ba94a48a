use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::intelligence::money::{round_money, sum_money};
use crate::intelligence::normalize::{display_label, merchant_key};
use crate::intelligence::policy::ForecastPolicy;
use crate::intelligence::stats::median;
use crate::intelligence::types::{CategoryClass, CycleWindow, ObligationLine, Transaction};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObligationProjection {
    pub class: CategoryClass,
    pub remaining: Decimal,
    pub lines: Vec<ObligationLine>,
}

#[derive(Debug, Default)]
struct MerchantHistory {
    label: String,
    amounts: Vec<Decimal>,
    paid_this_cycle: Decimal,
}

/// Estimates what is still owed this cycle for one obligation class.
///
/// Each merchant seen at least `min_obligation_occurrences` times on or
/// before `today` is expected to charge its median historical amount once per
/// cycle; whatever has
/// already been paid since `cycle_start` is netted off.
pub fn project_remaining_obligations(
    history: &[Transaction],
    window: &CycleWindow,
    today: NaiveDate,
    class: CategoryClass,
    policy: &ForecastPolicy,
) -> ObligationProjection {
    let mut merchants: BTreeMap<String, MerchantHistory> = BTreeMap::new();
    for transaction in history {
        let date = transaction.occurred_on();
        // Scheduled charges are not history yet.
        if date > today || !transaction.is_outflow() || transaction.category_class() != class {
            continue;
        }
        let Some(key) = merchant_key(&transaction.merchant_name) else {
            continue;
        };
        let entry = merchants.entry(key).or_insert_with(|| MerchantHistory {
            label: display_label(&transaction.merchant_name),
            ..MerchantHistory::default()
        });

        if date >= window.cycle_start {
            entry.paid_this_cycle = entry.paid_this_cycle.saturating_add(transaction.abs_amount());
        }
        if !transaction.pending {
            entry.amounts.push(transaction.abs_amount());
        }
    }

    let mut lines = Vec::new();
    for merchant in merchants.values_mut() {
        if merchant.amounts.len() < policy.min_obligation_occurrences {
            continue;
        }
        merchant.amounts.sort();
        let Some(expected) = median(&merchant.amounts) else {
            continue;
        };
        let expected = round_money(expected);
        let paid = round_money(merchant.paid_this_cycle);
        lines.push(ObligationLine {
            merchant: merchant.label.clone(),
            class,
            expected,
            paid,
            remaining: round_money(expected.saturating_sub(paid).max(Decimal::ZERO)),
            occurrences: merchant.amounts.len(),
        });
    }

    lines.sort_by(|left, right| {
        right
            .remaining
            .cmp(&left.remaining)
            .then_with(|| left.merchant.cmp(&right.merchant))
    });
    let remaining = sum_money(lines.iter().map(|line| line.remaining));

    tracing::debug!(
        class = class.as_str(),
        merchants = lines.len(),
        remaining = %remaining,
        "projected remaining obligations"
    );

    ObligationProjection {
        class,
        remaining,
        lines,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::project_remaining_obligations;
    use crate::intelligence::date::parse_occurred_at;
    use crate::intelligence::policy::FORECAST_POLICY_V1;
    use crate::intelligence::types::{CategoryClass, CycleWindow, Transaction};

    fn day(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap_or(NaiveDate::MIN)
    }

    fn row(
        id: &str,
        date: &str,
        amount: Decimal,
        merchant: &str,
        category: &str,
        pending: bool,
    ) -> Transaction {
        Transaction {
            id: id.to_string(),
            account_id: "acct".to_string(),
            merchant_name: merchant.to_string(),
            amount,
            currency: "USD".to_string(),
            occurred_at: parse_occurred_at(date).unwrap_or_default(),
            pending,
            category: Some(category.to_string()),
        }
    }

    fn window() -> CycleWindow {
        CycleWindow {
            cycle_start: day("2026-03-01"),
            cycle_end: day("2026-03-31"),
            previous_cycle_start: day("2026-02-01"),
            cycle_length_days: 31,
        }
    }

    #[test]
    fn unpaid_rent_is_projected_at_median() {
        let history = vec![
            row("r1", "2026-01-01", dec!(-900.00), "Oak Apartments", "Rent", false),
            row("r2", "2026-02-01", dec!(-900.00), "Oak Apartments", "Rent", false),
        ];
        let projection = project_remaining_obligations(
            &history,
            &window(),
            day("2026-03-10"),
            CategoryClass::Fixed,
            &FORECAST_POLICY_V1,
        );
        assert_eq!(projection.remaining, dec!(900.00));
        assert_eq!(projection.lines.len(), 1);
        assert_eq!(projection.lines[0].merchant, "Oak Apartments");
        assert_eq!(projection.lines[0].occurrences, 2);
    }

    #[test]
    fn median_resists_one_off_charges_and_nets_payments() {
        let history = vec![
            row("i1", "2025-12-05", dec!(-120.00), "Acme Insurance", "Insurance", false),
            row("i2", "2026-01-05", dec!(-120.00), "Acme Insurance", "Insurance", false),
            row("i3", "2026-02-05", dec!(-480.00), "Acme Insurance", "Insurance", false),
            row("i4", "2026-03-05", dec!(-50.00), "ACME  insurance", "Insurance", false),
        ];
        let projection = project_remaining_obligations(
            &history,
            &window(),
            day("2026-03-10"),
            CategoryClass::Fixed,
            &FORECAST_POLICY_V1,
        );
        assert_eq!(projection.lines.len(), 1);
        assert_eq!(projection.lines[0].expected, dec!(120.00));
        assert_eq!(projection.lines[0].paid, dec!(50.00));
        assert_eq!(projection.remaining, dec!(70.00));
    }

    #[test]
    fn single_sightings_and_other_classes_are_ignored() {
        let history = vec![
            row("g1", "2026-02-10", dec!(-300.00), "Gym Loan Co", "Loan", false),
            row("v1", "2026-02-10", dec!(-200.00), "Beach Trip", "Vacation", false),
            row("v2", "2026-01-10", dec!(-200.00), "Beach Trip", "Vacation", false),
        ];
        let fixed = project_remaining_obligations(
            &history,
            &window(),
            day("2026-03-10"),
            CategoryClass::Fixed,
            &FORECAST_POLICY_V1,
        );
        assert!(fixed.lines.is_empty());
        assert_eq!(fixed.remaining, dec!(0));

        let sinking = project_remaining_obligations(
            &history,
            &window(),
            day("2026-03-10"),
            CategoryClass::Sinking,
            &FORECAST_POLICY_V1,
        );
        assert_eq!(sinking.remaining, dec!(200.00));
    }

    #[test]
    fn scheduled_charges_are_not_history() {
        let one_sighting = vec![
            row("r1", "2026-02-01", dec!(-900.00), "Oak Apartments", "Rent", false),
            row("r2", "2026-04-01", dec!(-900.00), "Oak Apartments", "Rent", false),
        ];
        let projection = project_remaining_obligations(
            &one_sighting,
            &window(),
            day("2026-03-10"),
            CategoryClass::Fixed,
            &FORECAST_POLICY_V1,
        );
        assert!(projection.lines.is_empty());
        assert_eq!(projection.remaining, dec!(0));

        let upcoming_in_cycle = vec![
            row("r1", "2026-01-01", dec!(-900.00), "Oak Apartments", "Rent", false),
            row("r2", "2026-02-01", dec!(-900.00), "Oak Apartments", "Rent", false),
            row("r3", "2026-03-25", dec!(-1500.00), "Oak Apartments", "Rent", false),
        ];
        let projection = project_remaining_obligations(
            &upcoming_in_cycle,
            &window(),
            day("2026-03-10"),
            CategoryClass::Fixed,
            &FORECAST_POLICY_V1,
        );
        assert_eq!(projection.lines.len(), 1);
        assert_eq!(projection.lines[0].expected, dec!(900.00));
        assert_eq!(projection.lines[0].paid, dec!(0.00));
        assert_eq!(projection.lines[0].occurrences, 2);
        assert_eq!(projection.remaining, dec!(900.00));
    }

    #[test]
    fn overpayment_never_goes_negative() {
        let history = vec![
            row("r1", "2026-01-01", dec!(-900.00), "Oak Apartments", "Rent", false),
            row("r2", "2026-02-01", dec!(-900.00), "Oak Apartments", "Rent", false),
            row("r3", "2026-03-01", dec!(-950.00), "Oak Apartments", "Rent", true),
        ];
        let projection = project_remaining_obligations(
            &history,
            &window(),
            day("2026-03-10"),
            CategoryClass::Fixed,
            &FORECAST_POLICY_V1,
        );
        assert_eq!(projection.remaining, dec!(0));
        assert_eq!(projection.lines[0].paid, dec!(950.00));
    }
}
