use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

pub const MONEY_SCALE: u32 = 2;
pub const RATIO_SCALE: u32 = 4;

/// Largest absolute amount accepted on a row or balance. Keeps sums and
/// squared deviations well inside `Decimal` range.
pub const MAX_ABS_AMOUNT: Decimal = dec!(1000000000000.00);

pub fn is_representable_amount(value: Decimal) -> bool {
    value.abs() <= MAX_ABS_AMOUNT
}

/// Rounds half-up to cents and pins the scale so `150` renders as `150.00`.
pub fn round_money(value: Decimal) -> Decimal {
    round_scaled(value, MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

pub fn round_ratio(value: Decimal) -> Decimal {
    round_scaled(value, RATIO_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Truncates toward zero at cents. Used for ceilings that must never be exceeded
/// after rounding.
pub fn floor_money(value: Decimal) -> Decimal {
    round_scaled(value, MONEY_SCALE, RoundingStrategy::ToZero)
}

pub fn sum_money<I>(values: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    round_money(
        values
            .into_iter()
            .fold(Decimal::ZERO, |total, value| total.saturating_add(value)),
    )
}

pub fn to_f64(value: Decimal) -> Option<f64> {
    value.to_f64().filter(|number| number.is_finite())
}

pub fn round_f64(value: f64, decimals: u32) -> f64 {
    let exponent = i32::try_from(decimals).unwrap_or(2);
    let factor = 10_f64.powi(exponent);
    (value * factor).round() / factor
}

fn round_scaled(value: Decimal, scale: u32, strategy: RoundingStrategy) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(scale, strategy);
    rounded.rescale(scale);
    rounded
}
