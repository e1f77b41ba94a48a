use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::intelligence::money::to_f64;

/// Baseline statistics over one cohort of absolute amounts.
#[derive(Debug, Clone, PartialEq)]
pub struct CohortStats {
    pub size: usize,
    pub mean: Decimal,
    pub std_dev: f64,
    pub q1: Decimal,
    pub q3: Decimal,
}

impl CohortStats {
    /// Returns `None` for empty cohorts or when the mean, variance or quartiles
    /// cannot be represented.
    pub fn from_amounts(amounts: &[Decimal]) -> Option<Self> {
        if amounts.is_empty() {
            return None;
        }
        let mut sorted = amounts.to_vec();
        sorted.sort();

        let mean = mean(&sorted)?;
        let std_dev = sample_variance(&sorted, mean)
            .and_then(to_f64)
            .map(f64::sqrt)
            .filter(|value| value.is_finite())?;
        Some(Self {
            size: sorted.len(),
            mean,
            std_dev,
            q1: quantile(&sorted, Decimal::new(25, 2))?,
            q3: quantile(&sorted, Decimal::new(75, 2))?,
        })
    }

    pub fn iqr(&self) -> Decimal {
        self.q3 - self.q1
    }

    /// Standard score of `amount`; `None` when the cohort has no spread.
    pub fn z_score(&self, amount: Decimal) -> Option<f64> {
        if self.std_dev <= f64::EPSILON {
            return None;
        }
        let delta = to_f64(amount - self.mean)?;
        Some(delta / self.std_dev).filter(|score| score.is_finite())
    }

    /// Distance past the nearest fence measured in IQR units; positive above
    /// Q3, negative below Q1. `None` when inside the fences or IQR is zero.
    pub fn iqr_excess(&self, amount: Decimal, multiplier: f64) -> Option<f64> {
        let iqr = self.iqr();
        if iqr <= Decimal::ZERO {
            return None;
        }
        let iqr_f = to_f64(iqr)?;
        if amount > self.q3 {
            let excess = to_f64(amount - self.q3)? / iqr_f;
            return (excess > multiplier).then_some(excess);
        }
        if amount < self.q1 {
            let excess = to_f64(amount - self.q1)? / iqr_f;
            return (-excess > multiplier).then_some(excess);
        }
        None
    }
}

pub fn mean(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    let total = values
        .iter()
        .try_fold(Decimal::ZERO, |total, value| total.checked_add(*value))?;
    total.checked_div(Decimal::from(values.len()))
}

/// Sample (n - 1) variance.
pub fn sample_variance(values: &[Decimal], mean: Decimal) -> Option<Decimal> {
    if values.len() < 2 {
        return None;
    }
    let squared = values.iter().try_fold(Decimal::ZERO, |total, value| {
        let deviation = value.checked_sub(mean)?;
        total.checked_add(deviation.checked_mul(deviation)?)
    })?;
    squared.checked_div(Decimal::from(values.len() - 1))
}

/// Median of an already sorted slice.
pub fn median(sorted: &[Decimal]) -> Option<Decimal> {
    if sorted.is_empty() {
        return None;
    }
    let middle = sorted.len() / 2;
    if sorted.len().is_multiple_of(2) {
        return sorted[middle - 1]
            .checked_add(sorted[middle])?
            .checked_div(Decimal::TWO);
    }
    Some(sorted[middle])
}

/// Linear-interpolation quantile of an already sorted slice.
pub fn quantile(sorted: &[Decimal], probability: Decimal) -> Option<Decimal> {
    if sorted.is_empty() {
        return None;
    }
    let position = Decimal::from(sorted.len() - 1).checked_mul(probability)?;
    let lower_position = position.floor();
    let lower = lower_position.to_usize()?;
    let upper = (lower + 1).min(sorted.len() - 1);
    let fraction = position - lower_position;
    let low_value = *sorted.get(lower)?;
    let high_value = *sorted.get(upper)?;
    let step = high_value.checked_sub(low_value)?.checked_mul(fraction)?;
    low_value.checked_add(step)
}
