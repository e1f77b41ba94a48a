use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::intelligence::money::{floor_money, round_ratio};

/// Forecast policy identifier, emitted with every safe-to-spend result so
/// threshold changes stay auditable.
pub const FORECAST_POLICY_VERSION: &str = "forecast/v1";

pub const ANOMALIES_POLICY_VERSION: &str = "anomalies/v1";

/// Tunable constants for the safe-to-spend path.
///
/// Notes:
/// - The budget fallback order (previous cycle, current cycle, default) and
///   the adjustment clamp are heuristics. They are kept stable for result
///   compatibility but may be overridden through config.
/// - `pace_sensitivity` scales how strongly pace deviations move the allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ForecastPolicy {
    pub min_cycle_days: i64,
    pub max_cycle_days: i64,
    pub default_variable_budget: Decimal,
    pub pace_sensitivity: Decimal,
    pub min_adjustment: Decimal,
    pub max_adjustment: Decimal,
    pub roll_carry_share: Decimal,
    pub roll_cap_multiplier: Decimal,
    pub safety_buffer: Decimal,
    pub min_obligation_occurrences: usize,
    pub ahead_of_pace_ratio: Decimal,
    pub behind_pace_ratio: Decimal,
    pub history_lookback_days: i64,
}

impl ForecastPolicy {
    pub fn clamp_cycle_length(self, days: i64) -> i64 {
        days.max(self.min_cycle_days).min(self.max_cycle_days)
    }

    pub fn adjustment_for_pace(self, pace_ratio: Decimal) -> Decimal {
        let raw = Decimal::ONE - self.pace_sensitivity * (pace_ratio - Decimal::ONE);
        round_ratio(raw.max(self.min_adjustment).min(self.max_adjustment))
    }

    pub fn roll_cap(self, daily_base: Decimal) -> Decimal {
        floor_money((daily_base * self.roll_cap_multiplier).max(Decimal::ZERO))
    }

    pub fn is_ahead_of_pace(self, pace_ratio: Decimal) -> bool {
        pace_ratio > self.ahead_of_pace_ratio
    }

    pub fn is_behind_pace(self, pace_ratio: Decimal) -> bool {
        pace_ratio < self.behind_pace_ratio
    }
}

pub const FORECAST_POLICY_V1: ForecastPolicy = ForecastPolicy {
    min_cycle_days: 7,
    max_cycle_days: 45,
    default_variable_budget: dec!(500.00),
    pace_sensitivity: dec!(0.5),
    min_adjustment: dec!(0.85),
    max_adjustment: dec!(1.15),
    roll_carry_share: dec!(0.5),
    roll_cap_multiplier: dec!(1.5),
    safety_buffer: dec!(100.00),
    min_obligation_occurrences: 2,
    ahead_of_pace_ratio: dec!(1.10),
    behind_pace_ratio: dec!(0.80),
    history_lookback_days: 180,
};

/// Outlier scoring policy.
///
/// `min_cohort_samples` counts baseline rows only; the scored transaction is
/// never part of its own baseline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnomaliesPolicy {
    pub min_cohort_samples: usize,
    pub zscore_threshold: f64,
    pub iqr_multiplier: f64,
    pub medium_severity_score: f64,
    pub high_severity_score: f64,
}

impl AnomaliesPolicy {
    pub fn zscore_fires(self, score: f64) -> bool {
        score.is_finite() && score.abs() >= self.zscore_threshold
    }

    pub fn severity_for_score(self, score: f64) -> &'static str {
        let magnitude = score.abs();
        if magnitude >= self.high_severity_score {
            return "high";
        }
        if magnitude >= self.medium_severity_score {
            return "medium";
        }
        "low"
    }
}

pub const ANOMALIES_POLICY_V1: AnomaliesPolicy = AnomaliesPolicy {
    min_cohort_samples: 3,
    zscore_threshold: 2.0,
    iqr_multiplier: 1.5,
    medium_severity_score: 3.0,
    high_severity_score: 4.0,
};
