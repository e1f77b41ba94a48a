use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::intelligence::money::{round_f64, round_money, sum_money};
use crate::intelligence::normalize::{category_key, display_label, merchant_key};
use crate::intelligence::policy::{ANOMALIES_POLICY_V1, AnomaliesPolicy};
use crate::intelligence::stats::CohortStats;
use crate::intelligence::types::{AnomalyInsight, AnomalyMethod, CohortKind, Transaction};

/// Request-local arena: normalized key -> indexes into the candidate list.
type CohortIndex = BTreeMap<String, Vec<usize>>;

pub fn detect_anomalies(transactions: &[Transaction]) -> Vec<AnomalyInsight> {
    detect_anomalies_with_policy(transactions, &ANOMALIES_POLICY_V1)
}

/// Scores every posted outflow against its peers. A transaction is compared
/// with the other outflows of its merchant, or of its category when the
/// merchant cohort is too small; the transaction itself never sits in its own
/// baseline.
pub fn detect_anomalies_with_policy(
    transactions: &[Transaction],
    policy: &AnomaliesPolicy,
) -> Vec<AnomalyInsight> {
    let candidates = transactions
        .iter()
        .filter(|transaction| !transaction.pending && transaction.is_outflow())
        .collect::<Vec<&Transaction>>();
    let window_outflow = sum_money(candidates.iter().map(|transaction| transaction.abs_amount()));

    let mut by_merchant = CohortIndex::new();
    let mut by_category = CohortIndex::new();
    for (index, transaction) in candidates.iter().enumerate() {
        if let Some(key) = merchant_key(&transaction.merchant_name) {
            by_merchant.entry(key).or_default().push(index);
        }
        if let Some(key) = category_key(transaction.category.as_deref()) {
            by_category.entry(key).or_default().push(index);
        }
    }

    let mut insights = Vec::new();
    for (index, transaction) in candidates.iter().enumerate() {
        let Some((cohort, peers)) =
            baseline_for(index, transaction, &candidates, &by_merchant, &by_category, policy)
        else {
            tracing::debug!(
                transaction_id = %transaction.id,
                "no cohort large enough; transaction not scored"
            );
            continue;
        };
        let Some(stats) = CohortStats::from_amounts(&peers) else {
            tracing::debug!(
                transaction_id = %transaction.id,
                cohort = cohort.as_str(),
                "cohort statistics not representable; skipped"
            );
            continue;
        };

        let amount = transaction.abs_amount();
        let zscore = stats
            .z_score(amount)
            .filter(|score| policy.zscore_fires(*score));
        let iqr = stats.iqr_excess(amount, policy.iqr_multiplier);
        let (method, raw_score) = match (zscore, iqr) {
            (Some(score), _) => (AnomalyMethod::ZScore, score),
            (None, Some(excess)) => (AnomalyMethod::Iqr, excess),
            (None, None) => continue,
        };
        let score = round_f64(raw_score, 4);
        tracing::debug!(
            transaction_id = %transaction.id,
            method = method.as_str(),
            score,
            "transaction flagged"
        );
        let merchant_name = display_label(&transaction.merchant_name);
        let commentary = commentary_for(
            &merchant_name,
            amount,
            &stats,
            cohort,
            zscore,
            iqr.is_some(),
        );

        insights.push(AnomalyInsight {
            transaction_id: transaction.id.clone(),
            method,
            score,
            amount: round_money(amount),
            delta_amount: round_money(amount - stats.mean),
            budget_impact_percent: budget_impact_percent(amount, window_outflow),
            merchant_name,
            commentary,
            occurred_on: transaction.occurred_on(),
            cohort,
            cohort_size: stats.size,
            severity: policy.severity_for_score(score).to_string(),
        });
    }

    insights.sort_by(|left, right| {
        left.occurred_on
            .cmp(&right.occurred_on)
            .then_with(|| left.transaction_id.cmp(&right.transaction_id))
    });

    tracing::debug!(
        scored = candidates.len(),
        flagged = insights.len(),
        "anomaly detection complete"
    );
    insights
}

/// Share of the window's posted outflow taken by one transaction, in percent.
pub fn budget_impact_percent(amount: Decimal, window_outflow: Decimal) -> Decimal {
    if window_outflow <= Decimal::ZERO {
        return round_money(Decimal::ZERO);
    }
    amount
        .checked_div(window_outflow)
        .map(|share| round_money(share * Decimal::ONE_HUNDRED))
        .unwrap_or_else(|| round_money(Decimal::ZERO))
}

fn baseline_for(
    index: usize,
    transaction: &Transaction,
    candidates: &[&Transaction],
    by_merchant: &CohortIndex,
    by_category: &CohortIndex,
    policy: &AnomaliesPolicy,
) -> Option<(CohortKind, Vec<Decimal>)> {
    let merchant_peers = merchant_key(&transaction.merchant_name)
        .and_then(|key| by_merchant.get(&key))
        .map(|members| peer_amounts(members, index, candidates))
        .unwrap_or_default();
    if merchant_peers.len() >= policy.min_cohort_samples {
        return Some((CohortKind::Merchant, merchant_peers));
    }

    let category_peers = category_key(transaction.category.as_deref())
        .and_then(|key| by_category.get(&key))
        .map(|members| peer_amounts(members, index, candidates))
        .unwrap_or_default();
    if category_peers.len() >= policy.min_cohort_samples {
        return Some((CohortKind::Category, category_peers));
    }
    None
}

fn peer_amounts(members: &[usize], skip: usize, candidates: &[&Transaction]) -> Vec<Decimal> {
    members
        .iter()
        .filter(|member| **member != skip)
        .filter_map(|member| candidates.get(*member))
        .map(|transaction| transaction.abs_amount())
        .collect()
}

fn commentary_for(
    merchant_name: &str,
    amount: Decimal,
    stats: &CohortStats,
    cohort: CohortKind,
    zscore: Option<f64>,
    outside_iqr: bool,
) -> String {
    let amount = round_money(amount);
    let typical = round_money(stats.mean);
    let scope = match cohort {
        CohortKind::Merchant => "this merchant",
        CohortKind::Category => "this category",
    };

    match zscore {
        Some(score) => {
            let direction = if score >= 0.0 { "above" } else { "below" };
            let mut text = format!(
                "{amount} at {merchant_name} is {:.1} standard deviations {direction} the typical {typical} for {scope}.",
                score.abs()
            );
            if outside_iqr {
                text.push_str(" It also falls outside the interquartile range.");
            }
            text
        }
        None => format!(
            "{amount} at {merchant_name} falls outside the usual range of {} to {} for {scope}.",
            round_money(stats.q1),
            round_money(stats.q3)
        ),
    }
}
