use serde::Serialize;

use crate::intelligence::types::{AnomalyInsight, SafeToSpendResult};

/// Where each input came from, echoed back so output is reproducible.
#[derive(Debug, Clone, Serialize)]
pub struct InputSources {
    pub transactions: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balances: Option<String>,
    pub config: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForecastData {
    pub user_id: String,
    pub focus_month: String,
    pub today: String,
    pub sources: InputSources,
    #[serde(flatten)]
    pub result: SafeToSpendResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnomaliesData {
    pub from: Option<String>,
    pub to: Option<String>,
    pub policy_version: String,
    pub sources: InputSources,
    pub rows: Vec<AnomalyInsight>,
}
