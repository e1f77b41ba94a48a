pub mod anomalies;
pub(crate) mod common;
pub mod safe_to_spend;
