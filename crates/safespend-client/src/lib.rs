pub mod commands;
pub mod config;
pub mod contracts;
pub mod engine;
pub mod error;
pub mod intelligence;
pub mod ledger;
pub mod sources;

pub use config::EngineConfig;
pub use contracts::envelope::{FailureEnvelope, SuccessEnvelope};
pub use engine::ForecastEngine;
pub use error::{ClientError, ClientResult};
pub use intelligence::types::{
    AccountBalance, AnomalyInsight, AnomalyMethod, SafeToSpendResult, Transaction,
};
pub use sources::{BalanceSource, Clock, FixedClock, SystemClock, TransactionSource};

pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");
