pub mod anomalies;
pub mod budget;
pub mod classify;
pub mod compose;
pub mod cycle;
pub mod date;
pub mod money;
pub mod normalize;
pub mod obligations;
pub mod pacing;
pub mod policy;
pub mod stats;
pub mod types;
