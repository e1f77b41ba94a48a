use safespend_client::commands;
use safespend_client::{ClientResult, SuccessEnvelope};

use crate::cli::{Cli, Commands};

pub fn dispatch(cli: &Cli) -> ClientResult<SuccessEnvelope> {
    match &cli.command {
        Commands::Forecast {
            transactions,
            balances,
            month,
            today,
            user,
            config,
            ..
        } => commands::safe_to_spend::run(
            transactions,
            balances,
            month.as_deref(),
            today.as_ref().map(|value| value.as_str()),
            user.as_deref(),
            config.as_deref(),
        ),
        Commands::Anomalies {
            transactions,
            from,
            to,
            config,
            ..
        } => commands::anomalies::run(
            transactions,
            from.as_ref().map(|value| value.as_str()),
            to.as_ref().map(|value| value.as_str()),
            config.as_deref(),
        ),
    }
}
