use std::path::Path;

use chrono::NaiveDate;

use crate::config::{LoadedConfig, load_config, load_config_from, resolve_config_location};
use crate::intelligence::date::parse_iso_date_strict;
use crate::ledger::STDIN_PATH;
use crate::sources::{Clock, SystemClock};
use crate::{ClientError, ClientResult};

pub(crate) const DEFAULT_USER_ID: &str = "local";

/// Resolves policy config. With `home_override` the process environment is
/// ignored and only `<home>/config.json` is consulted after `explicit`.
pub(crate) fn load_engine_config(
    explicit: Option<&Path>,
    home_override: Option<&Path>,
) -> ClientResult<LoadedConfig> {
    match home_override {
        Some(home) => load_config_from(resolve_config_location(
            explicit,
            None,
            Some(home.as_os_str().to_os_string()),
            None,
        )),
        None => load_config(explicit),
    }
}

pub(crate) fn resolve_today(value: Option<&str>, command: &str) -> ClientResult<NaiveDate> {
    match value {
        Some(raw) => parse_iso_date_strict(raw, "today", command),
        None => Ok(SystemClock.today()),
    }
}

pub(crate) fn ensure_single_stdin(paths: &[&str], command: &str) -> ClientResult<()> {
    if paths.iter().filter(|path| **path == STDIN_PATH).count() > 1 {
        return Err(ClientError::invalid_argument_for_command(
            "Only one input can be read from stdin (`-`) per run.",
            Some(command),
        ));
    }
    Ok(())
}

pub(crate) fn config_label(loaded: &LoadedConfig) -> Option<String> {
    loaded.path.as_ref().map(|path| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::{ensure_single_stdin, resolve_today};

    #[test]
    fn stdin_can_back_one_input_only() {
        assert!(ensure_single_stdin(&["-", "balances.csv"], "forecast").is_ok());
        assert!(ensure_single_stdin(&["-", "-"], "forecast").is_err());
    }

    #[test]
    fn today_override_must_be_iso_date() {
        assert!(resolve_today(Some("2026-03-10"), "forecast").is_ok());
        assert!(resolve_today(Some("03/10/2026"), "forecast").is_err());
    }
}
