use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::intelligence::money::{MAX_ABS_AMOUNT, is_representable_amount};
use crate::intelligence::policy::{
    ANOMALIES_POLICY_V1, AnomaliesPolicy, FORECAST_POLICY_V1, ForecastPolicy,
};
use crate::{ClientError, ClientResult};

pub const CONFIG_ENV_VAR: &str = "SAFESPEND_CONFIG";
pub const HOME_ENV_VAR: &str = "SAFESPEND_HOME";
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Longest cycle a config may allow.
pub const CYCLE_DAYS_LIMIT: i64 = 366;
/// Longest history lookback a config may request, about a century.
pub const LOOKBACK_DAYS_LIMIT: i64 = 36_500;

/// Policies in force for one engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EngineConfig {
    pub forecast: ForecastPolicy,
    pub anomalies: AnomaliesPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            forecast: FORECAST_POLICY_V1,
            anomalies: ANOMALIES_POLICY_V1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOrigin {
    Explicit,
    Environment,
    DefaultLocation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLocation {
    pub path: PathBuf,
    pub origin: ConfigOrigin,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    pub config: EngineConfig,
    /// File the overrides came from; `None` when built-in defaults apply.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    forecast: ForecastOverrides,
    #[serde(default)]
    anomalies: AnomaliesOverrides,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ForecastOverrides {
    min_cycle_days: Option<i64>,
    max_cycle_days: Option<i64>,
    default_variable_budget: Option<Decimal>,
    pace_sensitivity: Option<Decimal>,
    min_adjustment: Option<Decimal>,
    max_adjustment: Option<Decimal>,
    roll_carry_share: Option<Decimal>,
    roll_cap_multiplier: Option<Decimal>,
    safety_buffer: Option<Decimal>,
    min_obligation_occurrences: Option<usize>,
    ahead_of_pace_ratio: Option<Decimal>,
    behind_pace_ratio: Option<Decimal>,
    history_lookback_days: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct AnomaliesOverrides {
    min_cohort_samples: Option<usize>,
    zscore_threshold: Option<f64>,
    iqr_multiplier: Option<f64>,
    medium_severity_score: Option<f64>,
    high_severity_score: Option<f64>,
}

impl ForecastOverrides {
    fn apply(self, policy: &mut ForecastPolicy) {
        let ForecastOverrides {
            min_cycle_days,
            max_cycle_days,
            default_variable_budget,
            pace_sensitivity,
            min_adjustment,
            max_adjustment,
            roll_carry_share,
            roll_cap_multiplier,
            safety_buffer,
            min_obligation_occurrences,
            ahead_of_pace_ratio,
            behind_pace_ratio,
            history_lookback_days,
        } = self;
        set(&mut policy.min_cycle_days, min_cycle_days);
        set(&mut policy.max_cycle_days, max_cycle_days);
        set(&mut policy.default_variable_budget, default_variable_budget);
        set(&mut policy.pace_sensitivity, pace_sensitivity);
        set(&mut policy.min_adjustment, min_adjustment);
        set(&mut policy.max_adjustment, max_adjustment);
        set(&mut policy.roll_carry_share, roll_carry_share);
        set(&mut policy.roll_cap_multiplier, roll_cap_multiplier);
        set(&mut policy.safety_buffer, safety_buffer);
        set(&mut policy.min_obligation_occurrences, min_obligation_occurrences);
        set(&mut policy.ahead_of_pace_ratio, ahead_of_pace_ratio);
        set(&mut policy.behind_pace_ratio, behind_pace_ratio);
        set(&mut policy.history_lookback_days, history_lookback_days);
    }
}

impl AnomaliesOverrides {
    fn apply(self, policy: &mut AnomaliesPolicy) {
        set(&mut policy.min_cohort_samples, self.min_cohort_samples);
        set(&mut policy.zscore_threshold, self.zscore_threshold);
        set(&mut policy.iqr_multiplier, self.iqr_multiplier);
        set(&mut policy.medium_severity_score, self.medium_severity_score);
        set(&mut policy.high_severity_score, self.high_severity_score);
    }
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

impl EngineConfig {
    /// Parses a JSON override document on top of the built-in policies.
    pub fn from_json_str(content: &str, path: &Path) -> ClientResult<Self> {
        let file = serde_json::from_str::<ConfigFile>(content)
            .map_err(|error| ClientError::config_invalid(path, &error.to_string()))?;
        let mut config = Self::default();
        file.forecast.apply(&mut config.forecast);
        file.anomalies.apply(&mut config.anomalies);
        config
            .validate()
            .map_err(|detail| ClientError::config_invalid(path, &detail))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        let forecast = &self.forecast;
        let zero = Decimal::ZERO;
        if forecast.min_cycle_days < 1 || forecast.min_cycle_days > forecast.max_cycle_days {
            return Err("`forecast.min_cycle_days` must be at least 1 and not exceed `forecast.max_cycle_days`.".to_string());
        }
        if forecast.max_cycle_days > CYCLE_DAYS_LIMIT {
            return Err(format!("`forecast.max_cycle_days` must not exceed {CYCLE_DAYS_LIMIT}."));
        }
        if forecast.default_variable_budget < zero || forecast.safety_buffer < zero {
            return Err("`forecast.default_variable_budget` and `forecast.safety_buffer` must not be negative.".to_string());
        }
        if forecast.pace_sensitivity < zero || forecast.roll_cap_multiplier < zero {
            return Err("`forecast.pace_sensitivity` and `forecast.roll_cap_multiplier` must not be negative.".to_string());
        }
        if forecast.min_adjustment <= zero || forecast.min_adjustment > forecast.max_adjustment {
            return Err("`forecast.min_adjustment` must be positive and not exceed `forecast.max_adjustment`.".to_string());
        }
        if forecast.roll_carry_share < zero || forecast.roll_carry_share > Decimal::ONE {
            return Err("`forecast.roll_carry_share` must be between 0 and 1.".to_string());
        }
        if forecast.behind_pace_ratio > forecast.ahead_of_pace_ratio {
            return Err("`forecast.behind_pace_ratio` must not exceed `forecast.ahead_of_pace_ratio`.".to_string());
        }
        if forecast.min_obligation_occurrences < 1 || forecast.history_lookback_days < 1 {
            return Err("`forecast.min_obligation_occurrences` and `forecast.history_lookback_days` must be at least 1.".to_string());
        }
        if forecast.history_lookback_days > LOOKBACK_DAYS_LIMIT {
            return Err(format!("`forecast.history_lookback_days` must not exceed {LOOKBACK_DAYS_LIMIT}."));
        }
        if !is_representable_amount(forecast.default_variable_budget)
            || !is_representable_amount(forecast.safety_buffer)
        {
            return Err(format!("`forecast.default_variable_budget` and `forecast.safety_buffer` must not exceed {MAX_ABS_AMOUNT}."));
        }

        let anomalies = &self.anomalies;
        if anomalies.min_cohort_samples < 2 {
            return Err("`anomalies.min_cohort_samples` must be at least 2.".to_string());
        }
        let positive = |value: f64| value.is_finite() && value > 0.0;
        if !positive(anomalies.zscore_threshold) || !positive(anomalies.iqr_multiplier) {
            return Err("`anomalies.zscore_threshold` and `anomalies.iqr_multiplier` must be positive.".to_string());
        }
        if !positive(anomalies.medium_severity_score)
            || anomalies.medium_severity_score > anomalies.high_severity_score
        {
            return Err("`anomalies.medium_severity_score` must be positive and not exceed `anomalies.high_severity_score`.".to_string());
        }
        Ok(())
    }
}

/// Loads config using the process environment.
pub fn load_config(explicit: Option<&Path>) -> ClientResult<LoadedConfig> {
    let location = resolve_config_location(
        explicit,
        std::env::var_os(CONFIG_ENV_VAR),
        std::env::var_os(HOME_ENV_VAR),
        home::home_dir(),
    );
    load_config_from(location)
}

/// Precedence: explicit path, `SAFESPEND_CONFIG`, `$SAFESPEND_HOME/config.json`,
/// then `~/.safespend/config.json`.
pub fn resolve_config_location(
    explicit: Option<&Path>,
    env_config: Option<OsString>,
    env_home: Option<OsString>,
    home_dir: Option<PathBuf>,
) -> Option<ConfigLocation> {
    if let Some(path) = explicit {
        return Some(ConfigLocation {
            path: path.to_path_buf(),
            origin: ConfigOrigin::Explicit,
        });
    }
    if let Some(path) = env_config.filter(|value| !value.is_empty()) {
        return Some(ConfigLocation {
            path: PathBuf::from(path),
            origin: ConfigOrigin::Environment,
        });
    }
    let home = match env_home.filter(|value| !value.is_empty()) {
        Some(path) => PathBuf::from(path),
        None => home_dir?.join(".safespend"),
    };
    Some(ConfigLocation {
        path: home.join(CONFIG_FILE_NAME),
        origin: ConfigOrigin::DefaultLocation,
    })
}

pub fn load_config_from(location: Option<ConfigLocation>) -> ClientResult<LoadedConfig> {
    let Some(location) = location else {
        tracing::debug!("no home directory; using built-in policies");
        return Ok(LoadedConfig {
            config: EngineConfig::default(),
            path: None,
        });
    };

    let content = match fs::read_to_string(&location.path) {
        Ok(content) => content,
        Err(error)
            if error.kind() == std::io::ErrorKind::NotFound
                && location.origin == ConfigOrigin::DefaultLocation =>
        {
            tracing::debug!(
                path = %location.path.display(),
                "no config file at default location; using built-in policies"
            );
            return Ok(LoadedConfig {
                config: EngineConfig::default(),
                path: None,
            });
        }
        Err(error) => {
            return Err(ClientError::source_read_failed(
                &location.path,
                &error.to_string(),
            ));
        }
    };

    let config = EngineConfig::from_json_str(&content, &location.path)?;
    tracing::debug!(path = %location.path.display(), "loaded policy overrides");
    Ok(LoadedConfig {
        config,
        path: Some(location.path),
    })
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;
    use std::path::{Path, PathBuf};

    use rust_decimal_macros::dec;

    use super::{
        ConfigLocation, ConfigOrigin, EngineConfig, load_config_from, resolve_config_location,
    };

    #[test]
    fn explicit_path_wins_over_environment() {
        let location = resolve_config_location(
            Some(Path::new("/etc/safespend.json")),
            Some(OsString::from("/env/config.json")),
            Some(OsString::from("/env/home")),
            Some(PathBuf::from("/home/user")),
        );
        assert_eq!(
            location,
            Some(ConfigLocation {
                path: PathBuf::from("/etc/safespend.json"),
                origin: ConfigOrigin::Explicit,
            })
        );
    }

    #[test]
    fn safespend_home_precedes_user_home() {
        let location =
            resolve_config_location(None, None, Some(OsString::from("/data/ss")), None);
        assert_eq!(
            location.map(|found| found.path),
            Some(PathBuf::from("/data/ss/config.json"))
        );

        let fallback =
            resolve_config_location(None, None, None, Some(PathBuf::from("/home/user")));
        assert_eq!(
            fallback.map(|found| (found.path, found.origin)),
            Some((
                PathBuf::from("/home/user/.safespend/config.json"),
                ConfigOrigin::DefaultLocation
            ))
        );
    }

    #[test]
    fn overrides_apply_on_top_of_defaults() {
        let parsed = EngineConfig::from_json_str(
            r#"{"forecast": {"safety_buffer": 250, "min_adjustment": "0.90"}, "anomalies": {"zscore_threshold": 3.0}}"#,
            Path::new("config.json"),
        );
        assert!(parsed.is_ok());
        if let Ok(config) = parsed {
            assert_eq!(config.forecast.safety_buffer, dec!(250));
            assert_eq!(config.forecast.min_adjustment, dec!(0.90));
            assert_eq!(config.forecast.max_adjustment, dec!(1.15));
            assert_eq!(config.anomalies.zscore_threshold, 3.0);
            assert_eq!(config.anomalies.min_cohort_samples, 3);
        }
    }

    #[test]
    fn invalid_overrides_are_rejected() {
        let unordered = EngineConfig::from_json_str(
            r#"{"forecast": {"min_adjustment": "1.2", "max_adjustment": "1.1"}}"#,
            Path::new("config.json"),
        );
        assert!(unordered.is_err());
        if let Err(error) = unordered {
            assert_eq!(error.code, "config_invalid");
        }

        let tiny_cohort = EngineConfig::from_json_str(
            r#"{"anomalies": {"min_cohort_samples": 1}}"#,
            Path::new("config.json"),
        );
        assert!(tiny_cohort.is_err());

        let unknown = EngineConfig::from_json_str(
            r#"{"forecast": {"buffer": 10}}"#,
            Path::new("config.json"),
        );
        assert!(unknown.is_err());
    }

    #[test]
    fn out_of_range_windows_are_rejected() {
        for content in [
            r#"{"forecast": {"history_lookback_days": 200000000000000}}"#,
            r#"{"forecast": {"max_cycle_days": 100000000000}}"#,
            r#"{"forecast": {"safety_buffer": "1000000000000000.00"}}"#,
        ] {
            let parsed = EngineConfig::from_json_str(content, Path::new("config.json"));
            assert!(parsed.is_err(), "{content} should be rejected");
            if let Err(error) = parsed {
                assert_eq!(error.code, "config_invalid");
            }
        }

        let century = EngineConfig::from_json_str(
            r#"{"forecast": {"history_lookback_days": 36500, "max_cycle_days": 366}}"#,
            Path::new("config.json"),
        );
        assert!(century.is_ok());
    }

    #[test]
    fn missing_default_file_means_defaults() {
        let temp = tempfile::tempdir();
        assert!(temp.is_ok());
        if let Ok(dir) = temp {
            let loaded = load_config_from(Some(ConfigLocation {
                path: dir.path().join("config.json"),
                origin: ConfigOrigin::DefaultLocation,
            }));
            assert!(loaded.is_ok());
            if let Ok(found) = loaded {
                assert_eq!(found.config, EngineConfig::default());
                assert_eq!(found.path, None);
            }

            let explicit = load_config_from(Some(ConfigLocation {
                path: dir.path().join("missing.json"),
                origin: ConfigOrigin::Explicit,
            }));
            assert!(explicit.is_err());
            if let Err(error) = explicit {
                assert_eq!(error.code, "source_read_failed");
            }
        }
    }
}
