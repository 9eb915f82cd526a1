//! Runtime configuration with serde defaults and environment overrides

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

const ENV_PREFIX: &str = "CHRONOFORGE_";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub selector: SelectorConfig,

    #[serde(default)]
    pub jobs: JobConfig,
}

/// Settings of the forecast selector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Share of the series used for training during evaluation
    #[serde(default = "default_train_fraction")]
    pub train_fraction: f64,

    /// Largest accepted forecast horizon
    #[serde(default = "default_max_horizon")]
    pub max_horizon: usize,

    /// Fit candidates on the rayon pool instead of one after another
    #[serde(default = "default_parallel")]
    pub parallel: bool,

    /// Also refit every scored candidate and report its full forecast
    #[serde(default)]
    pub refit_all: bool,

    #[serde(default)]
    pub models: ModelConfig,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            train_fraction: default_train_fraction(),
            max_horizon: default_max_horizon(),
            parallel: default_parallel(),
            refit_all: false,
            models: ModelConfig::default(),
        }
    }
}

/// Hyperparameters shared by the windowed models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            seed: default_seed(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    /// Finished jobs older than this are dropped by cleanup
    #[serde(default = "default_max_age_hours")]
    pub max_age_hours: i64,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            max_age_hours: default_max_age_hours(),
        }
    }
}

fn default_train_fraction() -> f64 {
    0.8
}
fn default_max_horizon() -> usize {
    30
}
fn default_parallel() -> bool {
    true
}
fn default_window_size() -> usize {
    5
}
fn default_seed() -> u64 {
    42
}
fn default_max_age_hours() -> i64 {
    24
}

impl AppConfig {
    /// Read a JSON config file; missing keys take their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: AppConfig = serde_json::from_str(&text)
            .map_err(|e| ForecastError::ConfigError(format!("{}: {}", path.as_ref().display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults, then the optional file, then `CHRONOFORGE_*` variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_json_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup, normally the process environment
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        if let Some(v) = get("TRAIN_FRACTION") {
            self.selector.train_fraction = parse_value("TRAIN_FRACTION", &v)?;
        }
        if let Some(v) = get("MAX_HORIZON") {
            self.selector.max_horizon = parse_value("MAX_HORIZON", &v)?;
        }
        if let Some(v) = get("PARALLEL") {
            self.selector.parallel = parse_value("PARALLEL", &v)?;
        }
        if let Some(v) = get("REFIT_ALL") {
            self.selector.refit_all = parse_value("REFIT_ALL", &v)?;
        }
        if let Some(v) = get("WINDOW_SIZE") {
            self.selector.models.window_size = parse_value("WINDOW_SIZE", &v)?;
        }
        if let Some(v) = get("SEED") {
            self.selector.models.seed = parse_value("SEED", &v)?;
        }
        if let Some(v) = get("JOB_MAX_AGE_HOURS") {
            self.jobs.max_age_hours = parse_value("JOB_MAX_AGE_HOURS", &v)?;
        }

        debug!(config = ?self, "Configuration overrides applied");
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let selector = &self.selector;
        if !(0.0..=1.0).contains(&selector.train_fraction) {
            return Err(ForecastError::ConfigError(format!(
                "train_fraction must be within [0, 1], got {}",
                selector.train_fraction
            )));
        }
        if selector.max_horizon == 0 {
            return Err(ForecastError::ConfigError(
                "max_horizon must be at least 1".to_string(),
            ));
        }
        if selector.models.window_size == 0 {
            return Err(ForecastError::ConfigError(
                "window_size must be at least 1".to_string(),
            ));
        }
        if self.jobs.max_age_hours < 0 {
            return Err(ForecastError::ConfigError(
                "max_age_hours cannot be negative".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim().parse().map_err(|_| {
        ForecastError::ConfigError(format!("{}{} has an invalid value: {}", ENV_PREFIX, name, raw))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn empty_json_gives_defaults() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.selector.train_fraction, 0.8);
        assert_eq!(config.selector.max_horizon, 30);
        assert!(config.selector.parallel);
        assert_eq!(config.selector.models.window_size, 5);
        assert_eq!(config.jobs.max_age_hours, 24);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"selector": {"refit_all": true, "models": {"seed": 7}}}"#).unwrap();
        assert!(config.selector.refit_all);
        assert_eq!(config.selector.models.seed, 7);
        assert_eq!(config.selector.models.window_size, 5);
    }

    #[test]
    fn overrides_take_precedence() {
        let env: HashMap<&str, &str> = [
            ("CHRONOFORGE_PARALLEL", "false"),
            ("CHRONOFORGE_MAX_HORIZON", "60"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert!(!config.selector.parallel);
        assert_eq!(config.selector.max_horizon, 60);
    }

    #[test]
    fn bad_override_is_a_config_error() {
        let mut config = AppConfig::default();
        let err = config
            .apply_overrides(|key| (key == "CHRONOFORGE_SEED").then(|| "forty-two".to_string()))
            .unwrap_err();
        assert!(matches!(err, ForecastError::ConfigError(_)));
    }

    #[test]
    fn validation_rejects_out_of_range_values() {
        let mut config = AppConfig::default();
        config.selector.train_fraction = 1.5;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.selector.max_horizon = 0;
        assert!(config.validate().is_err());
    }
}
