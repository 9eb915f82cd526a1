//! Forecast request parameters

use crate::error::{ForecastError, Result};
use crate::models::ModelKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which model the caller wants: every candidate, or exactly one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ModelChoice {
    #[default]
    Auto,
    Pinned(ModelKind),
}

impl FromStr for ModelChoice {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("auto") {
            return Ok(ModelChoice::Auto);
        }
        s.parse().map(ModelChoice::Pinned)
    }
}

impl TryFrom<String> for ModelChoice {
    type Error = ForecastError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ModelChoice> for String {
    fn from(choice: ModelChoice) -> Self {
        choice.to_string()
    }
}

impl fmt::Display for ModelChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelChoice::Auto => f.write_str("auto"),
            ModelChoice::Pinned(kind) => write!(f, "{}", kind),
        }
    }
}

/// Parameters of one forecast call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRequest {
    #[serde(default)]
    pub model: ModelChoice,

    /// Number of future steps to predict
    #[serde(default = "default_horizon")]
    pub horizon: usize,

    /// Two-sided level of the returned bounds
    #[serde(default = "default_confidence_level")]
    pub confidence_level: f64,
}

fn default_horizon() -> usize {
    7
}

fn default_confidence_level() -> f64 {
    0.95
}

impl Default for ForecastRequest {
    fn default() -> Self {
        Self {
            model: ModelChoice::Auto,
            horizon: default_horizon(),
            confidence_level: default_confidence_level(),
        }
    }
}

impl ForecastRequest {
    /// Auto request for `horizon` steps at the default confidence level
    pub fn new(horizon: usize) -> Self {
        Self {
            horizon,
            ..Self::default()
        }
    }

    pub fn with_model(mut self, model: ModelChoice) -> Self {
        self.model = model;
        self
    }

    pub fn pinned(self, kind: ModelKind) -> Self {
        self.with_model(ModelChoice::Pinned(kind))
    }

    pub fn with_confidence_level(mut self, level: f64) -> Self {
        self.confidence_level = level;
        self
    }
}
