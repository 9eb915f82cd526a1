//! Routing of explanation tasks between a local and a remote language model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Context length above which a task counts as harder
const LONG_CONTEXT_CHARS: usize = 2000;
/// Complexity above which the remote model is preferred
const REMOTE_THRESHOLD: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    SimpleQuery,
    Summary,
    DataDescription,
    ForecastExplanation,
    RiskAssessment,
    PatternAnalysis,
    Recommendation,
    Other,
}

impl TaskKind {
    pub fn base_complexity(&self) -> f64 {
        match self {
            TaskKind::SimpleQuery => 0.2,
            TaskKind::Summary | TaskKind::DataDescription => 0.3,
            TaskKind::ForecastExplanation | TaskKind::RiskAssessment => 0.8,
            TaskKind::PatternAnalysis => 0.7,
            TaskKind::Recommendation => 0.6,
            TaskKind::Other => 0.5,
        }
    }

    /// Complexity in [0, 1], raised for long contexts
    pub fn complexity(&self, context_len: usize) -> f64 {
        let bump = if context_len > LONG_CONTEXT_CHARS { 0.2 } else { 0.0 };
        (self.base_complexity() + bump).min(1.0)
    }
}

impl FromStr for TaskKind {
    type Err = std::convert::Infallible;

    /// Unknown names map to [`TaskKind::Other`]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "simple_query" => TaskKind::SimpleQuery,
            "summary" => TaskKind::Summary,
            "data_description" => TaskKind::DataDescription,
            "forecast_explanation" => TaskKind::ForecastExplanation,
            "risk_assessment" => TaskKind::RiskAssessment,
            "pattern_analysis" => TaskKind::PatternAnalysis,
            "recommendation" => TaskKind::Recommendation,
            _ => TaskKind::Other,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Local,
    Remote,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Local => f.write_str("local"),
            Provider::Remote => f.write_str("remote"),
        }
    }
}

/// Which providers are reachable
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmRouter {
    pub local_available: bool,
    pub remote_available: bool,
}

impl LlmRouter {
    pub fn new(local_available: bool, remote_available: bool) -> Self {
        Self {
            local_available,
            remote_available,
        }
    }

    /// Pick a provider for `task`, or `None` when nothing is reachable
    pub fn select(&self, task: TaskKind, force_remote: bool, context_len: usize) -> Option<Provider> {
        if force_remote && self.remote_available {
            return Some(Provider::Remote);
        }
        if task.complexity(context_len) > REMOTE_THRESHOLD && self.remote_available {
            return Some(Provider::Remote);
        }
        if self.local_available {
            return Some(Provider::Local);
        }
        self.remote_available.then_some(Provider::Remote)
    }
}
