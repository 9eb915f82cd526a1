//! # Forecast Select
//!
//! Automatic forecast model selection for univariate series.
//!
//! ## Features
//!
//! - Five model families behind one train/forecast contract (LSTM,
//!   XGBoost-style and LightGBM-style boosted trees, ARIMA, Prophet-style
//!   additive model)
//! - Validation-split scoring with MAPE, RMSE, MAE and R²
//! - Selection of the most accurate model, refit on the full series and
//!   confidence bounds from the validation error
//! - Dataset storage, upload parsing and background training jobs
//!
//! ## Quick Start
//!
//! ```rust
//! use forecast_select::config::SelectorConfig;
//! use forecast_select::models::{arima::Arima, ModelKind, ModelRegistry};
//! use forecast_select::{ForecastRequest, ForecastSelector, Series};
//!
//! let series = Series::new((0..20).map(|i| 100.0 + 2.0 * i as f64).collect()).unwrap();
//! let registry = ModelRegistry::empty().with(Arima::default());
//! let selector = ForecastSelector::new(registry, SelectorConfig::default());
//!
//! let outcome = selector.run(&series, &ForecastRequest::new(5)).unwrap();
//! assert_eq!(outcome.model_used(), ModelKind::Arima);
//! assert_eq!(outcome.predictions().len(), 5);
//! ```

pub mod cancel;
pub mod confidence;
pub mod config;
pub mod error;
pub mod jobs;
pub mod loader;
pub mod models;
pub mod outcome;
pub mod planning;
pub mod request;
pub mod response;
pub mod routing;
pub mod selector;
pub mod series;
pub mod service;
pub mod store;

// Re-export commonly used types
pub use crate::cancel::CancellationToken;
pub use crate::confidence::{ConfidenceBounds, ConfidenceLevel};
pub use crate::config::AppConfig;
pub use crate::error::{ForecastError, Result};
pub use crate::models::{ForecastModel, ForecastResult, ModelKind, ModelRegistry, TrainedForecastModel};
pub use crate::outcome::{Evaluation, ModelFailure, ModelResult, SelectionOutcome};
pub use crate::request::{ForecastRequest, ModelChoice};
pub use crate::response::ForecastResponse;
pub use crate::selector::ForecastSelector;
pub use crate::series::{Series, Split, MIN_SERIES_LEN};
pub use crate::service::{DataSource, ForecastService};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
