//! # ChronoForge
//!
//! Umbrella crate for the ChronoForge forecasting workspace.
//!
//! ```
//! use chronoforge::select::{ForecastSelector, ForecastRequest, Series};
//! use chronoforge::select::config::SelectorConfig;
//! use chronoforge::select::models::{arima::Arima, ModelRegistry};
//!
//! let series = Series::new(vec![10.0, 12.0, 14.0, 16.0, 18.0, 20.0, 22.0, 24.0, 26.0, 28.0]).unwrap();
//! let selector = ForecastSelector::new(ModelRegistry::empty().with(Arima::default()), SelectorConfig::default());
//! let outcome = selector.run(&series, &ForecastRequest::new(3)).unwrap();
//! assert!((outcome.predictions()[0] - 30.0).abs() < 1e-6);
//! ```

pub use forecast_math as math;
pub use forecast_select as select;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
