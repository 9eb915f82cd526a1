use forecast_select::config::SelectorConfig;
use forecast_select::models::{ForecastResult, TrainedForecastModel};
use forecast_select::{
    ForecastError, ForecastModel, ForecastRequest, ForecastResponse, ForecastSelector, ModelKind,
    ModelRegistry, Result, Series,
};
use pretty_assertions::assert_eq;

const SALES: [f64; 10] = [
    15234.5, 12450.75, 18500.0, 22100.25, 9800.0, 14200.0, 16750.5, 11500.0, 19800.0, 21500.75,
];

fn sales() -> Series {
    Series::new(SALES.to_vec()).unwrap()
}

#[test]
fn test_full_forecast_workflow() {
    let selector = ForecastSelector::from_config(SelectorConfig::default());
    let outcome = selector.run(&sales(), &ForecastRequest::new(5)).unwrap();

    assert_eq!(outcome.predictions().len(), 5);
    assert_eq!(outcome.bounds().len(), 5);
    assert!(selector.registry().contains(outcome.model_used()));

    let chosen = outcome
        .results()
        .iter()
        .find(|r| r.model == outcome.model_used())
        .unwrap();
    assert!(chosen.success);
    assert_eq!(chosen.predictions.len(), 2);

    // Every scored candidate is at least as bad as the winner
    let best_mape = outcome.metrics().and_then(|m| m.mape).unwrap();
    assert!(best_mape >= 0.0);
    for result in outcome.results().iter().filter(|r| r.is_selectable()) {
        assert!(result.metrics.unwrap().mape.unwrap() >= best_mape);
    }

    for ((lower, upper), prediction) in outcome
        .bounds()
        .lower
        .iter()
        .zip(&outcome.bounds().upper)
        .zip(outcome.predictions())
    {
        assert!(lower <= prediction && prediction <= upper);
    }

    let response = ForecastResponse::from_outcome(&outcome);
    assert_eq!(response.predictions, outcome.predictions());
    assert_eq!(response.model_used, outcome.model_used());
    assert!(response.all_model_results.contains_key(&outcome.model_used()));
}

#[test]
fn test_response_json_shape() {
    let selector = ForecastSelector::from_config(SelectorConfig::default());
    let outcome = selector
        .run(&sales(), &ForecastRequest::new(3).pinned(ModelKind::Arima))
        .unwrap();
    let json = serde_json::to_value(ForecastResponse::from(outcome)).unwrap();

    assert_eq!(json["model_used"], "arima");
    assert_eq!(json["predictions"].as_array().unwrap().len(), 3);
    assert_eq!(json["confidence_intervals"]["lower"].as_array().unwrap().len(), 3);
    assert!(json["metrics"]["rmse"].is_number());
    assert!(json["all_model_results"]["arima"].is_object());
    assert!(json.get("model_breakdown").is_none());
    assert!(json["forecast_id"].is_string());
    assert!(json["created_at"].is_string());
}

#[test]
fn test_empty_training_split_has_no_model() {
    let config = SelectorConfig {
        train_fraction: 0.0,
        ..SelectorConfig::default()
    };
    let selector = ForecastSelector::from_config(config);

    let err = selector.run(&sales(), &ForecastRequest::new(5)).unwrap_err();
    assert!(matches!(err, ForecastError::NoModelAvailable(_)));
}

#[derive(Debug)]
struct Broken(ModelKind);

impl ForecastModel for Broken {
    fn kind(&self) -> ModelKind {
        self.0
    }

    fn train(&self, _data: &[f64]) -> Result<Box<dyn TrainedForecastModel>> {
        Ok(Box::new(BrokenForecast))
    }

    fn name(&self) -> &str {
        "broken"
    }
}

#[derive(Debug)]
struct BrokenForecast;

impl TrainedForecastModel for BrokenForecast {
    fn forecast(&self, horizon: usize) -> Result<ForecastResult> {
        ForecastResult::new(vec![f64::NAN; horizon], horizon)
    }

    fn name(&self) -> &str {
        "broken"
    }
}

#[test]
fn test_all_adapters_failing() {
    let registry = ModelRegistry::empty()
        .with(Broken(ModelKind::Lstm))
        .with(Broken(ModelKind::Prophet));
    let selector = ForecastSelector::new(registry, SelectorConfig::default());

    match selector.run(&sales(), &ForecastRequest::new(5)) {
        Err(ForecastError::NoModelAvailable(message)) => {
            assert!(message.contains("lstm"));
            assert!(message.contains("prophet"));
        }
        other => panic!("expected NoModelAvailable, got {:?}", other),
    }
}

#[test]
fn test_refit_all_breakdown() {
    let config = SelectorConfig {
        refit_all: true,
        ..SelectorConfig::default()
    };
    let selector = ForecastSelector::from_config(config);
    let outcome = selector.run(&sales(), &ForecastRequest::new(4)).unwrap();

    let breakdown = outcome.model_breakdown().unwrap();
    assert_eq!(breakdown[&outcome.model_used()], outcome.predictions());
    assert!(breakdown.values().all(|p| p.len() == 4));
}
