use forecast_select::config::ModelConfig;
use forecast_select::{ForecastError, ModelKind, ModelRegistry};
use rstest::rstest;

fn weekly_sales() -> Vec<f64> {
    (0..42)
        .map(|i| 500.0 + 4.0 * i as f64 + [0.0, 30.0, 60.0, 30.0, 0.0, -30.0, -60.0][i % 7])
        .collect()
}

#[rstest]
#[case(ModelKind::Lstm)]
#[case(ModelKind::Xgboost)]
#[case(ModelKind::Lightgbm)]
#[case(ModelKind::Arima)]
#[case(ModelKind::Prophet)]
fn test_every_adapter_forecasts_the_horizon(#[case] kind: ModelKind) {
    let registry = ModelRegistry::from_config(&ModelConfig::default());
    let model = registry.get(kind).unwrap();
    assert_eq!(model.kind(), kind);

    let trained = model.train(&weekly_sales()).unwrap();
    let forecast = trained.forecast(9).unwrap();
    assert_eq!(forecast.horizons(), 9);
    assert_eq!(forecast.values().len(), 9);
    assert!(forecast.is_finite());
}

#[rstest]
#[case(ModelKind::Lstm)]
#[case(ModelKind::Xgboost)]
#[case(ModelKind::Lightgbm)]
#[case(ModelKind::Arima)]
#[case(ModelKind::Prophet)]
fn test_every_adapter_rejects_empty_input(#[case] kind: ModelKind) {
    let registry = ModelRegistry::from_config(&ModelConfig::default());
    let err = registry.get(kind).unwrap().train(&[]).unwrap_err();
    match err {
        ForecastError::ModelFitFailed { model, .. } => assert_eq!(model, kind),
        other => panic!("expected ModelFitFailed, got {:?}", other),
    }
}

#[rstest]
#[case(ModelKind::Lstm)]
#[case(ModelKind::Xgboost)]
#[case(ModelKind::Arima)]
#[case(ModelKind::Prophet)]
fn test_trained_models_are_independent(#[case] kind: ModelKind) {
    let registry = ModelRegistry::from_config(&ModelConfig::default());
    let model = registry.get(kind).unwrap();

    let flat = model.train(&[100.0; 30]).unwrap();
    let rising = model.train(&weekly_sales()).unwrap();
    let again = model.train(&[100.0; 30]).unwrap();

    assert_eq!(flat.forecast(3).unwrap(), again.forecast(3).unwrap());
    assert_ne!(flat.forecast(3).unwrap(), rising.forecast(3).unwrap());
}
