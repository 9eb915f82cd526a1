use forecast_select::config::SelectorConfig;
use forecast_select::models::arima::Arima;
use forecast_select::models::prophet::Prophet;
use forecast_select::models::xgboost::XgBoost;
use forecast_select::{
    CancellationToken, ForecastError, ForecastRequest, ForecastSelector, ModelKind, ModelRegistry,
    Series,
};
use rstest::rstest;

fn seasonal_series() -> Series {
    let values = (0..40)
        .map(|i| 200.0 + 1.5 * i as f64 + 20.0 * ((i % 7) as f64 - 3.0))
        .collect();
    Series::new(values).unwrap()
}

fn light_selector() -> ForecastSelector {
    let registry = ModelRegistry::empty()
        .with(XgBoost::default())
        .with(Arima::default())
        .with(Prophet::default());
    ForecastSelector::new(registry, SelectorConfig::default())
}

#[rstest]
#[case(1)]
#[case(7)]
#[case(30)]
fn test_prediction_length_matches_horizon(#[case] horizon: usize) {
    let outcome = light_selector()
        .run(&seasonal_series(), &ForecastRequest::new(horizon))
        .unwrap();
    assert_eq!(outcome.predictions().len(), horizon);
    assert_eq!(outcome.bounds().lower.len(), horizon);
    assert_eq!(outcome.bounds().upper.len(), horizon);
}

#[rstest]
#[case(0.90)]
#[case(0.95)]
#[case(0.99)]
fn test_bounds_enclose_predictions(#[case] level: f64) {
    let request = ForecastRequest::new(10).with_confidence_level(level);
    let outcome = light_selector().run(&seasonal_series(), &request).unwrap();

    let bounds = outcome.bounds();
    for (i, p) in outcome.predictions().iter().enumerate() {
        assert!(bounds.lower[i] <= *p && *p <= bounds.upper[i]);
    }
}

#[test]
fn test_bound_width_grows_with_confidence() {
    let selector = light_selector();
    let series = seasonal_series();

    let widths: Vec<f64> = [0.90, 0.95, 0.99]
        .iter()
        .map(|&level| {
            let request = ForecastRequest::new(5).with_confidence_level(level);
            let outcome = selector.run(&series, &request).unwrap();
            outcome.bounds().upper[0] - outcome.bounds().lower[0]
        })
        .collect();

    assert!(widths[0] < widths[1] && widths[1] < widths[2], "{:?}", widths);
}

#[test]
fn test_pinned_lstm_is_deterministic() {
    let selector = ForecastSelector::from_config(SelectorConfig::default());
    let request = ForecastRequest::new(5).pinned(ModelKind::Lstm);
    let series = seasonal_series();

    let first = selector.run(&series, &request).unwrap();
    let second = selector.run(&series, &request).unwrap();

    assert_eq!(first.model_used(), ModelKind::Lstm);
    assert_eq!(first.predictions(), second.predictions());
    assert_eq!(first.bounds(), second.bounds());
    assert_eq!(first.results(), second.results());
    assert_eq!(first.metrics(), second.metrics());
}

#[test]
fn test_parallel_and_sequential_agree() {
    let series = seasonal_series();
    let request = ForecastRequest::new(6);

    let parallel = light_selector().run(&series, &request).unwrap();
    let sequential = ForecastSelector::new(
        light_selector().registry().clone(),
        SelectorConfig {
            parallel: false,
            ..SelectorConfig::default()
        },
    )
    .run(&series, &request)
    .unwrap();

    assert_eq!(parallel.model_used(), sequential.model_used());
    assert_eq!(parallel.predictions(), sequential.predictions());
    assert_eq!(parallel.results(), sequential.results());
}

#[rstest]
#[case(0)]
#[case(31)]
fn test_horizon_out_of_range(#[case] horizon: usize) {
    let err = light_selector()
        .run(&seasonal_series(), &ForecastRequest::new(horizon))
        .unwrap_err();
    assert!(matches!(err, ForecastError::InvalidParameter(_)));
    assert!(err.is_client_error());
}

#[test]
fn test_short_series_is_rejected() {
    let short = Series::new(vec![3.0; 9]).unwrap();
    let err = light_selector().run(&short, &ForecastRequest::new(2)).unwrap_err();
    assert!(matches!(err, ForecastError::InsufficientData(_)));
}

#[test]
fn test_non_finite_values_are_rejected() {
    let err = Series::new(vec![1.0, f64::INFINITY, 3.0]).unwrap_err();
    assert!(matches!(err, ForecastError::InvalidSeries(_)));
}

#[test]
fn test_unregistered_pinned_model() {
    let registry = ModelRegistry::empty().with(Arima::default());
    let selector = ForecastSelector::new(registry, SelectorConfig::default());
    let request = ForecastRequest::new(3).pinned(ModelKind::Prophet);

    assert!(matches!(
        selector.run(&seasonal_series(), &request),
        Err(ForecastError::InvalidParameter(_))
    ));
}

#[test]
fn test_cancelled_evaluation() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = light_selector()
        .evaluate_with_cancel(&seasonal_series(), &cancel)
        .unwrap_err();
    assert!(matches!(err, ForecastError::Cancelled));
}

#[test]
fn test_evaluation_scores_every_model() {
    let evaluation = light_selector().evaluate(&seasonal_series()).unwrap();
    assert_eq!(evaluation.results.len() + evaluation.failures.len(), 3);
    let best_mape = evaluation.best_result().unwrap().metrics.unwrap().mape.unwrap();
    assert!(evaluation
        .results
        .iter()
        .filter(|r| r.is_selectable())
        .all(|r| r.metrics.unwrap().mape.unwrap() >= best_mape));
}
