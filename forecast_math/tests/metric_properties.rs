use approx::assert_relative_eq;
use forecast_math::metrics::{mean_absolute_percentage_error, root_mean_squared_error};
use forecast_math::{evaluate, MathError};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

fn sample_pair(rng: &mut StdRng, len: usize) -> (Vec<f64>, Vec<f64>) {
    let actual: Vec<f64> = (0..len).map(|_| rng.gen_range(1.0..500.0)).collect();
    let predicted: Vec<f64> = actual
        .iter()
        .map(|a| a + rng.gen_range(-50.0..50.0))
        .collect();
    (actual, predicted)
}

#[test]
fn mape_is_never_negative() {
    let mut rng = StdRng::seed_from_u64(7);
    for len in 1..40 {
        let (actual, predicted) = sample_pair(&mut rng, len);
        let mape = mean_absolute_percentage_error(&actual, &predicted).unwrap();
        assert!(mape >= 0.0);
    }
}

#[test]
fn perfect_prediction_scores_zero() {
    let actual = vec![15234.5, 12450.75, 18500.0, 22100.25, 9800.0];
    let metrics = evaluate(&actual, &actual).unwrap();

    assert_eq!(metrics.mape, Some(0.0));
    assert_eq!(metrics.rmse, 0.0);
    assert_eq!(metrics.mae, 0.0);
    assert_relative_eq!(metrics.r2, 1.0);
}

#[test]
fn rmse_survives_lockstep_shuffle() {
    let mut rng = StdRng::seed_from_u64(11);
    let (actual, predicted) = sample_pair(&mut rng, 25);
    let before = root_mean_squared_error(&actual, &predicted);

    let mut pairs: Vec<(f64, f64)> = actual.iter().copied().zip(predicted.iter().copied()).collect();
    pairs.shuffle(&mut rng);
    let (shuffled_actual, shuffled_predicted): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();

    let after = root_mean_squared_error(&shuffled_actual, &shuffled_predicted);
    assert_relative_eq!(before, after, epsilon = 1e-9);
}

#[test]
fn rmse_changes_when_only_one_side_is_reordered() {
    let actual = vec![1.0, 2.0, 3.0, 4.0, 5.0];
    let predicted = vec![1.1, 2.1, 3.1, 4.1, 5.1];
    let reversed: Vec<f64> = predicted.iter().rev().copied().collect();

    let aligned = root_mean_squared_error(&actual, &predicted);
    let misaligned = root_mean_squared_error(&actual, &reversed);
    assert!(misaligned > aligned + 1.0);
}

#[test]
fn mismatched_lengths_are_a_shape_error() {
    let result = evaluate(&[1.0, 2.0], &[1.0]);
    assert!(matches!(result, Err(MathError::ShapeMismatch { .. })));
}
