//! Sliding lag windows shared by the autoregressive learners

use crate::error::Result;

/// Build supervised samples: each row holds `window` consecutive values,
/// the target is the value that follows them.
pub(crate) fn lag_samples(data: &[f64], window: usize) -> (Vec<Vec<f64>>, Vec<f64>) {
    if window == 0 || data.len() <= window {
        return (Vec::new(), Vec::new());
    }

    data.windows(window + 1)
        .map(|w| (w[..window].to_vec(), w[window]))
        .unzip()
}

/// Roll a one-step predictor forward `horizon` times, feeding each
/// prediction back in as the newest lag.
pub(crate) fn recursive_forecast<F>(
    history: &[f64],
    window: usize,
    horizon: usize,
    mut step: F,
) -> Result<Vec<f64>>
where
    F: FnMut(&[f64]) -> Result<f64>,
{
    let mut current: Vec<f64> = history[history.len().saturating_sub(window)..].to_vec();
    let mut forecasts = Vec::with_capacity(horizon);

    for _ in 0..horizon {
        let next = step(&current)?;
        forecasts.push(next);
        if !current.is_empty() {
            current.remove(0);
        }
        current.push(next);
    }

    Ok(forecasts)
}
