//! Single-layer LSTM regressor over min-max scaled lag windows

use crate::error::{ForecastError, Result};
use crate::models::window::{lag_samples, recursive_forecast};
use crate::models::{require_len, ForecastModel, ForecastResult, ModelKind, TrainedForecastModel};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use tracing::debug;

const GRADIENT_CLIP: f64 = 5.0;
const BETA1: f64 = 0.9;
const BETA2: f64 = 0.999;
const ADAM_EPSILON: f64 = 1e-8;

/// LSTM with a linear read-out, trained by backpropagation through time.
///
/// Only the most recent `max_samples` windows are used for training so the
/// cost stays bounded on long histories.
#[derive(Debug, Clone)]
pub struct Lstm {
    name: String,
    window: usize,
    hidden: usize,
    epochs: usize,
    learning_rate: f64,
    max_samples: usize,
    seed: u64,
}

/// Trained LSTM with the scaler it was fitted with
#[derive(Debug, Clone)]
pub struct TrainedLstm {
    name: String,
    window: usize,
    network: Network,
    scaler: MinMaxScaler,
    history: Vec<f64>,
}

impl Lstm {
    pub fn new(window: usize, seed: u64) -> Self {
        Self {
            name: format!("LSTM (window={})", window),
            window: window.max(1),
            hidden: 16,
            epochs: 200,
            learning_rate: 0.01,
            max_samples: 256,
            seed,
        }
    }

    /// Override the network size and optimiser schedule
    pub fn with_training(mut self, hidden: usize, epochs: usize, learning_rate: f64) -> Self {
        self.hidden = hidden.max(1);
        self.epochs = epochs;
        self.learning_rate = learning_rate;
        self
    }
}

impl Default for Lstm {
    fn default() -> Self {
        Self::new(5, 42)
    }
}

#[derive(Debug, Clone, Copy)]
struct MinMaxScaler {
    min: f64,
    range: f64,
}

impl MinMaxScaler {
    fn fit(data: &[f64]) -> Self {
        let min = data.iter().copied().fold(f64::INFINITY, f64::min);
        let max = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let range = if max - min > 1e-12 { max - min } else { 1.0 };
        Self { min, range }
    }

    fn transform(&self, value: f64) -> f64 {
        (value - self.min) / self.range
    }

    fn inverse(&self, value: f64) -> f64 {
        value * self.range + self.min
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Per-timestep activations kept for the backward pass
struct StepCache {
    x: f64,
    h_prev: Vec<f64>,
    c_prev: Vec<f64>,
    input: Vec<f64>,
    forget: Vec<f64>,
    candidate: Vec<f64>,
    output: Vec<f64>,
    cell: Vec<f64>,
}

/// Parameters in one flat buffer: input weights (4H), recurrent weights
/// (4H x H, row-major), gate biases (4H), read-out weights (H), read-out bias.
#[derive(Debug, Clone)]
struct Network {
    hidden: usize,
    params: Vec<f64>,
}

impl Network {
    fn param_count(hidden: usize) -> usize {
        4 * hidden + 4 * hidden * hidden + 4 * hidden + hidden + 1
    }

    fn w_offset(&self) -> usize {
        0
    }

    fn u_offset(&self) -> usize {
        4 * self.hidden
    }

    fn b_offset(&self) -> usize {
        self.u_offset() + 4 * self.hidden * self.hidden
    }

    fn v_offset(&self) -> usize {
        self.b_offset() + 4 * self.hidden
    }

    fn d_offset(&self) -> usize {
        self.v_offset() + self.hidden
    }

    fn init(hidden: usize, rng: &mut StdRng) -> Result<Self> {
        let scale = 1.0 / (hidden as f64).sqrt();
        let normal = Normal::new(0.0, scale)
            .map_err(|e| ForecastError::fit_failed(ModelKind::Lstm, e.to_string()))?;

        let mut network = Self {
            hidden,
            params: vec![0.0; Self::param_count(hidden)],
        };

        let weights_end = network.b_offset();
        for p in &mut network.params[..weights_end] {
            *p = normal.sample(rng);
        }
        let (v_start, v_end) = (network.v_offset(), network.d_offset());
        for p in &mut network.params[v_start..v_end] {
            *p = normal.sample(rng);
        }
        // Forget gate bias starts at one so early gradients flow through the cell
        let forget_bias = network.b_offset() + hidden;
        for p in &mut network.params[forget_bias..forget_bias + hidden] {
            *p = 1.0;
        }

        Ok(network)
    }

    fn forward(&self, inputs: &[f64]) -> (f64, Vec<StepCache>) {
        let h = self.hidden;
        let (w, u, b) = (self.w_offset(), self.u_offset(), self.b_offset());
        let mut h_prev = vec![0.0; h];
        let mut c_prev = vec![0.0; h];
        let mut caches = Vec::with_capacity(inputs.len());

        for &x in inputs {
            let mut z = vec![0.0; 4 * h];
            for (k, zk) in z.iter_mut().enumerate() {
                let row = &self.params[u + k * h..u + (k + 1) * h];
                let recurrent: f64 = row.iter().zip(&h_prev).map(|(a, b)| a * b).sum();
                *zk = self.params[w + k] * x + self.params[b + k] + recurrent;
            }

            let input: Vec<f64> = z[..h].iter().map(|&v| sigmoid(v)).collect();
            let forget: Vec<f64> = z[h..2 * h].iter().map(|&v| sigmoid(v)).collect();
            let candidate: Vec<f64> = z[2 * h..3 * h].iter().map(|v| v.tanh()).collect();
            let output: Vec<f64> = z[3 * h..].iter().map(|&v| sigmoid(v)).collect();

            let cell: Vec<f64> = (0..h)
                .map(|j| forget[j] * c_prev[j] + input[j] * candidate[j])
                .collect();
            let h_next: Vec<f64> = (0..h).map(|j| output[j] * cell[j].tanh()).collect();

            caches.push(StepCache {
                x,
                h_prev: std::mem::replace(&mut h_prev, h_next),
                c_prev: std::mem::replace(&mut c_prev, cell.clone()),
                input,
                forget,
                candidate,
                output,
                cell,
            });
        }

        let (v, d) = (self.v_offset(), self.d_offset());
        let y = self.params[v..v + h]
            .iter()
            .zip(&h_prev)
            .map(|(a, b)| a * b)
            .sum::<f64>()
            + self.params[d];

        (y, caches)
    }

    fn predict(&self, inputs: &[f64]) -> f64 {
        self.forward(inputs).0
    }

    /// Accumulate gradients of `0.5 * (y - target)^2 * weight` where `dy` is
    /// already `(y - target) * weight`.
    fn backward(&self, caches: &[StepCache], dy: f64, grads: &mut [f64]) {
        let h = self.hidden;
        let (w, u, b, v, d) = (
            self.w_offset(),
            self.u_offset(),
            self.b_offset(),
            self.v_offset(),
            self.d_offset(),
        );

        let Some(last) = caches.last() else {
            return;
        };
        let h_last: Vec<f64> = (0..h)
            .map(|j| last.output[j] * last.cell[j].tanh())
            .collect();

        for j in 0..h {
            grads[v + j] += dy * h_last[j];
        }
        grads[d] += dy;

        let mut dh: Vec<f64> = (0..h).map(|j| dy * self.params[v + j]).collect();
        let mut dc_next = vec![0.0; h];
        let mut dz = vec![0.0; 4 * h];

        for step in caches.iter().rev() {
            for j in 0..h {
                let tanh_c = step.cell[j].tanh();
                let d_output = dh[j] * tanh_c;
                let dc = dc_next[j] + dh[j] * step.output[j] * (1.0 - tanh_c * tanh_c);
                let d_input = dc * step.candidate[j];
                let d_candidate = dc * step.input[j];
                let d_forget = dc * step.c_prev[j];
                dc_next[j] = dc * step.forget[j];

                dz[j] = d_input * step.input[j] * (1.0 - step.input[j]);
                dz[h + j] = d_forget * step.forget[j] * (1.0 - step.forget[j]);
                dz[2 * h + j] = d_candidate * (1.0 - step.candidate[j] * step.candidate[j]);
                dz[3 * h + j] = d_output * step.output[j] * (1.0 - step.output[j]);
            }

            for (k, &g) in dz.iter().enumerate() {
                grads[w + k] += g * step.x;
                grads[b + k] += g;
                for j in 0..h {
                    grads[u + k * h + j] += g * step.h_prev[j];
                }
            }

            for (j, dh_j) in dh.iter_mut().enumerate() {
                *dh_j = dz
                    .iter()
                    .enumerate()
                    .map(|(k, g)| self.params[u + k * h + j] * g)
                    .sum();
            }
        }
    }
}

/// Adam optimiser state for a flat parameter buffer
struct Adam {
    learning_rate: f64,
    step: i32,
    first: Vec<f64>,
    second: Vec<f64>,
}

impl Adam {
    fn new(size: usize, learning_rate: f64) -> Self {
        Self {
            learning_rate,
            step: 0,
            first: vec![0.0; size],
            second: vec![0.0; size],
        }
    }

    fn update(&mut self, params: &mut [f64], grads: &[f64]) {
        self.step += 1;
        let correction1 = 1.0 - BETA1.powi(self.step);
        let correction2 = 1.0 - BETA2.powi(self.step);

        for i in 0..params.len() {
            self.first[i] = BETA1 * self.first[i] + (1.0 - BETA1) * grads[i];
            self.second[i] = BETA2 * self.second[i] + (1.0 - BETA2) * grads[i] * grads[i];
            let m_hat = self.first[i] / correction1;
            let v_hat = self.second[i] / correction2;
            params[i] -= self.learning_rate * m_hat / (v_hat.sqrt() + ADAM_EPSILON);
        }
    }
}

impl ForecastModel for Lstm {
    fn kind(&self) -> ModelKind {
        ModelKind::Lstm
    }

    fn train(&self, data: &[f64]) -> Result<Box<dyn TrainedForecastModel>> {
        require_len(self.kind(), data, self.window + 1)?;

        let scaler = MinMaxScaler::fit(data);
        let scaled: Vec<f64> = data.iter().map(|&v| scaler.transform(v)).collect();
        let (mut rows, mut targets) = lag_samples(&scaled, self.window);
        if rows.len() > self.max_samples {
            let skip = rows.len() - self.max_samples;
            rows.drain(..skip);
            targets.drain(..skip);
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut network = Network::init(self.hidden, &mut rng)?;
        let mut optimiser = Adam::new(network.params.len(), self.learning_rate);
        let weight = 1.0 / rows.len() as f64;
        let mut loss = 0.0;

        for _ in 0..self.epochs {
            let mut grads = vec![0.0; network.params.len()];
            loss = 0.0;

            for (row, &target) in rows.iter().zip(&targets) {
                let (y, caches) = network.forward(row);
                let error = y - target;
                loss += 0.5 * error * error * weight;
                network.backward(&caches, error * weight, &mut grads);
            }

            let norm = grads.iter().map(|g| g * g).sum::<f64>().sqrt();
            if !norm.is_finite() {
                return Err(ForecastError::fit_failed(
                    ModelKind::Lstm,
                    "gradients diverged during training",
                ));
            }
            if norm > GRADIENT_CLIP {
                let factor = GRADIENT_CLIP / norm;
                grads.iter_mut().for_each(|g| *g *= factor);
            }

            optimiser.update(&mut network.params, &grads);
        }

        debug!(model = %self.name, samples = rows.len(), loss, "LSTM training finished");

        Ok(Box::new(TrainedLstm {
            name: self.name.clone(),
            window: self.window,
            network,
            scaler,
            history: scaled,
        }))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedForecastModel for TrainedLstm {
    fn forecast(&self, horizon: usize) -> Result<ForecastResult> {
        let scaled = recursive_forecast(&self.history, self.window, horizon, |lags| {
            Ok(self.network.predict(lags))
        })?;
        let values = scaled.into_iter().map(|v| self.scaler.inverse(v)).collect();
        ForecastResult::new(values, horizon)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wave(len: usize) -> Vec<f64> {
        (0..len).map(|i| 50.0 + 10.0 * (i as f64 * 0.5).sin()).collect()
    }

    #[test]
    fn forecast_has_requested_length_and_is_finite() {
        let trained = Lstm::default().train(&wave(40)).unwrap();
        let forecast = trained.forecast(7).unwrap();
        assert_eq!(forecast.horizons(), 7);
        assert!(forecast.is_finite());
    }

    #[test]
    fn training_is_deterministic_for_a_seed() {
        let data = wave(30);
        let a = Lstm::new(5, 7).train(&data).unwrap().forecast(4).unwrap();
        let b = Lstm::new(5, 7).train(&data).unwrap().forecast(4).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn fits_better_than_the_mean() {
        let data = wave(56);
        let (train, test) = data.split_at(54);
        let forecast = Lstm::default().train(train).unwrap().forecast(test.len()).unwrap();

        let mean = train.iter().sum::<f64>() / train.len() as f64;
        let model_error: f64 = forecast.values().iter().zip(test).map(|(p, a)| (p - a).abs()).sum();
        let mean_error: f64 = test.iter().map(|a| (mean - a).abs()).sum();
        assert!(model_error < mean_error);
    }

    #[test]
    fn gradient_matches_finite_difference() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut network = Network::init(3, &mut rng).unwrap();
        let inputs = [0.1, 0.5, 0.9];
        let target = 0.3;

        let (y, caches) = network.forward(&inputs);
        let mut grads = vec![0.0; network.params.len()];
        network.backward(&caches, y - target, &mut grads);

        let eps = 1e-6;
        for index in [0, 5, network.u_offset() + 4, network.b_offset() + 2, network.d_offset()] {
            let original = network.params[index];
            network.params[index] = original + eps;
            let plus = 0.5 * (network.predict(&inputs) - target).powi(2);
            network.params[index] = original - eps;
            let minus = 0.5 * (network.predict(&inputs) - target).powi(2);
            network.params[index] = original;

            let numeric = (plus - minus) / (2.0 * eps);
            assert!(
                (numeric - grads[index]).abs() < 1e-6,
                "param {index}: numeric {numeric} vs analytic {}",
                grads[index]
            );
        }
    }

    #[test]
    fn short_series_is_rejected() {
        assert!(Lstm::default().train(&[1.0, 2.0, 3.0, 4.0, 5.0]).is_err());
    }
}
