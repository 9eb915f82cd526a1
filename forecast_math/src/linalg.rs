//! Dense linear algebra for small regression problems
//!
//! Contains:
//! - Gaussian elimination with partial pivoting
//! - Penalised (ridge) least squares through the normal equations

use crate::{MathError, Result};

const PIVOT_EPSILON: f64 = 1e-12;

/// Solve `matrix * x = rhs` for a square system
pub fn solve(mut matrix: Vec<Vec<f64>>, mut rhs: Vec<f64>) -> Result<Vec<f64>> {
    let n = rhs.len();
    if matrix.len() != n || matrix.iter().any(|row| row.len() != n) {
        return Err(MathError::InvalidInput(format!(
            "Expected a {n}x{n} system"
        )));
    }

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&a, &b| matrix[a][col].abs().total_cmp(&matrix[b][col].abs()))
            .unwrap_or(col);

        if matrix[pivot_row][col].abs() < PIVOT_EPSILON {
            return Err(MathError::CalculationError(
                "Matrix is singular or badly conditioned".to_string(),
            ));
        }

        matrix.swap(col, pivot_row);
        rhs.swap(col, pivot_row);

        for row in col + 1..n {
            let factor = matrix[row][col] / matrix[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                matrix[row][k] -= factor * matrix[col][k];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    let mut solution = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| matrix[row][k] * solution[k]).sum();
        solution[row] = (rhs[row] - tail) / matrix[row][row];
    }

    Ok(solution)
}

/// Fit `target ~ design * beta` minimising squared error plus
/// `sum(penalties[j] * beta[j]^2)`.
///
/// `design` is row-major with one row per observation.
pub fn ridge_least_squares(design: &[Vec<f64>], target: &[f64], penalties: &[f64]) -> Result<Vec<f64>> {
    if design.len() != target.len() || design.is_empty() {
        return Err(MathError::InvalidInput(
            "Design matrix and target must have the same non-zero length".to_string(),
        ));
    }

    let width = penalties.len();
    if design.iter().any(|row| row.len() != width) {
        return Err(MathError::InvalidInput(format!(
            "Every design row must have {width} columns"
        )));
    }

    let mut gram = vec![vec![0.0; width]; width];
    let mut moment = vec![0.0; width];

    for (row, &y) in design.iter().zip(target) {
        for i in 0..width {
            moment[i] += row[i] * y;
            for j in i..width {
                gram[i][j] += row[i] * row[j];
            }
        }
    }

    for i in 0..width {
        gram[i][i] += penalties[i];
        for j in 0..i {
            gram[i][j] = gram[j][i];
        }
    }

    solve(gram, moment)
}
