//! Quadratic least-squares trend over a single input.

use crate::error::{AnalysisError, AnalysisResult};

const DEGREE: usize = 2;
const TERMS: usize = DEGREE + 1;

/// `y = c0 + c1*t + c2*t^2` with `t = x / scale`. Scaling keeps the normal
/// equations well conditioned for long series and does not change the fit.
#[derive(Debug, Clone)]
pub(crate) struct PolynomialTrend {
    coefficients: [f64; TERMS],
    scale: f64,
}

impl PolynomialTrend {
    pub(crate) fn fit(xs: &[f64], ys: &[f64]) -> AnalysisResult<Self> {
        if xs.len() != ys.len() {
            return Err(AnalysisError::Computation(format!(
                "{} trend inputs but {} targets",
                xs.len(),
                ys.len()
            )));
        }
        if xs.len() < TERMS {
            return Err(AnalysisError::Computation(format!(
                "quadratic trend needs at least {TERMS} points, got {}",
                xs.len()
            )));
        }
        if xs.iter().chain(ys).any(|v| !v.is_finite()) {
            return Err(AnalysisError::Computation(
                "trend data contains non-finite values".into(),
            ));
        }

        let max_abs = xs.iter().fold(0.0_f64, |m, x| m.max(x.abs()));
        let scale = if max_abs > 0.0 { max_abs } else { 1.0 };

        // Normal equations: (XᵀX) c = Xᵀy
        let mut xtx = [[0.0; TERMS]; TERMS];
        let mut xty = [0.0; TERMS];
        for (&x, &y) in xs.iter().zip(ys) {
            let row = powers(x / scale);
            for i in 0..TERMS {
                xty[i] += row[i] * y;
                for j in 0..TERMS {
                    xtx[i][j] += row[i] * row[j];
                }
            }
        }

        let coefficients = solve(xtx, xty).ok_or_else(|| {
            AnalysisError::Computation(
                "trend regression is singular (too few distinct days)".into(),
            )
        })?;
        tracing::debug!(?coefficients, scale, "fitted quadratic trend");
        Ok(Self {
            coefficients,
            scale,
        })
    }

    pub(crate) fn predict(&self, x: f64) -> f64 {
        let row = powers(x / self.scale);
        row.iter()
            .zip(&self.coefficients)
            .map(|(p, c)| p * c)
            .sum()
    }
}

fn powers(t: f64) -> [f64; TERMS] {
    [1.0, t, t * t]
}

/// Gaussian elimination with partial pivoting. `None` if the system is singular.
fn solve(mut a: [[f64; TERMS]; TERMS], mut b: [f64; TERMS]) -> Option<[f64; TERMS]> {
    let magnitude = a.iter().flatten().fold(0.0_f64, |m, v| m.max(v.abs()));
    let tolerance = magnitude.max(1.0) * 1e-12;

    for col in 0..TERMS {
        let pivot = (col..TERMS).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < tolerance {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..TERMS {
            let factor = a[row][col] / a[col][col];
            for k in col..TERMS {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = [0.0; TERMS];
    for row in (0..TERMS).rev() {
        let tail: f64 = (row + 1..TERMS).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Some(x)
}
