//! Ordinary least squares for the auxiliary regressions of the unit-root and
//! ARCH tests.

use crate::error::{ForecastError, Result};

/// Fitted linear regression `y = X β + e`.
#[derive(Debug, Clone)]
pub struct OLSResult {
    /// One coefficient per design column.
    pub coefficients: Vec<f64>,
    /// Standard error of each coefficient.
    pub std_errors: Vec<f64>,
    /// Residual sum of squares.
    pub rss: f64,
    /// Coefficient of determination (centred).
    pub r_squared: f64,
    /// Residuals `y - X β`.
    pub residuals: Vec<f64>,
    /// Residual degrees of freedom `n - k`.
    pub df_resid: usize,
}

impl OLSResult {
    /// t statistic of coefficient `i`.
    pub fn t_stat(&self, i: usize) -> f64 {
        match (self.coefficients.get(i), self.std_errors.get(i)) {
            (Some(b), Some(se)) if *se > 0.0 => b / se,
            _ => f64::NAN,
        }
    }

    /// Residual variance estimate `rss / (n - k)`.
    pub fn sigma2(&self) -> f64 {
        if self.df_resid == 0 {
            f64::NAN
        } else {
            self.rss / self.df_resid as f64
        }
    }
}

/// Fit OLS with the design given as rows (`x[i]` is observation `i`).
///
/// Include a column of ones in the rows for an intercept. Solves the normal
/// equations through a Cholesky factorisation and inverts `X'X` for the
/// standard errors.
pub fn ols_fit(y: &[f64], x: &[Vec<f64>]) -> Result<OLSResult> {
    let n = y.len();
    if x.len() != n {
        return Err(ForecastError::DimensionMismatch {
            expected: n,
            got: x.len(),
        });
    }
    let k = x.first().map(|row| row.len()).unwrap_or(0);
    if k == 0 {
        return Err(ForecastError::InvalidParameter(
            "design matrix has no columns".into(),
        ));
    }
    if n <= k {
        return Err(ForecastError::InsufficientData {
            needed: k + 1,
            got: n,
        });
    }
    if let Some(row) = x.iter().find(|row| row.len() != k) {
        return Err(ForecastError::DimensionMismatch {
            expected: k,
            got: row.len(),
        });
    }

    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];
    for (row, &yi) in x.iter().zip(y.iter()) {
        for i in 0..k {
            xty[i] += row[i] * yi;
            for j in 0..=i {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..k {
        for j in (i + 1)..k {
            xtx[i][j] = xtx[j][i];
        }
    }

    let chol = cholesky(&xtx).ok_or_else(|| {
        ForecastError::ComputationError("OLS design matrix is singular".into())
    })?;
    let beta = chol_solve(&chol, &xty);

    let residuals: Vec<f64> = x
        .iter()
        .zip(y.iter())
        .map(|(row, &yi)| yi - row.iter().zip(beta.iter()).map(|(a, b)| a * b).sum::<f64>())
        .collect();
    let rss: f64 = residuals.iter().map(|e| e * e).sum();

    let y_mean = y.iter().sum::<f64>() / n as f64;
    let tss: f64 = y.iter().map(|v| (v - y_mean).powi(2)).sum();
    let r_squared = if tss > 0.0 { 1.0 - rss / tss } else { 0.0 };

    let df_resid = n - k;
    let s2 = rss / df_resid as f64;
    let std_errors = (0..k)
        .map(|i| {
            let mut unit = vec![0.0; k];
            unit[i] = 1.0;
            let col = chol_solve(&chol, &unit);
            (s2 * col[i]).max(0.0).sqrt()
        })
        .collect();

    Ok(OLSResult {
        coefficients: beta,
        std_errors,
        rss,
        r_squared,
        residuals,
        df_resid,
    })
}

/// Lower-triangular `L` with `A = L L'`, or `None` if `A` is not positive definite.
fn cholesky(a: &[Vec<f64>]) -> Option<Vec<Vec<f64>>> {
    let n = a.len();
    let mut l = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }
            if i == j {
                if sum <= 1e-12 * a[i][i].abs().max(1e-300) {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }
    Some(l)
}

fn chol_solve(l: &[Vec<f64>], b: &[f64]) -> Vec<f64> {
    let n = b.len();
    let mut z = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i][j] * z[j];
        }
        z[i] = sum / l[i][i];
    }
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = z[i];
        for j in (i + 1)..n {
            sum -= l[j][i] * x[j];
        }
        x[i] = sum / l[i][i];
    }
    x
}
