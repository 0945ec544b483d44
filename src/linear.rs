//! Ordinary least squares linear regression
//!
//! Used both as a standalone base estimator and, configured without an
//! intercept and with column normalization, as the ensemble's default
//! combiner.

use crate::error::{Result, StackingError};
use crate::estimator::{Estimator, EstimatorKind};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Lower-triangular Cholesky factor of a symmetric matrix A = L * L^T,
/// or `None` when a pivot is not strictly positive.
fn cholesky_factor(a: &Array2<f64>) -> Option<Array2<f64>> {
    let n = a.nrows();
    let mut l = Array2::zeros((n, n));

    for i in 0..n {
        for j in 0..=i {
            let sum: f64 = (0..j).map(|k| l[[i, k]] * l[[j, k]]).sum();

            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 0.0 {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    Some(l)
}

/// Solve L * L^T * x = b given the lower-triangular factor: forward
/// substitution through L, then backward substitution through L^T
fn triangular_solve(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = l.nrows();

    let mut y = Array1::zeros(n);
    for i in 0..n {
        let sum: f64 = (0..i).map(|j| l[[i, j]] * y[j]).sum();
        y[i] = (b[i] - sum) / l[[i, i]];
    }

    let mut x = Array1::zeros(n);
    for i in (0..n).rev() {
        let sum: f64 = (i + 1..n).map(|j| l[[j, i]] * x[j]).sum();
        x[i] = (y[i] - sum) / l[[i, i]];
    }

    x
}

/// Solve symmetric positive-definite system Ax = b via Cholesky. A
/// near-singular matrix gets one ridge-regularized retry, which keeps
/// rank-deficient stacked matrices (e.g. duplicated base estimators)
/// solvable and deterministic.
fn solve_spd(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    if n != a.ncols() || n != b.len() {
        return None;
    }

    if let Some(l) = cholesky_factor(a) {
        return Some(triangular_solve(&l, b));
    }

    let ridge = 1e-8 * a.diag().iter().map(|v| v.abs()).sum::<f64>() / n as f64;
    let mut a_reg = a.clone();
    for k in 0..n {
        a_reg[[k, k]] += ridge;
    }

    cholesky_factor(&a_reg).map(|l| triangular_solve(&l, b))
}

/// Gaussian elimination with partial pivoting on the augmented system
/// [A | b] (fallback for systems the Cholesky path rejects)
fn gauss_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    if n != a.ncols() || n != b.len() {
        return None;
    }

    let mut aug = Array2::zeros((n, n + 1));
    for i in 0..n {
        for j in 0..n {
            aug[[i, j]] = a[[i, j]];
        }
        aug[[i, n]] = b[i];
    }

    for col in 0..n {
        let mut pivot_row = col;
        for row in col + 1..n {
            if aug[[row, col]].abs() > aug[[pivot_row, col]].abs() {
                pivot_row = row;
            }
        }

        if aug[[pivot_row, col]].abs() < 1e-10 {
            return None;
        }

        if pivot_row != col {
            for j in col..=n {
                aug.swap([col, j], [pivot_row, j]);
            }
        }

        let pivot = aug[[col, col]];
        for j in col..=n {
            aug[[col, j]] /= pivot;
        }

        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = aug[[row, col]];
            if factor != 0.0 {
                for j in col..=n {
                    aug[[row, j]] -= factor * aug[[col, j]];
                }
            }
        }
    }

    Some(Array1::from_shape_fn(n, |i| aug[[i, n]]))
}

/// Solve least squares via normal equations: (X^T X) w = X^T y.
/// Tries Cholesky first, then falls back to Gaussian elimination.
fn solve_least_squares(x: &Array2<f64>, y: &Array1<f64>) -> Option<Array1<f64>> {
    let xtx = x.t().dot(x);
    let xty = x.t().dot(y);

    solve_spd(&xtx, &xty).or_else(|| gauss_solve(&xtx, &xty))
}

/// Linear regression model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegression {
    /// Fitted coefficients (weights)
    pub coefficients: Option<Array1<f64>>,
    /// Fitted intercept (bias)
    pub intercept: Option<f64>,
    /// Whether to fit intercept
    pub fit_intercept: bool,
    /// Whether to scale each feature column to unit L2 norm before solving.
    /// Purely deterministic; coefficients are rescaled back afterwards.
    pub normalize: bool,
    /// Whether model is fitted
    pub is_fitted: bool,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearRegression {
    /// Create a new linear regression model
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: None,
            fit_intercept: true,
            normalize: false,
            is_fitted: false,
        }
    }

    /// Enable/disable fitting intercept
    pub fn with_fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    /// Enable/disable column normalization
    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    /// Fit the model to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(StackingError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }

        // Center data if fitting intercept
        let (x_work, y_work, x_mean, y_mean) = if self.fit_intercept {
            let x_mean = x.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(n_features));
            let y_mean = y.mean().unwrap_or(0.0);

            let x_centered = x - &x_mean.clone().insert_axis(Axis(0));
            let y_centered = y - y_mean;

            (x_centered, y_centered, Some(x_mean), Some(y_mean))
        } else {
            (x.clone(), y.clone(), None, None)
        };

        // Scale columns to unit L2 norm; zero columns are left as-is
        let scale = if self.normalize {
            let mut scale = Array1::ones(n_features);
            for j in 0..n_features {
                let col = x_work.column(j);
                let norm = col.dot(&col).sqrt();
                if norm > 0.0 {
                    scale[j] = norm;
                }
            }
            Some(scale)
        } else {
            None
        };

        let x_solved = match &scale {
            Some(scale) => &x_work / &scale.clone().insert_axis(Axis(0)),
            None => x_work,
        };

        let mut coefficients = solve_least_squares(&x_solved, &y_work).ok_or_else(|| {
            StackingError::ComputationError(
                "matrix is singular, cannot solve least squares".to_string(),
            )
        })?;

        // Undo the column scaling so coefficients apply to raw features
        if let Some(scale) = scale {
            coefficients = coefficients / scale;
        }

        let intercept = match (x_mean, y_mean) {
            (Some(x_mean), Some(y_mean)) => y_mean - coefficients.dot(&x_mean),
            _ => 0.0,
        };

        self.coefficients = Some(coefficients);
        self.intercept = Some(intercept);
        self.is_fitted = true;

        Ok(self)
    }

    /// Make predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self.coefficients.as_ref().ok_or(StackingError::NotFitted)?;
        let intercept = self.intercept.unwrap_or(0.0);

        Ok(x.dot(coefficients) + intercept)
    }

    /// Get R² score
    pub fn score(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
        let y_pred = self.predict(x)?;

        let y_mean = y.mean().unwrap_or(0.0);
        let ss_res = (&y_pred - y).mapv(|v| v * v).sum();
        let ss_tot = y.mapv(|v| (v - y_mean) * (v - y_mean)).sum();

        if ss_tot == 0.0 {
            return Ok(1.0);
        }

        Ok(1.0 - ss_res / ss_tot)
    }
}

impl Estimator for LinearRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        LinearRegression::fit(self, x, y)?;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        LinearRegression::predict(self, x)
    }

    fn clone_estimator(&self) -> Box<dyn Estimator> {
        Box::new(self.clone())
    }

    fn kind(&self) -> EstimatorKind {
        EstimatorKind::Regressor
    }

    fn name(&self) -> &'static str {
        "linear_regression"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_ols_recovers_coefficients() {
        // y = 2*x1 + 3*x2 + 1
        let x = array![
            [1.0, 1.0],
            [2.0, 1.0],
            [3.0, 2.0],
            [4.0, 3.0],
            [5.0, 5.0],
            [6.0, 4.0]
        ];
        let y = array![6.0, 8.0, 13.0, 18.0, 26.0, 25.0];

        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();

        let coef = model.coefficients.as_ref().unwrap();
        assert_abs_diff_eq!(coef[0], 2.0, epsilon = 1e-8);
        assert_abs_diff_eq!(coef[1], 3.0, epsilon = 1e-8);
        assert_abs_diff_eq!(model.intercept.unwrap(), 1.0, epsilon = 1e-8);
    }

    #[test]
    fn test_no_intercept_passes_through_origin() {
        // y = 4*x with no bias term
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![4.0, 8.0, 12.0, 16.0];

        let mut model = LinearRegression::new().with_fit_intercept(false);
        model.fit(&x, &y).unwrap();

        assert_abs_diff_eq!(model.coefficients.as_ref().unwrap()[0], 4.0, epsilon = 1e-8);
        assert_abs_diff_eq!(model.intercept.unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_normalize_matches_unnormalized_fit() {
        // Column scaling is undone after solving, so predictions agree
        let x = array![[1.0, 100.0], [2.0, 300.0], [3.0, 200.0], [4.0, 500.0]];
        let y = array![3.0, 7.0, 6.0, 12.0];

        let mut plain = LinearRegression::new().with_fit_intercept(false);
        plain.fit(&x, &y).unwrap();

        let mut scaled = LinearRegression::new()
            .with_fit_intercept(false)
            .with_normalize(true);
        scaled.fit(&x, &y).unwrap();

        let p1 = plain.predict(&x).unwrap();
        let p2 = scaled.predict(&x).unwrap();
        for (a, b) in p1.iter().zip(p2.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-8);
        }
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let x = array![[1.0, 2.0], [2.0, 1.0], [3.0, 4.0], [4.0, 3.0]];
        let y = array![1.0, 2.0, 3.0, 4.0];

        let mut a = LinearRegression::new().with_normalize(true);
        a.fit(&x, &y).unwrap();
        let mut b = LinearRegression::new().with_normalize(true);
        b.fit(&x, &y).unwrap();

        assert_eq!(a.coefficients, b.coefficients);
        assert_eq!(a.intercept, b.intercept);
    }

    #[test]
    fn test_spd_and_gauss_solvers_agree() {
        let a = array![[4.0, 1.0], [1.0, 3.0]];
        let b = array![1.0, 2.0];

        let spd = solve_spd(&a, &b).unwrap();
        let gauss = gauss_solve(&a, &b).unwrap();

        for (p, q) in spd.iter().zip(gauss.iter()) {
            assert_abs_diff_eq!(p, q, epsilon = 1e-10);
        }
        // residual check: A * x == b
        let recovered = a.dot(&spd);
        assert_abs_diff_eq!(recovered[0], 1.0, epsilon = 1e-10);
        assert_abs_diff_eq!(recovered[1], 2.0, epsilon = 1e-10);
    }

    #[test]
    fn test_duplicated_columns_still_solvable() {
        // Rank-deficient system hits the regularized Cholesky retry
        let x = array![[1.0, 1.0], [2.0, 2.0], [3.0, 3.0], [4.0, 4.0]];
        let y = array![2.0, 4.0, 6.0, 8.0];

        let mut model = LinearRegression::new().with_fit_intercept(false);
        model.fit(&x, &y).unwrap();

        let preds = model.predict(&x).unwrap();
        for (p, t) in preds.iter().zip(y.iter()) {
            assert_abs_diff_eq!(p, t, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_predict_unfitted_fails() {
        let model = LinearRegression::new();
        let x = array![[1.0], [2.0]];
        assert!(matches!(
            LinearRegression::predict(&model, &x),
            Err(StackingError::NotFitted)
        ));
    }

    #[test]
    fn test_shape_mismatch_fails() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![1.0, 2.0];
        let mut model = LinearRegression::new();
        assert!(matches!(
            model.fit(&x, &y),
            Err(StackingError::ShapeError { .. })
        ));
    }

    #[test]
    fn test_serde_roundtrip_of_fitted_model() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![2.0, 4.0, 6.0, 8.0];
        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();

        let json = serde_json::to_string(&model).unwrap();
        let restored: LinearRegression = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.coefficients, model.coefficients);
        assert_eq!(restored.intercept, model.intercept);
        assert_eq!(restored.predict(&x).unwrap(), model.predict(&x).unwrap());
    }

    #[test]
    fn test_score_on_exact_fit() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![2.0, 4.0, 6.0, 8.0];
        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();
        assert_abs_diff_eq!(model.score(&x, &y).unwrap(), 1.0, epsilon = 1e-10);
    }
}
