//! Stacked generalization (stacking) ensemble regressor
//!
//! This crate fits several base regression models on a training split, then
//! fits a second-stage "combiner" model on the base models' predictions over
//! a held-out split. At inference time the base predictions are stacked
//! column-wise and blended through the combiner.
//!
//! # Modules
//!
//! - [`stacking`] - The [`StackingRegressor`](stacking::StackingRegressor) orchestrator
//! - [`estimator`] - The [`Estimator`](estimator::Estimator) capability trait
//! - [`linear`] - OLS linear regression, also the default combiner
//! - [`split`] - Single shuffled train/holdout partition
//! - [`error`] - Error types
//!
//! # Example
//!
//! ```
//! use stacking_ensemble::prelude::*;
//!
//! # fn main() -> stacking_ensemble::Result<()> {
//! let x = ndarray::Array2::from_shape_fn((30, 2), |(i, j)| {
//!     (i + 1) as f64 + (j as f64) * ((i + 1) as f64).sqrt()
//! });
//! let y = ndarray::Array1::from_shape_fn(30, |i| 2.0 * (i + 1) as f64);
//!
//! let estimators: Vec<Box<dyn Estimator>> = vec![
//!     Box::new(LinearRegression::new()),
//!     Box::new(LinearRegression::new().with_fit_intercept(false)),
//! ];
//!
//! let mut stacker = StackingRegressor::new(estimators).with_random_state(42);
//! let predictions = stacker.fit(&x, &y)?.predict(&x)?;
//! assert_eq!(predictions.len(), 30);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod estimator;
pub mod linear;
pub mod split;
pub mod stacking;

pub use error::{Result, StackingError};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{Result, StackingError};
    pub use crate::estimator::{Estimator, EstimatorKind};
    pub use crate::linear::LinearRegression;
    pub use crate::split::{train_test_split, HoldoutSplit};
    pub use crate::stacking::{StackingParams, StackingRegressor};
}
