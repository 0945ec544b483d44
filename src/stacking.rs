//! Stacked generalization (stacking) ensemble regressor

use crate::error::{Result, StackingError};
use crate::estimator::{Estimator, EstimatorKind};
use crate::linear::LinearRegression;
use crate::split::{select_rows, select_targets, train_test_split};
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Stacking ensemble regressor.
///
/// Fits clones of the configured base estimators on a training split and a
/// combiner on their predictions over the held-out split. At inference time
/// base predictions are stacked column-wise (column i = estimator i) and fed
/// through the combiner.
///
/// Construction performs no computation; all validation happens in [`fit`].
///
/// [`fit`]: StackingRegressor::fit
pub struct StackingRegressor {
    /// Base estimator prototypes, cloned before fitting
    estimators: Vec<Box<dyn Estimator>>,
    /// Combiner prototype; defaults at fit time to an unregularized linear
    /// regressor without intercept
    combiner: Option<Box<dyn Estimator>>,
    /// Holdout fraction used to train the combiner, in (0, 1)
    cross_val_test_size: f64,
    /// Random seed for the train/holdout shuffle
    random_state: Option<u64>,
    /// Fitted base estimators, configuration order
    fitted_estimators: Option<Vec<Box<dyn Estimator>>>,
    /// Fitted combiner
    fitted_combiner: Option<Box<dyn Estimator>>,
}

// Boxed estimators have no Debug bound, so summarize the configuration
// and fitted state instead of deriving
impl fmt::Debug for StackingRegressor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StackingRegressor")
            .field("n_estimators", &self.estimators.len())
            .field("combiner", &self.combiner.as_ref().map(|c| c.name()))
            .field("cross_val_test_size", &self.cross_val_test_size)
            .field("random_state", &self.random_state)
            .field("fitted", &self.fitted_estimators.is_some())
            .finish()
    }
}

/// Shallow view of a [`StackingRegressor`]'s configuration, for external
/// hyperparameter-search tooling. Estimators are reported by name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackingParams {
    pub estimators: Vec<&'static str>,
    pub combiner: Option<&'static str>,
    pub cross_val_test_size: f64,
    pub random_state: Option<u64>,
}

impl StackingRegressor {
    /// Create a new stacking regressor over the given base estimators
    pub fn new(estimators: Vec<Box<dyn Estimator>>) -> Self {
        Self {
            estimators,
            combiner: None,
            cross_val_test_size: 0.33,
            random_state: None,
            fitted_estimators: None,
            fitted_combiner: None,
        }
    }

    /// Set the combiner prototype
    pub fn with_combiner(mut self, combiner: Box<dyn Estimator>) -> Self {
        self.combiner = Some(combiner);
        self
    }

    /// Set the holdout fraction (default 0.33)
    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.cross_val_test_size = test_size;
        self
    }

    /// Set the random seed for the train/holdout shuffle
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Fit the ensemble.
    ///
    /// Splits the rows once into train/holdout, fits a clone of every base
    /// estimator on the train side in parallel, then fits the combiner on
    /// the stacked holdout predictions. Fitted state is committed only after
    /// every fit succeeded; on error the previous fitted state is untouched.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        if self.estimators.is_empty() {
            return Err(StackingError::ConfigError(
                "invalid estimators: must supply a non-empty list".to_string(),
            ));
        }

        // Lazy combiner default, kept as derived state so the configured
        // field still reflects the caller's input
        let combiner_proto: Box<dyn Estimator> = match &self.combiner {
            Some(combiner) => {
                if combiner.kind() != EstimatorKind::Regressor {
                    return Err(StackingError::ConfigError(
                        "invalid combiner: must be a regressor".to_string(),
                    ));
                }
                combiner.clone_estimator()
            }
            None => Box::new(
                LinearRegression::new()
                    .with_fit_intercept(false)
                    .with_normalize(true),
            ),
        };

        if x.nrows() != y.len() {
            return Err(StackingError::ShapeError {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }

        let split = train_test_split(x.nrows(), self.cross_val_test_size, self.random_state)?;
        let x_train = select_rows(x, &split.train_indices);
        let y_train = select_targets(y, &split.train_indices);
        let x_holdout = select_rows(x, &split.holdout_indices);
        let y_holdout = select_targets(y, &split.holdout_indices);

        debug!(
            n_estimators = self.estimators.len(),
            n_train = split.train_indices.len(),
            n_holdout = split.holdout_indices.len(),
            "fitting base estimators"
        );

        // Independent fits fan out across the rayon pool; collect() preserves
        // configuration order regardless of completion order, and the first
        // error aborts the whole fit.
        let fitted_estimators = self
            .estimators
            .par_iter()
            .map(|prototype| {
                let mut model = prototype.clone_estimator();
                model.fit(&x_train, &y_train)?;
                Ok(model)
            })
            .collect::<Result<Vec<Box<dyn Estimator>>>>()?;

        let stacked = stacked_predictions(&fitted_estimators, &x_holdout)?;

        let mut combiner = combiner_proto;
        combiner.fit(&stacked, &y_holdout)?;

        debug!("combiner fitted on stacked holdout predictions");

        self.fitted_estimators = Some(fitted_estimators);
        self.fitted_combiner = Some(combiner);

        Ok(self)
    }

    /// Predict regression targets for `x`.
    ///
    /// Fails with [`StackingError::NotFitted`] until a successful [`fit`].
    ///
    /// [`fit`]: StackingRegressor::fit
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let estimators = self.fitted_estimators.as_ref().ok_or(StackingError::NotFitted)?;
        let combiner = self.fitted_combiner.as_ref().ok_or(StackingError::NotFitted)?;

        let stacked = stacked_predictions(estimators, x)?;
        combiner.predict(&stacked)
    }

    /// Pipeline-stage alias of [`predict`].
    ///
    /// Returns the final blended prediction, not the intermediate stacked
    /// matrix a feature transform would usually yield; kept this way for
    /// compatibility with the ensemble's historical behavior.
    ///
    /// [`predict`]: StackingRegressor::predict
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.predict(x)
    }

    /// Shallow view of the configuration.
    ///
    /// `deep = true` (flattening nested per-estimator parameters) is a
    /// declared capability that is not yet supported and always fails with
    /// [`StackingError::UnsupportedOperation`].
    pub fn get_params(&self, deep: bool) -> Result<StackingParams> {
        if deep {
            return Err(StackingError::UnsupportedOperation(
                "deep parameter introspection is not yet supported".to_string(),
            ));
        }

        Ok(StackingParams {
            estimators: self.estimators.iter().map(|e| e.name()).collect(),
            combiner: self.combiner.as_ref().map(|c| c.name()),
            cross_val_test_size: self.cross_val_test_size,
            random_state: self.random_state,
        })
    }

    /// Fitted base estimators, configuration order; `None` before fit
    pub fn fitted_estimators(&self) -> Option<&[Box<dyn Estimator>]> {
        self.fitted_estimators.as_deref()
    }

    /// Fitted combiner; `None` before fit
    pub fn fitted_combiner(&self) -> Option<&dyn Estimator> {
        self.fitted_combiner.as_deref()
    }
}

/// Build the stacked feature matrix: column i holds estimator i's
/// predictions on `x`.
fn stacked_predictions(models: &[Box<dyn Estimator>], x: &Array2<f64>) -> Result<Array2<f64>> {
    let mut stacked = Array2::zeros((x.nrows(), models.len()));

    for (idx, model) in models.iter().enumerate() {
        let predictions = model.predict(x)?;
        stacked.column_mut(idx).assign(&predictions);
    }

    Ok(stacked)
}
