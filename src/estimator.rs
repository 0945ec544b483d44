//! Estimator trait shared by base models and combiners

use crate::error::Result;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Broad capability class of an estimator.
///
/// The ensemble only trains regression models, but a caller may hand it
/// anything that exposes fit/predict (e.g. a clustering model whose
/// `predict` returns cluster labels). Fit-time validation uses this to
/// reject a combiner without regression semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EstimatorKind {
    /// Predicts a continuous target
    Regressor,
    /// Predicts cluster assignments
    Clusterer,
}

/// Trait for models usable as base estimators or combiners.
///
/// Prototypes are cloned before fitting, so a configured estimator is never
/// mutated by the ensemble itself.
pub trait Estimator: Send + Sync {
    /// Fit the model to training data
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Make predictions
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Clone this estimator behind a fresh box
    fn clone_estimator(&self) -> Box<dyn Estimator>;

    /// Capability class of this estimator
    fn kind(&self) -> EstimatorKind {
        EstimatorKind::Regressor
    }

    /// Short identifier used by parameter introspection
    fn name(&self) -> &'static str;
}

impl Clone for Box<dyn Estimator> {
    fn clone(&self) -> Self {
        self.clone_estimator()
    }
}
