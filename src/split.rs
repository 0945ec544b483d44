//! Single shuffled train/holdout partition

use crate::error::{Result, StackingError};
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// A single train/holdout split of row indices
#[derive(Debug, Clone)]
pub struct HoldoutSplit {
    pub train_indices: Vec<usize>,
    pub holdout_indices: Vec<usize>,
}

/// Partition `n_samples` row indices into a shuffled train/holdout split.
///
/// `test_size` is the holdout fraction and must lie strictly inside (0, 1).
/// With a seed the shuffle uses ChaCha8 and is fully reproducible; without
/// one the generator is entropy-seeded.
pub fn train_test_split(
    n_samples: usize,
    test_size: f64,
    random_state: Option<u64>,
) -> Result<HoldoutSplit> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(StackingError::ConfigError(format!(
            "test_size must be in (0, 1), got {}",
            test_size
        )));
    }

    let n_holdout = (n_samples as f64 * test_size) as usize;
    let n_train = n_samples - n_holdout;

    if n_holdout < 1 || n_train < 1 {
        return Err(StackingError::ConfigError(format!(
            "not enough samples to split: {} samples with test_size {}",
            n_samples, test_size
        )));
    }

    let mut rng = match random_state {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    let mut indices: Vec<usize> = (0..n_samples).collect();
    indices.shuffle(&mut rng);

    let holdout_indices = indices.split_off(n_train);

    Ok(HoldoutSplit {
        train_indices: indices,
        holdout_indices,
    })
}

/// Gather the given rows of a feature matrix
pub fn select_rows(x: &Array2<f64>, indices: &[usize]) -> Array2<f64> {
    x.select(Axis(0), indices)
}

/// Gather the given entries of a target vector
pub fn select_targets(y: &Array1<f64>, indices: &[usize]) -> Array1<f64> {
    y.select(Axis(0), indices)
}
