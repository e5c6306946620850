//! Cross-validation of pipelines scored by the coefficient of determination.
use crate::errors::{ModelError, Result};
use crate::pipeline::PipelineParams;
use linfa::dataset::Dataset;
use linfa::prelude::SingleTargetRegression;
use linfa::traits::{Fit, Predict};
use log::trace;
use ndarray::{Array1, ArrayBase, Data, Ix1, Ix2};
use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How training data is split for validation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CvStrategy {
    /// Shuffled k-fold
    KFold {
        /// Number of folds
        k: usize,
        /// Shuffling seed
        seed: u64,
    },
    /// One fold per sample
    LeaveOneOut,
}

impl CvStrategy {
    /// Leave-one-out below `loo_threshold` samples, shuffled `k`-fold otherwise
    pub fn for_samples(n_samples: usize, loo_threshold: usize, k: usize, seed: u64) -> CvStrategy {
        if n_samples < loo_threshold {
            CvStrategy::LeaveOneOut
        } else {
            CvStrategy::KFold {
                k: k.min(n_samples),
                seed,
            }
        }
    }
}

impl fmt::Display for CvStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CvStrategy::KFold { k, .. } => write!(f, "{k}-fold"),
            CvStrategy::LeaveOneOut => write!(f, "leave-one-out"),
        }
    }
}

/// Cross-validation summary: mean and population standard deviation of R²
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CvScore {
    /// Mean of fold scores
    pub mean: f64,
    /// Population standard deviation of fold scores
    pub std: f64,
    /// Strategy used
    pub strategy: CvStrategy,
}

impl fmt::Display for CvScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R² = {:.3} (±{:.3}) [{}]", self.mean, self.std, self.strategy)
    }
}

/// Cross-validate `params` on (x, y). Each fold fits its own pipeline,
/// scaler included, folds are evaluated in parallel.
///
/// K-fold shuffles the rows with the seeded generator, then cuts `n / k`
/// sized folds: the `n mod k` trailing rows always stay in training.
/// Leave-one-out folds have a single sample and no R² of their own: the
/// pooled `Q² = 1 - PRESS / TSS` is reported with a null deviation.
pub fn cross_validate(
    params: &PipelineParams,
    x: &ArrayBase<impl Data<Elem = f64>, Ix2>,
    y: &ArrayBase<impl Data<Elem = f64>, Ix1>,
    strategy: CvStrategy,
) -> Result<CvScore> {
    let n = x.nrows();
    if n < 2 || n != y.len() {
        return Err(ModelError::InvalidValueError(format!(
            "cross-validation needs at least 2 samples and as many targets, got {} rows and {} targets",
            n,
            y.len()
        )));
    }
    let dataset = Dataset::new(x.to_owned(), y.to_owned());
    match strategy {
        CvStrategy::KFold { k, seed } => {
            if k < 2 || k > n {
                return Err(ModelError::InvalidValueError(format!(
                    "cannot split {n} samples in {k} folds"
                )));
            }
            let mut rng = Xoshiro256Plus::seed_from_u64(seed);
            let scores = dataset
                .shuffle(&mut rng)
                .fold(k)
                .into_par_iter()
                .enumerate()
                .map(|(i, (train, valid))| {
                    let model = params.fit(&train)?;
                    let score = model.predict(valid.records()).r2(&valid)?;
                    trace!("fold {i}: R² = {score}");
                    Ok(score)
                })
                .collect::<Result<Vec<f64>>>()?;
            let scores = Array1::from(scores);
            Ok(CvScore {
                mean: scores.mean().unwrap_or(f64::NAN),
                std: scores.std(0.),
                strategy,
            })
        }
        CvStrategy::LeaveOneOut => {
            let predictions = dataset
                .fold(n)
                .into_par_iter()
                .map(|(train, valid)| {
                    let model = params.fit(&train)?;
                    Ok(model.predict(valid.records())[0])
                })
                .collect::<Result<Vec<f64>>>()?;
            let q2 = Array1::from(predictions).r2(dataset.targets())?;
            trace!("leave-one-out: Q² = {q2}");
            Ok(CvScore {
                mean: q2,
                std: 0.,
                strategy,
            })
        }
    }
}
