//! Exhaustive hyperparameter search for tree ensembles.
use crate::boosting::GradientBoosting;
use crate::errors::{ModelError, Result};
use crate::forest::RandomForest;
use crate::pipeline::PipelineParams;
use crate::regressor::RegressorParams;
use crate::validation::{cross_validate, CvScore, CvStrategy};
use linfa::ParamGuard;
use log::{debug, info};
use ndarray::{ArrayBase, Data, Ix1, Ix2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Random forest search space
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestGrid {
    /// Number of trees
    pub n_trees: Vec<usize>,
    /// Maximum depth, `None` for fully grown trees
    pub max_depth: Vec<Option<usize>>,
    /// Minimum number of samples to split a node
    pub min_samples_split: Vec<usize>,
    /// Minimum number of samples in a leaf
    pub min_samples_leaf: Vec<usize>,
}

impl Default for ForestGrid {
    fn default() -> Self {
        ForestGrid {
            n_trees: vec![100, 200],
            max_depth: vec![None, Some(10), Some(20)],
            min_samples_split: vec![2, 5],
            min_samples_leaf: vec![1, 2],
        }
    }
}

impl ForestGrid {
    /// Every combination in lexicographic order of the grid axes
    pub fn candidates(&self, seed: u64) -> Result<Vec<RegressorParams>> {
        let mut candidates = Vec::new();
        for &n_trees in &self.n_trees {
            for &max_depth in &self.max_depth {
                for &min_samples_split in &self.min_samples_split {
                    for &min_samples_leaf in &self.min_samples_leaf {
                        let params = RandomForest::params()
                            .n_trees(n_trees)
                            .max_depth(max_depth)
                            .min_samples_split(min_samples_split)
                            .min_samples_leaf(min_samples_leaf)
                            .seed(seed)
                            .check()?;
                        candidates.push(RegressorParams::RandomForest(params));
                    }
                }
            }
        }
        Ok(candidates)
    }
}

/// Gradient boosting search space
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostingGrid {
    /// Number of stages
    pub n_trees: Vec<usize>,
    /// Learning rates
    pub learning_rate: Vec<f64>,
    /// Maximum depth of stage trees
    pub max_depth: Vec<usize>,
    /// Minimum number of samples to split a node
    pub min_samples_split: Vec<usize>,
    /// Minimum number of samples in a leaf
    pub min_samples_leaf: Vec<usize>,
}

impl Default for BoostingGrid {
    fn default() -> Self {
        BoostingGrid {
            n_trees: vec![100, 200],
            learning_rate: vec![0.05, 0.1],
            max_depth: vec![3, 5],
            min_samples_split: vec![2, 5],
            min_samples_leaf: vec![1, 2],
        }
    }
}

impl BoostingGrid {
    /// Every combination in lexicographic order of the grid axes
    pub fn candidates(&self) -> Result<Vec<RegressorParams>> {
        let mut candidates = Vec::new();
        for &n_trees in &self.n_trees {
            for &learning_rate in &self.learning_rate {
                for &max_depth in &self.max_depth {
                    for &min_samples_split in &self.min_samples_split {
                        for &min_samples_leaf in &self.min_samples_leaf {
                            let params = GradientBoosting::params()
                                .n_trees(n_trees)
                                .learning_rate(learning_rate)
                                .max_depth(max_depth)
                                .min_samples_split(min_samples_split)
                                .min_samples_leaf(min_samples_leaf)
                                .check()?;
                            candidates.push(RegressorParams::GradientBoosting(params));
                        }
                    }
                }
            }
        }
        Ok(candidates)
    }
}

/// Cross-validate every candidate (in parallel) and return the best scoring
/// one with its score. The first candidate wins on equal scores.
pub fn grid_search(
    candidates: &[RegressorParams],
    x: &ArrayBase<impl Data<Elem = f64>, Ix2>,
    y: &ArrayBase<impl Data<Elem = f64>, Ix1>,
    strategy: CvStrategy,
) -> Result<(RegressorParams, CvScore)> {
    if candidates.is_empty() {
        return Err(ModelError::InvalidValueError(
            "empty hyperparameter grid".to_string(),
        ));
    }
    info!(
        "Grid search over {} configurations ({strategy})",
        candidates.len()
    );
    let (x, y) = (x.view(), y.view());
    let scores = candidates
        .par_iter()
        .map(|params| {
            let score = cross_validate(&PipelineParams::new(params.clone()), &x, &y, strategy)?;
            debug!("{params}: {score}");
            Ok(score)
        })
        .collect::<Result<Vec<CvScore>>>()?;

    let mut best = 0;
    for (i, score) in scores.iter().enumerate().skip(1) {
        // NaN scores never win
        if score.mean > scores[best].mean || (scores[best].mean.is_nan() && !score.mean.is_nan()) {
            best = i;
        }
    }
    info!("Best parameters: {}", candidates[best]);
    info!("Best {}", scores[best]);
    Ok((candidates[best].clone(), scores[best]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array, Array1, Array2, Axis};

    #[test]
    fn test_default_grid_sizes() {
        assert_eq!(ForestGrid::default().candidates(42).unwrap().len(), 24);
        assert_eq!(BoostingGrid::default().candidates().unwrap().len(), 32);
        let first = &ForestGrid::default().candidates(42).unwrap()[0];
        match first {
            RegressorParams::RandomForest(p) => {
                assert_eq!(p.n_trees(), 100);
                assert_eq!(p.tree().max_depth(), None);
                assert_eq!(p.seed(), 42);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_invalid_grid() {
        let grid = BoostingGrid {
            learning_rate: vec![0.],
            ..BoostingGrid::default()
        };
        assert!(grid.candidates().is_err());
        let x: Array2<f64> = Array2::zeros((4, 1));
        let y: Array1<f64> = Array1::zeros(4);
        assert!(grid_search(&[], &x, &y, CvStrategy::LeaveOneOut).is_err());
    }

    #[test]
    fn test_grid_search_prefers_deeper_trees() {
        let x = Array::linspace(0., 1., 40).insert_axis(Axis(1));
        let y = x.column(0).mapv(|v: f64| (6. * v).sin());
        let grid = BoostingGrid {
            n_trees: vec![30],
            learning_rate: vec![0.1],
            max_depth: vec![1, 3],
            min_samples_split: vec![2],
            min_samples_leaf: vec![1],
        };
        let (best, score) = grid_search(
            &grid.candidates().unwrap(),
            &x,
            &y,
            CvStrategy::KFold { k: 5, seed: 42 },
        )
        .unwrap();
        match best {
            RegressorParams::GradientBoosting(p) => assert_eq!(p.tree().max_depth(), Some(3)),
            other => panic!("unexpected {other:?}"),
        }
        assert!(score.mean > 0.5);
    }
}
