use crate::boosting::{GradientBoosting, GradientBoostingValidParams};
use crate::errors::{ModelError, Result};
use crate::forest::{RandomForest, RandomForestValidParams};
use crate::importance::ImportanceKind;
use crate::linear::{BayesianRidge, BayesianRidgeValidParams};
use linfa::traits::{Fit, PredictInplace};
use linfa::DatasetBase;
use ndarray::{Array1, ArrayBase, Data, Ix1, Ix2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Validated parameters of one of the supported regressors
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RegressorParams {
    /// Bayesian ridge regression
    BayesianRidge(BayesianRidgeValidParams),
    /// Random forest
    RandomForest(RandomForestValidParams),
    /// Gradient boosting
    GradientBoosting(GradientBoostingValidParams),
}

impl RegressorParams {
    /// Fit the regressor on (x, y)
    pub fn train(
        &self,
        x: &ArrayBase<impl Data<Elem = f64>, Ix2>,
        y: &ArrayBase<impl Data<Elem = f64>, Ix1>,
    ) -> Result<Regressor> {
        Ok(match self {
            RegressorParams::BayesianRidge(p) => Regressor::Linear(p.train(x, y)?),
            RegressorParams::RandomForest(p) => {
                Regressor::TreeEnsemble(TreeEnsemble::RandomForest(p.train(x, y)?))
            }
            RegressorParams::GradientBoosting(p) => {
                Regressor::TreeEnsemble(TreeEnsemble::GradientBoosting(p.train(x, y)?))
            }
        })
    }
}

impl fmt::Display for RegressorParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegressorParams::BayesianRidge(p) => write!(
                f,
                "BayesianRidge(max_iter={}, tol={})",
                p.max_iter(),
                p.tol()
            ),
            RegressorParams::RandomForest(p) => write!(
                f,
                "RandomForest(n_trees={}, max_depth={:?}, min_samples_split={}, min_samples_leaf={})",
                p.n_trees(),
                p.tree().max_depth(),
                p.tree().min_samples_split(),
                p.tree().min_samples_leaf()
            ),
            RegressorParams::GradientBoosting(p) => write!(
                f,
                "GradientBoosting(n_trees={}, learning_rate={}, max_depth={:?}, min_samples_split={}, min_samples_leaf={})",
                p.n_trees(),
                p.learning_rate(),
                p.tree().max_depth(),
                p.tree().min_samples_split(),
                p.tree().min_samples_leaf()
            ),
        }
    }
}

impl<D: Data<Elem = f64>> Fit<ArrayBase<D, Ix2>, ArrayBase<D, Ix1>, ModelError> for RegressorParams {
    type Object = Regressor;

    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, ArrayBase<D, Ix1>>) -> Result<Self::Object> {
        self.train(dataset.records(), dataset.targets())
    }
}

/// A fitted tree ensemble
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TreeEnsemble {
    /// Bagged trees
    RandomForest(RandomForest),
    /// Boosted trees
    GradientBoosting(GradientBoosting),
}

/// A fitted regressor, either linear or a tree ensemble
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Regressor {
    /// Linear model exposing coefficients
    Linear(BayesianRidge),
    /// Tree ensemble exposing impurity importances
    TreeEnsemble(TreeEnsemble),
}

impl Regressor {
    /// Per feature scores the regressor natively provides: coefficients for
    /// a linear model, impurity importances for a tree ensemble
    pub fn native_importance(&self) -> Option<(ImportanceKind, &Array1<f64>)> {
        match self {
            Regressor::Linear(m) => Some((ImportanceKind::Coefficient, m.coef())),
            Regressor::TreeEnsemble(TreeEnsemble::RandomForest(m)) => {
                Some((ImportanceKind::Impurity, m.feature_importances()))
            }
            Regressor::TreeEnsemble(TreeEnsemble::GradientBoosting(m)) => {
                Some((ImportanceKind::Impurity, m.feature_importances()))
            }
        }
    }
}

impl<D: Data<Elem = f64>> PredictInplace<ArrayBase<D, Ix2>, Array1<f64>> for Regressor {
    fn predict_inplace(&self, x: &ArrayBase<D, Ix2>, y: &mut Array1<f64>) {
        match self {
            Regressor::Linear(m) => m.predict_inplace(x, y),
            Regressor::TreeEnsemble(TreeEnsemble::RandomForest(m)) => m.predict_inplace(x, y),
            Regressor::TreeEnsemble(TreeEnsemble::GradientBoosting(m)) => m.predict_inplace(x, y),
        }
    }

    fn default_target(&self, x: &ArrayBase<D, Ix2>) -> Array1<f64> {
        Array1::zeros(x.nrows())
    }
}
