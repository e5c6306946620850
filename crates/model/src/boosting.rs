//! Least squares gradient boosting of regression trees.
use crate::errors::{ModelError, Result};
use crate::forest::mean_importances;
use crate::tree::{RegressionTree, TreeParams, TreeValidParams};
use linfa::traits::{Fit, PredictInplace};
use linfa::{DatasetBase, ParamGuard};
use log::{debug, trace};
use ndarray::{Array1, ArrayBase, Data, Ix1, Ix2};
use serde::{Deserialize, Serialize};

/// Validated gradient boosting parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingValidParams {
    n_trees: usize,
    learning_rate: f64,
    tree: TreeValidParams,
}

impl Default for GradientBoostingValidParams {
    fn default() -> Self {
        GradientBoostingValidParams {
            n_trees: 100,
            learning_rate: 0.1,
            tree: TreeValidParams {
                max_depth: Some(3),
                ..TreeValidParams::default()
            },
        }
    }
}

impl GradientBoostingValidParams {
    /// Number of boosting stages
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    /// Shrinkage applied to each stage contribution
    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Parameters of each stage tree
    pub fn tree(&self) -> &TreeValidParams {
        &self.tree
    }
}

/// Gradient boosting parameters builder
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingParams(GradientBoostingValidParams);

impl GradientBoostingParams {
    /// Constructor with default parameters: 100 stages of depth 3, rate 0.1
    pub fn new() -> GradientBoostingParams {
        Self(GradientBoostingValidParams::default())
    }

    /// Set the number of boosting stages
    pub fn n_trees(mut self, n_trees: usize) -> Self {
        self.0.n_trees = n_trees;
        self
    }

    /// Set the learning rate
    pub fn learning_rate(mut self, learning_rate: f64) -> Self {
        self.0.learning_rate = learning_rate;
        self
    }

    /// Set the maximum depth of stage trees
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.0.tree.max_depth = Some(max_depth);
        self
    }

    /// Set the minimum number of samples to split a node
    pub fn min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.0.tree.min_samples_split = min_samples_split;
        self
    }

    /// Set the minimum number of samples in a leaf
    pub fn min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.0.tree.min_samples_leaf = min_samples_leaf;
        self
    }
}

impl From<GradientBoostingValidParams> for GradientBoostingParams {
    fn from(item: GradientBoostingValidParams) -> Self {
        GradientBoostingParams(item)
    }
}

impl ParamGuard for GradientBoostingParams {
    type Checked = GradientBoostingValidParams;
    type Error = ModelError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        TreeParams::from(self.0.tree.clone()).check_ref()?;
        if self.0.n_trees == 0 {
            return Err(ModelError::InvalidValueError(
                "`n_trees` should be strictly positive".to_string(),
            ));
        }
        if !(self.0.learning_rate > 0. && self.0.learning_rate <= 1.) {
            return Err(ModelError::InvalidValueError(format!(
                "`learning_rate` should be in ]0, 1], got {}",
                self.0.learning_rate
            )));
        }
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

/// A fitted gradient boosting ensemble
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradientBoosting {
    init: f64,
    learning_rate: f64,
    trees: Vec<RegressionTree>,
    importances: Array1<f64>,
}

impl GradientBoosting {
    /// Default parameters
    pub fn params() -> GradientBoostingParams {
        GradientBoostingParams::new()
    }

    /// Initial prediction, the training targets mean
    pub fn init(&self) -> f64 {
        self.init
    }

    /// Stage trees
    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }

    /// Mean of stage trees impurity importances, normalized to sum 1
    pub fn feature_importances(&self) -> &Array1<f64> {
        &self.importances
    }
}

impl<D: Data<Elem = f64>> Fit<ArrayBase<D, Ix2>, ArrayBase<D, Ix1>, ModelError>
    for GradientBoostingValidParams
{
    type Object = GradientBoosting;

    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, ArrayBase<D, Ix1>>) -> Result<Self::Object> {
        self.train(dataset.records(), dataset.targets())
    }
}

impl GradientBoostingValidParams {
    /// Fit on the given training data (x, y): stages are fitted sequentially
    /// on the residuals of the current ensemble
    pub fn train(
        &self,
        x: &ArrayBase<impl Data<Elem = f64>, Ix2>,
        y: &ArrayBase<impl Data<Elem = f64>, Ix1>,
    ) -> Result<GradientBoosting> {
        let n = x.nrows();
        if n == 0 || n != y.len() {
            return Err(ModelError::InvalidValueError(format!(
                "bad training data: {} rows for {} targets",
                n,
                y.len()
            )));
        }
        let x = x.view();
        let init = y.mean().unwrap_or(0.);
        let mut current = Array1::from_elem(n, init);
        let mut trees = Vec::with_capacity(self.n_trees);
        for stage in 0..self.n_trees {
            let residuals = y - &current;
            let tree = self.tree.train(&x, &residuals.view())?;
            for (i, row) in x.rows().into_iter().enumerate() {
                current[i] += self.learning_rate * tree.predict_row(row);
            }
            trace!(
                "Boosting stage {stage}: residual sum of squares {}",
                residuals.mapv(|r| r * r).sum()
            );
            trees.push(tree);
        }
        let importances = mean_importances(&trees, x.ncols());
        debug!("Gradient boosting fitted with {} stages", trees.len());
        Ok(GradientBoosting {
            init,
            learning_rate: self.learning_rate,
            trees,
            importances,
        })
    }
}

impl<D: Data<Elem = f64>> PredictInplace<ArrayBase<D, Ix2>, Array1<f64>> for GradientBoosting {
    fn predict_inplace(&self, x: &ArrayBase<D, Ix2>, y: &mut Array1<f64>) {
        assert_eq!(
            x.nrows(),
            y.len(),
            "The number of data points must match the number of output targets."
        );
        for (row, yi) in x.rows().into_iter().zip(y.iter_mut()) {
            *yi = self.init
                + self.learning_rate * self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>();
        }
    }

    fn default_target(&self, x: &ArrayBase<D, Ix2>) -> Array1<f64> {
        Array1::zeros(x.nrows())
    }
}
