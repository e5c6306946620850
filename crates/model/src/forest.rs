//! Random forest regression: bagged fully grown CART trees.
use crate::errors::{ModelError, Result};
use crate::tree::{RegressionTree, TreeParams, TreeValidParams};
use linfa::traits::{Fit, PredictInplace};
use linfa::{DatasetBase, ParamGuard};
use log::debug;
use ndarray::{Array1, ArrayBase, Axis, Data, Ix1, Ix2};
use ndarray_rand::rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Validated random forest parameters
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomForestValidParams {
    n_trees: usize,
    tree: TreeValidParams,
    seed: u64,
}

impl Default for RandomForestValidParams {
    fn default() -> Self {
        RandomForestValidParams {
            n_trees: 100,
            tree: TreeValidParams::default(),
            seed: 42,
        }
    }
}

impl RandomForestValidParams {
    /// Number of trees
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    /// Parameters of each tree
    pub fn tree(&self) -> &TreeValidParams {
        &self.tree
    }

    /// Seed of the bootstrap sampling
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

/// Random forest parameters builder
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomForestParams(RandomForestValidParams);

impl RandomForestParams {
    /// Constructor with default parameters
    pub fn new() -> RandomForestParams {
        Self(RandomForestValidParams::default())
    }

    /// Set the number of trees
    pub fn n_trees(mut self, n_trees: usize) -> Self {
        self.0.n_trees = n_trees;
        self
    }

    /// Set the maximum depth of trees
    pub fn max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.0.tree.max_depth = max_depth;
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

    /// Set the seed of the bootstrap sampling
    pub fn seed(mut self, seed: u64) -> Self {
        self.0.seed = seed;
        self
    }
}

impl From<RandomForestValidParams> for RandomForestParams {
    fn from(item: RandomForestValidParams) -> Self {
        RandomForestParams(item)
    }
}

impl ParamGuard for RandomForestParams {
    type Checked = RandomForestValidParams;
    type Error = ModelError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        TreeParams::from(self.0.tree.clone()).check_ref()?;
        if self.0.n_trees == 0 {
            return Err(ModelError::InvalidValueError(
                "`n_trees` should be strictly positive".to_string(),
            ));
        }
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

/// A fitted random forest
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
    importances: Array1<f64>,
}

impl RandomForest {
    /// Default parameters
    pub fn params() -> RandomForestParams {
        RandomForestParams::new()
    }

    /// Fitted trees
    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }

    /// Mean of trees impurity importances, normalized to sum 1
    pub fn feature_importances(&self) -> &Array1<f64> {
        &self.importances
    }
}

impl<D: Data<Elem = f64>> Fit<ArrayBase<D, Ix2>, ArrayBase<D, Ix1>, ModelError>
    for RandomForestValidParams
{
    type Object = RandomForest;

    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, ArrayBase<D, Ix1>>) -> Result<Self::Object> {
        self.train(dataset.records(), dataset.targets())
    }
}

impl RandomForestValidParams {
    /// Fit on the given training data (x, y), each tree on its own
    /// bootstrap sample drawn from a generator seeded with `seed + tree index`
    pub fn train(
        &self,
        x: &ArrayBase<impl Data<Elem = f64>, Ix2>,
        y: &ArrayBase<impl Data<Elem = f64>, Ix1>,
    ) -> Result<RandomForest> {
        let n = x.nrows();
        if n == 0 || n != y.len() {
            return Err(ModelError::InvalidValueError(format!(
                "bad training data: {} rows for {} targets",
                n,
                y.len()
            )));
        }
        let (x, y) = (x.view(), y.view());
        let trees = (0..self.n_trees)
            .into_par_iter()
            .map(|i| {
                let mut rng = Xoshiro256Plus::seed_from_u64(self.seed.wrapping_add(i as u64));
                let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                let xb = x.select(Axis(0), &sample);
                let yb = y.select(Axis(0), &sample);
                self.tree.train(&xb.view(), &yb.view())
            })
            .collect::<Result<Vec<_>>>()?;
        let importances = mean_importances(&trees, x.ncols());
        debug!("Random forest fitted with {} trees", trees.len());
        Ok(RandomForest { trees, importances })
    }
}

/// Mean of per tree importances renormalized to sum 1
pub(crate) fn mean_importances(trees: &[RegressionTree], n_features: usize) -> Array1<f64> {
    let sum = trees
        .iter()
        .fold(Array1::zeros(n_features), |acc, t| acc + t.feature_importances());
    let total = sum.sum();
    if total > 0. {
        sum / total
    } else {
        sum
    }
}

impl<D: Data<Elem = f64>> PredictInplace<ArrayBase<D, Ix2>, Array1<f64>> for RandomForest {
    fn predict_inplace(&self, x: &ArrayBase<D, Ix2>, y: &mut Array1<f64>) {
        assert_eq!(
            x.nrows(),
            y.len(),
            "The number of data points must match the number of output targets."
        );
        let n_trees = self.trees.len() as f64;
        for (row, yi) in x.rows().into_iter().zip(y.iter_mut()) {
            *yi = self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>() / n_trees;
        }
    }

    fn default_target(&self, x: &ArrayBase<D, Ix2>) -> Array1<f64> {
        Array1::zeros(x.nrows())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use linfa::traits::Predict;
    use ndarray::{array, Array, Array2};

    fn training_data() -> (Array2<f64>, Array1<f64>) {
        let x1 = Array::linspace(0., 1., 40);
        let mut x = Array2::zeros((40, 2));
        x.column_mut(0).assign(&x1);
        x.column_mut(1).assign(&x1.mapv(|v: f64| (v * 7.).sin()));
        let y = x1.mapv(|v| if v < 0.5 { 1. } else { 5. });
        (x, y)
    }

    #[test]
    fn test_forest_is_reproducible() {
        let (x, y) = training_data();
        let params = RandomForest::params().n_trees(20).check().unwrap();
        let rf1 = params.train(&x, &y).unwrap();
        let rf2 = params.train(&x, &y).unwrap();
        assert_eq!(rf1, rf2);
        assert_eq!(rf1.trees().len(), 20);

        let pred = rf1.predict(&array![[0.1, 0.], [0.9, 0.]]);
        assert_abs_diff_eq!(pred, array![1., 5.], epsilon = 0.5);
        assert_abs_diff_eq!(rf1.feature_importances().sum(), 1., epsilon = 1e-12);
        assert!(rf1.feature_importances()[0] > rf1.feature_importances()[1]);
    }

    #[test]
    fn test_forest_params() {
        assert!(RandomForest::params().n_trees(0).check().is_err());
        let params = RandomForest::params()
            .max_depth(Some(3))
            .min_samples_leaf(2)
            .check()
            .unwrap();
        assert_eq!(params.tree().max_depth(), Some(3));
        assert_eq!(params.tree().min_samples_leaf(), 2);
    }
}
