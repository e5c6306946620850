//! CART regression tree, the building block of tree ensembles.
use crate::errors::{ModelError, Result};
use linfa::traits::{Fit, PredictInplace};
use linfa::{DatasetBase, ParamGuard};
use ndarray::{Array1, ArrayBase, ArrayView1, ArrayView2, Data, Ix1, Ix2};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Validated regression tree parameters
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeValidParams {
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_split: usize,
    pub(crate) min_samples_leaf: usize,
}

impl Default for TreeValidParams {
    fn default() -> Self {
        TreeValidParams {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

impl TreeValidParams {
    /// Maximum depth, unlimited if `None`
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Minimum number of samples required to split a node
    pub fn min_samples_split(&self) -> usize {
        self.min_samples_split
    }

    /// Minimum number of samples in a leaf
    pub fn min_samples_leaf(&self) -> usize {
        self.min_samples_leaf
    }
}

/// Regression tree parameters builder
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeParams(TreeValidParams);

impl TreeParams {
    /// Constructor with default parameters: fully grown tree
    pub fn new() -> TreeParams {
        Self(TreeValidParams::default())
    }

    /// Set the maximum depth
    pub fn max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.0.max_depth = max_depth;
        self
    }

    /// Set the minimum number of samples required to split a node
    pub fn min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.0.min_samples_split = min_samples_split;
        self
    }

    /// Set the minimum number of samples in a leaf
    pub fn min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.0.min_samples_leaf = min_samples_leaf;
        self
    }
}

impl From<TreeValidParams> for TreeParams {
    fn from(item: TreeValidParams) -> Self {
        TreeParams(item)
    }
}

impl ParamGuard for TreeParams {
    type Checked = TreeValidParams;
    type Error = ModelError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        if self.0.min_samples_split < 2 {
            return Err(ModelError::InvalidValueError(
                "`min_samples_split` should be at least 2".to_string(),
            ));
        }
        if self.0.min_samples_leaf < 1 {
            return Err(ModelError::InvalidValueError(
                "`min_samples_leaf` should be at least 1".to_string(),
            ));
        }
        if self.0.max_depth == Some(0) {
            return Err(ModelError::InvalidValueError(
                "`max_depth` should be strictly positive".to_string(),
            ));
        }
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A fitted regression tree
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
    /// Total impurity (squared error) decrease per feature, normalized to sum 1
    importances: Array1<f64>,
}

impl RegressionTree {
    /// Default parameters
    pub fn params() -> TreeParams {
        TreeParams::new()
    }

    /// Impurity based feature importances summing to 1 (all zeros for a single leaf)
    pub fn feature_importances(&self) -> &Array1<f64> {
        &self.importances
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Depth of the tree, 0 for a single leaf
    pub fn depth(&self) -> usize {
        fn depth_from(nodes: &[Node], i: usize) -> usize {
            match nodes[i] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => {
                    1 + depth_from(nodes, left).max(depth_from(nodes, right))
                }
            }
        }
        depth_from(&self.nodes, 0)
    }

    /// Prediction for a single observation
    pub fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        let mut i = 0;
        loop {
            match &self.nodes[i] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    i = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    }
                }
            }
        }
    }
}

impl<D: Data<Elem = f64>> Fit<ArrayBase<D, Ix2>, ArrayBase<D, Ix1>, ModelError>
    for TreeValidParams
{
    type Object = RegressionTree;

    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, ArrayBase<D, Ix1>>) -> Result<Self::Object> {
        self.train(&dataset.records().view(), &dataset.targets().view())
    }
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    /// number of samples going left once indices are sorted on `feature`
    n_left: usize,
    gain: f64,
}

struct Builder<'a> {
    params: &'a TreeValidParams,
    x: ArrayView2<'a, f64>,
    y: ArrayView1<'a, f64>,
    nodes: Vec<Node>,
    importances: Array1<f64>,
}

impl TreeValidParams {
    /// Grow a tree on the given training data (x, y)
    pub fn train(&self, x: &ArrayView2<f64>, y: &ArrayView1<f64>) -> Result<RegressionTree> {
        if x.nrows() == 0 || x.nrows() != y.len() {
            return Err(ModelError::InvalidValueError(format!(
                "bad training data: {} rows for {} targets",
                x.nrows(),
                y.len()
            )));
        }
        let mut builder = Builder {
            params: self,
            x: x.view(),
            y: y.view(),
            nodes: Vec::new(),
            importances: Array1::zeros(x.ncols()),
        };
        let mut indices: Vec<usize> = (0..x.nrows()).collect();
        builder.grow(&mut indices, 0);
        let total = builder.importances.sum();
        let importances = if total > 0. {
            builder.importances / total
        } else {
            builder.importances
        };
        Ok(RegressionTree {
            nodes: builder.nodes,
            importances,
        })
    }
}

impl Builder<'_> {
    /// Grow the subtree over `indices`, returns its root node index
    fn grow(&mut self, indices: &mut [usize], depth: usize) -> usize {
        let n = indices.len();
        let sum: f64 = indices.iter().map(|&i| self.y[i]).sum();
        let value = sum / n as f64;
        let node = self.nodes.len();
        self.nodes.push(Node::Leaf { value });

        let depth_reached = self.params.max_depth.map_or(false, |d| depth >= d);
        if depth_reached
            || n < self.params.min_samples_split
            || n < 2 * self.params.min_samples_leaf
        {
            return node;
        }
        let Some(split) = self.best_split(indices, sum) else {
            return node;
        };

        self.importances[split.feature] += split.gain;
        let x = self.x;
        indices.sort_by(|&a, &b| cmp_f64(x[[a, split.feature]], x[[b, split.feature]]));
        let (left_idx, right_idx) = indices.split_at_mut(split.n_left);
        let left = self.grow(left_idx, depth + 1);
        let right = self.grow(right_idx, depth + 1);
        self.nodes[node] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        node
    }

    /// Split maximizing the squared error decrease, first feature wins on ties
    fn best_split(&self, indices: &[usize], sum: f64) -> Option<SplitCandidate> {
        let n = indices.len();
        let min_leaf = self.params.min_samples_leaf;
        let parent = sum * sum / n as f64;
        let mut best: Option<SplitCandidate> = None;
        let mut sorted = indices.to_vec();

        for feature in 0..self.x.ncols() {
            let col = self.x.column(feature);
            sorted.sort_by(|&a, &b| cmp_f64(col[a], col[b]));
            let mut left_sum = 0.;
            for pos in 0..n - 1 {
                left_sum += self.y[sorted[pos]];
                let n_left = pos + 1;
                let (lo, hi) = (col[sorted[pos]], col[sorted[pos + 1]]);
                if n_left < min_leaf || n - n_left < min_leaf || lo >= hi {
                    continue;
                }
                let right_sum = sum - left_sum;
                // SSE(parent) - SSE(left) - SSE(right)
                let gain = left_sum * left_sum / n_left as f64
                    + right_sum * right_sum / (n - n_left) as f64
                    - parent;
                if gain > best.as_ref().map_or(1e-12, |b| b.gain) {
                    best = Some(SplitCandidate {
                        feature,
                        threshold: lo + (hi - lo) / 2.,
                        n_left,
                        gain,
                    });
                }
            }
        }
        best
    }
}

fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

impl<D: Data<Elem = f64>> PredictInplace<ArrayBase<D, Ix2>, Array1<f64>> for RegressionTree {
    fn predict_inplace(&self, x: &ArrayBase<D, Ix2>, y: &mut Array1<f64>) {
        assert_eq!(
            x.nrows(),
            y.len(),
            "The number of data points must match the number of output targets."
        );
        for (row, yi) in x.rows().into_iter().zip(y.iter_mut()) {
            *yi = self.predict_row(row);
        }
    }

    fn default_target(&self, x: &ArrayBase<D, Ix2>) -> Array1<f64> {
        Array1::zeros(x.nrows())
    }
}
