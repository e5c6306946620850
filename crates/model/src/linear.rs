//! Bayesian ridge regression.
//!
//! Coefficients get a zero mean gaussian prior of precision `lambda`, noise has
//! precision `alpha`, both with Gamma hyper priors. `alpha` and `lambda` are
//! estimated by maximizing the evidence, iterating the MacKay fixed point
//! updates on the eigendecomposition of `XᵀX` until coefficients stabilize.
use crate::errors::{ModelError, Result};
use linfa::traits::{Fit, PredictInplace};
use linfa::{DatasetBase, ParamGuard};
use linfa_linalg::eigh::EighInto;
use log::{debug, trace};
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix1, Ix2};
use serde::{Deserialize, Serialize};

/// Validated Bayesian ridge parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BayesianRidgeValidParams {
    max_iter: usize,
    tol: f64,
    alpha_1: f64,
    alpha_2: f64,
    lambda_1: f64,
    lambda_2: f64,
}

impl Default for BayesianRidgeValidParams {
    fn default() -> Self {
        BayesianRidgeValidParams {
            max_iter: 300,
            tol: 1e-3,
            alpha_1: 1e-6,
            alpha_2: 1e-6,
            lambda_1: 1e-6,
            lambda_2: 1e-6,
        }
    }
}

impl BayesianRidgeValidParams {
    /// Maximum number of evidence iterations
    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    /// Convergence tolerance on the L1 change of coefficients
    pub fn tol(&self) -> f64 {
        self.tol
    }

    /// Gamma prior (shape, rate) over noise precision
    pub fn alpha_prior(&self) -> (f64, f64) {
        (self.alpha_1, self.alpha_2)
    }

    /// Gamma prior (shape, rate) over weights precision
    pub fn lambda_prior(&self) -> (f64, f64) {
        (self.lambda_1, self.lambda_2)
    }
}

/// Bayesian ridge parameters builder
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BayesianRidgeParams(BayesianRidgeValidParams);

impl BayesianRidgeParams {
    /// Constructor with default parameters
    pub fn new() -> BayesianRidgeParams {
        Self(BayesianRidgeValidParams::default())
    }

    /// Set the maximum number of iterations
    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.0.max_iter = max_iter;
        self
    }

    /// Set the convergence tolerance
    pub fn tol(mut self, tol: f64) -> Self {
        self.0.tol = tol;
        self
    }

    /// Set Gamma prior (shape, rate) over the noise precision
    pub fn alpha_prior(mut self, alpha_1: f64, alpha_2: f64) -> Self {
        self.0.alpha_1 = alpha_1;
        self.0.alpha_2 = alpha_2;
        self
    }

    /// Set Gamma prior (shape, rate) over the weights precision
    pub fn lambda_prior(mut self, lambda_1: f64, lambda_2: f64) -> Self {
        self.0.lambda_1 = lambda_1;
        self.0.lambda_2 = lambda_2;
        self
    }
}

impl From<BayesianRidgeValidParams> for BayesianRidgeParams {
    fn from(item: BayesianRidgeValidParams) -> Self {
        BayesianRidgeParams(item)
    }
}

impl ParamGuard for BayesianRidgeParams {
    type Checked = BayesianRidgeValidParams;
    type Error = ModelError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        if self.0.max_iter == 0 {
            return Err(ModelError::InvalidValueError(
                "`max_iter` should be strictly positive".to_string(),
            ));
        }
        if self.0.tol <= 0. {
            return Err(ModelError::InvalidValueError(
                "`tol` should be strictly positive".to_string(),
            ));
        }
        let priors = [
            self.0.alpha_1,
            self.0.alpha_2,
            self.0.lambda_1,
            self.0.lambda_2,
        ];
        if priors.iter().any(|p| *p < 0.) {
            return Err(ModelError::InvalidValueError(
                "Gamma priors should be non negative".to_string(),
            ));
        }
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

/// A fitted Bayesian ridge regression
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BayesianRidge {
    coef: Array1<f64>,
    intercept: f64,
    alpha: f64,
    lambda: f64,
    n_iter: usize,
}

impl BayesianRidge {
    /// Default parameters
    pub fn params() -> BayesianRidgeParams {
        BayesianRidgeParams::new()
    }

    /// Regression coefficients
    pub fn coef(&self) -> &Array1<f64> {
        &self.coef
    }

    /// Intercept
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Estimated noise precision
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Estimated weights precision
    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    /// Number of evidence iterations run
    pub fn n_iter(&self) -> usize {
        self.n_iter
    }
}

impl<D: Data<Elem = f64>> Fit<ArrayBase<D, Ix2>, ArrayBase<D, Ix1>, ModelError>
    for BayesianRidgeValidParams
{
    type Object = BayesianRidge;

    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, ArrayBase<D, Ix1>>) -> Result<Self::Object> {
        self.train(dataset.records(), dataset.targets())
    }
}

impl BayesianRidgeValidParams {
    /// Fit on the given training data (x, y)
    pub fn train(
        &self,
        x: &ArrayBase<impl Data<Elem = f64>, Ix2>,
        y: &ArrayBase<impl Data<Elem = f64>, Ix1>,
    ) -> Result<BayesianRidge> {
        let n = x.nrows();
        if n == 0 || n != y.len() {
            return Err(ModelError::InvalidValueError(format!(
                "bad training data: {} rows for {} targets",
                n,
                y.len()
            )));
        }
        let n_samples = n as f64;
        let x_offset = x.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(x.ncols()));
        let y_offset = y.mean().unwrap_or(0.);
        let xc = x - &x_offset;
        let yc = y - y_offset;

        let xt_y = xc.t().dot(&yc);
        let (eigen_vals, eigen_vecs) = xc.t().dot(&xc).eigh_into()?;
        // XᵀX is semi definite, round off negative eigenvalues
        let eigen_vals = eigen_vals.mapv(|v| v.max(0.));
        let vt_xt_y = eigen_vecs.t().dot(&xt_y);

        let mut alpha = 1. / (yc.var(0.) + f64::EPSILON);
        let mut lambda = 1.;
        let mut coef_old: Option<Array1<f64>> = None;
        let mut n_iter = 0;

        for iter in 0..self.max_iter {
            n_iter = iter + 1;
            let (coef, rmse) = update_coef(&xc, &yc, &eigen_vals, &eigen_vecs, &vt_xt_y, alpha, lambda);
            let gamma = eigen_vals
                .iter()
                .map(|&e| alpha * e / (lambda + alpha * e))
                .sum::<f64>();
            lambda = (gamma + 2. * self.lambda_1) / (coef.mapv(|c| c * c).sum() + 2. * self.lambda_2);
            alpha = (n_samples - gamma + 2. * self.alpha_1) / (rmse + 2. * self.alpha_2);
            trace!("BayesianRidge iter {iter}: alpha={alpha} lambda={lambda}");
            if let Some(old) = &coef_old {
                if (old - &coef).mapv(f64::abs).sum() < self.tol {
                    debug!("BayesianRidge converged after {n_iter} iterations");
                    break;
                }
            }
            coef_old = Some(coef);
        }

        let (coef, _) = update_coef(&xc, &yc, &eigen_vals, &eigen_vecs, &vt_xt_y, alpha, lambda);
        let intercept = y_offset - x_offset.dot(&coef);
        Ok(BayesianRidge {
            coef,
            intercept,
            alpha,
            lambda,
            n_iter,
        })
    }
}

/// Posterior mean of the coefficients `(XᵀX + λ/α I)⁻¹ Xᵀy` and residual sum of squares
fn update_coef(
    xc: &Array2<f64>,
    yc: &Array1<f64>,
    eigen_vals: &Array1<f64>,
    eigen_vecs: &Array2<f64>,
    vt_xt_y: &Array1<f64>,
    alpha: f64,
    lambda: f64,
) -> (Array1<f64>, f64) {
    let ratio = lambda / alpha;
    let scaled = vt_xt_y / &eigen_vals.mapv(|e| e + ratio);
    let coef = eigen_vecs.dot(&scaled);
    let rmse = (yc - &xc.dot(&coef)).mapv(|r| r * r).sum();
    (coef, rmse)
}

impl<D: Data<Elem = f64>> PredictInplace<ArrayBase<D, Ix2>, Array1<f64>> for BayesianRidge {
    fn predict_inplace(&self, x: &ArrayBase<D, Ix2>, y: &mut Array1<f64>) {
        assert_eq!(
            x.nrows(),
            y.len(),
            "The number of data points must match the number of output targets."
        );
        *y = x.dot(&self.coef) + self.intercept;
    }

    fn default_target(&self, x: &ArrayBase<D, Ix2>) -> Array1<f64> {
        Array1::zeros(x.nrows())
    }
}
