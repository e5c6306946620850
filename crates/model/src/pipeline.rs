use crate::errors::{ModelError, Result};
use crate::regressor::{Regressor, RegressorParams};
use crate::scaler::RobustScaler;
use linfa::traits::{Fit, PredictInplace, Transformer};
use linfa::DatasetBase;
use ndarray::{Array1, ArrayBase, Data, Ix1, Ix2};
use serde::{Deserialize, Serialize};

/// Parameters of a scale then regress pipeline
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PipelineParams(RegressorParams);

impl PipelineParams {
    /// Pipeline scaling features with a [RobustScaler] before the given regressor
    pub fn new(regressor: RegressorParams) -> PipelineParams {
        PipelineParams(regressor)
    }

    /// Regressor parameters
    pub fn regressor(&self) -> &RegressorParams {
        &self.0
    }

    /// Fit the scaler on x, then the regressor on scaled x
    pub fn train(
        &self,
        x: &ArrayBase<impl Data<Elem = f64>, Ix2>,
        y: &ArrayBase<impl Data<Elem = f64>, Ix1>,
    ) -> Result<Pipeline> {
        let scaler = RobustScaler::fit(x)?;
        let xs = scaler.transform(x);
        let regressor = self.0.train(&xs, y)?;
        Ok(Pipeline { scaler, regressor })
    }
}

impl<D: Data<Elem = f64>> Fit<ArrayBase<D, Ix2>, ArrayBase<D, Ix1>, ModelError> for PipelineParams {
    type Object = Pipeline;

    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, ArrayBase<D, Ix1>>) -> Result<Self::Object> {
        self.train(dataset.records(), dataset.targets())
    }
}

/// A fitted two stage pipeline: robust scaler then regressor
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    scaler: RobustScaler,
    regressor: Regressor,
}

impl Pipeline {
    /// Fitted scaler
    pub fn scaler(&self) -> &RobustScaler {
        &self.scaler
    }

    /// Fitted regressor
    pub fn regressor(&self) -> &Regressor {
        &self.regressor
    }

    /// Number of input features
    pub fn n_features(&self) -> usize {
        self.scaler.dim()
    }
}

impl<D: Data<Elem = f64>> PredictInplace<ArrayBase<D, Ix2>, Array1<f64>> for Pipeline {
    fn predict_inplace(&self, x: &ArrayBase<D, Ix2>, y: &mut Array1<f64>) {
        assert_eq!(
            x.ncols(),
            self.n_features(),
            "The number of features must match the one used for training."
        );
        let xs = self.scaler.transform(x);
        self.regressor.predict_inplace(&xs, y);
    }

    fn default_target(&self, x: &ArrayBase<D, Ix2>) -> Array1<f64> {
        Array1::zeros(x.nrows())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linear::BayesianRidge;
    use approx::assert_abs_diff_eq;
    use linfa::traits::Predict;
    use linfa::ParamGuard;
    use ndarray::array;

    #[test]
    fn test_pipeline_scales_before_regressing() {
        let x = array![[100., 1.], [200., 2.], [300., 1.], [400., 2.], [500., 1.]];
        let y = x.column(0).mapv(|v| v / 100.);
        let params = PipelineParams::new(RegressorParams::BayesianRidge(
            BayesianRidge::params().check().unwrap(),
        ));
        let pipeline = params.train(&x, &y).unwrap();
        assert_eq!(pipeline.n_features(), 2);
        assert_abs_diff_eq!(pipeline.scaler().center()[0], 300.);
        let (_, coef) = pipeline.regressor().native_importance().unwrap();
        // one scaled unit of feature 0 is an IQR of 200
        assert_abs_diff_eq!(coef[0], 2., epsilon = 1e-2);
        assert_abs_diff_eq!(pipeline.predict(&array![[250., 1.]])[0], 2.5, epsilon = 1e-2);
    }
}
