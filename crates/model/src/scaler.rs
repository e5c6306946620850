use crate::errors::{ModelError, Result};
use linfa::traits::Transformer;
use ndarray::{Array1, Array2, ArrayBase, Data, Ix2, Zip};
use pelletq_data::column_quantiles;
use serde::{Deserialize, Serialize};

/// Feature scaler robust to outliers: `(x - median) / IQR` per feature.
///
/// A feature with a null interquartile range is only centered (scale 1).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RobustScaler {
    center: Array1<f64>,
    scale: Array1<f64>,
}

impl RobustScaler {
    /// Learn medians and interquartile ranges of the columns of `x`
    pub fn fit(x: &ArrayBase<impl Data<Elem = f64>, Ix2>) -> Result<RobustScaler> {
        if x.nrows() == 0 {
            return Err(ModelError::InvalidValueError(
                "cannot fit a scaler on empty data".to_string(),
            ));
        }
        let center = column_quantiles(x, 0.5)?;
        let q1 = column_quantiles(x, 0.25)?;
        let q3 = column_quantiles(x, 0.75)?;
        let scale = Zip::from(&q1).and(&q3).map_collect(|&q1, &q3| {
            let iqr = q3 - q1;
            if iqr == 0. || !iqr.is_finite() {
                1.
            } else {
                iqr
            }
        });
        Ok(RobustScaler { center, scale })
    }

    /// Per feature medians
    pub fn center(&self) -> &Array1<f64> {
        &self.center
    }

    /// Per feature interquartile ranges
    pub fn scale(&self) -> &Array1<f64> {
        &self.scale
    }

    /// Number of features the scaler was fitted on
    pub fn dim(&self) -> usize {
        self.center.len()
    }
}

impl<D: Data<Elem = f64>> Transformer<&ArrayBase<D, Ix2>, Array2<f64>> for RobustScaler {
    fn transform(&self, x: &ArrayBase<D, Ix2>) -> Array2<f64> {
        (x - &self.center) / &self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_robust_scaler() {
        let x = array![[1., 10.], [2., 10.], [3., 10.], [4., 10.], [100., 10.]];
        let scaler = RobustScaler::fit(&x).unwrap();
        assert_abs_diff_eq!(scaler.center(), &array![3., 10.]);
        assert_abs_diff_eq!(scaler.scale(), &array![2., 1.]);
        let xs = scaler.transform(&x);
        assert_abs_diff_eq!(xs.column(0), array![-1., -0.5, 0., 0.5, 48.5]);
        assert_abs_diff_eq!(xs.column(1), array![0., 0., 0., 0., 0.]);
    }
}
