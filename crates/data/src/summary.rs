//! Exploratory statistics on a cleaned dataset.
use crate::cleaning::column_quantiles;
use crate::dataset::Dataset;
use crate::errors::{DataError, Result};
use ndarray::{Array1, Array2};
use ndarray_stats::{CorrelationExt, QuantileExt};
use serde::Serialize;
use std::fmt;

/// Descriptive statistics of one column, computed over non missing values
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ColumnSummary {
    /// Column name
    pub name: String,
    /// Number of non missing values
    pub count: usize,
    /// Number of missing values
    pub missing: usize,
    /// Mean
    pub mean: f64,
    /// Sample standard deviation (ddof = 1), `NaN` below two values
    pub std: f64,
    /// Minimum
    pub min: f64,
    /// First quartile
    pub q1: f64,
    /// Median
    pub median: f64,
    /// Third quartile
    pub q3: f64,
    /// Maximum
    pub max: f64,
}

/// Column summaries of a dataset, displayed as a table
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Summary(pub Vec<ColumnSummary>);

impl Summary {
    /// Summary of the named column
    pub fn get(&self, name: &str) -> Option<&ColumnSummary> {
        self.0.iter().find(|c| c.name == name)
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.0.iter().map(|c| c.name.len()).max().unwrap_or(0).max(6);
        writeln!(
            f,
            "{:<width$} {:>6} {:>7} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
            "column", "count", "missing", "mean", "std", "min", "25%", "50%", "75%", "max"
        )?;
        for c in &self.0 {
            writeln!(
                f,
                "{:<width$} {:>6} {:>7} {:>10.4} {:>10.4} {:>10.4} {:>10.4} {:>10.4} {:>10.4} {:>10.4}",
                c.name, c.count, c.missing, c.mean, c.std, c.min, c.q1, c.median, c.q3, c.max
            )?;
        }
        Ok(())
    }
}

impl Dataset {
    /// Per column count, missing count, mean, standard deviation, min,
    /// quartiles and max.
    pub fn describe(&self) -> Result<Summary> {
        let q1 = column_quantiles(self.data(), 0.25)?;
        let median = column_quantiles(self.data(), 0.5)?;
        let q3 = column_quantiles(self.data(), 0.75)?;
        let summaries = self
            .columns()
            .iter()
            .enumerate()
            .map(|(j, name)| {
                let values: Array1<f64> = self
                    .data()
                    .column(j)
                    .iter()
                    .copied()
                    .filter(|v| !v.is_nan())
                    .collect();
                let count = values.len();
                let (mean, std) = match count {
                    0 => (f64::NAN, f64::NAN),
                    1 => (values[0], f64::NAN),
                    _ => (values.mean().unwrap_or(f64::NAN), values.std(1.)),
                };
                ColumnSummary {
                    name: name.clone(),
                    count,
                    missing: self.nrows() - count,
                    mean,
                    std,
                    min: *values.min_skipnan(),
                    q1: q1[j],
                    median: median[j],
                    q3: q3[j],
                    max: *values.max_skipnan(),
                }
            })
            .collect();
        Ok(Summary(summaries))
    }

    /// Pearson correlation matrix between columns, `(ncols, ncols)`.
    ///
    /// Expects a dataset without missing values (see [crate::preprocess]),
    /// a constant column yields `NaN` coefficients.
    pub fn correlation(&self) -> Result<Array2<f64>> {
        if self.has_missing() {
            return Err(DataError::InvalidValueError(
                "correlation requires a dataset without missing values".to_string(),
            ));
        }
        // variables as rows, observations as columns
        self.data()
            .t()
            .pearson_correlation()
            .map_err(|e| DataError::InvalidValueError(format!("correlation: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn sample() -> Dataset {
        Dataset::new(
            vec!["a".into(), "b".into(), "c".into()],
            array![[1., 2., 5.], [2., 4., f64::NAN], [3., 6., 5.], [4., 8., f64::NAN]],
        )
        .unwrap()
    }

    #[test]
    fn test_describe() {
        let summary = sample().describe().unwrap();
        let a = summary.get("a").unwrap();
        assert_eq!(a.count, 4);
        assert_eq!(a.missing, 0);
        assert_abs_diff_eq!(a.mean, 2.5);
        assert_abs_diff_eq!(a.std, (5. / 3.0f64).sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(a.min, 1.);
        assert_abs_diff_eq!(a.q1, 1.75);
        assert_abs_diff_eq!(a.median, 2.5);
        assert_abs_diff_eq!(a.max, 4.);
        let c = summary.get("c").unwrap();
        assert_eq!((c.count, c.missing), (2, 2));
        assert_abs_diff_eq!(c.std, 0.);
        assert!(summary.to_string().starts_with("column"));
    }

    #[test]
    fn test_correlation() {
        let ds = sample().drop_columns(&["c"]);
        let corr = ds.correlation().unwrap();
        assert_eq!(corr.dim(), (2, 2));
        assert_abs_diff_eq!(corr[[0, 1]], 1., epsilon = 1e-12);
        assert!(matches!(
            sample().correlation(),
            Err(DataError::InvalidValueError(_))
        ));
    }
}
