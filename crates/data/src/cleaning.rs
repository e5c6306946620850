use crate::dataset::Dataset;
use crate::errors::{DataError, Result};
use crate::schema::{canonical_name, TARGETS};
use log::debug;
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix2, Zip};
use ndarray_stats::interpolate::Linear;
use ndarray_stats::QuantileExt;
use noisy_float::types::n64;

/// Factor applied to the interquartile range to get the clipping bounds
pub const IQR_FACTOR: f64 = 1.5;

/// Rename legacy export labels to canonical names.
///
/// Unknown labels pass through, applying it to a canonical table is a no-op.
///
/// # Errors
///
/// * [DataError::SchemaError]: when two columns end up with the same name
pub fn rename_columns(dataset: Dataset) -> Result<Dataset> {
    dataset.rename(|label| canonical_name(label).to_string())
}

/// Column-wise `q` quantile over non missing values, linearly interpolated
/// between order statistics. `NaN` for a column without any value.
pub fn column_quantiles(
    data: &ArrayBase<impl Data<Elem = f64>, Ix2>,
    q: f64,
) -> Result<Array1<f64>> {
    let mut work = data.to_owned();
    Ok(work.quantile_axis_skipnan_mut(Axis(0), n64(q), &Linear)?)
}

/// Column-wise median over non missing values
pub fn column_medians(data: &ArrayBase<impl Data<Elem = f64>, Ix2>) -> Result<Array1<f64>> {
    column_quantiles(data, 0.5)
}

/// Lower and upper IQR bounds per column, `(NaN, NaN)` for an empty column
pub fn iqr_bounds(data: &Array2<f64>) -> Result<Array1<(f64, f64)>> {
    let q1 = column_quantiles(data, 0.25)?;
    let q3 = column_quantiles(data, 0.75)?;
    Ok(Zip::from(&q1).and(&q3).map_collect(|&q1, &q3| {
        let iqr = q3 - q1;
        (q1 - IQR_FACTOR * iqr, q3 + IQR_FACTOR * iqr)
    }))
}

/// Winsorize every column to `[Q1 - 1.5 IQR, Q3 + 1.5 IQR]`.
///
/// Values are clipped, not removed: row count is preserved and missing
/// cells stay missing. A constant column (IQR = 0) is clipped to its
/// single quartile value.
pub fn clip_outliers(mut dataset: Dataset) -> Result<Dataset> {
    if dataset.nrows() == 0 {
        return Ok(dataset);
    }
    let bounds = iqr_bounds(dataset.data())?;
    let columns = dataset.columns().to_vec();
    for (j, mut col) in dataset.data_mut().columns_mut().into_iter().enumerate() {
        let (lower, upper) = bounds[j];
        if lower.is_nan() || upper.is_nan() {
            continue;
        }
        let mut clipped = 0;
        col.mapv_inplace(|v| {
            if v < lower {
                clipped += 1;
                lower
            } else if v > upper {
                clipped += 1;
                upper
            } else {
                v
            }
        });
        if clipped > 0 {
            debug!("{}: {clipped} values clipped to [{lower}, {upper}]", columns[j]);
        }
    }
    Ok(dataset)
}

/// Replace missing cells by the median of their column.
///
/// # Errors
///
/// * [DataError::SchemaError]: when a column has no value at all to compute a median from
pub fn impute_missing(mut dataset: Dataset) -> Result<Dataset> {
    if dataset.nrows() == 0 || !dataset.has_missing() {
        return Ok(dataset);
    }
    let medians = column_medians(dataset.data())?;
    if let Some(j) = medians.iter().position(|m| m.is_nan()) {
        return Err(DataError::SchemaError(format!(
            "column '{}' has no value to impute from",
            dataset.columns()[j]
        )));
    }
    Zip::from(dataset.data_mut().columns_mut())
        .and(&medians)
        .for_each(|mut col, &median| {
            col.mapv_inplace(|v| if v.is_nan() { median } else { v })
        });
    Ok(dataset)
}

/// Outlier clipping followed by median imputation, then check that both
/// targets are present.
///
/// Clipping runs first so that extreme values do not drive the medians used
/// for imputation.
///
/// # Errors
///
/// * [DataError::SchemaError]: naming the first missing target column
pub fn preprocess(dataset: Dataset) -> Result<Dataset> {
    let dataset = impute_missing(clip_outliers(dataset)?)?;
    for target in TARGETS {
        dataset.require_column(target)?;
    }
    Ok(dataset)
}
