use crate::errors::{DataError, Result};
use crate::schema::{FINOS, PDI, TARGETS};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use std::collections::HashSet;

/// A table of historical observations: uniquely named columns over a dense
/// `(nrows, ncols)` matrix. Missing cells are stored as `NaN`.
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    data: Array2<f64>,
}

impl Dataset {
    /// Constructor checking that `columns` match the data width and are unique
    ///
    /// # Errors
    ///
    /// * [DataError::SchemaError] on duplicated column names
    /// * [DataError::InvalidValueError] when columns and data width differ
    pub fn new(columns: Vec<String>, data: Array2<f64>) -> Result<Dataset> {
        if columns.len() != data.ncols() {
            return Err(DataError::InvalidValueError(format!(
                "{} column names given for {} data columns",
                columns.len(),
                data.ncols()
            )));
        }
        check_unique(&columns)?;
        Ok(Dataset { columns, data })
    }

    /// Column names in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Raw data matrix
    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    /// Mutable access to the data, column set stays fixed
    pub(crate) fn data_mut(&mut self) -> &mut Array2<f64> {
        &mut self.data
    }

    /// Number of observations
    pub fn nrows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of columns
    pub fn ncols(&self) -> usize {
        self.data.ncols()
    }

    /// Position of the named column
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Whether the named column exists
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// View on the named column
    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        self.column_index(name).map(|j| self.data.column(j))
    }

    /// View on the named column or a [DataError::SchemaError] naming it
    pub fn require_column(&self, name: &str) -> Result<ArrayView1<'_, f64>> {
        self.column(name)
            .ok_or_else(|| DataError::SchemaError(format!("required column '{name}' not found")))
    }

    /// View on the whole table
    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    /// Number of missing cells per column
    pub fn missing_counts(&self) -> Array1<usize> {
        self.data
            .map_axis(Axis(0), |col| col.iter().filter(|v| v.is_nan()).count())
    }

    /// Whether any cell is missing
    pub fn has_missing(&self) -> bool {
        self.data.iter().any(|v| v.is_nan())
    }

    /// Copy without the named columns, unknown names are ignored
    pub fn drop_columns(&self, names: &[&str]) -> Dataset {
        let kept: Vec<usize> = (0..self.ncols())
            .filter(|&j| !names.contains(&self.columns[j].as_str()))
            .collect();
        Dataset {
            columns: kept.iter().map(|&j| self.columns[j].clone()).collect(),
            data: self.data.select(Axis(1), &kept),
        }
    }

    /// Copy restricted to the named columns in the given order
    pub fn select_columns(&self, names: &[&str]) -> Result<Dataset> {
        let indices = names
            .iter()
            .map(|name| {
                self.column_index(name).ok_or_else(|| {
                    DataError::SchemaError(format!("required column '{name}' not found"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Dataset::new(
            names.iter().map(|s| s.to_string()).collect(),
            self.data.select(Axis(1), &indices),
        )
    }

    /// Copy restricted to the rows for which `keep` returns true
    pub fn filter_rows<P>(&self, keep: P) -> Dataset
    where
        P: Fn(ArrayView1<f64>) -> bool,
    {
        let rows: Vec<usize> = self
            .data
            .rows()
            .into_iter()
            .enumerate()
            .filter(|(_, row)| keep(row.view()))
            .map(|(i, _)| i)
            .collect();
        Dataset {
            columns: self.columns.clone(),
            data: self.data.select(Axis(0), &rows),
        }
    }

    /// Owned copy of the named column
    pub fn target(&self, name: &str) -> Result<Array1<f64>> {
        Ok(self.require_column(name)?.to_owned())
    }

    /// Split into model inputs (every non target column) and the two targets
    /// `(features, pdi, finos)`.
    pub fn split_targets(&self) -> Result<(Dataset, Array1<f64>, Array1<f64>)> {
        let pdi = self.target(PDI)?;
        let finos = self.target(FINOS)?;
        Ok((self.drop_columns(&TARGETS), pdi, finos))
    }

    /// Rename columns in place, checking uniqueness of the result
    pub(crate) fn rename<F>(self, rename: F) -> Result<Dataset>
    where
        F: Fn(&str) -> String,
    {
        let columns: Vec<String> = self.columns.iter().map(|c| rename(c.as_str())).collect();
        check_unique(&columns)?;
        Ok(Dataset {
            columns,
            data: self.data,
        })
    }
}

fn check_unique(columns: &[String]) -> Result<()> {
    let mut seen = HashSet::new();
    for c in columns {
        if !seen.insert(c.as_str()) {
            return Err(DataError::SchemaError(format!(
                "column '{c}' appears more than once"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sample() -> Dataset {
        Dataset::new(
            vec!["PDI".into(), "Taxa_Compressao".into(), "Finos".into()],
            array![[80., 18.9, 9.], [84., 18.8, 12.], [79., f64::NAN, 8.]],
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_duplicates() {
        let res = Dataset::new(vec!["a".into(), "a".into()], Array2::zeros((1, 2)));
        assert!(matches!(res, Err(DataError::SchemaError(_))));
        let res = Dataset::new(vec!["a".into()], Array2::zeros((1, 2)));
        assert!(matches!(res, Err(DataError::InvalidValueError(_))));
    }

    #[test]
    fn test_split_targets() {
        let (x, pdi, finos) = sample().split_targets().unwrap();
        assert_eq!(x.columns(), &["Taxa_Compressao".to_string()]);
        assert_eq!(pdi, array![80., 84., 79.]);
        assert_eq!(finos, array![9., 12., 8.]);
    }

    #[test]
    fn test_filter_and_missing() {
        let ds = sample();
        assert_eq!(ds.missing_counts(), array![0, 1, 0]);
        let good = ds.filter_rows(|row| row[0] >= 80.);
        assert_eq!(good.nrows(), 2);
        assert!(!good.has_missing());
        assert!(matches!(
            ds.select_columns(&["Pressao_Vapor"]),
            Err(DataError::SchemaError(_))
        ));
    }
}
