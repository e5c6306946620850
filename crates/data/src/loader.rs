//! Reading of plant data exports.
//!
//! Exports are `;` separated, use `,` as decimal separator and carry the
//! legacy column labels in their header. The loader translates the labels to
//! the canonical names right away so that nothing downstream sees them.
use crate::cleaning::{preprocess, rename_columns};
use crate::dataset::Dataset;
use crate::errors::{DataError, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use log::{error, info};
use ndarray::Array2;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Field separator of the plant exports
pub const FIELD_SEPARATOR: u8 = b';';

const UTF8_BOM: char = '\u{feff}';

/// Load a plant export file and rename its columns to canonical names
///
/// # Errors
///
/// * [DataError::LoadError]: missing or unreadable file, wrong field count, non UTF-8 content,
///   a cell which is not a number (the message names its line and column)
/// * [DataError::SchemaError]: two columns mapped to the same name
pub fn load<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| DataError::LoadError(format!("cannot open {}: {e}", path.display())))?;
    let dataset = load_from_reader(file)?;
    info!(
        "Loaded {} rows x {} columns from {}",
        dataset.nrows(),
        dataset.ncols(),
        path.display()
    );
    Ok(dataset)
}

/// Load plant data from any reader, see [load]
pub fn load_from_reader<R: Read>(reader: R) -> Result<Dataset> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(FIELD_SEPARATOR)
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(to_load_error)?
        .iter()
        .map(|h| h.trim_start_matches(UTF8_BOM).to_string())
        .collect();
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(DataError::LoadError("empty header".to_string()));
    }

    let ncols = headers.len();
    let mut values = Vec::new();
    let mut nrows = 0;
    let mut record = StringRecord::new();
    while rdr.read_record(&mut record).map_err(to_load_error)? {
        // header is line 1
        let line = nrows + 2;
        for (cell, label) in record.iter().zip(headers.iter()) {
            values.push(parse_cell(cell).ok_or_else(|| {
                DataError::LoadError(format!(
                    "line {line}, column '{label}': cannot read '{cell}' as a number"
                ))
            })?);
        }
        nrows += 1;
    }

    let data = Array2::from_shape_vec((nrows, ncols), values)
        .map_err(|e| DataError::LoadError(e.to_string()))?;
    let dataset = Dataset::new(headers, data)?;
    rename_columns(dataset)
}

/// Parse a cell written with a comma (or dot) decimal separator.
/// Empty and `NaN`/`NA` cells are missing values.
pub fn parse_cell(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() || cell.eq_ignore_ascii_case("nan") || cell.eq_ignore_ascii_case("na") {
        return Some(f64::NAN);
    }
    cell.replace(',', ".").parse::<f64>().ok()
}

fn to_load_error(err: csv::Error) -> DataError {
    DataError::LoadError(err.to_string())
}

/// Batch entry point holding the dataset between loading and preprocessing.
///
/// A failed load is an expected outcome (bad sensor export) : it is logged and
/// reported as `false` so that the caller may retry with a corrected file.
#[derive(Debug, Clone)]
pub struct DataProcessor {
    filepath: PathBuf,
    dataset: Option<Dataset>,
}

impl DataProcessor {
    /// Constructor given the export file to read
    pub fn new<P: AsRef<Path>>(filepath: P) -> Self {
        DataProcessor {
            filepath: filepath.as_ref().to_path_buf(),
            dataset: None,
        }
    }

    /// Source file
    pub fn filepath(&self) -> &Path {
        &self.filepath
    }

    /// Load and rename, returns whether data is available
    pub fn load_data(&mut self) -> bool {
        match load(&self.filepath) {
            Ok(dataset) => {
                info!("Data loaded from {}", self.filepath.display());
                self.dataset = Some(dataset);
                true
            }
            Err(err) => {
                error!("Error loading data: {err}");
                false
            }
        }
    }

    /// Clip outliers, impute missing values and check targets
    ///
    /// # Errors
    ///
    /// * [DataError::InvalidValueError]: when called before a successful [load_data](Self::load_data)
    /// * [DataError::SchemaError]: when a target column is missing
    pub fn preprocess_data(&mut self) -> Result<&Dataset> {
        let dataset = self.dataset.take().ok_or_else(|| {
            DataError::InvalidValueError("data not loaded, call load_data() first".to_string())
        })?;
        let processed = preprocess(dataset)?;
        info!("Preprocessing done");
        Ok(self.dataset.insert(processed))
    }

    /// Current dataset, either as loaded or as preprocessed
    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    /// Copy of the current dataset
    pub fn processed_data(&self) -> Option<Dataset> {
        self.dataset.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const EXPORT: &str = "\
Porc Pdi Tyl6;Tx Compressao Matriz;Amperagem Peletizadora;Porc Finos Tyl6
81,5;18,9;640;9,2
79,0;18,75;;11
";

    #[test]
    fn test_load_renames_and_parses_decimal_comma() {
        let ds = load_from_reader(EXPORT.as_bytes()).unwrap();
        assert_eq!(
            ds.columns(),
            &["PDI", "Taxa_Compressao", "Amperagem_Peletizadora", "Finos"]
        );
        assert_eq!(ds.nrows(), 2);
        assert_abs_diff_eq!(ds.data()[[0, 0]], 81.5);
        assert_abs_diff_eq!(ds.data()[[1, 1]], 18.75);
        assert!(ds.data()[[1, 2]].is_nan());
    }

    #[test]
    fn test_malformed_row() {
        let bad = "Porc Pdi Tyl6;Porc Finos Tyl6\n80;9\n81\n";
        assert!(matches!(
            load_from_reader(bad.as_bytes()),
            Err(DataError::LoadError(_))
        ));
        let bad = "Porc Pdi Tyl6;Porc Finos Tyl6\n80;9\n81;abc\n";
        match load_from_reader(bad.as_bytes()) {
            Err(DataError::LoadError(msg)) => assert_eq!(
                msg,
                "line 3, column 'Porc Finos Tyl6': cannot read 'abc' as a number"
            ),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_invalid_encoding() {
        let bytes: &[u8] = b"Porc Pdi Tyl6;Porc Finos Tyl6\n80;\xff\xfe\n";
        assert!(matches!(
            load_from_reader(bytes),
            Err(DataError::LoadError(_))
        ));
    }

    #[test]
    fn test_processor_reports_missing_file() {
        let mut processor = DataProcessor::new("target/does/not/exist.csv");
        assert!(!processor.load_data());
        assert!(processor.dataset().is_none());
        assert!(matches!(
            processor.preprocess_data(),
            Err(DataError::InvalidValueError(_))
        ));
    }
}
