use crate::errors::Result;
use log::info;
use pelletq_data::{column_medians, is_target, DataError, Dataset, FINOS, PDI};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Quality of the historical batches used to derive ideal settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdealThresholds {
    /// Minimum PDI of a good batch
    pub pdi_min: f64,
    /// Maximum Finos of a good batch
    pub finos_max: f64,
}

impl Default for IdealThresholds {
    fn default() -> Self {
        IdealThresholds {
            pdi_min: 82.,
            finos_max: 10.,
        }
    }
}

/// Quality the live process has to reach to be in the ideal scenario
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioThresholds {
    /// Minimum predicted PDI
    pub pdi_min: f64,
    /// Maximum Finos, predicted or measured
    pub finos_max: f64,
}

impl Default for ScenarioThresholds {
    fn default() -> Self {
        ScenarioThresholds {
            pdi_min: 82.,
            finos_max: 10.,
        }
    }
}

impl ScenarioThresholds {
    /// Whether the process is in the ideal scenario. An unknown PDI never
    /// is, an unknown Finos is not checked.
    pub fn is_ideal(&self, pdi: Option<f64>, finos: Option<f64>) -> bool {
        match pdi {
            Some(pdi) if pdi >= self.pdi_min => finos.map_or(true, |f| f <= self.finos_max),
            _ => false,
        }
    }
}

/// Median of every non target column over the batches with
/// `PDI >= pdi_min` and `Finos <= finos_max`.
///
/// No qualifying batch is not an error: the map is then empty.
///
/// # Errors
///
/// * [DataError::SchemaError]: when PDI or Finos is missing
pub fn find_ideal_settings(
    dataset: &Dataset,
    thresholds: &IdealThresholds,
) -> Result<BTreeMap<String, f64>> {
    let index = |name: &str| {
        dataset.column_index(name).ok_or_else(|| {
            DataError::SchemaError(format!("required column '{name}' not found"))
        })
    };
    let (pdi, finos) = (index(PDI)?, index(FINOS)?);
    let good = dataset.filter_rows(|row| {
        row[pdi] >= thresholds.pdi_min && row[finos] <= thresholds.finos_max
    });
    if good.nrows() == 0 {
        info!(
            "No batch with PDI >= {} and Finos <= {}, not enough data for ideal settings",
            thresholds.pdi_min, thresholds.finos_max
        );
        return Ok(BTreeMap::new());
    }
    info!(
        "Ideal settings from {} of {} batches",
        good.nrows(),
        dataset.nrows()
    );
    let medians = column_medians(good.data())?;
    Ok(good
        .columns()
        .iter()
        .zip(medians.iter())
        .filter(|(name, median)| !is_target(name) && !median.is_nan())
        .map(|(name, &median)| (name.clone(), median))
        .collect())
}
