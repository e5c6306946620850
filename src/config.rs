use crate::errors::{PelletError, Result};
use pelletq_model::{ModelKind, TrainerConfig};
use pelletq_monitor::{
    ControlLimits, IdealThresholds, RecommendationRules, ScenarioThresholds, IMPORTANCE_THRESHOLD,
};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Input and output locations
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Plant data export
    pub data_path: PathBuf,
    /// Directory of saved models
    pub model_dir: PathBuf,
    /// Directory of text reports
    pub report_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        PathsConfig {
            data_path: PathBuf::from("data/Novo.csv"),
            model_dir: PathBuf::from("output/models"),
            report_dir: PathBuf::from("output/reports"),
        }
    }
}

/// Configuration of the training and monitoring workflows.
///
/// Every field has a default so that a JSON file only needs to list what
/// differs, for instance `{"model_kind": "random_forest", "trainer": {"n_folds": 10}}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PelletConfig {
    /// Input and output locations
    pub paths: PathsConfig,
    /// Kind of model to train or monitor with
    pub model_kind: ModelKind,
    /// Trainer configuration
    pub trainer: TrainerConfig,
    /// Control limits of live readings
    pub limits: ControlLimits,
    /// Recommendation thresholds
    pub rules: RecommendationRules,
    /// Quality of the batches used for ideal settings
    pub ideal: IdealThresholds,
    /// Quality of the ideal scenario
    pub scenario: ScenarioThresholds,
    /// Minimum feature score worth a recommendation
    pub importance_threshold: f64,
}

impl Default for PelletConfig {
    fn default() -> Self {
        PelletConfig {
            paths: PathsConfig::default(),
            model_kind: ModelKind::default(),
            trainer: TrainerConfig::default(),
            limits: ControlLimits::default(),
            rules: RecommendationRules::default(),
            ideal: IdealThresholds::default(),
            scenario: ScenarioThresholds::default(),
            importance_threshold: IMPORTANCE_THRESHOLD,
        }
    }
}

impl PelletConfig {
    /// Read a JSON configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<PelletConfig> {
        let file = File::open(path.as_ref())?;
        let config: PelletConfig = serde_json::from_reader(BufReader::new(file))?;
        config.check()?;
        Ok(config)
    }

    /// Check consistency of the configuration
    pub fn check(&self) -> Result<()> {
        self.trainer.check()?;
        if self.importance_threshold.is_nan() || self.importance_threshold < 0. {
            return Err(PelletError::ConfigError(format!(
                "`importance_threshold` should be positive, got {}",
                self.importance_threshold
            )));
        }
        if self.rules.low_pdi > self.rules.high_pdi {
            return Err(PelletError::ConfigError(format!(
                "low PDI threshold ({}) above high PDI threshold ({})",
                self.rules.low_pdi, self.rules.high_pdi
            )));
        }
        if let Some(limit) = self.limits.iter().find(|l| l.lower > l.upper) {
            return Err(PelletError::ConfigError(format!(
                "empty control range for {}: [{}, {}]",
                limit.variable, limit.lower, limit.upper
            )));
        }
        Ok(())
    }

    /// Sets the paths
    pub fn paths(mut self, paths: PathsConfig) -> Self {
        self.paths = paths;
        self
    }

    /// Sets the plant data file
    pub fn data_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.paths.data_path = path.as_ref().to_path_buf();
        self
    }

    /// Sets the model directory
    pub fn model_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.paths.model_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Sets the report directory
    pub fn report_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.paths.report_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Sets the kind of model to train or monitor with
    pub fn model_kind(mut self, kind: ModelKind) -> Self {
        self.model_kind = kind;
        self
    }

    /// Sets the trainer configuration
    pub fn trainer(mut self, trainer: TrainerConfig) -> Self {
        self.trainer = trainer;
        self
    }

    /// Sets the control limits
    pub fn limits(mut self, limits: ControlLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Sets the recommendation thresholds
    pub fn rules(mut self, rules: RecommendationRules) -> Self {
        self.rules = rules;
        self
    }

    /// Sets the quality of batches used for ideal settings
    pub fn ideal(mut self, ideal: IdealThresholds) -> Self {
        self.ideal = ideal;
        self
    }

    /// Sets the quality of the ideal scenario
    pub fn scenario(mut self, scenario: ScenarioThresholds) -> Self {
        self.scenario = scenario;
        self
    }

    /// Sets the minimum feature score worth a recommendation
    pub fn importance_threshold(mut self, threshold: f64) -> Self {
        self.importance_threshold = threshold;
        self
    }
}
