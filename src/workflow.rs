use crate::config::PelletConfig;
use crate::errors::{PelletError, Result};
use log::info;
use pelletq_data::{DataProcessor, Dataset, FINOS};
use pelletq_model::{CvScore, FeatureImportance, ModelTrainer, TrainedModel};
use pelletq_monitor::{
    find_ideal_settings, generate_recommendations, save_ideal_settings, save_recommendations,
    MonitoringReport, PdiMonitor, ScenarioThresholds, SensorReading,
};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Number of ranked features logged after training
const TOP_FEATURES: usize = 5;

/// Load and clean the configured plant data
///
/// # Errors
///
/// * [PelletError::LoadFailed]: when the file cannot be loaded, details are logged
pub fn load_clean_data(config: &PelletConfig) -> Result<Dataset> {
    let mut processor = DataProcessor::new(&config.paths.data_path);
    if !processor.load_data() {
        return Err(PelletError::LoadFailed(config.paths.data_path.clone()));
    }
    Ok(processor.preprocess_data()?.clone())
}

/// Artifacts of a training run
#[derive(Clone, Debug)]
pub struct TrainingOutcome {
    /// Saved model file
    pub model_path: PathBuf,
    /// Cross-validation summary of the selected configuration
    pub cv_score: CvScore,
    /// Feature ranking of the PDI model
    pub importance: Option<FeatureImportance>,
    /// Importance based recommendations
    pub recommendations: Vec<String>,
    /// Recommendations report
    pub recommendations_path: PathBuf,
    /// Medians of the process variables over good batches
    pub ideal_settings: BTreeMap<String, f64>,
    /// Ideal settings report, `None` when no batch qualifies
    pub ideal_settings_path: Option<PathBuf>,
}

/// Batch training: load, clean, train, save the model and write reports
#[derive(Clone, Debug)]
pub struct TrainingWorkflow {
    config: PelletConfig,
}

impl TrainingWorkflow {
    /// Constructor
    pub fn new(config: PelletConfig) -> Self {
        TrainingWorkflow { config }
    }

    /// Configuration
    pub fn config(&self) -> &PelletConfig {
        &self.config
    }

    /// Run the whole training workflow.
    ///
    /// The model is trained on PDI and Finos with the same selected
    /// configuration so that monitoring can predict both.
    pub fn run(&self) -> Result<TrainingOutcome> {
        self.config.check()?;
        let data = load_clean_data(&self.config)?;
        let (x, pdi, finos) = data.split_targets()?;

        let kind = self.config.model_kind;
        let mut trainer = ModelTrainer::new(self.config.trainer.clone());
        let model = trainer.train_paired(&x, &pdi, &finos, kind)?;
        let model_path = model.save(&self.config.paths.model_dir)?;
        let cv_score = *model.cv_score();
        let importance = model.feature_importance().cloned();

        let recommendations = match &importance {
            Some(importance) => {
                info!("Top features:");
                for (feature, score) in importance.top(TOP_FEATURES) {
                    info!("  {feature}: {score:.4}");
                }
                generate_recommendations(importance, self.config.importance_threshold)
            }
            None => Vec::new(),
        };
        let report_dir = &self.config.paths.report_dir;
        let recommendations_path = save_recommendations(report_dir, kind.name(), &recommendations)?;

        let ideal_settings = find_ideal_settings(&data, &self.config.ideal)?;
        let ideal_settings_path = save_ideal_settings(report_dir, kind.name(), &ideal_settings)?;

        Ok(TrainingOutcome {
            model_path,
            cv_score,
            importance,
            recommendations,
            recommendations_path,
            ideal_settings,
            ideal_settings_path,
        })
    }
}

/// Result of the analysis of one live reading
#[derive(Clone, Debug, PartialEq)]
pub struct MonitoringOutcome {
    /// Monitoring report
    pub report: MonitoringReport,
    /// Whether the process meets the ideal scenario thresholds
    pub ideal_scenario: bool,
}

/// Live monitoring with a saved model
#[derive(Clone, Debug)]
pub struct MonitoringWorkflow {
    monitor: PdiMonitor,
    scenario: ScenarioThresholds,
}

impl MonitoringWorkflow {
    /// Constructor
    pub fn new(monitor: PdiMonitor, scenario: ScenarioThresholds) -> Self {
        MonitoringWorkflow { monitor, scenario }
    }

    /// Monitoring with the model of the configured kind saved in the model directory
    pub fn from_config(config: &PelletConfig) -> Result<Self> {
        config.check()?;
        let path = TrainedModel::file_path(&config.paths.model_dir, config.model_kind);
        info!("Loading model from {}", path.display());
        let monitor = PdiMonitor::from_file(path, config.limits.clone(), config.rules.clone())?;
        Ok(MonitoringWorkflow::new(monitor, config.scenario.clone()))
    }

    /// Underlying monitor
    pub fn monitor(&self) -> &PdiMonitor {
        &self.monitor
    }

    /// Full analysis of `reading` plus the ideal scenario check. Finos is
    /// taken from the prediction, or from the reading when not predicted.
    pub fn analyze(&self, reading: &SensorReading) -> MonitoringOutcome {
        let report = self.monitor.full_analysis(reading);
        let finos = report.predicted_finos.or_else(|| reading.get(FINOS));
        let ideal_scenario = self.scenario.is_ideal(report.predicted_pdi, finos);
        if ideal_scenario {
            info!("Process in the ideal scenario");
        }
        MonitoringOutcome {
            report,
            ideal_scenario,
        }
    }
}
