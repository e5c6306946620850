use crate::errors::{ModelError, Result};
use crate::grid::{grid_search, BoostingGrid, ForestGrid};
use crate::importance::FeatureImportance;
use crate::linear::{BayesianRidgeParams, BayesianRidgeValidParams};
use crate::pipeline::{Pipeline, PipelineParams};
use crate::regressor::RegressorParams;
use crate::validation::{cross_validate, CvScore, CvStrategy};
use linfa::traits::Predict;
use linfa::ParamGuard;
use log::{info, warn};
use ndarray::{Array2, ArrayBase, ArrayView1, ArrayView2, Data, Ix1, Ix2};
use pelletq_data::{is_target, Dataset};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Regression strategy
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Bayesian ridge regression, no hyperparameter search
    #[default]
    LinearBayesian,
    /// Random forest tuned by grid search
    RandomForest,
    /// Gradient boosting tuned by grid search
    GradientBoosting,
}

impl ModelKind {
    /// All model kinds
    pub const ALL: [ModelKind; 3] = [
        ModelKind::LinearBayesian,
        ModelKind::RandomForest,
        ModelKind::GradientBoosting,
    ];

    /// Name used in file names and on the command line
    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::LinearBayesian => "linear_bayesian",
            ModelKind::RandomForest => "random_forest",
            ModelKind::GradientBoosting => "gradient_boosting",
        }
    }

    /// File name of a saved model of this kind
    pub fn model_file_name(&self) -> String {
        format!("{}_model.bin", self.name())
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ModelKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "linear_bayesian" | "bayesian" => Ok(ModelKind::LinearBayesian),
            "random_forest" => Ok(ModelKind::RandomForest),
            "gradient_boosting" => Ok(ModelKind::GradientBoosting),
            _ => Err(ModelError::InvalidValueError(format!(
                "unknown model kind '{s}', expected one of linear_bayesian, random_forest, gradient_boosting"
            ))),
        }
    }
}

/// Trainer configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Number of folds of k-fold cross-validation
    pub(crate) n_folds: usize,
    /// Seed of fold shuffling and forest bootstrap
    pub(crate) seed: u64,
    /// Below this number of samples leave-one-out is used instead of k-fold
    pub(crate) loo_threshold: usize,
    /// Random forest search space
    pub(crate) forest_grid: ForestGrid,
    /// Gradient boosting search space
    pub(crate) boosting_grid: BoostingGrid,
    /// Bayesian ridge parameters
    pub(crate) bayesian: BayesianRidgeValidParams,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            n_folds: 5,
            seed: 42,
            loo_threshold: 30,
            forest_grid: ForestGrid::default(),
            boosting_grid: BoostingGrid::default(),
            bayesian: BayesianRidgeValidParams::default(),
        }
    }
}

impl TrainerConfig {
    /// Sets the number of folds
    pub fn n_folds(mut self, n_folds: usize) -> Self {
        self.n_folds = n_folds;
        self
    }

    /// Sets the seed
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the number of samples below which leave-one-out is used
    pub fn loo_threshold(mut self, loo_threshold: usize) -> Self {
        self.loo_threshold = loo_threshold;
        self
    }

    /// Sets the random forest search space
    pub fn forest_grid(mut self, grid: ForestGrid) -> Self {
        self.forest_grid = grid;
        self
    }

    /// Sets the gradient boosting search space
    pub fn boosting_grid(mut self, grid: BoostingGrid) -> Self {
        self.boosting_grid = grid;
        self
    }

    /// Sets the Bayesian ridge parameters
    pub fn bayesian(mut self, params: BayesianRidgeValidParams) -> Self {
        self.bayesian = params;
        self
    }

    /// Validation strategy for `n_samples` training samples
    pub fn strategy(&self, n_samples: usize) -> CvStrategy {
        CvStrategy::for_samples(n_samples, self.loo_threshold, self.n_folds, self.seed)
    }

    /// Check consistency of the configuration
    pub fn check(&self) -> Result<()> {
        if self.n_folds < 2 {
            return Err(ModelError::InvalidValueError(format!(
                "`n_folds` should be at least 2, got {}",
                self.n_folds
            )));
        }
        BayesianRidgeParams::from(self.bayesian.clone()).check_ref()?;
        Ok(())
    }
}

/// A trained pellet quality model: a PDI pipeline, an optional Finos
/// pipeline, and everything needed to use and explain them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    kind: ModelKind,
    features: Vec<String>,
    params: RegressorParams,
    cv_score: CvScore,
    pdi: Pipeline,
    finos: Option<Pipeline>,
    importance: Option<FeatureImportance>,
}

impl TrainedModel {
    /// Model kind
    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    /// Feature names in the order expected by [predict](Self::predict)
    pub fn features(&self) -> &[String] {
        &self.features
    }

    /// Selected regressor parameters
    pub fn params(&self) -> &RegressorParams {
        &self.params
    }

    /// Cross-validation summary of the selected configuration
    pub fn cv_score(&self) -> &CvScore {
        &self.cv_score
    }

    /// PDI pipeline
    pub fn pdi_pipeline(&self) -> &Pipeline {
        &self.pdi
    }

    /// Finos pipeline if trained
    pub fn finos_pipeline(&self) -> Option<&Pipeline> {
        self.finos.as_ref()
    }

    /// Whether predictions include Finos as a second output
    pub fn predicts_finos(&self) -> bool {
        self.finos.is_some()
    }

    /// Number of predicted outputs, 1 (PDI) or 2 (PDI, Finos)
    pub fn n_outputs(&self) -> usize {
        if self.predicts_finos() {
            2
        } else {
            1
        }
    }

    /// Feature ranking of the PDI regressor, if it provides one
    pub fn feature_importance(&self) -> Option<&FeatureImportance> {
        self.importance.as_ref()
    }

    /// Predict `(nrows, n_outputs)` values: PDI then Finos when available.
    /// Columns of `x` follow [features](Self::features).
    pub fn predict(&self, x: &ArrayBase<impl Data<Elem = f64>, Ix2>) -> Result<Array2<f64>> {
        if x.ncols() != self.features.len() {
            return Err(ModelError::InvalidValueError(format!(
                "expected {} features, got {}",
                self.features.len(),
                x.ncols()
            )));
        }
        let mut y = Array2::zeros((x.nrows(), self.n_outputs()));
        y.column_mut(0).assign(&self.pdi.predict(x));
        if let Some(finos) = &self.finos {
            y.column_mut(1).assign(&finos.predict(x));
        }
        Ok(y)
    }

    /// Path of the model file of the given kind in `dir`
    pub fn file_path<P: AsRef<Path>>(dir: P, kind: ModelKind) -> PathBuf {
        dir.as_ref().join(kind.model_file_name())
    }

    /// Save as `<dir>/<kind>_model.bin`, creating `dir` if needed
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<PathBuf> {
        fs::create_dir_all(dir.as_ref())?;
        let path = Self::file_path(dir, self.kind);
        let mut writer = BufWriter::new(File::create(&path)?);
        bincode::serialize_into(&mut writer, self)?;
        writer.flush()?;
        info!("Model saved in {}", path.display());
        Ok(path)
    }

    /// Load a model saved with [save](Self::save)
    pub fn load<P: AsRef<Path>>(path: P) -> Result<TrainedModel> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        let model: TrainedModel = bincode::deserialize_from(reader)?;
        info!(
            "{} model loaded from {}",
            model.kind,
            path.as_ref().display()
        );
        Ok(model)
    }
}

/// Trains pellet quality models, holds the last trained one
#[derive(Clone, Debug, Default)]
pub struct ModelTrainer {
    config: TrainerConfig,
    model: Option<TrainedModel>,
}

impl ModelTrainer {
    /// Constructor given a configuration
    pub fn new(config: TrainerConfig) -> ModelTrainer {
        ModelTrainer {
            config,
            model: None,
        }
    }

    /// Configuration
    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Last trained (or loaded) model
    pub fn model(&self) -> Option<&TrainedModel> {
        self.model.as_ref()
    }

    /// Feature ranking of the current model, `None` before training
    pub fn feature_importance(&self) -> Option<&FeatureImportance> {
        self.model.as_ref().and_then(|m| m.feature_importance())
    }

    /// Train a PDI model of the given kind on the features `x` and target `y`.
    ///
    /// Linear models are cross-validated, tree ensembles are tuned by grid
    /// search, the selected configuration is then refitted on all samples.
    ///
    /// # Errors
    ///
    /// * [ModelError::InvalidValueError]: fewer than 2 samples, `x`/`y` length
    ///   mismatch, missing values, or an invalid configuration
    pub fn train(
        &mut self,
        x: &Dataset,
        y: &ArrayBase<impl Data<Elem = f64>, Ix1>,
        kind: ModelKind,
    ) -> Result<&TrainedModel> {
        let (params, cv_score, pdi) = self.select_and_fit(x, y.view(), kind)?;
        Ok(self.store(kind, x, params, cv_score, pdi, None))
    }

    /// Train a PDI model as [train](Self::train), then a Finos model with
    /// the selected configuration. The resulting model predicts both.
    pub fn train_paired(
        &mut self,
        x: &Dataset,
        pdi: &ArrayBase<impl Data<Elem = f64>, Ix1>,
        finos: &ArrayBase<impl Data<Elem = f64>, Ix1>,
        kind: ModelKind,
    ) -> Result<&TrainedModel> {
        check_training_data(x, finos.view())?;
        let (params, cv_score, pdi_pipeline) = self.select_and_fit(x, pdi.view(), kind)?;
        let finos_pipeline = PipelineParams::new(params.clone()).train(x.data(), finos)?;
        info!("Finos model fitted with {params}");
        Ok(self.store(kind, x, params, cv_score, pdi_pipeline, Some(finos_pipeline)))
    }

    fn select_and_fit(
        &self,
        x: &Dataset,
        y: ArrayView1<f64>,
        kind: ModelKind,
    ) -> Result<(RegressorParams, CvScore, Pipeline)> {
        self.config.check()?;
        check_training_data(x, y)?;
        let xv: ArrayView2<f64> = x.view();
        let strategy = self.config.strategy(xv.nrows());
        info!(
            "Training {kind} on {} samples x {} features",
            xv.nrows(),
            xv.ncols()
        );
        let (params, cv_score) = match kind {
            ModelKind::LinearBayesian => {
                let params = RegressorParams::BayesianRidge(self.config.bayesian.clone());
                let score = cross_validate(&PipelineParams::new(params.clone()), &xv, &y, strategy)?;
                (params, score)
            }
            ModelKind::RandomForest => grid_search(
                &self.config.forest_grid.candidates(self.config.seed)?,
                &xv,
                &y,
                strategy,
            )?,
            ModelKind::GradientBoosting => grid_search(
                &self.config.boosting_grid.candidates()?,
                &xv,
                &y,
                strategy,
            )?,
        };
        info!("Performance CV: {cv_score}");
        let pipeline = PipelineParams::new(params.clone()).train(&xv, &y)?;
        Ok((params, cv_score, pipeline))
    }

    fn store(
        &mut self,
        kind: ModelKind,
        x: &Dataset,
        params: RegressorParams,
        cv_score: CvScore,
        pdi: Pipeline,
        finos: Option<Pipeline>,
    ) -> &TrainedModel {
        let importance = pdi
            .regressor()
            .native_importance()
            .map(|(score_kind, scores)| FeatureImportance::new(score_kind, x.columns(), scores));
        self.model.insert(TrainedModel {
            kind,
            features: x.columns().to_vec(),
            params,
            cv_score,
            pdi,
            finos,
            importance,
        })
    }

    /// Save the current model as `<dir>/<kind>_model.bin`
    ///
    /// # Errors
    ///
    /// * [ModelError::NotTrained]: when no model was trained or loaded
    pub fn save_model<P: AsRef<Path>>(&self, dir: P) -> Result<PathBuf> {
        self.model.as_ref().ok_or(ModelError::NotTrained)?.save(dir)
    }

    /// Replace the current model by the one saved at `path`
    pub fn load_model<P: AsRef<Path>>(&mut self, path: P) -> Result<&TrainedModel> {
        let model = TrainedModel::load(path)?;
        Ok(self.model.insert(model))
    }

    /// Importance weighted averages of features: for every ranked feature
    /// listed in `features` and present in `dataset` (targets excluded),
    /// the mean of `value * |score| / Σ|score|`.
    /// Empty before training.
    pub fn ideal_settings(&self, features: &[String], dataset: &Dataset) -> BTreeMap<String, f64> {
        let mut settings = BTreeMap::new();
        let Some(importance) = self.feature_importance() else {
            return settings;
        };
        let total = importance.total_weight();
        if total == 0. {
            warn!("Null feature importances, no ideal settings");
            return settings;
        }
        for (feature, score) in importance.ranking() {
            if is_target(feature) || !features.contains(feature) {
                continue;
            }
            let Some(column) = dataset.column(feature) else {
                continue;
            };
            let weight = score.abs() / total;
            let values: Vec<f64> = column.iter().filter(|v| !v.is_nan()).map(|v| v * weight).collect();
            if !values.is_empty() {
                settings.insert(feature.clone(), values.iter().sum::<f64>() / values.len() as f64);
            }
        }
        settings
    }
}

fn check_training_data(x: &Dataset, y: ArrayView1<f64>) -> Result<()> {
    if x.nrows() < 2 {
        return Err(ModelError::InvalidValueError(format!(
            "at least 2 samples are required to train, got {}",
            x.nrows()
        )));
    }
    if x.nrows() != y.len() {
        return Err(ModelError::InvalidValueError(format!(
            "{} feature rows for {} targets",
            x.nrows(),
            y.len()
        )));
    }
    if x.ncols() == 0 {
        return Err(ModelError::InvalidValueError(
            "no feature to train on".to_string(),
        ));
    }
    if x.has_missing() || y.iter().any(|v| v.is_nan()) {
        return Err(ModelError::InvalidValueError(
            "training data contains missing values, preprocess it first".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importance::ImportanceKind;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array1, Array2};

    const AMP: &str = "Amperagem_Peletizadora";
    const TC: &str = "Taxa_Compressao";
    const VEL: &str = "Velocidade_Alimentador";

    fn plant_data(n: usize) -> (Dataset, Array1<f64>, Array1<f64>) {
        let mut x = Array2::zeros((n, 3));
        for i in 0..n {
            x[[i, 0]] = 630. + ((i * 7) % 30) as f64;
            x[[i, 1]] = 18.8 + ((i * 3) % 10) as f64 * 0.02;
            x[[i, 2]] = 40. + ((i * 11) % 25) as f64;
        }
        let pdi = x.rows().into_iter().map(|r| {
            60. + 0.5 * (r[0] - 630.) + 50. * (r[1] - 18.8) - 0.2 * (r[2] - 40.)
        });
        let pdi = Array1::from_iter(pdi);
        let finos = pdi.mapv(|p| 30. - 0.25 * p);
        let ds = Dataset::new(vec![AMP.into(), TC.into(), VEL.into()], x).unwrap();
        (ds, pdi, finos)
    }

    fn small_config() -> TrainerConfig {
        TrainerConfig::default()
            .forest_grid(ForestGrid {
                n_trees: vec![5],
                max_depth: vec![None, Some(2)],
                min_samples_split: vec![2],
                min_samples_leaf: vec![1],
            })
            .boosting_grid(BoostingGrid {
                n_trees: vec![10],
                learning_rate: vec![0.1],
                max_depth: vec![3],
                min_samples_split: vec![2],
                min_samples_leaf: vec![1],
            })
    }

    #[test]
    fn test_model_kind_names() {
        for kind in ModelKind::ALL {
            assert_eq!(kind.name().parse::<ModelKind>().unwrap(), kind);
        }
        assert_eq!(
            "bayesian".parse::<ModelKind>().unwrap(),
            ModelKind::LinearBayesian
        );
        assert_eq!(
            ModelKind::RandomForest.model_file_name(),
            "random_forest_model.bin"
        );
        assert!("svm".parse::<ModelKind>().is_err());
    }

    #[test]
    fn test_train_linear_bayesian() {
        let (x, pdi, _) = plant_data(40);
        let mut trainer = ModelTrainer::new(small_config());
        assert!(trainer.feature_importance().is_none());
        let model = trainer.train(&x, &pdi, ModelKind::LinearBayesian).unwrap();
        assert_eq!(
            model.cv_score().strategy,
            CvStrategy::KFold { k: 5, seed: 42 }
        );
        assert!(model.cv_score().mean > 0.99);
        assert!(!model.predicts_finos());

        let importance = trainer.feature_importance().unwrap();
        assert_eq!(importance.kind(), ImportanceKind::Coefficient);
        assert_eq!(importance.ranking()[0].0, AMP);
        assert_eq!(importance.ranking()[2].0, VEL);
        assert!(importance.ranking()[2].1 < 0.);
    }

    #[test]
    fn test_small_sample_uses_leave_one_out() {
        let (x, pdi, _) = plant_data(12);
        let mut trainer = ModelTrainer::new(small_config());
        let model = trainer.train(&x, &pdi, ModelKind::LinearBayesian).unwrap();
        assert_eq!(model.cv_score().strategy, CvStrategy::LeaveOneOut);
        assert_eq!(model.cv_score().std, 0.);
    }

    #[test]
    fn test_bad_training_data() {
        let (x, pdi, _) = plant_data(12);
        let mut trainer = ModelTrainer::default();
        let (one, one_pdi, _) = plant_data(1);
        assert!(matches!(
            trainer.train(&one, &one_pdi, ModelKind::LinearBayesian),
            Err(ModelError::InvalidValueError(_))
        ));
        assert!(matches!(
            trainer.train(&x, &pdi.slice(ndarray::s![..5]), ModelKind::LinearBayesian),
            Err(ModelError::InvalidValueError(_))
        ));
        assert!(matches!(
            trainer.save_model("target/tests/never"),
            Err(ModelError::NotTrained)
        ));
    }

    #[test]
    fn test_train_paired_forest_save_load() {
        let test_dir = "target/tests/models";
        let (x, pdi, finos) = plant_data(40);
        let mut trainer = ModelTrainer::new(small_config());
        let model = trainer
            .train_paired(&x, &pdi, &finos, ModelKind::RandomForest)
            .unwrap()
            .clone();
        assert!(model.predicts_finos());
        let importance = model.feature_importance().unwrap();
        assert_eq!(importance.kind(), ImportanceKind::Impurity);
        assert_abs_diff_eq!(importance.total_weight(), 1., epsilon = 1e-9);

        let preds = model.predict(x.data()).unwrap();
        assert_eq!(preds.dim(), (40, 2));

        let path = trainer.save_model(test_dir).unwrap();
        assert!(path.ends_with("random_forest_model.bin"));
        let loaded = TrainedModel::load(&path).unwrap();
        assert_eq!(loaded, model);
        assert_eq!(loaded.predict(x.data()).unwrap(), preds);
        assert!(model.predict(&Array2::<f64>::zeros((1, 2))).is_err());
    }

    #[test]
    fn test_gradient_boosting_kind() {
        let (x, pdi, _) = plant_data(40);
        let mut trainer = ModelTrainer::new(small_config());
        let model = trainer.train(&x, &pdi, ModelKind::GradientBoosting).unwrap();
        assert!(matches!(model.params(), RegressorParams::GradientBoosting(_)));
        assert!(model.cv_score().mean > 0.);
    }

    #[test]
    fn test_ideal_settings() {
        let (x, pdi, _) = plant_data(40);
        let mut trainer = ModelTrainer::new(small_config());
        let features: Vec<String> = vec![AMP.into(), VEL.into(), "PDI".into()];
        assert!(trainer.ideal_settings(&features, &x).is_empty());

        trainer.train(&x, &pdi, ModelKind::LinearBayesian).unwrap();
        let settings = trainer.ideal_settings(&features, &x);
        assert_eq!(settings.keys().collect::<Vec<_>>(), vec![AMP, VEL]);
        let importance = trainer.feature_importance().unwrap();
        let weight = importance.score(AMP).unwrap().abs() / importance.total_weight();
        let expected = x.column(AMP).unwrap().mean().unwrap() * weight;
        assert_abs_diff_eq!(settings[AMP], expected, epsilon = 1e-9);
    }
}
