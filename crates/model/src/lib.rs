//! Regression models of pellet quality.
//!
//! A model is a two stage [Pipeline]: features are scaled with a
//! [RobustScaler] (median and interquartile range) then fed to a regressor
//! which is either
//! * linear: [BayesianRidge], whose coefficients rank the features,
//! * a tree ensemble: [RandomForest] or [GradientBoosting], ranking features
//!   by impurity decrease.
//!
//! Regressors follow the [linfa](https://github.com/rust-ml/linfa) conventions:
//! parameters are checked with `ParamGuard`, fitted with `Fit` and used with
//! `Predict`.
//!
//! The [ModelTrainer] selects the configuration by cross-validation
//! (leave-one-out for small datasets, shuffled k-fold otherwise, see
//! [CvStrategy]) with an exhaustive grid search for tree ensembles, refits it
//! on all samples and keeps the resulting [TrainedModel], which can be saved
//! to and reloaded from a binary file.
//!
//! # Example
//!
//! ```no_run
//! use pelletq_data::{load, preprocess};
//! use pelletq_model::{ModelKind, ModelTrainer, TrainerConfig};
//!
//! let data = preprocess(load("data/dados_peletizacao.csv").expect("data")).expect("clean");
//! let (x, pdi, _finos) = data.split_targets().expect("targets");
//!
//! let mut trainer = ModelTrainer::new(TrainerConfig::default());
//! let model = trainer.train(&x, &pdi, ModelKind::RandomForest).expect("trained");
//! if let Some(importance) = model.feature_importance() {
//!     println!("{importance}");
//! }
//! trainer.save_model("output/models").expect("saved");
//! ```
#![warn(missing_docs)]

mod boosting;
mod errors;
mod forest;
mod grid;
mod importance;
mod linear;
mod pipeline;
mod regressor;
mod scaler;
mod trainer;
mod tree;
mod validation;

pub use boosting::*;
pub use errors::*;
pub use forest::{RandomForest, RandomForestParams, RandomForestValidParams};
pub use grid::*;
pub use importance::*;
pub use linear::*;
pub use pipeline::*;
pub use regressor::*;
pub use scaler::*;
pub use trainer::*;
pub use tree::*;
pub use validation::*;
