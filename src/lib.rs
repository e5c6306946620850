//! Pellet durability prediction and process monitoring.
//!
//! This crate ties together the workspace libraries:
//! * [pelletq_data]: loading and cleaning of plant data exports,
//! * [pelletq_model]: regression models of the pellet durability index (PDI),
//! * [pelletq_monitor]: live checks, predictions and recommendations,
//!
//! into two workflows driven by a [PelletConfig]:
//! * [TrainingWorkflow]: trains, saves the model and writes text reports,
//! * [MonitoringWorkflow]: analyzes live sensor readings with a saved model.
//!
//! The `pelletq` binary exposes them on the command line. Log verbosity is
//! controlled by the `PELLETQ_LOG` environment variable (default `info`).
//!
//! # Example
//!
//! ```no_run
//! use pelletq::{MonitoringWorkflow, PelletConfig, TrainingWorkflow};
//! use pelletq_model::ModelKind;
//! use pelletq_monitor::SensorReading;
//!
//! let config = PelletConfig::default()
//!     .data_path("data/Novo.csv")
//!     .model_kind(ModelKind::RandomForest);
//! let outcome = TrainingWorkflow::new(config.clone()).run().expect("training");
//! println!("{}", outcome.cv_score);
//!
//! let workflow = MonitoringWorkflow::from_config(&config).expect("saved model");
//! let reading = SensorReading::new()
//!     .with("Amperagem_Peletizadora", 645.)
//!     .with("Taxa_Compressao", 18.9)
//!     .with("Velocidade_Alimentador", 50.);
//! println!("{}", workflow.analyze(&reading).report);
//! ```
#![warn(missing_docs)]

mod config;
mod errors;
mod workflow;

pub use config::*;
pub use errors::*;
pub use workflow::*;

pub use pelletq_data;
pub use pelletq_model;
pub use pelletq_monitor;

/// Environment variable controlling the log level
pub const PELLETQ_LOG: &str = "PELLETQ_LOG";
