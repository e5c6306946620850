//! Live monitoring of a pelletizer with a trained quality model.
//!
//! A [PdiMonitor] checks a [SensorReading] against [ControlLimits], predicts
//! the pellet durability index (and fines when the model was trained for
//! both) and derives operating recommendations from [RecommendationRules].
//! Everything is gathered in a [MonitoringReport].
//!
//! The crate also derives ideal settings from historical batches of good
//! quality ([find_ideal_settings]) and writes the text reports of a training
//! run ([save_recommendations], [save_ideal_settings]).
//!
//! # Example
//!
//! ```no_run
//! use pelletq_monitor::{ControlLimits, PdiMonitor, RecommendationRules, SensorReading};
//!
//! let monitor = PdiMonitor::from_file(
//!     "output/models/random_forest_model.bin",
//!     ControlLimits::default(),
//!     RecommendationRules::default(),
//! )
//! .expect("model");
//!
//! let reading = SensorReading::new()
//!     .with("Amperagem_Peletizadora", 630.)
//!     .with("Taxa_Compressao", 18.75)
//!     .with("Velocidade_Alimentador", 76.);
//! println!("{}", monitor.full_analysis(&reading));
//! ```
#![warn(missing_docs)]

mod errors;
mod ideal;
mod limits;
mod monitor;
mod reading;
mod report;
mod reports;

pub use errors::*;
pub use ideal::*;
pub use limits::*;
pub use monitor::*;
pub use reading::*;
pub use report::*;
pub use reports::*;
