//! Loading and cleaning of pelletizer process data.
//!
//! Plant exports are `;` separated files with `,` as decimal separator whose
//! header carries legacy sensor labels. This library turns them into a
//! [Dataset] with canonical column names (see [Variable]) and prepares it for
//! model training:
//!
//! * outliers are clipped column-wise with the IQR rule
//!   (`[Q1 - 1.5 IQR, Q3 + 1.5 IQR]`, quartiles linearly interpolated),
//! * missing values are replaced by the column median computed after clipping,
//! * both quality targets `PDI` and `Finos` are required to be present.
//!
//! Row count, column set and column order are never changed by cleaning.
//!
//! # Example
//!
//! ```no_run
//! use pelletq_data::{load, preprocess};
//!
//! let raw = load("data/dados_peletizacao.csv").expect("plant export");
//! let clean = preprocess(raw).expect("cleaned data");
//! let (features, pdi, finos) = clean.split_targets().expect("targets");
//! println!("{}", clean.describe().expect("summary"));
//! ```
#![warn(missing_docs)]

mod cleaning;
mod dataset;
mod errors;
mod loader;
mod schema;
mod summary;

pub use cleaning::*;
pub use dataset::*;
pub use errors::*;
pub use loader::*;
pub use schema::*;
pub use summary::*;
