pub mod app;
pub mod artifacts;
pub mod backend;
pub mod benchmarks;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod evaluation;
pub mod logging;
pub mod loss;
pub mod model;
pub mod optim;
pub mod training;
pub mod utils;

pub use error::{Error, Result};

pub mod prelude {
    pub use crate::app::launch;
    pub use crate::backend::{MainAutoBackend, MainBackend, MainDevice};
    pub use crate::cli::AppArgs;
    pub use crate::config::{DataDetails, ExperimentConfig, TrainingConfig};
    pub use crate::data::LabelledDataSet;
    pub use crate::evaluation::{EvalReport, evaluate};
    pub use crate::model::{Network, NetworkConfig};
    pub use crate::training::{EpochSummary, train};
}
