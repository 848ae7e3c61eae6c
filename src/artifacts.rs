//! The artifacts directory: the experiment config, the model weights and the optimizer state.

use crate::backend::{MainBackend, RecorderTy};
use crate::config::ExperimentConfig;
use crate::error::{Error, Result};
use crate::model::Network;
use crate::optim::OptimConfigExt;
use burn::module::AutodiffModule;
use burn::optim::Optimizer;
use burn::prelude::*;
use burn::record::{FileRecorder, Recorder};
use burn::tensor::backend::AutodiffBackend;
use std::path::{Path, PathBuf};

pub const EXPERIMENT_CONFIG_NAME: &str = "experiment_config";
pub const MODEL_NAME: &str = "model";
pub const OPTIM_NAME: &str = "optim";

#[derive(Debug, Clone)]
pub struct Artifacts {
    dir: PathBuf,
}

impl Artifacts {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Creates a fresh directory with a unique name under the system temp directory.
    pub fn temporary(prefix: &str) -> Result<Self> {
        let tmp = temp_dir::TempDir::with_prefix(prefix)
            .map_err(|e| Error::Artifacts(format!("failed to create a temporary directory: {e}")))?
            .dont_delete_on_drop();
        Ok(Self::new(tmp.path()))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates the directory, optionally removing a previous model and optimizer first.
    pub fn create(&self, remove_previous: bool) -> Result<()> {
        if remove_previous {
            tracing::info!("Removing {:?}/{{{MODEL_NAME},{OPTIM_NAME}}}", self.dir);
            for name in [MODEL_NAME, OPTIM_NAME] {
                let path = self.record_path(name);
                match std::fs::remove_file(&path) {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => return Err(Error::io(path, e)),
                }
            }
        }
        std::fs::create_dir_all(&self.dir).map_err(|e| Error::io(&self.dir, e))
    }

    pub fn experiment_path(&self) -> PathBuf {
        self.dir.join(EXPERIMENT_CONFIG_NAME).with_extension("json")
    }

    pub fn save_experiment(&self, experiment: &ExperimentConfig) -> Result<()> {
        let path = self.experiment_path();
        tracing::info!("Saving experiment config into {path:?}");
        experiment.save_json(&path)
    }

    pub fn load_experiment(&self) -> Result<Option<ExperimentConfig>> {
        let path = self.experiment_path();
        if !path.exists() {
            return Ok(None);
        }
        tracing::info!("Loading experiment config from {path:?}");
        ExperimentConfig::load_json(&path).map(Some)
    }

    /// The record path for `name`, with the recorder's extension.
    fn record_path(&self, name: &str) -> PathBuf {
        let file_ext = <RecorderTy as FileRecorder<MainBackend>>::file_extension();
        self.dir.join(name).with_extension(file_ext)
    }

    pub fn save_model<B: Backend>(&self, model: &Network<B>) -> Result<()> {
        let path = self.record_path(MODEL_NAME);
        tracing::debug!("Saving model to {path:?}");
        model
            .clone()
            .save_file(self.dir.join(MODEL_NAME), &RecorderTy::new()) // ext added automatically
            .map_err(|e| Error::Record {
                path,
                message: format!("{e:?}"),
            })
    }

    /// Loads the saved weights into a freshly initialized network, if a model was saved.
    pub fn load_model<B: Backend>(
        &self,
        experiment: &ExperimentConfig,
        device: &B::Device,
    ) -> Result<Option<Network<B>>> {
        let path = self.record_path(MODEL_NAME);
        if !path.exists() {
            return Ok(None);
        }
        tracing::info!("Loading model from {path:?}");
        let model_init = experiment.network.init::<B>(&experiment.data, device)?;
        let model = model_init
            .load_file(self.dir.join(MODEL_NAME), &RecorderTy::new(), device) // ext added automatically
            .map_err(|e| Error::Record {
                path,
                message: format!("{e:?}"),
            })?;
        Ok(Some(model))
    }

    pub fn save_optim<AutoB, AutoM, Optim>(&self, optim: &Optim) -> Result<()>
    where
        AutoB: AutodiffBackend,
        AutoM: AutodiffModule<AutoB>,
        Optim: Optimizer<AutoM, AutoB>,
    {
        let path = self.record_path(OPTIM_NAME);
        tracing::debug!("Saving optim to {path:?}");
        RecorderTy::new()
            .record(optim.to_record(), self.dir.join(OPTIM_NAME)) // ext added automatically
            .map_err(|e| Error::Record {
                path,
                message: format!("{e:?}"),
            })
    }

    /// Restores the optimizer state into a freshly initialized optimizer, if one was saved.
    pub fn load_optim<AutoB, AutoM, OptimConfig>(
        &self,
        optim_config: &OptimConfig,
        device: &AutoB::Device,
    ) -> Result<Option<OptimConfig::Adaptor>>
    where
        AutoB: AutodiffBackend,
        AutoM: AutodiffModule<AutoB>,
        OptimConfig: OptimConfigExt<AutoB, AutoM>,
    {
        let path = self.record_path(OPTIM_NAME);
        if !path.exists() {
            return Ok(None);
        }
        tracing::info!("Loading optim from {path:?}");
        let optim_init = optim_config.init();
        let record = RecorderTy::new()
            .load(self.dir.join(OPTIM_NAME), device) // ext added automatically
            .map_err(|e| Error::Record {
                path,
                message: format!("{e:?}"),
            })?;
        Ok(Some(optim_init.load_record(record)))
    }
}
