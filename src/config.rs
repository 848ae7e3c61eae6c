use crate::error;
use crate::loss::LossKind;
use crate::model::NetworkConfig;
use burn::optim::SgdConfig;
use burn::prelude::*;
use num_traits::AsPrimitive;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Linear rescaling of raw sample values into `[0, 1]`.
#[derive(Config, Debug, PartialEq)]
pub struct NormalizationParams {
    #[config(default = 0.0)]
    pub min: f64,
    #[config(default = 255.0)]
    pub max: f64,
}

impl NormalizationParams {
    /// Rejects empty, inverted and NaN ranges.
    pub fn validate(&self) -> error::Result<()> {
        if !(self.max > self.min) {
            return Err(error::Error::InvalidNormalization {
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    /// `(x - min) / (max - min)`.
    pub fn normalize<T: AsPrimitive<f64>>(&self, x: T) -> f32 {
        ((x.as_() - self.min) / (self.max - self.min)) as f32
    }
}

/// What the samples look like and which classes they belong to.
#[derive(Config, Debug)]
pub struct DataDetails {
    pub normalization: NormalizationParams,
    /// Class labels, in output order.
    pub classes: Vec<String>,
    /// `[width, height, channels]`
    pub shape: [usize; 3],
}

impl DataDetails {
    /// Number of values in a single sample.
    pub fn sample_len(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }
}

/// How samples are read from disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DataLoaderConfig {
    /// A headerless csv file, each row being `label,v0,v1,...`.
    Csv { fetch_size: usize },
    /// A directory holding one sub-directory of images per class label.
    Images { fetch_size: usize },
}

impl Default for DataLoaderConfig {
    fn default() -> Self {
        DataLoaderConfig::Csv { fetch_size: 500 }
    }
}

#[derive(Config, Debug)]
pub struct TrainingConfig {
    pub optimizer: SgdConfig,
    /// Learning rate of the first epoch.
    #[config(default = 0.01)]
    pub lr: f64,
    /// Multiplies the learning rate after every epoch.
    #[config(default = 1.0)]
    pub lr_decay: f64,
    #[config(default = 10)]
    pub num_epochs: usize,
    #[config(default = 1)]
    pub batch_size: usize,
    #[config(default = 1)]
    pub num_workers: usize,
    #[config(default = true)]
    pub shuffle: bool,
    #[config(default = 0)]
    pub seed: u64,
    #[config(default = "LossKind::MeanSquaredError")]
    pub loss: LossKind,
    /// Upper bound on the number of training samples read.
    #[config(default = "None")]
    pub max_train_samples: Option<usize>,
    /// Upper bound on the number of test samples read.
    #[config(default = "None")]
    pub max_test_samples: Option<usize>,
}

impl TrainingConfig {
    /// `lr * lr_decay^(epoch - 1)`, for the 1-based `epoch`.
    pub fn epoch_lr(&self, epoch: usize) -> f64 {
        let steps = epoch.saturating_sub(1).min(i32::MAX as usize) as i32;
        self.lr * self.lr_decay.powi(steps)
    }
}

/// Where the train and test samples live.
#[derive(Config, Debug)]
pub struct SamplePaths {
    pub train: String,
    pub test: String,
}

/// Everything needed to run a benchmark end to end.
#[derive(Config, Debug)]
pub struct ExperimentConfig {
    pub data: DataDetails,
    pub data_loader: DataLoaderConfig,
    pub network: NetworkConfig,
    pub training: TrainingConfig,
    pub samples: SamplePaths,
}

impl ExperimentConfig {
    pub fn load_json(path: &Path) -> error::Result<Self> {
        ExperimentConfig::load(path).map_err(|e| error::Error::Config {
            path: path.into(),
            message: format!("{e:?}"),
        })
    }

    pub fn save_json(&self, path: &Path) -> error::Result<()> {
        self.save(path).map_err(|e| error::Error::io(path, e))
    }

    pub fn to_json_pretty(&self) -> error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmarks;

    #[test]
    fn normalize_maps_range_to_unit_interval() {
        let params = NormalizationParams::new();
        assert_eq!(params.normalize(0u8), 0.0);
        assert_eq!(params.normalize(255u8), 1.0);
        assert!((params.normalize(51.0f64) - 0.2).abs() < 1e-6);

        let params = NormalizationParams::new().with_min(-1.0).with_max(1.0);
        assert_eq!(params.normalize(0.0f64), 0.5);
    }

    #[test]
    fn normalization_range_must_be_increasing() {
        assert!(NormalizationParams::new().validate().is_ok());

        for (min, max) in [(5.0, 5.0), (255.0, 0.0), (0.0, f64::NAN)] {
            let params = NormalizationParams::new().with_min(min).with_max(max);
            let err = params.validate().unwrap_err();
            assert!(matches!(err, error::Error::InvalidNormalization { .. }), "{err}");
        }
    }

    #[test]
    fn data_details_sizes() {
        let details = DataDetails::new(
            NormalizationParams::new(),
            vec!["cat".into(), "dog".into()],
            [100, 80, 3],
        );
        assert_eq!(details.sample_len(), 24_000);
        assert_eq!(details.num_classes(), 2);
    }

    #[test]
    fn learning_rate_decays_per_epoch() {
        let training = TrainingConfig::new(crate::optim::sgd_config(None)).with_lr(0.8);
        assert_eq!(training.lr_decay, 1.0);
        assert_eq!(training.epoch_lr(1), 0.8);
        assert_eq!(training.epoch_lr(7), 0.8);

        let training = training.with_lr_decay(0.5);
        assert_eq!(training.epoch_lr(1), 0.8);
        assert_eq!(training.epoch_lr(2), 0.4);
        assert_eq!(training.epoch_lr(4), 0.1);
    }

    #[test]
    fn experiment_survives_a_json_file() {
        let dir = temp_dir::TempDir::new().unwrap();
        let path = dir.path().join("experiment.json");

        let experiment = benchmarks::catdog_conv();
        experiment.save_json(&path).unwrap();
        let loaded = ExperimentConfig::load_json(&path).unwrap();

        assert_eq!(loaded.data.classes, experiment.data.classes);
        assert_eq!(loaded.data.shape, [100, 100, 3]);
        assert_eq!(loaded.data_loader, experiment.data_loader);
        assert_eq!(loaded.network.hidden_layers, experiment.network.hidden_layers);
        assert_eq!(loaded.training.num_epochs, 10);
        assert!(!loaded.training.shuffle);
        assert_eq!(loaded.samples.test, experiment.samples.test);
    }

    #[test]
    fn loader_config_is_tagged() {
        let json = serde_json::to_string(&DataLoaderConfig::Images { fetch_size: 8 }).unwrap();
        assert_eq!(json, r#"{"type":"images","fetch_size":8}"#);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let dir = temp_dir::TempDir::new().unwrap();
        let err = ExperimentConfig::load_json(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, error::Error::Config { .. }));
    }
}
