//! Built-in experiments.

use crate::config::{
    DataDetails, DataLoaderConfig, ExperimentConfig, NormalizationParams, SamplePaths,
    TrainingConfig,
};
use crate::error::{Error, Result};
use crate::model::{Activation, LayerConfig, NetworkConfig, OutputLayerConfig};
use crate::optim::sgd_config;

/// Handwritten digits from a csv dump of MNIST, classified by a dense network.
///
/// 28x28 grayscale inputs, two sigmoid hidden layers (300 and 80 units), 10 outputs.
pub fn ocr_dense() -> ExperimentConfig {
    let data = DataDetails::new(
        NormalizationParams::new(),
        (0..10).map(|digit| digit.to_string()).collect(),
        [28, 28, 1],
    );
    let network = NetworkConfig::new()
        .with_hidden_layers(vec![
            LayerConfig::Dense {
                size: 300,
                activation: Activation::Sigmoid,
                dropout: 0.0,
            },
            LayerConfig::Dense {
                size: 80,
                activation: Activation::Sigmoid,
                dropout: 0.0,
            },
        ])
        .with_output_layer(OutputLayerConfig::new().with_activation(Activation::Sigmoid))
        .with_weight_std(0.1);
    let training = TrainingConfig::new(sgd_config(None))
        .with_lr(0.7)
        .with_num_epochs(30)
        .with_batch_size(1)
        .with_shuffle(true)
        .with_max_train_samples(Some(1000))
        .with_max_test_samples(Some(1000));

    ExperimentConfig::new(
        data,
        DataLoaderConfig::Csv { fetch_size: 500 },
        network,
        training,
        SamplePaths::new("data/ocr/train.csv".into(), "data/ocr/test.csv".into()),
    )
}

/// Cat and dog photos, classified by a small convolutional network.
///
/// 100x100 rgb inputs, two relu convolutions each followed by a 2x2 max pooling,
/// then a sigmoid dense layer of 128 units and 2 outputs.
pub fn catdog_conv() -> ExperimentConfig {
    let data = DataDetails::new(
        NormalizationParams::new(),
        vec!["cat".into(), "dog".into()],
        [100, 100, 3],
    );
    let network = NetworkConfig::new()
        .with_hidden_layers(vec![
            LayerConfig::Convolutional {
                depth: 32,
                kernel_size: [3, 3],
                activation: Activation::Relu,
            },
            LayerConfig::MaxPooling {
                region_size: [2, 2],
            },
            LayerConfig::Convolutional {
                depth: 64,
                kernel_size: [3, 3],
                activation: Activation::Relu,
            },
            LayerConfig::MaxPooling {
                region_size: [2, 2],
            },
            LayerConfig::Dense {
                size: 128,
                activation: Activation::Sigmoid,
                dropout: 0.0,
            },
        ])
        .with_output_layer(OutputLayerConfig::new().with_activation(Activation::Sigmoid))
        .with_weight_std(0.1);
    let training = TrainingConfig::new(sgd_config(Some(0.9)))
        .with_lr(0.001)
        .with_num_epochs(10)
        .with_batch_size(1)
        .with_shuffle(false)
        .with_max_train_samples(Some(1000))
        .with_max_test_samples(Some(100));

    ExperimentConfig::new(
        data,
        DataLoaderConfig::Images { fetch_size: 500 },
        network,
        training,
        SamplePaths::new("data/catdog/train".into(), "data/catdog/test".into()),
    )
}

/// Names accepted by [`by_name`].
pub const NAMES: [&str; 2] = ["ocr", "catdog"];

/// Looks a built-in experiment up by name.
pub fn by_name(name: &str) -> Option<fn() -> ExperimentConfig> {
    match name {
        "ocr" => Some(ocr_dense),
        "catdog" => Some(catdog_conv),
        _ => None,
    }
}

/// The experiment selected with `--benchmark`, or `fallback` when none was.
pub fn resolve(
    name: Option<&str>,
    fallback: fn() -> ExperimentConfig,
) -> Result<fn() -> ExperimentConfig> {
    match name {
        None => Ok(fallback),
        Some(name) => by_name(name).ok_or_else(|| {
            Error::Usage(format!("unknown benchmark '{name}', expected one of {NAMES:?}"))
        }),
    }
}
