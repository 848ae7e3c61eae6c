//! Sequential classifier networks: convolutional blocks, then dense layers,
//! then an output layer with one unit per class.

pub mod activation;
pub mod conv;
pub mod dense;

pub use activation::Activation;
pub use conv::{ConvBlock, ConvBlockPlan};
pub use dense::{DenseLayer, DensePlan};

use crate::config::DataDetails;
use crate::error;
use burn::nn::Initializer;
use burn::prelude::*;
use serde::{Deserialize, Serialize};

/// A hidden layer, as written in a config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerConfig {
    Dense {
        size: usize,
        #[serde(default)]
        activation: Activation,
        /// Probability of zeroing each output while training, in `[0, 1)`.
        #[serde(default)]
        dropout: f64,
    },
    Convolutional {
        /// Number of output channels.
        depth: usize,
        /// `[width, height]`
        kernel_size: [usize; 2],
        #[serde(default)]
        activation: Activation,
    },
    /// Must directly follow a convolutional layer.
    MaxPooling {
        /// `[width, height]`
        region_size: [usize; 2],
    },
}

/// The output layer has one unit per class.
#[derive(Config, Debug, PartialEq)]
pub struct OutputLayerConfig {
    #[config(default = "Activation::Sigmoid")]
    pub activation: Activation,
}

#[derive(Config, Debug)]
pub struct NetworkConfig {
    #[config(default = "Vec::new()")]
    pub hidden_layers: Vec<LayerConfig>,
    #[config(default = "OutputLayerConfig::new()")]
    pub output_layer: OutputLayerConfig,
    /// Standard deviation of the normally distributed initial weights.
    #[config(default = 0.1)]
    pub weight_std: f64,
}

/// The network layout resolved against the sample shape.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkPlan {
    pub features: Vec<ConvBlockPlan>,
    pub hidden: Vec<DensePlan>,
    pub output: DensePlan,
}

/// One line of [`NetworkConfig::summary`].
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSummary {
    pub name: &'static str,
    pub output_shape: Vec<usize>,
    pub num_params: usize,
}

impl NetworkConfig {
    /// Validates the layer sequence and resolves every layer's shape.
    pub fn plan(&self, details: &DataDetails) -> error::Result<NetworkPlan> {
        let [width, height, channels] = details.shape;
        if width == 0 || height == 0 || channels == 0 {
            return Err(error::Error::InvalidNetwork(format!(
                "sample shape {:?} has an empty dimension",
                details.shape
            )));
        }

        // [channels, height, width]
        let mut shape = [channels, height, width];
        let mut features: Vec<ConvBlockPlan> = Vec::new();
        let mut hidden: Vec<DensePlan> = Vec::new();

        for (i, layer) in self.hidden_layers.iter().enumerate() {
            let invalid = |message: String| error::Error::InvalidNetwork(format!("layer {i}: {message}"));
            match layer {
                LayerConfig::Convolutional {
                    depth,
                    kernel_size,
                    activation,
                } => {
                    if !hidden.is_empty() {
                        return Err(invalid(
                            "convolutional layers cannot follow dense layers".into(),
                        ));
                    }
                    let [kw, kh] = *kernel_size;
                    let [_, h, w] = shape;
                    if *depth == 0 || kw == 0 || kh == 0 {
                        return Err(invalid("depth and kernel size must be non-zero".into()));
                    }
                    if kw > w || kh > h {
                        return Err(invalid(format!(
                            "kernel {kw}x{kh} does not fit the {w}x{h} input"
                        )));
                    }
                    let conv_shape = [*depth, h - kh + 1, w - kw + 1];
                    features.push(ConvBlockPlan {
                        in_channels: shape[0],
                        depth: *depth,
                        kernel_size: *kernel_size,
                        activation: *activation,
                        pool: None,
                        conv_shape,
                        output_shape: conv_shape,
                    });
                    shape = conv_shape;
                }
                LayerConfig::MaxPooling { region_size } => {
                    let follows_conv = i > 0
                        && matches!(
                            self.hidden_layers[i - 1],
                            LayerConfig::Convolutional { .. }
                        );
                    let block = match features.last_mut() {
                        Some(block) if follows_conv => block,
                        _ => {
                            return Err(invalid(
                                "max pooling must directly follow a convolutional layer".into(),
                            ));
                        }
                    };
                    let [rw, rh] = *region_size;
                    let [c, h, w] = shape;
                    if rw == 0 || rh == 0 || rw > w || rh > h {
                        return Err(invalid(format!(
                            "pooling region {rw}x{rh} does not fit the {w}x{h} input"
                        )));
                    }
                    // trailing rows and columns that don't fill a region are dropped
                    shape = [c, h / rh, w / rw];
                    block.pool = Some(*region_size);
                    block.output_shape = shape;
                }
                LayerConfig::Dense {
                    size,
                    activation,
                    dropout,
                } => {
                    if *size == 0 {
                        return Err(invalid("dense layers need at least one unit".into()));
                    }
                    if !(0.0..1.0).contains(dropout) {
                        return Err(invalid(format!("dropout {dropout} is not in [0, 1)")));
                    }
                    let input_size = match hidden.last() {
                        Some(previous) => previous.size,
                        None => shape.iter().product(),
                    };
                    hidden.push(DensePlan {
                        input_size,
                        size: *size,
                        activation: *activation,
                        dropout: *dropout,
                    });
                }
            }
        }

        if details.num_classes() == 0 {
            return Err(error::Error::InvalidNetwork("no class labels".into()));
        }
        let output = DensePlan {
            input_size: match hidden.last() {
                Some(previous) => previous.size,
                None => shape.iter().product(),
            },
            size: details.num_classes(),
            activation: self.output_layer.activation,
            dropout: 0.0,
        };

        Ok(NetworkPlan {
            features,
            hidden,
            output,
        })
    }

    /// Returns the initialized network.
    pub fn init<B: Backend>(&self, details: &DataDetails, device: &B::Device) -> error::Result<Network<B>> {
        let plan = self.plan(details)?;
        let initializer = Initializer::Normal {
            mean: 0.0,
            std: self.weight_std,
        };
        Ok(Network {
            features: plan
                .features
                .iter()
                .map(|block| block.init(&initializer, device))
                .collect(),
            hidden: plan
                .hidden
                .iter()
                .map(|layer| layer.init(&initializer, device))
                .collect(),
            output: plan.output.init(&initializer, device),
        })
    }

    /// Per-layer output shapes and parameter counts.
    pub fn summary(&self, details: &DataDetails) -> error::Result<Vec<LayerSummary>> {
        let plan = self.plan(details)?;
        let mut lines = Vec::new();
        for block in &plan.features {
            lines.push(LayerSummary {
                name: "convolutional",
                output_shape: block.conv_shape.to_vec(),
                num_params: block.num_params(),
            });
            if block.pool.is_some() {
                lines.push(LayerSummary {
                    name: "max_pooling",
                    output_shape: block.output_shape.to_vec(),
                    num_params: 0,
                });
            }
        }
        if let Some(last) = plan.features.last() {
            lines.push(LayerSummary {
                name: "flatten",
                output_shape: vec![last.output_shape.iter().product()],
                num_params: 0,
            });
        }
        for layer in &plan.hidden {
            lines.push(LayerSummary {
                name: "dense",
                output_shape: vec![layer.size],
                num_params: layer.num_params(),
            });
        }
        lines.push(LayerSummary {
            name: "output",
            output_shape: vec![plan.output.size],
            num_params: plan.output.num_params(),
        });
        Ok(lines)
    }
}

/// Logs a layer table in the spirit of a sequential model summary.
pub fn log_summary(summary: &[LayerSummary]) {
    tracing::info!("{:<16}{:<20}{:>12}", "Layer", "Output shape", "Params");
    for line in summary {
        tracing::info!(
            "{:<16}{:<20}{:>12}",
            line.name,
            format!("{:?}", line.output_shape),
            line.num_params
        );
    }
    let total: usize = summary.iter().map(|line| line.num_params).sum();
    tracing::info!("Total params: {total}");
}

#[derive(Module, Debug)]
pub struct Network<B: Backend> {
    pub features: Vec<ConvBlock<B>>,
    pub hidden: Vec<DenseLayer<B>>,
    pub output: DenseLayer<B>,
}

impl<B: Backend> Network<B> {
    /// # Shapes
    ///
    /// - images: `[batch_size, channels, height, width]`
    /// - output: `[batch_size, num_classes]`
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let mut x = images;
        for block in &self.features {
            x = block.forward(x);
        }
        let mut x: Tensor<B, 2> = x.flatten(1, 3);
        for layer in &self.hidden {
            x = layer.forward(x);
        }
        self.output.forward(x)
    }
}
