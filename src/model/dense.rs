use crate::model::Activation;
use burn::nn::{Dropout, DropoutConfig, Initializer, Linear, LinearConfig};
use burn::prelude::*;

/// A fully connected layer followed by its activation, then dropout.
#[derive(Module, Debug)]
pub struct DenseLayer<B: Backend> {
    pub linear: Linear<B>,
    pub activation: Activation,
    /// Only zeroes activations on autodiff backends, so inference is unaffected.
    pub dropout: Dropout,
}

/// A validated dense layer, with its input size resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct DensePlan {
    pub input_size: usize,
    pub size: usize,
    pub activation: Activation,
    /// In `[0, 1)`.
    pub dropout: f64,
}

impl DensePlan {
    pub fn num_params(&self) -> usize {
        self.input_size * self.size + self.size
    }

    /// Weights are drawn from `initializer`, biases start at zero.
    pub fn init<B: Backend>(&self, initializer: &Initializer, device: &B::Device) -> DenseLayer<B> {
        let mut linear = LinearConfig::new(self.input_size, self.size)
            .with_bias(true)
            .with_initializer(initializer.clone())
            .init(device);
        linear.bias = Some(Initializer::Zeros.init([self.size], device));
        DenseLayer {
            linear,
            activation: self.activation,
            dropout: DropoutConfig::new(self.dropout).init(),
        }
    }
}

impl<B: Backend> DenseLayer<B> {
    /// # Shapes
    ///
    /// - input: `[batch_size, input_size]`
    /// - output: `[batch_size, size]`
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.activation.forward(self.linear.forward(input));
        self.dropout.forward(x)
    }
}
