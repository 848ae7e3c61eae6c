use crate::model::Activation;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::pool::{MaxPool2d, MaxPool2dConfig};
use burn::nn::Initializer;
use burn::prelude::*;

/// A convolution (valid padding, unit stride) and its activation, optionally
/// followed by non-overlapping max pooling.
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    pub conv: Conv2d<B>,
    pub activation: Activation,
    pub pool: Option<MaxPool2d>,
}

/// A validated convolutional block, with its input and output shapes resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvBlockPlan {
    pub in_channels: usize,
    pub depth: usize,
    /// `[width, height]`
    pub kernel_size: [usize; 2],
    pub activation: Activation,
    /// `[width, height]`
    pub pool: Option<[usize; 2]>,
    /// Shape after the convolution, `[channels, height, width]`.
    pub conv_shape: [usize; 3],
    /// Shape after the (optional) pooling, `[channels, height, width]`.
    pub output_shape: [usize; 3],
}

impl ConvBlockPlan {
    pub fn num_params(&self) -> usize {
        let [kw, kh] = self.kernel_size;
        self.depth * self.in_channels * kw * kh + self.depth
    }

    /// Kernels are drawn from `initializer`, biases start at zero.
    pub fn init<B: Backend>(&self, initializer: &Initializer, device: &B::Device) -> ConvBlock<B> {
        let [kw, kh] = self.kernel_size;
        let mut conv = Conv2dConfig::new([self.in_channels, self.depth], [kh, kw])
            .with_bias(true)
            .with_initializer(initializer.clone())
            .init(device);
        conv.bias = Some(Initializer::Zeros.init([self.depth], device));

        let pool = self
            .pool
            .map(|[rw, rh]| MaxPool2dConfig::new([rh, rw]).with_strides([rh, rw]).init());

        ConvBlock {
            conv,
            activation: self.activation,
            pool,
        }
    }
}

impl<B: Backend> ConvBlock<B> {
    /// # Shapes
    ///
    /// - input: `[batch_size, in_channels, height, width]`
    /// - output: `[batch_size, depth, height', width']`
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.activation.forward(self.conv.forward(input));
        match &self.pool {
            Some(pool) => pool.forward(x),
            None => x,
        }
    }
}
