use burn::prelude::*;
use burn::tensor::activation;

/// Element-wise non-linearity applied after a layer's affine transform.
#[derive(Module, Default, Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    #[default]
    Sigmoid,
    Relu,
    /// Leaves the input untouched, e.g. for logits fed into a cross-entropy loss.
    Identity,
}

impl Activation {
    pub fn forward<B: Backend, const D: usize>(&self, input: Tensor<B, D>) -> Tensor<B, D> {
        match self {
            Activation::Sigmoid => activation::sigmoid(input),
            Activation::Relu => activation::relu(input),
            Activation::Identity => input,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray<f32>;

    fn apply(activation: Activation, values: [f32; 3]) -> Vec<f32> {
        let device = Default::default();
        let x = Tensor::<TestBackend, 1>::from_floats(values, &device);
        activation.forward(x).into_data().to_vec::<f32>().unwrap()
    }

    fn assert_close(actual: &[f32], expected: &[f32]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-5, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn activations() {
        let x = [-2.0, 0.0, 3.0];
        assert_close(&apply(Activation::Relu, x), &[0.0, 0.0, 3.0]);
        assert_close(
            &apply(Activation::Sigmoid, x),
            &[0.11920292, 0.5, 0.95257413],
        );
        assert_close(&apply(Activation::Identity, x), &x);
    }
}
