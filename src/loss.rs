use burn::nn::loss::{CrossEntropyLossConfig, Reduction};
use burn::prelude::*;
use burn::tensor::{DType, Element};
use serde::{Deserialize, Serialize};

/// The criterion minimized during training and reported during evaluation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossKind {
    /// Mean of the squared differences between the outputs and the one-hot targets.
    #[default]
    MeanSquaredError,
    /// Softmax cross-entropy, with the outputs treated as logits.
    CrossEntropy,
}

impl LossKind {
    /// # Shapes
    ///
    /// - output: `[batch_size, num_classes]`
    /// - one_hot: `[batch_size, num_classes]`
    /// - targets: `[batch_size]`
    pub fn forward<B: Backend>(
        &self,
        output: Tensor<B, 2>,
        one_hot: Tensor<B, 2>,
        targets: Tensor<B, 1, Int>,
    ) -> Tensor<B, 1> {
        match self {
            LossKind::MeanSquaredError => MseLoss::new().forward(output, one_hot, Reduction::Mean),
            LossKind::CrossEntropy => CrossEntropyLossConfig::new()
                .init(&output.device())
                .forward(output, targets),
        }
    }
}

/// Calculate the mean squared error loss from the outputs and the targets.
#[derive(Module, Clone, Debug, Default)]
pub struct MseLoss;

impl MseLoss {
    pub fn new() -> Self {
        Self
    }

    /// Compute the criterion on the input tensor.
    ///
    /// # Shapes
    ///
    /// - output: `[batch_size, num_targets]`
    /// - targets: `[batch_size, num_targets]`
    pub fn forward<const D: usize, B: Backend>(
        &self,
        output: Tensor<B, D>,
        targets: Tensor<B, D>,
        reduction: Reduction,
    ) -> Tensor<B, 1> {
        if <B::FloatElem as Element>::dtype() != DType::F16 {
            let squared = self.forward_no_reduction(output, targets);
            return match reduction {
                Reduction::Mean | Reduction::Auto => squared.mean(),
                Reduction::Sum => squared.sum(),
            };
        }

        // f16 overflows on sub² for large differences
        self.forward_rescaled(output, targets, reduction)
    }

    /// Same value as squaring then reducing, but every squared difference is first
    /// divided by the largest absolute difference, which is multiplied back after
    /// the reduction. Keeps half precision intermediates in range.
    pub fn forward_rescaled<const D: usize, B: Backend>(
        &self,
        output: Tensor<B, D>,
        targets: Tensor<B, D>,
        reduction: Reduction,
    ) -> Tensor<B, 1> {
        let div_eps = crate::utils::div_eps_f32::<B>() * 2.;
        let sub = output.sub(targets);
        let max = sub.clone().no_grad().detach().abs().max();
        let scaled = sub.clone() / (max.clone().expand(sub.shape()) + div_eps);
        let partial = sub * scaled;
        let reduced = match reduction {
            Reduction::Mean | Reduction::Auto => partial.mean(),
            Reduction::Sum => partial.sum(),
        };
        reduced * max
    }

    pub fn forward_no_reduction<const D: usize, B: Backend>(
        &self,
        output: Tensor<B, D>,
        targets: Tensor<B, D>,
    ) -> Tensor<B, D> {
        output.sub(targets).square()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray<f32>;

    #[test]
    fn mse_is_the_mean_of_squared_differences() {
        let device = Default::default();
        let output = Tensor::<TestBackend, 2>::from_floats([[0.5, 0.0], [1.0, 0.25]], &device);
        let one_hot = Tensor::<TestBackend, 2>::from_floats([[1.0, 0.0], [0.0, 1.0]], &device);
        let targets = Tensor::<TestBackend, 1, Int>::from_ints([0, 1], &device);

        let loss = LossKind::MeanSquaredError
            .forward(output, one_hot, targets)
            .into_scalar()
            .elem::<f32>();
        // (0.25 + 0 + 1 + 0.5625) / 4
        assert!((loss - 0.453125).abs() < 1e-6);
    }

    #[test]
    fn mse_sum_reduction() {
        let device = Default::default();
        let output = Tensor::<TestBackend, 2>::from_floats([[2.0, 0.0]], &device);
        let targets = Tensor::<TestBackend, 2>::from_floats([[0.0, 1.0]], &device);

        let loss = MseLoss::new()
            .forward(output, targets, Reduction::Sum)
            .into_scalar()
            .elem::<f32>();
        assert!((loss - 5.0).abs() < 1e-6);
    }

    fn scalar(loss: Tensor<TestBackend, 1>) -> f32 {
        loss.into_scalar().elem::<f32>()
    }

    #[test]
    fn rescaled_mse_matches_the_plain_one() {
        let device = Default::default();
        let output = Tensor::<TestBackend, 2>::from_floats([[256.0, 0.0], [1.0, 3.0]], &device);
        let targets = Tensor::<TestBackend, 2>::from_floats([[0.0, 0.0], [0.0, 1.0]], &device);
        let mse = MseLoss::new();

        for (reduction, expected) in [(Reduction::Mean, 16_385.25), (Reduction::Sum, 65_541.0)] {
            let plain = mse.forward_no_reduction(output.clone(), targets.clone());
            let plain = scalar(match reduction {
                Reduction::Sum => plain.sum(),
                _ => plain.mean(),
            });
            let rescaled = scalar(mse.forward_rescaled(output.clone(), targets.clone(), reduction));

            assert!((plain - expected).abs() / expected < 1e-6, "{plain}");
            assert!((rescaled - plain).abs() / plain < 1e-5, "{rescaled} != {plain}");
        }
    }

    #[test]
    fn rescaled_mse_of_identical_tensors_is_zero() {
        let device = Default::default();
        let output = Tensor::<TestBackend, 2>::from_floats([[0.3, 0.7]], &device);

        let loss = MseLoss::new().forward_rescaled(output.clone(), output, Reduction::Mean);
        assert_eq!(scalar(loss), 0.0);
    }

    #[test]
    fn cross_entropy_prefers_the_correct_class() {
        let device = Default::default();
        let one_hot = Tensor::<TestBackend, 2>::from_floats([[1.0, 0.0]], &device);
        let targets = Tensor::<TestBackend, 1, Int>::from_ints([0], &device);

        let good = Tensor::<TestBackend, 2>::from_floats([[4.0, -4.0]], &device);
        let bad = Tensor::<TestBackend, 2>::from_floats([[-4.0, 4.0]], &device);

        let good = LossKind::CrossEntropy
            .forward(good, one_hot.clone(), targets.clone())
            .into_scalar()
            .elem::<f32>();
        let bad = LossKind::CrossEntropy
            .forward(bad, one_hot, targets)
            .into_scalar()
            .elem::<f32>();
        assert!(good < bad);
    }

    #[test]
    fn loss_kind_names() {
        assert_eq!(
            serde_json::to_string(&LossKind::MeanSquaredError).unwrap(),
            "\"mean_squared_error\""
        );
        assert_eq!(
            serde_json::from_str::<LossKind>("\"cross_entropy\"").unwrap(),
            LossKind::CrossEntropy
        );
    }
}
