use crate::config::DataDetails;
use crate::data::{ClassifierBatch, ClassifierBatcher, LabelledDataSet};
use crate::error::{Error, Result};
use crate::loss::LossKind;
use crate::model::Network;
use burn::data::dataloader::DataLoaderBuilder;
use burn::data::dataset::Dataset;
use burn::prelude::*;
use std::fmt;

/// Test results of a classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalReport {
    /// Mean loss per sample.
    pub loss: f64,
    /// Fraction of correctly classified samples, in `[0, 1]`.
    pub accuracy: f64,
    /// Correctly classified samples.
    pub good: usize,
    /// Misclassified samples.
    pub bad: usize,
}

impl EvalReport {
    pub fn total(&self) -> usize {
        self.good + self.bad
    }
}

impl fmt::Display for EvalReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Test loss: {}", self.loss)?;
        write!(f, "Test accuracy: {}", self.accuracy)
    }
}

/// Runs `model` over every sample of `dataset`, in order.
pub fn evaluate<B: Backend>(
    model: &Network<B>,
    loss: LossKind,
    details: &DataDetails,
    dataset: &LabelledDataSet,
    batch_size: usize,
    device: &B::Device,
) -> Result<EvalReport> {
    if dataset.is_empty() {
        return Err(Error::EmptyDataset("nothing to evaluate".into()));
    }

    let batcher = ClassifierBatcher::new(details.shape, details.num_classes());
    let dataloader = DataLoaderBuilder::new(batcher)
        .batch_size(batch_size.max(1))
        .num_workers(1)
        .set_device(device.clone())
        .build(dataset.clone());

    let mut loss_sum = 0f64;
    let mut good = 0;
    let mut total = 0;
    for batch in dataloader.iter() {
        let ClassifierBatch {
            images,
            targets,
            one_hot,
        } = batch;
        let [batch_size, ..] = images.dims();

        let output = model.forward(images);
        let batch_loss = loss
            .forward(output.clone(), one_hot, targets.clone())
            .into_scalar()
            .elem::<f64>();
        loss_sum += batch_loss * batch_size as f64;
        good += count_correct(output, targets);
        total += batch_size;
    }

    let report = EvalReport {
        loss: loss_sum / total as f64,
        accuracy: good as f64 / total as f64,
        good,
        bad: total - good,
    };
    tracing::info!(
        "Evaluated {total} samples: {} good, {} bad",
        report.good,
        report.bad
    );
    Ok(report)
}

/// How many rows of `output` have their strongest value at the target class.
///
/// # Shapes
///
/// - output: `[batch_size, num_classes]`
/// - targets: `[batch_size]`
pub fn count_correct<B: Backend>(output: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> usize {
    let [batch_size, _num_classes] = output.dims();
    let predictions = output.argmax(1).reshape([batch_size]);
    predictions
        .equal(targets)
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>() as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NormalizationParams;
    use crate::data::Sample;
    use crate::model::{Activation, LayerConfig, NetworkConfig};

    type TestBackend = burn::backend::NdArray<f32>;

    #[test]
    fn argmax_matches_are_counted() {
        let device = Default::default();
        let output = Tensor::<TestBackend, 2>::from_floats(
            [[0.9, 0.1, 0.0], [0.2, 0.7, 0.1], [0.3, 0.3, 0.4], [0.5, 0.1, 0.2]],
            &device,
        );
        let targets = Tensor::<TestBackend, 1, Int>::from_ints([0, 1, 1, 2], &device);
        assert_eq!(count_correct(output, targets), 2);
    }

    #[test]
    fn report_prints_loss_and_accuracy() {
        let report = EvalReport {
            loss: 0.25,
            accuracy: 0.75,
            good: 3,
            bad: 1,
        };
        assert_eq!(report.to_string(), "Test loss: 0.25\nTest accuracy: 0.75");
        assert_eq!(report.total(), 4);
    }

    #[test]
    fn every_sample_is_counted_once() {
        let device = Default::default();
        let classes: Vec<String> = vec!["a".into(), "b".into(), "c".into()];
        let details = DataDetails::new(NormalizationParams::new(), classes.clone(), [2, 2, 1]);
        let model: Network<TestBackend> = NetworkConfig::new()
            .with_hidden_layers(vec![LayerConfig::Dense {
                size: 3,
                activation: Activation::Sigmoid,
                dropout: 0.0,
            }])
            .init(&details, &device)
            .unwrap();

        let samples = (0..7)
            .map(|i| Sample::new(classes[i % 3].clone(), vec![i as f32 / 7.; 4]))
            .collect();
        let dataset = LabelledDataSet::from_samples(samples, &classes).unwrap();

        let report = evaluate(&model, LossKind::MeanSquaredError, &details, &dataset, 3, &device)
            .unwrap();
        assert_eq!(report.total(), 7);
        assert!((report.accuracy - report.good as f64 / 7.).abs() < 1e-12);
        // sigmoid outputs against one-hot targets
        assert!(report.loss > 0.0 && report.loss < 1.0);
    }

    #[test]
    fn empty_dataset_is_an_error() {
        let device = Default::default();
        let classes: Vec<String> = vec!["a".into()];
        let details = DataDetails::new(NormalizationParams::new(), classes.clone(), [1, 1, 1]);
        let model: Network<TestBackend> = NetworkConfig::new().init(&details, &device).unwrap();
        let dataset = LabelledDataSet::from_samples(Vec::new(), &classes).unwrap();

        let err = evaluate(&model, LossKind::MeanSquaredError, &details, &dataset, 1, &device)
            .unwrap_err();
        assert!(matches!(err, Error::EmptyDataset(_)));
    }
}
