use crate::artifacts::Artifacts;
use crate::config::{ExperimentConfig, TrainingConfig};
use crate::data::{ClassifierBatch, ClassifierBatcher, LabelledDataSet};
use crate::error::Result;
use crate::loss::LossKind;
use crate::model::{Network, log_summary};
use crate::optim::OptimConfigExt;
use burn::prelude::*;
use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    optim::{GradientsParams, Optimizer, SgdConfig},
    tensor::backend::AutodiffBackend,
    train::ClassificationOutput,
    train::metric::{AccuracyMetric, Adaptor, LossMetric, Metric, MetricMetadata, Numeric},
};
use std::sync::Arc;

type Dataloader<B> = Arc<dyn DataLoader<B, ClassifierBatch<B>> + 'static>;

/// Averaged training metrics of a single epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct EpochSummary {
    /// 1-based.
    pub epoch: usize,
    /// Learning rate the epoch was trained with.
    pub lr: f64,
    pub loss: f64,
    /// Fraction of correctly classified samples, in `[0, 1]`.
    pub accuracy: f64,
}

/// Fits a network to `train_set`.
///
/// When `artifacts` is given, a previously saved model and optimizer are resumed
/// and both are saved again after every epoch.
pub fn train<AutoB: AutodiffBackend>(
    experiment: &ExperimentConfig,
    train_set: LabelledDataSet,
    device: &AutoB::Device,
    artifacts: Option<&Artifacts>,
) -> Result<(Network<AutoB>, Vec<EpochSummary>)> {
    let training = &experiment.training;
    AutoB::seed(device, training.seed);

    log_summary(&experiment.network.summary(&experiment.data)?);

    // load (or init) model and optim
    let resumed = match artifacts {
        Some(artifacts) => artifacts.load_model::<AutoB>(experiment, device)?,
        None => None,
    };
    let mut model = match resumed {
        Some(model) => model,
        None => {
            tracing::info!("Initializing new model");
            experiment.network.init::<AutoB>(&experiment.data, device)?
        }
    };
    let resumed = match artifacts {
        Some(artifacts) => artifacts
            .load_optim::<AutoB, Network<AutoB>, SgdConfig>(&training.optimizer, device)?,
        None => None,
    };
    let mut optim = match resumed {
        Some(optim) => optim,
        None => {
            tracing::debug!("Initializing new optim");
            <SgdConfig as OptimConfigExt<AutoB, Network<AutoB>>>::init(&training.optimizer)
        }
    };

    let dataloader = build_dataloader::<AutoB>(experiment, train_set, device);
    let num_items = dataloader.num_items();

    let mut metric_meta = MetricMetadata {
        progress: burn::data::dataloader::Progress::new(0, num_items),
        epoch: 1,
        epoch_total: training.num_epochs,
        iteration: 0,
        lr: Some(training.lr),
    };

    tracing::info!(
        "Starting training on {num_items} samples for {} epochs",
        training.num_epochs
    );
    let mut summaries = Vec::with_capacity(training.num_epochs);
    for epoch in 1..training.num_epochs + 1 {
        metric_meta.epoch = epoch;
        metric_meta.lr = Some(training.epoch_lr(epoch));
        metric_meta.progress.items_processed = 0;

        let (trained, summary) = epoch_train::<AutoB, _>(
            Arc::clone(&dataloader),
            model,
            training,
            &mut optim,
            &mut metric_meta,
        );
        model = trained;
        tracing::info!(
            "Epoch {}/{}, lr {:.3e}, Avg Loss {:.4}, Avg Acc {:.4}",
            summary.epoch,
            training.num_epochs,
            summary.lr,
            summary.loss,
            summary.accuracy,
        );
        summaries.push(summary);

        // save assets
        if let Some(artifacts) = artifacts {
            artifacts.save_model(&model)?;
            artifacts.save_optim(&optim)?;
        }
    }
    tracing::info!("Training finished");

    Ok((model, summaries))
}

fn build_dataloader<AutoB: AutodiffBackend>(
    experiment: &ExperimentConfig,
    train_set: LabelledDataSet,
    device: &AutoB::Device,
) -> Dataloader<AutoB> {
    let training = &experiment.training;
    let batcher = ClassifierBatcher::new(experiment.data.shape, experiment.data.num_classes());
    let mut builder = DataLoaderBuilder::new(batcher)
        .batch_size(training.batch_size.max(1))
        .num_workers(training.num_workers.max(1))
        .set_device(device.clone());
    if training.shuffle {
        builder = builder.shuffle(training.seed);
    }
    builder.build(train_set)
}

fn epoch_train<AutoB, Optim>(
    dataloader: Dataloader<AutoB>,
    mut model: Network<AutoB>,
    training: &TrainingConfig,
    optim: &mut Optim,
    metric_meta: &mut MetricMetadata,
) -> (Network<AutoB>, EpochSummary)
where
    AutoB: AutodiffBackend,
    Optim: Optimizer<Network<AutoB>, AutoB>,
{
    let mut loss_metric = LossMetric::<AutoB>::new();
    let mut acc_metric = AccuracyMetric::<AutoB>::new();
    let num_batches = dataloader.num_items().div_ceil(training.batch_size.max(1));
    let lr = metric_meta.lr.unwrap_or(training.lr);

    for (b, batch) in dataloader.iter().enumerate() {
        let [batch_size, ..] = batch.images.dims();
        metric_meta.iteration += 1;
        metric_meta.progress.items_processed += batch_size;

        let output = forward_classification(&model, training.loss, batch);
        acc_metric.update(&output.adapt(), metric_meta);
        loss_metric.update(&output.adapt(), metric_meta);

        let grads = output.loss.backward();
        let grads = GradientsParams::from_grads(grads, &model);
        model = optim.step(lr, model, grads);

        tracing::debug!(
            "Epoch {}/{}, Batch {:0>4}/{num_batches}, Loss {:.4}, Acc {:0>6.2}",
            metric_meta.epoch,
            metric_meta.epoch_total,
            b + 1,
            loss_metric.value().current(),
            acc_metric.value().current(),
        );
    }

    let summary = EpochSummary {
        epoch: metric_meta.epoch,
        lr,
        loss: loss_metric.running_value().current(),
        // the metric reports a percentage
        accuracy: acc_metric.running_value().current() / 100.,
    };
    (model, summary)
}

/// Runs the network on a batch and computes the loss against its targets.
pub fn forward_classification<B: Backend>(
    model: &Network<B>,
    loss: LossKind,
    batch: ClassifierBatch<B>,
) -> ClassificationOutput<B> {
    let output = model.forward(batch.images);
    let loss = loss.forward(output.clone(), batch.one_hot, batch.targets.clone());
    ClassificationOutput::new(loss, output, batch.targets)
}
