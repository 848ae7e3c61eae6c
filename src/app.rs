use crate::artifacts::Artifacts;
use crate::backend::MainDevice;
use crate::cli::{AppArgs, HELP};
use crate::config::ExperimentConfig;
use crate::data::{LabelledDataSet, create_data_loader};
use crate::error::{Error, Result};
use crate::evaluation::{EvalReport, evaluate};
use crate::model::Network;
use crate::training::train;
use burn::module::AutodiffModule;
use burn::tensor::backend::AutodiffBackend;
use std::path::Path;
use std::time::Instant;

/// Runs whatever `args` asks for, falling back to `default_experiment` when no
/// experiment config is given or saved.
///
/// Returns the evaluation report, if an evaluation ran.
pub fn launch<AutoB>(
    args: &AppArgs,
    bin_name: &str,
    default_experiment: fn() -> ExperimentConfig,
) -> Result<Option<EvalReport>>
where
    AutoB: AutodiffBackend + MainDevice,
{
    if args.help || !args.has_action() {
        if !args.help {
            println!("neither training, evaluation nor config generation were enabled");
        }
        println!("{HELP}");
        return Ok(None);
    }

    if args.gen_config {
        println!("{}", default_experiment().to_json_pretty()?);
        if !args.training && !args.eval {
            return Ok(None);
        }
    }

    let started = Instant::now();
    let artifacts = match &args.artifacts_path {
        Some(path) => Artifacts::new(path),
        None => {
            // e.g. /tmp/burn-classifier-bench-ocr-abcd-0
            let prefix = format!("{}-{bin_name}-", std::env!("CARGO_PKG_NAME"));
            let artifacts = Artifacts::temporary(&prefix)?;
            println!("new artifacts directory: {:?}", artifacts.dir());
            artifacts
        }
    };
    artifacts.create(args.remove_artifacts && args.training)?;

    let experiment = resolve_experiment(args, &artifacts, default_experiment)?;
    artifacts.save_experiment(&experiment)?;

    let device = AutoB::main_device();
    let mut trained: Option<Network<AutoB::InnerBackend>> = None;

    if args.training {
        let train_set = load_dataset(
            &experiment,
            &experiment.samples.train,
            experiment.training.max_train_samples,
        )?;
        let (model, _summaries) = train::<AutoB>(&experiment, train_set, &device, Some(&artifacts))?;
        trained = Some(model.valid());
    }

    let mut report = None;
    if args.eval {
        let model = match trained {
            Some(model) => model,
            None => artifacts
                .load_model::<AutoB::InnerBackend>(&experiment, &device)?
                .ok_or_else(|| {
                    Error::Artifacts(format!(
                        "no trained model in {:?}, run with --training first",
                        artifacts.dir()
                    ))
                })?,
        };
        let test_set = load_dataset(
            &experiment,
            &experiment.samples.test,
            experiment.training.max_test_samples,
        )?;
        let eval_report = evaluate(
            &model,
            experiment.training.loss,
            &experiment.data,
            &test_set,
            experiment.training.batch_size,
            &device,
        )?;
        println!("{eval_report}");
        report = Some(eval_report);
    }

    tracing::info!("Running time: {:.2?}", started.elapsed());
    Ok(report)
}

/// The experiment from `--config`, else the saved one, else the default, with the
/// sample path overrides applied.
fn resolve_experiment(
    args: &AppArgs,
    artifacts: &Artifacts,
    default_experiment: fn() -> ExperimentConfig,
) -> Result<ExperimentConfig> {
    let mut experiment = match &args.config {
        Some(path) => ExperimentConfig::load_json(path)?,
        None => match artifacts.load_experiment()? {
            Some(experiment) => experiment,
            None => {
                tracing::info!("Using the built-in experiment");
                default_experiment()
            }
        },
    };
    if let Some(path) = &args.train_samples {
        experiment.samples.train = path.to_string_lossy().into_owned();
    }
    if let Some(path) = &args.test_samples {
        experiment.samples.test = path.to_string_lossy().into_owned();
    }
    Ok(experiment)
}

fn load_dataset(
    experiment: &ExperimentConfig,
    samples_path: &str,
    limit: Option<usize>,
) -> Result<LabelledDataSet> {
    tracing::info!("Loading samples from {samples_path:?}");
    let mut loader = create_data_loader(
        &experiment.data_loader,
        Path::new(samples_path),
        &experiment.data,
    )?;
    let dataset = LabelledDataSet::load(loader.as_mut(), &experiment.data.classes, limit)?;
    let per_class: Vec<_> = dataset
        .classes()
        .iter()
        .zip(dataset.class_counts())
        .map(|(class, count)| format!("{class}: {count}"))
        .collect();
    tracing::info!(
        "Loaded {} samples ({})",
        dataset.items().len(),
        per_class.join(", ")
    );
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmarks;
    use std::path::PathBuf;

    #[test]
    fn config_file_takes_precedence_over_saved_experiment() {
        let tmp = temp_dir::TempDir::new().unwrap();
        let artifacts = Artifacts::new(tmp.path().join("artifacts"));
        artifacts.create(false).unwrap();
        artifacts.save_experiment(&benchmarks::ocr_dense()).unwrap();

        let config_path = tmp.path().join("catdog.json");
        benchmarks::catdog_conv().save_json(&config_path).unwrap();

        let args = AppArgs {
            config: Some(config_path),
            ..Default::default()
        };
        let experiment = resolve_experiment(&args, &artifacts, benchmarks::ocr_dense).unwrap();
        assert_eq!(experiment.data.classes, ["cat", "dog"]);

        let args = AppArgs::default();
        let experiment = resolve_experiment(&args, &artifacts, benchmarks::catdog_conv).unwrap();
        assert_eq!(experiment.data.num_classes(), 10);
    }

    #[test]
    fn gen_alone_exits_but_gen_with_eval_continues() {
        let tmp = temp_dir::TempDir::new().unwrap();
        let artifacts_path = tmp.path().join("artifacts");

        let args = AppArgs {
            gen_config: true,
            artifacts_path: Some(artifacts_path.clone()),
            ..Default::default()
        };
        let report =
            launch::<crate::backend::MainAutoBackend>(&args, "test", benchmarks::ocr_dense).unwrap();
        assert!(report.is_none());
        assert!(!artifacts_path.exists());

        // evaluation is attempted after printing the config
        let args = AppArgs {
            gen_config: true,
            eval: true,
            artifacts_path: Some(artifacts_path.clone()),
            ..Default::default()
        };
        let err = launch::<crate::backend::MainAutoBackend>(&args, "test", benchmarks::ocr_dense)
            .unwrap_err();
        assert!(matches!(err, Error::Artifacts(_)), "{err}");
        assert!(Artifacts::new(&artifacts_path).load_experiment().unwrap().is_some());
    }

    #[test]
    fn default_experiment_gets_sample_overrides() {
        let tmp = temp_dir::TempDir::new().unwrap();
        let artifacts = Artifacts::new(tmp.path());
        let args = AppArgs {
            train_samples: Some(PathBuf::from("mine/train.csv")),
            ..Default::default()
        };

        let experiment = resolve_experiment(&args, &artifacts, benchmarks::ocr_dense).unwrap();
        assert_eq!(experiment.samples.train, "mine/train.csv");
        assert_eq!(experiment.samples.test, "data/ocr/test.csv");
    }
}
