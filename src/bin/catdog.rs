use burn_classifier_bench::{benchmarks, logging, prelude::*};

fn main() -> anyhow::Result<()> {
    let app_args = AppArgs::parse()?;
    logging::init(app_args.verbose);
    let default_experiment =
        benchmarks::resolve(app_args.benchmark.as_deref(), benchmarks::catdog_conv)?;
    launch::<MainAutoBackend>(&app_args, env!("CARGO_BIN_NAME"), default_experiment)?;
    Ok(())
}
