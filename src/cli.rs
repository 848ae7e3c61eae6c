use crate::error::{Error, Result};
use std::ffi::OsString;
use std::path::PathBuf;

pub const HELP: &str = "\
Burn Classifier Bench

Trains and/or evaluates small image classifiers (dense or convolutional networks)
with stochastic gradient descent, then prints the test loss and accuracy.
The experiment config, model weights and optimizer state are persisted in an artifacts directory.

USAGE:
    <binary> [OPTIONS]

When no --training, --eval or --gen flag is provided, this help is printed.

BEHAVIOR OVERVIEW
- The experiment config describes the data (classes, shape, normalization), the data loader,
  the network layers, the training hyperparameters and the sample paths.
- If --config is given, the experiment is loaded from that file and saved to the artifacts directory
  (overwriting any existing file). Otherwise it is loaded from the artifacts directory, and if absent
  the binary's built-in experiment is used and saved.
- With --remove-artifacts, any existing model and optimizer files in the artifacts directory are
  deleted before training (if --training is active).
- If both --training and --eval are specified, training executes first, followed by evaluation of the
  trained model on the test samples.

FLAGS:
    -h, --help                  Show this help message and exit
    -v, --verbose               Log per-batch progress

OPTIONS:
    -t, --training              Train the network on the train samples
    -e, --eval                  Evaluate the network on the test samples and print the loss and accuracy
    -g, --gen                   Print the built-in experiment config. Exits afterwards unless
                                --training or --eval is also given, in which case they run next
    -b, --benchmark <NAME>      Built-in experiment to use when no config is given or saved:
                                ocr (dense, csv digits) or catdog (convolutional, image folders).
                                Defaults to the binary's own benchmark
    -r, --remove-artifacts      Delete existing model and optimizer files from the artifacts directory
                                before training (has no effect if --training is not used)
    -c, --config <PATH>         Load the experiment config from this file
    -a, --artifacts-path <PATH>
                                Directory where the experiment config, model weights and optimizer state
                                are saved and loaded. If the directory does not exist, it will be created.
                                Defaults to a newly created temporary directory (path will be printed).
    --train-samples <PATH>      Override the train samples path of the experiment
    --test-samples <PATH>       Override the test samples path of the experiment
";

#[derive(Debug, Default, PartialEq)]
pub struct AppArgs {
    pub help: bool,
    pub verbose: bool,
    pub training: bool,
    pub eval: bool,
    pub gen_config: bool,
    pub remove_artifacts: bool,
    pub config: Option<PathBuf>,
    /// Name of a built-in experiment.
    pub benchmark: Option<String>,
    /// When absent, a temporary directory is created.
    pub artifacts_path: Option<PathBuf>,
    pub train_samples: Option<PathBuf>,
    pub test_samples: Option<PathBuf>,
}

impl AppArgs {
    pub fn parse() -> Result<Self> {
        Self::parse_from(std::env::args_os().skip(1).collect())
    }

    pub fn parse_from(args: Vec<OsString>) -> Result<Self> {
        let mut pargs = pico_args::Arguments::from_vec(args);

        let args = AppArgs {
            help: pargs.contains(["-h", "--help"]),
            config: pargs
                .opt_value_from_os_str(["-c", "--config"], parse_path)
                .map_err(usage)?,
            benchmark: pargs
                .opt_value_from_str(["-b", "--benchmark"])
                .map_err(usage)?,
            artifacts_path: pargs
                .opt_value_from_os_str(["-a", "--artifacts-path"], parse_path)
                .map_err(usage)?,
            train_samples: pargs
                .opt_value_from_os_str("--train-samples", parse_path)
                .map_err(usage)?,
            test_samples: pargs
                .opt_value_from_os_str("--test-samples", parse_path)
                .map_err(usage)?,
            // must parse flags after values
            verbose: pargs.contains(["-v", "--verbose"]),
            training: pargs.contains(["-t", "--training"]),
            eval: pargs.contains(["-e", "--eval"]),
            gen_config: pargs.contains(["-g", "--gen"]),
            remove_artifacts: pargs.contains(["-r", "--remove-artifacts"]),
        };

        let remaining = pargs.finish();
        if !remaining.is_empty() {
            return Err(Error::Usage(format!("unused arguments: {remaining:?}")));
        }

        Ok(args)
    }

    /// Whether anything besides printing the help was requested.
    pub fn has_action(&self) -> bool {
        self.training || self.eval || self.gen_config
    }
}

fn parse_path(s: &std::ffi::OsStr) -> std::result::Result<PathBuf, &'static str> {
    Ok(s.into())
}

fn usage(e: pico_args::Error) -> Error {
    Error::Usage(e.to_string())
}
