use std::path::PathBuf;

use clap::{Parser, ValueHint};
use clap_complete::Shell;

#[derive(Parser, Debug)]
#[clap(author, version, about = "a first-order performance and energy estimator for AI accelerators", long_about = None, trailing_var_arg = true)]
pub struct Args {
    /// Generate completion for the given shell
    #[clap(long = "generate", short = 'g', value_enum)]
    pub generator: Option<Shell>,
    /// estimate every method, or run the pruning sweep
    #[clap(long = "run-mode", short = 'r', value_enum)]
    pub run_mode: Option<RunMode>,
    /// write the charts to this directory, overrides `plot_dir` in the config
    #[clap(long = "plot-dir", value_parser, value_hint = ValueHint::DirPath)]
    pub plot_dir: Option<PathBuf>,
    /// the config files, later ones override earlier ones, default is "configs/default.toml"
    #[clap(value_parser, value_hint = ValueHint::FilePath)]
    pub config_file: Vec<PathBuf>,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum RunMode {
    Estimate,
    Sweep,
}
