use clap::{Args, Parser, Subcommand};
use mlpforge::engine::config::DisplacementStyle;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "MLPForge Developers",
    version,
    about = "MLPForge CLI - perturbation sampling and quality control of atomic configurations for machine-learned interatomic potential datasets.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output and progress bars
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Number of threads for the per-frame quality-control checks.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate perturbed structures from a base structure by rejection sampling.
    Sample(SampleArgs),
    /// Filter labeled frames by atomic overlap, force magnitude and energy outliers.
    Qc(QcArgs),
}

/// Arguments for the `sample` subcommand.
#[derive(Args, Debug, Default)]
pub struct SampleArgs {
    /// Base structure in extended XYZ format (the first frame is used).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Output file for the accepted structures (extended XYZ).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Number of structures to generate.
    #[arg(short = 'n', long = "count", value_name = "INT")]
    pub target_count: Option<usize>,

    /// Optional configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Sampler Overrides ---
    /// Attempts allowed per requested structure.
    #[arg(long, value_name = "INT")]
    pub attempt_multiplier: Option<usize>,

    /// Scale applied to the summed radii of every atom pair.
    #[arg(long, value_name = "FLOAT")]
    pub threshold_factor: Option<f64>,

    /// Seed for reproducible sampling. Omit for a random seed.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// TOML file with a `[radii]` table replacing the built-in covalent radii.
    #[arg(long, value_name = "PATH")]
    pub radii: Option<PathBuf>,

    // --- Perturbation Overrides ---
    /// Maximum relative cell strain per component.
    #[arg(long, value_name = "FLOAT")]
    pub cell_pert_fraction: Option<f64>,

    /// Atomic displacement distance in Å.
    #[arg(long, value_name = "FLOAT")]
    pub atom_pert_distance: Option<f64>,

    /// Atomic displacement style: normal, uniform or const.
    #[arg(long, value_name = "STYLE")]
    pub atom_pert_style: Option<DisplacementStyle>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S perturbation.atom-pert-distance=0.05
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `qc` subcommand.
#[derive(Args, Debug, Default)]
pub struct QcArgs {
    /// Labeled input files in extended XYZ format. Unreadable files are skipped.
    #[arg(short, long = "input", required = true, num_args(1..), value_name = "PATH")]
    pub inputs: Vec<PathBuf>,

    /// Output file for the retained frames (extended XYZ).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Optional configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory for `qc_rejected_log.txt` and `qc_summary.txt`.
    #[arg(long, value_name = "DIR")]
    pub report_dir: Option<PathBuf>,

    // --- Threshold Overrides ---
    /// Minimum allowed interatomic distance in Å.
    #[arg(long, value_name = "FLOAT")]
    pub min_distance: Option<f64>,

    /// Maximum allowed absolute force component in eV/Å.
    #[arg(long, value_name = "FLOAT")]
    pub max_force: Option<f64>,

    /// Z-score above which a per-atom energy is an outlier.
    #[arg(long, value_name = "FLOAT")]
    pub sigma_n: Option<f64>,

    /// Labeled reference set providing the energy baseline instead of the input itself.
    #[arg(long, value_name = "PATH")]
    pub reference: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S qc.sigma-n=4
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}
