use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "ensclust CLI - Permutation-aware RMSD, distributed distance matrices and clustering for ensembles of structural models.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the full distance matrix in this process, cluster it and write all artifacts.
    Run(RunArgs),
    /// Compute one worker's share of the distance matrix and save it as a partial result.
    Matrix(MatrixArgs),
    /// Merge the partial results of every worker into one persisted distance matrix.
    Merge(MergeArgs),
    /// Cluster a previously persisted distance matrix.
    Cluster(ClusterArgs),
    /// Count restraint scores above their thresholds.
    Violations(ViolationsArgs),
}

/// Coordinate inputs shared by every command that compares models.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// CSV of model coordinates with the header `model,label,x,y,z`.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// CSV of template coordinates (same columns, `model` ignored).
    /// When given, every model is aligned onto the template before comparison.
    #[arg(short, long, value_name = "PATH")]
    pub template: Option<PathBuf>,
}

/// Clustering parameters shared by `run` and `cluster`.
#[derive(Args, Debug, Clone, Default)]
pub struct ClusteringArgs {
    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the number of clusters.
    #[arg(short = 'k', long, value_name = "INT")]
    pub num_clusters: Option<usize>,

    /// Override the k-means random seed.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S kmeans.restarts=20
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub clustering: ClusteringArgs,

    /// Override the number of in-process workers the pairs are split across.
    #[arg(short = 'w', long, value_name = "INT")]
    pub worker_count: Option<usize>,

    /// Base path of the written artifacts
    /// (`<base>.matrix.csv`, `<base>.record.toml`, `<base>.clusters.csv`).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,
}

/// Arguments for the `matrix` subcommand.
#[derive(Args, Debug)]
pub struct MatrixArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Total number of workers the pairs are split across.
    #[arg(long, env = "ENSCLUST_WORKER_COUNT", value_name = "INT")]
    pub worker_count: usize,

    /// Zero-based id of this worker.
    #[arg(long, env = "ENSCLUST_WORKER_ID", value_name = "INT")]
    pub worker_id: usize,

    /// Path of the partial result to write (TOML).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,
}

/// Arguments for the `merge` subcommand.
#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Partial results written by `matrix`, one per worker.
    #[arg(required = true, value_name = "PARTIAL", num_args(1..))]
    pub partials: Vec<PathBuf>,

    /// Base path of the merged matrix artifacts.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,
}

/// Arguments for the `cluster` subcommand.
#[derive(Args, Debug)]
pub struct ClusterArgs {
    /// Base path of a persisted matrix (as written by `run` or `merge`).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub matrix: PathBuf,

    #[command(flatten)]
    pub clustering: ClusteringArgs,

    /// Path of the cluster summary CSV. Defaults to `<matrix>.clusters.csv`.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Arguments for the `violations` subcommand.
#[derive(Args, Debug)]
pub struct ViolationsArgs {
    /// Whitespace-separated `<restraint-name> <threshold>` table.
    #[arg(long, required = true, value_name = "PATH")]
    pub thresholds: PathBuf,

    /// CSV whose header names restraints; one row per scored model.
    #[arg(long, required = true, value_name = "PATH")]
    pub scores: PathBuf,
}
