use super::load_clustering;
use crate::cli::MatrixArgs;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use ensclust::engine::progress::{Progress, ProgressReporter};
use tracing::info;

pub fn run(args: MatrixArgs) -> Result<()> {
    if args.worker_count == 0 || args.worker_id >= args.worker_count {
        return Err(CliError::Argument(format!(
            "worker id {} is out of range for {} worker(s)",
            args.worker_id, args.worker_count
        )));
    }
    let clustering = load_clustering(&args.input)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Computing partition {} of {}...",
        args.worker_id + 1,
        args.worker_count
    );
    reporter.report(Progress::PhaseStart {
        name: "Pairwise Distances",
    });
    let partial =
        clustering.build_distance_matrix(args.worker_count, args.worker_id, &reporter)?;
    reporter.report(Progress::PhaseFinish);

    partial.save(&args.output)?;
    info!(pairs = partial.len(), path = ?args.output, "Saved partial matrix.");
    println!(
        "{} pair(s) written to: {}",
        partial.len(),
        args.output.display()
    );
    Ok(())
}
