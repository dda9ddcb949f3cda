use crate::engine::clustering::Clustering;
use crate::engine::config::ClusteringConfig;
use crate::engine::error::AnalysisError;
use crate::engine::partition::PartialMatrix;
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::{info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Per-cluster statistics, as reported to users.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSummary {
    pub label: usize,
    pub size: usize,
    pub average_rmsd: f64,
    /// Member model names in model order; the first one is the cluster's reference.
    pub members: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ClusteringResult {
    pub clustering: Clustering,
    pub summaries: Vec<ClusterSummary>,
}

/// Builds, merges and clusters the full distance matrix of a filled engine.
#[instrument(skip_all, name = "cluster_workflow")]
pub fn run(
    mut clustering: Clustering,
    config: &ClusteringConfig,
    reporter: &ProgressReporter,
) -> Result<ClusteringResult, AnalysisError> {
    info!(
        models = clustering.ensemble().len(),
        workers = config.worker_count,
        clusters = config.num_clusters,
        template = clustering.template().is_some(),
        "Starting clustering workflow."
    );

    // === Phase 1: Pairwise distances ===
    reporter.report(Progress::PhaseStart {
        name: "Pairwise Distances",
    });
    let partials = build_partitions(&clustering, config.worker_count, reporter)?;
    clustering.merge(partials)?;
    reporter.report(Progress::PhaseFinish);

    // === Phase 2: Clustering ===
    reporter.report(Progress::PhaseStart { name: "Clustering" });
    clustering.cluster(config.num_clusters, &config.kmeans)?;
    let summaries = summarize(&clustering)?;
    reporter.report(Progress::PhaseFinish);

    info!(
        clusters = summaries.len(),
        "Workflow complete. Largest cluster has {} model(s).",
        summaries.first().map_or(0, |s| s.size)
    );
    Ok(ClusteringResult {
        clustering,
        summaries,
    })
}

/// Computes every partition of the matrix; partitions run concurrently on the rayon pool
/// when the `parallel` feature is enabled.
///
/// The first failing partition's error is returned and no partials are kept.
pub fn build_partitions(
    clustering: &Clustering,
    worker_count: usize,
    reporter: &ProgressReporter,
) -> Result<Vec<PartialMatrix>, AnalysisError> {
    #[cfg(not(feature = "parallel"))]
    let workers = 0..worker_count;

    #[cfg(feature = "parallel")]
    let workers = (0..worker_count).into_par_iter();

    workers
        .map(|worker_id| clustering.build_distance_matrix(worker_count, worker_id, reporter))
        .collect()
}

/// One summary per cluster, largest first, ties broken by label.
pub fn summarize(clustering: &Clustering) -> Result<Vec<ClusterSummary>, AnalysisError> {
    let mut summaries = clustering
        .cluster_labels()?
        .into_iter()
        .map(|label| {
            Ok(ClusterSummary {
                label,
                size: clustering.cluster_size(label)?,
                average_rmsd: clustering.cluster_average_rmsd(label)?,
                members: clustering
                    .cluster_member_names(label)?
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            })
        })
        .collect::<Result<Vec<_>, AnalysisError>>()?;
    summaries.sort_by(|a, b| b.size.cmp(&a.size).then(a.label.cmp(&b.label)));
    Ok(summaries)
}
