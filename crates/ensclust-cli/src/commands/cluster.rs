use super::{print_summaries, summary_path, write_summaries};
use crate::cli::ClusterArgs;
use crate::config::builder::build_config;
use crate::error::Result;
use ensclust::engine::clustering::Clustering;
use ensclust::workflows::cluster::summarize;
use tracing::info;

pub fn run(args: ClusterArgs) -> Result<()> {
    let config = build_config(&args.clustering, None)?;

    info!("Restoring distance matrix from {:?}", &args.matrix);
    let mut clustering = Clustering::new();
    clustering.restore(&args.matrix)?;

    println!(
        "Clustering {} models into {} clusters...",
        clustering.model_names().len(),
        config.num_clusters
    );
    let found = clustering.cluster(config.num_clusters, &config.kmeans)?;
    info!(clusters = found, "Clustering finished.");

    // Re-persist so the record carries the new assignment.
    clustering.persist(&args.matrix)?;

    let summaries = summarize(&clustering)?;
    let clusters_path = args
        .output
        .unwrap_or_else(|| summary_path(&args.matrix));
    write_summaries(&clusters_path, &summaries)?;

    print_summaries(&summaries);
    println!("Cluster summary written to: {}", clusters_path.display());
    Ok(())
}
