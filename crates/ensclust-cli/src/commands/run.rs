use super::{load_clustering, print_summaries, summary_path, write_summaries};
use crate::cli::RunArgs;
use crate::config::builder::build_config;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use ensclust::core::io::persistence::artifact_paths;
use ensclust::engine::progress::ProgressReporter;
use ensclust::workflows;
use tracing::info;

pub fn run(args: RunArgs) -> Result<()> {
    let config = build_config(&args.clustering, args.worker_count)?;
    let clustering = load_clustering(&args.input)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Clustering {} models into {} clusters...",
        clustering.model_names().len(),
        config.num_clusters
    );
    info!("Invoking the core clustering workflow...");
    let result = workflows::cluster::run(clustering, &config, &reporter)?;

    result.clustering.persist(&args.output)?;
    let (matrix_path, record_path) = artifact_paths(&args.output);
    let clusters_path = summary_path(&args.output);
    write_summaries(&clusters_path, &result.summaries)?;

    print_summaries(&result.summaries);
    println!("Distance matrix written to: {}", matrix_path.display());
    println!("Record written to: {}", record_path.display());
    println!("Cluster summary written to: {}", clusters_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{ClusteringArgs, InputArgs};
    use ensclust::engine::clustering::Clustering;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn writes_all_artifacts() {
        let dir = tempdir().unwrap();
        let coords = dir.path().join("coords.csv");
        fs::write(
            &coords,
            "model,label,x,y,z\n\
             m1,a,0,0,0\nm1,b,1,0,0\nm1,c,0,1,0\n\
             m2,a,0,0,0\nm2,b,1,0,0\nm2,c,0,1.1,0\n\
             m3,a,0,0,0\nm3,b,4,0,0\nm3,c,0,4,0\n",
        )
        .unwrap();
        let base = dir.path().join("out");

        run(RunArgs {
            input: InputArgs {
                input: coords,
                template: None,
            },
            clustering: ClusteringArgs {
                num_clusters: Some(2),
                ..Default::default()
            },
            worker_count: Some(2),
            output: base.clone(),
        })
        .unwrap();

        let mut restored = Clustering::new();
        restored.restore(&base).unwrap();
        assert_eq!(restored.model_names(), ["m1", "m2", "m3"]);
        assert_eq!(restored.number_of_clusters().unwrap(), 2);

        let summary = fs::read_to_string(summary_path(&base)).unwrap();
        assert_eq!(summary.lines().count(), 3);
    }
}
