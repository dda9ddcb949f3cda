use crate::cli::MergeArgs;
use crate::error::Result;
use ensclust::core::io::persistence::artifact_paths;
use ensclust::engine::clustering::Clustering;
use ensclust::engine::partition::PartialMatrix;
use tracing::info;

pub fn run(args: MergeArgs) -> Result<()> {
    let partials = args
        .partials
        .iter()
        .map(|path| {
            info!("Loading partial matrix from {:?}", path);
            PartialMatrix::load(path)
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    println!("Merging {} partial result(s)...", partials.len());
    let mut clustering = Clustering::new();
    clustering.merge(partials)?;
    clustering.persist(&args.output)?;

    let (matrix_path, _) = artifact_paths(&args.output);
    println!(
        "Merged matrix of {} models written to: {}",
        clustering.model_names().len(),
        matrix_path.display()
    );
    Ok(())
}
