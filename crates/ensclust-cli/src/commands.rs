pub mod cluster;
pub mod matrix;
pub mod merge;
pub mod run;
pub mod violations;

use crate::cli::InputArgs;
use crate::error::{CliError, Result};
use crate::input;
use ensclust::engine::clustering::Clustering;
use ensclust::workflows::cluster::ClusterSummary;
use serde::Serialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::info;

const SUMMARY_SUFFIX: &str = ".clusters.csv";
const MEMBER_SEPARATOR: &str = ";";

#[derive(Serialize)]
struct SummaryRow<'a> {
    label: usize,
    size: usize,
    average_rmsd: f64,
    members: &'a str,
}

/// Reads the models (and optional template) named by `args` into a fresh engine.
fn load_clustering(args: &InputArgs) -> Result<Clustering> {
    let mut clustering = Clustering::new();

    if let Some(template_path) = &args.template {
        info!("Loading template from {:?}", template_path);
        clustering.set_template(input::read_template(template_path)?);
    }

    info!("Loading models from {:?}", &args.input);
    let models = input::read_models(&args.input)?;
    if models.is_empty() {
        return Err(CliError::parsing(
            &args.input,
            anyhow::anyhow!("no models found"),
        ));
    }
    for (name, coordinates) in models {
        clustering.fill(name, coordinates)?;
    }
    info!(models = clustering.model_names().len(), "Models loaded.");
    Ok(clustering)
}

/// `<base>.clusters.csv`
fn summary_path(base: &Path) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(SUMMARY_SUFFIX);
    PathBuf::from(name)
}

fn write_summaries(path: &Path, summaries: &[ClusterSummary]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| CliError::parsing(path, e))?;
    for summary in summaries {
        let members = summary.members.join(MEMBER_SEPARATOR);
        writer
            .serialize(SummaryRow {
                label: summary.label,
                size: summary.size,
                average_rmsd: summary.average_rmsd,
                members: &members,
            })
            .map_err(|e| CliError::parsing(path, e))?;
    }
    writer.flush()?;
    Ok(())
}

fn print_summaries(summaries: &[ClusterSummary]) {
    println!("{:>7}  {:>6}  {:>12}  first member", "cluster", "size", "avg RMSD");
    for summary in summaries {
        println!(
            "{:>7}  {:>6}  {:>12.4}  {}",
            summary.label,
            summary.size,
            summary.average_rmsd,
            summary.members.first().map_or("-", String::as_str)
        );
    }
}
