use super::defaults::DefaultsConfig;
use super::file::FileConfig;
use crate::cli::ClusteringArgs;
use crate::error::{CliError, Result};
use ensclust::engine::config::{ClusteringConfig, ClusteringConfigBuilder, KMeansConfigBuilder};
use std::str::FromStr;

/// Resolves the clustering configuration: CLI flags over `--set` values over the config
/// file over built-in defaults.
pub fn build_config(args: &ClusteringArgs, worker_count: Option<usize>) -> Result<ClusteringConfig> {
    let defaults = DefaultsConfig::default();

    let file_config = if let Some(config_path) = &args.config {
        FileConfig::from_file(config_path)?
    } else {
        FileConfig::default()
    };
    let file_config = apply_set_values(file_config, &args.set_values)?;

    let clustering_file = file_config.clustering.unwrap_or_default();
    let distribution_file = file_config.distribution.unwrap_or_default();
    let kmeans_file = file_config.kmeans.unwrap_or_default();

    let kmeans = KMeansConfigBuilder::new()
        .max_iterations(kmeans_file.max_iterations.unwrap_or(defaults.max_iterations))
        .tolerance(kmeans_file.tolerance.unwrap_or(defaults.tolerance))
        .restarts(kmeans_file.restarts.unwrap_or(defaults.restarts))
        .seed(args.seed.or(kmeans_file.seed).unwrap_or(defaults.seed))
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    ClusteringConfigBuilder::new()
        .num_clusters(
            args.num_clusters
                .or(clustering_file.num_clusters)
                .unwrap_or(defaults.num_clusters),
        )
        .worker_count(
            worker_count
                .or(distribution_file.worker_count)
                .unwrap_or(defaults.worker_count),
        )
        .kmeans(kmeans)
        .build()
        .map_err(|e| CliError::Config(e.to_string()))
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let Some((key, value_str)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };

        match key {
            "clustering.num-clusters" => {
                config
                    .clustering
                    .get_or_insert_with(Default::default)
                    .num_clusters = Some(parse_value(key, value_str)?);
            }
            "distribution.worker-count" => {
                config
                    .distribution
                    .get_or_insert_with(Default::default)
                    .worker_count = Some(parse_value(key, value_str)?);
            }
            "kmeans.max-iterations" => {
                config.kmeans.get_or_insert_with(Default::default).max_iterations =
                    Some(parse_value(key, value_str)?);
            }
            "kmeans.tolerance" => {
                config.kmeans.get_or_insert_with(Default::default).tolerance =
                    Some(parse_value(key, value_str)?);
            }
            "kmeans.restarts" => {
                config.kmeans.get_or_insert_with(Default::default).restarts =
                    Some(parse_value(key, value_str)?);
            }
            "kmeans.seed" => {
                config.kmeans.get_or_insert_with(Default::default).seed =
                    Some(parse_value(key, value_str)?);
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}

fn parse_value<T: FromStr>(key: &str, value_str: &str) -> Result<T> {
    value_str
        .trim()
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid value for {}: {}", key, value_str)))
}
