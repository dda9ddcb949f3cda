use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileClusteringConfig {
    pub num_clusters: Option<usize>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileDistributionConfig {
    pub worker_count: Option<usize>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileKMeansConfig {
    pub max_iterations: Option<usize>,
    pub tolerance: Option<f64>,
    pub restarts: Option<usize>,
    pub seed: Option<u64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub clustering: Option<FileClusteringConfig>,
    pub distribution: Option<FileDistributionConfig>,
    pub kmeans: Option<FileKMeansConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::parsing(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn parses_every_section() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
            [clustering]
            num-clusters = 4

            [distribution]
            worker-count = 8

            [kmeans]
            max-iterations = 50
            tolerance = 1e-6
            restarts = 3
            seed = 7
            "#,
        )
        .unwrap();

        let config = FileConfig::from_file(&path).unwrap();

        assert_eq!(config.clustering.unwrap().num_clusters, Some(4));
        assert_eq!(config.distribution.unwrap().worker_count, Some(8));
        let kmeans = config.kmeans.unwrap();
        assert_eq!(kmeans.max_iterations, Some(50));
        assert_eq!(kmeans.tolerance, Some(1e-6));
        assert_eq!(kmeans.restarts, Some(3));
        assert_eq!(kmeans.seed, Some(7));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[clustering]\nclusters = 4\n").unwrap();

        let result = FileConfig::from_file(&path);

        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "").unwrap();

        let config = FileConfig::from_file(&path).unwrap();

        assert!(config.clustering.is_none());
        assert!(config.distribution.is_none());
        assert!(config.kmeans.is_none());
    }
}
