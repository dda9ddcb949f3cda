use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct KMeansConfig {
    pub max_iterations: usize,
    pub tolerance: f64,
    pub restarts: usize,
    pub seed: u64,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            max_iterations: 300,
            tolerance: 1e-4,
            restarts: 10,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClusteringConfig {
    pub num_clusters: usize,
    pub worker_count: usize,
    pub kmeans: KMeansConfig,
}

#[derive(Default)]
pub struct KMeansConfigBuilder {
    max_iterations: Option<usize>,
    tolerance: Option<f64>,
    restarts: Option<usize>,
    seed: Option<u64>,
}

impl KMeansConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = Some(iterations);
        self
    }
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }
    pub fn restarts(mut self, restarts: usize) -> Self {
        self.restarts = Some(restarts);
        self
    }
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> Result<KMeansConfig, ConfigError> {
        let config = KMeansConfig {
            max_iterations: self
                .max_iterations
                .ok_or(ConfigError::MissingParameter("max_iterations"))?,
            tolerance: self
                .tolerance
                .ok_or(ConfigError::MissingParameter("tolerance"))?,
            restarts: self
                .restarts
                .ok_or(ConfigError::MissingParameter("restarts"))?,
            seed: self.seed.ok_or(ConfigError::MissingParameter("seed"))?,
        };
        validate_kmeans(&config)?;
        Ok(config)
    }
}

#[derive(Default)]
pub struct ClusteringConfigBuilder {
    num_clusters: Option<usize>,
    worker_count: Option<usize>,
    kmeans: Option<KMeansConfig>,
}

impl ClusteringConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_clusters(mut self, k: usize) -> Self {
        self.num_clusters = Some(k);
        self
    }
    pub fn worker_count(mut self, count: usize) -> Self {
        self.worker_count = Some(count);
        self
    }
    pub fn kmeans(mut self, kmeans: KMeansConfig) -> Self {
        self.kmeans = Some(kmeans);
        self
    }

    pub fn build(self) -> Result<ClusteringConfig, ConfigError> {
        let num_clusters = self
            .num_clusters
            .ok_or(ConfigError::MissingParameter("num_clusters"))?;
        if num_clusters == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "num_clusters",
                reason: "must be at least 1".to_string(),
            });
        }
        let worker_count = self
            .worker_count
            .ok_or(ConfigError::MissingParameter("worker_count"))?;
        if worker_count == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "worker_count",
                reason: "must be at least 1".to_string(),
            });
        }
        let kmeans = self.kmeans.unwrap_or_default();
        validate_kmeans(&kmeans)?;

        Ok(ClusteringConfig {
            num_clusters,
            worker_count,
            kmeans,
        })
    }
}

fn validate_kmeans(config: &KMeansConfig) -> Result<(), ConfigError> {
    if config.max_iterations == 0 {
        return Err(ConfigError::InvalidParameter {
            name: "max_iterations",
            reason: "must be at least 1".to_string(),
        });
    }
    if config.restarts == 0 {
        return Err(ConfigError::InvalidParameter {
            name: "restarts",
            reason: "must be at least 1".to_string(),
        });
    }
    if !(config.tolerance >= 0.0 && config.tolerance.is_finite()) {
        return Err(ConfigError::InvalidParameter {
            name: "tolerance",
            reason: format!("{} is not a finite non-negative number", config.tolerance),
        });
    }
    Ok(())
}
