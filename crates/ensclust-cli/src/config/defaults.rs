pub struct DefaultsConfig {
    pub num_clusters: usize,
    pub worker_count: usize,
    pub max_iterations: usize,
    pub tolerance: f64,
    pub restarts: usize,
    pub seed: u64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            num_clusters: 10,
            worker_count: 1,
            max_iterations: 300,
            tolerance: 1e-4,
            restarts: 10,
            seed: 42,
        }
    }
}
