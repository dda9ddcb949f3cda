use super::config::KMeansConfig;
use super::error::AnalysisError;
use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

/// Result of one k-means run over the rows of a data matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansOutcome {
    /// Cluster label of every row, numbered `0..m` by first appearance.
    pub labels: Vec<usize>,
    /// Sum of squared distances from each row to its centroid.
    pub inertia: f64,
}

impl KMeansOutcome {
    pub fn cluster_count(&self) -> usize {
        self.labels.iter().max().map_or(0, |&max| max + 1)
    }
}

/// Partitions the rows of `data` into at most `k` clusters.
///
/// Each of `config.restarts` runs is seeded with k-means++ from its own deterministic RNG
/// stream and refined with Lloyd iterations; the run with the lowest inertia is kept.
/// A `k` larger than the number of rows is clamped. Clusters that end up empty are
/// dropped, so the outcome may hold fewer than `k` labels, but every row is labelled.
///
/// # Errors
///
/// * [`AnalysisError::InvalidClusterCount`] if `k` is zero.
/// * [`AnalysisError::EmptyEnsemble`] if `data` has no rows.
pub fn k_means(
    data: &DMatrix<f64>,
    k: usize,
    config: &KMeansConfig,
) -> Result<KMeansOutcome, AnalysisError> {
    if k == 0 {
        return Err(AnalysisError::InvalidClusterCount(k));
    }
    let n_samples = data.nrows();
    if n_samples == 0 {
        return Err(AnalysisError::EmptyEnsemble);
    }
    let k = if k > n_samples {
        warn!(
            requested = k,
            models = n_samples,
            "Requested more clusters than models; clamping."
        );
        n_samples
    } else {
        k
    };

    let mut best: Option<(Vec<usize>, f64)> = None;
    for restart in 0..config.restarts.max(1) {
        let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(restart as u64));
        let centroids = seed_centroids(data, k, &mut rng);
        let (labels, inertia, iterations) = lloyd(data, centroids, config);
        debug!(restart, inertia, iterations, "k-means run finished.");
        if best.as_ref().is_none_or(|(_, best_inertia)| inertia < *best_inertia) {
            best = Some((labels, inertia));
        }
    }

    let (labels, inertia) = best.ok_or(AnalysisError::InvalidClusterCount(k))?;
    let labels = relabel_by_first_appearance(&labels);
    let outcome = KMeansOutcome { labels, inertia };
    let found = outcome.cluster_count();
    if found < k {
        warn!(
            requested = k,
            found, "Empty clusters were dropped; fewer clusters than requested."
        );
    }
    Ok(outcome)
}

/// k-means++ seeding: the first centroid is a uniformly random row, each further one is
/// drawn with probability proportional to its squared distance from the nearest chosen
/// centroid. When every remaining weight is zero an unchosen row is picked uniformly.
fn seed_centroids(data: &DMatrix<f64>, k: usize, rng: &mut StdRng) -> DMatrix<f64> {
    let n_samples = data.nrows();
    let mut chosen = Vec::with_capacity(k);
    chosen.push(rng.gen_range(0..n_samples));

    let mut nearest: Vec<f64> = (0..n_samples)
        .map(|i| row_distance_squared(data, i, data, chosen[0]))
        .collect();

    while chosen.len() < k {
        let total: f64 = nearest.iter().sum();
        let next = if total > 0.0 {
            let target = rng.gen_range(0.0..total);
            let mut cumulative = 0.0;
            nearest
                .iter()
                .position(|&w| {
                    cumulative += w;
                    cumulative > target
                })
                .or_else(|| nearest.iter().rposition(|&w| w > 0.0))
                .unwrap_or(0)
        } else {
            let unchosen: Vec<usize> = (0..n_samples).filter(|i| !chosen.contains(i)).collect();
            unchosen[rng.gen_range(0..unchosen.len())]
        };
        chosen.push(next);
        for (i, weight) in nearest.iter_mut().enumerate() {
            *weight = weight.min(row_distance_squared(data, i, data, next));
        }
    }

    let mut centroids = DMatrix::zeros(k, data.ncols());
    for (c, &row) in chosen.iter().enumerate() {
        centroids.row_mut(c).copy_from(&data.row(row));
    }
    centroids
}

/// Lloyd iterations until the labels stop changing, the largest centroid shift drops to
/// the tolerance, or the iteration cap is hit. Returns labels, inertia and iterations run.
fn lloyd(
    data: &DMatrix<f64>,
    mut centroids: DMatrix<f64>,
    config: &KMeansConfig,
) -> (Vec<usize>, f64, usize) {
    let (n_samples, n_features) = data.shape();
    let k = centroids.nrows();
    let mut labels = assign(data, &centroids);
    let mut iterations = 0;

    while iterations < config.max_iterations {
        iterations += 1;

        let mut sums = DMatrix::zeros(k, n_features);
        let mut counts = vec![0usize; k];
        for (sample, &label) in labels.iter().enumerate().take(n_samples) {
            let mut row = sums.row_mut(label);
            row += data.row(sample);
            counts[label] += 1;
        }

        let mut max_shift: f64 = 0.0;
        for cluster in 0..k {
            // An empty cluster keeps its previous centroid.
            if counts[cluster] == 0 {
                continue;
            }
            let mean = sums.row(cluster) / counts[cluster] as f64;
            max_shift = max_shift.max((&mean - centroids.row(cluster)).norm());
            centroids.row_mut(cluster).copy_from(&mean);
        }

        let next_labels = assign(data, &centroids);
        let converged = next_labels == labels || max_shift <= config.tolerance;
        labels = next_labels;
        if converged {
            break;
        }
    }

    let inertia = labels
        .iter()
        .enumerate()
        .map(|(sample, &label)| row_distance_squared(data, sample, &centroids, label))
        .sum();
    (labels, inertia, iterations)
}

/// Nearest centroid of every row; ties go to the lowest centroid index.
fn assign(data: &DMatrix<f64>, centroids: &DMatrix<f64>) -> Vec<usize> {
    (0..data.nrows())
        .map(|sample| {
            let mut best_cluster = 0;
            let mut min_distance = f64::INFINITY;
            for cluster in 0..centroids.nrows() {
                let distance = row_distance_squared(data, sample, centroids, cluster);
                if distance < min_distance {
                    min_distance = distance;
                    best_cluster = cluster;
                }
            }
            best_cluster
        })
        .collect()
}

fn row_distance_squared(a: &DMatrix<f64>, row_a: usize, b: &DMatrix<f64>, row_b: usize) -> f64 {
    a.row(row_a)
        .iter()
        .zip(b.row(row_b).iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum()
}

fn relabel_by_first_appearance(labels: &[usize]) -> Vec<usize> {
    let mut mapping: Vec<Option<usize>> = Vec::new();
    let mut next = 0;
    labels
        .iter()
        .map(|&label| {
            if label >= mapping.len() {
                mapping.resize(label + 1, None);
            }
            *mapping[label].get_or_insert_with(|| {
                next += 1;
                next - 1
            })
        })
        .collect()
}
