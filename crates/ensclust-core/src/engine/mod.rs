//! # Engine Module
//!
//! The analysis engine: permutation-aware comparison of labeled point sets, distributed
//! construction of the pairwise distance matrix, and clustering over that matrix.
//!
//! ## Overview
//!
//! Two models are compared by searching every correspondence between their chain labels
//! that permutes interchangeable copies of the same chain. The [`clustering::Clustering`]
//! engine runs that comparison over all model pairs of an ensemble, optionally after
//! aligning each model onto a shared template, and clusters the resulting matrix.
//!
//! ## Architecture
//!
//! - **Correspondences** ([`correspondence`]) - Lazy, restartable enumeration of label mappings
//! - **Alignment** ([`alignment`]) - Minimum RMSD and best superposition over correspondences
//! - **Partitioning** ([`partition`]) - Static pair partitioning and the deterministic merge
//! - **Matrices** ([`matrix`]) - The distance matrix and the per-pair transformation table
//! - **Clustering** ([`clustering`], [`kmeans`]) - The stateful engine and k-means over matrix rows
//! - **Violations** ([`violations`]) - Running tally of restraint scores above their thresholds
//! - **Configuration** ([`config`]) - Validated clustering and k-means parameters
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events
//! - **Error Handling** ([`error`]) - The analysis error taxonomy
//!
//! ## Distribution
//!
//! The engine never spawns workers. A worker computes its own [`partition::PartialMatrix`]
//! from `(worker_count, worker_id)`; any substrate (rayon threads, separate processes, a
//! batch scheduler) may run the workers, and [`partition::merge`] gathers their results.

pub mod alignment;
pub mod clustering;
pub mod config;
pub mod correspondence;
pub mod error;
pub mod kmeans;
pub mod matrix;
pub mod partition;
pub mod progress;
pub mod violations;
