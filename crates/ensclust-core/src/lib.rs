//! # ensclust Core Library
//!
//! Permutation-aware structural comparison and clustering for ensembles of sampled
//! macromolecular models.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`LabeledPointSet`, `Ensemble`),
//!   rigid-body geometry (RMSD, best-fit superposition) and on-disk persistence of
//!   distance matrices and partial worker results.
//!
//! - **[`engine`]: The Logic Core.** The correspondence resolver that enumerates
//!   chain-copy permutations, pairwise alignment, partitioning of model pairs across
//!   workers, deterministic merging of partial results, k-means clustering and the
//!   stateful `Clustering` engine with its per-cluster queries.
//!
//! - **[`workflows`]: The Public API.** End-to-end procedures that build, merge and
//!   cluster a whole ensemble in one call and summarize the resulting clusters.
//!
//! The library never reads structure files. Callers supply coordinates that are already
//! materialized in memory, keyed by chain labels of the form `name` or `name..k`.

pub mod core;
pub mod engine;
pub mod workflows;
