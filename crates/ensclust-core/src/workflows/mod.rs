//! # Workflows Module
//!
//! High-level entry points that run a complete analysis over an ensemble.
//!
//! ## Overview
//!
//! A workflow takes a filled [`crate::engine::clustering::Clustering`] engine and a
//! validated configuration, builds every partition of the pairwise distance matrix,
//! merges the partials, clusters the models and summarizes each cluster. Progress is
//! reported through the same [`crate::engine::progress::ProgressReporter`] the engine uses.
//!
//! ## Architecture
//!
//! - **Cluster Workflow** ([`cluster`]) - In-process multi-worker matrix build, merge,
//!   k-means clustering and per-cluster summaries.

pub mod cluster;
