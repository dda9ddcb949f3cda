//! # Core Module
//!
//! Fundamental building blocks shared by the analysis engine.
//!
//! ## Architecture
//!
//! - **Models** ([`models`]) - Chain labels, labeled point sets, ensembles and rigid transforms
//! - **Geometry** ([`utils`]) - RMSD and optimal rigid superposition of ordered point sequences
//! - **Persistence** ([`io`]) - Durable storage of distance matrices, transformation tables
//!   and partial worker results
//!
//! Nothing in this module holds mutable analysis state; the stateful pieces live in
//! [`crate::engine`].

pub mod io;
pub mod models;
pub mod utils;
