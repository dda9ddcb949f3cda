//! Data models for ensembles of labeled coordinate sets.
//!
//! - [`label`] - Parsing of `name` / `name..k` chain labels into bare name and copy index
//! - [`point_set`] - [`point_set::LabeledPointSet`], the per-model mapping from label to points
//! - [`ensemble`] - [`ensemble::Ensemble`], the ordered collection of named models
//! - [`transform`] - Rigid transformations and their compact, serializable form

pub mod ensemble;
pub mod label;
pub mod point_set;
pub mod transform;
