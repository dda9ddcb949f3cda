//! Durable storage for analysis results.
//!
//! A saved matrix consists of two companion artifacts: a headerless CSV holding the raw
//! symmetric matrix and a TOML record holding the model order, optional cluster
//! assignment and the transformation table reduced to quaternion/translation tuples.
//! Partial worker results are stored as a single TOML record each.

pub mod persistence;
