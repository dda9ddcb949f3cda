//! Numeric helpers for ordered point sequences.

pub mod geometry;
