//! Static partitioning of model pairs across workers and the merge of their results.
//!
//! All unordered pairs `(i, j)` with `i < j` are enumerated in lexicographic order and cut
//! into `worker_count` contiguous chunks. Worker `w` owns the pairs at positions
//! `w * P / worker_count .. (w + 1) * P / worker_count`, where `P` is the total pair count,
//! so every pair belongs to exactly one worker.

use super::error::AnalysisError;
use super::matrix::{DistanceMatrix, PairwiseResult, TransformationTable};
use crate::core::io::persistence::{self, PairEntry, PartialRecord, PersistenceError};
use crate::core::models::transform::{CompactTransform, Transformation};
use itertools::Itertools;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Number of unordered pairs over `model_count` models.
pub fn pair_count(model_count: usize) -> usize {
    model_count * model_count.saturating_sub(1) / 2
}

/// Positions, within the lexicographic pair order, owned by one worker.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidPartition`] if `worker_count` is zero or
/// `worker_id >= worker_count`.
pub fn partition_bounds(
    total_pairs: usize,
    worker_count: usize,
    worker_id: usize,
) -> Result<Range<usize>, AnalysisError> {
    if worker_count == 0 || worker_id >= worker_count {
        return Err(AnalysisError::InvalidPartition {
            worker_id,
            worker_count,
        });
    }
    let bound = |w: usize| (w as u128 * total_pairs as u128 / worker_count as u128) as usize;
    Ok(bound(worker_id)..bound(worker_id + 1))
}

/// The pairs `(i, j)`, `i < j`, assigned to `worker_id` out of `worker_count` workers.
pub fn assigned_pairs(
    model_count: usize,
    worker_count: usize,
    worker_id: usize,
) -> Result<impl Iterator<Item = (usize, usize)>, AnalysisError> {
    let range = partition_bounds(pair_count(model_count), worker_count, worker_id)?;
    Ok((0..model_count)
        .tuple_combinations()
        .skip(range.start)
        .take(range.len()))
}

/// One worker's share of a pairwise build: distances and transformations for the pairs
/// it owns, tagged with the ensemble it was computed over.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialMatrix {
    worker_id: usize,
    worker_count: usize,
    model_names: Vec<String>,
    entries: BTreeMap<(usize, usize), (f64, Transformation)>,
}

impl PartialMatrix {
    pub fn new(worker_id: usize, worker_count: usize, model_names: Vec<String>) -> Self {
        Self {
            worker_id,
            worker_count,
            model_names,
            entries: BTreeMap::new(),
        }
    }

    pub fn worker_id(&self) -> usize {
        self.worker_id
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn model_names(&self) -> &[String] {
        &self.model_names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn insert(&mut self, i: usize, j: usize, distance: f64, transformation: Transformation) {
        self.entries.insert((i, j), (distance, transformation));
    }

    /// Entries as `(i, j, distance, transformation)` in ascending pair order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f64, &Transformation)> {
        self.entries
            .iter()
            .map(|(&(i, j), (distance, transformation))| (i, j, *distance, transformation))
    }

    pub fn to_record(&self) -> PartialRecord {
        PartialRecord {
            worker_id: self.worker_id,
            worker_count: self.worker_count,
            model_names: self.model_names.clone(),
            pairs: self
                .iter()
                .map(|(i, j, distance, t)| PairEntry::new(i, j, distance, CompactTransform::from(t)))
                .collect(),
        }
    }

    /// Rebuilds a partial result from its record, validating indices against the model list.
    pub fn from_record(record: PartialRecord, path: &Path) -> Result<Self, PersistenceError> {
        if record.worker_count == 0 || record.worker_id >= record.worker_count {
            return Err(PersistenceError::malformed(
                path,
                format!(
                    "worker {} of {} is not a valid partition",
                    record.worker_id, record.worker_count
                ),
            ));
        }
        let n = record.model_names.len();
        let mut partial = Self::new(record.worker_id, record.worker_count, record.model_names);
        for entry in record.pairs {
            persistence::check_pair_index(path, entry.i, entry.j, n)?;
            if !persistence::is_valid_distance(entry.distance) {
                return Err(PersistenceError::malformed(
                    path,
                    format!("pair ({}, {}) has distance {}", entry.i, entry.j, entry.distance),
                ));
            }
            let transformation = entry.decode(path)?;
            partial.insert(entry.i, entry.j, entry.distance, transformation);
        }
        Ok(partial)
    }

    pub fn save(&self, path: &Path) -> Result<(), PersistenceError> {
        persistence::write_partial(path, &self.to_record())
    }

    pub fn load(path: &Path) -> Result<Self, PersistenceError> {
        let record = persistence::read_partial(path)?;
        Self::from_record(record, path)
    }
}

/// Gathers worker partials into one global distance matrix and transformation table.
///
/// The result does not depend on the order of `partials`.
///
/// # Errors
///
/// * [`AnalysisError::PartitionMismatch`] if no partials are given or they disagree on the
///   model list or worker count.
/// * [`AnalysisError::OverlappingPartition`] if a pair appears in more than one partial.
/// * [`AnalysisError::IncompleteMatrix`] if the merged pair count differs from `n(n-1)/2`.
#[instrument(skip_all, name = "merge_partials")]
pub fn merge<I>(partials: I) -> Result<PairwiseResult, AnalysisError>
where
    I: IntoIterator<Item = PartialMatrix>,
{
    let mut partials = partials.into_iter();
    let Some(first) = partials.next() else {
        return Err(AnalysisError::PartitionMismatch(
            "no partial results to merge".to_string(),
        ));
    };

    let model_names = first.model_names.clone();
    let worker_count = first.worker_count;
    let n = model_names.len();
    let mut distances = DistanceMatrix::zeros(n);
    let mut transformations = TransformationTable::new();
    let mut seen = BTreeSet::new();
    let mut merged_workers = 0usize;

    for partial in std::iter::once(first).chain(partials) {
        if partial.model_names != model_names {
            return Err(AnalysisError::PartitionMismatch(format!(
                "worker {} was computed over a different model list",
                partial.worker_id
            )));
        }
        if partial.worker_count != worker_count {
            return Err(AnalysisError::PartitionMismatch(format!(
                "worker {} expects {} workers, others expect {}",
                partial.worker_id, partial.worker_count, worker_count
            )));
        }

        debug!(
            worker_id = partial.worker_id,
            pairs = partial.len(),
            "Merging partial result."
        );
        for (&(i, j), &(distance, transformation)) in &partial.entries {
            if !seen.insert((i, j)) {
                return Err(AnalysisError::OverlappingPartition { i, j });
            }
            distances.set_pair(i, j, distance);
            transformations.insert(i, j, transformation);
        }
        merged_workers += 1;
    }

    let expected = pair_count(n);
    if seen.len() != expected {
        return Err(AnalysisError::IncompleteMatrix {
            expected,
            found: seen.len(),
        });
    }

    info!(
        models = n,
        pairs = expected,
        workers = merged_workers,
        "Merged partial results into the global distance matrix."
    );
    Ok(PairwiseResult {
        distances,
        transformations,
    })
}
