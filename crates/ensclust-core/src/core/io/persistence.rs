use crate::core::models::transform::{CompactTransform, Transformation};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use thiserror::Error;

const MATRIX_SUFFIX: &str = ".matrix.csv";
const RECORD_SUFFIX: &str = ".record.toml";

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("CSV error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("TOML parsing error for '{path}': {source}")]
    TomlDecode {
        path: String,
        source: toml::de::Error,
    },
    #[error("TOML encoding error for '{path}': {source}")]
    TomlEncode {
        path: String,
        source: toml::ser::Error,
    },
    #[error("Malformed artifact '{path}': {reason}")]
    Malformed { path: String, reason: String },
}

impl PersistenceError {
    pub(crate) fn malformed(path: &Path, reason: impl Into<String>) -> Self {
        Self::Malformed {
            path: display(path),
            reason: reason.into(),
        }
    }
}

/// The transformation stored for one unordered model pair `(i, j)` with `i < j`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairTransform {
    pub i: usize,
    pub j: usize,
    pub transform: CompactTransform,
}

impl PairTransform {
    pub fn new(i: usize, j: usize, transform: CompactTransform) -> Self {
        Self { i, j, transform }
    }

    /// Rebuilds the live transformation, reporting a bad quaternion against `path`.
    pub fn decode(&self, path: &Path) -> Result<Transformation, PersistenceError> {
        decode_transform(path, self.i, self.j, &self.transform)
    }
}

/// Companion record of a persisted distance matrix.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MatrixRecord {
    pub model_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_ids: Option<Vec<usize>>,
    #[serde(default)]
    pub transformations: Vec<PairTransform>,
}

/// One computed pair inside a worker's partial result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairEntry {
    pub i: usize,
    pub j: usize,
    pub distance: f64,
    pub transform: CompactTransform,
}

impl PairEntry {
    pub fn new(i: usize, j: usize, distance: f64, transform: CompactTransform) -> Self {
        Self {
            i,
            j,
            distance,
            transform,
        }
    }

    pub fn decode(&self, path: &Path) -> Result<Transformation, PersistenceError> {
        decode_transform(path, self.i, self.j, &self.transform)
    }
}

fn decode_transform(
    path: &Path,
    i: usize,
    j: usize,
    transform: &CompactTransform,
) -> Result<Transformation, PersistenceError> {
    transform
        .to_transformation()
        .map_err(|e| PersistenceError::malformed(path, format!("pair ({i}, {j}): {e}")))
}

/// Checks that `(i, j)` is an ordered pair of distinct models among `n`.
pub(crate) fn check_pair_index(
    path: &Path,
    i: usize,
    j: usize,
    n: usize,
) -> Result<(), PersistenceError> {
    if i >= j || j >= n {
        return Err(PersistenceError::malformed(
            path,
            format!("pair ({i}, {j}) is invalid for {n} models"),
        ));
    }
    Ok(())
}

/// Whether `value` can be stored as a distance.
pub fn is_valid_distance(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

/// Serialized form of one worker's share of the pairwise computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PartialRecord {
    pub worker_id: usize,
    pub worker_count: usize,
    pub model_names: Vec<String>,
    #[serde(default)]
    pub pairs: Vec<PairEntry>,
}

/// Paths of the two companion artifacts written for a matrix saved under `base`.
///
/// `runs/cluster` yields `runs/cluster.matrix.csv` and `runs/cluster.record.toml`.
pub fn artifact_paths(base: &Path) -> (PathBuf, PathBuf) {
    let with_suffix = |suffix: &str| {
        let mut name = OsString::from(base.as_os_str());
        name.push(suffix);
        PathBuf::from(name)
    };
    (with_suffix(MATRIX_SUFFIX), with_suffix(RECORD_SUFFIX))
}

/// Writes a square matrix as headerless CSV, one matrix row per line.
pub fn write_matrix(path: &Path, matrix: &DMatrix<f64>) -> Result<(), PersistenceError> {
    let csv_err = |source| PersistenceError::Csv {
        path: display(path),
        source,
    };
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(csv_err)?;

    for row in matrix.row_iter() {
        writer
            .write_record(row.iter().map(|value| value.to_string()))
            .map_err(csv_err)?;
    }
    writer.flush().map_err(|source| PersistenceError::Io {
        path: display(path),
        source,
    })
}

/// Reads a matrix written by [`write_matrix`], verifying that it is square and holds only
/// finite, non-negative distances.
pub fn read_matrix(path: &Path) -> Result<DMatrix<f64>, PersistenceError> {
    let csv_err = |source| PersistenceError::Csv {
        path: display(path),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(csv_err)?;

    let mut rows: Vec<Vec<f64>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        let row = record
            .iter()
            .map(|field| {
                match field.trim().parse::<f64>() {
                    Ok(value) if is_valid_distance(value) => Ok(value),
                    _ => Err(PersistenceError::malformed(
                        path,
                        format!("row {}: '{}' is not a valid distance", rows.len() + 1, field),
                    )),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(row);
    }

    let n = rows.len();
    if let Some((index, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != n) {
        return Err(PersistenceError::malformed(
            path,
            format!(
                "matrix is not square: row {} has {} columns, expected {}",
                index + 1,
                row.len(),
                n
            ),
        ));
    }
    Ok(DMatrix::from_fn(n, n, |r, c| rows[r][c]))
}

pub fn write_record(path: &Path, record: &MatrixRecord) -> Result<(), PersistenceError> {
    write_toml(path, record)
}

pub fn read_record(path: &Path) -> Result<MatrixRecord, PersistenceError> {
    read_toml(path)
}

pub fn write_partial(path: &Path, record: &PartialRecord) -> Result<(), PersistenceError> {
    write_toml(path, record)
}

pub fn read_partial(path: &Path) -> Result<PartialRecord, PersistenceError> {
    read_toml(path)
}

fn write_toml<T: Serialize>(path: &Path, value: &T) -> Result<(), PersistenceError> {
    let content = toml::to_string(value).map_err(|source| PersistenceError::TomlEncode {
        path: display(path),
        source,
    })?;
    std::fs::write(path, content).map_err(|source| PersistenceError::Io {
        path: display(path),
        source,
    })
}

fn read_toml<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, PersistenceError> {
    let content = std::fs::read_to_string(path).map_err(|source| PersistenceError::Io {
        path: display(path),
        source,
    })?;
    toml::from_str(&content).map_err(|source| PersistenceError::TomlDecode {
        path: display(path),
        source,
    })
}

fn display(path: &Path) -> String {
    path.to_string_lossy().to_string()
}
