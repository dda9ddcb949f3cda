use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ViolationError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Parse error in '{path}' at line {line}: {reason}")]
    Parse {
        path: String,
        line: usize,
        reason: String,
    },
}

/// Counts restraints whose observed score exceeds a per-restraint threshold, keeping a
/// running tally across every query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViolationCounter {
    thresholds: BTreeMap<String, f64>,
    counts: BTreeMap<String, usize>,
}

impl ViolationCounter {
    pub fn new(thresholds: impl IntoIterator<Item = (String, f64)>) -> Self {
        Self {
            thresholds: thresholds.into_iter().collect(),
            counts: BTreeMap::new(),
        }
    }

    /// Reads a whitespace-separated `<restraint-name> <threshold>` table.
    ///
    /// Blank lines and lines starting with `#` are skipped; extra columns are ignored.
    pub fn from_file(path: &Path) -> Result<Self, ViolationError> {
        let path_str = path.to_string_lossy().to_string();
        let content = fs::read_to_string(path).map_err(|source| ViolationError::Io {
            path: path_str.clone(),
            source,
        })?;

        let mut thresholds = BTreeMap::new();
        for (index, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let parse_error = |reason: String| ViolationError::Parse {
                path: path_str.clone(),
                line: index + 1,
                reason,
            };
            let mut fields = line.split_whitespace();
            let (Some(name), Some(value)) = (fields.next(), fields.next()) else {
                return Err(parse_error(
                    "expected a restraint name followed by a threshold".to_string(),
                ));
            };
            let threshold: f64 = value
                .parse()
                .map_err(|_| parse_error(format!("'{value}' is not a number")))?;
            thresholds.insert(name.to_string(), threshold);
        }

        info!(
            restraints = thresholds.len(),
            path = %path_str,
            "Loaded violation thresholds."
        );
        Ok(Self {
            thresholds,
            counts: BTreeMap::new(),
        })
    }

    pub fn thresholds(&self) -> &BTreeMap<String, f64> {
        &self.thresholds
    }

    /// Number of restraints in `scores` strictly above their threshold.
    ///
    /// Restraints missing from `scores` are not counted. Every violation also increments
    /// that restraint's running tally.
    pub fn count_violations(&mut self, scores: &HashMap<String, f64>) -> usize {
        let mut violated = 0;
        for (name, &threshold) in &self.thresholds {
            let Some(&score) = scores.get(name) else {
                continue;
            };
            if score > threshold {
                violated += 1;
                *self.counts.entry(name.clone()).or_default() += 1;
            }
        }
        debug!(violated, "Counted restraint violations.");
        violated
    }

    /// Running tally of violations per restraint; restraints never violated are absent.
    pub fn violation_counts(&self) -> &BTreeMap<String, usize> {
        &self.counts
    }
}
