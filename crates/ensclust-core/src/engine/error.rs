use super::config::ConfigError;
use crate::core::io::persistence::PersistenceError;
use crate::core::models::ensemble::EnsembleError;
use crate::core::models::label::LabelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Stoichiometry mismatch: query has {query:?}, template has {template:?}")]
    StoichiometryMismatch {
        query: Vec<(String, usize)>,
        template: Vec<(String, usize)>,
    },

    #[error(
        "Size mismatch for '{label}': {query_points} query points vs {template_points} template points"
    )]
    SizeMismatch {
        label: String,
        query_points: usize,
        template_points: usize,
    },

    #[error("Alignment requested but no template has been set")]
    MissingTemplate,

    #[error("Persistence failed: {source}")]
    Persistence {
        #[from]
        source: PersistenceError,
    },

    #[error("Invalid label: {source}")]
    InvalidLabel {
        #[from]
        source: LabelError,
    },

    #[error("Model '{name}' is already part of the ensemble")]
    DuplicateModel { name: String },

    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("The ensemble contains no models")]
    EmptyEnsemble,

    #[error("Invalid partition: worker {worker_id} of {worker_count}")]
    InvalidPartition {
        worker_id: usize,
        worker_count: usize,
    },

    #[error("Partial results do not belong together: {0}")]
    PartitionMismatch(String),

    #[error("Model pair ({i}, {j}) was computed by more than one worker")]
    OverlappingPartition { i: usize, j: usize },

    #[error("Merged matrix is incomplete: expected {expected} pairs, found {found}")]
    IncompleteMatrix { expected: usize, found: usize },

    #[error("No distance matrix has been built or restored")]
    MatrixNotBuilt,

    #[error("Models have not been clustered")]
    NotClustered,

    #[error("Unknown cluster label: {0}")]
    UnknownClusterLabel(usize),

    #[error("Cluster {label} has {size} member(s); index {index} is out of range")]
    MemberIndexOutOfRange {
        label: usize,
        index: usize,
        size: usize,
    },

    #[error("Invalid cluster count: {0}")]
    InvalidClusterCount(usize),

    #[error("Configuration error: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },
}

impl From<EnsembleError> for AnalysisError {
    fn from(error: EnsembleError) -> Self {
        match error {
            EnsembleError::DuplicateModel { name } => Self::DuplicateModel { name },
        }
    }
}
