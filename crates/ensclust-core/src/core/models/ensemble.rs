use super::point_set::LabeledPointSet;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum EnsembleError {
    #[error("Model '{name}' is already part of the ensemble")]
    DuplicateModel { name: String },
}

/// An ordered collection of uniquely named models.
///
/// The i-th inserted model receives index `i`; this order is stable and defines the
/// row/column order of every distance matrix built over the ensemble.
#[derive(Debug, Clone, Default)]
pub struct Ensemble {
    models: Vec<(String, LabeledPointSet)>,
    index_by_name: HashMap<String, usize>,
}

impl Ensemble {
    /// Creates an empty ensemble.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a model to the ensemble.
    ///
    /// # Arguments
    ///
    /// * `name` - The unique model name.
    /// * `coordinates` - The model's labeled coordinates.
    ///
    /// # Return
    ///
    /// Returns the index assigned to the model.
    ///
    /// # Errors
    ///
    /// Returns [`EnsembleError::DuplicateModel`] if the name is already present.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        coordinates: LabeledPointSet,
    ) -> Result<usize, EnsembleError> {
        let name = name.into();
        if self.index_by_name.contains_key(&name) {
            return Err(EnsembleError::DuplicateModel { name });
        }
        let index = self.models.len();
        self.index_by_name.insert(name.clone(), index);
        self.models.push((name, coordinates));
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&LabeledPointSet> {
        self.models.get(index).map(|(_, coordinates)| coordinates)
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.models.get(index).map(|(name, _)| name.as_str())
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index_by_name.get(name).copied()
    }

    /// Model names in index order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LabeledPointSet)> {
        self.models
            .iter()
            .map(|(name, coordinates)| (name.as_str(), coordinates))
    }
}
