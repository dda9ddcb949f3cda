use super::alignment::{AlignmentResult, compute_best_alignment, compute_min_rmsd};
use super::config::KMeansConfig;
use super::error::AnalysisError;
use super::kmeans::k_means;
use super::matrix::{DistanceMatrix, PairwiseResult, TransformationTable};
use super::partition::{self, PartialMatrix, assigned_pairs, pair_count};
use super::progress::{Progress, ProgressReporter};
use crate::core::io::persistence::{
    self, MatrixRecord, PairTransform, PersistenceError, artifact_paths,
};
use crate::core::models::ensemble::Ensemble;
use crate::core::models::point_set::LabeledPointSet;
use crate::core::models::transform::{CompactTransform, Transformation};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, info, instrument};

/// The ensemble distance engine.
///
/// Holds every model of an ensemble, an optional alignment template, the pairwise
/// distance matrix with its transformation table, and the latest cluster assignment.
/// Filling a model or changing the template discards any matrix built so far.
#[derive(Debug, Clone, Default)]
pub struct Clustering {
    ensemble: Ensemble,
    model_names: Vec<String>,
    template: Option<LabeledPointSet>,
    pairwise: Option<PairwiseResult>,
    assignment: Option<Vec<usize>>,
}

impl Clustering {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the reference every model is aligned onto before pairwise comparison.
    ///
    /// Only the chains of a model whose bare names appear in the template take part in
    /// that alignment; the resulting transformation moves the whole model.
    pub fn set_template(&mut self, template: LabeledPointSet) {
        self.template = Some(template);
        self.invalidate();
    }

    pub fn template(&self) -> Option<&LabeledPointSet> {
        self.template.as_ref()
    }

    /// Adds one model to the ensemble and returns its index.
    pub fn fill(
        &mut self,
        name: impl Into<String>,
        coordinates: LabeledPointSet,
    ) -> Result<usize, AnalysisError> {
        let name = name.into();
        if self.ensemble.is_empty() {
            // Names restored without coordinates are replaced by the filled ensemble.
            self.model_names.clear();
        }
        let index = self.ensemble.insert(name.clone(), coordinates)?;
        self.model_names.push(name);
        self.invalidate();
        Ok(index)
    }

    pub fn ensemble(&self) -> &Ensemble {
        &self.ensemble
    }

    /// Model names in matrix order.
    pub fn model_names(&self) -> &[String] {
        &self.model_names
    }

    pub fn model_index(&self, name: &str) -> Option<usize> {
        self.model_names.iter().position(|n| n == name)
    }

    /// Aligns the chains of one model carrying the template's exact labels onto the
    /// template.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::MissingTemplate`] if no template is set,
    /// [`AnalysisError::UnknownModel`] if the ensemble holds no model at `index`, and
    /// [`AnalysisError::StoichiometryMismatch`] if the model lacks a template label.
    pub fn align_to_template(&self, index: usize) -> Result<AlignmentResult, AnalysisError> {
        let template = self.template.as_ref().ok_or(AnalysisError::MissingTemplate)?;
        let model = self.model(index)?;
        if let Some(missing) = template.labels().find(|label| !model.contains(label)) {
            debug!(model = index, label = missing, "Model lacks a template chain.");
            return Err(AnalysisError::StoichiometryMismatch {
                query: owned_stoichiometry(model),
                template: owned_stoichiometry(template),
            });
        }
        let subset = model.restricted_to_labels(template.labels());
        compute_best_alignment(&subset, template)
    }

    /// Computes the pairs this worker owns.
    ///
    /// Without a template each pair's distance is the minimum RMSD between the two models
    /// and its transformation is the identity. With a template every involved model is
    /// first moved onto the template, and the stored transformation for `(i, j)` maps
    /// model `j` into model `i`'s frame.
    ///
    /// # Errors
    ///
    /// Fails on the first pair that cannot be compared; nothing partial is returned.
    #[instrument(skip_all, name = "build_distance_matrix", fields(worker_id = worker_id, worker_count = worker_count))]
    pub fn build_distance_matrix(
        &self,
        worker_count: usize,
        worker_id: usize,
        reporter: &ProgressReporter,
    ) -> Result<PartialMatrix, AnalysisError> {
        if self.ensemble.is_empty() {
            return Err(AnalysisError::EmptyEnsemble);
        }
        let pairs: Vec<(usize, usize)> =
            assigned_pairs(self.ensemble.len(), worker_count, worker_id)?.collect();
        debug!(
            pairs = pairs.len(),
            models = self.ensemble.len(),
            template = self.template.is_some(),
            "Computing assigned pairs."
        );
        reporter.report(Progress::PartitionStart {
            worker_id,
            total_pairs: pairs.len() as u64,
        });

        let aligned = match &self.template {
            Some(_) => Some(self.align_models(&pairs)?),
            None => None,
        };

        let mut partial = PartialMatrix::new(worker_id, worker_count, self.model_names.clone());
        for &(i, j) in &pairs {
            let (distance, transformation) = match &aligned {
                Some(aligned) => {
                    let (moved_i, t_i) = &aligned[&i];
                    let (moved_j, t_j) = &aligned[&j];
                    (compute_min_rmsd(moved_i, moved_j)?, t_i.inverse() * t_j)
                }
                None => (
                    compute_min_rmsd(self.model(i)?, self.model(j)?)?,
                    Transformation::identity(),
                ),
            };
            partial.insert(i, j, distance, transformation);
            reporter.report(Progress::PairComputed { worker_id });
        }

        reporter.report(Progress::PartitionFinish { worker_id });
        info!(pairs = partial.len(), "Partition complete.");
        Ok(partial)
    }

    /// Each model touched by `pairs`, moved onto the template, with its transformation.
    fn align_models(
        &self,
        pairs: &[(usize, usize)],
    ) -> Result<BTreeMap<usize, (LabeledPointSet, Transformation)>, AnalysisError> {
        let needed: BTreeSet<usize> = pairs.iter().flat_map(|&(i, j)| [i, j]).collect();
        let mut aligned = BTreeMap::new();
        for index in needed {
            let result = self.align_to_template(index)?;
            debug!(model = index, rmsd = result.rmsd, "Aligned model onto template.");
            let moved = self.model(index)?.transformed(&result.transformation);
            aligned.insert(index, (moved, result.transformation));
        }
        Ok(aligned)
    }

    fn model(&self, index: usize) -> Result<&LabeledPointSet, AnalysisError> {
        self.ensemble
            .get(index)
            .ok_or_else(|| AnalysisError::UnknownModel(format!("#{index}")))
    }

    /// Installs the merged result of every worker's partial matrix.
    ///
    /// Without filled models the model order is taken from the partials.
    pub fn merge(&mut self, partials: Vec<PartialMatrix>) -> Result<(), AnalysisError> {
        let names = partials
            .first()
            .map(|p| p.model_names().to_vec())
            .unwrap_or_default();
        if !self.ensemble.is_empty() && names != self.model_names {
            return Err(AnalysisError::PartitionMismatch(
                "partial results were computed over a different ensemble".to_string(),
            ));
        }
        let merged = partition::merge(partials)?;
        self.model_names = names;
        self.pairwise = Some(merged);
        self.assignment = None;
        Ok(())
    }

    /// Builds the whole matrix in this process as a single worker.
    pub fn compute_distance_matrix(&mut self, reporter: &ProgressReporter) -> Result<(), AnalysisError> {
        let partial = self.build_distance_matrix(1, 0, reporter)?;
        self.merge(vec![partial])
    }

    pub fn pairwise(&self) -> Option<&PairwiseResult> {
        self.pairwise.as_ref()
    }

    pub fn distance_matrix(&self) -> Option<&DistanceMatrix> {
        self.pairwise.as_ref().map(|p| &p.distances)
    }

    pub fn transformations(&self) -> Option<&TransformationTable> {
        self.pairwise.as_ref().map(|p| &p.transformations)
    }

    /// Writes the matrix and its companion record under `base`.
    ///
    /// See [`artifact_paths`] for the file names.
    #[instrument(skip_all, name = "persist_matrix")]
    pub fn persist(&self, base: &Path) -> Result<(), AnalysisError> {
        let pairwise = self.pairwise.as_ref().ok_or(AnalysisError::MatrixNotBuilt)?;
        let (matrix_path, record_path) = artifact_paths(base);

        persistence::write_matrix(&matrix_path, pairwise.distances.as_matrix())?;
        let record = MatrixRecord {
            model_names: self.model_names.clone(),
            cluster_ids: self.assignment.clone(),
            transformations: pairwise
                .transformations
                .iter()
                .map(|(i, j, t)| PairTransform::new(i, j, CompactTransform::from(t)))
                .collect(),
        };
        persistence::write_record(&record_path, &record)?;

        info!(
            models = self.model_names.len(),
            matrix = %matrix_path.display(),
            "Persisted distance matrix."
        );
        Ok(())
    }

    /// Loads a matrix, its model order, transformations and any saved cluster assignment.
    ///
    /// If models were already filled, the restored model order must match theirs.
    #[instrument(skip_all, name = "restore_matrix")]
    pub fn restore(&mut self, base: &Path) -> Result<(), AnalysisError> {
        let (matrix_path, record_path) = artifact_paths(base);
        let raw = persistence::read_matrix(&matrix_path)?;
        let record = persistence::read_record(&record_path)?;
        let n = record.model_names.len();

        if raw.nrows() != n {
            return Err(PersistenceError::malformed(
                &matrix_path,
                format!("matrix has {} rows but the record lists {} models", raw.nrows(), n),
            )
            .into());
        }
        let distances = DistanceMatrix::from_matrix(raw).ok_or_else(|| {
            PersistenceError::malformed(&matrix_path, "matrix is not symmetric with a zero diagonal")
        })?;

        let mut transformations = TransformationTable::new();
        for pair in &record.transformations {
            persistence::check_pair_index(&record_path, pair.i, pair.j, n)?;
            transformations.insert(pair.i, pair.j, pair.decode(&record_path)?);
        }
        if transformations.len() != pair_count(n) {
            return Err(PersistenceError::malformed(
                &record_path,
                format!(
                    "expected {} transformations, found {}",
                    pair_count(n),
                    transformations.len()
                ),
            )
            .into());
        }
        if let Some(ids) = &record.cluster_ids {
            if ids.len() != n {
                return Err(PersistenceError::malformed(
                    &record_path,
                    format!("{} cluster ids for {} models", ids.len(), n),
                )
                .into());
            }
        }

        let names_differ = self
            .ensemble
            .names()
            .ne(record.model_names.iter().map(String::as_str));
        if !self.ensemble.is_empty() && names_differ {
            return Err(AnalysisError::PartitionMismatch(
                "restored model list differs from the filled ensemble".to_string(),
            ));
        }

        info!(models = n, "Restored distance matrix.");
        self.model_names = record.model_names;
        self.pairwise = Some(PairwiseResult {
            distances,
            transformations,
        });
        self.assignment = record.cluster_ids;
        Ok(())
    }

    /// Clusters the models by k-means over the rows of the distance matrix.
    ///
    /// Returns the number of clusters produced, which may be below `k`.
    #[instrument(skip_all, name = "cluster", fields(k = k))]
    pub fn cluster(&mut self, k: usize, config: &KMeansConfig) -> Result<usize, AnalysisError> {
        let distances = self.distance_matrix().ok_or(AnalysisError::MatrixNotBuilt)?;
        let outcome = k_means(distances.as_matrix(), k, config)?;
        let found = outcome.cluster_count();
        info!(
            requested = k,
            clusters = found,
            inertia = outcome.inertia,
            "Clustering complete."
        );
        self.assignment = Some(outcome.labels);
        Ok(found)
    }

    /// Cluster label of every model, in model order.
    pub fn cluster_assignment(&self) -> Option<&[usize]> {
        self.assignment.as_deref()
    }

    /// The distinct cluster labels, ascending.
    pub fn cluster_labels(&self) -> Result<Vec<usize>, AnalysisError> {
        let assignment = self.assignment()?;
        Ok(assignment
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect())
    }

    pub fn number_of_clusters(&self) -> Result<usize, AnalysisError> {
        Ok(self.cluster_labels()?.len())
    }

    /// Indices of the models carrying `label`, ascending.
    pub fn cluster_members(&self, label: usize) -> Result<Vec<usize>, AnalysisError> {
        let members: Vec<usize> = self
            .assignment()?
            .iter()
            .enumerate()
            .filter(|&(_, &l)| l == label)
            .map(|(index, _)| index)
            .collect();
        if members.is_empty() {
            return Err(AnalysisError::UnknownClusterLabel(label));
        }
        Ok(members)
    }

    pub fn cluster_member_names(&self, label: usize) -> Result<Vec<&str>, AnalysisError> {
        Ok(self
            .cluster_members(label)?
            .into_iter()
            .map(|index| self.model_names[index].as_str())
            .collect())
    }

    pub fn cluster_size(&self, label: usize) -> Result<usize, AnalysisError> {
        Ok(self.cluster_members(label)?.len())
    }

    /// Mean distance over all ordered pairs of distinct members; 0 for a singleton.
    pub fn cluster_average_rmsd(&self, label: usize) -> Result<f64, AnalysisError> {
        let members = self.cluster_members(label)?;
        let distances = self.distance_matrix().ok_or(AnalysisError::MatrixNotBuilt)?;
        let m = members.len();
        if m < 2 {
            return Ok(0.0);
        }
        let mut total = 0.0;
        for &i in &members {
            for &j in &members {
                total += distances.get(i, j).unwrap_or(0.0);
            }
        }
        Ok(total / (m * m - m) as f64)
    }

    /// Transformation between the first member of a cluster and the member at
    /// `member_index` within that cluster; the identity for the first member itself.
    pub fn transformation_to_first_member(
        &self,
        label: usize,
        member_index: usize,
    ) -> Result<Transformation, AnalysisError> {
        let members = self.cluster_members(label)?;
        let Some(&member) = members.get(member_index) else {
            return Err(AnalysisError::MemberIndexOutOfRange {
                label,
                index: member_index,
                size: members.len(),
            });
        };
        let first = members[0];
        if member == first {
            return Ok(Transformation::identity());
        }
        self.transformations()
            .and_then(|table| table.get(first, member))
            .copied()
            .ok_or(AnalysisError::MatrixNotBuilt)
    }

    fn assignment(&self) -> Result<&[usize], AnalysisError> {
        self.assignment.as_deref().ok_or(AnalysisError::NotClustered)
    }

    fn invalidate(&mut self) {
        self.pairwise = None;
        self.assignment = None;
    }
}

fn owned_stoichiometry(set: &LabeledPointSet) -> Vec<(String, usize)> {
    set.stoichiometry()
        .into_iter()
        .map(|(name, copies)| (name.to_string(), copies))
        .collect()
}
