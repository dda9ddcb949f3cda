use super::label::{ChainLabel, LabelError, bare_name};
use nalgebra::{Isometry3, Point3};
use std::collections::{BTreeMap, BTreeSet};

/// Coordinates of one model, keyed by chain label.
///
/// A label is either a bare chain name or `name..k`, where `k` identifies one of several
/// interchangeable copies of the same chain. Labels are kept in sorted order so that
/// every traversal of the set is deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabeledPointSet {
    chains: BTreeMap<String, Vec<Point3<f64>>>,
}

impl LabeledPointSet {
    /// Creates an empty point set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a point set from `(label, points)` pairs.
    ///
    /// # Arguments
    ///
    /// * `chains` - The labeled point sequences; later duplicates replace earlier ones.
    ///
    /// # Errors
    ///
    /// Returns [`LabelError`] for the first malformed label encountered.
    pub fn from_chains<I, S>(chains: I) -> Result<Self, LabelError>
    where
        I: IntoIterator<Item = (S, Vec<Point3<f64>>)>,
        S: Into<String>,
    {
        let mut set = Self::new();
        for (label, points) in chains {
            set.insert(label, points)?;
        }
        Ok(set)
    }

    /// Inserts or replaces the point sequence of a label.
    ///
    /// # Arguments
    ///
    /// * `label` - A bare chain name or a copy-qualified `name..k` label.
    /// * `points` - The ordered coordinates of that chain.
    ///
    /// # Return
    ///
    /// Returns the previous point sequence of the label, if any.
    ///
    /// # Errors
    ///
    /// Returns [`LabelError`] if the label cannot be parsed.
    pub fn insert(
        &mut self,
        label: impl Into<String>,
        points: Vec<Point3<f64>>,
    ) -> Result<Option<Vec<Point3<f64>>>, LabelError> {
        let label = label.into();
        ChainLabel::parse(&label)?;
        Ok(self.chains.insert(label, points))
    }

    /// Appends one point to a label, creating the label when absent.
    ///
    /// # Errors
    ///
    /// Returns [`LabelError`] if a new label cannot be parsed.
    pub fn push_point(&mut self, label: &str, point: Point3<f64>) -> Result<(), LabelError> {
        if let Some(points) = self.chains.get_mut(label) {
            points.push(point);
            return Ok(());
        }
        self.insert(label, vec![point]).map(|_| ())
    }

    pub fn get(&self, label: &str) -> Option<&[Point3<f64>]> {
        self.chains.get(label).map(Vec::as_slice)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.chains.contains_key(label)
    }

    /// Returns the labels in sorted order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.chains.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Point3<f64>])> {
        self.chains
            .iter()
            .map(|(label, points)| (label.as_str(), points.as_slice()))
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Total number of points across all labels.
    pub fn point_count(&self) -> usize {
        self.chains.values().map(Vec::len).sum()
    }

    /// Returns the distinct bare names present in the set.
    pub fn bare_names(&self) -> BTreeSet<&str> {
        self.labels().map(bare_name).collect()
    }

    /// Returns the number of copies carried for every bare name.
    pub fn stoichiometry(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for label in self.labels() {
            *counts.entry(bare_name(label)).or_insert(0) += 1;
        }
        counts
    }

    /// Returns a new set holding only the labels whose bare name is in `names`.
    ///
    /// # Arguments
    ///
    /// * `names` - The bare names to keep; copies of a kept name are all retained.
    pub fn restricted_to<'a, I>(&self, names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let keep: BTreeSet<&str> = names.into_iter().collect();
        Self {
            chains: self
                .chains
                .iter()
                .filter(|(label, _)| keep.contains(bare_name(label)))
                .map(|(label, points)| (label.clone(), points.clone()))
                .collect(),
        }
    }

    /// Returns a new set holding only the exact `labels` given, skipping any this set lacks.
    pub fn restricted_to_labels<'a, I>(&self, labels: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        Self {
            chains: labels
                .into_iter()
                .filter_map(|label| {
                    self.chains
                        .get_key_value(label)
                        .map(|(label, points)| (label.clone(), points.clone()))
                })
                .collect(),
        }
    }

    /// Returns a copy of the set with every point moved by `transform`.
    pub fn transformed(&self, transform: &Isometry3<f64>) -> Self {
        Self {
            chains: self
                .chains
                .iter()
                .map(|(label, points)| {
                    let moved = points
                        .iter()
                        .map(|p| transform.transform_point(p))
                        .collect();
                    (label.clone(), moved)
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Translation3, UnitQuaternion, Vector3};

    fn p(x: f64, y: f64, z: f64) -> Point3<f64> {
        Point3::new(x, y, z)
    }

    fn sample_set() -> LabeledPointSet {
        LabeledPointSet::from_chains([
            ("a..2", vec![p(1.0, 1.0, 0.0)]),
            ("a..1", vec![p(-1.0, 1.0, 0.0)]),
            ("b", vec![p(0.0, -1.0, 0.0), p(0.0, -2.0, 0.0)]),
        ])
        .unwrap()
    }

    #[test]
    fn labels_are_iterated_in_sorted_order() {
        let set = sample_set();
        let labels: Vec<_> = set.labels().collect();
        assert_eq!(labels, vec!["a..1", "a..2", "b"]);
    }

    #[test]
    fn counts_points_and_copies() {
        let set = sample_set();
        assert_eq!(set.len(), 3);
        assert_eq!(set.point_count(), 4);
        let stoichiometry = set.stoichiometry();
        assert_eq!(stoichiometry.get("a"), Some(&2));
        assert_eq!(stoichiometry.get("b"), Some(&1));
    }

    #[test]
    fn insert_rejects_malformed_label() {
        let mut set = LabeledPointSet::new();
        assert!(set.insert("a..zero", vec![p(0.0, 0.0, 0.0)]).is_err());
        assert!(set.is_empty());
    }

    #[test]
    fn push_point_extends_existing_label_in_order() {
        let mut set = LabeledPointSet::new();
        set.push_point("c", p(1.0, 0.0, 0.0)).unwrap();
        set.push_point("c", p(2.0, 0.0, 0.0)).unwrap();
        assert_eq!(set.get("c").unwrap(), &[p(1.0, 0.0, 0.0), p(2.0, 0.0, 0.0)]);
    }

    #[test]
    fn restricted_to_keeps_all_copies_of_selected_names() {
        let set = sample_set();
        let restricted = set.restricted_to(["a"]);
        let labels: Vec<_> = restricted.labels().collect();
        assert_eq!(labels, vec!["a..1", "a..2"]);
    }

    #[test]
    fn restricted_to_labels_keeps_only_exact_matches() {
        let set = sample_set();
        let restricted = set.restricted_to_labels(["a..1", "c"]);
        let labels: Vec<_> = restricted.labels().collect();
        assert_eq!(labels, vec!["a..1"]);
        assert_eq!(restricted.get("a..1"), set.get("a..1"));
    }

    #[test]
    fn transformed_moves_every_point() {
        let set = sample_set();
        let shift = Isometry3::from_parts(
            Translation3::new(1.0, 2.0, 3.0),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.0),
        );
        let moved = set.transformed(&shift);
        assert_eq!(moved.get("b").unwrap()[1], p(1.0, 0.0, 3.0));
        assert_eq!(moved.get("a..1").unwrap()[0], p(0.0, 3.0, 3.0));
    }
}
