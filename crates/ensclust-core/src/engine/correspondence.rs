//! Enumeration of label correspondences under chain-copy permutation symmetry.
//!
//! Labels sharing a bare name (`a..1`, `a..2`, ...) are interchangeable. A correspondence
//! maps every query label to a template label by choosing one permutation of the template
//! copies for each bare-name group; the full space is the Cartesian product of those
//! per-group permutations. Enumeration is lazy and can be restarted any number of times.

use super::error::AnalysisError;
use crate::core::models::label::bare_name;
use crate::core::models::point_set::LabeledPointSet;
use std::collections::BTreeMap;
use tracing::trace;

/// The copies of one bare name on both sides of a comparison, in sorted label order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyGroup<'a> {
    pub bare_name: &'a str,
    pub query: Vec<&'a str>,
    pub template: Vec<&'a str>,
}

/// One full query-label to template-label mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correspondence<'a> {
    pairs: Vec<(&'a str, &'a str)>,
}

impl<'a> Correspondence<'a> {
    /// `(query label, template label)` pairs in the fixed query order.
    pub fn pairs(&self) -> &[(&'a str, &'a str)] {
        &self.pairs
    }

    pub fn template_for(&self, query_label: &str) -> Option<&'a str> {
        self.pairs
            .iter()
            .find(|(query, _)| *query == query_label)
            .map(|(_, template)| *template)
    }
}

/// The validated correspondence search space between a query and a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrespondenceSpace<'a> {
    groups: Vec<CopyGroup<'a>>,
}

impl<'a> CorrespondenceSpace<'a> {
    /// Groups both point sets by bare name and checks that they can be compared.
    ///
    /// # Errors
    ///
    /// * [`AnalysisError::StoichiometryMismatch`] if the bare names or their copy counts differ.
    /// * [`AnalysisError::SizeMismatch`] if any two labels of one group carry point
    ///   sequences of different lengths.
    pub fn resolve(
        query: &'a LabeledPointSet,
        template: &'a LabeledPointSet,
    ) -> Result<Self, AnalysisError> {
        let query_groups = group_labels(query);
        let template_groups = group_labels(template);

        let same_stoichiometry = query_groups.len() == template_groups.len()
            && query_groups
                .iter()
                .zip(template_groups.iter())
                .all(|((qn, ql), (tn, tl))| qn == tn && ql.len() == tl.len());
        if !same_stoichiometry {
            return Err(AnalysisError::StoichiometryMismatch {
                query: summarize(&query_groups),
                template: summarize(&template_groups),
            });
        }

        let mut groups = Vec::with_capacity(query_groups.len());
        for ((name, query_labels), (_, template_labels)) in
            query_groups.into_iter().zip(template_groups)
        {
            let reference = query_labels[0];
            let expected = point_len(query, reference);
            for &label in &query_labels {
                check_len(label, point_len(query, label), expected)?;
            }
            for &label in &template_labels {
                check_len(label, expected, point_len(template, label))?;
            }
            groups.push(CopyGroup {
                bare_name: name,
                query: query_labels,
                template: template_labels,
            });
        }

        let space = Self { groups };
        trace!(
            groups = space.groups.len(),
            correspondences = space.len(),
            "Resolved correspondence space."
        );
        Ok(space)
    }

    pub fn groups(&self) -> &[CopyGroup<'a>] {
        &self.groups
    }

    /// Number of correspondences: the product of the factorials of the group sizes.
    /// Saturates at `usize::MAX`.
    pub fn len(&self) -> usize {
        self.groups
            .iter()
            .map(|group| (1..=group.query.len()).fold(1usize, usize::saturating_mul))
            .fold(1usize, usize::saturating_mul)
    }

    /// Always false: even an empty comparison has the single empty correspondence.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Starts a fresh lazy enumeration of the space.
    pub fn iter(&self) -> Correspondences<'_, 'a> {
        Correspondences {
            space: self,
            permutations: self
                .groups
                .iter()
                .map(|group| (0..group.template.len()).collect())
                .collect(),
            exhausted: false,
        }
    }
}

/// Lazy iterator over a [`CorrespondenceSpace`].
///
/// Each group keeps its current permutation of template copy positions; the groups
/// advance like an odometer, the last group turning fastest.
#[derive(Debug, Clone)]
pub struct Correspondences<'s, 'a> {
    space: &'s CorrespondenceSpace<'a>,
    permutations: Vec<Vec<usize>>,
    exhausted: bool,
}

impl<'a> Iterator for Correspondences<'_, 'a> {
    type Item = Correspondence<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }

        let pairs = self
            .space
            .groups
            .iter()
            .zip(self.permutations.iter())
            .flat_map(|(group, permutation)| {
                group
                    .query
                    .iter()
                    .zip(permutation.iter())
                    .map(|(&query, &slot)| (query, group.template[slot]))
            })
            .collect();

        self.exhausted = !self
            .permutations
            .iter_mut()
            .rev()
            .any(|permutation| next_permutation(permutation));

        Some(Correspondence { pairs })
    }
}

/// Advances to the next lexicographic permutation.
///
/// Returns `false` and rewinds to the first permutation once the last one is reached.
fn next_permutation(items: &mut [usize]) -> bool {
    let Some(pivot) = (1..items.len()).rev().find(|&i| items[i - 1] < items[i]) else {
        items.reverse();
        return false;
    };
    let pivot = pivot - 1;
    let successor = (pivot + 1..items.len())
        .rev()
        .find(|&i| items[i] > items[pivot])
        .unwrap_or(pivot + 1);
    items.swap(pivot, successor);
    items[pivot + 1..].reverse();
    true
}

fn group_labels(set: &LabeledPointSet) -> BTreeMap<&str, Vec<&str>> {
    let mut groups: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for label in set.labels() {
        groups.entry(bare_name(label)).or_default().push(label);
    }
    groups
}

fn summarize(groups: &BTreeMap<&str, Vec<&str>>) -> Vec<(String, usize)> {
    groups
        .iter()
        .map(|(name, labels)| (name.to_string(), labels.len()))
        .collect()
}

fn point_len(set: &LabeledPointSet, label: &str) -> usize {
    set.get(label).map_or(0, <[_]>::len)
}

fn check_len(label: &str, query_points: usize, template_points: usize) -> Result<(), AnalysisError> {
    if query_points != template_points {
        return Err(AnalysisError::SizeMismatch {
            label: label.to_string(),
            query_points,
            template_points,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;
    use std::collections::HashSet;

    fn set_of(labels: &[(&str, usize)]) -> LabeledPointSet {
        LabeledPointSet::from_chains(
            labels
                .iter()
                .map(|&(label, n)| (label, vec![Point3::origin(); n])),
        )
        .unwrap()
    }

    #[test]
    fn next_permutation_walks_all_orders_then_rewinds() {
        let mut items = vec![0, 1, 2];
        let mut seen = vec![items.clone()];
        while next_permutation(&mut items) {
            seen.push(items.clone());
        }
        assert_eq!(seen.len(), 6);
        assert_eq!(seen[1], vec![0, 2, 1]);
        assert_eq!(items, vec![0, 1, 2]);
    }

    #[test]
    fn single_copy_groups_yield_one_identity_correspondence() {
        let query = set_of(&[("a", 2), ("b", 1)]);
        let template = set_of(&[("a", 2), ("b", 1)]);

        let space = CorrespondenceSpace::resolve(&query, &template).unwrap();
        let all: Vec<_> = space.iter().collect();

        assert_eq!(space.len(), 1);
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].pairs(), &[("a", "a"), ("b", "b")]);
    }

    #[test]
    fn enumerates_product_of_per_group_permutations() {
        let query = set_of(&[("a..1", 1), ("a..2", 1), ("a..3", 1), ("c..1", 1), ("c..2", 1), ("d", 1)]);
        let template = query.clone();

        let space = CorrespondenceSpace::resolve(&query, &template).unwrap();
        let all: Vec<_> = space.iter().collect();

        assert_eq!(space.len(), 12);
        assert_eq!(all.len(), 12);
        let distinct: HashSet<_> = all.iter().map(|c| c.pairs().to_vec()).collect();
        assert_eq!(distinct.len(), 12);
        for correspondence in &all {
            assert_eq!(correspondence.template_for("d"), Some("d"));
            let a_target = correspondence.template_for("a..1").unwrap();
            assert!(a_target.starts_with("a.."));
        }
    }

    #[test]
    fn enumeration_is_restartable() {
        let query = set_of(&[("a..1", 1), ("a..2", 1)]);
        let space = CorrespondenceSpace::resolve(&query, &query).unwrap();

        let first: Vec<_> = space.iter().collect();
        let second: Vec<_> = space.iter().collect();

        assert_eq!(first, second);
        assert_eq!(first[0].pairs(), &[("a..1", "a..1"), ("a..2", "a..2")]);
        assert_eq!(first[1].pairs(), &[("a..1", "a..2"), ("a..2", "a..1")]);
    }

    #[test]
    fn differing_bare_names_are_a_stoichiometry_mismatch() {
        let query = set_of(&[("a", 1), ("b", 1)]);
        let template = set_of(&[("a", 1), ("c", 1)]);

        let result = CorrespondenceSpace::resolve(&query, &template);

        assert!(matches!(
            result,
            Err(AnalysisError::StoichiometryMismatch { .. })
        ));
    }

    #[test]
    fn differing_copy_counts_are_a_stoichiometry_mismatch() {
        let query = set_of(&[("a..1", 1), ("a..2", 1)]);
        let template = set_of(&[("a", 1)]);

        let result = CorrespondenceSpace::resolve(&query, &template);

        assert!(matches!(
            result,
            Err(AnalysisError::StoichiometryMismatch { .. })
        ));
    }

    #[test]
    fn unequal_point_counts_are_a_size_mismatch() {
        let query = set_of(&[("a..1", 3), ("a..2", 3)]);
        let template = set_of(&[("a..1", 3), ("a..2", 2)]);

        let result = CorrespondenceSpace::resolve(&query, &template);

        assert!(matches!(
            result,
            Err(AnalysisError::SizeMismatch { ref label, .. }) if label == "a..2"
        ));
    }

    #[test]
    fn empty_sets_have_a_single_empty_correspondence() {
        let empty = LabeledPointSet::new();
        let space = CorrespondenceSpace::resolve(&empty, &empty).unwrap();
        let all: Vec<_> = space.iter().collect();
        assert_eq!(all.len(), 1);
        assert!(all[0].pairs().is_empty());
    }
}
