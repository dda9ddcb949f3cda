use super::correspondence::{Correspondence, CorrespondenceSpace};
use super::error::AnalysisError;
use crate::core::models::point_set::LabeledPointSet;
use crate::core::models::transform::Transformation;
use crate::core::utils::geometry::{calculate_rmsd, squared_deviation_sum, superpose};
use nalgebra::Point3;
use std::cell::OnceCell;

/// The best superposition found over all valid correspondences.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentResult {
    pub rmsd: f64,
    /// Maps query coordinates onto the template frame.
    pub transformation: Transformation,
}

/// Compares a query point set against a template under copy-permutation symmetry.
///
/// The correspondence space is resolved on first use and reused by both operations.
pub struct Alignment<'a> {
    query: &'a LabeledPointSet,
    template: &'a LabeledPointSet,
    space: OnceCell<CorrespondenceSpace<'a>>,
}

impl<'a> Alignment<'a> {
    pub fn new(query: &'a LabeledPointSet, template: &'a LabeledPointSet) -> Self {
        Self {
            query,
            template,
            space: OnceCell::new(),
        }
    }

    fn space(&self) -> Result<&CorrespondenceSpace<'a>, AnalysisError> {
        if let Some(space) = self.space.get() {
            return Ok(space);
        }
        let resolved = CorrespondenceSpace::resolve(self.query, self.template)?;
        Ok(self.space.get_or_init(|| resolved))
    }

    /// Minimum RMSD over all correspondences, without superposition.
    pub fn compute_min_rmsd(&self) -> Result<f64, AnalysisError> {
        let space = self.space()?;
        let total_points = self.query.point_count();
        if total_points == 0 {
            return Ok(0.0);
        }

        let mut best = f64::INFINITY;
        for correspondence in space.iter() {
            let squared_sum: f64 = correspondence
                .pairs()
                .iter()
                .map(|&(query_label, template_label)| {
                    squared_deviation_sum(
                        self.points(self.query, query_label),
                        self.points(self.template, template_label),
                    )
                })
                .sum();
            let rmsd = (squared_sum / total_points as f64).sqrt();
            if rmsd < best {
                best = rmsd;
                if best == 0.0 {
                    break;
                }
            }
        }
        Ok(best)
    }

    /// Best rigid superposition of the query onto the template over all correspondences.
    pub fn compute_best_alignment(&self) -> Result<AlignmentResult, AnalysisError> {
        let space = self.space()?;
        if self.query.point_count() == 0 {
            return Ok(AlignmentResult {
                rmsd: 0.0,
                transformation: Transformation::identity(),
            });
        }

        let mut best: Option<AlignmentResult> = None;
        for correspondence in space.iter() {
            let (query_points, template_points) = self.concatenate(&correspondence);
            let transformation = superpose(&query_points, &template_points).ok_or_else(|| {
                AnalysisError::SizeMismatch {
                    label: "<concatenated>".to_string(),
                    query_points: query_points.len(),
                    template_points: template_points.len(),
                }
            })?;
            let moved: Vec<_> = query_points
                .iter()
                .map(|p| transformation.transform_point(p))
                .collect();
            let rmsd = calculate_rmsd(&moved, &template_points).unwrap_or(f64::INFINITY);

            if best.is_none_or(|current| rmsd < current.rmsd) {
                best = Some(AlignmentResult {
                    rmsd,
                    transformation,
                });
                if rmsd == 0.0 {
                    break;
                }
            }
        }
        best.ok_or(AnalysisError::SizeMismatch {
            label: "<concatenated>".to_string(),
            query_points: self.query.point_count(),
            template_points: self.template.point_count(),
        })
    }

    fn concatenate(&self, correspondence: &Correspondence<'a>) -> (Vec<Point3<f64>>, Vec<Point3<f64>>) {
        let mut query_points = Vec::with_capacity(self.query.point_count());
        let mut template_points = Vec::with_capacity(self.template.point_count());
        for &(query_label, template_label) in correspondence.pairs() {
            query_points.extend_from_slice(self.points(self.query, query_label));
            template_points.extend_from_slice(self.points(self.template, template_label));
        }
        (query_points, template_points)
    }

    fn points<'s>(&self, set: &'s LabeledPointSet, label: &str) -> &'s [Point3<f64>] {
        set.get(label).unwrap_or(&[])
    }
}

/// Minimum RMSD between `query` and `template` over all valid correspondences.
pub fn compute_min_rmsd(
    query: &LabeledPointSet,
    template: &LabeledPointSet,
) -> Result<f64, AnalysisError> {
    Alignment::new(query, template).compute_min_rmsd()
}

/// Best superposition of `query` onto `template` over all valid correspondences.
pub fn compute_best_alignment(
    query: &LabeledPointSet,
    template: &LabeledPointSet,
) -> Result<AlignmentResult, AnalysisError> {
    Alignment::new(query, template).compute_best_alignment()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Translation3, UnitQuaternion, Vector3};

    const TOLERANCE: f64 = 1e-9;

    fn planar(chains: &[(&str, &[(f64, f64)])]) -> LabeledPointSet {
        LabeledPointSet::from_chains(chains.iter().map(|(label, points)| {
            (
                *label,
                points.iter().map(|&(x, y)| Point3::new(x, y, 0.0)).collect(),
            )
        }))
        .unwrap()
    }

    fn reference_assembly() -> LabeledPointSet {
        planar(&[
            ("a..1", &[(-1.0, 1.0)]),
            ("a..2", &[(1.0, 1.0)]),
            ("b", &[(0.0, -1.0)]),
        ])
    }

    fn larger_assembly() -> LabeledPointSet {
        planar(&[
            ("a..1", &[(-1.0, 1.0)]),
            ("a..2", &[(1.0, 1.0)]),
            ("a..3", &[(-2.0, 1.0)]),
            ("b", &[(0.0, -1.0)]),
            ("c..1", &[(-1.0, -1.0)]),
            ("c..2", &[(1.0, -1.0)]),
            ("d", &[(0.0, 0.0)]),
            ("e", &[(0.0, 1.0)]),
        ])
    }

    #[test]
    fn self_comparison_has_zero_rmsd() {
        let set = reference_assembly();
        assert_eq!(compute_min_rmsd(&set, &set).unwrap(), 0.0);

        let larger = larger_assembly();
        assert_eq!(compute_min_rmsd(&larger, &larger).unwrap(), 0.0);
    }

    #[test]
    fn swapped_copies_still_have_zero_rmsd() {
        let set = reference_assembly();
        let swapped = planar(&[
            ("a..1", &[(1.0, 1.0)]),
            ("a..2", &[(-1.0, 1.0)]),
            ("b", &[(0.0, -1.0)]),
        ]);

        assert_eq!(compute_min_rmsd(&set, &swapped).unwrap(), 0.0);
        assert_eq!(compute_min_rmsd(&swapped, &set).unwrap(), 0.0);
    }

    #[test]
    fn min_rmsd_is_invariant_to_copy_labelling() {
        let template = planar(&[
            ("a..1", &[(0.0, 0.0), (1.0, 0.0)]),
            ("a..2", &[(5.0, 0.0), (6.0, 0.0)]),
        ]);
        let query = planar(&[
            ("a..1", &[(5.0, 1.0), (6.0, 1.0)]),
            ("a..2", &[(0.0, 1.0), (1.0, 1.0)]),
        ]);
        let relabelled = planar(&[
            ("a..1", &[(0.0, 1.0), (1.0, 1.0)]),
            ("a..2", &[(5.0, 1.0), (6.0, 1.0)]),
        ]);

        let rmsd = compute_min_rmsd(&query, &template).unwrap();
        let relabelled_rmsd = compute_min_rmsd(&relabelled, &template).unwrap();

        assert!((rmsd - 1.0).abs() < TOLERANCE);
        assert!((rmsd - relabelled_rmsd).abs() < TOLERANCE);
    }

    #[test]
    fn best_alignment_undoes_a_rigid_motion_with_permuted_copies() {
        let template = larger_assembly();
        let motion = Transformation::from_parts(
            Translation3::new(4.0, -3.0, 2.0),
            UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 0.9),
        );
        let mut query = template.transformed(&motion);
        let a1 = query.get("a..1").unwrap().to_vec();
        let a3 = query.get("a..3").unwrap().to_vec();
        query.insert("a..1", a3).unwrap();
        query.insert("a..3", a1).unwrap();

        let result = compute_best_alignment(&query, &template).unwrap();

        assert!(result.rmsd < 1e-6, "rmsd was {}", result.rmsd);
    }

    #[test]
    fn applying_the_returned_transformation_reproduces_the_rmsd() {
        let template = planar(&[
            ("a..1", &[(0.0, 0.0), (2.0, 0.3)]),
            ("a..2", &[(4.0, 1.0), (5.0, 2.5)]),
            ("b", &[(1.0, -3.0), (2.0, -1.0)]),
        ]);
        let query = LabeledPointSet::from_chains([
            ("a..1", vec![Point3::new(4.2, 0.8, 0.4), Point3::new(5.1, 2.7, -0.2)]),
            ("a..2", vec![Point3::new(0.1, -0.2, 0.3), Point3::new(2.2, 0.1, 0.0)]),
            ("b", vec![Point3::new(1.3, -2.8, -0.5), Point3::new(1.9, -1.2, 0.6)]),
        ])
        .unwrap();

        let result = compute_best_alignment(&query, &template).unwrap();
        let moved = query.transformed(&result.transformation);
        let rmsd_after = compute_min_rmsd(&moved, &template).unwrap();

        assert!(result.rmsd > 0.0);
        assert!((rmsd_after - result.rmsd).abs() < 1e-9);
    }

    #[test]
    fn mismatched_names_fail_before_any_rmsd_is_computed() {
        let query = planar(&[("a", &[(0.0, 0.0)]), ("b", &[(1.0, 0.0)])]);
        let template = planar(&[("a", &[(0.0, 0.0)]), ("z", &[(1.0, 0.0)])]);

        let alignment = Alignment::new(&query, &template);

        assert!(matches!(
            alignment.compute_min_rmsd(),
            Err(AnalysisError::StoichiometryMismatch { .. })
        ));
        assert!(matches!(
            alignment.compute_best_alignment(),
            Err(AnalysisError::StoichiometryMismatch { .. })
        ));
    }

    #[test]
    fn point_count_disagreement_is_a_size_mismatch() {
        let query = planar(&[("a", &[(0.0, 0.0), (1.0, 0.0)])]);
        let template = planar(&[("a", &[(0.0, 0.0)])]);

        assert!(matches!(
            compute_min_rmsd(&query, &template),
            Err(AnalysisError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn both_operations_share_one_resolved_space() {
        let set = reference_assembly();
        let alignment = Alignment::new(&set, &set);

        assert_eq!(alignment.compute_min_rmsd().unwrap(), 0.0);
        assert!(alignment.space.get().is_some());
        let result = alignment.compute_best_alignment().unwrap();
        assert!(result.rmsd < TOLERANCE);
    }
}
