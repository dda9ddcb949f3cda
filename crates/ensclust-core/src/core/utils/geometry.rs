use crate::core::models::transform::Transformation;
use nalgebra::{Matrix3, Point3, Rotation3, Translation3, UnitQuaternion, Vector3};

/// Root-mean-square deviation between two equal-length point sequences.
///
/// Returns `None` when the lengths differ or the sequences are empty.
pub fn calculate_rmsd(coords1: &[Point3<f64>], coords2: &[Point3<f64>]) -> Option<f64> {
    if coords1.len() != coords2.len() || coords1.is_empty() {
        return None;
    }
    let n = coords1.len() as f64;
    Some((squared_deviation_sum(coords1, coords2) / n).sqrt())
}

/// Sum of squared point-to-point distances over the common prefix of both sequences.
pub fn squared_deviation_sum(coords1: &[Point3<f64>], coords2: &[Point3<f64>]) -> f64 {
    coords1
        .iter()
        .zip(coords2.iter())
        .map(|(p1, p2)| (p1 - p2).norm_squared())
        .sum()
}

pub fn centroid(points: &[Point3<f64>]) -> Point3<f64> {
    let sum: Vector3<f64> = points.iter().map(|p| p.coords).sum();
    Point3::from(sum / points.len() as f64)
}

/// Rigid transformation minimizing the squared distances from `from_points` onto `to_points`.
///
/// Solves the orthogonal Procrustes problem through the SVD of the cross-covariance matrix,
/// flipping the weakest singular direction when the raw solution is a reflection.
/// Returns `None` when the lengths differ or the sequences are empty.
pub fn superpose(from_points: &[Point3<f64>], to_points: &[Point3<f64>]) -> Option<Transformation> {
    if from_points.len() != to_points.len() || from_points.is_empty() {
        return None;
    }

    let from_centroid = centroid(from_points);
    let to_centroid = centroid(to_points);

    let h = from_points
        .iter()
        .zip(to_points.iter())
        .fold(Matrix3::zeros(), |acc, (f, t)| {
            acc + (t - to_centroid) * (f - from_centroid).transpose()
        });

    let svd = h.svd(true, true);
    let u = svd.u?;
    let v_t = svd.v_t?;

    let mut correction = Matrix3::identity();
    if (u * v_t).determinant() < 0.0 {
        correction[(2, 2)] = -1.0;
    }

    let rotation = Rotation3::from_matrix(&(u * correction * v_t));
    let translation = to_centroid.coords - rotation * from_centroid.coords;

    Some(Transformation::from_parts(
        Translation3::from(translation),
        UnitQuaternion::from_rotation_matrix(&rotation),
    ))
}
