use nalgebra::{Isometry3, Quaternion, Translation3, UnitQuaternion};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const UNIT_NORM_TOLERANCE: f64 = 1e-6;

/// A rigid-body rotation followed by a translation.
pub type Transformation = Isometry3<f64>;

/// Numeric components of a [`Transformation`] suitable for persistence.
///
/// `rotation` is a unit quaternion stored as `[w, i, j, k]`; `translation` is `[x, y, z]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompactTransform {
    pub rotation: [f64; 4],
    pub translation: [f64; 3],
}

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum TransformError {
    #[error("transform has a non-finite component")]
    NonFinite,
    #[error("rotation quaternion has norm {0}, expected 1")]
    NotUnitRotation(f64),
}

impl CompactTransform {
    /// Rebuilds the live transformation.
    ///
    /// The quaternion is renormalized, so its norm only has to be 1 within a small
    /// tolerance.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError`] for non-finite components or a quaternion that is not
    /// a unit rotation.
    pub fn to_transformation(&self) -> Result<Transformation, TransformError> {
        if self
            .rotation
            .iter()
            .chain(self.translation.iter())
            .any(|v| !v.is_finite())
        {
            return Err(TransformError::NonFinite);
        }
        let [w, i, j, k] = self.rotation;
        let quaternion = Quaternion::new(w, i, j, k);
        let norm = quaternion.norm();
        if (norm - 1.0).abs() > UNIT_NORM_TOLERANCE {
            return Err(TransformError::NotUnitRotation(norm));
        }
        let [x, y, z] = self.translation;
        Ok(Isometry3::from_parts(
            Translation3::new(x, y, z),
            UnitQuaternion::from_quaternion(quaternion),
        ))
    }
}

impl From<&Transformation> for CompactTransform {
    fn from(transform: &Transformation) -> Self {
        let q = transform.rotation.quaternion();
        let t = &transform.translation.vector;
        Self {
            rotation: [q.w, q.i, q.j, q.k],
            translation: [t.x, t.y, t.z],
        }
    }
}
