//! Coordinate Conventions
//!
//! A [`CoordinateConvention`] remaps global poses from the capture source's
//! axes and units into a target convention:
//!
//! ```text
//! position'    = (position · basisᵗ) × scale
//! orientation' = basis_quat ⊗ orientation
//! ```
//!
//! Positions are treated as row vectors multiplied by the transposed basis,
//! which is the same as `basis * position` for a column vector. Orientations
//! are rotated by left multiplication with the basis quaternion. These two
//! operations are deliberately different (one rotates a vector, the other
//! rotates a frame) and must not be swapped or mirrored; doing so flips
//! handedness without any visible error.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use mocap_fk::CoordinateConvention;
//!
//! // Y-up centimeters to Z-up meters (the default)
//! let convention = CoordinateConvention::z_up_meters();
//!
//! // Custom basis, rows given top to bottom
//! let convention = CoordinateConvention::new(
//!     [[0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
//!     0.01,
//! )?;
//! ```

use glam::{DMat3, DQuat, DVec3};

use crate::errors::{MocapError, Result};
use crate::kinematics::GlobalPoses;

/// Tolerance used to accept a basis matrix as orthonormal.
const BASIS_TOLERANCE: f64 = 1e-9;

/// Centimeters to meters.
pub const CENTIMETERS_TO_METERS: f64 = 1.0 / 100.0;

/// Immutable change-of-basis plus unit scale.
///
/// The quaternion form of the basis is derived once at construction and
/// reused for every joint and frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateConvention {
    basis: DMat3,
    rotation: DQuat,
    scale: f64,
}

impl CoordinateConvention {
    /// Creates a convention from a row-major basis matrix and a unit scale.
    ///
    /// The basis must be a proper rotation (orthonormal, determinant `+1`),
    /// so that the result is still right-handed. The scale must be finite and
    /// positive.
    pub fn new(basis_rows: [[f64; 3]; 3], scale: f64) -> Result<Self> {
        let basis = DMat3::from_cols_array_2d(&basis_rows).transpose();

        if !basis.is_finite() {
            return Err(MocapError::InvalidConvention(
                "basis contains non-finite values".to_string(),
            ));
        }
        if !(basis * basis.transpose()).abs_diff_eq(DMat3::IDENTITY, BASIS_TOLERANCE) {
            return Err(MocapError::InvalidConvention(format!(
                "basis {basis_rows:?} is not orthonormal"
            )));
        }
        if (basis.determinant() - 1.0).abs() > BASIS_TOLERANCE {
            return Err(MocapError::InvalidConvention(format!(
                "basis {basis_rows:?} is a reflection (determinant {})",
                basis.determinant()
            )));
        }
        if !scale.is_finite() || scale <= 0.0 {
            return Err(MocapError::InvalidConvention(format!(
                "scale must be finite and positive, got {scale}"
            )));
        }

        let rotation = DQuat::from_mat3(&basis).normalize();
        log::debug!(
            "Coordinate convention: basis {basis_rows:?}, scale {scale}, quat {rotation:?}"
        );

        Ok(Self {
            basis,
            rotation,
            scale,
        })
    }

    /// Y-up centimeters to Z-up meters.
    ///
    /// Basis rows `[[1,0,0],[0,0,-1],[0,1,0]]`, i.e. a +90° turn about X, and
    /// a scale of 1/100. Used by both capture sources.
    #[must_use]
    pub fn z_up_meters() -> Self {
        let basis = DMat3::from_cols(DVec3::X, DVec3::Z, DVec3::NEG_Y);
        Self {
            basis,
            rotation: DQuat::from_rotation_x(std::f64::consts::FRAC_PI_2),
            scale: CENTIMETERS_TO_METERS,
        }
    }

    /// Leaves poses untouched.
    #[must_use]
    pub const fn identity() -> Self {
        Self {
            basis: DMat3::IDENTITY,
            rotation: DQuat::IDENTITY,
            scale: 1.0,
        }
    }

    #[inline]
    #[must_use]
    pub fn basis(&self) -> DMat3 {
        self.basis
    }

    /// Quaternion equivalent of [`Self::basis`].
    #[inline]
    #[must_use]
    pub fn rotation(&self) -> DQuat {
        self.rotation
    }

    #[inline]
    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Converts one position into the target convention.
    #[inline]
    #[must_use]
    pub fn convert_position(&self, position: DVec3) -> DVec3 {
        (self.basis * position) * self.scale
    }

    /// Converts one orientation into the target convention.
    #[inline]
    #[must_use]
    pub fn convert_orientation(&self, orientation: DQuat) -> DQuat {
        self.rotation * orientation
    }

    /// Maps a converted position back into the source convention.
    #[inline]
    #[must_use]
    pub fn revert_position(&self, position: DVec3) -> DVec3 {
        self.basis.transpose() * (position / self.scale)
    }

    /// Maps a converted orientation back into the source convention.
    #[inline]
    #[must_use]
    pub fn revert_orientation(&self, orientation: DQuat) -> DQuat {
        self.rotation.conjugate() * orientation
    }

    /// Converts every pose of every frame in place.
    pub fn convert(&self, poses: &mut GlobalPoses) {
        for position in &mut poses.positions {
            *position = self.convert_position(*position);
        }
        for rotation in &mut poses.rotations {
            *rotation = self.convert_orientation(*rotation);
        }
    }
}

impl Default for CoordinateConvention {
    fn default() -> Self {
        Self::z_up_meters()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROWS: [[f64; 3]; 3] = [[1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]];

    #[test]
    fn test_preset_matches_matrix_derivation() {
        let preset = CoordinateConvention::z_up_meters();
        let derived = CoordinateConvention::new(ROWS, CENTIMETERS_TO_METERS).unwrap();

        assert!(preset.basis().abs_diff_eq(derived.basis(), 1e-12));
        // q and -q are the same rotation
        let dot = preset.rotation().dot(derived.rotation()).abs();
        assert!((dot - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_basis_and_quaternion_agree() {
        let convention = CoordinateConvention::z_up_meters();
        let v = DVec3::new(0.3, -1.2, 2.5);
        let by_matrix = convention.basis() * v;
        let by_quat = convention.rotation() * v;
        assert!(by_matrix.abs_diff_eq(by_quat, 1e-12));
    }

    #[test]
    fn test_y_up_becomes_z_up() {
        let convention = CoordinateConvention::z_up_meters();
        let up = convention.convert_position(DVec3::new(0.0, 100.0, 0.0));
        assert!(up.abs_diff_eq(DVec3::new(0.0, 0.0, 1.0), 1e-12));
        let forward = convention.convert_position(DVec3::new(0.0, 0.0, 100.0));
        assert!(forward.abs_diff_eq(DVec3::new(0.0, -1.0, 0.0), 1e-12));
    }

    #[test]
    fn test_rejects_reflection_and_bad_scale() {
        let mirrored = [[-1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        assert!(CoordinateConvention::new(mirrored, 1.0).is_err());

        let skewed = [[1.0, 0.1, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        assert!(CoordinateConvention::new(skewed, 1.0).is_err());

        assert!(CoordinateConvention::new(ROWS, 0.0).is_err());
        assert!(CoordinateConvention::new(ROWS, f64::NAN).is_err());
    }
}
