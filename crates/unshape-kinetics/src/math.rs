//! Transform composition on top of glam.
//!
//! Bodies carry a position, an Euler rotation (radians, applied X then Y then Z)
//! and a per-axis scale. This module turns that triple into the world matrix
//! used by the collision pipeline.

use glam::{Mat3, Mat4, Quat, Vec3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Position, Euler rotation and scale of a body.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Transform {
    /// Translation in world space.
    pub position: Vec3,
    /// Rotation about X, Y and Z in radians.
    pub rotation: Vec3,
    /// Scale along each axis.
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// No translation, no rotation, unit scale.
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Vec3::ZERO,
        scale: Vec3::ONE,
    };

    /// Creates a transform.
    pub fn new(position: Vec3, rotation: Vec3, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Creates a pure translation.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// World matrix: `translate * scale * rotate_x * rotate_y * rotate_z`.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_scale(self.scale)
            * Mat4::from_rotation_x(self.rotation.x)
            * Mat4::from_rotation_y(self.rotation.y)
            * Mat4::from_rotation_z(self.rotation.z)
    }

    /// The rotation part as a quaternion (`Rx * Ry * Rz`).
    pub fn orientation(&self) -> Quat {
        Quat::from_rotation_x(self.rotation.x)
            * Quat::from_rotation_y(self.rotation.y)
            * Quat::from_rotation_z(self.rotation.z)
    }

    /// Largest absolute scale factor.
    ///
    /// Used to grow bounding radii; exact only for uniform scale.
    pub fn max_axis_scale(&self) -> f32 {
        self.scale.abs().max_element()
    }
}

/// Matrix that maps local face normals to world-space directions.
///
/// This is the inverse-transpose of the linear part of `matrix` scaled by
/// `|det|`, so results need normalising but tiny scales stay well conditioned.
/// A singular linear part (zero scale on some axis) falls back to the linear
/// part itself.
pub fn normal_matrix(matrix: &Mat4) -> Mat3 {
    let linear = Mat3::from_mat4(*matrix);
    let cofactor = Mat3::from_cols(
        linear.y_axis.cross(linear.z_axis),
        linear.z_axis.cross(linear.x_axis),
        linear.x_axis.cross(linear.y_axis),
    );
    let det = linear.x_axis.dot(cofactor.x_axis);
    if det == 0.0 || !det.is_finite() {
        linear
    } else {
        cofactor * det.signum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn test_identity_matrix() {
        assert_eq!(Transform::IDENTITY.matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn test_translation_applied_last() {
        let t = Transform::new(Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO, Vec3::splat(2.0));
        let p = t.matrix().transform_point3(Vec3::X);
        assert!(approx(p, Vec3::new(3.0, 2.0, 3.0)), "p = {:?}", p);
    }

    #[test]
    fn test_rotation_order() {
        // Z is applied to the point first, then Y, then X.
        let t = Transform::new(Vec3::ZERO, Vec3::new(FRAC_PI_2, 0.0, FRAC_PI_2), Vec3::ONE);
        let p = t.matrix().transform_point3(Vec3::X);
        // Rz takes X to Y, Rx takes Y to Z.
        assert!(approx(p, Vec3::Z), "p = {:?}", p);
    }

    #[test]
    fn test_orientation_matches_matrix() {
        let t = Transform::new(Vec3::ZERO, Vec3::new(0.3, -1.1, 0.7), Vec3::ONE);
        let v = Vec3::new(0.2, 0.5, -0.9);
        let by_matrix = t.matrix().transform_vector3(v);
        let by_quat = t.orientation() * v;
        assert!(approx(by_matrix, by_quat));
    }

    #[test]
    fn test_max_axis_scale() {
        let t = Transform::new(Vec3::ZERO, Vec3::ZERO, Vec3::new(1.0, -3.0, 2.0));
        assert_eq!(t.max_axis_scale(), 3.0);
    }

    #[test]
    fn test_normal_matrix_non_uniform_scale() {
        // Stretching along X tilts a diagonal face normal toward Y.
        let t = Transform::new(Vec3::ZERO, Vec3::ZERO, Vec3::new(2.0, 1.0, 1.0));
        let n = (normal_matrix(&t.matrix()) * Vec3::new(1.0, 1.0, 0.0)).normalize();
        assert!(n.y > n.x, "n = {:?}", n);
    }

    #[test]
    fn test_normal_matrix_tiny_scale() {
        let t = Transform::new(Vec3::ZERO, Vec3::ZERO, Vec3::new(0.001, 0.001, 0.1));
        let n = (normal_matrix(&t.matrix()) * Vec3::new(0.0, 1.0, 1.0)).normalize();
        assert!(approx(n, Vec3::new(0.0, 100.0, 1.0).normalize()), "n = {:?}", n);
    }

    #[test]
    fn test_normal_matrix_mirror_keeps_outward() {
        let t = Transform::new(Vec3::ZERO, Vec3::ZERO, Vec3::new(-1.0, 1.0, 1.0));
        let m = normal_matrix(&t.matrix());
        assert!(approx((m * Vec3::X).normalize(), Vec3::NEG_X));
        assert!(approx((m * Vec3::Y).normalize(), Vec3::Y));
    }

    #[test]
    fn test_normal_matrix_singular_fallback() {
        let t = Transform::new(Vec3::ZERO, Vec3::ZERO, Vec3::new(0.0, 1.0, 1.0));
        let m = normal_matrix(&t.matrix());
        assert_eq!(m * Vec3::Y, Vec3::Y);
    }
}
