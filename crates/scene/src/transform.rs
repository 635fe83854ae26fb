//! Object transform producing model matrices.
//!
//! ```
//! use renderer_scene::Transform;
//! use glam::Vec3;
//!
//! let mut t = Transform::from_translation(Vec3::new(0.0, 0.0, -2.5));
//! t.rotate_z(90.0_f32.to_radians());
//! let p = t.to_matrix().transform_point3(Vec3::X);
//! assert!((p - Vec3::new(0.0, 1.0, -2.5)).length() < 1e-5);
//! ```

use glam::{Mat4, Quat, Vec3};

/// Translation, rotation and scale, applied as `T * R * S`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::default()
        }
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Adds a rotation of `angle` radians about the local Z axis.
    pub fn rotate_z(&mut self, angle: f32) {
        self.rotation = (self.rotation * Quat::from_rotation_z(angle)).normalize();
    }

    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_default_is_identity() {
        assert_eq!(Transform::default().to_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn test_translation() {
        let t = Transform::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let p = t.to_matrix().transform_point3(Vec3::ZERO);
        assert!((p - Vec3::new(1.0, 2.0, 3.0)).length() < EPSILON);
    }

    #[test]
    fn test_rotate_z_accumulates() {
        let mut t = Transform::default();
        t.rotate_z(45.0_f32.to_radians());
        t.rotate_z(45.0_f32.to_radians());
        let p = t.to_matrix().transform_point3(Vec3::X);
        assert!((p - Vec3::Y).length() < EPSILON);
    }

    #[test]
    fn test_scale_applies_before_translation() {
        let t = Transform::from_translation(Vec3::new(0.0, 0.0, -2.0)).with_scale(Vec3::splat(2.0));
        let p = t.to_matrix().transform_point3(Vec3::X);
        assert!((p - Vec3::new(2.0, 0.0, -2.0)).length() < EPSILON);
    }
}
