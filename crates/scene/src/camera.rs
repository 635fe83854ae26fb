//! Perspective camera producing Vulkan clip-space matrices.

use glam::{Mat4, Vec3};

/// A look-at camera with a perspective projection.
///
/// The projection maps depth to `0..1` and flips Y, since Vulkan's clip
/// space has Y pointing down.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    /// Creates a camera at `(0, 0, 2)` looking at the origin.
    pub fn perspective(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, 2.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y: fov_y_degrees.to_radians(),
            aspect,
            near,
            far,
        }
    }

    pub fn look_at(&mut self, eye: Vec3, target: Vec3, up: Vec3) {
        self.eye = eye;
        self.target = target;
        self.up = up;
    }

    /// Updates the aspect ratio after a resize. Zero-height sizes are ignored.
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        let mut proj = Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far);
        proj.y_axis.y *= -1.0;
        proj
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    const EPSILON: f32 = 1e-5;

    fn clip_to_ndc(clip: Vec4) -> Vec3 {
        clip.truncate() / clip.w
    }

    fn camera() -> Camera {
        Camera::perspective(45.0, 800.0 / 600.0, 0.1, 100.0)
    }

    #[test]
    fn test_perspective_defaults() {
        let camera = camera();
        assert_eq!(camera.eye, Vec3::new(0.0, 0.0, 2.0));
        assert_eq!(camera.target, Vec3::ZERO);
        assert!((camera.fov_y - 45.0_f32.to_radians()).abs() < EPSILON);
    }

    #[test]
    fn test_view_moves_eye_to_origin() {
        let camera = camera();
        let eye_in_view = camera.view_matrix().transform_point3(camera.eye);
        assert!(eye_in_view.length() < EPSILON);

        let target_in_view = camera.view_matrix().transform_point3(camera.target);
        assert!((target_in_view - Vec3::new(0.0, 0.0, -2.0)).length() < EPSILON);
    }

    #[test]
    fn test_depth_range_is_zero_to_one() {
        let camera = camera();
        let proj = camera.projection_matrix();

        let near = clip_to_ndc(proj * Vec4::new(0.0, 0.0, -camera.near, 1.0));
        let far = clip_to_ndc(proj * Vec4::new(0.0, 0.0, -camera.far, 1.0));
        assert!(near.z.abs() < EPSILON);
        assert!((far.z - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_y_is_flipped() {
        let proj = camera().projection_matrix();
        let above = clip_to_ndc(proj * Vec4::new(0.0, 1.0, -5.0, 1.0));
        assert!(above.y < 0.0);
    }

    #[test]
    fn test_set_aspect() {
        let mut camera = camera();
        camera.set_aspect(1920, 1080);
        assert!((camera.aspect - 16.0 / 9.0).abs() < EPSILON);

        camera.set_aspect(100, 0);
        assert!((camera.aspect - 16.0 / 9.0).abs() < EPSILON);
    }

    #[test]
    fn test_look_at() {
        let mut camera = camera();
        camera.look_at(Vec3::new(3.0, 0.0, 0.0), Vec3::ZERO, Vec3::Y);
        let target = camera.view_matrix().transform_point3(Vec3::ZERO);
        assert!((target - Vec3::new(0.0, 0.0, -3.0)).length() < EPSILON);
    }
}
