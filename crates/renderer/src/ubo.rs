//! Shader-visible data layouts.
//!
//! Both structs use `#[repr(C)]` and match the GLSL declarations in
//! `shaders/shader.vert`:
//!
//! ```glsl
//! layout(set = 0, binding = 0) uniform UboViewProjection {
//!     mat4 projection;
//!     mat4 view;
//! } uboViewProjection;
//!
//! layout(push_constant) uniform PushModel {
//!     mat4 model;
//! } pushModel;
//! ```

use ash::vk;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use renderer_scene::Camera;

/// View and projection matrices, uploaded once per frame.
///
/// # Memory Layout
///
/// - Offset 0: projection matrix (64 bytes)
/// - Offset 64: view matrix (64 bytes)
/// - Total size: 128 bytes
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct UboViewProjection {
    pub projection: Mat4,
    pub view: Mat4,
}

impl UboViewProjection {
    pub const SIZE: usize = std::mem::size_of::<Self>();

    pub fn from_camera(camera: &Camera) -> Self {
        Self {
            projection: camera.projection_matrix(),
            view: camera.view_matrix(),
        }
    }
}

impl Default for UboViewProjection {
    fn default() -> Self {
        Self {
            projection: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
        }
    }
}

/// Per-draw model matrix, pushed to the vertex stage.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ModelPushConstant {
    pub model: Mat4,
}

impl ModelPushConstant {
    pub const SIZE: usize = std::mem::size_of::<Self>();
    pub const STAGES: vk::ShaderStageFlags = vk::ShaderStageFlags::VERTEX;

    pub fn new(model: Mat4) -> Self {
        Self { model }
    }

    /// The single push constant range of the pipeline layout.
    pub fn push_constant_range() -> vk::PushConstantRange {
        vk::PushConstantRange {
            stage_flags: Self::STAGES,
            offset: 0,
            size: Self::SIZE as u32,
        }
    }
}

impl Default for ModelPushConstant {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_view_projection_size() {
        assert_eq!(UboViewProjection::SIZE, 128);
        assert_eq!(std::mem::align_of::<UboViewProjection>(), 16);
    }

    #[test]
    fn test_projection_comes_first() {
        let ubo = UboViewProjection {
            projection: Mat4::from_scale(Vec3::splat(2.0)),
            view: Mat4::IDENTITY,
        };
        let floats: &[f32] = bytemuck::cast_slice(bytemuck::bytes_of(&ubo));
        assert_eq!(floats.len(), 32);
        assert_eq!(floats[0], 2.0);
        assert_eq!(floats[16], 1.0);
    }

    #[test]
    fn test_from_camera() {
        let camera = Camera::perspective(45.0, 800.0 / 600.0, 0.1, 100.0);
        let ubo = UboViewProjection::from_camera(&camera);
        assert_eq!(ubo.view, camera.view_matrix());
        assert_eq!(ubo.projection, camera.projection_matrix());
    }

    #[test]
    fn test_push_constant_range() {
        let range = ModelPushConstant::push_constant_range();
        assert_eq!(range.offset, 0);
        assert_eq!(range.size, 64);
        assert_eq!(range.stage_flags, vk::ShaderStageFlags::VERTEX);
    }

    #[test]
    fn test_push_constant_defaults_to_identity() {
        let push = ModelPushConstant::default();
        assert_eq!(push.model, Mat4::IDENTITY);
        assert_eq!(bytemuck::bytes_of(&push).len(), ModelPushConstant::SIZE);
    }
}
