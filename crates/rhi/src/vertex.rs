//! Vertex layout shared by the mesh upload path and the pipeline.
//!
//! | location | field       | format              | offset |
//! |----------|-------------|---------------------|--------|
//! | 0        | `position`  | `R32G32B32_SFLOAT`  | 0      |
//! | 1        | `color`     | `R32G32B32_SFLOAT`  | 12     |
//! | 2        | `tex_coord` | `R32G32_SFLOAT`     | 24     |

use std::mem::offset_of;

use ash::vk;
use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

/// Interleaved vertex: position, vertex color and texture coordinate.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: Vec3,
    pub color: Vec3,
    pub tex_coord: Vec2,
}

impl Vertex {
    #[inline]
    pub const fn new(position: Vec3, color: Vec3, tex_coord: Vec2) -> Self {
        Self {
            position,
            color,
            tex_coord,
        }
    }

    /// Size of one vertex in bytes.
    #[inline]
    pub const fn size() -> usize {
        std::mem::size_of::<Self>()
    }

    /// Binding 0, advanced per vertex.
    pub fn binding_description() -> vk::VertexInputBindingDescription {
        vk::VertexInputBindingDescription {
            binding: 0,
            stride: Self::size() as u32,
            input_rate: vk::VertexInputRate::VERTEX,
        }
    }

    pub fn attribute_descriptions() -> [vk::VertexInputAttributeDescription; 3] {
        [
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 0,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: offset_of!(Vertex, position) as u32,
            },
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 1,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: offset_of!(Vertex, color) as u32,
            },
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 2,
                format: vk::Format::R32G32_SFLOAT,
                offset: offset_of!(Vertex, tex_coord) as u32,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_size() {
        assert_eq!(Vertex::size(), 32);
        assert_eq!(Vertex::binding_description().stride, 32);
    }

    #[test]
    fn test_attribute_layout() {
        let attributes = Vertex::attribute_descriptions();

        let locations: Vec<u32> = attributes.iter().map(|a| a.location).collect();
        let offsets: Vec<u32> = attributes.iter().map(|a| a.offset).collect();
        assert_eq!(locations, [0, 1, 2]);
        assert_eq!(offsets, [0, 12, 24]);

        assert_eq!(attributes[0].format, vk::Format::R32G32B32_SFLOAT);
        assert_eq!(attributes[1].format, vk::Format::R32G32B32_SFLOAT);
        assert_eq!(attributes[2].format, vk::Format::R32G32_SFLOAT);
        assert!(attributes.iter().all(|a| a.binding == 0));
    }

    #[test]
    fn test_vertex_bytes_are_tightly_packed() {
        let vertices = [
            Vertex::new(Vec3::new(1.0, 2.0, 3.0), Vec3::ONE, Vec2::new(0.5, 0.25)),
            Vertex::default(),
        ];
        let bytes: &[u8] = bytemuck::cast_slice(&vertices);
        assert_eq!(bytes.len(), 64);

        let floats: &[f32] = bytemuck::cast_slice(&bytes[..32]);
        assert_eq!(floats, &[1.0, 2.0, 3.0, 1.0, 1.0, 1.0, 0.5, 0.25]);
    }

    #[test]
    fn test_binding_is_per_vertex() {
        let binding = Vertex::binding_description();
        assert_eq!(binding.binding, 0);
        assert_eq!(binding.input_rate, vk::VertexInputRate::VERTEX);
    }
}
