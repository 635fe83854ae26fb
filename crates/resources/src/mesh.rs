//! Indexed triangle meshes.

use glam::{Vec2, Vec3};
use renderer_rhi::vertex::Vertex;

use crate::{ResourceError, ResourceResult};

/// Half the side length of [`MeshData::quad`].
pub const QUAD_HALF_EXTENT: f32 = 0.4;

/// Vertices plus a triangle-list index buffer.
///
/// Construction checks that the mesh is non-empty and that every index
/// addresses an existing vertex, so an uploaded mesh never reads out of
/// bounds on the GPU.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshData {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

impl MeshData {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> ResourceResult<Self> {
        if vertices.is_empty() || indices.is_empty() {
            return Err(ResourceError::EmptyMesh {
                vertices: vertices.len(),
                indices: indices.len(),
            });
        }

        if let Some((position, &index)) = indices
            .iter()
            .enumerate()
            .find(|&(_, &index)| index as usize >= vertices.len())
        {
            return Err(ResourceError::IndexOutOfRange {
                position,
                index,
                vertex_count: vertices.len(),
            });
        }

        Ok(Self { vertices, indices })
    }

    /// A textured square in the plane `z = center_z`, facing +Z, tinted
    /// with `color`. Triangles wind counter-clockwise.
    pub fn quad(center_z: f32, color: Vec3) -> Self {
        let h = QUAD_HALF_EXTENT;
        let vertices = vec![
            Vertex::new(Vec3::new(-h, h, center_z), color, Vec2::new(0.0, 0.0)),
            Vertex::new(Vec3::new(-h, -h, center_z), color, Vec2::new(0.0, 1.0)),
            Vertex::new(Vec3::new(h, -h, center_z), color, Vec2::new(1.0, 1.0)),
            Vertex::new(Vec3::new(h, h, center_z), color, Vec2::new(1.0, 0.0)),
        ];
        let indices = vec![0, 1, 2, 2, 3, 0];

        Self { vertices, indices }
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex(x: f32, y: f32) -> Vertex {
        Vertex::new(Vec3::new(x, y, 0.0), Vec3::ONE, Vec2::ZERO)
    }

    #[test]
    fn test_new_accepts_valid_mesh() {
        let mesh = MeshData::new(
            vec![vertex(0.0, 0.0), vertex(1.0, 0.0), vertex(0.0, 1.0)],
            vec![0, 1, 2],
        )
        .unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.index_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn test_new_rejects_empty() {
        assert!(matches!(
            MeshData::new(Vec::new(), vec![0]),
            Err(ResourceError::EmptyMesh { vertices: 0, indices: 1 })
        ));
        assert!(matches!(
            MeshData::new(vec![vertex(0.0, 0.0)], Vec::new()),
            Err(ResourceError::EmptyMesh { vertices: 1, indices: 0 })
        ));
    }

    #[test]
    fn test_new_rejects_out_of_range_index() {
        let err = MeshData::new(vec![vertex(0.0, 0.0), vertex(1.0, 0.0)], vec![0, 1, 2]).unwrap_err();
        assert!(matches!(
            err,
            ResourceError::IndexOutOfRange {
                position: 2,
                index: 2,
                vertex_count: 2
            }
        ));
    }

    #[test]
    fn test_quad_layout() {
        let quad = MeshData::quad(-2.5, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(quad.vertex_count(), 4);
        assert_eq!(quad.indices(), &[0, 1, 2, 2, 3, 0]);
        assert!(quad.vertices().iter().all(|v| v.position.z == -2.5));
        assert!(quad.vertices().iter().all(|v| v.color == Vec3::X));

        let uv_min = quad.vertices().iter().map(|v| v.tex_coord).reduce(Vec2::min).unwrap();
        let uv_max = quad.vertices().iter().map(|v| v.tex_coord).reduce(Vec2::max).unwrap();
        assert_eq!(uv_min, Vec2::ZERO);
        assert_eq!(uv_max, Vec2::ONE);
    }

    #[test]
    fn test_quad_triangles_face_positive_z() {
        let quad = MeshData::quad(0.0, Vec3::ONE);
        for tri in quad.indices().chunks_exact(3) {
            let [a, b, c] = [0, 1, 2].map(|i| quad.vertices()[tri[i] as usize].position);
            let normal = (b - a).cross(c - a);
            assert!(normal.z > 0.0);
        }
    }
}
