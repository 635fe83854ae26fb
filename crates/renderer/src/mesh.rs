//! GPU-resident meshes.

use std::sync::Arc;

use ash::vk;
use glam::Mat4;

use renderer_resources::MeshData;
use renderer_rhi::RhiResult;
use renderer_rhi::buffer::{Buffer, BufferUsage};
use renderer_rhi::command::{CommandBuffer, CommandPool};
use renderer_rhi::device::Device;

/// Device-local vertex and index buffers plus the mesh's model matrix and
/// the id of the texture it samples.
pub struct Mesh {
    vertex_buffer: Buffer,
    index_buffer: Buffer,
    vertex_count: u32,
    index_count: u32,
    texture_id: usize,
    model: Mat4,
}

impl Mesh {
    /// Uploads `data` through staging buffers on `pool`'s queue.
    pub fn new(
        device: Arc<Device>,
        pool: &CommandPool,
        data: &MeshData,
        texture_id: usize,
    ) -> RhiResult<Self> {
        let vertex_buffer = Buffer::device_local_with_data(
            device.clone(),
            pool,
            BufferUsage::Vertex,
            bytemuck::cast_slice(data.vertices()),
        )?;
        let index_buffer = Buffer::device_local_with_data(
            device,
            pool,
            BufferUsage::Index,
            bytemuck::cast_slice(data.indices()),
        )?;

        Ok(Self {
            vertex_buffer,
            index_buffer,
            vertex_count: data.vertex_count() as u32,
            index_count: data.index_count() as u32,
            texture_id,
            model: Mat4::IDENTITY,
        })
    }

    /// Binds both buffers and issues the indexed draw.
    ///
    /// Descriptor sets and the model push constant must already be bound.
    pub fn record_draw(&self, cmd: &CommandBuffer) {
        cmd.bind_vertex_buffers(0, &[self.vertex_buffer.handle()], &[0]);
        cmd.bind_index_buffer(self.index_buffer.handle(), 0, vk::IndexType::UINT32);
        cmd.draw_indexed(self.index_count, 1, 0, 0, 0);
    }

    pub fn set_model(&mut self, model: Mat4) {
        self.model = model;
    }

    #[inline]
    pub fn model(&self) -> Mat4 {
        self.model
    }

    #[inline]
    pub fn texture_id(&self) -> usize {
        self.texture_id
    }

    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    #[inline]
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    #[inline]
    pub fn vertex_buffer(&self) -> vk::Buffer {
        self.vertex_buffer.handle()
    }

    #[inline]
    pub fn index_buffer(&self) -> vk::Buffer {
        self.index_buffer.handle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mesh_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Mesh>();
    }

    #[test]
    fn test_index_bytes_match_u32_index_type() {
        let data = MeshData::quad(-2.5, glam::Vec3::X);
        let bytes: &[u8] = bytemuck::cast_slice(data.indices());
        assert_eq!(bytes.len(), data.index_count() * 4);
    }
}
