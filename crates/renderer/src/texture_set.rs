//! Textures and their sampler descriptor sets (set 1).

use std::sync::Arc;

use ash::vk;
use tracing::info;

use renderer_resources::ImageData;
use renderer_rhi::command::CommandPool;
use renderer_rhi::descriptor::{
    DescriptorBindingBuilder, DescriptorPool, DescriptorSetLayout, image_info,
    update_descriptor_sets,
};
use renderer_rhi::device::Device;
use renderer_rhi::sampler::{Sampler, SamplerDesc};
use renderer_rhi::texture::Texture;

use crate::error::{RendererError, RendererResult};

/// Fixed-capacity set of textures sharing one sampler.
///
/// Texture ids are indices in upload order.
pub struct TextureSet {
    device: Arc<Device>,
    descriptor_sets: Vec<vk::DescriptorSet>,
    textures: Vec<Texture>,
    pool: DescriptorPool,
    layout: DescriptorSetLayout,
    sampler: Sampler,
    capacity: usize,
}

impl TextureSet {
    /// The layout of set 1: a combined image sampler at binding 0, read by
    /// the fragment stage.
    pub fn layout_bindings() -> [vk::DescriptorSetLayoutBinding<'static>; 1] {
        [DescriptorBindingBuilder::combined_image_sampler(
            0,
            vk::ShaderStageFlags::FRAGMENT,
        )]
    }

    pub fn new(device: Arc<Device>, capacity: usize) -> RendererResult<Self> {
        let sampler = Sampler::new(device.clone(), &SamplerDesc::default())?;
        let layout = DescriptorSetLayout::new(device.clone(), &Self::layout_bindings())?;
        let pool = DescriptorPool::new(
            device.clone(),
            capacity as u32,
            &[DescriptorPool::pool_size(
                vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                capacity as u32,
            )],
        )?;

        Ok(Self {
            device,
            descriptor_sets: Vec::with_capacity(capacity),
            textures: Vec::with_capacity(capacity),
            pool,
            layout,
            sampler,
            capacity,
        })
    }

    /// Uploads `image` and writes its descriptor set. Returns the texture id.
    pub fn add(&mut self, command_pool: &CommandPool, image: &ImageData) -> RendererResult<usize> {
        if self.textures.len() >= self.capacity {
            return Err(RendererError::TooManyObjects {
                kind: "textures",
                max: self.capacity,
            });
        }

        let texture = Texture::from_rgba8(
            self.device.clone(),
            command_pool,
            image.width,
            image.height,
            &image.pixels,
        )?;

        let set = self.pool.allocate(&[self.layout.handle()])?[0];
        let image_infos = [image_info(
            self.sampler.handle(),
            texture.view(),
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        )];
        let write = vk::WriteDescriptorSet::default()
            .dst_set(set)
            .dst_binding(0)
            .dst_array_element(0)
            .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
            .image_info(&image_infos);
        update_descriptor_sets(&self.device, &[write]);

        let id = self.textures.len();
        self.textures.push(texture);
        self.descriptor_sets.push(set);

        info!("Texture {} added ({}x{})", id, image.width, image.height);
        Ok(id)
    }

    pub fn descriptor_set(&self, id: usize) -> RendererResult<vk::DescriptorSet> {
        self.descriptor_sets
            .get(id)
            .copied()
            .ok_or(RendererError::InvalidTextureId(id))
    }

    pub fn contains(&self, id: usize) -> bool {
        id < self.textures.len()
    }

    #[inline]
    pub fn layout(&self) -> vk::DescriptorSetLayout {
        self.layout.handle()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
