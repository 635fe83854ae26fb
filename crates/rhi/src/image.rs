//! GPU images, image views and layout transitions.
//!
//! - [`Image`] wraps a VkImage in gpu-allocator managed device-local memory
//! - [`ImageView`] is an RAII view over any image, including swapchain images
//! - [`layout_transition`] holds the barrier recipes used by the texture upload path

use std::sync::Arc;

use ash::vk;
use gpu_allocator::MemoryLocation;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use tracing::{debug, error};

use crate::command::CommandBuffer;
use crate::device::Device;
use crate::error::{RhiError, RhiResult};

/// Access masks and pipeline stages for one image layout transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayoutTransition {
    pub src_access: vk::AccessFlags,
    pub dst_access: vk::AccessFlags,
    pub src_stage: vk::PipelineStageFlags,
    pub dst_stage: vk::PipelineStageFlags,
}

/// Returns the barrier masks for moving an image from `old` to `new`.
///
/// Only the two transitions of the texture upload path are supported:
/// `UNDEFINED -> TRANSFER_DST_OPTIMAL` and
/// `TRANSFER_DST_OPTIMAL -> SHADER_READ_ONLY_OPTIMAL`.
pub fn layout_transition(
    old: vk::ImageLayout,
    new: vk::ImageLayout,
) -> RhiResult<LayoutTransition> {
    match (old, new) {
        (vk::ImageLayout::UNDEFINED, vk::ImageLayout::TRANSFER_DST_OPTIMAL) => {
            Ok(LayoutTransition {
                src_access: vk::AccessFlags::empty(),
                dst_access: vk::AccessFlags::TRANSFER_WRITE,
                src_stage: vk::PipelineStageFlags::TOP_OF_PIPE,
                dst_stage: vk::PipelineStageFlags::TRANSFER,
            })
        }
        (vk::ImageLayout::TRANSFER_DST_OPTIMAL, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL) => {
            Ok(LayoutTransition {
                src_access: vk::AccessFlags::TRANSFER_WRITE,
                dst_access: vk::AccessFlags::SHADER_READ,
                src_stage: vk::PipelineStageFlags::TRANSFER,
                dst_stage: vk::PipelineStageFlags::FRAGMENT_SHADER,
            })
        }
        _ => Err(RhiError::UnsupportedLayoutTransition { old, new }),
    }
}

/// Single mip, single layer subresource range.
fn single_subresource(aspect: vk::ImageAspectFlags) -> vk::ImageSubresourceRange {
    vk::ImageSubresourceRange::default()
        .aspect_mask(aspect)
        .base_mip_level(0)
        .level_count(1)
        .base_array_layer(0)
        .layer_count(1)
}

/// Records a color image layout transition barrier into `cmd`.
pub fn cmd_transition_layout(
    cmd: &CommandBuffer,
    image: vk::Image,
    old: vk::ImageLayout,
    new: vk::ImageLayout,
) -> RhiResult<()> {
    let transition = layout_transition(old, new)?;

    let barrier = vk::ImageMemoryBarrier::default()
        .old_layout(old)
        .new_layout(new)
        .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .image(image)
        .subresource_range(single_subresource(vk::ImageAspectFlags::COLOR))
        .src_access_mask(transition.src_access)
        .dst_access_mask(transition.dst_access);

    cmd.pipeline_barrier(transition.src_stage, transition.dst_stage, &[barrier]);
    Ok(())
}

/// Describes a tightly packed `width x height x 1` color copy into mip 0.
pub fn buffer_image_copy(width: u32, height: u32) -> vk::BufferImageCopy {
    vk::BufferImageCopy::default()
        .buffer_offset(0)
        .buffer_row_length(0)
        .buffer_image_height(0)
        .image_subresource(
            vk::ImageSubresourceLayers::default()
                .aspect_mask(vk::ImageAspectFlags::COLOR)
                .mip_level(0)
                .base_array_layer(0)
                .layer_count(1),
        )
        .image_offset(vk::Offset3D { x: 0, y: 0, z: 0 })
        .image_extent(vk::Extent3D {
            width,
            height,
            depth: 1,
        })
}

/// Records a copy of `buffer` into `image`, which must be in
/// `TRANSFER_DST_OPTIMAL`.
pub fn cmd_copy_buffer_to_image(
    cmd: &CommandBuffer,
    buffer: vk::Buffer,
    image: vk::Image,
    width: u32,
    height: u32,
) {
    cmd.copy_buffer_to_image(
        buffer,
        image,
        vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        &[buffer_image_copy(width, height)],
    );
}

/// Picks the first candidate whose features for `tiling` include `features`.
pub fn choose_supported_format(
    device: &Device,
    candidates: &[vk::Format],
    tiling: vk::ImageTiling,
    features: vk::FormatFeatureFlags,
) -> RhiResult<vk::Format> {
    first_supported_format(candidates, tiling, features, |format| {
        device.format_properties(format)
    })
}

fn first_supported_format(
    candidates: &[vk::Format],
    tiling: vk::ImageTiling,
    features: vk::FormatFeatureFlags,
    mut properties: impl FnMut(vk::Format) -> vk::FormatProperties,
) -> RhiResult<vk::Format> {
    candidates
        .iter()
        .copied()
        .find(|&format| {
            let props = properties(format);
            match tiling {
                vk::ImageTiling::LINEAR => props.linear_tiling_features.contains(features),
                vk::ImageTiling::OPTIMAL => props.optimal_tiling_features.contains(features),
                _ => false,
            }
        })
        .ok_or_else(|| RhiError::UnsupportedFormat(candidates.to_vec()))
}

/// RAII image view.
pub struct ImageView {
    device: Arc<Device>,
    view: vk::ImageView,
}

impl ImageView {
    /// Creates a 2D view over mip 0 / layer 0 of `image`.
    pub fn new(
        device: Arc<Device>,
        image: vk::Image,
        format: vk::Format,
        aspect: vk::ImageAspectFlags,
    ) -> RhiResult<Self> {
        let create_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .components(vk::ComponentMapping {
                r: vk::ComponentSwizzle::IDENTITY,
                g: vk::ComponentSwizzle::IDENTITY,
                b: vk::ComponentSwizzle::IDENTITY,
                a: vk::ComponentSwizzle::IDENTITY,
            })
            .subresource_range(single_subresource(aspect));

        let view = unsafe { device.handle().create_image_view(&create_info, None)? };

        Ok(Self { device, view })
    }

    #[inline]
    pub fn handle(&self) -> vk::ImageView {
        self.view
    }
}

impl Drop for ImageView {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_image_view(self.view, None);
        }
    }
}

/// 2D image in device-local memory.
pub struct Image {
    device: Arc<Device>,
    image: vk::Image,
    allocation: Option<Allocation>,
    format: vk::Format,
    extent: vk::Extent2D,
    name: &'static str,
}

impl Image {
    /// Creates a single-mip 2D image and binds GPU-only memory to it.
    ///
    /// The image starts in `UNDEFINED` layout.
    pub fn new(
        device: Arc<Device>,
        width: u32,
        height: u32,
        format: vk::Format,
        tiling: vk::ImageTiling,
        usage: vk::ImageUsageFlags,
        name: &'static str,
    ) -> RhiResult<Self> {
        if width == 0 || height == 0 {
            return Err(RhiError::InvalidHandle(format!(
                "Image '{}' dimensions must be greater than 0",
                name
            )));
        }

        let image_info = vk::ImageCreateInfo::default()
            .image_type(vk::ImageType::TYPE_2D)
            .format(format)
            .extent(vk::Extent3D {
                width,
                height,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(1)
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(tiling)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        let image = unsafe { device.handle().create_image(&image_info, None)? };
        let requirements = unsafe { device.handle().get_image_memory_requirements(image) };

        let allocation = device.lock_allocator().and_then(|mut allocator| {
            allocator
                .allocate(&AllocationCreateDesc {
                    name,
                    requirements,
                    location: MemoryLocation::GpuOnly,
                    linear: tiling == vk::ImageTiling::LINEAR,
                    allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                })
                .map_err(RhiError::from)
        });
        let allocation = match allocation {
            Ok(allocation) => allocation,
            Err(e) => {
                unsafe { device.handle().destroy_image(image, None) };
                return Err(e);
            }
        };

        let image = Self {
            device,
            image,
            allocation: Some(allocation),
            format,
            extent: vk::Extent2D { width, height },
            name,
        };

        if let Some(allocation) = &image.allocation {
            unsafe {
                image.device.handle().bind_image_memory(
                    image.image,
                    allocation.memory(),
                    allocation.offset(),
                )?;
            }
        }

        debug!("Created image '{}': {}x{} ({:?})", name, width, height, format);
        Ok(image)
    }

    /// Creates a view over this image.
    pub fn create_view(&self, aspect: vk::ImageAspectFlags) -> RhiResult<ImageView> {
        ImageView::new(self.device.clone(), self.image, self.format, aspect)
    }

    #[inline]
    pub fn handle(&self) -> vk::Image {
        self.image
    }

    #[inline]
    pub fn format(&self) -> vk::Format {
        self.format
    }

    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }
}

impl Drop for Image {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_image(self.image, None);
        }

        if let Some(allocation) = self.allocation.take() {
            match self.device.lock_allocator() {
                Ok(mut allocator) => {
                    if let Err(e) = allocator.free(allocation) {
                        error!("Failed to free image '{}' allocation: {:?}", self.name, e);
                    }
                }
                Err(e) => error!("Leaking image '{}' allocation: {}", self.name, e),
            }
        }

        debug!("Destroyed image '{}'", self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undefined_to_transfer_dst() {
        let t = layout_transition(
            vk::ImageLayout::UNDEFINED,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        )
        .unwrap();
        assert_eq!(t.src_access, vk::AccessFlags::empty());
        assert_eq!(t.dst_access, vk::AccessFlags::TRANSFER_WRITE);
        assert_eq!(t.src_stage, vk::PipelineStageFlags::TOP_OF_PIPE);
        assert_eq!(t.dst_stage, vk::PipelineStageFlags::TRANSFER);
    }

    #[test]
    fn test_transfer_dst_to_shader_read() {
        let t = layout_transition(
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        )
        .unwrap();
        assert_eq!(t.src_access, vk::AccessFlags::TRANSFER_WRITE);
        assert_eq!(t.dst_access, vk::AccessFlags::SHADER_READ);
        assert_eq!(t.src_stage, vk::PipelineStageFlags::TRANSFER);
        assert_eq!(t.dst_stage, vk::PipelineStageFlags::FRAGMENT_SHADER);
    }

    #[test]
    fn test_unsupported_transition_is_an_error() {
        let result = layout_transition(
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        );
        assert!(matches!(
            result,
            Err(RhiError::UnsupportedLayoutTransition { .. })
        ));
    }

    #[test]
    fn test_buffer_image_copy_region() {
        let region = buffer_image_copy(256, 128);
        assert_eq!(region.buffer_offset, 0);
        assert_eq!(region.buffer_row_length, 0);
        assert_eq!(region.image_subresource.aspect_mask, vk::ImageAspectFlags::COLOR);
        assert_eq!(region.image_subresource.layer_count, 1);
        assert_eq!(region.image_extent.width, 256);
        assert_eq!(region.image_extent.height, 128);
        assert_eq!(region.image_extent.depth, 1);
    }

    #[test]
    fn test_first_supported_format_respects_tiling() {
        let candidates = [
            vk::Format::D32_SFLOAT_S8_UINT,
            vk::Format::D32_SFLOAT,
            vk::Format::D24_UNORM_S8_UINT,
        ];
        let feature = vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT;

        // Only D32_SFLOAT supports the feature with optimal tiling
        let properties = |format| match format {
            vk::Format::D32_SFLOAT => vk::FormatProperties {
                optimal_tiling_features: feature,
                ..Default::default()
            },
            vk::Format::D32_SFLOAT_S8_UINT => vk::FormatProperties {
                linear_tiling_features: feature,
                ..Default::default()
            },
            _ => vk::FormatProperties::default(),
        };

        let chosen =
            first_supported_format(&candidates, vk::ImageTiling::OPTIMAL, feature, properties);
        assert_eq!(chosen.unwrap(), vk::Format::D32_SFLOAT);

        let chosen =
            first_supported_format(&candidates, vk::ImageTiling::LINEAR, feature, properties);
        assert_eq!(chosen.unwrap(), vk::Format::D32_SFLOAT_S8_UINT);
    }

    #[test]
    fn test_first_supported_format_none_supported() {
        let result = first_supported_format(
            &[vk::Format::D16_UNORM],
            vk::ImageTiling::OPTIMAL,
            vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT,
            |_| vk::FormatProperties::default(),
        );
        assert!(matches!(result, Err(RhiError::UnsupportedFormat(ref f)) if f == &[vk::Format::D16_UNORM]));
    }
}
