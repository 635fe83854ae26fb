//! Sampled 2D textures uploaded through a staging buffer.
//!
//! Upload sequence, each step a one-time submission on the pool's queue:
//! 1. `UNDEFINED -> TRANSFER_DST_OPTIMAL`
//! 2. staging buffer -> image copy
//! 3. `TRANSFER_DST_OPTIMAL -> SHADER_READ_ONLY_OPTIMAL`

use std::sync::Arc;

use ash::vk;
use tracing::info;

use crate::buffer::{Buffer, BufferUsage};
use crate::command::CommandPool;
use crate::device::Device;
use crate::error::{RhiError, RhiResult};
use crate::image::{Image, ImageView, cmd_copy_buffer_to_image, cmd_transition_layout};

/// Pixel format of every texture uploaded by [`Texture::from_rgba8`].
pub const TEXTURE_FORMAT: vk::Format = vk::Format::R8G8B8A8_UNORM;

/// Bytes needed for a tightly packed RGBA8 image.
pub fn rgba8_size(width: u32, height: u32) -> usize {
    width as usize * height as usize * 4
}

/// Device-local image plus the view shaders sample from.
pub struct Texture {
    // Field order matters: the view must drop before the image
    view: ImageView,
    image: Image,
}

impl Texture {
    /// Uploads tightly packed RGBA8 `pixels` into a shader-readable texture.
    ///
    /// # Errors
    ///
    /// Returns an error if `pixels` does not hold exactly
    /// `width * height * 4` bytes or any GPU step fails.
    pub fn from_rgba8(
        device: Arc<Device>,
        pool: &CommandPool,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> RhiResult<Self> {
        let expected = rgba8_size(width, height);
        if pixels.len() != expected || expected == 0 {
            return Err(RhiError::InvalidHandle(format!(
                "Texture {}x{} needs {} bytes of RGBA8 data, got {}",
                width,
                height,
                expected,
                pixels.len()
            )));
        }

        let staging = Buffer::new_with_data(device.clone(), BufferUsage::Staging, pixels)?;

        let image = Image::new(
            device.clone(),
            width,
            height,
            TEXTURE_FORMAT,
            vk::ImageTiling::OPTIMAL,
            vk::ImageUsageFlags::TRANSFER_DST | vk::ImageUsageFlags::SAMPLED,
            "texture",
        )?;

        let queue = device.graphics_queue();
        pool.submit_once(queue, |cmd| {
            cmd_transition_layout(
                cmd,
                image.handle(),
                vk::ImageLayout::UNDEFINED,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            )
        })?;
        pool.submit_once(queue, |cmd| {
            cmd_copy_buffer_to_image(cmd, staging.handle(), image.handle(), width, height);
            Ok(())
        })?;
        pool.submit_once(queue, |cmd| {
            cmd_transition_layout(
                cmd,
                image.handle(),
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            )
        })?;

        let view = image.create_view(vk::ImageAspectFlags::COLOR)?;

        info!("Texture uploaded: {}x{}", width, height);
        Ok(Self { view, image })
    }

    #[inline]
    pub fn image(&self) -> vk::Image {
        self.image.handle()
    }

    #[inline]
    pub fn view(&self) -> vk::ImageView {
        self.view.handle()
    }

    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.image.extent()
    }
}
