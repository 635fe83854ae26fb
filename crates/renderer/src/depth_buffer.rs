//! Depth attachment sized to the swapchain.
//!
//! The format is the first of [`DEPTH_FORMAT_CANDIDATES`] the device can use
//! as a depth/stencil attachment with optimal tiling. The buffer is rebuilt
//! whenever the swapchain is.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use renderer_rhi::device::Device;
//! use renderer_renderer::depth_buffer::DepthBuffer;
//!
//! # fn example(device: Arc<Device>) -> Result<(), renderer_rhi::RhiError> {
//! let depth_buffer = DepthBuffer::new(device, 800, 600)?;
//! let view = depth_buffer.image_view();
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use ash::vk;
use tracing::info;

use renderer_rhi::RhiResult;
use renderer_rhi::device::Device;
use renderer_rhi::image::{Image, ImageView, choose_supported_format};

/// Depth formats in order of preference.
pub const DEPTH_FORMAT_CANDIDATES: [vk::Format; 3] = [
    vk::Format::D32_SFLOAT_S8_UINT,
    vk::Format::D32_SFLOAT,
    vk::Format::D24_UNORM_S8_UINT,
];

/// Selects the depth format used by the render pass and the depth buffer.
pub fn choose_depth_format(device: &Device) -> RhiResult<vk::Format> {
    choose_supported_format(
        device,
        &DEPTH_FORMAT_CANDIDATES,
        vk::ImageTiling::OPTIMAL,
        vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT,
    )
}

/// Whether `format` carries a stencil component.
pub fn has_stencil_component(format: vk::Format) -> bool {
    matches!(
        format,
        vk::Format::D32_SFLOAT_S8_UINT | vk::Format::D24_UNORM_S8_UINT
    )
}

/// Device-local depth image and its view.
///
/// The view is declared first so it is destroyed before the image.
pub struct DepthBuffer {
    view: ImageView,
    image: Image,
}

impl DepthBuffer {
    /// Creates a depth buffer in the device's preferred depth format.
    pub fn new(device: Arc<Device>, width: u32, height: u32) -> RhiResult<Self> {
        let format = choose_depth_format(&device)?;
        Self::with_format(device, width, height, format)
    }

    pub fn with_format(
        device: Arc<Device>,
        width: u32,
        height: u32,
        format: vk::Format,
    ) -> RhiResult<Self> {
        let image = Image::new(
            device,
            width,
            height,
            format,
            vk::ImageTiling::OPTIMAL,
            vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT,
            "depth_buffer",
        )?;
        let view = image.create_view(vk::ImageAspectFlags::DEPTH)?;

        info!("Depth buffer created: {}x{} ({:?})", width, height, format);
        Ok(Self { view, image })
    }

    #[inline]
    pub fn image(&self) -> vk::Image {
        self.image.handle()
    }

    #[inline]
    pub fn image_view(&self) -> vk::ImageView {
        self.view.handle()
    }

    #[inline]
    pub fn format(&self) -> vk::Format {
        self.image.format()
    }

    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.image.extent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidates_prefer_32_bit_depth() {
        assert_eq!(DEPTH_FORMAT_CANDIDATES[0], vk::Format::D32_SFLOAT_S8_UINT);
        assert_eq!(DEPTH_FORMAT_CANDIDATES[1], vk::Format::D32_SFLOAT);
        assert_eq!(DEPTH_FORMAT_CANDIDATES[2], vk::Format::D24_UNORM_S8_UINT);
    }

    #[test]
    fn test_stencil_component() {
        assert!(has_stencil_component(vk::Format::D32_SFLOAT_S8_UINT));
        assert!(has_stencil_component(vk::Format::D24_UNORM_S8_UINT));
        assert!(!has_stencil_component(vk::Format::D32_SFLOAT));
    }

    #[test]
    fn test_depth_buffer_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DepthBuffer>();
    }
}
