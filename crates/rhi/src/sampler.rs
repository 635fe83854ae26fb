//! Texture samplers.

use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::device::Device;
use crate::error::RhiResult;

/// Sampler configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SamplerDesc {
    pub mag_filter: vk::Filter,
    pub min_filter: vk::Filter,
    pub address_mode: vk::SamplerAddressMode,
    pub border_color: vk::BorderColor,
    pub mipmap_mode: vk::SamplerMipmapMode,
    /// Requested anisotropy level, clamped to the device limit.
    /// Ignored when the device has anisotropic filtering disabled.
    pub max_anisotropy: f32,
}

impl Default for SamplerDesc {
    fn default() -> Self {
        Self {
            mag_filter: vk::Filter::LINEAR,
            min_filter: vk::Filter::LINEAR,
            address_mode: vk::SamplerAddressMode::REPEAT,
            border_color: vk::BorderColor::INT_OPAQUE_BLACK,
            mipmap_mode: vk::SamplerMipmapMode::LINEAR,
            max_anisotropy: 16.0,
        }
    }
}

impl SamplerDesc {
    /// Anisotropy to program given the device limit, `None` disables it.
    pub fn effective_anisotropy(&self, device_limit: Option<f32>) -> Option<f32> {
        device_limit
            .filter(|_| self.max_anisotropy > 1.0)
            .map(|limit| self.max_anisotropy.min(limit))
    }
}

/// RAII sampler.
pub struct Sampler {
    device: Arc<Device>,
    sampler: vk::Sampler,
}

impl Sampler {
    /// Creates a sampler with normalized coordinates over a single mip level.
    pub fn new(device: Arc<Device>, desc: &SamplerDesc) -> RhiResult<Self> {
        let anisotropy = desc.effective_anisotropy(device.max_anisotropy());

        let create_info = vk::SamplerCreateInfo::default()
            .mag_filter(desc.mag_filter)
            .min_filter(desc.min_filter)
            .address_mode_u(desc.address_mode)
            .address_mode_v(desc.address_mode)
            .address_mode_w(desc.address_mode)
            .border_color(desc.border_color)
            .unnormalized_coordinates(false)
            .mipmap_mode(desc.mipmap_mode)
            .mip_lod_bias(0.0)
            .min_lod(0.0)
            .max_lod(0.0)
            .anisotropy_enable(anisotropy.is_some())
            .max_anisotropy(anisotropy.unwrap_or(1.0));

        let sampler = unsafe { device.handle().create_sampler(&create_info, None)? };

        debug!("Sampler created (anisotropy {:?})", anisotropy);
        Ok(Self { device, sampler })
    }

    #[inline]
    pub fn handle(&self) -> vk::Sampler {
        self.sampler
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_sampler(self.sampler, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_desc() {
        let desc = SamplerDesc::default();
        assert_eq!(desc.mag_filter, vk::Filter::LINEAR);
        assert_eq!(desc.min_filter, vk::Filter::LINEAR);
        assert_eq!(desc.address_mode, vk::SamplerAddressMode::REPEAT);
        assert_eq!(desc.border_color, vk::BorderColor::INT_OPAQUE_BLACK);
        assert_eq!(desc.max_anisotropy, 16.0);
    }

    #[test]
    fn test_effective_anisotropy_clamps_to_device() {
        let desc = SamplerDesc::default();
        assert_eq!(desc.effective_anisotropy(Some(8.0)), Some(8.0));
        assert_eq!(desc.effective_anisotropy(Some(16.0)), Some(16.0));
        assert_eq!(desc.effective_anisotropy(None), None);
    }

    #[test]
    fn test_effective_anisotropy_disabled_by_request() {
        let desc = SamplerDesc {
            max_anisotropy: 1.0,
            ..Default::default()
        };
        assert_eq!(desc.effective_anisotropy(Some(16.0)), None);
    }
}
