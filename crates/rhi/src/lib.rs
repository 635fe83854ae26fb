//! Vulkan abstraction layer (Render Hardware Interface).
//!
//! Thin RAII wrappers over the Vulkan objects a forward renderer needs,
//! built on `ash` with memory managed by `gpu-allocator`:
//! - Instance, physical device selection and logical device
//! - Swapchain, render pass and framebuffers
//! - Command pools, one-time submissions and command recording
//! - Buffers, images, samplers and textures with staging uploads
//! - Descriptor sets, pipelines and synchronization primitives

mod error;

pub mod buffer;
pub mod command;
pub mod descriptor;
pub mod device;
pub mod image;
pub mod instance;
pub mod physical_device;
pub mod pipeline;
pub mod render_pass;
pub mod sampler;
pub mod shader;
pub mod swapchain;
pub mod sync;
pub mod texture;
pub mod vertex;

pub use error::{RhiError, RhiResult};

// Re-export ash types that users might need
pub use ash::vk;
