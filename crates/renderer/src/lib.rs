//! Rendering on top of the RHI.
//!
//! This crate owns the scene-facing renderer:
//! - Depth buffer and framebuffers sized to the swapchain
//! - Meshes, textures and their descriptor sets
//! - The frames-in-flight draw loop

pub mod depth_buffer;
pub mod error;
pub mod frame_manager;
pub mod mesh;
pub mod renderer;
pub mod texture_set;
pub mod ubo;

pub use error::{RendererError, RendererResult};
pub use frame_manager::FrameManager;
pub use renderer::Renderer;
pub use renderer_rhi::sync::MAX_FRAMES_IN_FLIGHT;

/// Maximum number of meshes, and of textures, the renderer holds.
pub const MAX_OBJECTS: usize = 2;
