//! RHI-specific error types.

use ash::vk;
use thiserror::Error;

/// Errors raised while creating or driving Vulkan objects.
#[derive(Error, Debug)]
pub enum RhiError {
    /// Vulkan API error
    #[error("Vulkan error: {0}")]
    VulkanError(#[from] vk::Result),

    /// Failed to load the Vulkan library
    #[error("Failed to load Vulkan: {0}")]
    LoadingError(#[from] ash::LoadingError),

    /// GPU allocator error
    #[error("Allocator error: {0}")]
    AllocatorError(#[from] gpu_allocator::AllocationError),

    /// No physical device satisfies the renderer's requirements
    #[error("No suitable GPU found")]
    NoSuitableGpu,

    #[error("Shader error: {0}")]
    ShaderError(String),

    #[error("Surface error: {0}")]
    SurfaceError(String),

    #[error("Swapchain error: {0}")]
    SwapchainError(String),

    /// A handle or index did not refer to a live object
    #[error("Invalid handle: {0}")]
    InvalidHandle(String),

    #[error("Pipeline error: {0}")]
    PipelineError(String),

    /// A required instance or device extension is missing
    #[error("Extension not supported: {0}")]
    ExtensionNotSupported(String),

    /// Validation was requested but the Khronos layer is not installed
    #[error("Validation layer requested but not available")]
    ValidationLayerUnavailable,

    /// None of the candidate formats supports the requested features
    #[error("No supported format among candidates: {0:?}")]
    UnsupportedFormat(Vec<vk::Format>),

    /// The image layout pair has no barrier recipe
    #[error("Unsupported layout transition: {old:?} -> {new:?}")]
    UnsupportedLayoutTransition {
        old: vk::ImageLayout,
        new: vk::ImageLayout,
    },
}

/// Result type alias for RHI operations.
pub type RhiResult<T> = std::result::Result<T, RhiError>;
