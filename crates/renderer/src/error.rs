//! Renderer error types.

use thiserror::Error;

use renderer_resources::ResourceError;
use renderer_rhi::RhiError;

#[derive(Error, Debug)]
pub enum RendererError {
    #[error(transparent)]
    Rhi(#[from] RhiError),

    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Window or surface setup failed
    #[error(transparent)]
    Platform(#[from] renderer_core::Error),

    #[error("No mesh with id {0}")]
    InvalidMeshId(usize),

    #[error("No texture with id {0}")]
    InvalidTextureId(usize),

    /// The fixed object capacity is exhausted
    #[error("Cannot create more than {max} {kind}")]
    TooManyObjects { kind: &'static str, max: usize },
}

pub type RendererResult<T> = Result<T, RendererError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rhi_error_converts() {
        let err: RendererError = RhiError::NoSuitableGpu.into();
        assert!(matches!(err, RendererError::Rhi(RhiError::NoSuitableGpu)));
        assert_eq!(err.to_string(), "No suitable GPU found");
    }

    #[test]
    fn test_too_many_objects_message() {
        let err = RendererError::TooManyObjects {
            kind: "meshes",
            max: 2,
        };
        assert_eq!(err.to_string(), "Cannot create more than 2 meshes");
    }
}
