//! CPU-side asset data: meshes and decoded images.
//!
//! Nothing here touches the GPU; the renderer uploads these through the
//! staging path.

mod error;
pub mod image;
pub mod mesh;

pub use error::{ResourceError, ResourceResult};
pub use image::ImageData;
pub use mesh::MeshData;
