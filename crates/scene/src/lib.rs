//! Scene math: camera and object transforms.

pub mod camera;
pub mod transform;

pub use camera::Camera;
pub use transform::Transform;
