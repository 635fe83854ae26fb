//! Platform layer: one winit window, its Vulkan surface and keyboard state.

mod input;
mod window;

pub use input::{InputState, KeyCode};
pub use window::{Surface, Window};

pub use winit::event::{ElementState, WindowEvent};
pub use winit::event_loop::{ActiveEventLoop, EventLoop};
