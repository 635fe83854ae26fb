//! Two textured quads spinning in front of a perspective camera.
//!
//! Usage: `vulkan-course [config.toml]`

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::WindowId;

use glam::Vec3;
use renderer_core::{AppConfig, Timer};
use renderer_platform::{InputState, KeyCode, Window};
use renderer_renderer::Renderer;
use renderer_resources::{ImageData, MeshData};
use renderer_scene::{Camera, Transform};

const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// A mesh owned by the renderer, its transform and its spin direction.
struct SpinningQuad {
    mesh_id: usize,
    transform: Transform,
    direction: f32,
}

struct App {
    config: AppConfig,
    window: Option<Window>,
    renderer: Option<Renderer>,
    camera: Camera,
    quads: Vec<SpinningQuad>,
    input: InputState,
    timer: Timer,
    last_fps_report: u64,
}

impl App {
    fn new(config: AppConfig) -> Self {
        let renderer = &config.renderer;
        let camera = Camera::perspective(
            renderer.field_of_view_degrees,
            config.window.width as f32 / config.window.height as f32,
            renderer.near,
            renderer.far,
        );

        Self {
            config,
            window: None,
            renderer: None,
            camera,
            quads: Vec::new(),
            input: InputState::new(),
            timer: Timer::new(),
            last_fps_report: 0,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window_config = &self.config.window;
        let window = Window::new(
            event_loop,
            window_config.width,
            window_config.height,
            &window_config.title,
            window_config.resizable,
        )
        .context("Failed to create window")?;

        let mut renderer =
            Renderer::new(&window, &self.config.renderer).context("Failed to create renderer")?;

        let image = ImageData::load(&self.config.scene.texture).unwrap_or_else(|e| {
            warn!("Using checkerboard texture: {}", e);
            ImageData::checkerboard(256, 32)
        });
        let texture_id = renderer.create_texture(&image)?;

        let quads = [
            (MeshData::quad(-2.5, Vec3::new(1.0, 0.0, 0.0)), 1.0),
            (MeshData::quad(-3.0, Vec3::new(0.0, 0.0, 1.0)), -1.0),
        ];
        for (data, direction) in quads {
            let mesh_id = renderer.create_mesh(&data, texture_id)?;
            self.quads.push(SpinningQuad {
                mesh_id,
                transform: Transform::default(),
                direction,
            });
        }

        let (width, height) = window.size();
        self.camera.set_aspect(width, height);
        renderer.set_camera(&self.camera);

        info!(
            "Scene ready: {} meshes, {} textures",
            renderer.mesh_count(),
            renderer.texture_count()
        );

        self.timer = Timer::new();
        self.last_fps_report = 0;
        self.renderer = Some(renderer);
        self.window = Some(window);
        info!("Initialization complete, entering main loop");
        Ok(())
    }

    fn update(&mut self, delta: f32) -> Result<()> {
        let Some(renderer) = self.renderer.as_mut() else {
            return Ok(());
        };

        let step = self.config.scene.rotation_speed_degrees.to_radians() * delta;
        for quad in &mut self.quads {
            quad.transform.rotate_z(step * quad.direction);
            renderer.update_model(quad.mesh_id, quad.transform.to_matrix())?;
        }

        renderer.draw()?;

        let seconds = self.timer.elapsed().as_secs();
        if seconds > self.last_fps_report {
            self.last_fps_report = seconds;
            debug!("{:.1} FPS after {}s", self.timer.fps(), seconds);
        }
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            error!("{:#}", e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                self.camera.set_aspect(size.width, size.height);
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.set_camera(&self.camera);
                    renderer.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                let delta = self.timer.update();
                if let Err(e) = self.update(delta) {
                    error!("Render error: {:#}", e);
                    event_loop.exit();
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                self.input.on_keyboard(event.physical_key, event.state);
                if self.input.is_key_just_pressed(KeyCode::Escape) {
                    info!("Escape pressed, shutting down");
                    event_loop.exit();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        self.input.end_frame();
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        // The renderer must go before the window its surface was created for.
        self.renderer = None;
        self.window = None;
    }
}

fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = AppConfig::load_or_default(&config_path)
        .with_context(|| format!("Failed to load configuration from {:?}", config_path))?;

    renderer_core::init_logging_with(config.logging.filter.as_deref());
    info!("Starting Vulkan course renderer ({:?})", config_path);
    match config.to_toml_string() {
        Ok(effective) => debug!("Effective configuration:\n{}", effective),
        Err(e) => warn!("Could not serialize configuration: {}", e),
    }

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    Ok(())
}
