//! The renderer: Vulkan setup, scene objects and the draw loop.
//!
//! # Destruction order
//!
//! Fields are dropped in declaration order, after [`Drop`] waits for the
//! device to go idle. Everything holding an `Arc<Device>` is declared before
//! `device`; the surface follows the swapchain, and the instance goes last.

use std::sync::Arc;

use ash::vk;
use glam::Mat4;
use tracing::{debug, error, info};

use renderer_core::config::RendererConfig;
use renderer_platform::{Surface, Window};
use renderer_resources::{ImageData, MeshData};
use renderer_rhi::RhiError;
use renderer_rhi::buffer::{Buffer, BufferUsage};
use renderer_rhi::command::{CommandBuffer, CommandPool};
use renderer_rhi::descriptor::{
    DescriptorBindingBuilder, DescriptorPool, DescriptorSetLayout, buffer_info,
    update_descriptor_sets,
};
use renderer_rhi::device::Device;
use renderer_rhi::instance::Instance;
use renderer_rhi::physical_device::select_physical_device;
use renderer_rhi::pipeline::{
    ColorBlendAttachment, CompareOp, CullMode, FrontFace, GraphicsPipelineBuilder, Pipeline,
    PipelineLayout, PolygonMode, PrimitiveTopology,
};
use renderer_rhi::render_pass::{Framebuffer, RenderPass, clear_values};
use renderer_rhi::shader::{Shader, ShaderStage};
use renderer_rhi::swapchain::Swapchain;
use renderer_rhi::sync::MAX_FRAMES_IN_FLIGHT;
use renderer_rhi::vertex::Vertex;
use renderer_scene::Camera;

use crate::MAX_OBJECTS;
use crate::depth_buffer::DepthBuffer;
use crate::error::{RendererError, RendererResult};
use crate::frame_manager::FrameManager;
use crate::mesh::Mesh;
use crate::texture_set::TextureSet;
use crate::ubo::{ModelPushConstant, UboViewProjection};

/// Forward renderer drawing up to [`MAX_OBJECTS`] textured meshes with depth
/// testing.
pub struct Renderer {
    frame_manager: FrameManager,
    meshes: Vec<Mesh>,
    textures: TextureSet,
    view_projection_sets: Vec<vk::DescriptorSet>,
    uniform_buffers: Vec<Buffer>,
    descriptor_pool: DescriptorPool,
    pipeline: Pipeline,
    pipeline_layout: PipelineLayout,
    view_projection_layout: DescriptorSetLayout,
    framebuffers: Vec<Framebuffer>,
    depth_buffer: DepthBuffer,
    render_pass: RenderPass,
    command_pool: CommandPool,
    swapchain: Swapchain,
    device: Arc<Device>,
    surface: Surface,
    instance: Instance,

    view_projection: UboViewProjection,
    clear_color: [f32; 4],
    width: u32,
    height: u32,
    framebuffer_resized: bool,
}

impl Renderer {
    /// Creates every Vulkan object needed to draw into `window`.
    pub fn new(window: &Window, config: &RendererConfig) -> RendererResult<Self> {
        let (width, height) = window.size();
        info!("Initializing Vulkan renderer ({}x{})", width, height);

        let instance = Instance::new(config.enable_validation, window.required_extensions()?)?;
        let surface = window.create_surface(instance.entry(), instance.handle())?;

        let physical_device_info =
            select_physical_device(instance.handle(), surface.handle(), surface.loader())?;
        let device = Device::new(&instance, &physical_device_info)?;

        let swapchain = Swapchain::new(&instance, device.clone(), surface.handle(), width, height)?;
        let extent = swapchain.extent();

        let depth_buffer = DepthBuffer::new(device.clone(), extent.width, extent.height)?;
        let render_pass = RenderPass::new(device.clone(), swapchain.format(), depth_buffer.format())?;
        let framebuffers =
            Self::create_framebuffers(&device, &render_pass, &swapchain, &depth_buffer)?;

        let graphics_family = device.queue_families().graphics_family.ok_or_else(|| {
            RhiError::InvalidHandle("Device has no graphics queue family".to_string())
        })?;
        let command_pool = CommandPool::new(device.clone(), graphics_family)?;

        let view_projection_layout = DescriptorSetLayout::new(
            device.clone(),
            &[DescriptorBindingBuilder::uniform_buffer(
                0,
                vk::ShaderStageFlags::VERTEX,
            )],
        )?;
        let textures = TextureSet::new(device.clone(), MAX_OBJECTS)?;

        let pipeline_layout = PipelineLayout::new(
            device.clone(),
            &[view_projection_layout.handle(), textures.layout()],
            &[ModelPushConstant::push_constant_range()],
        )?;
        let pipeline = Self::create_pipeline(&device, config, &render_pass, &pipeline_layout)?;

        let descriptor_pool = DescriptorPool::new(
            device.clone(),
            MAX_FRAMES_IN_FLIGHT as u32,
            &[DescriptorPool::pool_size(
                vk::DescriptorType::UNIFORM_BUFFER,
                MAX_FRAMES_IN_FLIGHT as u32,
            )],
        )?;
        let (uniform_buffers, view_projection_sets) =
            Self::create_uniform_buffers(&device, &descriptor_pool, &view_projection_layout)?;

        let frame_manager = FrameManager::new(device.clone(), &command_pool)?;

        let camera = Camera::perspective(
            config.field_of_view_degrees,
            extent.width as f32 / extent.height.max(1) as f32,
            config.near,
            config.far,
        );

        info!(
            "Renderer initialized: {} swapchain images, {} frames in flight, up to {} objects",
            swapchain.image_count(),
            MAX_FRAMES_IN_FLIGHT,
            MAX_OBJECTS
        );

        Ok(Self {
            frame_manager,
            meshes: Vec::with_capacity(MAX_OBJECTS),
            textures,
            view_projection_sets,
            uniform_buffers,
            descriptor_pool,
            pipeline,
            pipeline_layout,
            view_projection_layout,
            framebuffers,
            depth_buffer,
            render_pass,
            command_pool,
            swapchain,
            device,
            surface,
            instance,
            view_projection: UboViewProjection::from_camera(&camera),
            clear_color: config.clear_color,
            width,
            height,
            framebuffer_resized: false,
        })
    }

    fn create_framebuffers(
        device: &Arc<Device>,
        render_pass: &RenderPass,
        swapchain: &Swapchain,
        depth_buffer: &DepthBuffer,
    ) -> RendererResult<Vec<Framebuffer>> {
        let extent = swapchain.extent();
        let framebuffers = swapchain
            .image_views()
            .map(|view| {
                Framebuffer::new(
                    device.clone(),
                    render_pass,
                    &[view, depth_buffer.image_view()],
                    extent,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Created {} framebuffers", framebuffers.len());
        Ok(framebuffers)
    }

    fn create_pipeline(
        device: &Arc<Device>,
        config: &RendererConfig,
        render_pass: &RenderPass,
        layout: &PipelineLayout,
    ) -> RendererResult<Pipeline> {
        let vertex_shader = Shader::from_spirv_file(
            device.clone(),
            &config.vertex_shader,
            ShaderStage::Vertex,
            "main",
        )?;
        let fragment_shader = Shader::from_spirv_file(
            device.clone(),
            &config.fragment_shader,
            ShaderStage::Fragment,
            "main",
        )?;

        // The projection flips Y, which keeps counter-clockwise winding
        // front-facing on screen.
        let pipeline = GraphicsPipelineBuilder::new()
            .vertex_shader(&vertex_shader)
            .fragment_shader(&fragment_shader)
            .render_pass(render_pass, 0)
            .vertex_binding(Vertex::binding_description())
            .vertex_attributes(&Vertex::attribute_descriptions())
            .topology(PrimitiveTopology::TriangleList)
            .polygon_mode(PolygonMode::Fill)
            .cull_mode(CullMode::Back)
            .front_face(FrontFace::CounterClockwise)
            .depth_test_enable(true)
            .depth_write_enable(true)
            .depth_compare_op(CompareOp::Less)
            .color_blend_attachment(ColorBlendAttachment::alpha_blend())
            .build(device.clone(), layout)?;

        info!("Graphics pipeline created with depth testing");
        Ok(pipeline)
    }

    /// One host-visible uniform buffer and descriptor set per frame in flight.
    fn create_uniform_buffers(
        device: &Arc<Device>,
        pool: &DescriptorPool,
        layout: &DescriptorSetLayout,
    ) -> RendererResult<(Vec<Buffer>, Vec<vk::DescriptorSet>)> {
        let size = UboViewProjection::SIZE as vk::DeviceSize;
        let buffers = (0..MAX_FRAMES_IN_FLIGHT)
            .map(|_| Buffer::new(device.clone(), BufferUsage::Uniform, size))
            .collect::<Result<Vec<_>, _>>()?;

        let sets = pool.allocate(&vec![layout.handle(); MAX_FRAMES_IN_FLIGHT])?;

        for (buffer, &set) in buffers.iter().zip(&sets) {
            let buffer_infos = [buffer_info(buffer.handle(), 0, size)];
            let write = vk::WriteDescriptorSet::default()
                .dst_set(set)
                .dst_binding(0)
                .dst_array_element(0)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .buffer_info(&buffer_infos);
            update_descriptor_sets(device, &[write]);
        }

        Ok((buffers, sets))
    }

    /// Uploads `image` and returns its texture id.
    pub fn create_texture(&mut self, image: &ImageData) -> RendererResult<usize> {
        self.textures.add(&self.command_pool, image)
    }

    /// Uploads `data` as a mesh sampling `texture_id` and returns its id.
    pub fn create_mesh(&mut self, data: &MeshData, texture_id: usize) -> RendererResult<usize> {
        if self.meshes.len() >= MAX_OBJECTS {
            return Err(RendererError::TooManyObjects {
                kind: "meshes",
                max: MAX_OBJECTS,
            });
        }
        if !self.textures.contains(texture_id) {
            return Err(RendererError::InvalidTextureId(texture_id));
        }

        let mesh = Mesh::new(self.device.clone(), &self.command_pool, data, texture_id)?;
        let id = self.meshes.len();
        self.meshes.push(mesh);

        info!(
            "Mesh {} created: {} vertices, {} indices, texture {}",
            id,
            data.vertex_count(),
            data.index_count(),
            texture_id
        );
        Ok(id)
    }

    pub fn update_model(&mut self, mesh_id: usize, model: Mat4) -> RendererResult<()> {
        self.meshes
            .get_mut(mesh_id)
            .ok_or(RendererError::InvalidMeshId(mesh_id))?
            .set_model(model);
        Ok(())
    }

    /// Takes the view and projection matrices used from the next frame on.
    pub fn set_camera(&mut self, camera: &Camera) {
        self.view_projection = UboViewProjection::from_camera(camera);
    }

    /// Records the new window size. The swapchain is rebuilt on the next
    /// draw; a zero-sized window suspends drawing.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == self.width && height == self.height {
            return;
        }
        debug!(
            "Resize: {}x{} -> {}x{}",
            self.width, self.height, width, height
        );
        self.width = width;
        self.height = height;
        self.framebuffer_resized = true;
    }

    fn is_minimized(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    fn recreate_swapchain(&mut self) -> RendererResult<()> {
        if self.is_minimized() {
            return Ok(());
        }

        self.device.wait_idle()?;

        self.framebuffers.clear();
        self.swapchain.recreate(self.width, self.height)?;

        if self.swapchain.format() != self.render_pass.color_format() {
            return Err(RhiError::SwapchainError(format!(
                "Surface format changed from {:?} to {:?}",
                self.render_pass.color_format(),
                self.swapchain.format()
            ))
            .into());
        }

        let extent = self.swapchain.extent();
        self.depth_buffer = DepthBuffer::with_format(
            self.device.clone(),
            extent.width,
            extent.height,
            self.render_pass.depth_format(),
        )?;
        self.framebuffers = Self::create_framebuffers(
            &self.device,
            &self.render_pass,
            &self.swapchain,
            &self.depth_buffer,
        )?;

        self.framebuffer_resized = false;
        info!(
            "Swapchain recreated: {}x{}",
            extent.width, extent.height
        );
        Ok(())
    }

    /// Draws one frame.
    ///
    /// Returns without drawing while the window is minimized. Out-of-date and
    /// suboptimal swapchains are recreated transparently.
    pub fn draw(&mut self) -> RendererResult<()> {
        if self.is_minimized() {
            return Ok(());
        }
        if self.framebuffer_resized {
            debug!("Resize pending, recreating swapchain before acquire");
            self.recreate_swapchain()?;
        }

        self.frame_manager.wait_for_frame()?;

        let Some(image_index) = self.frame_manager.acquire_next_image(&self.swapchain)? else {
            return self.recreate_swapchain();
        };

        self.update_uniform_buffer()?;

        let cmd = self.frame_manager.begin_frame()?;
        self.record_commands(cmd, image_index)?;
        self.frame_manager.end_frame()?;
        self.frame_manager.submit(self.device.graphics_queue())?;

        let needs_recreate = self
            .frame_manager
            .present(&self.swapchain, self.device.present_queue())?;
        self.frame_manager.next_frame();

        if needs_recreate || self.framebuffer_resized {
            self.recreate_swapchain()?;
        }
        Ok(())
    }

    fn update_uniform_buffer(&self) -> RendererResult<()> {
        let buffer = &self.uniform_buffers[self.frame_manager.current_frame_index()];
        buffer.write_data(0, bytemuck::bytes_of(&self.view_projection))?;
        Ok(())
    }

    fn record_commands(&self, cmd: &CommandBuffer, image_index: u32) -> RendererResult<()> {
        let framebuffer = self.framebuffers.get(image_index as usize).ok_or_else(|| {
            RhiError::InvalidHandle(format!("No framebuffer for swapchain image {}", image_index))
        })?;
        let extent = self.swapchain.extent();

        // Resolve every descriptor set before the render pass begins.
        let view_projection_set = self.view_projection_sets[self.frame_manager.current_frame_index()];
        let draws = self
            .meshes
            .iter()
            .map(|mesh| {
                let sampler_set = self.textures.descriptor_set(mesh.texture_id())?;
                Ok((mesh, [view_projection_set, sampler_set]))
            })
            .collect::<RendererResult<Vec<_>>>()?;

        cmd.begin_render_pass(
            self.render_pass.handle(),
            framebuffer.handle(),
            extent,
            &clear_values(self.clear_color, 1.0),
        );
        cmd.bind_pipeline(self.pipeline.bind_point(), self.pipeline.handle());

        cmd.set_viewport(&vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: extent.width as f32,
            height: extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        });
        cmd.set_scissor(&vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent,
        });

        for (mesh, sets) in &draws {
            cmd.push_constants(
                self.pipeline_layout.handle(),
                ModelPushConstant::STAGES,
                0,
                &ModelPushConstant::new(mesh.model()),
            );
            cmd.bind_descriptor_sets(
                self.pipeline.bind_point(),
                self.pipeline_layout.handle(),
                0,
                sets,
                &[],
            );
            mesh.record_draw(cmd);
        }

        cmd.end_render_pass();
        Ok(())
    }

    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.swapchain.extent()
    }

    #[inline]
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    #[inline]
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    #[inline]
    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        if let Err(e) = self.frame_manager.wait_for_all_frames() {
            error!("Failed to wait for in-flight frames during drop: {:?}", e);
        }
        if let Err(e) = self.device.wait_idle() {
            error!(
                "Failed to wait for device idle during renderer drop: {:?}",
                e
            );
        }
        info!("Renderer destroyed");
    }
}
