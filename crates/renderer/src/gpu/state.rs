use std::time::{Duration, Instant};

use anyhow::Result;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::{debug, warn};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;

use scene::{Camera, Frame, SceneSettings, SolidVertex};

use crate::types::Antialiasing;

use super::context::{GpuContext, DEPTH_FORMAT};
use super::pipeline::ScenePipelines;
use super::uniforms::{GpuVertex, SceneUniforms};

struct AttachmentTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl AttachmentTarget {
    fn new(
        device: &wgpu::Device,
        label: &str,
        format: wgpu::TextureFormat,
        size: PhysicalSize<u32>,
        sample_count: u32,
    ) -> Self {
        let extent = wgpu::Extent3d {
            width: size.width.max(1),
            height: size.height.max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: extent,
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

/// GPU resources for drawing compositor frames into one window surface.
pub(crate) struct GpuState {
    context: GpuContext,
    pipelines: ScenePipelines,
    uniforms: SceneUniforms,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    vertex_capacity: usize,
    vertex_count: u32,
    staging: Vec<GpuVertex>,
    multisample_target: Option<AttachmentTarget>,
    depth_target: AttachmentTarget,
    frames_per_second: f32,
    frames_since_last_update: u32,
    last_fps_update: Instant,
}

impl GpuState {
    pub(crate) fn new<T>(
        target: &T,
        initial_size: PhysicalSize<u32>,
        antialiasing: Antialiasing,
        settings: &SceneSettings,
        vertex_capacity: usize,
    ) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let context = GpuContext::new(target, initial_size, antialiasing)?;
        let pipelines =
            ScenePipelines::new(&context.device, context.surface_format, context.sample_count);

        let uniforms = SceneUniforms::new(settings, context.shader_encodes_srgb());
        let uniform_buffer = context
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("scene uniforms"),
                contents: bytemuck::bytes_of(&uniforms),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let uniform_bind_group = context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("scene uniform bind group"),
                layout: &pipelines.uniform_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                }],
            });

        let vertex_buffer = context.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("solid vertices"),
            size: (vertex_capacity.max(1) * std::mem::size_of::<GpuVertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let (multisample_target, depth_target) = create_attachments(&context);

        Ok(Self {
            context,
            pipelines,
            uniforms,
            uniform_buffer,
            uniform_bind_group,
            vertex_buffer,
            vertex_capacity,
            vertex_count: 0,
            staging: Vec::with_capacity(vertex_capacity),
            multisample_target,
            depth_target,
            frames_per_second: 60.0,
            frames_since_last_update: 0,
            last_fps_update: Instant::now(),
        })
    }

    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.context.size
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.context.resize(new_size);
        let (multisample_target, depth_target) = create_attachments(&self.context);
        self.multisample_target = multisample_target;
        self.depth_target = depth_target;
    }

    /// Uploads the frame's uniforms and deformed surface, then draws the
    /// field and the solid into the next swapchain image.
    pub(crate) fn render(
        &mut self,
        frame: &Frame,
        camera: &Camera,
        surface: &[SolidVertex],
    ) -> Result<(), wgpu::SurfaceError> {
        let frame_acquisition_start = Instant::now();
        let output = self.context.surface.get_current_texture()?;
        let frame_acquisition_duration = frame_acquisition_start.elapsed();
        let frame_time_budget = Duration::from_secs_f32(1.0 / self.frames_per_second.max(1.0));
        if frame_acquisition_duration > frame_time_budget {
            warn!(
                "acquiring frame took {}ms, which is over the frame budget of {}ms (at {} FPS)",
                frame_acquisition_duration.as_millis(),
                frame_time_budget.as_millis(),
                self.frames_per_second.round(),
            );
        }
        self.record_stats(frame);

        self.uniforms.update(frame, camera);
        self.context
            .queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&self.uniforms));
        self.upload_surface(surface);

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("render encoder"),
                });

        {
            let (attachment_view, resolve_target) =
                if let Some(msaa) = self.multisample_target.as_ref() {
                    (&msaa.view, Some(&view))
                } else {
                    (&view, None)
                };
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: attachment_view,
                    depth_slice: None,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_target.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);

            render_pass.set_pipeline(&self.pipelines.field);
            render_pass.draw(0..6, 0..1);

            if self.vertex_count > 0 {
                render_pass.set_pipeline(&self.pipelines.solid);
                render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
                render_pass.draw(0..self.vertex_count, 0..1);
            }
        }

        self.context.queue.submit(Some(encoder.finish()));
        output.present();
        Ok(())
    }

    fn upload_surface(&mut self, surface: &[SolidVertex]) {
        if surface.len() > self.vertex_capacity {
            warn!(
                vertices = surface.len(),
                capacity = self.vertex_capacity,
                "solid surface exceeds vertex buffer; truncating"
            );
        }
        let count = surface.len().min(self.vertex_capacity);
        self.staging.clear();
        let vertices = surface[..count].iter().map(GpuVertex::from);
        self.staging.extend(vertices);
        self.context.queue.write_buffer(
            &self.vertex_buffer,
            0,
            bytemuck::cast_slice(&self.staging),
        );
        self.vertex_count = count as u32;
    }

    fn record_stats(&mut self, frame: &Frame) {
        let now = Instant::now();
        self.frames_since_last_update += 1;
        let elapsed_since_fps_update = now.saturating_duration_since(self.last_fps_update);
        if elapsed_since_fps_update >= Duration::from_secs(1) {
            self.frames_per_second =
                self.frames_since_last_update as f32 / elapsed_since_fps_update.as_secs_f32();
            self.frames_since_last_update = 0;
            self.last_fps_update = now;
            debug!(
                fps = self.frames_per_second.round(),
                frame = frame.index,
                elapsed = frame.elapsed,
                world_width = frame.viewport.width,
                world_height = frame.viewport.height,
                "render stats"
            );
        }
    }
}

fn create_attachments(context: &GpuContext) -> (Option<AttachmentTarget>, AttachmentTarget) {
    let multisample_target = (context.sample_count > 1).then(|| {
        AttachmentTarget::new(
            &context.device,
            "msaa color target",
            context.surface_format,
            context.size,
            context.sample_count,
        )
    });
    let depth_target = AttachmentTarget::new(
        &context.device,
        "depth target",
        DEPTH_FORMAT,
        context.size,
        context.sample_count,
    );
    (multisample_target, depth_target)
}
