use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, trace, warn};
use viewer::{Size, UniformFrame};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::types::{Bitmap, ShaderProgram, IMAGE_SLOTS};

use super::canvas::{letterbox, shader_scissor, DrawCommand};
use super::context::GpuContext;
use super::pipeline::{blit_pipeline, shader_pipeline, PipelineLayouts, SOURCE_OVER};
use super::textures::{placeholder, screen_target, texture_entries, upload_bitmap, ImageTexture, IMAGE_FORMAT};
use super::uniforms::ViewerUniforms;

/// Textures bound to the image slots of the shader pass.
struct SlotBinding {
    images: Vec<Arc<Bitmap>>,
    _textures: Vec<ImageTexture>,
    bind_group: wgpu::BindGroup,
}

struct BlitEntry {
    image: Arc<Bitmap>,
    _texture: ImageTexture,
    bind_group: wgpu::BindGroup,
    used: bool,
}

/// Replays recorded draw commands into an offscreen logical screen and
/// presents it letterboxed into the window.
///
/// GPU resources are cached per `Arc` identity, so a hot reload (which
/// publishes a fresh `Arc`) is what triggers a re-upload or pipeline rebuild.
pub(crate) struct GpuState {
    context: GpuContext,
    layouts: PipelineLayouts,
    logical: Size,
    screen: ImageTexture,
    screen_bind_group: wgpu::BindGroup,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    image_blit: wgpu::RenderPipeline,
    present_blit: wgpu::RenderPipeline,
    placeholder: ImageTexture,
    pipeline: Option<wgpu::RenderPipeline>,
    attempted: Option<Arc<ShaderProgram>>,
    slots: Option<SlotBinding>,
    blits: Vec<BlitEntry>,
}

impl GpuState {
    pub(crate) fn new(window: Arc<Window>, logical: Size) -> Result<Self> {
        let context = GpuContext::new(window)?;
        let device = &context.device;
        let layouts = PipelineLayouts::new(device);

        let screen = screen_target(device, logical.width, logical.height);
        let screen_bind_group = blit_bind_group(device, &layouts, &screen, "logical screen");

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("viewer uniforms"),
            contents: bytemuck::bytes_of(&ViewerUniforms::default()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniform bind group"),
            layout: &layouts.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let image_blit = blit_pipeline(device, &layouts, IMAGE_FORMAT, Some(SOURCE_OVER), "image blit");
        let present_blit = blit_pipeline(device, &layouts, context.surface_format, None, "present blit");
        let placeholder = placeholder(device, &context.queue, "image slot");

        debug!(
            width = logical.width,
            height = logical.height,
            surface = ?context.surface_format,
            "GPU state ready"
        );

        Ok(Self {
            context,
            layouts,
            logical,
            screen,
            screen_bind_group,
            uniform_buffer,
            uniform_bind_group,
            image_blit,
            present_blit,
            placeholder,
            pipeline: None,
            attempted: None,
            slots: None,
            blits: Vec::new(),
        })
    }

    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.context.size
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.context.resize(new_size);
    }

    /// Where the logical screen lands inside the window, in physical pixels.
    pub(crate) fn viewport(&self) -> (f64, f64, f64, f64) {
        let size = self.context.size;
        let rect = letterbox(self.logical, Size::new(size.width, size.height));
        (
            f64::from(rect.x),
            f64::from(rect.y),
            f64::from(rect.width),
            f64::from(rect.height),
        )
    }

    pub(crate) fn logical(&self) -> Size {
        self.logical
    }

    pub(crate) fn render(&mut self, commands: &[DrawCommand]) -> Result<(), wgpu::SurfaceError> {
        let frame = self.context.surface.get_current_texture()?;
        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame encoder"),
            });

        self.clear_screen(&mut encoder);
        for entry in &mut self.blits {
            entry.used = false;
        }
        for command in commands {
            match command {
                DrawCommand::Image(image) => {
                    let index = self.blit_entry(image);
                    self.encode_blit(&mut encoder, index);
                }
                DrawCommand::RectShader {
                    shader,
                    uniforms,
                    images,
                } => self.encode_shader(&mut encoder, shader, uniforms, images),
            }
        }
        self.blits.retain(|entry| entry.used);

        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.encode_present(&mut encoder, &view);
        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn clear_screen(&self, encoder: &mut wgpu::CommandEncoder) {
        let _pass = begin_pass(
            encoder,
            &self.screen.view,
            wgpu::LoadOp::Clear(wgpu::Color::BLACK),
            "clear screen",
        );
    }

    fn encode_blit(&self, encoder: &mut wgpu::CommandEncoder, index: usize) {
        let Some(entry) = self.blits.get(index) else {
            return;
        };
        let mut pass = begin_pass(encoder, &self.screen.view, wgpu::LoadOp::Load, "image pass");
        pass.set_pipeline(&self.image_blit);
        pass.set_bind_group(0, &entry.bind_group, &[]);
        pass.draw(0..3, 0..1);
    }

    fn encode_shader(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        program: &Arc<ShaderProgram>,
        frame: &UniformFrame,
        images: &[Arc<Bitmap>],
    ) {
        self.ensure_pipeline(program);
        self.ensure_slots(images);

        let Some(rect) = shader_scissor(frame.bounds(), frame.translation(), self.logical) else {
            trace!("shader rectangle lies off screen");
            return;
        };
        let (Some(pipeline), Some(slots)) = (self.pipeline.as_ref(), self.slots.as_ref()) else {
            return;
        };

        let uniforms = ViewerUniforms::from_frame(frame, self.logical);
        // Staged per pass so several shader draws in one frame keep their own values.
        let staging = self
            .context
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("uniform staging"),
                contents: bytemuck::bytes_of(&uniforms),
                usage: wgpu::BufferUsages::COPY_SRC,
            });
        encoder.copy_buffer_to_buffer(
            &staging,
            0,
            &self.uniform_buffer,
            0,
            std::mem::size_of::<ViewerUniforms>() as u64,
        );

        let mut pass = begin_pass(encoder, &self.screen.view, wgpu::LoadOp::Load, "shader pass");
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        pass.set_bind_group(1, &slots.bind_group, &[]);
        pass.set_scissor_rect(rect.x, rect.y, rect.width, rect.height);
        pass.draw(0..3, 0..1);
    }

    fn encode_present(&self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        let size = self.context.size;
        let rect = letterbox(self.logical, Size::new(size.width, size.height));
        let mut pass = begin_pass(encoder, view, wgpu::LoadOp::Clear(wgpu::Color::BLACK), "present pass");
        pass.set_pipeline(&self.present_blit);
        pass.set_bind_group(0, &self.screen_bind_group, &[]);
        pass.set_viewport(
            rect.x as f32,
            rect.y as f32,
            rect.width as f32,
            rect.height as f32,
            0.0,
            1.0,
        );
        pass.draw(0..3, 0..1);
    }

    /// Builds a pipeline for `program` unless it was already attempted. A
    /// program the GPU rejects leaves the previous pipeline in place.
    fn ensure_pipeline(&mut self, program: &Arc<ShaderProgram>) {
        if self
            .attempted
            .as_ref()
            .is_some_and(|attempted| Arc::ptr_eq(attempted, program))
        {
            return;
        }
        self.attempted = Some(Arc::clone(program));

        let device = &self.context.device;
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = shader_pipeline(device, &self.layouts, program);
        match pollster::block_on(device.pop_error_scope()) {
            Some(error) => {
                warn!(%error, "GPU rejected shader; keeping previous pipeline");
            }
            None => {
                debug!(replaced = self.pipeline.is_some(), "shader pipeline built");
                self.pipeline = Some(pipeline);
            }
        }
    }

    fn ensure_slots(&mut self, images: &[Arc<Bitmap>]) {
        let current = self.slots.as_ref().is_some_and(|slots| {
            slots.images.len() == images.len()
                && slots.images.iter().zip(images).all(|(a, b)| Arc::ptr_eq(a, b))
        });
        if current {
            return;
        }

        let device = &self.context.device;
        let textures: Vec<ImageTexture> = images
            .iter()
            .take(IMAGE_SLOTS)
            .enumerate()
            .map(|(index, image)| {
                upload_bitmap(
                    device,
                    &self.context.queue,
                    image,
                    &format!("image {index}"),
                    self.context.max_texture_dimension,
                )
            })
            .collect();
        let mut bound: Vec<&ImageTexture> = textures.iter().collect();
        while bound.len() < IMAGE_SLOTS {
            bound.push(&self.placeholder);
        }
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("image slots"),
            layout: &self.layouts.images_layout,
            entries: &texture_entries(&bound),
        });
        trace!(count = textures.len(), "image slots uploaded");

        self.slots = Some(SlotBinding {
            images: images.to_vec(),
            _textures: textures,
            bind_group,
        });
    }

    fn blit_entry(&mut self, image: &Arc<Bitmap>) -> usize {
        if let Some(index) = self
            .blits
            .iter()
            .position(|entry| Arc::ptr_eq(&entry.image, image))
        {
            self.blits[index].used = true;
            return index;
        }

        let device = &self.context.device;
        let texture = upload_bitmap(
            device,
            &self.context.queue,
            image,
            "background",
            self.context.max_texture_dimension,
        );
        let bind_group = blit_bind_group(device, &self.layouts, &texture, "background");
        self.blits.push(BlitEntry {
            image: Arc::clone(image),
            _texture: texture,
            bind_group,
            used: true,
        });
        self.blits.len() - 1
    }
}

fn blit_bind_group(
    device: &wgpu::Device,
    layouts: &PipelineLayouts,
    texture: &ImageTexture,
    label: &str,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout: &layouts.blit_layout,
        entries: &texture_entries(&[texture]),
    })
}

fn begin_pass<'a>(
    encoder: &'a mut wgpu::CommandEncoder,
    view: &'a wgpu::TextureView,
    load: wgpu::LoadOp<wgpu::Color>,
    label: &str,
) -> wgpu::RenderPass<'a> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            depth_slice: None,
            resolve_target: None,
            ops: wgpu::Operations {
                load,
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        occlusion_query_set: None,
        timestamp_writes: None,
    })
}
