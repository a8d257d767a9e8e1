use crate::compile::{create_blit_module, create_fragment_module, create_vertex_module};
use crate::types::{ShaderProgram, IMAGE_SLOTS};

use super::textures::{texture_layout_entries, IMAGE_FORMAT};

/// Bind group layouts and shader modules that never change after startup.
pub(crate) struct PipelineLayouts {
    pub uniform_layout: wgpu::BindGroupLayout,
    pub images_layout: wgpu::BindGroupLayout,
    pub blit_layout: wgpu::BindGroupLayout,
    vertex_module: wgpu::ShaderModule,
    blit_module: wgpu::ShaderModule,
}

impl PipelineLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let images_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("image layout"),
            entries: &texture_layout_entries(IMAGE_SLOTS),
        });
        let blit_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("blit layout"),
            entries: &texture_layout_entries(1),
        });

        Self {
            uniform_layout,
            images_layout,
            blit_layout,
            vertex_module: create_vertex_module(device),
            blit_module: create_blit_module(device),
        }
    }
}

/// Premultiplied-alpha "source over" blending.
pub(crate) const SOURCE_OVER: wgpu::BlendState = wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING;

pub(crate) fn shader_pipeline(
    device: &wgpu::Device,
    layouts: &PipelineLayouts,
    program: &ShaderProgram,
) -> wgpu::RenderPipeline {
    let fragment_module = create_fragment_module(device, program);
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("shader pipeline layout"),
        bind_group_layouts: &[&layouts.uniform_layout, &layouts.images_layout],
        push_constant_ranges: &[],
    });
    build(
        device,
        "shader pipeline",
        &layout,
        &layouts.vertex_module,
        &fragment_module,
        IMAGE_FORMAT,
        Some(SOURCE_OVER),
    )
}

/// Pipeline that copies one texture over the whole viewport into `format`.
pub(crate) fn blit_pipeline(
    device: &wgpu::Device,
    layouts: &PipelineLayouts,
    format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
    label: &str,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[&layouts.blit_layout],
        push_constant_ranges: &[],
    });
    build(
        device,
        label,
        &layout,
        &layouts.vertex_module,
        &layouts.blit_module,
        format,
        blend,
    )
}

fn build(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    vertex_module: &wgpu::ShaderModule,
    fragment_module: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: vertex_module,
            entry_point: Some("main"),
            buffers: &[],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: fragment_module,
            entry_point: Some("main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview: None,
        cache: None,
    })
}
