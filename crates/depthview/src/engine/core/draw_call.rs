use anyhow::Result;
use wgpu::CompareFunction;

use super::context::GpuContext;
use super::target::{DEPTH_FORMAT, LINEAR_DEPTH_FORMAT};
use super::{Vertex3, VERTEX_FORMAT};

pub struct DrawCallProps {
    pub depth_test: bool,
    pub depth_write: bool,
}

/// The depth pass pipeline. One instance is shared by every node; nodes
/// differ only in their uniform bind group and mesh buffers.
pub struct DrawCall {
    pub pipeline: wgpu::RenderPipeline,
    node_bind_group_layout: wgpu::BindGroupLayout,
}

impl DrawCall {
    pub fn new(context: &GpuContext, props: DrawCallProps) -> Result<DrawCall> {
        let shader_module = context.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("depth"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../../shaders/depth.wgsl").into()),
        });

        let node_bind_group_layout =
            context.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("node uniforms"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let pipeline_layout =
            context.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: None,
                bind_group_layouts: &[&node_bind_group_layout],
                push_constant_ranges: &[],
            });

        let vertex_buffer_layout = wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex3>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &VERTEX_FORMAT,
        };

        let depth_compare =
            if props.depth_test { CompareFunction::LessEqual } else { CompareFunction::Always };
        let depth_stencil = wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: props.depth_write,
            depth_compare,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        };

        let pipeline = context.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("depth pass"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader_module,
                entry_point: Some("vs_main"),
                buffers: &[vertex_buffer_layout],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader_module,
                entry_point: Some("fs_main"),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                // R32Float is not blendable; depth values replace outright
                targets: &[Some(wgpu::ColorTargetState {
                    format: LINEAR_DEPTH_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: Some(depth_stencil),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Ok(DrawCall {
            pipeline,
            node_bind_group_layout,
        })
    }

    pub fn node_bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.node_bind_group_layout
    }
}
