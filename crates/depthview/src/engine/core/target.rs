use anyhow::{Context, Result};

use super::context::GpuContext;
use super::{Size2D, BACKGROUND_DEPTH};

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
pub const LINEAR_DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R32Float;

/// Render target for one frame: a D32 attachment for the visibility test and
/// an R32Float attachment holding metric view-space depth, plus the staging
/// buffer the depth image is read back through.
pub struct RenderTarget {
    pub depth_view: wgpu::TextureView,
    pub linear_texture: wgpu::Texture,
    pub linear_view: wgpu::TextureView,
    readback_buffer: wgpu::Buffer,
    padded_bytes_per_row: u32,
    pub size: Size2D,
}

impl RenderTarget {
    pub fn new(context: &GpuContext, size: Size2D) -> Self {
        let extent = wgpu::Extent3d {
            width: size[0],
            height: size[1],
            depth_or_array_layers: 1,
        };

        let depth_texture = context.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth attachment"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        let linear_texture = context.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("linear depth"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: LINEAR_DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        // Rows of a texture-to-buffer copy must be 256-byte aligned
        let unpadded_bytes_per_row = size[0] * 4;
        let padded_bytes_per_row =
            unpadded_bytes_per_row.next_multiple_of(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);

        let readback_buffer = context.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("depth readback"),
            size: (padded_bytes_per_row * size[1]) as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        RenderTarget {
            depth_view: depth_texture.create_view(&wgpu::TextureViewDescriptor::default()),
            linear_view: linear_texture.create_view(&wgpu::TextureViewDescriptor::default()),
            linear_texture,
            readback_buffer,
            padded_bytes_per_row,
            size,
        }
    }

    /// Records the copy of the linear depth attachment into the readback
    /// buffer. Must run at the end of the frame's command encoder so the copy
    /// sees the finished depth pass.
    pub fn copy_to_readback(&self, encoder: &mut wgpu::CommandEncoder) {
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.linear_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.readback_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(self.padded_bytes_per_row),
                    rows_per_image: None,
                },
            },
            wgpu::Extent3d {
                width: self.size[0],
                height: self.size[1],
                depth_or_array_layers: 1,
            },
        );
    }

    /// Blocks until the queue is idle and returns the most recently submitted
    /// frame's depth image, row padding stripped.
    pub fn read_depth_image(&self, context: &GpuContext) -> Result<DepthImage> {
        let [width, height] = self.size;
        let pixels = {
            let slice = self.readback_buffer.slice(..);
            slice.map_async(wgpu::MapMode::Read, |_| ());
            let _ = context.device.poll(wgpu::Maintain::Wait);
            let data = slice.get_mapped_range();

            let row_bytes = (width * 4) as usize;
            let mut pixels = Vec::with_capacity((width * height) as usize);
            for row in 0..height as usize {
                let start = row * self.padded_bytes_per_row as usize;
                pixels.extend_from_slice(bytemuck::cast_slice::<u8, f32>(
                    &data[start..start + row_bytes],
                ));
            }
            pixels
        };
        self.readback_buffer.unmap();

        Ok(DepthImage {
            width,
            height,
            pixels,
        })
    }
}

/// A single-channel depth image: row-major, one f32 per pixel holding the
/// distance from the camera along its optical axis, `0.0` where nothing was
/// hit.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthImage {
    width: u32,
    height: u32,
    pixels: Vec<f32>,
}

impl DepthImage {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, row: u32, col: u32) -> f32 {
        self.pixels[(row * self.width + col) as usize]
    }

    pub fn pixels(&self) -> &[f32] {
        &self.pixels
    }

    /// Fraction of pixels that hit geometry.
    pub fn coverage(&self) -> f32 {
        let hits = self.pixels.iter().filter(|d| **d != BACKGROUND_DEPTH as f32).count();
        hits as f32 / self.pixels.len() as f32
    }
}

/// Grayscale preview of the linear depth attachment, drawn to the window
/// surface in visible mode.
pub struct PresentBlit {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
}

impl PresentBlit {
    pub fn new(
        context: &GpuContext,
        target: &RenderTarget,
        surface_format: wgpu::TextureFormat,
    ) -> Result<Self> {
        let shader_module = context.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("blit"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../../shaders/blit.wgsl").into()),
        });

        let bind_group_layout =
            context.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("blit input"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        // R32Float is not filterable; the shader uses textureLoad
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                }],
            });

        let bind_group = context.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("blit input"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&target.linear_view),
            }],
        });

        let pipeline_layout =
            context.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: None,
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });

        let pipeline = context.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("present blit"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader_module,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader_module,
                entry_point: Some("fs_main"),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Ok(PresentBlit {
            pipeline,
            bind_group,
        })
    }

    pub fn present(&self, context: &GpuContext, surface: &wgpu::Surface) -> Result<()> {
        let frame = surface.get_current_texture().context("acquire surface frame")?;
        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor::default());
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("present blit"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
        context.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }
}
