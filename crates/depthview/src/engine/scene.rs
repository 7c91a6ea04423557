use std::sync::Arc;

use anyhow::Result;
use glam::Mat4;
use smallvec::SmallVec;
use tracing::debug;

use super::camera::Camera;
use super::core::context::{GpuContext, WindowTarget};
use super::core::draw_call::{DrawCall, DrawCallProps};
use super::core::globals::{Globals, NodeUniforms};
use super::core::mesh::Mesh;
use super::core::target::{DepthImage, PresentBlit, RenderTarget};
use super::core::{Size2D, BACKGROUND_DEPTH};

/// A persistent object in the scene: a name, an immutable geometry handle
/// and a pose transform that is rewritten every frame. Nodes are created at
/// renderer construction and live until the renderer is dropped.
pub struct SceneNode {
    pub id: String,
    pub mesh: Arc<Mesh>,
    pub transform: Mat4,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl SceneNode {
    fn new(context: &GpuContext, layout: &wgpu::BindGroupLayout, id: &str, mesh: Arc<Mesh>) -> Self {
        let uniform_buffer = context.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(id),
            size: std::mem::size_of::<NodeUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = context.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(id),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        SceneNode {
            id: id.to_string(),
            mesh,
            transform: Mat4::IDENTITY,
            uniform_buffer,
            bind_group,
        }
    }
}

struct FrameContext {
    command_encoder: wgpu::CommandEncoder,
}

/// Ordered node collection plus the camera and the frame lifecycle:
/// `clear -> draw -> swap_buffers -> get_depth_image`.
pub struct Scene {
    pub camera: Camera,
    gpu: Arc<GpuContext>,
    nodes: Vec<SceneNode>,
    draw_call: DrawCall,
    target: RenderTarget,
    window: WindowTarget,
    blit: Option<PresentBlit>,
    frame: Option<FrameContext>,
    clear_pending: bool,
}

impl Scene {
    pub fn new(gpu: Arc<GpuContext>, size: Size2D, window: WindowTarget) -> Result<Self> {
        let target = RenderTarget::new(&gpu, size);
        let draw_call = DrawCall::new(
            &gpu,
            DrawCallProps {
                depth_test: true,
                depth_write: true,
            },
        )?;
        let blit = match &window {
            WindowTarget::Windowed(state) => {
                Some(PresentBlit::new(&gpu, &target, state.config.format)?)
            }
            WindowTarget::Offscreen => None,
        };

        Ok(Scene {
            camera: Camera::new(size[0], size[1]),
            gpu,
            nodes: Vec::new(),
            draw_call,
            target,
            window,
            blit,
            frame: None,
            clear_pending: true,
        })
    }

    pub fn gpu(&self) -> &GpuContext {
        &self.gpu
    }

    pub fn create_node(&self, id: &str, mesh: Arc<Mesh>) -> SceneNode {
        SceneNode::new(&self.gpu, self.draw_call.node_bind_group_layout(), id, mesh)
    }

    /// Attaches nodes in draw order. Called once, right after construction;
    /// the node set never changes afterwards.
    pub fn insert(&mut self, nodes: Vec<SceneNode>) {
        debug!(count = nodes.len(), "attaching scene nodes");
        self.nodes.extend(nodes);
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node_mut(&mut self, index: usize) -> &mut SceneNode {
        &mut self.nodes[index]
    }

    /// Arms the clear of both attachments for the next `draw()`. Nodes stay
    /// attached; only the render target is reset.
    pub fn clear(&mut self) {
        self.frame = Some(FrameContext {
            command_encoder: self
                .gpu
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor::default()),
        });
        self.clear_pending = true;
    }

    /// Records the depth pass over every node with its current transform and
    /// the camera's current view/projection, then the readback copy.
    pub fn draw(&mut self) -> Result<()> {
        let mut globals = Globals {
            projection_from_camera: self.camera.projection(),
            camera_from_world: self.camera.camera_from_world,
            ..Default::default()
        };
        for node in &self.nodes {
            globals.world_from_model = node.transform;
            globals.update_compound_matrices();
            self.gpu.queue.write_buffer(
                &node.uniform_buffer,
                0,
                bytemuck::bytes_of(&NodeUniforms::from_globals(&globals)),
            );
        }

        let frame = self.frame.get_or_insert_with(|| FrameContext {
            command_encoder: self
                .gpu
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor::default()),
        });

        let load_color = if self.clear_pending {
            wgpu::LoadOp::Clear(wgpu::Color {
                r: BACKGROUND_DEPTH,
                g: 0.0,
                b: 0.0,
                a: 1.0,
            })
        } else {
            wgpu::LoadOp::Load
        };
        let load_depth =
            if self.clear_pending { wgpu::LoadOp::Clear(1.0) } else { wgpu::LoadOp::Load };

        let color_attachments: SmallVec<[_; 4]> =
            smallvec::smallvec![Some(wgpu::RenderPassColorAttachment {
                view: &self.target.linear_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: load_color,
                    store: wgpu::StoreOp::Store,
                },
            })];

        {
            let mut pass = frame.command_encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("depth pass"),
                color_attachments: &color_attachments,
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.target.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: load_depth,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            for node in &self.nodes {
                pass.set_pipeline(&self.draw_call.pipeline);
                pass.set_bind_group(0, &node.bind_group, &[]);
                pass.set_vertex_buffer(0, node.mesh.vertex_buffer.slice(..));
                if let Some(index_buffer) = &node.mesh.index_buffer {
                    pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..node.mesh.index_count, 0, 0..1);
                } else {
                    pass.draw(0..node.mesh.vertex_count, 0..1);
                }
            }
        }
        self.clear_pending = false;

        self.target.copy_to_readback(&mut frame.command_encoder);
        Ok(())
    }

    /// Submits the recorded frame. In windowed mode also draws the grayscale
    /// preview and presents it; offscreen this is just the submit, kept for
    /// call symmetry.
    pub fn swap_buffers(&mut self) -> Result<()> {
        let Some(frame) = self.frame.take() else {
            return Ok(());
        };
        self.gpu.queue.submit(Some(frame.command_encoder.finish()));

        if let (Some(blit), WindowTarget::Windowed(state)) = (&self.blit, &self.window) {
            blit.present(&self.gpu, &state.surface)?;
        }
        self.window.pump();
        Ok(())
    }

    /// Reads back the depth image of the last submitted frame. Blocks until
    /// the GPU queue has finished it.
    pub fn get_depth_image(&self) -> Result<DepthImage> {
        self.target.read_depth_image(&self.gpu)
    }
}
