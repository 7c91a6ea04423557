pub mod context;
pub mod draw_call;
pub mod globals;
pub mod mesh;
pub mod target;

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3 {
    pub a_position: [f32; 3],
}

const VERTEX_FORMAT: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![
    0 => Float32x3,
];

pub type MeshIndex = u32;

pub type Size2D = [u32; 2];

/// Depth value written where no geometry is visible.
pub const BACKGROUND_DEPTH: f64 = 0.0;
