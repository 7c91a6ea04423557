use std::sync::Arc;

use anyhow::Result;
use glam::Vec3;

use crate::engine::core::context::GpuContext;
use crate::engine::core::mesh::Mesh;
use crate::engine::core::{MeshIndex, Vertex3};

/// Axis-aligned box centered on the origin.
pub fn make_box(context: &GpuContext, half_extents: Vec3) -> Result<Arc<Mesh>> {
    let h = half_extents;
    let vertices = [
        [-h.x, -h.y, -h.z],
        [h.x, -h.y, -h.z],
        [h.x, h.y, -h.z],
        [-h.x, h.y, -h.z],
        [-h.x, -h.y, h.z],
        [h.x, -h.y, h.z],
        [h.x, h.y, h.z],
        [-h.x, h.y, h.z],
    ]
    .into_iter()
    .map(|a_position| Vertex3 { a_position })
    .collect();

    #[rustfmt::skip]
    let indices: Vec<MeshIndex> = vec![
        0, 1, 2, 0, 2, 3, // -z
        4, 6, 5, 4, 7, 6, // +z
        0, 4, 5, 0, 5, 1, // -y
        3, 2, 6, 3, 6, 7, // +y
        0, 3, 7, 0, 7, 4, // -x
        1, 5, 6, 1, 6, 2, // +x
    ];

    Ok(Arc::new(Mesh::try_new(context, vertices, Some(indices))?))
}

/// Square plane in the x-y plane, normal along z.
pub fn make_plane(context: &GpuContext, half_size: f32) -> Result<Arc<Mesh>> {
    let s = half_size;
    let vertices = [
        [-s, -s, 0.0],
        [s, -s, 0.0],
        [s, s, 0.0],
        [-s, s, 0.0],
    ]
    .into_iter()
    .map(|a_position| Vertex3 { a_position })
    .collect();

    let indices: Vec<MeshIndex> = vec![0, 1, 2, 0, 2, 3];

    Ok(Arc::new(Mesh::try_new(context, vertices, Some(indices))?))
}
