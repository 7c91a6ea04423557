pub mod geometry;
pub mod mesh_loader;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use glam::Vec3;

use crate::engine::core::context::GpuContext;
use crate::engine::core::mesh::Mesh;

/// Where an object's renderable geometry comes from.
#[derive(Debug, Clone)]
pub enum MeshSource {
    /// A glTF/glb file; `scale` is baked into the vertices at load time.
    File { path: PathBuf, scale: f32 },
    /// Procedural axis-aligned box centered on the origin.
    Box { half_extents: Vec3 },
    /// Procedural square plane in the x-y plane.
    Plane { half_size: f32 },
}

pub fn make_mesh(context: &GpuContext, source: &MeshSource) -> Result<Arc<Mesh>> {
    match source {
        MeshSource::File { path, scale } => mesh_loader::load_mesh(context, path, *scale),
        MeshSource::Box { half_extents } => geometry::make_box(context, *half_extents),
        MeshSource::Plane { half_size } => geometry::make_plane(context, *half_size),
    }
}
