use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{ensure, Context, Result};
use itertools::Itertools;
use tracing::{debug, info, warn};

use crate::engine::core::context::GpuContext;
use crate::engine::core::mesh::Mesh;
use crate::engine::core::{MeshIndex, Vertex3};

/// Loads every triangle primitive of a glTF/glb file into a single mesh.
/// `scale` is baked into the vertex positions so the renderer never needs a
/// per-node scale matrix.
pub fn load_mesh(context: &GpuContext, path: &Path, scale: f32) -> Result<Arc<Mesh>> {
    info!("loading mesh '{}'", path.display());
    let now = Instant::now();

    let (document, buffers, _) =
        gltf::import(path).with_context(|| format!("import mesh '{}'", path.display()))?;

    let mut vertices: Vec<Vertex3> = Vec::new();
    let mut indices: Vec<MeshIndex> = Vec::new();

    for mesh in document.meshes() {
        let primitives = mesh
            .primitives()
            .filter(|p| p.mode() == gltf::mesh::Mode::Triangles)
            .collect_vec();

        for primitive in primitives {
            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

            let Some(positions) = reader.read_positions() else {
                warn!("primitive in '{}' has no vertex positions, ignoring", path.display());
                continue;
            };

            let base = vertices.len() as MeshIndex;
            vertices.extend(positions.map(|p| Vertex3 {
                a_position: [p[0] * scale, p[1] * scale, p[2] * scale],
            }));

            if let Some(read) = reader.read_indices() {
                indices.extend(read.into_u32().map(|i| base + i));
            } else {
                // non-indexed primitive: consecutive triangles
                indices.extend(base..vertices.len() as MeshIndex);
            }
        }
    }

    ensure!(!vertices.is_empty(), "mesh '{}' has no triangle geometry", path.display());
    debug!(
        vertices = vertices.len(),
        indices = indices.len(),
        "mesh loaded in {:?}",
        now.elapsed()
    );

    Ok(Arc::new(Mesh::try_new(context, vertices, Some(indices))?))
}
