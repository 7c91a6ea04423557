use glam::Mat4;

/// Per-frame matrix state shared by every draw. Compound matrices are
/// recomputed after `world_from_model` changes for each node.
#[derive(Default, Copy, Clone, Debug)]
pub struct Globals {
    pub projection_from_camera: Mat4,
    pub camera_from_world: Mat4,
    pub world_from_model: Mat4,
    pub camera_from_model: Mat4,
    pub projection_from_model: Mat4,
}

impl Globals {
    pub fn update_compound_matrices(&mut self) {
        self.camera_from_model = self.camera_from_world * self.world_from_model;
        self.projection_from_model = self.projection_from_camera * self.camera_from_model;
    }
}

/// Uniform block uploaded once per node per frame.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct NodeUniforms {
    pub projection_from_model: [[f32; 4]; 4],
    pub camera_from_model: [[f32; 4]; 4],
}

impl NodeUniforms {
    pub fn from_globals(globals: &Globals) -> Self {
        NodeUniforms {
            projection_from_model: globals.projection_from_model.to_cols_array_2d(),
            camera_from_model: globals.camera_from_model.to_cols_array_2d(),
        }
    }
}
