//! Depth-image renderer for synthesizing labeled perception data.
//!
//! A [`DepthRenderer`] owns a fixed set of named meshes in a persistent
//! scene graph. Each [`DepthRenderer::render`] call repositions the objects
//! and the camera from caller-supplied poses, runs one GPU depth pass and
//! returns the resulting [`DepthImage`]: per pixel, the metric distance from
//! the camera along its optical axis, `0.0` where nothing is visible.

pub mod engine;
pub mod loader;
pub mod renderer;
pub mod transform;

pub use engine::camera::{Camera, Intrinsics};
pub use engine::core::target::DepthImage;
pub use loader::MeshSource;
pub use renderer::{
    CameraPose, CoordFrame, DepthRenderer, Error, Pose, RendererOptions, Result,
};
