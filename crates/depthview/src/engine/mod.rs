pub mod camera;
pub mod core;
pub mod scene;

pub use self::core::context::{create_context, GpuContext, WindowTarget};
pub use self::core::mesh::Mesh;
pub use self::core::target::DepthImage;
pub use self::core::{MeshIndex, Size2D, Vertex3};
