use std::collections::{BTreeMap, HashMap};

use anyhow::anyhow;
use glam::{Mat3, Mat4, Vec3};
use tracing::{info, trace};

use crate::engine::camera::{Camera, MIN_ORBIT_RADIUS};
use crate::engine::core::context::create_context;
use crate::engine::core::target::DepthImage;
use crate::engine::scene::Scene;
use crate::loader::{self, MeshSource};
use crate::transform::{self, HIDDEN_TRANSLATION};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The per-frame pose map names an object that was never registered.
    #[error("pose supplied for unknown object '{0}'")]
    UnknownObject(String),

    /// A pose slice had neither 3 nor 6 components.
    #[error("pose must have 3 or 6 components, got {0}")]
    InvalidPoseDimension(usize),

    /// A matrix that had to be inverted was singular.
    #[error("transform matrix is singular")]
    DegenerateTransform,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A 6-DoF placement: translation in world units, extrinsic x-y-z Euler
/// rotation in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Vec3,
}

impl Pose {
    pub fn new(position: Vec3, rotation: Vec3) -> Self {
        Pose { position, rotation }
    }

    /// Accepts `[x, y, z]` (zero rotation) or `[x, y, z, roll, pitch, yaw]`.
    pub fn from_slice(pose: &[f32]) -> Result<Self> {
        match *pose {
            [x, y, z] => Ok(Pose::new(Vec3::new(x, y, z), Vec3::ZERO)),
            [x, y, z, roll, pitch, yaw] => {
                Ok(Pose::new(Vec3::new(x, y, z), Vec3::new(roll, pitch, yaw)))
            }
            _ => Err(Error::InvalidPoseDimension(pose.len())),
        }
    }

    pub fn to_matrix(&self) -> Mat4 {
        transform::compose(self.position, self.rotation)
    }
}

/// The two camera parameterizations. A render call uses exactly one; there
/// is no blending between them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraPose {
    /// Orbit around the origin: azimuth, elevation, radius.
    Orbital { azimuth: f32, elevation: f32, radius: f32 },
    /// Explicit 6-DoF camera placement.
    Explicit(Pose),
}

impl CameraPose {
    /// Accepts `[azimuth, elevation, radius]` or a 6-DoF pose slice.
    pub fn from_slice(pose: &[f32]) -> Result<Self> {
        match *pose {
            [azimuth, elevation, radius] => Ok(CameraPose::Orbital {
                azimuth,
                elevation,
                radius,
            }),
            [_, _, _, _, _, _] => Ok(CameraPose::Explicit(Pose::from_slice(pose)?)),
            _ => Err(Error::InvalidPoseDimension(pose.len())),
        }
    }
}

/// Which frame the supplied object poses are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum CoordFrame {
    /// Poses are relative to the camera, as when simulating a moving sensor.
    #[strum(serialize = "cam")]
    Camera,
    /// Poses are in the fixed world frame.
    World,
}

#[derive(Debug, Clone)]
pub struct RendererOptions {
    /// Depth image width in pixels.
    pub width: u32,
    /// Depth image height in pixels.
    pub height: u32,
    /// Optional pinhole intrinsics `[[fx, skew, cx], [0, fy, cy], [0, 0, 1]]`.
    pub camera_k: Option<Mat3>,
    /// Render into a visible window instead of purely offscreen. Changes
    /// nothing about the pipeline, only where frames can be seen.
    pub show: bool,
}

impl Default for RendererOptions {
    fn default() -> Self {
        RendererOptions {
            width: 100,
            height: 100,
            camera_k: None,
            show: false,
        }
    }
}

/// Renders depth images of a fixed set of named meshes from caller-supplied
/// poses. The object set is established at construction and never changes;
/// every `render` call repositions all of it.
pub struct DepthRenderer {
    scene: Scene,
    registry: HashMap<String, usize>,
}

impl DepthRenderer {
    /// Creates the GPU context, loads every mesh and builds one scene node
    /// per object. This is the only place nodes are created.
    pub fn new(objects: &BTreeMap<String, MeshSource>, options: &RendererOptions) -> Result<Self> {
        if options.width == 0 || options.height == 0 {
            return Err(anyhow!(
                "image dimensions must be positive, got {}x{}",
                options.width,
                options.height
            )
            .into());
        }

        let (gpu, window) = create_context(options.width, options.height, options.show)?;
        let mut scene = Scene::new(gpu, [options.width, options.height], window)?;

        if let Some(k) = options.camera_k {
            scene.camera.set_intrinsics(
                options.width,
                options.height,
                k.x_axis.x,
                k.y_axis.y,
                k.z_axis.x,
                k.z_axis.y,
                k.y_axis.x,
            );
        }

        let mut registry = HashMap::with_capacity(objects.len());
        let mut nodes = Vec::with_capacity(objects.len());
        for (slot, (name, source)) in objects.iter().enumerate() {
            let mesh = loader::make_mesh(scene.gpu(), source)?;
            nodes.push(scene.create_node(name, mesh));
            registry.insert(name.clone(), slot);
        }
        scene.insert(nodes);

        info!(
            objects = registry.len(),
            width = options.width,
            height = options.height,
            "depth renderer ready"
        );
        Ok(DepthRenderer { scene, registry })
    }

    pub fn width(&self) -> u32 {
        self.scene.camera.width()
    }

    pub fn height(&self) -> u32 {
        self.scene.camera.height()
    }

    /// Renders one depth image.
    ///
    /// Objects missing from `object_poses` stay in the scene but are placed
    /// far outside the viewing frustum, so they contribute no pixels. The
    /// call is all-or-nothing: validation and every transform computation
    /// happen before any scene state is touched, so a failed call leaves the
    /// scene exactly as the previous call left it.
    pub fn render(
        &mut self,
        object_poses: &HashMap<String, Pose>,
        camera_pose: &CameraPose,
        frame: CoordFrame,
    ) -> Result<DepthImage> {
        for name in object_poses.keys() {
            if !self.registry.contains_key(name) {
                return Err(Error::UnknownObject(name.clone()));
            }
        }

        let camera_from_world = match *camera_pose {
            CameraPose::Orbital {
                azimuth,
                elevation,
                radius,
            } => Camera::orbital_view(azimuth, elevation, radius.max(MIN_ORBIT_RADIUS)),
            CameraPose::Explicit(pose) => transform::compose(-pose.position, pose.rotation),
        };

        // world-as-seen-from-camera cancels at draw time for camera-frame
        // poses; only this path can fail
        let world_from_camera = match frame {
            CoordFrame::Camera => Some(transform::invert(&camera_from_world)?),
            CoordFrame::World => None,
        };

        let mut node_transforms = vec![Mat4::IDENTITY; self.registry.len()];
        for (name, slot) in &self.registry {
            let world_from_model = match object_poses.get(name) {
                Some(pose) => pose.to_matrix(),
                None => transform::compose(HIDDEN_TRANSLATION, Vec3::ZERO),
            };
            node_transforms[*slot] = match &world_from_camera {
                Some(inverse) => *inverse * world_from_model,
                None => world_from_model,
            };
        }

        // commit
        match *camera_pose {
            CameraPose::Orbital {
                azimuth,
                elevation,
                radius,
            } => {
                self.scene.camera.set_orbital(azimuth, elevation, radius);
                self.scene.camera.camera_from_world = self.scene.camera.look_at();
            }
            CameraPose::Explicit(ref pose) => self.scene.camera.set_explicit(pose),
        }
        for (slot, transform) in node_transforms.into_iter().enumerate() {
            self.scene.node_mut(slot).transform = transform;
        }

        trace!(posed = object_poses.len(), total = self.registry.len(), "rendering frame");
        self.scene.clear();
        self.scene.draw()?;
        self.scene.swap_buffers()?;
        Ok(self.scene.get_depth_image()?)
    }

    /// Raw-slice boundary: poses as 3- or 6-element slices and the coordinate
    /// frame as its literal name (`"cam"` or `"world"`). This is where pose
    /// arity and frame names are validated.
    pub fn render_slices(
        &mut self,
        object_poses: &HashMap<String, Vec<f32>>,
        camera_pose: &[f32],
        coord_frame: &str,
    ) -> Result<DepthImage> {
        let camera = CameraPose::from_slice(camera_pose)?;
        let frame: CoordFrame = coord_frame
            .parse()
            .map_err(|_| anyhow!("coordinate frame must be \"cam\" or \"world\", got '{coord_frame}'"))?;

        let mut poses = HashMap::with_capacity(object_poses.len());
        for (name, values) in object_poses {
            poses.insert(name.clone(), Pose::from_slice(values)?);
        }
        self.render(&poses, &camera, frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pose_from_slice_accepts_translation_only() {
        let pose = Pose::from_slice(&[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(pose.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(pose.rotation, Vec3::ZERO);
    }

    #[test]
    fn pose_from_slice_accepts_full_pose() {
        let pose = Pose::from_slice(&[1.0, 2.0, 3.0, 0.1, 0.2, 0.3]).unwrap();
        assert_eq!(pose.rotation, Vec3::new(0.1, 0.2, 0.3));
    }

    #[test]
    fn pose_from_slice_rejects_other_arities() {
        for len in [0, 1, 2, 4, 5, 7] {
            let values = vec![0.0; len];
            assert!(
                matches!(Pose::from_slice(&values), Err(Error::InvalidPoseDimension(n)) if n == len)
            );
        }
    }

    #[test]
    fn camera_pose_from_slice_picks_parameterization_by_arity() {
        assert!(matches!(
            CameraPose::from_slice(&[0.7, 0.7, 2.0]),
            Ok(CameraPose::Orbital { .. })
        ));
        assert!(matches!(
            CameraPose::from_slice(&[0.0, 0.0, 1.0, 0.0, 0.0, 0.0]),
            Ok(CameraPose::Explicit(_))
        ));
        assert!(matches!(
            CameraPose::from_slice(&[1.0, 2.0]),
            Err(Error::InvalidPoseDimension(2))
        ));
    }

    #[test]
    fn coord_frame_parses_literal_names() {
        assert_eq!("cam".parse::<CoordFrame>().unwrap(), CoordFrame::Camera);
        assert_eq!("world".parse::<CoordFrame>().unwrap(), CoordFrame::World);
        assert!("screen".parse::<CoordFrame>().is_err());
    }
}
