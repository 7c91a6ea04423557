use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Vec3, Vec4};

use crate::renderer::Pose;
use crate::transform;

/// Smallest orbit radius. A zero radius would put the eye on the orbit
/// target and the view matrix would degenerate.
pub const MIN_ORBIT_RADIUS: f32 = 1e-6;

const Z_NEAR: f32 = 0.05;
const Z_FAR: f32 = 1000.0;

#[derive(Debug, Clone, Copy)]
pub struct Intrinsics {
    pub fx: f32,
    pub fy: f32,
    pub cx: f32,
    pub cy: f32,
    pub skew: f32,
}

/// Camera with two pose parameterizations: an orbit around the origin
/// (azimuth, elevation, radius) or an explicit 6-DoF pose. A render call
/// uses one or the other, never a blend.
pub struct Camera {
    /// Azimuth in radians, rotating about the +Y axis.
    pub alpha: f32,
    /// Elevation in radians, tilting toward +Y.
    pub beta: f32,
    /// Orbit radius, always >= [`MIN_ORBIT_RADIUS`].
    pub r: f32,
    /// Current view matrix: world as seen from the camera.
    pub camera_from_world: Mat4,
    intrinsics: Option<Intrinsics>,
    width: u32,
    height: u32,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        let mut camera = Camera {
            alpha: 0.0,
            beta: 0.0,
            r: 2.0,
            camera_from_world: Mat4::IDENTITY,
            intrinsics: None,
            width,
            height,
        };
        camera.camera_from_world = camera.look_at();
        camera
    }

    /// One-time projection configuration from a pinhole model. Affects
    /// subsequent projections only; the current frame's view is untouched.
    pub fn set_intrinsics(
        &mut self,
        width: u32,
        height: u32,
        fx: f32,
        fy: f32,
        cx: f32,
        cy: f32,
        skew: f32,
    ) {
        self.width = width;
        self.height = height;
        self.intrinsics = Some(Intrinsics { fx, fy, cx, cy, skew });
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn set_orbital(&mut self, alpha: f32, beta: f32, r: f32) {
        self.alpha = alpha;
        self.beta = beta;
        self.r = r.max(MIN_ORBIT_RADIUS);
    }

    /// View matrix of an orbit pose. Convention: right-handed, +Y up, the
    /// camera looks along its own -Z toward the origin. The eye sits at
    /// `r * (cos b sin a, sin b, cos b cos a)`, so `a = b = 0` places it on
    /// the +Z axis.
    pub fn orbital_view(alpha: f32, beta: f32, r: f32) -> Mat4 {
        let eye = r * Vec3::new(beta.cos() * alpha.sin(), beta.sin(), beta.cos() * alpha.cos());
        // up flips to Z when the eye reaches a pole
        let up = if beta.cos().abs() < 1e-4 { Vec3::Z } else { Vec3::Y };
        Mat4::look_at_rh(eye, Vec3::ZERO, up)
    }

    pub fn look_at(&self) -> Mat4 {
        Self::orbital_view(self.alpha, self.beta, self.r)
    }

    /// Sets the view matrix from an explicit camera pose. The translation is
    /// negated: the camera matrix expresses the world as seen from the
    /// camera, the inverse sense of an object placement.
    pub fn set_explicit(&mut self, pose: &Pose) {
        self.camera_from_world = transform::compose(-pose.position, pose.rotation);
    }

    pub fn projection(&self) -> Mat4 {
        match self.intrinsics {
            Some(k) => self.projection_from_intrinsics(&k),
            None => {
                let aspect = self.width as f32 / self.height as f32;
                Mat4::perspective_rh(FRAC_PI_2, aspect, Z_NEAR, Z_FAR)
            }
        }
    }

    /// Projection matrix of a pinhole camera `[[fx, skew, cx], [0, fy, cy],
    /// [0, 0, 1]]` with image y running downward, mapped to wgpu clip space
    /// (y up, depth 0..1). Points on the optical axis land on pixel
    /// `(cx, cy)`.
    fn projection_from_intrinsics(&self, k: &Intrinsics) -> Mat4 {
        let w = self.width as f32;
        let h = self.height as f32;
        let z_scale = Z_FAR / (Z_NEAR - Z_FAR);
        Mat4::from_cols(
            Vec4::new(2.0 * k.fx / w, 0.0, 0.0, 0.0),
            Vec4::new(-2.0 * k.skew / w, 2.0 * k.fy / h, 0.0, 0.0),
            Vec4::new(1.0 - 2.0 * k.cx / w, 2.0 * k.cy / h - 1.0, z_scale, -1.0),
            Vec4::new(0.0, 0.0, Z_NEAR * z_scale, 0.0),
        )
    }
}
