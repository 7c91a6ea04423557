use glam::{EulerRot, Mat4, Vec3};

use crate::renderer::Error;

/// Translation used for objects with no pose this frame. Far enough outside
/// the camera frustum that the geometry is always clipped, small enough that
/// composing it stays finite in f32.
pub const HIDDEN_TRANSLATION: Vec3 = Vec3::new(1.0e7, 1.0e7, 1.0e7);

/// Builds a rigid transform from a translation and extrinsic x-y-z Euler
/// angles `(roll, pitch, yaw)` in radians.
///
/// The matrix product is `T(translate) * Rz(yaw) * Ry(pitch) * Rx(roll)`.
/// Image content depends on this exact order; do not reorder.
pub fn compose(translate: Vec3, angles: Vec3) -> Mat4 {
    let rotation = Mat4::from_euler(EulerRot::ZYX, angles.z, angles.y, angles.x);
    Mat4::from_translation(translate) * rotation
}

/// Exact inverse of a transform matrix.
///
/// Transforms built by [`compose`] are rigid and always invertible; the
/// degenerate check exists for the camera-inverse path, where a caller can
/// feed an arbitrary matrix.
pub fn invert(transform: &Mat4) -> Result<Mat4, Error> {
    if transform.determinant().abs() < f32::EPSILON {
        return Err(Error::DegenerateTransform);
    }
    let inverse = transform.inverse();
    if !inverse.is_finite() {
        return Err(Error::DegenerateTransform);
    }
    Ok(inverse)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_mat4_eq(a: &Mat4, b: &Mat4, tolerance: f32) {
        for (x, y) in a.to_cols_array().iter().zip(b.to_cols_array().iter()) {
            assert!(
                (x - y).abs() <= tolerance,
                "matrices differ:\n{a}\n{b}"
            );
        }
    }

    #[test]
    fn compose_applies_roll_pitch_yaw_in_fixed_order() {
        let translate = Vec3::new(0.5, -1.0, 2.0);
        let angles = Vec3::new(0.3, -0.8, 1.2);

        let reference = Mat4::from_translation(translate)
            * Mat4::from_rotation_z(angles.z)
            * Mat4::from_rotation_y(angles.y)
            * Mat4::from_rotation_x(angles.x);

        assert_mat4_eq(&compose(translate, angles), &reference, 1e-6);
    }

    #[test]
    fn compose_translation_lands_in_last_column() {
        let transform = compose(Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.4, 0.5, 0.6));
        assert_eq!(transform.w_axis.truncate(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn invert_round_trips() {
        let transform = compose(Vec3::new(0.2, 0.4, -1.5), Vec3::new(1.0, -0.3, 2.1));
        let twice = invert(&invert(&transform).unwrap()).unwrap();
        assert_mat4_eq(&twice, &transform, 1e-6);
    }

    #[test]
    fn invert_times_original_is_identity() {
        let transform = compose(Vec3::new(-3.0, 0.7, 1.1), Vec3::new(0.9, 1.4, -0.2));
        let product = invert(&transform).unwrap() * transform;
        assert_mat4_eq(&product, &Mat4::IDENTITY, 1e-6);
    }

    #[test]
    fn hidden_translation_composes_finite() {
        let transform = compose(HIDDEN_TRANSLATION, Vec3::ZERO);
        assert!(transform.is_finite());
        assert!(invert(&transform).unwrap().is_finite());
    }

    #[test]
    fn singular_matrix_is_rejected() {
        assert!(matches!(invert(&Mat4::ZERO), Err(Error::DegenerateTransform)));

        let mut flat = Mat4::IDENTITY;
        flat.z_axis = glam::Vec4::ZERO;
        assert!(matches!(invert(&flat), Err(Error::DegenerateTransform)));
    }
}
