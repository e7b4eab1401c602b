//! Elementary affine matrix builders.
//!
//! Each builder is a pure function returning a 4x4 matrix already oriented for
//! [`CONVENTION`](crate::convention::CONVENTION). Matrices are written out column by column so the
//! homogeneous entries are explicit.

use glam::{Mat4, Vec3, Vec4};

use crate::convention::CONVENTION;

/// The 4x4 identity matrix.
#[inline]
pub fn identity() -> Mat4 {
    Mat4::IDENTITY
}

/// A uniform scale on the three spatial axes.
///
/// The homogeneous diagonal entry stays `1`. Multiplying [`identity`] by `factor` would scale it
/// too, which then survives into `w`.
pub fn scale_matrix(factor: f32) -> Mat4 {
    CONVENTION.orient(Mat4::from_cols(
        Vec4::new(factor, 0.0, 0.0, 0.0),
        Vec4::new(0.0, factor, 0.0, 0.0),
        Vec4::new(0.0, 0.0, factor, 0.0),
        Vec4::W,
    ))
}

/// Right-handed rotation about the X axis.
pub fn rotation_x(angle: f32) -> Mat4 {
    let (s, c) = angle.sin_cos();

    CONVENTION.orient(Mat4::from_cols(
        Vec4::X,
        Vec4::new(0.0, c, s, 0.0),
        Vec4::new(0.0, -s, c, 0.0),
        Vec4::W,
    ))
}

/// Right-handed rotation about the Y axis.
pub fn rotation_y(angle: f32) -> Mat4 {
    let (s, c) = angle.sin_cos();

    CONVENTION.orient(Mat4::from_cols(
        Vec4::new(c, 0.0, -s, 0.0),
        Vec4::Y,
        Vec4::new(s, 0.0, c, 0.0),
        Vec4::W,
    ))
}

/// Right-handed rotation about the Z axis.
pub fn rotation_z(angle: f32) -> Mat4 {
    let (s, c) = angle.sin_cos();

    CONVENTION.orient(Mat4::from_cols(
        Vec4::new(c, s, 0.0, 0.0),
        Vec4::new(-s, c, 0.0, 0.0),
        Vec4::Z,
        Vec4::W,
    ))
}

/// The identity with `offset` written into the translation slot.
pub fn translation_matrix(offset: Vec3) -> Mat4 {
    CONVENTION.orient(Mat4::from_cols(
        Vec4::X,
        Vec4::Y,
        Vec4::Z,
        offset.extend(1.0),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn assert_mat_near(a: Mat4, b: Mat4) {
        assert!(
            a.abs_diff_eq(b, 1e-5),
            "matrices differ:\n{:?}\n{:?}",
            a,
            b
        );
    }

    #[test]
    fn identity_has_unit_diagonal() {
        let m = identity().to_cols_array_2d();
        for (i, col) in m.iter().enumerate() {
            for (j, value) in col.iter().enumerate() {
                assert_eq!(*value, if i == j { 1.0 } else { 0.0 });
            }
        }
    }

    #[test]
    fn scale_leaves_homogeneous_entry_alone() {
        let m = scale_matrix(3.5);
        assert_eq!(m.x_axis.x, 3.5);
        assert_eq!(m.y_axis.y, 3.5);
        assert_eq!(m.z_axis.z, 3.5);
        assert_eq!(m.w_axis, Vec4::W);

        // The naive construction is exactly what this must not equal.
        assert_ne!(m, identity() * 3.5);
    }

    #[test]
    fn scale_of_zero_is_still_affine() {
        let m = scale_matrix(0.0);
        assert_eq!(m.w_axis, Vec4::W);
        assert_eq!(m * Vec4::new(4.0, 5.0, 6.0, 1.0), Vec4::W);
    }

    #[test]
    fn rotations_match_glam() {
        for angle in [-2.1, -0.4, 0.0, 0.3, 1.0, 3.0] {
            assert_mat_near(rotation_x(angle), Mat4::from_rotation_x(angle));
            assert_mat_near(rotation_y(angle), Mat4::from_rotation_y(angle));
            assert_mat_near(rotation_z(angle), Mat4::from_rotation_z(angle));
        }
    }

    #[test]
    fn rotations_are_right_handed() {
        let x = Vec4::new(1.0, 0.0, 0.0, 1.0);
        let y = Vec4::new(0.0, 1.0, 0.0, 1.0);

        // Quarter turns: y -> z about X, x -> -z about Y, x -> y about Z.
        assert!((rotation_x(FRAC_PI_2) * y - Vec4::new(0.0, 0.0, 1.0, 1.0)).length() < 1e-6);
        assert!((rotation_y(FRAC_PI_2) * x - Vec4::new(0.0, 0.0, -1.0, 1.0)).length() < 1e-6);
        assert!((rotation_z(FRAC_PI_2) * x - Vec4::new(0.0, 1.0, 0.0, 1.0)).length() < 1e-6);
    }

    #[test]
    fn rotation_homogeneous_row_and_column_are_trivial() {
        for m in [rotation_x(0.8), rotation_y(0.8), rotation_z(0.8)] {
            assert_eq!(m.w_axis, Vec4::W);
            assert_eq!(m.row(3), Vec4::W);
        }
    }

    #[test]
    fn translation_offsets_points_but_not_directions() {
        let m = translation_matrix(Vec3::new(1.0, -2.0, 3.0));
        assert_eq!(m.to_cols_array()[12..16], [1.0, -2.0, 3.0, 1.0]);
        assert_eq!(
            m * Vec4::new(1.0, 1.0, 1.0, 1.0),
            Vec4::new(2.0, -1.0, 4.0, 1.0)
        );
        assert_eq!(
            m * Vec4::new(1.0, 1.0, 1.0, 0.0),
            Vec4::new(1.0, 1.0, 1.0, 0.0)
        );
    }

    #[test]
    fn nan_angle_propagates() {
        let m = rotation_z(f32::NAN);
        assert!(m.x_axis.x.is_nan());
        assert_eq!(m.z_axis, Vec4::Z);
    }
}
