//! Per-draw inputs to the vertex stage and their GPU buffer mirrors.
//!
//! The host owns these values for the duration of a draw. [`ObjectTransforms`] and
//! [`CameraMatrix`] are the CPU-side types; [`ObjectTransformsUniform`] and [`CameraUniform`] are
//! the `#[repr(C)]` structs written into uniform buffers, laid out to match
//! `shaders/transform.wgsl`.
//!
//! # GPU layout
//!
//! | Struct                    | Field      | WGSL type     | Offset | Size |
//! |---------------------------|------------|---------------|--------|------|
//! | `ObjectTransformsUniform` | `position` | `vec3<f32>`   | 0      | 12   |
//! |                           | (padding)  |               | 12     | 4    |
//! |                           | `rotation` | `vec3<f32>`   | 16     | 12   |
//! |                           | `scale`    | `f32`         | 28     | 4    |
//! | `CameraUniform`           | `matrix`   | `mat4x4<f32>` | 0      | 64   |

use glam::{Mat4, Vec3, Vec4};

use crate::convention::{CONVENTION, Convention};

/// Spatial attributes of one renderable object.
///
/// # Example
///
/// ```
/// use vertform::{ObjectTransforms, Vec3};
///
/// let transforms = ObjectTransforms::new()
///     .at(Vec3::new(0.0, 2.0, -5.0))
///     .rotated(Vec3::new(0.0, 0.5, 0.0))
///     .scaled(2.0);
/// assert_eq!(transforms.scale, 2.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObjectTransforms {
    /// World-space translation.
    pub position: Vec3,
    /// Euler angles in radians about X, Y, and Z.
    pub rotation: Vec3,
    /// Uniform scale on the three spatial axes.
    pub scale: f32,
}

impl Default for ObjectTransforms {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: 1.0,
        }
    }
}

impl ObjectTransforms {
    /// Origin, no rotation, unit scale.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the translation.
    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Sets the Euler angles, applied X first in the product `Rx * Ry * Rz`.
    pub fn rotated(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    /// Sets the uniform scale factor.
    pub fn scaled(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }
}

/// The host's precomputed view-projection matrix.
///
/// Opaque to this crate: it is only ever applied after the object matrix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraMatrix(Mat4);

impl Default for CameraMatrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl CameraMatrix {
    /// A camera that leaves world space untouched.
    pub const IDENTITY: Self = Self(Mat4::IDENTITY);

    /// Wraps a view-projection matrix already oriented for [`CONVENTION`](crate::CONVENTION).
    pub fn from_mat4(matrix: Mat4) -> Self {
        Self(matrix)
    }

    /// The wrapped matrix, oriented for [`CONVENTION`](crate::CONVENTION).
    pub fn matrix(&self) -> Mat4 {
        self.0
    }
}

impl From<Mat4> for CameraMatrix {
    fn from(matrix: Mat4) -> Self {
        Self(matrix)
    }
}

/// One object-space vertex position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VertexInput {
    pub position: Vec3,
}

impl VertexInput {
    /// A vertex at object-space `(x, y, z)`.
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Vec3::new(x, y, z),
        }
    }
}

impl From<Vec3> for VertexInput {
    fn from(position: Vec3) -> Self {
        Self { position }
    }
}

/// One clip-space vertex position, handed to the rasterizer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VertexOutput {
    pub position: Vec4,
}

/// GPU mirror of [`ObjectTransforms`] for bind group 1.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectTransformsUniform {
    pub position: [f32; 3],
    /// `vec3<f32>` aligns to 16 bytes, so `rotation` starts at offset 16.
    pub _pad0: f32,
    pub rotation: [f32; 3],
    pub scale: f32,
}

impl From<&ObjectTransforms> for ObjectTransformsUniform {
    fn from(transforms: &ObjectTransforms) -> Self {
        Self {
            position: transforms.position.to_array(),
            _pad0: 0.0,
            rotation: transforms.rotation.to_array(),
            scale: transforms.scale,
        }
    }
}

/// GPU mirror of [`CameraMatrix`] for bind group 0.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub matrix: [[f32; 4]; 4],
}

impl CameraUniform {
    /// Packs `camera`, written under `convention`, for the shader's `matrix * vector`.
    pub fn from_convention(camera: &CameraMatrix, convention: Convention) -> Self {
        Self {
            matrix: convention.to_column_vector(camera.matrix()).to_cols_array_2d(),
        }
    }
}

impl From<&CameraMatrix> for CameraUniform {
    fn from(camera: &CameraMatrix) -> Self {
        Self::from_convention(camera, CONVENTION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};

    #[test]
    fn object_uniform_matches_wgsl_layout() {
        assert_eq!(size_of::<ObjectTransformsUniform>(), 32);
        assert_eq!(offset_of!(ObjectTransformsUniform, position), 0);
        assert_eq!(offset_of!(ObjectTransformsUniform, rotation), 16);
        assert_eq!(offset_of!(ObjectTransformsUniform, scale), 28);
    }

    #[test]
    fn camera_uniform_is_sixteen_floats() {
        assert_eq!(size_of::<CameraUniform>(), 64);
    }

    #[test]
    fn object_uniform_bytes() {
        let transforms = ObjectTransforms::new()
            .at(Vec3::new(1.0, 2.0, 3.0))
            .rotated(Vec3::new(4.0, 5.0, 6.0))
            .scaled(7.0);
        let uniform = ObjectTransformsUniform::from(&transforms);
        let floats: &[f32] = bytemuck::cast_slice(bytemuck::bytes_of(&uniform));

        assert_eq!(floats, &[1.0, 2.0, 3.0, 0.0, 4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn camera_uniform_stores_translation_last() {
        let camera = CameraMatrix::from_mat4(Mat4::from_translation(Vec3::new(8.0, 9.0, 10.0)));
        let uniform = CameraUniform::from(&camera);
        assert_eq!(uniform.matrix[3], [8.0, 9.0, 10.0, 1.0]);
    }

    #[test]
    fn camera_upload_is_convention_independent() {
        let column = Mat4::from_rotation_x(0.5) * Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let row = Convention::RowVector.orient(column);

        let from_column = CameraUniform::from_convention(
            &CameraMatrix::from_mat4(column),
            Convention::ColumnVector,
        );
        let from_row =
            CameraUniform::from_convention(&CameraMatrix::from_mat4(row), Convention::RowVector);
        assert_eq!(from_column.matrix, from_row.matrix);
        assert_eq!(from_row.matrix, column.to_cols_array_2d());
    }

    #[test]
    fn defaults_are_neutral() {
        let t = ObjectTransforms::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Vec3::ZERO);
        assert_eq!(t.scale, 1.0);
        assert_eq!(CameraMatrix::default().matrix(), Mat4::IDENTITY);
    }
}
