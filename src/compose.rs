//! Composition of the elementary matrices into object and object-to-clip transforms.

use glam::{Mat4, Vec3};

use crate::convention::CONVENTION;
use crate::matrix::{rotation_x, rotation_y, rotation_z, scale_matrix, translation_matrix};
use crate::uniforms::{CameraMatrix, ObjectTransforms};

/// Euler rotation as the product `Rx(x) × Ry(y) × Rz(z)`.
///
/// The written product is fixed: under column vectors Z acts first, then Y, then X. Reordering
/// changes visible orientation for any non-axis-aligned rotation and is a breaking change.
pub fn object_rotation_matrix(rotation: Vec3) -> Mat4 {
    let rx = rotation_x(rotation.x);
    let ry = rotation_y(rotation.y);
    let rz = rotation_z(rotation.z);

    CONVENTION.then(CONVENTION.then(rz, ry), rx)
}

/// Object-to-world matrix: scale, then rotate, then translate.
///
/// Under [`CONVENTION`] this is the product `translation × rotation × scale`.
pub fn object_matrix(transforms: &ObjectTransforms) -> Mat4 {
    let scale = scale_matrix(transforms.scale);
    let rotation = object_rotation_matrix(transforms.rotation);
    let translation = translation_matrix(transforms.position);

    CONVENTION.then(CONVENTION.then(scale, rotation), translation)
}

/// Object-to-clip matrix. The camera is applied after the object matrix.
///
/// The camera is opaque: a singular or degenerate matrix is not detected.
pub fn vertex_transform_matrix(object: Mat4, camera: &CameraMatrix) -> Mat4 {
    CONVENTION.then(object, camera.matrix())
}
