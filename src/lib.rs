//! # Vertform
//!
//! **Object-to-clip vertex transforms, on the CPU and in a wgpu vertex stage.**
//!
//! Each vertex is scaled, rotated (Euler X/Y/Z), translated, and then run through a
//! host-supplied camera matrix. Clip-space `w` is reset to `1` and `y` is flipped for the
//! backend's clip-space convention.
//!
//! ## Quick Start
//!
//! ```
//! use vertform::*;
//! use std::f32::consts::FRAC_PI_2;
//!
//! let object = ObjectTransforms::new()
//!     .at(Vec3::new(1.0, 0.0, 0.0))
//!     .rotated(Vec3::new(0.0, FRAC_PI_2, 0.0))
//!     .scaled(2.0);
//!
//! let out = transform_vertex(
//!     VertexInput::new(1.0, 0.0, 0.0),
//!     &object,
//!     &CameraMatrix::IDENTITY,
//!     StageConfig::default(),
//! );
//!
//! assert!((out.position - Vec4::new(1.0, 0.0, -2.0, 1.0)).length() < 1e-5);
//! ```
//!
//! ## Layers
//!
//! - [`matrix`] builds elementary matrices, [`compose`] combines them, [`stage`] runs vertices.
//! - [`convention`] fixes the multiplication order for all of them.
//! - [`Node`] chains object matrices through a parent/child hierarchy.
//! - [`TransformPipeline`] runs the same steps on the GPU from `shaders/transform.wgsl`.

pub mod compose;
pub mod convention;
mod gpu;
pub mod matrix;
mod mesh;
mod node;
mod pipeline;
pub mod stage;
mod uniforms;

pub use compose::{object_matrix, object_rotation_matrix, vertex_transform_matrix};
pub use convention::{CONVENTION, Convention};
pub use gpu::{GpuContext, GpuError};
pub use matrix::{identity, rotation_x, rotation_y, rotation_z, scale_matrix, translation_matrix};
pub use mesh::{Mesh, MeshError, VertexPosition, cube_geometry, validate_indices};
pub use node::Node;
pub use pipeline::{
    BindGroupSlot, FIRST_USER_GROUP, ObjectBinding, PipelineConfig, PipelineError,
    TransformPipeline, check_slot_indices, check_slots, defines_function,
};
pub use stage::{StageConfig, VertexStage, transform_position, transform_vertex};
pub use uniforms::{
    CameraMatrix, CameraUniform, ObjectTransforms, ObjectTransformsUniform, VertexInput,
    VertexOutput,
};

// Re-export glam math types for convenience
pub use glam::{Mat4, Vec3, Vec4};
