//! The vertex stage entry point, evaluated on the CPU.
//!
//! This is the reference for `shaders/transform.wgsl`: the same steps in the same order.
//!
//! 1. Promote the object-space position to `(x, y, z, 1)`.
//! 2. Apply the object-to-clip matrix.
//! 3. Keep `xyz`, drop the computed `w`, and repromote with `w = 1`.
//! 4. Negate `y` once (unless [`StageConfig::flip_y`] is off).
//!
//! Step 3 means the camera's projective `w` never reaches the rasterizer. Only what the camera
//! folds into `xyz` survives.

use glam::{Mat4, Vec3};
use rayon::prelude::*;

use crate::compose::{object_matrix, vertex_transform_matrix};
use crate::convention::CONVENTION;
use crate::uniforms::{CameraMatrix, ObjectTransforms, VertexInput, VertexOutput};

/// Options for the vertex stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StageConfig {
    /// Negate clip-space `y` after all matrix work. Defaults to `true`, matching backends whose
    /// clip-space vertical axis points the other way from the camera and asset data.
    pub flip_y: bool,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self { flip_y: true }
    }
}

impl StageConfig {
    /// Default settings: `y` is flipped.
    pub fn new() -> Self {
        Self::default()
    }

    /// Turns the final negation of clip-space `y` on or off.
    pub fn flip_y(mut self, flip_y: bool) -> Self {
        self.flip_y = flip_y;
        self
    }
}

/// Applies `matrix` to `position` and returns only the spatial components.
#[inline]
pub fn transform_position(matrix: Mat4, position: Vec3) -> Vec3 {
    CONVENTION.apply(matrix, position.extend(1.0)).truncate()
}

/// Runs one vertex invocation.
pub fn transform_vertex(
    input: VertexInput,
    object: &ObjectTransforms,
    camera: &CameraMatrix,
    config: StageConfig,
) -> VertexOutput {
    let matrix = vertex_transform_matrix(object_matrix(object), camera);
    emit(matrix, input, config)
}

fn emit(matrix: Mat4, input: VertexInput, config: StageConfig) -> VertexOutput {
    let mut position = transform_position(matrix, input.position).extend(1.0);
    if config.flip_y {
        position.y = -position.y;
    }
    VertexOutput { position }
}

/// A vertex stage bound to one draw's uniforms.
///
/// The object-to-clip matrix is composed once in [`new`](Self::new) and shared read-only by
/// every invocation.
///
/// # Example
///
/// ```
/// use vertform::{CameraMatrix, ObjectTransforms, StageConfig, Vec3, VertexInput, VertexStage};
///
/// let object = ObjectTransforms::new().at(Vec3::new(1.0, 2.0, 3.0));
/// let stage = VertexStage::new(&object, &CameraMatrix::IDENTITY, StageConfig::default());
///
/// let out = stage.run(VertexInput::new(0.0, 0.0, 0.0));
/// assert_eq!(out.position.to_array(), [1.0, -2.0, 3.0, 1.0]);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct VertexStage {
    matrix: Mat4,
    config: StageConfig,
}

impl VertexStage {
    /// Composes the object matrix for `object` with `camera`.
    pub fn new(object: &ObjectTransforms, camera: &CameraMatrix, config: StageConfig) -> Self {
        Self::from_object_matrix(object_matrix(object), camera, config)
    }

    /// Like [`new`](Self::new), for an object-to-world matrix composed elsewhere, such as
    /// [`Node::global_matrix`](crate::Node::global_matrix).
    pub fn from_object_matrix(
        object_to_world: Mat4,
        camera: &CameraMatrix,
        config: StageConfig,
    ) -> Self {
        Self {
            matrix: vertex_transform_matrix(object_to_world, camera),
            config,
        }
    }

    /// The composed object-to-clip matrix.
    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }

    /// The settings this stage was built with.
    pub fn config(&self) -> StageConfig {
        self.config
    }

    /// Runs a single invocation.
    pub fn run(&self, input: VertexInput) -> VertexOutput {
        emit(self.matrix, input, self.config)
    }

    /// Runs one invocation per input vertex in parallel.
    ///
    /// Outputs keep the order of `inputs`. Invocations share nothing but `self`.
    pub fn dispatch(&self, inputs: &[VertexInput]) -> Vec<VertexOutput> {
        log::debug!("Dispatching {} vertex invocations", inputs.len());

        inputs.par_iter().map(|input| self.run(*input)).collect()
    }
}
