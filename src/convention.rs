//! The matrix multiplication convention shared by every builder and composer.
//!
//! All matrices in this crate are built in one canonical orientation and then routed through
//! [`CONVENTION`]. Composers never spell out a multiplication order themselves; they ask the
//! convention for "apply `a`, then `b`" via [`Convention::then`]. Switching the constant switches
//! every CPU builder and composer. The GPU side always runs column-vector math, so the camera
//! upload goes through [`Convention::to_column_vector`] first.
//!
//! # Storage layout
//!
//! Under either convention the uploaded 16-float array carries the translation in floats
//! `12..15`. Read as rows (row-vector convention, or the WGSL `mat4x4` constructor text) that is
//! the last row; read as columns (glam, WGSL `matrix * vector`) it is the last column.

use glam::{Mat4, Vec4};

/// The convention used across the crate.
///
/// Column vectors match glam's native API and WGSL's `matrix * vector`, so the CPU reference
/// and the shader in `shaders/transform.wgsl` share the same stored bytes.
pub const CONVENTION: Convention = Convention::ColumnVector;

/// How vectors and matrices multiply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Convention {
    /// Vectors are columns, multiplied on the right: `M * v`.
    ///
    /// Transforms compose right-to-left, so "scale then rotate then translate" is `T * R * S`.
    ColumnVector,
    /// Vectors are rows, multiplied on the left: `v * M` (pre-multiplication).
    ///
    /// Transforms compose left-to-right, so "scale then rotate then translate" is `S * R * T`.
    RowVector,
}

impl Convention {
    /// Maps a canonical column-vector matrix into this convention.
    #[inline]
    pub fn orient(self, m: Mat4) -> Mat4 {
        match self {
            Convention::ColumnVector => m,
            Convention::RowVector => m.transpose(),
        }
    }

    /// Maps a matrix in this convention back to the canonical column-vector form.
    #[inline]
    pub fn to_column_vector(self, m: Mat4) -> Mat4 {
        match self {
            Convention::ColumnVector => m,
            Convention::RowVector => m.transpose(),
        }
    }

    /// Returns the matrix that applies `first` and then `second`.
    #[inline]
    pub fn then(self, first: Mat4, second: Mat4) -> Mat4 {
        match self {
            Convention::ColumnVector => second * first,
            Convention::RowVector => first * second,
        }
    }

    /// Applies `m` to the homogeneous point `v`.
    #[inline]
    pub fn apply(self, m: Mat4, v: Vec4) -> Vec4 {
        match self {
            Convention::ColumnVector => m * v,
            // v * M == Mᵀ * v
            Convention::RowVector => m.transpose() * v,
        }
    }
}
