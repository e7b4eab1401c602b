//! Position-only meshes for the transform pipeline.
//!
//! - [`VertexPosition`] is the single vertex attribute the vertex stage consumes
//! - [`Mesh`] is GPU-resident geometry with vertex and index buffers
//!
//! # Vertex Layout
//!
//! | Attribute | Format    | Offset | Shader Location |
//! |-----------|-----------|--------|-----------------|
//! | position  | Float32x3 | 0      | 0               |
//!
//! This layout is exposed via [`VertexPosition::LAYOUT`] for custom pipeline creation.

use crate::gpu::GpuContext;
use crate::uniforms::VertexInput;

/// Errors that can occur when building a mesh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeshError {
    /// The index count is not a multiple of three.
    IncompleteTriangle(usize),
    /// An index points past the end of the vertex list.
    IndexOutOfRange { index: u32, vertex_count: usize },
}

impl std::fmt::Display for MeshError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeshError::IncompleteTriangle(count) => {
                write!(f, "Index count {} is not a multiple of 3", count)
            }
            MeshError::IndexOutOfRange {
                index,
                vertex_count,
            } => write!(
                f,
                "Index {} is out of range for {} vertices",
                index, vertex_count
            ),
        }
    }
}

impl std::error::Error for MeshError {}

/// An object-space vertex position as uploaded to the vertex buffer.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct VertexPosition {
    pub position: [f32; 3],
}

impl VertexPosition {
    /// The wgpu vertex buffer layout for this vertex type: 12-byte stride, per-vertex step,
    /// position at location 0.
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<VertexPosition>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[wgpu::VertexAttribute {
            offset: 0,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x3,
        }],
    };

    /// A vertex at object-space `(x, y, z)`.
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: [x, y, z],
        }
    }
}

impl From<VertexPosition> for VertexInput {
    fn from(vertex: VertexPosition) -> Self {
        VertexInput::from(glam::Vec3::from_array(vertex.position))
    }
}

/// Checks that `indices` describe whole triangles over `vertex_count` vertices.
pub fn validate_indices(vertex_count: usize, indices: &[u32]) -> Result<(), MeshError> {
    if indices.len() % 3 != 0 {
        return Err(MeshError::IncompleteTriangle(indices.len()));
    }
    if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(MeshError::IndexOutOfRange {
            index,
            vertex_count,
        });
    }
    Ok(())
}

/// Corners and triangles of a cube spanning -1 to 1 on every axis.
///
/// Corners are shared between faces since only positions are stored. Triangles wind
/// counter-clockwise when seen from outside.
pub fn cube_geometry() -> (Vec<VertexPosition>, Vec<u32>) {
    #[rustfmt::skip]
    let vertices = vec![
        VertexPosition::new(-1.0, -1.0, -1.0), // 0: left, lower, back
        VertexPosition::new(-1.0, -1.0,  1.0), // 1: left, lower, front
        VertexPosition::new(-1.0,  1.0, -1.0), // 2: left, upper, back
        VertexPosition::new(-1.0,  1.0,  1.0), // 3: left, upper, front
        VertexPosition::new( 1.0, -1.0, -1.0), // 4: right, lower, back
        VertexPosition::new( 1.0, -1.0,  1.0), // 5: right, lower, front
        VertexPosition::new( 1.0,  1.0, -1.0), // 6: right, upper, back
        VertexPosition::new( 1.0,  1.0,  1.0), // 7: right, upper, front
    ];

    #[rustfmt::skip]
    let indices: Vec<u32> = vec![
        0, 1, 3, 3, 2, 0, // left
        4, 6, 7, 7, 5, 4, // right
        0, 4, 5, 5, 1, 0, // lower
        2, 3, 7, 7, 6, 2, // upper
        0, 2, 6, 6, 4, 0, // back
        1, 5, 7, 7, 3, 1, // front
    ];

    (vertices, indices)
}

/// GPU-resident position geometry.
pub struct Mesh {
    pub(crate) vertex_buffer: wgpu::Buffer,
    pub(crate) index_buffer: wgpu::Buffer,
    pub(crate) index_count: u32,
}

impl Mesh {
    /// Uploads vertex and index data to GPU buffers.
    pub fn new(
        gpu: &GpuContext,
        vertices: &[VertexPosition],
        indices: &[u32],
    ) -> Result<Self, MeshError> {
        use wgpu::util::DeviceExt;

        validate_indices(vertices.len(), indices)?;

        let vertex_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Vertex Buffer"),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let index_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Index Buffer"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        Ok(Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        })
    }

    /// Uploads [`cube_geometry`].
    pub fn cube(gpu: &GpuContext) -> Result<Self, MeshError> {
        let (vertices, indices) = cube_geometry();
        Self::new(gpu, &vertices, &indices)
    }

    /// Number of indices passed to `draw_indexed`.
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Number of whole triangles in the index buffer.
    pub fn triangle_count(&self) -> u32 {
        self.index_count / 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn layout_is_three_floats() {
        assert_eq!(std::mem::size_of::<VertexPosition>(), 12);
        assert_eq!(VertexPosition::LAYOUT.array_stride, 12);
        assert_eq!(VertexPosition::LAYOUT.attributes[0].shader_location, 0);
    }

    #[test]
    fn cube_is_well_formed() {
        let (vertices, indices) = cube_geometry();
        assert_eq!(vertices.len(), 8);
        assert_eq!(indices.len(), 36);
        assert_eq!(validate_indices(vertices.len(), &indices), Ok(()));
    }

    #[test]
    fn cube_triangles_face_outward() {
        let (vertices, indices) = cube_geometry();
        for tri in indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]]
                .map(|i| Vec3::from_array(vertices[i as usize].position));
            let normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(normal.dot(centroid) > 0.0, "triangle {:?} faces inward", tri);
        }
    }

    #[test]
    fn rejects_partial_triangles() {
        assert_eq!(
            validate_indices(3, &[0, 1]),
            Err(MeshError::IncompleteTriangle(2))
        );
    }

    #[test]
    fn rejects_out_of_range_indices() {
        assert_eq!(
            validate_indices(3, &[0, 1, 3]),
            Err(MeshError::IndexOutOfRange {
                index: 3,
                vertex_count: 3
            })
        );
    }

    #[test]
    fn vertex_position_converts_to_input() {
        let input = VertexInput::from(VertexPosition::new(1.0, 2.0, 3.0));
        assert_eq!(input.position, Vec3::new(1.0, 2.0, 3.0));
    }
}
