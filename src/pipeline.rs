//! GPU render pipeline running the vertex stage in `shaders/transform.wgsl`.
//!
//! # Bindings
//!
//! - **Group 0, binding 0**: [`CameraUniform`], the host's view-projection matrix
//! - **Group 1, binding 0**: [`ObjectTransformsUniform`], position, rotation, and scale
//! - **Vertex location 0**: [`VertexPosition`], object-space position
//! - **Groups 2+**: free for the fragment shader via [`BindGroupSlot`]
//!
//! Both uniform groups are visible to the vertex stage only. The fragment shader is supplied by
//! the caller and must define `fn fs_main(`.
//!
//! # Example
//!
//! ```ignore
//! let mut pipeline = TransformPipeline::new(&gpu, include_str!("shaders/depth_tint.wgsl"),
//!     PipelineConfig::new())?;
//! let cube = Mesh::cube(&gpu)?;
//! let left = pipeline.create_object_binding(&gpu);
//! let right = pipeline.create_object_binding(&gpu);
//!
//! pipeline.write_camera(&gpu, &CameraMatrix::IDENTITY);
//! left.write(&gpu, &ObjectTransforms::new().at(Vec3::new(-0.5, 0.0, 0.0)).scaled(0.2));
//! right.write(&gpu, &ObjectTransforms::new().at(Vec3::new(0.5, 0.0, 0.0)).scaled(0.2));
//!
//! // Inside a render pass with `pipeline.depth_view()` attached:
//! pipeline.draw(&mut render_pass, &cube, &left, &[])?;
//! pipeline.draw(&mut render_pass, &cube, &right, &[])?;
//! ```
//!
//! Queued buffer writes all land before the submitted commands run, so each object drawn in a
//! submission needs its own [`ObjectBinding`].

use crate::gpu::GpuContext;
use crate::mesh::{Mesh, VertexPosition};
use crate::uniforms::{CameraMatrix, CameraUniform, ObjectTransforms, ObjectTransformsUniform};

const CAMERA_GROUP: u32 = 0;
const OBJECT_GROUP: u32 = 1;
/// First bind group index available to callers.
pub const FIRST_USER_GROUP: u32 = 2;

/// Name of the pipeline-overridable constant controlling the vertical flip.
const FLIP_Y_CONSTANT: &str = "FLIP_Y";

/// Errors reported while building or drawing with a [`TransformPipeline`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// A user bind group targets slot 0 or 1, which the pipeline owns.
    ReservedSlot(u32),
    /// The fragment source does not define an `fs_main` entry point.
    MissingFragmentEntry,
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::ReservedSlot(index) => write!(
                f,
                "Bind group slot {} is reserved; user slots start at {}",
                index, FIRST_USER_GROUP
            ),
            PipelineError::MissingFragmentEntry => {
                write!(f, "Fragment shader must define an `fs_main` entry point")
            }
        }
    }
}

impl std::error::Error for PipelineError {}

/// Settings for [`TransformPipeline::new`].
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Negate clip-space `y` in the shader. Mirrors [`StageConfig::flip_y`](crate::StageConfig).
    pub flip_y: bool,
    /// Color target format. `None` uses the surface format.
    pub color_format: Option<wgpu::TextureFormat>,
    /// Depth attachment format. Defaults to `Depth32Float`.
    pub depth_format: wgpu::TextureFormat,
    /// Debug label for the render pipeline.
    pub label: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            flip_y: true,
            color_format: None,
            depth_format: wgpu::TextureFormat::Depth32Float,
            label: "Transform Pipeline".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Default settings: flipped `y`, surface color format, 32-bit float depth.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the `FLIP_Y` override constant.
    pub fn flip_y(mut self, flip_y: bool) -> Self {
        self.flip_y = flip_y;
        self
    }

    /// Renders into `format` instead of the surface format.
    pub fn color_format(mut self, format: wgpu::TextureFormat) -> Self {
        self.color_format = Some(format);
        self
    }

    pub fn depth_format(mut self, format: wgpu::TextureFormat) -> Self {
        self.depth_format = format;
        self
    }

    /// Sets the pipeline's debug label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    fn flip_y_constant(&self) -> f64 {
        if self.flip_y { 1.0 } else { 0.0 }
    }
}

/// An extra bind group for the fragment shader.
pub struct BindGroupSlot<'a> {
    pub index: u32,
    pub bind_group: &'a wgpu::BindGroup,
}

/// Checks that no slot collides with the camera or object groups.
pub fn check_slots(slots: &[BindGroupSlot]) -> Result<(), PipelineError> {
    check_slot_indices(slots.iter().map(|slot| slot.index))
}

/// Rejects the first index below [`FIRST_USER_GROUP`].
pub fn check_slot_indices(indices: impl IntoIterator<Item = u32>) -> Result<(), PipelineError> {
    match indices.into_iter().find(|&index| index < FIRST_USER_GROUP) {
        Some(index) => Err(PipelineError::ReservedSlot(index)),
        None => Ok(()),
    }
}

/// Whether `source` declares `fn <name>(` outside a line comment.
///
/// A light textual scan: block comments and string-like tricks are not understood, and shader
/// compilation remains the real check.
pub fn defines_function(source: &str, name: &str) -> bool {
    source
        .lines()
        .map(|line| line.split("//").next().unwrap_or_default())
        .any(|code| {
            code.match_indices("fn").any(|(at, _)| {
                let starts_word = code[..at]
                    .chars()
                    .next_back()
                    .is_none_or(|c| !(c.is_alphanumeric() || c == '_'));
                let rest = &code[at + 2..];
                starts_word
                    && rest.starts_with(char::is_whitespace)
                    && rest
                        .trim_start()
                        .strip_prefix(name)
                        .is_some_and(|after| after.trim_start().starts_with('('))
            })
        })
}

/// Per-object uniform buffer and bind group for group 1.
///
/// Create one per object with [`TransformPipeline::create_object_binding`].
pub struct ObjectBinding {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl ObjectBinding {
    /// Uploads `transforms` for this object's next draw.
    pub fn write(&self, gpu: &GpuContext, transforms: &ObjectTransforms) {
        gpu.queue.write_buffer(
            &self.buffer,
            0,
            bytemuck::bytes_of(&ObjectTransformsUniform::from(transforms)),
        );
    }

    /// The bind group set at group 1 when this object is drawn.
    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

/// Renders [`Mesh`]es through the object-to-clip vertex stage.
///
/// Owns the camera uniform and its bind group, the object bind group layout, and a depth buffer
/// sized to the surface. Object uniforms live in [`ObjectBinding`]s, one per drawn object.
pub struct TransformPipeline {
    pipeline: wgpu::RenderPipeline,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    object_layout: wgpu::BindGroupLayout,
    depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,
    depth_size: (u32, u32),
    depth_format: wgpu::TextureFormat,
}

impl TransformPipeline {
    /// Creates the pipeline with the built-in vertex stage and the given fragment shader.
    pub fn new(
        gpu: &GpuContext,
        fragment_source: &str,
        config: PipelineConfig,
    ) -> Result<Self, PipelineError> {
        Self::with_layouts(gpu, fragment_source, config, &[])
    }

    /// Like [`new`](Self::new), with `extra_layouts` appended after the camera and object
    /// groups at slot 2 onward.
    pub fn with_layouts(
        gpu: &GpuContext,
        fragment_source: &str,
        config: PipelineConfig,
        extra_layouts: &[&wgpu::BindGroupLayout],
    ) -> Result<Self, PipelineError> {
        if !defines_function(fragment_source, "fs_main") {
            return Err(PipelineError::MissingFragmentEntry);
        }

        let device = &gpu.device;

        let vertex_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Transform Vertex Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/transform.wgsl").into()),
        });
        let fragment_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Transform Fragment Shader"),
            source: wgpu::ShaderSource::Wgsl(fragment_source.into()),
        });

        // Camera uniform buffer (group 0)
        let camera_buffer = Self::create_uniform_buffer(
            device,
            "Camera Uniform",
            std::mem::size_of::<CameraUniform>() as u64,
        );
        let camera_bind_group_layout =
            Self::create_uniform_layout(device, "Camera Bind Group Layout");
        let camera_bind_group = Self::create_uniform_bind_group(
            device,
            "Camera Bind Group",
            &camera_bind_group_layout,
            &camera_buffer,
        );

        // Object uniforms (group 1) are allocated per object
        let object_layout =
            Self::create_uniform_layout(device, "Object Transforms Bind Group Layout");

        let mut bind_group_layouts = vec![&camera_bind_group_layout, &object_layout];
        bind_group_layouts.extend_from_slice(extra_layouts);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Transform Pipeline Layout"),
            bind_group_layouts: &bind_group_layouts,
            push_constant_ranges: &[],
        });

        let constants = [(FLIP_Y_CONSTANT, config.flip_y_constant())];
        let color_format = config.color_format.unwrap_or(gpu.config.format);

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(config.label.as_str()),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex_shader,
                entry_point: Some("vs_main"),
                buffers: &[VertexPosition::LAYOUT],
                compilation_options: wgpu::PipelineCompilationOptions {
                    constants: &constants,
                    ..Default::default()
                },
            },
            fragment: Some(wgpu::FragmentState {
                module: &fragment_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                // The vertical flip reverses screen-space winding, so cull nothing.
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: config.depth_format,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let (depth_texture, depth_view) = Self::create_depth_texture(gpu, config.depth_format);

        log::debug!(
            "Created '{}' (flip_y = {}, color = {:?}, depth = {:?})",
            config.label,
            config.flip_y,
            color_format,
            config.depth_format
        );

        Ok(Self {
            pipeline,
            camera_buffer,
            camera_bind_group,
            object_layout,
            depth_texture,
            depth_view,
            depth_size: (gpu.width(), gpu.height()),
            depth_format: config.depth_format,
        })
    }

    fn create_uniform_buffer(device: &wgpu::Device, label: &str, size: u64) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Camera and object layouts are identical in all but name.
    fn create_uniform_layout(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(label),
            entries: &[wgpu::BindGroupLayoutEntry {
                // Must match the bindings in shaders/transform.wgsl.
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        })
    }

    fn create_uniform_bind_group(
        device: &wgpu::Device,
        label: &str,
        layout: &wgpu::BindGroupLayout,
        buffer: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        })
    }

    fn create_depth_texture(
        gpu: &GpuContext,
        format: wgpu::TextureFormat,
    ) -> (wgpu::Texture, wgpu::TextureView) {
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Transform Depth Texture"),
            size: wgpu::Extent3d {
                width: gpu.width(),
                height: gpu.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        (texture, view)
    }

    /// Recreates the depth buffer if the surface size changed.
    pub fn ensure_depth_size(&mut self, gpu: &GpuContext) {
        if self.depth_size != (gpu.width(), gpu.height()) {
            let (texture, view) = Self::create_depth_texture(gpu, self.depth_format);
            self.depth_texture = texture;
            self.depth_view = view;
            self.depth_size = (gpu.width(), gpu.height());
        }
    }

    /// The depth attachment to use with [`draw`](Self::draw).
    pub fn depth_view(&self) -> &wgpu::TextureView {
        &self.depth_view
    }

    /// The depth texture behind [`depth_view`](Self::depth_view).
    pub fn depth_texture(&self) -> &wgpu::Texture {
        &self.depth_texture
    }

    /// Uploads the camera matrix for the coming draws.
    pub fn write_camera(&self, gpu: &GpuContext, camera: &CameraMatrix) {
        gpu.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::bytes_of(&CameraUniform::from(camera)),
        );
    }

    /// Allocates a zeroed object uniform bound against this pipeline's group 1 layout.
    pub fn create_object_binding(&self, gpu: &GpuContext) -> ObjectBinding {
        let buffer = Self::create_uniform_buffer(
            &gpu.device,
            "Object Transforms Uniform",
            std::mem::size_of::<ObjectTransformsUniform>() as u64,
        );
        let bind_group = Self::create_uniform_bind_group(
            &gpu.device,
            "Object Transforms Bind Group",
            &self.object_layout,
            &buffer,
        );
        ObjectBinding { buffer, bind_group }
    }

    /// Records an indexed draw of `mesh` placed by `object`.
    pub fn draw(
        &self,
        render_pass: &mut wgpu::RenderPass,
        mesh: &Mesh,
        object: &ObjectBinding,
        slots: &[BindGroupSlot],
    ) -> Result<(), PipelineError> {
        check_slots(slots)?;

        log::debug!("Rendering {} triangles...", mesh.triangle_count());

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(CAMERA_GROUP, &self.camera_bind_group, &[]);
        render_pass.set_bind_group(OBJECT_GROUP, object.bind_group(), &[]);
        for slot in slots {
            render_pass.set_bind_group(slot.index, slot.bind_group, &[]);
        }
        render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..mesh.index_count, 0, 0..1);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_flips() {
        let config = PipelineConfig::default();
        assert!(config.flip_y);
        assert_eq!(config.flip_y_constant(), 1.0);
        assert_eq!(config.depth_format, wgpu::TextureFormat::Depth32Float);
        assert_eq!(config.color_format, None);
    }

    #[test]
    fn flip_override_follows_config() {
        let config = PipelineConfig::new()
            .flip_y(false)
            .color_format(wgpu::TextureFormat::Rgba8Unorm)
            .label("Offscreen");
        assert_eq!(config.flip_y_constant(), 0.0);
        assert_eq!(config.color_format, Some(wgpu::TextureFormat::Rgba8Unorm));
        assert_eq!(config.label, "Offscreen");
    }

    #[test]
    fn empty_slots_are_fine() {
        assert_eq!(check_slots(&[]), Ok(()));
    }

    #[test]
    fn camera_and_object_slots_are_rejected() {
        assert_eq!(check_slot_indices([0]), Err(PipelineError::ReservedSlot(0)));
        assert_eq!(check_slot_indices([3, 1, 0]), Err(PipelineError::ReservedSlot(1)));
        assert_eq!(check_slot_indices([FIRST_USER_GROUP]), Ok(()));
        assert_eq!(check_slot_indices([2, 3, 7]), Ok(()));
    }

    #[test]
    fn fragment_entry_needs_a_declaration() {
        assert!(defines_function(include_str!("shaders/depth_tint.wgsl"), "fs_main"));
        assert!(defines_function("@fragment\nfn  fs_main (p: vec4<f32>)", "fs_main"));

        assert!(!defines_function("fs_main", "fs_main"));
        assert!(!defines_function("// fn fs_main() {}", "fs_main"));
        assert!(!defines_function("fn fs_main_old() {}", "fs_main"));
        assert!(!defines_function("fn my_fs_main() {}", "fs_main"));
        assert!(!defines_function("let x = myfn fs_main();", "fs_main"));
    }

    #[test]
    fn error_names_the_slot() {
        assert_eq!(
            PipelineError::ReservedSlot(1).to_string(),
            "Bind group slot 1 is reserved; user slots start at 2"
        );
    }

    #[test]
    fn shader_exposes_expected_interface() {
        let source = include_str!("shaders/transform.wgsl");
        assert!(source.contains("@group(0) @binding(0) var<uniform> camera"));
        assert!(source.contains("@group(1) @binding(0) var<uniform> transforms"));
        assert!(source.contains("override FLIP_Y"));
        assert!(source.contains("fn vs_main(@location(0) position: vec3<f32>)"));
    }
}
