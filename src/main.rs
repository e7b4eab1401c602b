//! Spinning cube demo: the host animates object transforms, the vertex stage does the rest.
//!
//! A smaller cube rides along in the big cube's local space through a [`Node`] hierarchy.

use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use vertform::{
    CameraMatrix, GpuContext, Mat4, Mesh, Node, ObjectBinding, ObjectTransforms, PipelineConfig,
    TransformPipeline, Vec3, transform_position,
};

const WINDOW_SIZE: f64 = 512.0;
/// Satellite offset in the big cube's object space.
const SATELLITE_OFFSET: Vec3 = Vec3::new(3.0, 0.0, 0.0);

/// Window and camera settings for the demo.
struct AppConfig {
    title: String,
    size: f64,
    /// Half-extent of the orthographic view volume.
    view_extent: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Cube".to_string(),
            size: WINDOW_SIZE,
            view_extent: 1.0,
        }
    }
}

/// Frames per second over a rolling one-second window.
struct FpsCounter {
    window_start: Instant,
    frames: u32,
    last: u32,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            window_start: Instant::now(),
            frames: 0,
            last: 0,
        }
    }

    fn tick(&mut self) -> u32 {
        self.frames += 1;
        if self.window_start.elapsed().as_secs_f32() >= 1.0 {
            self.last = self.frames;
            self.frames = 0;
            self.window_start = Instant::now();
        }
        self.last
    }
}

struct Renderer {
    gpu: GpuContext,
    pipeline: TransformPipeline,
    cube: Mesh,
    cube_binding: ObjectBinding,
    satellite_binding: ObjectBinding,
}

struct App {
    config: AppConfig,
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    camera: CameraMatrix,
    cube: Rc<Node>,
    satellite: Node,
    tick_count: f32,
    mouse_position: Vec3,
    mouse_is_down: bool,
    fps: FpsCounter,
}

impl App {
    fn new(config: AppConfig) -> Self {
        let e = config.view_extent;
        // Orthographic: the vertex stage drops w, so the camera must not rely on perspective
        // division.
        let camera = CameraMatrix::from_mat4(Mat4::orthographic_rh(-e, e, -e, e, -e, e));

        let cube = Rc::new(Node::new(ObjectTransforms::new().scaled(0.05)));
        let satellite = Node::child_of(&cube, ObjectTransforms::new().at(SATELLITE_OFFSET));

        Self {
            config,
            window: None,
            renderer: None,
            camera,
            cube,
            satellite,
            tick_count: 0.0,
            mouse_position: Vec3::ZERO,
            mouse_is_down: false,
            fps: FpsCounter::new(),
        }
    }

    fn init_renderer(window: Arc<Window>) -> Result<Renderer, Box<dyn std::error::Error>> {
        let gpu = GpuContext::new(window)?;
        let pipeline = TransformPipeline::new(
            &gpu,
            include_str!("shaders/depth_tint.wgsl"),
            PipelineConfig::new().label("Cube Pipeline"),
        )?;
        let cube = Mesh::cube(&gpu)?;
        let cube_binding = pipeline.create_object_binding(&gpu);
        let satellite_binding = pipeline.create_object_binding(&gpu);

        Ok(Renderer {
            gpu,
            pipeline,
            cube,
            cube_binding,
            satellite_binding,
        })
    }

    /// Orbit around the cursor, tumble, and pulse unless the mouse is held.
    fn update_cube(&mut self) {
        let t = self.tick_count;
        let orbit_angle = t / 10.0;
        let mut cube = self.cube.transforms();

        cube.position = Vec3::new(
            self.mouse_position.x + orbit_angle.cos() / 10.0,
            self.mouse_position.y + orbit_angle.sin() / 10.0,
            0.0,
        );
        cube.rotation.x += t / 10_000.0;
        cube.rotation.y += t / 10_000.0;
        cube.scale = if self.mouse_is_down {
            0.1
        } else {
            0.05 + ((t / 10.0).sin() + 1.0) / 50.0
        };

        self.cube.set_transforms(cube);
        self.satellite.invalidate_global_cache();
    }

    /// World-space transforms for the satellite: placed through the hierarchy, spun on its own.
    fn satellite_transforms(&self) -> ObjectTransforms {
        let cube = self.cube.transforms();
        ObjectTransforms::new()
            .at(transform_position(self.satellite.global_matrix(), Vec3::ZERO))
            .rotated(-cube.rotation)
            .scaled(cube.scale * 0.4)
    }

    fn render(&mut self) {
        let satellite = self.satellite_transforms();
        let Some(renderer) = &mut self.renderer else {
            return;
        };

        let output = match renderer.gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let (w, h) = (renderer.gpu.width(), renderer.gpu.height());
                renderer.gpu.resize(w, h);
                return;
            }
            Err(e) => {
                log::warn!("Failed to get surface texture: {}", e);
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        renderer.pipeline.ensure_depth_size(&renderer.gpu);
        renderer.pipeline.write_camera(&renderer.gpu, &self.camera);
        renderer.cube_binding.write(&renderer.gpu, &self.cube.transforms());
        renderer.satellite_binding.write(&renderer.gpu, &satellite);

        let mut encoder =
            renderer
                .gpu
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Cube Encoder"),
                });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Cube Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.1,
                            g: 0.1,
                            b: 0.15,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: renderer.pipeline.depth_view(),
                    depth_ops: Some(wgpu::Operations {
                        // In clip space, 1.0 is the maximum depth.
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            for binding in [&renderer.cube_binding, &renderer.satellite_binding] {
                let drawn = renderer.pipeline.draw(&mut render_pass, &renderer.cube, binding, &[]);
                if let Err(e) = drawn {
                    log::warn!("Skipping cube draw: {}", e);
                }
            }
        }

        renderer.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attributes = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(LogicalSize::new(self.config.size, self.config.size))
            .with_resizable(false);
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        match Self::init_renderer(window.clone()) {
            Ok(renderer) => self.renderer = Some(renderer),
            Err(e) => {
                log::error!("Failed to initialise renderer: {}", e);
                event_loop.exit();
                return;
            }
        }
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.gpu.resize(size.width, size.height);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let Some(window) = &self.window {
                    let size = window.inner_size();
                    // Window y grows downward; the vertex stage's flip makes that screen-down.
                    self.mouse_position.x =
                        ((position.x / size.width.max(1) as f64) * 2.0 - 1.0) as f32;
                    self.mouse_position.y =
                        ((position.y / size.height.max(1) as f64) * 2.0 - 1.0) as f32;
                }
            }
            WindowEvent::MouseInput { button, state, .. } => {
                if button == MouseButton::Left {
                    self.mouse_is_down = match state {
                        ElementState::Pressed => {
                            log::info!("FPS: {}", self.fps.last);
                            true
                        }
                        ElementState::Released => false,
                    };
                }
            }
            WindowEvent::RedrawRequested => {
                self.update_cube();
                self.render();

                self.tick_count += 1.0;
                self.fps.tick();

                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => (),
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            log::error!("Failed to create event loop: {}", e);
            return;
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(AppConfig::default());
    if let Err(e) = event_loop.run_app(&mut app) {
        log::error!("Event loop exited with error: {}", e);
    }
}
