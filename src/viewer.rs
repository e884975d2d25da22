//! Interactive window: winit event loop driving a [`TreeScene`].
//!
//! Drag orbits, scroll zooms, a double tap or double click toggles the
//! morph, and the pointer lights up and pushes nearby particles. Escape quits.

use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::KeyCode,
    window::{Window, WindowId},
};

use crate::animation::{GestureOutcome, MorphTarget};
use crate::camera::OrbitCamera;
use crate::config::SceneConfig;
use crate::decor::{generate_decor, DecorBuffers};
use crate::error::{ConfigError, ViewerError};
use crate::gpu::GpuState;
use crate::input::Input;
use crate::palette::parse_hex;
use crate::scene::TreeScene;
use crate::time::Time;
use crate::uniforms::GpuUniforms;

/// Radians of orbit per pixel dragged.
const DRAG_SENSITIVITY: f32 = 0.005;
/// World units of zoom per scroll line.
const ZOOM_SENSITIVITY: f32 = 1.0;

/// Build the scene described by `config` and show it until the window closes.
pub fn run(config: SceneConfig) -> Result<(), ViewerError> {
    let mut rng = match config.viewer.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    };

    let scene = TreeScene::from_config(&config, &mut rng)?;
    let decor = generate_decor(&config.decor, &mut rng)?;
    tracing::info!(
        target: "viewer",
        particles = scene.buffers().len(),
        decor = decor.len(),
        seed = ?config.viewer.seed,
        "scene generated"
    );

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config, scene, decor);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

struct App {
    config: SceneConfig,
    scene: TreeScene,
    decor: DecorBuffers,
    window: Option<Arc<Window>>,
    gpu_state: Option<GpuState>,
    camera: OrbitCamera,
    input: Input,
    time: Time,
    /// Startup failure to report once the loop has exited.
    error: Option<ViewerError>,
}

impl App {
    fn new(config: SceneConfig, scene: TreeScene, decor: DecorBuffers) -> Self {
        let input = Input::new(config.viewer.ui_regions.clone());
        Self {
            config,
            scene,
            decor,
            window: None,
            gpu_state: None,
            camera: OrbitCamera::new(),
            input,
            time: Time::new(),
            error: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), ViewerError> {
        let viewer = &self.config.viewer;
        let window_attrs = Window::default_attributes()
            .with_title(viewer.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(viewer.width, viewer.height));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        self.window = Some(window.clone());

        let background = parse_hex(&viewer.background)
            .map_err(|e| ConfigError::invalid(format!("viewer.background: {e}")))?;

        let gpu_state = pollster::block_on(GpuState::new(
            window.clone(),
            self.scene.buffers(),
            &self.decor,
            background,
        ))?;

        let size = window.inner_size();
        self.input.set_window_size(size.width, size.height);

        self.camera = OrbitCamera::framed_for_aspect(gpu_state.aspect());
        self.camera.limits = viewer.orbit;
        // Re-clamp against the configured limits.
        self.camera.zoom(0.0);

        self.gpu_state = Some(gpu_state);
        self.time = Time::new();
        Ok(())
    }

    /// Apply this frame's input, advance the scene and draw it.
    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        let Some(gpu_state) = &mut self.gpu_state else {
            return;
        };

        let (elapsed, delta) = self.time.update();

        for down in self.input.take_pointer_downs() {
            if let GestureOutcome::Toggled(target) =
                self.scene.on_gesture(down.timestamp, down.over_ui)
            {
                tracing::info!(target: "viewer", morph = ?target, "morph toggled");
            }
        }

        let drag = self.input.drag_delta();
        if drag != glam::Vec2::ZERO {
            self.camera
                .orbit(-drag.x * DRAG_SENSITIVITY, drag.y * DRAG_SENSITIVITY);
        }
        let scroll = self.input.scroll_delta();
        if scroll != 0.0 {
            self.camera.zoom(scroll * ZOOM_SENSITIVITY);
        }
        if self.scene.morph_target() == MorphTarget::Compact {
            self.camera
                .auto_rotate(delta, self.config.viewer.auto_rotate_speed);
        }

        let camera = self.camera.transform(gpu_state.aspect());
        let frame = self.scene.tick(elapsed, self.input.pointer_ndc(), &camera);
        let uniforms = GpuUniforms::new(
            &frame,
            &camera,
            &self.config.shading,
            self.scene.interaction_config().repel_strength,
            gpu_state.viewport(),
        );

        match gpu_state.render(&uniforms) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => gpu_state.reconfigure(),
            Err(wgpu::SurfaceError::OutOfMemory) => {
                tracing::error!(target: "gpu", "out of GPU memory");
                event_loop.exit();
            }
            Err(e) => tracing::warn!(target: "gpu", error = %e, "frame skipped"),
        }

        self.input.end_frame();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(err) = self.init(event_loop) {
                tracing::error!(target: "viewer", error = %err, "viewer failed to start");
                self.error = Some(err);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        self.input.handle_event(&event, self.time.timestamp());

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                self.input
                    .set_window_size(physical_size.width, physical_size.height);
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.resize(physical_size);
                }
            }
            WindowEvent::KeyboardInput { .. } => {
                if self.input.key_pressed(KeyCode::Escape) {
                    event_loop.exit();
                }
            }
            WindowEvent::RedrawRequested => {
                self.frame(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}
