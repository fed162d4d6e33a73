mod config;
mod state;

use anyhow::Result;
use clap::Parser;
use config::{AppConfig, Overrides};
use firstlight_camera::CameraPreset;
use firstlight_render::{CubeScene, GpuContext, GpuError};
use state::AppState;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{
    DeviceEvent, DeviceId, ElementState, KeyEvent, MouseScrollDelta, WindowEvent,
};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::{CursorGrabMode, Window, WindowId};

/// Pixel scroll distance treated as one wheel notch.
const PIXELS_PER_LINE: f64 = 20.0;

#[derive(Parser)]
#[command(
    name = "firstlight-desktop",
    about = "Free-fly camera over ten textured cubes"
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Camera preset: full, movement, fly, fps, no-features
    #[arg(long)]
    preset: Option<CameraPreset>,

    /// Target frames per second
    #[arg(long)]
    frame_rate: Option<u32>,

    /// Directory holding shaders/ and textures/
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Route the mouse wheel to camera zoom
    #[arg(long)]
    scroll_zoom: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            preset: self.preset,
            frame_rate: self.frame_rate,
            assets: self.assets.clone(),
            scroll_zoom: self.scroll_zoom,
        }
    }
}

/// Startup stage that failed; each maps to its own exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InitFailure {
    Window,
    Adapter,
    Device,
    Surface,
}

impl InitFailure {
    fn exit_code(self) -> i32 {
        match self {
            InitFailure::Window => 1,
            InitFailure::Adapter => 2,
            InitFailure::Device => 3,
            InitFailure::Surface => 4,
        }
    }

    fn from_gpu(err: &GpuError) -> Self {
        match err {
            GpuError::NoAdapter => InitFailure::Adapter,
            GpuError::Device(_) => InitFailure::Device,
            GpuError::Surface(_) | GpuError::NoSurfaceFormat => InitFailure::Surface,
        }
    }
}

struct GpuApp {
    config: AppConfig,
    state: AppState,
    window: Option<Arc<Window>>,
    gpu: Option<GpuContext>,
    scene: Option<CubeScene>,
    failure: Option<InitFailure>,
}

impl GpuApp {
    fn new(config: AppConfig) -> Self {
        let state = AppState::new(&config, Instant::now());
        Self {
            config,
            state,
            window: None,
            gpu: None,
            scene: None,
            failure: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, failure: InitFailure) {
        self.failure = Some(failure);
        event_loop.exit();
    }

    /// Grab and hide the pointer. Returns whether the grab took.
    fn capture_cursor(window: &Window) -> bool {
        let grabbed = window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
        window.set_cursor_visible(false);
        match grabbed {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!("cursor grab unavailable, falling back to cursor positions: {err}");
                false
            }
        }
    }

    fn request_redraw(&self) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn redraw(&mut self) {
        let (Some(gpu), Some(scene)) = (&mut self.gpu, &mut self.scene) else {
            return;
        };

        let Some(frame) = self.state.tick(Instant::now(), gpu.aspect()) else {
            return;
        };

        let output = match gpu.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.reconfigure();
                return;
            }
            Err(err) => {
                tracing::error!("surface error: {err}");
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        scene.render(&gpu.device, &gpu.queue, &view, &frame);
        output.present();
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(PhysicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                tracing::error!("failed to create window: {err}");
                self.fail(event_loop, InitFailure::Window);
                return;
            }
        };

        let size = window.inner_size();
        let gpu = match GpuContext::new(window.clone(), size.width, size.height) {
            Ok(gpu) => gpu,
            Err(err) => {
                tracing::error!("{err}");
                self.fail(event_loop, InitFailure::from_gpu(&err));
                return;
            }
        };

        self.state.mouse_captured = Self::capture_cursor(&window);

        let scene = CubeScene::new(
            &gpu.device,
            &gpu.queue,
            gpu.format(),
            gpu.size(),
            &self.config.assets,
        );
        if !scene.program().is_linked() {
            tracing::warn!("cube program unusable, frames will only be cleared");
        }

        self.window = Some(window);
        self.gpu = Some(gpu);
        self.scene = Some(scene);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let (Some(gpu), Some(scene)) = (&mut self.gpu, &mut self.scene) {
                    gpu.resize(new_size.width, new_size.height);
                    let (width, height) = gpu.size();
                    scene.resize(&gpu.device, width, height);
                }
            }
            WindowEvent::Focused(false) => {
                self.state.focus_lost();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        ..
                    },
                ..
            } => {
                self.state
                    .handle_key(key, key_state == ElementState::Pressed);
                if self.state.close_requested() {
                    event_loop.exit();
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.state.handle_cursor(position.x, position.y);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let dy = match delta {
                    MouseScrollDelta::LineDelta(_, y) => f64::from(y),
                    MouseScrollDelta::PixelDelta(offset) => offset.y / PIXELS_PER_LINE,
                };
                self.state.handle_scroll(dy);
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
                self.request_redraw();
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.state.handle_mouse_motion(delta.0, delta.1);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        self.request_redraw();
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(scene) = self.scene.take() {
            scene.release();
        }
        tracing::info!("firstlight-desktop shutting down");
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    config.apply(&cli.overrides());
    config.validate()?;

    tracing::info!(
        preset = %config.camera.preset,
        frame_rate = config.frame_rate,
        assets = %config.assets.display(),
        "firstlight-desktop starting"
    );

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(config);
    event_loop.run_app(&mut app)?;

    if let Some(failure) = app.failure {
        std::process::exit(failure.exit_code());
    }
    Ok(())
}
