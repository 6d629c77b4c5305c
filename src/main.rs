//! Vibetunnel - an audio-reactive particle tunnel.
//!
//! Thousands of particles stream toward the camera; bass drives speed and
//! light, mids twist the field, highs shift colour.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use glam::Vec2;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use vibetunnel::audio::AudioSampler;
use vibetunnel::camera::CameraRig;
use vibetunnel::cli::Args;
use vibetunnel::params::*;
use vibetunnel::rendering::{RenderError, RenderSystem, SceneUniforms};
use vibetunnel::scene::{cursor_to_ndc, RenderContext, Scene};
use vibetunnel::tunnel::{FrameInput, FrameOutcome, InstanceBuffer, TunnelAnimator};

/// Main application state
struct App {
    // Window and rendering
    window: Option<Arc<Window>>,
    render_system: Option<RenderSystem>,

    // Simulation systems
    animator: TunnelAnimator,
    instances: InstanceBuffer,
    camera: CameraRig,
    scene: Scene,
    ctx: RenderContext,
    sampler: AudioSampler,

    // Configuration
    render_config: RenderConfig,
    recording_config: Option<RecordingConfig>,
    simulate: bool,
    autostart: bool,
    device_query: Option<String>,

    // Input and time tracking
    cursor: Vec2,
    start_time: Instant,
    last_frame: Instant,
    frame_count: usize,
    shown_status: String,
}

impl App {
    fn new(args: &Args) -> anyhow::Result<Self> {
        let tunnel_params = args.tunnel_params();
        let scene_params = args.scene_params();

        let animator =
            TunnelAnimator::new(tunnel_params).context("invalid tunnel parameters")?;
        let instances = animator.instance_buffer();
        let sampler = AudioSampler::new(
            AnalyserConfig::default(),
            BandLayout::default(),
            SimulationParams::default(),
        )
        .context("invalid analyser parameters")?;

        let recording_config = args
            .create_recording_config()
            .context("failed to create recording directories")?;

        log::info!(
            "Variant {}: {} particles",
            args.variant.name(),
            animator.count()
        );

        let now = Instant::now();
        Ok(Self {
            window: None,
            render_system: None,
            animator,
            instances,
            camera: CameraRig::new(scene_params.camera.clone()),
            ctx: RenderContext::new(&scene_params),
            scene: Scene::new(scene_params),
            sampler,
            render_config: args.render_config(),
            recording_config,
            simulate: args.simulate,
            autostart: args.autostart,
            device_query: args.device.clone(),
            cursor: Vec2::ZERO,
            start_time: now,
            last_frame: now,
            frame_count: 0,
            shown_status: String::new(),
        })
    }

    /// One device request per user action
    fn start_audio(&mut self) {
        if self.simulate {
            self.sampler.start_simulated();
        } else {
            let record_path = self.recording_config.as_ref().map(|c| c.audio_path());
            self.sampler
                .start_default(self.device_query.as_deref(), record_path.as_deref());
        }
        self.refresh_title();
    }

    fn refresh_title(&mut self) {
        let Some(window) = &self.window else {
            return;
        };
        if self.shown_status != self.sampler.status() {
            self.shown_status = self.sampler.status().to_string();
            window.set_title(&format!(
                "{} | {}",
                self.render_config.title, self.shown_status
            ));
        }
    }

    /// Elapsed and delta time; fixed step while recording
    fn frame_clock(&mut self) -> (f32, f32) {
        if let Some(config) = &self.recording_config {
            let dt = config.frame_dt();
            return (self.frame_count as f32 * dt, dt);
        }
        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        (now.duration_since(self.start_time).as_secs_f32(), dt)
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        let window_attributes = Window::default_attributes()
            .with_title(self.render_config.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.render_config.window_width,
                self.render_config.window_height,
            ));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let render_system = match pollster::block_on(RenderSystem::new(
            Arc::clone(&window),
            &self.scene,
            self.animator.count(),
            self.recording_config.clone(),
        )) {
            Ok(render_system) => render_system,
            Err(e) => {
                log::error!("Failed to initialize renderer: {}", e);
                event_loop.exit();
                return;
            }
        };

        let (width, height) = render_system.size();
        self.render_config.window_width = width;
        self.render_config.window_height = height;

        log::info!("Vibetunnel is running: Space/Enter/click starts audio, Esc quits");

        self.window = Some(window);
        self.render_system = Some(render_system);
        self.start_time = Instant::now();
        self.last_frame = self.start_time;

        if self.autostart || self.simulate || self.recording_config.is_some() {
            self.start_audio();
        }
        self.refresh_title();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(code),
                        repeat: false,
                        ..
                    },
                ..
            } => match code {
                KeyCode::Escape => event_loop.exit(),
                KeyCode::Space | KeyCode::Enter | KeyCode::NumpadEnter => self.start_audio(),
                _ => {}
            },
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => self.start_audio(),
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = cursor_to_ndc(
                    (position.x, position.y),
                    (self.render_config.window_width, self.render_config.window_height),
                );
            }
            WindowEvent::Resized(size) => {
                if let Some(render_system) = &mut self.render_system {
                    render_system.resize(size.width, size.height);
                    let (width, height) = render_system.size();
                    self.render_config.window_width = width;
                    self.render_config.window_height = height;
                }
            }
            WindowEvent::RedrawRequested => {
                self.render_frame(event_loop);
            }
            _ => {}
        }
    }
}

impl App {
    /// Advance simulation and render a single frame
    fn render_frame(&mut self, event_loop: &ActiveEventLoop) {
        let (time_s, dt_s) = self.frame_clock();

        // Zeros until audio has been started
        let bands = self.sampler.bands();

        let input = FrameInput {
            elapsed_s: time_s,
            dt_s,
            cursor: self.cursor,
            bands,
        };
        let destination = if self.render_system.is_some() {
            Some(&mut self.instances)
        } else {
            None
        };
        let outcome = self.animator.update(&input, &mut self.ctx, destination);
        self.camera.update(time_s, &mut self.ctx, &bands);

        let Some(render_system) = &mut self.render_system else {
            return;
        };

        if let FrameOutcome::Updated { .. } = outcome {
            if let Err(e) = render_system.update_instances(&self.instances) {
                log::error!("{}", e);
            }
        }

        let (view_proj, _) = self.camera.view_proj(&self.ctx.camera, &self.render_config);
        render_system.update_uniforms(&SceneUniforms::new(
            view_proj,
            &self.ctx,
            &self.scene.params,
            time_s,
        ));

        match render_system.render(self.frame_count) {
            Ok(()) => {}
            Err(RenderError::Frame(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                let (width, height) = render_system.size();
                render_system.resize(width, height);
            }
            Err(RenderError::Frame(wgpu::SurfaceError::OutOfMemory)) => {
                log::error!("GPU out of memory, exiting");
                event_loop.exit();
            }
            Err(e) => log::warn!("Render error: {}", e),
        }

        self.frame_count += 1;
        self.refresh_title();

        if let Some(config) = &self.recording_config {
            if self.frame_count >= config.total_frames() {
                log::info!(
                    "Recording complete: {} frames in {}/",
                    self.frame_count,
                    config.output_dir
                );
                event_loop.exit();
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let build_env = BuildEnv::current();
    log::info!(
        "Build key {}",
        if build_env.has_api_key() {
            "present"
        } else {
            "absent"
        }
    );

    let mut app = App::new(&args)?;
    let event_loop = EventLoop::new().context("failed to create event loop")?;
    event_loop.run_app(&mut app)?;
    Ok(())
}
