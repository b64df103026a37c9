// SPDX-License-Identifier: MIT OR Apache-2.0
//! Viewer application setup and event loop.

use crate::file_watcher::{SceneEvent, SceneWatcher};
use crate::scene_file::{SceneFile, SceneFileError};
use crate::settings::{SettingsError, ViewerSettings};
use egui_wgpu::wgpu;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use triggerflow_graph::{LayoutDirection, MemoryScene, Visualizer};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

/// How often the watcher and reference fingerprint are checked while idle
const TICK_INTERVAL: Duration = Duration::from_millis(50);

/// Viewer application errors
#[derive(Debug, Error)]
pub enum ViewerError {
    /// Window creation failed
    #[error("Failed to create window: {0}")]
    WindowCreation(#[from] winit::error::OsError),

    /// Surface creation failed
    #[error("Failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    /// No GPU adapter can present to the window
    #[error("Failed to find suitable GPU adapter")]
    NoAdapter,

    /// Device request failed
    #[error("Failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    /// Event loop error
    #[error("Event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    /// Scene watcher could not be started
    #[error("File watcher error: {0}")]
    Watcher(#[from] notify::Error),

    /// Scene could not be loaded
    #[error(transparent)]
    Scene(#[from] SceneFileError),

    /// Settings could not be loaded or written
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

/// Result type for viewer operations
pub type Result<T> = std::result::Result<T, ViewerError>;

/// Graphics state for wgpu rendering
struct GraphicsState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    egui_renderer: egui_wgpu::Renderer,
}

impl GraphicsState {
    fn new(window: Arc<Window>) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::LowPower,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or(ViewerError::NoAdapter)?;

        tracing::info!("Using GPU: {}", adapter.get_info().name);

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Triggerflow Viewer Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                ..Default::default()
            },
            None,
        ))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(wgpu::TextureFormat::is_srgb)
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or(ViewerError::NoAdapter)?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            egui_renderer,
        })
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    fn render(
        &mut self,
        egui_ctx: &egui::Context,
        full_output: egui::FullOutput,
        window: &Window,
    ) -> std::result::Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Viewer Encoder"),
        });

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: window.scale_factor() as f32,
        };

        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer.update_texture(&self.device, &self.queue, *id, image_delta);
        }

        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Viewer Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color {
                                r: 0.1,
                                g: 0.1,
                                b: 0.1,
                                a: 1.0,
                            }),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                })
                .forget_lifetime();

            self.egui_renderer.render(&mut render_pass, &paint_jobs, &screen_descriptor);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        Ok(())
    }
}

/// Window-bound state, created on first resume
struct ViewerRunning {
    window: Arc<Window>,
    graphics: GraphicsState,
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
}

/// Scene, watcher and graph controller
struct ViewerState {
    visualizer: Visualizer<MemoryScene>,
    scene_path: Option<PathBuf>,
    watcher: Option<SceneWatcher>,
}

impl ViewerState {
    fn new(settings: &ViewerSettings, scene_path: Option<PathBuf>) -> Result<Self> {
        let scene = match &scene_path {
            Some(path) => SceneFile::load(path)?,
            None => {
                tracing::info!("No scene given, showing the demo scene");
                SceneFile::demo()?
            }
        };
        let watcher = match &scene_path {
            Some(path) => Some(SceneWatcher::new(path, settings.watch_debounce())?),
            None => None,
        };

        let mut visualizer = Visualizer::new(scene, settings.style.clone());
        visualizer.set_on_node_activated(|node| {
            if let Some(object) = node.primary_object() {
                tracing::info!("Selected {} (object {})", node.display_label(), object.raw());
            }
        });

        Ok(Self {
            visualizer,
            scene_path,
            watcher,
        })
    }

    fn title(&self) -> String {
        match &self.scene_path {
            Some(path) => format!("Triggerflow Viewer - {}", path.display()),
            None => "Triggerflow Viewer - demo".to_string(),
        }
    }

    /// Apply file changes and reference edits.
    ///
    /// Returns whether the graph needs to be drawn again.
    fn tick(&mut self) -> bool {
        if let Some(watcher) = &self.watcher {
            match watcher.poll() {
                Some(SceneEvent::Changed) => match SceneFile::load(watcher.path()) {
                    Ok(scene) => {
                        self.visualizer.replace_source(scene);
                        self.visualizer.on_source_changed();
                    }
                    Err(e) => tracing::warn!("Keeping previous scene: {e}"),
                },
                Some(SceneEvent::Removed) => {
                    tracing::warn!("Scene file {} was removed", watcher.path().display());
                }
                Some(SceneEvent::Error(e)) => tracing::warn!("Scene watcher error: {e}"),
                None => {}
            }
        }
        self.visualizer.on_tick();
        self.visualizer.take_redraw_request()
    }

    fn update(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let mut direction = self.visualizer.style().direction;
                ui.label("Direction:");
                ui.selectable_value(&mut direction, LayoutDirection::LeftToRight, "Left to right");
                ui.selectable_value(&mut direction, LayoutDirection::TopToBottom, "Top to bottom");
                if direction != self.visualizer.style().direction {
                    let mut style = self.visualizer.style().clone();
                    style.direction = direction;
                    self.visualizer.set_style(style);
                }
                ui.separator();
                if ui.button("Rebuild").clicked() {
                    self.visualizer.on_source_changed();
                }
            });
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            self.visualizer.status_bar(ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.visualizer.ui(ui);
        });
    }
}

/// Main viewer application
pub struct ViewerApp {
    settings: ViewerSettings,
    state: ViewerState,
    running: Option<ViewerRunning>,
    failure: Option<ViewerError>,
}

impl ViewerApp {
    /// Load the scene and run the viewer until its window closes
    pub fn run(settings: ViewerSettings, scene_path: Option<PathBuf>) -> Result<()> {
        let state = ViewerState::new(&settings, scene_path)?;

        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::WaitUntil(Instant::now() + TICK_INTERVAL));

        let mut app = Self {
            settings,
            state,
            running: None,
            failure: None,
        };
        event_loop.run_app(&mut app)?;

        match app.failure.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<ViewerRunning> {
        tracing::info!("Creating viewer window...");

        let [width, height] = self.settings.window_size;
        let window_attrs = Window::default_attributes()
            .with_title(self.state.title())
            .with_inner_size(winit::dpi::LogicalSize::new(width, height))
            .with_min_inner_size(winit::dpi::LogicalSize::new(480, 320));
        let window = Arc::new(event_loop.create_window(window_attrs)?);

        let graphics = GraphicsState::new(window.clone())?;
        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            &window,
            Some(window.scale_factor() as f32),
            None,
            Some(2 * 1024),
        );

        tracing::info!("Viewer initialized, window size: {:?}", window.inner_size());

        Ok(ViewerRunning {
            window,
            graphics,
            egui_ctx,
            egui_state,
        })
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }
        match self.start(event_loop) {
            Ok(running) => self.running = Some(running),
            Err(e) => {
                self.failure = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(running) = &mut self.running else {
            return;
        };

        let response = running.egui_state.on_window_event(&running.window, &event);
        if response.repaint {
            running.window.request_redraw();
        }
        if response.consumed {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                tracing::info!("Close requested, exiting...");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                tracing::debug!("Window resized to {:?}", new_size);
                running.graphics.resize(new_size);
                running.window.request_redraw();
            }
            WindowEvent::RedrawRequested => {
                let raw_input = running.egui_state.take_egui_input(&running.window);
                let full_output = running.egui_ctx.run(raw_input, |ctx| self.state.update(ctx));

                running
                    .egui_state
                    .handle_platform_output(&running.window, full_output.platform_output.clone());
                let repaint_now = full_output
                    .viewport_output
                    .get(&egui::ViewportId::ROOT)
                    .is_some_and(|viewport| viewport.repaint_delay.is_zero());

                match running.graphics.render(&running.egui_ctx, full_output, &running.window) {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = running.window.inner_size();
                        running.graphics.resize(size);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        tracing::error!("Out of GPU memory!");
                        event_loop.exit();
                    }
                    Err(wgpu::SurfaceError::Timeout) => {
                        tracing::warn!("Surface timeout");
                    }
                }

                if repaint_now {
                    running.window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let redraw = self.state.tick();
        if let Some(running) = &self.running {
            if redraw {
                running.window.request_redraw();
            }
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(Instant::now() + TICK_INTERVAL));
    }
}
