//! Desktop host: a winit window driving a [`Backdrop`] on the wgpu backend.

use std::sync::Arc;
use std::time::{Duration, Instant};

use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowId},
};

use crate::config::BackdropConfig;
use crate::engine::{Backdrop, TickOutcome};
use crate::error::{BackdropError, BackdropResult};
use crate::gpu::WgpuBackend;
use crate::scheduler::WindowScheduler;
use crate::trigger::{PatternTrigger, Throttle};

/// Host-side knobs that are not part of the backdrop itself.
#[derive(Debug, Clone)]
pub struct HostOptions {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Minimum gap between pointer-driven triggers.
    pub trigger_interval: Duration,
    /// Fire a trigger on this period even without pointer input.
    pub auto_advance: Option<Duration>,
}

impl Default for HostOptions {
    fn default() -> Self {
        Self {
            title: "Cosmic Backdrop".to_string(),
            width: 1280,
            height: 720,
            trigger_interval: Duration::from_millis(150),
            auto_advance: None,
        }
    }
}

type WindowBackdrop = Backdrop<WgpuBackend, WindowScheduler>;

pub struct App {
    config: BackdropConfig,
    options: HostOptions,
    window: Option<Arc<Window>>,
    backdrop: Option<WindowBackdrop>,
    trigger: Option<PatternTrigger>,
    throttle: Throttle,
    last_auto: Instant,
    error: Option<BackdropError>,
}

impl App {
    pub fn new(config: BackdropConfig, options: HostOptions) -> Self {
        let throttle = Throttle::new(options.trigger_interval);
        Self {
            config,
            options,
            window: None,
            backdrop: None,
            trigger: None,
            throttle,
            last_auto: Instant::now(),
            error: None,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> BackdropResult<()> {
        let window_attrs = Window::default_attributes()
            .with_title(self.options.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(self.options.width, self.options.height));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let size = window.inner_size();

        let backend = pollster::block_on(WgpuBackend::new(window.clone(), self.config.bloom))?;
        let scheduler = WindowScheduler::new(window.clone());
        let backdrop = Backdrop::mount(backend, scheduler, self.config.clone(), size.width, size.height)?;

        self.trigger = Some(backdrop.trigger());
        self.backdrop = Some(backdrop);
        self.window = Some(window);
        self.last_auto = Instant::now();
        Ok(())
    }

    fn fire(&mut self) {
        if let Some(trigger) = &self.trigger {
            trigger.fire();
        }
    }

    fn auto_advance(&mut self) {
        let Some(period) = self.options.auto_advance else {
            return;
        };
        let now = Instant::now();
        if now.duration_since(self.last_auto) >= period {
            self.last_auto = now;
            self.fire();
        }
    }

    fn shutdown(&mut self) {
        self.trigger = None;
        if let Some(mut backdrop) = self.backdrop.take() {
            backdrop.unmount();
        }
    }

    /// The first fatal error seen while the loop ran, if any.
    pub fn take_error(&mut self) -> Option<BackdropError> {
        self.error.take()
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.start(event_loop) {
            tracing::error!(error = %e, "failed to start backdrop");
            self.error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                self.shutdown();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(backdrop) = &mut self.backdrop {
                    backdrop.resize(size.width, size.height);
                }
            }
            WindowEvent::CursorMoved { .. } => {
                if self.throttle.ready(Instant::now()) {
                    self.fire();
                }
            }
            WindowEvent::RedrawRequested => {
                self.auto_advance();
                if let Some(backdrop) = &mut self.backdrop {
                    if backdrop.scheduler_mut().consume() && backdrop.tick() == TickOutcome::Skipped {
                        tracing::trace!("redraw produced no frame");
                    }
                }
            }
            _ => {}
        }
    }
}

/// Open a window and run the backdrop until it is closed.
pub fn run(config: BackdropConfig, options: HostOptions) -> BackdropResult<()> {
    config.validate()?;

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config, options);
    event_loop.run_app(&mut app)?;

    app.shutdown();
    match app.take_error() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
