//! Frame scheduling.
//!
//! The engine never loops on its own. After each tick it asks a
//! [`FrameScheduler`] to run the next tick before the following display
//! refresh, and on teardown it cancels. On desktop that maps to winit's
//! `request_redraw`; tests and headless drivers use [`ManualScheduler`].

use std::sync::Arc;

use winit::window::Window;

/// "Run `tick` once before the next display refresh."
pub trait FrameScheduler {
    /// Ask for one more frame. Has no effect after [`cancel`](Self::cancel).
    fn request_frame(&mut self);

    /// Drop any pending request and refuse further ones.
    fn cancel(&mut self);

    /// Whether a frame has been requested and not yet consumed.
    fn is_pending(&self) -> bool;
}

/// Scheduler driven by hand: call [`take`](Self::take) to consume a request.
#[derive(Debug, Default, Clone)]
pub struct ManualScheduler {
    pending: bool,
    cancelled: bool,
    requests: u64,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the pending request. Returns whether there was one.
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Total accepted requests.
    pub fn requests(&self) -> u64 {
        self.requests
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) {
        if !self.cancelled {
            self.pending = true;
            self.requests += 1;
        }
    }

    fn cancel(&mut self) {
        self.pending = false;
        self.cancelled = true;
    }

    fn is_pending(&self) -> bool {
        self.pending
    }
}

/// Requests redraws from a winit window.
#[derive(Debug)]
pub struct WindowScheduler {
    window: Arc<Window>,
    pending: bool,
    cancelled: bool,
}

impl WindowScheduler {
    pub fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            pending: false,
            cancelled: false,
        }
    }

    /// Called when `RedrawRequested` arrives.
    pub fn consume(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }
}

impl FrameScheduler for WindowScheduler {
    fn request_frame(&mut self) {
        if !self.cancelled {
            self.pending = true;
            self.window.request_redraw();
        }
    }

    fn cancel(&mut self) {
        self.pending = false;
        self.cancelled = true;
    }

    fn is_pending(&self) -> bool {
        self.pending
    }
}
