//! The backdrop engine: mount, per-frame tick, resize, unmount.
//!
//! A [`Backdrop`] owns every field system, the transition controller, the
//! camera rig, the render backend and the frame scheduler. Nothing is shared
//! with other instances.
//!
//! ```ignore
//! let mut backdrop = Backdrop::mount(backend, scheduler, BackdropConfig::default(), 1280, 720)?;
//! let trigger = backdrop.trigger();
//!
//! // host event loop:
//! trigger.fire();          // pointer moved (throttled)
//! backdrop.tick();         // display refresh
//! backdrop.resize(w, h);   // container resized
//! backdrop.unmount();      // or just drop it
//! ```

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::backend::{CameraUniforms, FieldHandle, RenderBackend};
use crate::camera::CameraRig;
use crate::config::BackdropConfig;
use crate::error::{BackdropResult, GpuError};
use crate::field::FieldSystem;
use crate::scheduler::FrameScheduler;
use crate::time::FrameClock;
use crate::transition::TransitionController;
use crate::trigger::{self, PatternTrigger, TriggerListener};

/// Decorrelates the decorative fields from the pattern sequence so that the
/// pattern clouds depend on the seed alone.
const FIELD_SEED_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// What a call to [`Backdrop::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A frame was drawn and the next one scheduled.
    Rendered,
    /// The backend could not draw this frame; the next one is still scheduled.
    Skipped,
    /// The backdrop is unmounted; nothing happened.
    Unmounted,
}

/// A mounted, running backdrop.
pub struct Backdrop<B: RenderBackend, S: FrameScheduler> {
    backend: Option<B>,
    scheduler: S,
    config: BackdropConfig,
    stars: FieldSystem,
    nebula: Vec<FieldSystem>,
    particles: FieldSystem,
    stars_handle: Option<FieldHandle>,
    nebula_handles: Vec<FieldHandle>,
    particles_handle: Option<FieldHandle>,
    transition: TransitionController,
    rig: CameraRig,
    clock: FrameClock,
    trigger: PatternTrigger,
    listener: Option<TriggerListener>,
    width: u32,
    height: u32,
    mounted: bool,
}

impl<B: RenderBackend, S: FrameScheduler> Backdrop<B, S> {
    /// Build every field, seed pattern 0, upload to `backend` and schedule
    /// the first frame.
    ///
    /// If the config is invalid or any upload fails, everything created so
    /// far is released and the backend is released before the error is
    /// returned.
    #[tracing::instrument(skip_all, fields(particles = config.particle_count, stars = config.star_count))]
    pub fn mount(backend: B, scheduler: S, config: BackdropConfig, width: u32, height: u32) -> BackdropResult<Self> {
        Self::mount_with_clock(backend, scheduler, config, width, height, FrameClock::new())
    }

    /// Like [`mount`](Self::mount) with an explicit clock, e.g.
    /// [`FrameClock::fixed`] for deterministic playback.
    pub fn mount_with_clock(
        mut backend: B,
        scheduler: S,
        config: BackdropConfig,
        width: u32,
        height: u32,
        clock: FrameClock,
    ) -> BackdropResult<Self> {
        if let Err(e) = config.validate() {
            tracing::warn!(error = %e, "mount rejected, releasing backend");
            backend.release();
            return Err(e);
        }

        let seed = config.resolved_seed();
        let mut field_rng = StdRng::seed_from_u64(seed ^ FIELD_SEED_SALT);

        let stars = FieldSystem::starfield(config.star_count, config.star_radius, &mut field_rng);
        let nebula = config
            .nebula_layers
            .iter()
            .enumerate()
            .map(|(i, layer)| FieldSystem::nebula(i, layer, &mut field_rng))
            .collect();
        let mut particles = FieldSystem::particles(config.particle_count, &mut field_rng);

        let mut transition = TransitionController::new(config.transition_speed, config.target_size, seed);
        transition.seed(&mut particles);

        let (trigger, listener) = trigger::channel();
        let rig = CameraRig::new(config.camera, width, height);

        let mut backdrop = Self {
            backend: Some(backend),
            scheduler,
            config,
            stars,
            nebula,
            particles,
            stars_handle: None,
            nebula_handles: Vec::new(),
            particles_handle: None,
            transition,
            rig,
            clock,
            trigger,
            listener: Some(listener),
            width,
            height,
            mounted: true,
        };

        if let Err(e) = backdrop.upload_all() {
            tracing::warn!(error = %e, "mount failed, releasing partial resources");
            backdrop.unmount();
            return Err(e.into());
        }

        backdrop.scheduler.request_frame();
        tracing::info!(seed, width, height, "backdrop mounted");
        Ok(backdrop)
    }

    fn upload_all(&mut self) -> Result<(), GpuError> {
        let backend = self.backend.as_mut().ok_or(GpuError::Released)?;

        let handle = backend.create_field(&self.stars)?;
        self.stars_handle = Some(handle);
        backend.set_field_uniforms(handle, self.stars.uniforms())?;
        self.stars.take_dirty();

        for layer in &mut self.nebula {
            let handle = backend.create_field(layer)?;
            self.nebula_handles.push(handle);
            backend.set_field_uniforms(handle, layer.uniforms())?;
            layer.take_dirty();
        }

        let handle = backend.create_field(&self.particles)?;
        self.particles_handle = Some(handle);
        backend.set_field_uniforms(handle, self.particles.uniforms())?;
        self.particles.take_dirty();

        Ok(())
    }

    /// Sender for "advance to the next pattern". Clone freely.
    pub fn trigger(&self) -> PatternTrigger {
        self.trigger.clone()
    }

    /// Start a transition now. Returns `false` if one is already running or
    /// the backdrop is unmounted.
    pub fn request_next_pattern(&mut self) -> bool {
        self.mounted && self.transition.request_next_pattern(&self.particles)
    }

    fn handle_triggers(&mut self) {
        let fired = self.listener.as_ref().map_or(0, |l| l.drain());
        if fired > 0 && !self.transition.request_next_pattern(&self.particles) {
            tracing::trace!(fired, "trigger ignored, transition in progress");
        }
    }

    /// Run one frame: advance the transition, move the camera, update
    /// uniforms, draw, and schedule the next frame.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.mounted || self.backend.is_none() {
            return TickOutcome::Unmounted;
        }

        let (elapsed, _delta) = self.clock.update();

        self.handle_triggers();
        self.transition.advance(&mut self.particles);

        let progress = self.transition.progress();
        let camera = CameraUniforms::new(self.rig.view_proj(elapsed, progress), self.width, self.height);

        self.stars.update_uniform(elapsed);
        self.particles.update_uniform(elapsed);
        for layer in &mut self.nebula {
            layer.rotate_step();
        }

        let outcome = match self.sync_and_render(&camera) {
            Ok(()) => TickOutcome::Rendered,
            Err(GpuError::Surface(e)) => {
                tracing::debug!(error = %e, frame = self.clock.frame(), "frame skipped");
                TickOutcome::Skipped
            }
            Err(e) => {
                tracing::warn!(error = %e, frame = self.clock.frame(), "frame skipped");
                TickOutcome::Skipped
            }
        };

        self.scheduler.request_frame();
        outcome
    }

    fn sync_and_render(&mut self, camera: &CameraUniforms) -> Result<(), GpuError> {
        let backend = self.backend.as_mut().ok_or(GpuError::Released)?;

        if let Some(handle) = self.particles_handle {
            let (positions_dirty, colors_dirty) = self.particles.take_dirty();
            if positions_dirty {
                backend.write_positions(handle, self.particles.positions())?;
            }
            if colors_dirty {
                backend.write_colors(handle, self.particles.colors())?;
            }
            backend.set_field_uniforms(handle, self.particles.uniforms())?;
        }
        if let Some(handle) = self.stars_handle {
            backend.set_field_uniforms(handle, self.stars.uniforms())?;
        }
        for (layer, &handle) in self.nebula.iter().zip(&self.nebula_handles) {
            backend.set_field_uniforms(handle, layer.uniforms())?;
        }

        backend.render(camera)
    }

    /// Follow the container size. Zero-sized dimensions are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.width = width;
        self.height = height;
        self.rig.set_viewport(width, height);
        if let Some(backend) = self.backend.as_mut() {
            backend.resize(width, height);
        }
        tracing::debug!(width, height, "backdrop resized");
    }

    /// Stop the loop and free every resource. Safe to call more than once;
    /// also runs on drop.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        self.scheduler.cancel();
        self.listener = None;

        if let Some(mut backend) = self.backend.take() {
            if let Some(handle) = self.particles_handle.take() {
                backend.release_field(handle);
            }
            for handle in self.nebula_handles.drain(..) {
                backend.release_field(handle);
            }
            if let Some(handle) = self.stars_handle.take() {
                backend.release_field(handle);
            }
            backend.release();
        }
        tracing::info!(frames = self.clock.frame(), fps = self.clock.fps(), "backdrop unmounted");
    }

    #[inline]
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn config(&self) -> &BackdropConfig {
        &self.config
    }

    pub fn particles(&self) -> &FieldSystem {
        &self.particles
    }

    pub fn stars(&self) -> &FieldSystem {
        &self.stars
    }

    pub fn nebula(&self) -> &[FieldSystem] {
        &self.nebula
    }

    pub fn transition(&self) -> &TransitionController {
        &self.transition
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl<B: RenderBackend, S: FrameScheduler> Drop for Backdrop<B, S> {
    fn drop(&mut self) {
        self.unmount();
    }
}
