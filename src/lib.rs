//! # Cosmic Backdrop
//!
//! A procedural point-cloud backdrop: a few thousand glowing particles morph
//! between mathematical patterns while a starfield twinkles and nebula shells
//! drift around them.
//!
//! ## Quick Start
//!
//! ```ignore
//! use cosmic_backdrop::prelude::*;
//!
//! fn main() -> BackdropResult<()> {
//!     let config = BackdropConfig::new()
//!         .with_particle_count(15_000)
//!         .with_seed(7);
//!     cosmic_backdrop::run(config, HostOptions::default())
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Patterns
//!
//! A [`Pattern`] is a pure generator: given a particle count, a target size
//! and an RNG it returns exactly `count` points, normalized so the largest
//! side of their bounding box equals the target size. Four ship with the
//! crate, visited in a fixed cycle:
//!
//! - [`Pattern::TorusKnot`]
//! - [`Pattern::EllipticalOrbits`]
//! - [`Pattern::WaveOrbit`]
//! - [`Pattern::CosmicWeb`]
//!
//! ### Transitions
//!
//! The [`TransitionController`] snapshots the current and next cloud and
//! blends them over a fixed number of frames with a sine ease. A request that
//! arrives mid-transition is dropped.
//!
//! ### Fields
//!
//! Everything drawn is a [`FieldSystem`]: the starfield, each nebula shell,
//! and the pattern particles. Fields are plain CPU data; a [`RenderBackend`]
//! owns their GPU counterparts.
//!
//! ### Driving a backdrop
//!
//! [`Backdrop`] ties it together. The host calls [`Backdrop::tick`] when a
//! [`FrameScheduler`] says a frame is due, fires a [`PatternTrigger`] on
//! input, and drops (or [`unmount`](Backdrop::unmount)s) the backdrop to free
//! everything.
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events. Install a subscriber in the host (the
//! bundled binary uses `tracing-subscriber` with `RUST_LOG`).

pub mod backend;
pub mod camera;
pub mod config;
pub mod engine;
pub mod error;
pub mod field;
mod gpu;
pub mod normalize;
pub mod pattern;
pub mod scheduler;
pub mod shaders;
pub mod time;
pub mod transition;
pub mod trigger;
mod window;

pub use backend::{CameraUniforms, FieldHandle, RenderBackend};
pub use camera::{Camera, CameraRig};
pub use config::{BackdropConfig, BloomConfig, CameraConfig, NebulaLayer};
pub use engine::{Backdrop, TickOutcome};
pub use error::{BackdropError, BackdropResult, GpuError};
pub use field::{BlendMode, FieldKind, FieldSystem, FieldUniforms};
pub use glam::Vec3;
pub use gpu::WgpuBackend;
pub use normalize::{normalize, Bounds};
pub use pattern::{Palette, Pattern, PointCloud};
pub use scheduler::{FrameScheduler, ManualScheduler, WindowScheduler};
pub use time::FrameClock;
pub use transition::{ease_in_out_sine, TransitionController};
pub use trigger::{PatternTrigger, Throttle};
pub use window::{run, App, HostOptions};

/// Convenient imports for hosts and custom backends.
pub mod prelude {
    pub use crate::backend::{CameraUniforms, FieldHandle, RenderBackend};
    pub use crate::config::{BackdropConfig, BloomConfig, CameraConfig, NebulaLayer};
    pub use crate::engine::{Backdrop, TickOutcome};
    pub use crate::error::{BackdropError, BackdropResult, GpuError};
    pub use crate::field::{FieldKind, FieldSystem, FieldUniforms};
    pub use crate::pattern::{Pattern, PointCloud};
    pub use crate::scheduler::{FrameScheduler, ManualScheduler};
    pub use crate::time::FrameClock;
    pub use crate::trigger::PatternTrigger;
    pub use crate::window::{run, HostOptions};
    pub use crate::Vec3;
}
