//! Backdrop configuration.
//!
//! Defaults give the stock look. Every value can be overridden with
//! the `with_*` builder methods or loaded from JSON; missing JSON keys fall
//! back to the defaults.
//!
//! ```ignore
//! let config = BackdropConfig::new()
//!     .with_particle_count(4_000)
//!     .with_seed(7);
//! ```

use std::path::Path;

use glam::Vec3;
use serde::Deserialize;

use crate::error::{BackdropError, BackdropResult};

/// One decorative nebula shell.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct NebulaLayer {
    pub count: usize,
    pub max_size: f32,
    pub min_size: f32,
    pub radius: f32,
    pub opacity: f32,
    /// Rotation applied every frame, radians about each axis.
    #[serde(default)]
    pub rotation_rate: [f32; 3],
}

impl NebulaLayer {
    /// A non-rotating shell. Sizes are drawn from `[min_size, max_size)`.
    pub const fn new(count: usize, max_size: f32, min_size: f32, radius: f32, opacity: f32) -> Self {
        Self {
            count,
            max_size,
            min_size,
            radius,
            opacity,
            rotation_rate: [0.0; 3],
        }
    }

    /// Set the per-frame rotation in radians about x, y and z.
    pub const fn with_rotation_rate(mut self, x: f32, y: f32, z: f32) -> Self {
        self.rotation_rate = [x, y, z];
        self
    }

    pub fn rotation_rate(&self) -> Vec3 {
        Vec3::from_array(self.rotation_rate)
    }

    /// The three default shells, outermost first.
    pub fn defaults() -> Vec<NebulaLayer> {
        vec![
            NebulaLayer::new(200, 15.0, 8.0, 700.0, 0.15).with_rotation_rate(0.000_05, 0.000_1, 0.0),
            NebulaLayer::new(300, 8.0, 5.0, 600.0, 0.3).with_rotation_rate(0.000_1, 0.000_15, 0.0),
            NebulaLayer::new(400, 5.0, 3.0, 500.0, 0.5).with_rotation_rate(0.000_15, 0.000_2, 0.0),
        ]
    }
}

/// Orbiting camera parameters.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Orbit radius while idle.
    pub base_radius: f32,
    /// How far the orbit pulls in at the midpoint of a transition.
    pub shrink: f32,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            base_radius: 120.0,
            shrink: 30.0,
            fov_degrees: 60.0,
            near: 1.0,
            far: 3000.0,
        }
    }
}

/// Bloom post-processing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct BloomConfig {
    /// Luminance below which pixels do not glow.
    pub threshold: f32,
    pub strength: f32,
    /// Blur tap spacing in half-resolution texels.
    pub radius: f32,
}

impl Default for BloomConfig {
    fn default() -> Self {
        Self {
            threshold: 0.2,
            strength: 1.2,
            radius: 1.0,
        }
    }
}

/// Everything needed to mount a backdrop.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BackdropConfig {
    pub particle_count: usize,
    pub star_count: usize,
    pub star_radius: f32,
    /// Progress added per frame during a transition.
    pub transition_speed: f32,
    /// Largest bounding-box side of every pattern.
    pub target_size: f32,
    pub nebula_layers: Vec<NebulaLayer>,
    pub camera: CameraConfig,
    pub bloom: BloomConfig,
    /// RNG seed. `None` seeds from the clock.
    pub seed: Option<u64>,
}

impl Default for BackdropConfig {
    fn default() -> Self {
        Self {
            particle_count: 15_000,
            star_count: 7_000,
            star_radius: 800.0,
            transition_speed: 0.015,
            target_size: 70.0,
            nebula_layers: NebulaLayer::defaults(),
            camera: CameraConfig::default(),
            bloom: BloomConfig::default(),
            seed: None,
        }
    }
}

impl BackdropConfig {
    /// Same as [`Default`]: the stock look with a clock-derived seed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON config file. Keys not present keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> BackdropResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Parse JSON text and validate it. Missing keys keep their defaults.
    pub fn from_json_str(text: &str) -> BackdropResult<Self> {
        let config: BackdropConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the number of morphing pattern particles.
    pub fn with_particle_count(mut self, count: usize) -> Self {
        self.particle_count = count;
        self
    }

    /// Set the number of background stars.
    pub fn with_star_count(mut self, count: usize) -> Self {
        self.star_count = count;
        self
    }

    /// Set the progress added per frame while transitioning (0.015 gives 67 frames).
    pub fn with_transition_speed(mut self, speed: f32) -> Self {
        self.transition_speed = speed;
        self
    }

    /// Set the largest bounding-box side every pattern is scaled to.
    pub fn with_target_size(mut self, size: f32) -> Self {
        self.target_size = size;
        self
    }

    /// Replace the nebula shells. An empty list draws no nebula.
    pub fn with_nebula_layers(mut self, layers: Vec<NebulaLayer>) -> Self {
        self.nebula_layers = layers;
        self
    }

    /// Set the orbit and projection parameters.
    pub fn with_camera(mut self, camera: CameraConfig) -> Self {
        self.camera = camera;
        self
    }

    /// Set the bloom post-processing parameters.
    pub fn with_bloom(mut self, bloom: BloomConfig) -> Self {
        self.bloom = bloom;
        self
    }

    /// Fix the RNG seed so the pattern sequence is reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Seed to use for this run, falling back to the clock.
    pub fn resolved_seed(&self) -> u64 {
        self.seed.unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(42)
        })
    }

    /// Check every value the engine relies on. Called by `mount`.
    pub fn validate(&self) -> BackdropResult<()> {
        if self.particle_count == 0 {
            return Err(BackdropError::config("particle_count must be at least 1"));
        }
        if !(self.transition_speed.is_finite() && self.transition_speed > 0.0) {
            return Err(BackdropError::config(format!(
                "transition_speed must be positive, got {}",
                self.transition_speed
            )));
        }
        if !(self.target_size.is_finite() && self.target_size > 0.0) {
            return Err(BackdropError::config(format!(
                "target_size must be positive, got {}",
                self.target_size
            )));
        }
        if !(self.star_radius.is_finite() && self.star_radius > 0.0) {
            return Err(BackdropError::config("star_radius must be positive"));
        }
        let cam = &self.camera;
        if !(cam.near > 0.0 && cam.far > cam.near) {
            return Err(BackdropError::config(format!(
                "camera planes must satisfy 0 < near < far, got near={} far={}",
                cam.near, cam.far
            )));
        }
        // The orbit pulls in to base_radius - shrink; it must stay outside the near plane.
        if !(cam.base_radius.is_finite() && cam.shrink.is_finite() && cam.shrink >= 0.0)
            || cam.base_radius - cam.shrink <= cam.near
        {
            return Err(BackdropError::config(format!(
                "camera orbit must satisfy 0 <= shrink and base_radius - shrink > near, got base_radius={} shrink={} near={}",
                cam.base_radius, cam.shrink, cam.near
            )));
        }
        if !(cam.fov_degrees > 0.0 && cam.fov_degrees < 180.0) {
            return Err(BackdropError::config("camera fov_degrees must be in (0, 180)"));
        }
        for (i, layer) in self.nebula_layers.iter().enumerate() {
            if layer.min_size > layer.max_size {
                return Err(BackdropError::config(format!(
                    "nebula layer {i}: min_size exceeds max_size"
                )));
            }
        }
        Ok(())
    }
}
