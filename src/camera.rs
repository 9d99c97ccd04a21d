//! Orbit camera and the time-driven rig that moves it.

use std::f32::consts::PI;

use glam::{Mat4, Vec3};

use crate::config::CameraConfig;

/// Orbit camera looking at a target point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Horizontal rotation angle in radians.
    pub yaw: f32,
    /// Vertical rotation angle in radians.
    pub pitch: f32,
    /// Distance from the target point.
    pub distance: f32,
    /// Point the camera orbits around.
    pub target: Vec3,
}

impl Camera {
    /// Camera on the +Z axis at `distance`, looking at the origin.
    pub fn new(distance: f32) -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            distance,
            target: Vec3::ZERO,
        }
    }

    /// Calculate the camera's world position.
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    /// Calculate the view matrix for rendering.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }
}

/// Moves the camera along a slow orbit that tightens during transitions.
///
/// The rig keeps no state of its own beyond configuration: the camera is a
/// pure function of elapsed time and transition progress.
#[derive(Debug, Clone, Copy)]
pub struct CameraRig {
    config: CameraConfig,
    aspect: f32,
}

impl CameraRig {
    pub fn new(config: CameraConfig, width: u32, height: u32) -> Self {
        let mut rig = Self { config, aspect: 1.0 };
        rig.set_viewport(width, height);
        rig
    }

    /// Recompute the aspect ratio. Zero-sized viewports are ignored.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    #[inline]
    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Orbit radius: pulls in by `shrink` at the midpoint of a transition.
    pub fn radius(&self, progress: f32) -> f32 {
        self.config.base_radius - self.config.shrink * (progress.clamp(0.0, 1.0) * PI).sin()
    }

    /// Camera pose at `elapsed` seconds with the given transition progress.
    pub fn camera(&self, elapsed: f32, progress: f32) -> Camera {
        Camera {
            yaw: 0.6 * (elapsed * 0.07).sin(),
            pitch: 0.25 * (elapsed * 0.05).sin(),
            ..Camera::new(self.radius(progress))
        }
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.config.fov_degrees.to_radians(),
            self.aspect,
            self.config.near,
            self.config.far,
        )
    }

    pub fn view_proj(&self, elapsed: f32, progress: f32) -> Mat4 {
        self.projection() * self.camera(elapsed, progress).view_matrix()
    }
}
