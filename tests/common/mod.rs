//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use cosmic_backdrop::{CameraUniforms, FieldHandle, FieldKind, FieldSystem, FieldUniforms, GpuError, RenderBackend};

/// Everything a [`RecordingBackend`] saw.
#[derive(Debug, Default)]
pub struct Log {
    pub created: Vec<(FieldHandle, FieldKind, usize)>,
    pub released_fields: Vec<FieldHandle>,
    pub release_calls: usize,
    pub renders: usize,
    pub position_writes: usize,
    pub color_writes: usize,
    pub uniform_writes: usize,
    pub resizes: Vec<(u32, u32)>,
    pub last_positions: Vec<f32>,
    pub last_camera: Option<CameraUniforms>,
}

impl Log {
    /// Handles created but never released.
    pub fn live_fields(&self) -> Vec<FieldHandle> {
        self.created
            .iter()
            .map(|(h, _, _)| *h)
            .filter(|h| !self.released_fields.contains(h))
            .collect()
    }
}

/// In-memory [`RenderBackend`] that records every call.
///
/// The log lives behind an `Rc` so tests can inspect it after the backend has
/// been moved into (and dropped with) a `Backdrop`.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub log: Rc<RefCell<Log>>,
    /// Fail `create_field` once this many fields exist.
    pub fail_create_after: Option<usize>,
    pub fail_render: bool,
    next: u32,
}

impl RecordingBackend {
    pub fn new() -> (Self, Rc<RefCell<Log>>) {
        let backend = Self::default();
        let log = backend.log.clone();
        (backend, log)
    }

    pub fn failing_after(n: usize) -> (Self, Rc<RefCell<Log>>) {
        let (mut backend, log) = Self::new();
        backend.fail_create_after = Some(n);
        (backend, log)
    }

    fn check(&self, handle: FieldHandle) -> Result<(), GpuError> {
        let log = self.log.borrow();
        let known = log.created.iter().any(|(h, _, _)| *h == handle);
        if !known || log.released_fields.contains(&handle) {
            return Err(GpuError::UnknownField(handle));
        }
        if log.release_calls > 0 {
            return Err(GpuError::Released);
        }
        Ok(())
    }
}

impl RenderBackend for RecordingBackend {
    fn create_field(&mut self, field: &FieldSystem) -> Result<FieldHandle, GpuError> {
        if let Some(limit) = self.fail_create_after {
            if self.log.borrow().created.len() >= limit {
                return Err(GpuError::Released);
            }
        }
        let handle = FieldHandle(self.next);
        self.next += 1;
        self.log.borrow_mut().created.push((handle, field.kind(), field.count()));
        Ok(handle)
    }

    fn write_positions(&mut self, handle: FieldHandle, positions: &[f32]) -> Result<(), GpuError> {
        self.check(handle)?;
        let mut log = self.log.borrow_mut();
        log.position_writes += 1;
        log.last_positions = positions.to_vec();
        Ok(())
    }

    fn write_colors(&mut self, handle: FieldHandle, _colors: &[f32]) -> Result<(), GpuError> {
        self.check(handle)?;
        self.log.borrow_mut().color_writes += 1;
        Ok(())
    }

    fn set_field_uniforms(&mut self, handle: FieldHandle, _uniforms: &FieldUniforms) -> Result<(), GpuError> {
        self.check(handle)?;
        self.log.borrow_mut().uniform_writes += 1;
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.log.borrow_mut().resizes.push((width, height));
    }

    fn render(&mut self, camera: &CameraUniforms) -> Result<(), GpuError> {
        if self.fail_render {
            return Err(GpuError::Surface(wgpu::SurfaceError::Outdated));
        }
        let mut log = self.log.borrow_mut();
        log.renders += 1;
        log.last_camera = Some(*camera);
        Ok(())
    }

    fn release_field(&mut self, handle: FieldHandle) {
        self.log.borrow_mut().released_fields.push(handle);
    }

    fn release(&mut self) {
        self.log.borrow_mut().release_calls += 1;
    }
}

/// A small config that mounts quickly.
pub fn small_config(seed: u64) -> cosmic_backdrop::BackdropConfig {
    cosmic_backdrop::BackdropConfig::new()
        .with_particle_count(12)
        .with_star_count(20)
        .with_nebula_layers(vec![
            cosmic_backdrop::NebulaLayer::new(5, 15.0, 8.0, 700.0, 0.15).with_rotation_rate(0.000_05, 0.000_1, 0.0),
            cosmic_backdrop::NebulaLayer::new(6, 8.0, 5.0, 600.0, 0.3),
        ])
        .with_seed(seed)
}
