//! The seam between the engine and the graphics API.
//!
//! The engine decides *what* to draw; a [`RenderBackend`] owns the GPU
//! objects. Buffers are created per field and addressed by [`FieldHandle`].
//! The engine guarantees it releases every handle it created exactly once,
//! then calls [`release`](RenderBackend::release) exactly once.

use bytemuck::{Pod, Zeroable};

use crate::error::GpuError;
use crate::field::{FieldSystem, FieldUniforms};

/// Opaque id for a field's GPU resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldHandle(pub u32);

/// Per-frame camera block. Layout matches `Camera` in the point shader.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct CameraUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub viewport: [f32; 2],
    /// Screen-space size multiplier applied to every point.
    pub point_scale: f32,
    pub _pad: f32,
}

impl CameraUniforms {
    /// Scale that makes a size-1 point about one pixel wide at 300 units.
    pub const POINT_SCALE: f32 = 300.0;

    pub fn new(view_proj: glam::Mat4, width: u32, height: u32) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            viewport: [width.max(1) as f32, height.max(1) as f32],
            point_scale: Self::POINT_SCALE,
            _pad: 0.0,
        }
    }
}

/// GPU resource owner for the backdrop.
pub trait RenderBackend {
    /// Allocate buffers, uniforms and pipeline for `field` and upload its
    /// current contents.
    fn create_field(&mut self, field: &FieldSystem) -> Result<FieldHandle, GpuError>;

    fn write_positions(&mut self, handle: FieldHandle, positions: &[f32]) -> Result<(), GpuError>;

    fn write_colors(&mut self, handle: FieldHandle, colors: &[f32]) -> Result<(), GpuError>;

    fn set_field_uniforms(&mut self, handle: FieldHandle, uniforms: &FieldUniforms) -> Result<(), GpuError>;

    /// Resize render targets. No field buffers are reallocated.
    fn resize(&mut self, width: u32, height: u32);

    /// Draw every live field, run post-processing and present.
    fn render(&mut self, camera: &CameraUniforms) -> Result<(), GpuError>;

    /// Free one field's buffers and pipeline.
    fn release_field(&mut self, handle: FieldHandle);

    /// Free the device-level resources (surface, targets).
    fn release(&mut self);
}
