//! Error types for the backdrop engine.
//!
//! Most failure modes of the engine are recovered locally (non-finite geometry
//! is clamped, missing render targets skip the frame, repeated teardown is a
//! no-op). The types here cover what genuinely cannot proceed: bad
//! configuration and GPU/windowing initialization.

use crate::backend::FieldHandle;

/// Convenience alias used throughout the crate.
pub type BackdropResult<T> = Result<T, BackdropError>;

/// Errors that can occur during GPU initialization or rendering.
#[derive(thiserror::Error, Debug)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    #[error("failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),

    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found: {0}")]
    NoAdapter(#[from] wgpu::RequestAdapterError),

    /// Failed to create GPU device.
    #[error("failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),

    /// The surface could not hand out a texture for this frame.
    #[error("surface unavailable: {0}")]
    Surface(#[from] wgpu::SurfaceError),

    /// A field handle that this backend never created (or already released).
    #[error("unknown field handle {0:?}")]
    UnknownField(FieldHandle),

    /// The backend was released and can no longer accept work.
    #[error("render backend already released")]
    Released,
}

/// Top-level error for mounting and running the backdrop.
#[derive(thiserror::Error, Debug)]
pub enum BackdropError {
    #[error("config error: {0}")]
    Config(String),

    #[error("failed to read config file: {0}")]
    ConfigFile(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),

    #[error("failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
}

impl BackdropError {
    /// Build a [`BackdropError::Config`] from any message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes_are_stable() {
        assert!(BackdropError::config("x").to_string().contains("config error:"));
        assert!(BackdropError::from(GpuError::Released)
            .to_string()
            .contains("GPU error:"));
    }

    #[test]
    fn test_unknown_field_names_the_handle() {
        let err = GpuError::UnknownField(FieldHandle(7));
        assert!(err.to_string().contains('7'));
    }
}
