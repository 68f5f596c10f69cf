//! GPU backend error types.

use thiserror::Error;

/// Errors that can occur while building or dispatching GPU kernels.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Failed to create wgpu adapter.
    #[error("failed to create graphics adapter")]
    AdapterCreationFailed,

    /// Failed to create wgpu device.
    #[error("failed to create graphics device: {0}")]
    DeviceCreationFailed(#[from] wgpu::RequestDeviceError),

    /// Shader assembly failed.
    #[error("shader compilation failed: {0}")]
    ShaderCompilationFailed(String),

    /// Workgroup size outside the range every device supports.
    #[error("invalid workgroup size {0}")]
    InvalidWorkgroupSize(u32),

    /// Coordinate and sample counts differ.
    #[error("data size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// Mapping the readback buffer failed.
    #[error("failed to map readback buffer")]
    BufferMapFailed,
}

/// A specialized Result type for GPU operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;

impl From<RenderError> for fragkit_core::KernelError {
    fn from(err: RenderError) -> Self {
        fragkit_core::KernelError::Render(err.to_string())
    }
}
