//! GPU backend for fragkit.
//!
//! This crate provides the wgpu-based execution path for border guards:
//! - WGSL generation for guards and compute entry points
//! - Shader composition ([`ShaderBuilder`])
//! - Headless device setup and GPU buffer helpers
//! - The [`BorderPass`] compute pass

pub mod buffer;
pub mod compute;
pub mod context;
pub mod error;
pub mod shader;
pub mod wgsl;

pub use compute::{BorderPass, GpuSample, GuardParams, GUARD_FN_NAME};
pub use context::GpuContext;
pub use error::{RenderError, RenderResult};
pub use shader::ShaderBuilder;
pub use wgsl::{emit_compute_entry, emit_guard_fn};
