//! Configuration options for border kernels.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{KernelError, Result};
use crate::kernel::{BoundsGuard, Dim, GuardStrategy};
use crate::lane::Lane;

/// Largest compute workgroup every `wgpu` device is required to support.
pub const MAX_WORKGROUP_SIZE: u32 = 256;

/// Where guarded samples are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Backend {
    /// Pure Rust, on the calling thread.
    #[default]
    Cpu,
    /// Generated WGSL compute kernel.
    Gpu,
}

/// Options controlling how a border guard is built and dispatched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelOptions {
    /// Number of coordinate lanes tested.
    pub dim: Dim,

    /// Uniform replacement value.
    pub border_value: f32,

    /// Per-axis replacement values; overrides `border_value` when set.
    pub axis_border: Option<Vec3>,

    /// Evaluation strategy on the CPU.
    pub strategy: GuardStrategy,

    /// Backend used for batches.
    pub backend: Backend,

    /// Invocations per GPU workgroup.
    pub workgroup_size: u32,

    /// Whether a GPU batch falls back to the CPU when no adapter is available.
    pub gpu_fallback_to_cpu: bool,
}

impl Default for KernelOptions {
    fn default() -> Self {
        Self {
            dim: Dim::Three,
            border_value: 0.0,
            axis_border: None,
            strategy: GuardStrategy::SelectChain,
            backend: Backend::Cpu,
            workgroup_size: 64,
            gpu_fallback_to_cpu: true,
        }
    }
}

impl KernelOptions {
    /// Creates options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the dimensionality.
    pub fn with_dim(mut self, dim: Dim) -> Self {
        self.dim = dim;
        self
    }

    /// Sets a uniform border value and clears any per-axis values.
    pub fn with_border_value(mut self, value: f32) -> Self {
        self.border_value = value;
        self.axis_border = None;
        self
    }

    /// Sets per-axis border values.
    pub fn with_axis_border(mut self, values: Vec3) -> Self {
        self.axis_border = Some(values);
        self
    }

    /// Sets the evaluation strategy.
    pub fn with_strategy(mut self, strategy: GuardStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the backend.
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Sets the GPU workgroup size.
    pub fn with_workgroup_size(mut self, size: u32) -> Self {
        self.workgroup_size = size;
        self
    }

    /// Sets whether GPU batches may fall back to the CPU.
    pub fn with_gpu_fallback(mut self, fallback: bool) -> Self {
        self.gpu_fallback_to_cpu = fallback;
        self
    }

    /// Checks that every value is in range.
    pub fn validate(&self) -> Result<()> {
        if self.workgroup_size == 0 || self.workgroup_size > MAX_WORKGROUP_SIZE {
            return Err(KernelError::InvalidOption(format!(
                "workgroup_size must be in 1..={MAX_WORKGROUP_SIZE}, got {}",
                self.workgroup_size
            )));
        }
        let border_finite = match self.axis_border {
            Some(values) => values.is_finite(),
            None => self.border_value.is_finite(),
        };
        if !border_finite {
            return Err(KernelError::InvalidOption(
                "border values must be finite".into(),
            ));
        }
        Ok(())
    }

    /// Builds the guard these options describe.
    pub fn guard(&self) -> BoundsGuard {
        let guard = BoundsGuard::new(self.dim)
            .with_border(self.border_value)
            .with_strategy(self.strategy);
        match self.axis_border {
            Some(values) => Lane::SPATIAL
                .iter()
                .fold(guard, |g, &axis| g.with_axis_border(axis, values[axis.index()])),
            None => guard,
        }
    }

    /// Parses and validates options from JSON. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Serializes the options to pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
