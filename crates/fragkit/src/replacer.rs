//! Batch border replacement on the configured backend.

use std::sync::OnceLock;

use fragkit_core::{
    guard_samples, Backend, BoundsGuard, KernelError, KernelOptions, Result, Vec3,
};
use fragkit_render::{BorderPass, GpuContext, RenderResult};

struct GpuBackend {
    context: GpuContext,
    pass: BorderPass,
}

impl GpuBackend {
    fn create(guard: &BoundsGuard, workgroup_size: u32) -> RenderResult<Self> {
        let context = pollster::block_on(GpuContext::new_headless())?;
        let pass = BorderPass::new(&context, guard, workgroup_size)?;
        Ok(Self { context, pass })
    }
}

/// Applies a bounds guard to batches of `(coordinate, sample)` pairs.
///
/// The GPU device is created on the first GPU batch and reused afterwards.
/// If creation fails and [`KernelOptions::gpu_fallback_to_cpu`] is set, every
/// batch runs on the CPU instead.
pub struct BorderReplacer {
    options: KernelOptions,
    guard: BoundsGuard,
    gpu: OnceLock<std::result::Result<GpuBackend, String>>,
}

impl BorderReplacer {
    /// Creates a replacer from validated options.
    pub fn new(options: KernelOptions) -> Result<Self> {
        options.validate()?;
        let guard = options.guard();
        Ok(Self {
            options,
            guard,
            gpu: OnceLock::new(),
        })
    }

    /// Returns the options in use.
    #[must_use]
    pub fn options(&self) -> &KernelOptions {
        &self.options
    }

    /// Returns the guard built from the options.
    #[must_use]
    pub fn guard(&self) -> &BoundsGuard {
        &self.guard
    }

    /// Returns whether batches actually run on the GPU.
    ///
    /// Triggers device creation for the GPU backend.
    pub fn uses_gpu(&self) -> bool {
        self.options.backend == Backend::Gpu && self.gpu_backend().is_ok()
    }

    /// Guards each sample against its coordinate.
    pub fn apply(&self, coords: &[Vec3], samples: &[f32]) -> Result<Vec<f32>> {
        if coords.len() != samples.len() {
            return Err(KernelError::SizeMismatch {
                expected: coords.len(),
                actual: samples.len(),
            });
        }
        if samples.is_empty() {
            return Ok(Vec::new());
        }

        match self.options.backend {
            Backend::Cpu => guard_samples(&self.guard, coords, samples),
            Backend::Gpu => match self.gpu_backend() {
                Ok(gpu) => Ok(gpu.pass.run(&gpu.context, coords, samples)?),
                Err(message) if self.options.gpu_fallback_to_cpu => {
                    log::debug!("GPU unavailable ({message}), guarding on the CPU");
                    guard_samples(&self.guard, coords, samples)
                }
                Err(message) => Err(KernelError::Render(message.clone())),
            },
        }
    }

    fn gpu_backend(&self) -> std::result::Result<&GpuBackend, &String> {
        self.gpu
            .get_or_init(|| {
                GpuBackend::create(&self.guard, self.options.workgroup_size).map_err(|e| {
                    if self.options.gpu_fallback_to_cpu {
                        log::warn!("GPU backend unavailable, falling back to CPU: {e}");
                    } else {
                        log::error!("GPU backend unavailable: {e}");
                    }
                    e.to_string()
                })
            })
            .as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fragkit_core::{Dim, GuardStrategy};

    #[test]
    fn test_rejects_invalid_options() {
        let options = KernelOptions::new().with_workgroup_size(0);
        assert!(matches!(
            BorderReplacer::new(options),
            Err(KernelError::InvalidOption(_))
        ));
    }

    #[test]
    fn test_cpu_batch() {
        let replacer = BorderReplacer::new(
            KernelOptions::new()
                .with_dim(Dim::Two)
                .with_border_value(-1.0)
                .with_strategy(GuardStrategy::ViolationMask),
        )
        .unwrap();
        let coords = [
            Vec3::new(0.5, 0.5, 5.0),
            Vec3::new(1.5, 0.5, 0.5),
            Vec3::new(0.0, 1.0, 0.5),
        ];
        let out = replacer.apply(&coords, &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(out, vec![1.0, -1.0, 3.0]);
        assert!(!replacer.uses_gpu());
    }

    #[test]
    fn test_size_mismatch() {
        let replacer = BorderReplacer::new(KernelOptions::new()).unwrap();
        let err = replacer.apply(&[Vec3::ZERO], &[]).unwrap_err();
        assert!(matches!(
            err,
            KernelError::SizeMismatch {
                expected: 1,
                actual: 0
            }
        ));
    }

    #[test]
    fn test_empty_batch() {
        let replacer =
            BorderReplacer::new(KernelOptions::new().with_backend(Backend::Gpu)).unwrap();
        assert!(replacer.apply(&[], &[]).unwrap().is_empty());
    }
}
