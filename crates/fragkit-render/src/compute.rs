//! Compute pass applying a bounds guard to batches of samples.

use fragkit_core::{BoundsGuard, Vec3, MAX_WORKGROUP_SIZE};

use crate::buffer::{
    create_output_buffer, create_readback_buffer, create_storage_buffer, create_uniform_buffer,
};
use crate::context::GpuContext;
use crate::error::{RenderError, RenderResult};
use crate::shader::ShaderBuilder;
use crate::wgsl::{emit_compute_entry, emit_guard_fn};

/// Name of the generated guard function.
pub const GUARD_FN_NAME: &str = "guard_sample";

/// Upper bound on samples per dispatch, keeping the sample buffer well under
/// the default storage binding limit.
const MAX_SAMPLES_PER_DISPATCH: usize = 1 << 22;

/// Largest workgroup count per dispatch dimension on every device.
const MAX_WORKGROUPS: usize = 65_535;

/// One sample as laid out in the storage buffer.
/// Layout must match WGSL `GuardSample` exactly.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuSample {
    /// Normalized texture coordinate.
    pub tex_coord: [f32; 3],
    /// Value fetched at `tex_coord`.
    pub value: f32,
}

/// Uniforms for the guard pass.
/// Layout must match WGSL `GuardParams` exactly.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GuardParams {
    /// Border value per axis.
    pub border: [f32; 3],
    /// Number of valid samples in this dispatch.
    pub count: u32,
}

/// GPU resources for running one guard over sample batches.
pub struct BorderPass {
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    guard: BoundsGuard,
    workgroup_size: u32,
}

impl BorderPass {
    /// Creates the pass, generating the shader for `guard`.
    pub fn new(
        context: &GpuContext,
        guard: &BoundsGuard,
        workgroup_size: u32,
    ) -> RenderResult<Self> {
        if workgroup_size == 0 || workgroup_size > MAX_WORKGROUP_SIZE {
            return Err(RenderError::InvalidWorkgroupSize(workgroup_size));
        }

        let builder = Self::shader_builder(guard, workgroup_size);
        let shader = builder.build_module(&context.device)?;
        let device = &context.device;

        let storage_entry = |binding: u32, read_only: bool| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Border Guard Bind Group Layout"),
            entries: &[
                // Input samples
                storage_entry(0, true),
                // Uniforms
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Output values
                storage_entry(2, false),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Border Guard Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Border Guard Pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some(builder.entry_point()),
            compilation_options: Default::default(),
            cache: None,
        });

        log::debug!(
            "created border guard pass ({:?}, workgroup size {workgroup_size})",
            guard.dim()
        );

        Ok(Self {
            pipeline,
            bind_group_layout,
            guard: *guard,
            workgroup_size,
        })
    }

    /// Returns the shader builder for `guard` without touching a device.
    pub fn shader_builder(guard: &BoundsGuard, workgroup_size: u32) -> ShaderBuilder {
        ShaderBuilder::new()
            .with_label("Border Guard Shader")
            .with_kernel(emit_guard_fn(GUARD_FN_NAME, guard))
            .with_entry(emit_compute_entry(GUARD_FN_NAME, "main", workgroup_size))
            .with_entry_point("main")
    }

    /// Returns the guard this pass evaluates.
    pub fn guard(&self) -> &BoundsGuard {
        &self.guard
    }

    /// Returns the workgroup size.
    pub fn workgroup_size(&self) -> u32 {
        self.workgroup_size
    }

    /// Guards every `(coord, sample)` pair on the GPU.
    pub fn run(
        &self,
        context: &GpuContext,
        coords: &[Vec3],
        samples: &[f32],
    ) -> RenderResult<Vec<f32>> {
        if coords.len() != samples.len() {
            return Err(RenderError::SizeMismatch {
                expected: coords.len(),
                actual: samples.len(),
            });
        }

        let chunk = (self.workgroup_size as usize * MAX_WORKGROUPS).min(MAX_SAMPLES_PER_DISPATCH);
        let mut results = Vec::with_capacity(samples.len());
        for (coords, samples) in coords.chunks(chunk).zip(samples.chunks(chunk)) {
            let gpu_samples: Vec<GpuSample> = coords
                .iter()
                .zip(samples)
                .map(|(coord, &value)| GpuSample {
                    tex_coord: coord.to_array(),
                    value,
                })
                .collect();
            results.extend(self.dispatch(context, &gpu_samples)?);
        }
        Ok(results)
    }

    fn dispatch(&self, context: &GpuContext, samples: &[GpuSample]) -> RenderResult<Vec<f32>> {
        let device = &context.device;
        let count = samples.len();
        // Bounded by MAX_SAMPLES_PER_DISPATCH.
        let count_u32 = u32::try_from(count).map_err(|_| RenderError::SizeMismatch {
            expected: MAX_SAMPLES_PER_DISPATCH,
            actual: count,
        })?;
        let output_size = (count * std::mem::size_of::<f32>()) as u64;

        let params = GuardParams {
            border: self.guard.border().as_vec3().to_array(),
            count: count_u32,
        };

        let sample_buffer = create_storage_buffer(device, samples, Some("Border Guard Samples"));
        let params_buffer = create_uniform_buffer(device, &params, Some("Border Guard Params"));
        let output_buffer = create_output_buffer(device, output_size, Some("Border Guard Output"));
        let readback_buffer =
            create_readback_buffer(device, output_size, Some("Border Guard Readback"));

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Border Guard Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: sample_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: output_buffer.as_entire_binding(),
                },
            ],
        });

        let workgroups = count_u32.div_ceil(self.workgroup_size);
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("border guard encoder"),
        });
        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Border Guard Pass"),
                timestamp_writes: None,
            });
            compute_pass.set_pipeline(&self.pipeline);
            compute_pass.set_bind_group(0, &bind_group, &[]);
            compute_pass.dispatch_workgroups(workgroups, 1, 1);
        }
        encoder.copy_buffer_to_buffer(&output_buffer, 0, &readback_buffer, 0, output_size);
        context.queue.submit(std::iter::once(encoder.finish()));
        log::debug!("dispatched {workgroups} workgroup(s) for {count} sample(s)");

        // Map buffer and read data
        let buffer_slice = readback_buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = device.poll(wgpu::PollType::wait_indefinitely());
        rx.recv()
            .map_err(|_| RenderError::BufferMapFailed)?
            .map_err(|_| RenderError::BufferMapFailed)?;

        let data = buffer_slice.get_mapped_range();
        let values = bytemuck::cast_slice::<u8, f32>(&data).to_vec();
        drop(data);
        readback_buffer.unmap();

        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fragkit_core::{Dim, Lane};

    #[test]
    fn test_gpu_layouts_match_wgsl() {
        assert_eq!(std::mem::size_of::<GpuSample>(), 16);
        assert_eq!(std::mem::size_of::<GuardParams>(), 16);
    }

    #[test]
    fn test_shader_builder_source() {
        let guard = BoundsGuard::new(Dim::Three).with_axis_border(Lane::Z, 2.0);
        let source = BorderPass::shader_builder(&guard, 64).source().unwrap();
        assert!(source.contains(&format!("fn {GUARD_FN_NAME}(")));
        assert!(source.contains("@compute @workgroup_size(64)"));
        assert!(source.find("fn guard_sample(").unwrap() < source.find("fn main(").unwrap());
    }
}
