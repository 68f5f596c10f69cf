//! fragkit: per-fragment numerical micro-kernels for Rust.
//!
//! The centerpiece is the border-replacement kernel: given a normalized
//! texture coordinate, the value fetched there and a border value, it returns
//! the border value whenever any coordinate lane lies outside `[0, 1]` and the
//! fetched value otherwise. It is written the way a lockstep fragment program
//! would write it, as a chain of branch-free selects on sign.
//!
//! # Quick Start
//!
//! ```no_run
//! use fragkit::*;
//!
//! fn main() -> Result<()> {
//!     init();
//!
//!     // Scalar kernel
//!     assert_eq!(replace_border(Vec3::new(0.5, 0.5, 0.5), 10.0, -1.0), 10.0);
//!     assert_eq!(replace_border(Vec3::new(1.2, 0.5, 0.5), 10.0, -1.0), -1.0);
//!
//!     // Batches on the CPU or the GPU
//!     let replacer = BorderReplacer::new(KernelOptions::new().with_border_value(-1.0))?;
//!     let out = replacer.apply(&[Vec3::splat(0.5), Vec3::splat(-0.1)], &[3.0, 4.0])?;
//!     assert_eq!(out, vec![3.0, -1.0]);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Layers
//!
//! - [`replace_border`], [`BoundsGuard`] - the kernel and its generalization
//! - [`Program`], [`KernelTemplate`], [`KernelRegistry`] - instruction-level kernels
//! - [`Volume`] - a fetch harness producing samples to guard
//! - [`BorderReplacer`] - batch dispatch on the CPU or through [`BorderPass`]

mod init;
mod replacer;

pub use init::init;
pub use replacer::BorderReplacer;

// Re-export core types
pub use fragkit_core::{
    batch::{guard_samples, guard_samples_in_place},
    error::{KernelError, Result},
    kernel::{
        is_in_bounds, replace_border, replace_border_ordered, replace_border_register, AxisTest,
        Border, BoundsGuard, Dim, GuardStrategy, Side, CANONICAL_ORDER,
    },
    lane::{Lane, Swizzle, WriteMask},
    options::{Backend, KernelOptions, MAX_WORKGROUP_SIZE},
    program::{Dest, Instruction, Opcode, Program, RegRef, RegisterFile, Source},
    registry::KernelRegistry,
    select::{select_neg, select_neg4},
    template::{border_template, Bindings, KernelTemplate, TEXTURE_BORDER_SOURCE},
    volume::{Interpolation, Volume, WrapMode},
    UVec3, Vec3, Vec4,
};

// Re-export GPU types
pub use fragkit_render::{
    emit_compute_entry, emit_guard_fn, BorderPass, GpuContext, RenderError, ShaderBuilder,
};
