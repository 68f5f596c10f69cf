//! Core kernels for fragkit.
//!
//! This crate provides the per-fragment numerical micro-kernels and the
//! tooling to assemble them:
//! - [`replace_border`] and [`BoundsGuard`] for clamp-to-border emulation
//! - Select-on-sign primitives and four-lane register semantics
//! - [`Program`]s of fixed-function style instructions and their interpreter
//! - [`KernelTemplate`]s instantiated per call site through [`Bindings`]
//! - A [`Volume`] fetch harness, batch helpers and [`KernelOptions`]

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
// Texel indices are converted between float and integer space on purpose
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

pub mod batch;
pub mod error;
pub mod kernel;
pub mod lane;
pub mod options;
pub mod program;
pub mod registry;
pub mod select;
pub mod template;
pub mod volume;

pub use batch::{guard_samples, guard_samples_in_place};
pub use error::{KernelError, Result};
pub use kernel::{
    is_in_bounds, replace_border, replace_border_ordered, replace_border_register, AxisTest,
    Border, BoundsGuard, Dim, GuardStrategy, Side, CANONICAL_ORDER,
};
pub use lane::{Lane, Swizzle, WriteMask};
pub use options::{Backend, KernelOptions, MAX_WORKGROUP_SIZE};
pub use program::{Dest, Instruction, Opcode, Program, RegRef, RegisterFile, Source};
pub use registry::KernelRegistry;
pub use select::{select_neg, select_neg4};
pub use template::{border_template, Bindings, KernelTemplate, TEXTURE_BORDER_SOURCE};
pub use volume::{Interpolation, Volume, WrapMode};

// Re-export glam types for convenience
pub use glam::{UVec3, Vec3, Vec4};
