//! Error types for fragkit.
//!
//! Kernels themselves are total functions and never fail; every variant here
//! belongs to the tooling that assembles, configures or dispatches them.

use thiserror::Error;

/// The main error type for fragkit operations.
#[derive(Error, Debug)]
pub enum KernelError {
    /// A swizzle or write mask could not be parsed.
    #[error("invalid swizzle '{0}'")]
    InvalidSwizzle(String),

    /// A kernel program failed to parse.
    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    /// An instruction was given the wrong number of source operands.
    #[error("{opcode} expects {expected} source operand(s), got {actual}")]
    Arity {
        opcode: String,
        expected: usize,
        actual: usize,
    },

    /// A program read a register that was never bound or written.
    #[error("register '{0}' read before it was bound or written")]
    UndefinedRegister(String),

    /// A template placeholder is malformed.
    #[error("template '{template}': {message}")]
    TemplateSyntax { template: String, message: String },

    /// A template parameter has no binding.
    #[error("template '{template}' is missing a binding for '{param}'")]
    MissingBinding { template: String, param: String },

    /// A binding was supplied for a parameter the template does not have.
    #[error("template '{template}' has no parameter '{param}'")]
    UnknownBinding { template: String, param: String },

    /// A kernel with the given name was not found in the registry.
    #[error("kernel '{0}' not found")]
    KernelNotFound(String),

    /// A volume has a zero-sized dimension.
    #[error("volume dimensions must be non-zero, got {0}x{1}x{2}")]
    EmptyVolume(u32, u32, u32),

    /// Data size mismatch.
    #[error("data size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// An option value is out of range.
    #[error("invalid option: {0}")]
    InvalidOption(String),

    /// GPU backend error.
    #[error("render error: {0}")]
    Render(String),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for fragkit operations.
pub type Result<T> = std::result::Result<T, KernelError>;
