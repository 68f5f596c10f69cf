//! Registry of named kernel templates.

use std::collections::HashMap;

use crate::error::{KernelError, Result};
use crate::kernel::Dim;
use crate::program::Program;
use crate::template::{border_template, Bindings, KernelTemplate};

/// Registry for managing kernel templates.
#[derive(Debug, Default)]
pub struct KernelRegistry {
    kernels: HashMap<String, KernelTemplate>,
}

impl KernelRegistry {
    /// Creates a new registry with the built-in kernels.
    pub fn new() -> Self {
        let mut registry = Self::default();
        registry.register_defaults();
        registry
    }

    fn register_defaults(&mut self) {
        for dim in [Dim::One, Dim::Two, Dim::Three] {
            self.register(border_template(dim));
        }
    }

    /// Registers a template, replacing any template with the same name.
    pub fn register(&mut self, template: KernelTemplate) {
        if self.kernels.contains_key(template.name()) {
            log::debug!("replacing kernel template '{}'", template.name());
        }
        self.kernels.insert(template.name().to_string(), template);
    }

    /// Gets a template by name.
    pub fn get(&self, name: &str) -> Option<&KernelTemplate> {
        self.kernels.get(name)
    }

    /// Returns all template names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.kernels.keys().map(String::as_str)
    }

    /// Instantiates the named template into a program.
    pub fn instantiate(&self, name: &str, bindings: &Bindings) -> Result<Program> {
        self.get(name)
            .ok_or_else(|| KernelError::KernelNotFound(name.to_string()))?
            .compile(bindings)
    }
}
