//! Shader composition.

use crate::error::{RenderError, RenderResult};

/// Builder for compute shaders assembled from generated kernel functions
/// and an entry point.
pub struct ShaderBuilder {
    kernel_sources: Vec<String>,
    entry_source: Option<String>,
    entry_point: String,
    label: Option<String>,
}

impl ShaderBuilder {
    /// Creates a new shader builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            kernel_sources: Vec::new(),
            entry_source: None,
            entry_point: "main".to_string(),
            label: None,
        }
    }

    /// Adds a kernel function (WGSL).
    pub fn with_kernel(mut self, source: impl Into<String>) -> Self {
        self.kernel_sources.push(source.into());
        self
    }

    /// Sets the entry point source (WGSL).
    pub fn with_entry(mut self, source: impl Into<String>) -> Self {
        self.entry_source = Some(source.into());
        self
    }

    /// Sets the entry point name.
    pub fn with_entry_point(mut self, entry: impl Into<String>) -> Self {
        self.entry_point = entry.into();
        self
    }

    /// Sets the shader label for debugging.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Returns the entry point name.
    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    /// Returns the combined WGSL source.
    pub fn source(&self) -> RenderResult<String> {
        if self.kernel_sources.is_empty() {
            return Err(RenderError::ShaderCompilationFailed(
                "no kernel functions".into(),
            ));
        }
        let entry = self.entry_source.as_ref().ok_or_else(|| {
            RenderError::ShaderCompilationFailed("missing entry point".into())
        })?;
        if !entry.contains(&format!("fn {}(", self.entry_point)) {
            return Err(RenderError::ShaderCompilationFailed(format!(
                "entry source does not define '{}'",
                self.entry_point
            )));
        }

        let mut source = self.kernel_sources.join("\n");
        source.push('\n');
        source.push_str(entry);
        Ok(source)
    }

    /// Builds the shader module.
    pub fn build_module(&self, device: &wgpu::Device) -> RenderResult<wgpu::ShaderModule> {
        let source = self.source()?;
        log::debug!(
            "building shader module '{}'",
            self.label.as_deref().unwrap_or("unnamed")
        );

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: self.label.as_deref(),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        Ok(module)
    }
}

impl Default for ShaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}
