//! Configuration of the uber machinery.
//!
//! Both structs follow the builder style used for descriptors: start from
//! `default()` and override what differs.

/// GLSL flavour and uniform block layout of composed uber programs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UberConfig {
    /// Text after `#version`.
    pub glsl_version: String,
    /// Name of the fragment stage uniform block.
    pub fragment_block_name: String,
    /// Binding point of the fragment stage uniform block.
    pub fragment_block_binding: u32,
    /// Name of the vertex stage uniform block.
    pub vertex_block_name: String,
    /// Binding point of the vertex stage uniform block.
    pub vertex_block_binding: u32,
}

impl Default for UberConfig {
    fn default() -> Self {
        Self {
            glsl_version: "450 core".into(),
            fragment_block_name: "FragmentShaderProperties".into(),
            fragment_block_binding: 0,
            vertex_block_name: "VertexShaderProperties".into(),
            vertex_block_binding: 1,
        }
    }
}

impl UberConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the GLSL version line.
    pub fn with_glsl_version(mut self, version: impl Into<String>) -> Self {
        self.glsl_version = version.into();
        self
    }

    /// Set the fragment block name and binding.
    pub fn with_fragment_block(mut self, name: impl Into<String>, binding: u32) -> Self {
        self.fragment_block_name = name.into();
        self.fragment_block_binding = binding;
        self
    }

    /// Set the vertex block name and binding.
    pub fn with_vertex_block(mut self, name: impl Into<String>, binding: u32) -> Self {
        self.vertex_block_name = name.into();
        self.vertex_block_binding = binding;
        self
    }
}

/// Materials registry settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialsConfig {
    /// Configuration of every uber program the registry bakes.
    pub uber: UberConfig,
    /// Bake the special materials when the registry is created.
    pub prebake_special_materials: bool,
}

impl Default for MaterialsConfig {
    fn default() -> Self {
        Self {
            uber: UberConfig::default(),
            prebake_special_materials: true,
        }
    }
}

impl MaterialsConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the uber program configuration.
    pub fn with_uber_config(mut self, uber: UberConfig) -> Self {
        self.uber = uber;
        self
    }

    /// Enable or disable special material pre-baking.
    ///
    /// When disabled, special materials are baked on first request.
    pub fn with_prebaked_special_materials(mut self, prebake: bool) -> Self {
        self.prebake_special_materials = prebake;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MaterialsConfig::default();
        assert!(config.prebake_special_materials);
        assert_eq!(config.uber.glsl_version, "450 core");
        assert_eq!(config.uber.fragment_block_name, "FragmentShaderProperties");
        assert_ne!(
            config.uber.fragment_block_binding,
            config.uber.vertex_block_binding
        );
    }

    #[test]
    fn test_builders() {
        let config = UberConfig::new()
            .with_glsl_version("450 core")
            .with_vertex_block("VS", 4);
        assert_eq!(config.glsl_version, "450 core");
        assert_eq!((config.vertex_block_name.as_str(), config.vertex_block_binding), ("VS", 4));
    }
}
