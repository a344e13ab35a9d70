//! GLSL generation for uber programs.
//!
//! # Overview
//!
//! The shader system consists of:
//! - [`ShaderConstructor`] - Builds one stage's source from declarations and
//!   main-body snippets
//! - [`FragmentUberComposer`] / [`VertexUberComposer`] - Turn uber items
//!   (lights, input attributes, material channels) into constructor calls and
//!   keep the compiled shader object in sync
//! - [`IncludeResolver`] - Expands `#include` directives against a
//!   [`ShaderLibrary`] before a source is handed to the context
//!
//! # Include Syntax
//!
//! ```glsl
//! #include "ragl/lighting.glsl"
//! #include "ragl/shadow.glsl"
//! ```
//!
//! Each path is expanded at most once per source.

mod constructor;
mod fragment_uber;
pub mod library;
mod vertex_uber;

use std::collections::{HashMap, HashSet};

use ragl_core::profiling::profile_scope;

use crate::error::GraphicsError;

pub use constructor::{
    texture_lookup, texture_sampler_name, BlockId, GlslType, ShaderConstructor, Variable,
};
pub use fragment_uber::{
    channel_member_name, channel_texture_name, ChannelSource, FragmentInput, FragmentItem,
    FragmentUberComposer, InputAttributeRequest, UberLightDesc, UberLightKind,
};
pub use library::ShaderLibrary;
pub use vertex_uber::{VertexUberComposer, SH_COEFFICIENT_COUNT};

/// Resolves `#include` directives against registered modules.
#[derive(Debug, Clone)]
pub struct IncludeResolver {
    /// Registered include sources: path -> source text.
    includes: HashMap<String, String>,
}

impl Default for IncludeResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl IncludeResolver {
    /// Create a new empty resolver.
    pub fn new() -> Self {
        Self {
            includes: HashMap::new(),
        }
    }

    /// Create a resolver with the standard library pre-loaded.
    pub fn with_standard_library() -> Self {
        let mut resolver = Self::new();
        resolver.add_library(&ShaderLibrary::standard());
        resolver
    }

    /// Add a shader library.
    ///
    /// All modules in the library become available for `#include`.
    pub fn add_library(&mut self, library: &ShaderLibrary) {
        for (path, source) in library.modules() {
            self.register_include(path, source);
        }
    }

    /// Register a single include source.
    ///
    /// The path is what appears in `#include "path"` directives.
    pub fn register_include(&mut self, path: &str, source: &str) {
        self.includes.insert(path.to_string(), source.to_string());
    }

    /// Whether a path can be included.
    pub fn contains(&self, path: &str) -> bool {
        self.includes.contains_key(path)
    }

    /// Resolve `#include` directives in a GLSL source.
    ///
    /// Returns the GLSL with all includes expanded and nothing else changed.
    pub fn resolve_glsl(&self, source: &str) -> Result<String, GraphicsError> {
        profile_scope!("resolve_glsl");

        let mut included = HashSet::new();
        self.resolve_includes(source, &mut included)
    }

    /// Resolve `#include "path"` directives recursively.
    fn resolve_includes(
        &self,
        source: &str,
        included: &mut HashSet<String>,
    ) -> Result<String, GraphicsError> {
        let mut result = String::with_capacity(source.len());

        for line in source.lines() {
            let trimmed = line.trim();
            if let Some(path) = parse_include_directive(trimmed) {
                // Skip if already included (prevent double-inclusion)
                if !included.insert(path.to_string()) {
                    continue;
                }

                let include_source = self
                    .includes
                    .get(path)
                    .ok_or_else(|| GraphicsError::IncludeNotFound(path.to_string()))?;

                let resolved = self.resolve_includes(include_source, included)?;
                result.push_str(&resolved);
                result.push('\n');
            } else {
                result.push_str(line);
                result.push('\n');
            }
        }

        Ok(result)
    }
}

/// Parse a `#include "path"` directive, returning the path if found.
fn parse_include_directive(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("#include")?;
    let rest = rest.trim();
    // Support both #include "path" and #include <path>
    if let Some(inner) = rest.strip_prefix('"') {
        inner.strip_suffix('"')
    } else if let Some(inner) = rest.strip_prefix('<') {
        inner.strip_suffix('>')
    } else {
        None
    }
}
