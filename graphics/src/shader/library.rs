//! Built-in GLSL modules.
//!
//! # Shader Files
//!
//! Includable modules live in `shaders/library/`:
//! - `lighting.glsl` - Lambert/Phong terms, attenuation and spot cones
//! - `shadow.glsl` - Shadow bias, plain and variance shadow map tests,
//!   dual-paraboloid and cube map depth
//!
//! Main-function bodies of the special materials live in `shaders/special/`.
//! Their declarations are emitted by the registry through a
//! [`ShaderConstructor`](super::ShaderConstructor), so the files only hold
//! statements. They react to `SQUARED_DEPTH` for variance shadow maps.
//!
//! # Available Modules
//!
//! | Include Path | Description |
//! |-------------|-------------|
//! | `ragl/lighting.glsl` | Per-light shading terms |
//! | `ragl/shadow.glsl` | Shadow map comparisons |

/// Per-light shading terms.
const LIGHTING_MODULE: &str = include_str!("../../../shaders/library/lighting.glsl");

/// Shadow map comparisons.
const SHADOW_MODULE: &str = include_str!("../../../shaders/library/shadow.glsl");

/// Include path of the lighting module.
pub const LIGHTING_INCLUDE: &str = "ragl/lighting.glsl";

/// Include path of the shadow module.
pub const SHADOW_INCLUDE: &str = "ragl/shadow.glsl";

/// Vertex body writing clip-space position.
pub const DEPTH_CLIP_VERTEX_BODY: &str =
    include_str!("../../../shaders/special/depth_clip_vertex.glsl");

/// Fragment body writing window-space depth (and its square).
pub const DEPTH_CLIP_FRAGMENT_BODY: &str =
    include_str!("../../../shaders/special/depth_clip_fragment.glsl");

/// Vertex body projecting onto a paraboloid.
pub const DUAL_PARABOLOID_VERTEX_BODY: &str =
    include_str!("../../../shaders/special/dual_paraboloid_vertex.glsl");

/// Fragment body writing linear paraboloid depth (and its square).
pub const DUAL_PARABOLOID_FRAGMENT_BODY: &str =
    include_str!("../../../shaders/special/dual_paraboloid_fragment.glsl");

/// Collection of includable shader modules.
pub struct ShaderLibrary {
    modules: Vec<(&'static str, &'static str)>,
}

impl ShaderLibrary {
    /// Create the standard raGL shader library.
    ///
    /// This includes all built-in modules:
    /// - `ragl/lighting.glsl` - Per-light shading terms
    /// - `ragl/shadow.glsl` - Shadow map comparisons
    pub fn standard() -> Self {
        Self {
            modules: vec![
                (LIGHTING_INCLUDE, LIGHTING_MODULE),
                (SHADOW_INCLUDE, SHADOW_MODULE),
            ],
        }
    }

    /// Create an empty shader library.
    pub fn empty() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    /// Get an iterator over all modules (path, source).
    pub fn modules(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.modules.iter().copied()
    }

    /// Add a custom module to the library.
    pub fn with_module(mut self, path: &'static str, source: &'static str) -> Self {
        self.modules.push((path, source));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_library_modules() {
        let library = ShaderLibrary::standard();
        let modules: Vec<_> = library.modules().collect();

        assert_eq!(modules.len(), 2);
        assert!(modules.iter().any(|(path, _)| *path == "ragl/lighting.glsl"));
        assert!(modules.iter().any(|(path, _)| *path == "ragl/shadow.glsl"));
    }

    #[test]
    fn test_custom_module() {
        let library = ShaderLibrary::empty()
            .with_module("custom/module.glsl", "float foo() { return 1.0; }");
        assert_eq!(library.modules().count(), 1);
    }

    #[test]
    fn test_module_contents() {
        assert!(LIGHTING_MODULE.contains("float lambert_diffuse("));
        assert!(LIGHTING_MODULE.contains("float phong_specular("));
        assert!(LIGHTING_MODULE.contains("float spot_factor("));
        assert!(LIGHTING_MODULE.contains("float attenuation_custom("));

        assert!(SHADOW_MODULE.contains("float shadow_plain("));
        assert!(SHADOW_MODULE.contains("float shadow_vsm("));
        assert!(SHADOW_MODULE.contains("vec3 dual_paraboloid_coord("));

        assert!(DEPTH_CLIP_FRAGMENT_BODY.contains("#ifdef SQUARED_DEPTH"));
        assert!(DUAL_PARABOLOID_FRAGMENT_BODY.contains("#ifdef SQUARED_DEPTH"));
        assert!(DUAL_PARABOLOID_VERTEX_BODY.contains("far_near_plane_diff"));
        assert!(DEPTH_CLIP_VERTEX_BODY.contains("gl_Position"));
    }
}
