//! Vertex stage of an uber program.
//!
//! The vertex composer has no items of its own. It reacts to
//! [`InputAttributeRequest`]s from the fragment composer by adding the
//! matching varying (and whatever uniforms it needs to compute it).

use std::sync::Arc;

use ragl_core::handle::ShaderHandle;
use ragl_core::mesh::MeshStreamKind;
use ragl_core::profiling::profile_scope;

use super::constructor::{GlslType, ShaderConstructor};
use super::fragment_uber::{FragmentInput, InputAttributeRequest};
use crate::backend::{GpuContext, ShaderStage};
use crate::config::UberConfig;
use crate::error::GraphicsError;

/// Number of SH coefficients per light (bands 0 and 1).
pub const SH_COEFFICIENT_COUNT: u32 = 4;

/// Builds and compiles the vertex shader of an uber program.
pub struct VertexUberComposer {
    context: Arc<dyn GpuContext>,
    config: UberConfig,
    outputs: Vec<FragmentInput>,
    shader: Option<ShaderHandle>,
    dirty: bool,
}

impl VertexUberComposer {
    /// Create a composer that only transforms positions.
    pub fn new(context: Arc<dyn GpuContext>, config: &UberConfig) -> Self {
        Self {
            context,
            config: config.clone(),
            outputs: Vec::new(),
            shader: None,
            dirty: true,
        }
    }

    /// React to a request from the fragment stage.
    ///
    /// Returns `false` if the varying was already produced.
    pub fn handle_request(&mut self, request: &InputAttributeRequest) -> bool {
        if self.outputs.contains(&request.input) {
            return false;
        }
        log::trace!("Vertex uber: adding {}", request.input.varying_name());
        self.outputs.push(request.input);
        self.dirty = true;
        true
    }

    /// Get the produced varyings in request order.
    pub fn outputs(&self) -> &[FragmentInput] {
        &self.outputs
    }

    /// Whether the source changed since the last recompile.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Get the compiled shader object.
    pub fn shader(&self) -> Option<ShaderHandle> {
        self.shader
    }

    /// Regenerate and recompile the shader if dirty.
    pub fn recompile(&mut self) -> Result<bool, GraphicsError> {
        if !self.dirty {
            return Ok(false);
        }
        profile_scope!("vertex_uber_recompile");

        let shader = self.context.create_shader(ShaderStage::Vertex, &self.source())?;
        if let Some(old) = self.shader.replace(shader) {
            self.context.destroy_shader(old);
        }
        self.dirty = false;
        log::debug!(
            "Vertex uber: compiled {} ({} varyings)",
            shader,
            self.outputs.len()
        );
        Ok(true)
    }

    fn needs_normal(&self) -> bool {
        self.outputs
            .iter()
            .any(|output| matches!(output, FragmentInput::WorldNormal | FragmentInput::LightShColor(_)))
    }

    /// Generate the GLSL source.
    pub fn source(&self) -> String {
        let mut constructor = ShaderConstructor::new(ShaderStage::Vertex, &self.config.glsl_version);
        let block = constructor.add_uniform_block(
            &self.config.vertex_block_name,
            self.config.vertex_block_binding,
        );
        constructor.add_block_member(block, GlslType::Mat4, "model", None);
        constructor.add_block_member(block, GlslType::Mat4, "vp", None);

        add_stream_input(&mut constructor, MeshStreamKind::Vertex, GlslType::Vec3);
        let needs_normal = self.needs_normal();
        if needs_normal {
            constructor.add_block_member(block, GlslType::Mat4, "normal_matrix", None);
            add_stream_input(&mut constructor, MeshStreamKind::Normal, GlslType::Vec3);
        }
        if self.outputs.contains(&FragmentInput::TexCoord) {
            add_stream_input(&mut constructor, MeshStreamKind::TexCoord, GlslType::Vec2);
        }

        constructor.add_main_snippet("vec4 world_vertex = model * vec4(object_vertex, 1.0);");
        if needs_normal {
            constructor.add_main_snippet(
                "vec3 world_normal = normalize((normal_matrix * vec4(object_normal, 0.0)).xyz);",
            );
        }

        for output in &self.outputs {
            let name = output.varying_name();
            constructor.add_output(output.glsl_type(), &name, output.location());
            let snippet = match output {
                FragmentInput::WorldNormal => format!("{name} = world_normal;"),
                FragmentInput::WorldVertex => format!("{name} = world_vertex.xyz;"),
                FragmentInput::TexCoord => format!("{name} = object_uv;"),
                FragmentInput::ViewVector => {
                    constructor.add_block_member(block, GlslType::Vec4, "world_camera", None);
                    format!("{name} = world_camera.xyz - world_vertex.xyz;")
                }
                FragmentInput::LightShadowCoord(index) => {
                    let matrix = format!("light{index}_depth_vp");
                    constructor.add_block_member(block, GlslType::Mat4, &matrix, None);
                    // Clip space to [0, 1] texture space.
                    [
                        "{".to_string(),
                        format!("    vec4 light_clip = {matrix} * world_vertex;"),
                        format!("    {name} = vec4(light_clip.xyz * 0.5 + light_clip.w * 0.5, light_clip.w);"),
                        "}".to_string(),
                    ]
                    .join("\n")
                }
                FragmentInput::LightShColor(index) => {
                    let coefficients = format!("light{index}_sh_coeffs");
                    constructor.add_block_member(
                        block,
                        GlslType::Vec3,
                        &coefficients,
                        Some(SH_COEFFICIENT_COUNT),
                    );
                    format!(
                        "{name} = max({c}[0] + {c}[1] * world_normal.y + {c}[2] * world_normal.z + {c}[3] * world_normal.x, vec3(0.0));",
                        c = coefficients
                    )
                }
            };
            constructor.add_main_snippet(snippet);
        }

        constructor.add_main_snippet("gl_Position = vp * world_vertex;");
        constructor.generate()
    }
}

fn add_stream_input(constructor: &mut ShaderConstructor, kind: MeshStreamKind, ty: GlslType) {
    constructor.add_input(ty, kind.attribute_name(), kind.attribute_location());
}

impl Drop for VertexUberComposer {
    fn drop(&mut self) {
        if let Some(shader) = self.shader.take() {
            self.context.destroy_shader(shader);
        }
    }
}

impl std::fmt::Debug for VertexUberComposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VertexUberComposer")
            .field("outputs", &self.outputs)
            .field("shader", &self.shader)
            .field("dirty", &self.dirty)
            .finish()
    }
}
