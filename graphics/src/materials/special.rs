//! Built-in materials used by shadow and preview passes.

use std::sync::Arc;

use ragl_core::handle::ProgramHandle;
use ragl_core::material::{InputFragmentAttribute, Material, Shading};
use ragl_core::mesh::MeshStreamKind;

use crate::backend::{GpuContext, ShaderStage};
use crate::config::UberConfig;
use crate::error::GraphicsError;
use crate::shader::library::{
    DEPTH_CLIP_FRAGMENT_BODY, DEPTH_CLIP_VERTEX_BODY, DUAL_PARABOLOID_FRAGMENT_BODY,
    DUAL_PARABOLOID_VERTEX_BODY,
};
use crate::shader::{GlslType, ShaderConstructor};
use crate::uber::GeneralProperty;

/// A material the registry provides out of the box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialMaterial {
    /// Window-space depth, for plain shadow maps of directional and spot lights.
    DepthClip,
    /// Depth and squared depth, for variance shadow maps.
    DepthClipAndSquared,
    /// Linear depth on a paraboloid hemisphere, for point light shadows.
    DualParaboloid,
    /// Dual-paraboloid depth and squared depth.
    DualParaboloidAndSquared,
    /// World normals as colors.
    Normals,
    /// Texture coordinates as colors.
    TexCoords,
}

impl SpecialMaterial {
    /// All special materials.
    pub const ALL: [SpecialMaterial; 6] = [
        Self::DepthClip,
        Self::DepthClipAndSquared,
        Self::DualParaboloid,
        Self::DualParaboloidAndSquared,
        Self::Normals,
        Self::TexCoords,
    ];

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Self::DepthClip => "Depth clip",
            Self::DepthClipAndSquared => "Depth clip and squared",
            Self::DualParaboloid => "Dual paraboloid",
            Self::DualParaboloidAndSquared => "Dual paraboloid and squared",
            Self::Normals => "Normals",
            Self::TexCoords => "TexCoords",
        }
    }

    /// Whether the material writes squared depth as a second moment.
    pub fn is_squared(self) -> bool {
        matches!(self, Self::DepthClipAndSquared | Self::DualParaboloidAndSquared)
    }

    /// Whether the material runs a hand-written program instead of an
    /// uber composition.
    pub fn has_custom_program(self) -> bool {
        !matches!(self, Self::Normals | Self::TexCoords)
    }

    /// Material of the preview kinds, shaded through the uber path.
    pub(crate) fn general_material(self) -> Option<Material> {
        let attribute = match self {
            Self::Normals => InputFragmentAttribute::Normal,
            Self::TexCoords => InputFragmentAttribute::TexCoord,
            _ => return None,
        };
        Some(
            Material::new(self.name())
                .with_shading(Shading::InputFragmentAttribute)
                .with_input_fragment_attribute(attribute),
        )
    }

    /// Generate vertex and fragment sources of the custom program kinds.
    pub fn sources(self, config: &UberConfig) -> Option<(String, String)> {
        let (vertex_body, fragment_body, paraboloid) = match self {
            Self::DepthClip | Self::DepthClipAndSquared => {
                (DEPTH_CLIP_VERTEX_BODY, DEPTH_CLIP_FRAGMENT_BODY, false)
            }
            Self::DualParaboloid | Self::DualParaboloidAndSquared => {
                (DUAL_PARABOLOID_VERTEX_BODY, DUAL_PARABOLOID_FRAGMENT_BODY, true)
            }
            Self::Normals | Self::TexCoords => return None,
        };

        let mut vertex = ShaderConstructor::new(ShaderStage::Vertex, &config.glsl_version);
        let block = vertex.add_uniform_block(&config.vertex_block_name, config.vertex_block_binding);
        vertex.add_block_member(block, GlslType::Mat4, "model", None);
        vertex.add_block_member(block, GlslType::Mat4, GeneralProperty::ViewProjection.uniform_name(), None);
        vertex.add_input(
            GlslType::Vec3,
            MeshStreamKind::Vertex.attribute_name(),
            MeshStreamKind::Vertex.attribute_location(),
        );

        let mut fragment = ShaderConstructor::new(ShaderStage::Fragment, &config.glsl_version);
        if self.is_squared() {
            fragment.add_define("SQUARED_DEPTH", "1");
        }
        fragment.add_output(GlslType::Vec4, "result_fragment", 0);

        if paraboloid {
            for property in [
                GeneralProperty::FlipZ,
                GeneralProperty::NearPlane,
                GeneralProperty::FarNearPlaneDiff,
            ] {
                vertex.add_block_member(block, GlslType::Float, property.uniform_name(), None);
            }
            for (location, varying) in (0..).zip(["out_hemisphere_z", "out_depth"]) {
                vertex.add_output(GlslType::Float, varying, location);
                fragment.add_input(GlslType::Float, varying, location);
            }
        }

        vertex.add_main_snippet(vertex_body.trim_end());
        fragment.add_main_snippet(fragment_body.trim_end());
        Some((vertex.generate(), fragment.generate()))
    }

    /// Compile and link the custom program kinds.
    pub(crate) fn build_program(
        self,
        context: &Arc<dyn GpuContext>,
        config: &UberConfig,
    ) -> Result<Option<ProgramHandle>, GraphicsError> {
        let Some((vertex_source, fragment_source)) = self.sources(config) else {
            return Ok(None);
        };

        let vertex = context.create_shader(ShaderStage::Vertex, &vertex_source)?;
        let fragment = match context.create_shader(ShaderStage::Fragment, &fragment_source) {
            Ok(fragment) => fragment,
            Err(err) => {
                context.destroy_shader(vertex);
                return Err(err);
            }
        };
        let linked = context.link_program(&[vertex, fragment]);
        // Linked programs keep working after their shader objects are gone.
        context.destroy_shader(vertex);
        context.destroy_shader(fragment);

        let linked = linked?;
        log::debug!("Built special material '{}' as {}", self.name(), linked.handle);
        Ok(Some(linked.handle))
    }
}
