//! Fragment stage of an uber program.
//!
//! The composer owns an ordered list of items. Each item is either a light
//! or an input-attribute passthrough; its position in the list is its id,
//! and light uniforms embed that id (`light{id}_diffuse`, ...). Whenever an
//! item needs an interpolated value the vertex stage must produce, the
//! composer emits an [`InputAttributeRequest`] through the listener passed
//! to the add call.

use std::sync::Arc;

use ragl_core::handle::ShaderHandle;
use ragl_core::material::{AttachmentKind, InputFragmentAttribute, ShadingProperty};
use ragl_core::profiling::profile_scope;
use ragl_core::scene::{
    LightFalloff, PointLightShadowAlgorithm, SceneLight, ShadowMapAlgorithm, ShadowMapBias,
};

use super::constructor::{texture_lookup, BlockId, GlslType, ShaderConstructor};
use super::library::{LIGHTING_INCLUDE, SHADOW_INCLUDE};
use super::IncludeResolver;
use crate::backend::{GpuContext, ShaderStage};
use crate::config::UberConfig;
use crate::error::GraphicsError;

/// Light variant of an uber item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UberLightKind {
    /// Constant ambient term.
    Ambient,
    /// Diffuse-only directional light.
    LambertDirectional,
    /// Diffuse-only point light.
    LambertPoint,
    /// Diffuse and specular directional light.
    PhongDirectional,
    /// Diffuse and specular point light.
    PhongPoint,
    /// Diffuse and specular spot light.
    PhongSpot,
    /// Spherical harmonics irradiance evaluated per vertex.
    ShProjection,
}

impl UberLightKind {
    /// Short name used in generated comments and logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::Ambient => "ambient",
            Self::LambertDirectional => "lambert directional",
            Self::LambertPoint => "lambert point",
            Self::PhongDirectional => "phong directional",
            Self::PhongPoint => "phong point",
            Self::PhongSpot => "phong spot",
            Self::ShProjection => "sh projection",
        }
    }

    /// Whether the light has a world-space location.
    pub fn has_location(self) -> bool {
        matches!(self, Self::LambertPoint | Self::PhongPoint | Self::PhongSpot)
    }

    /// Whether the light has a direction.
    pub fn has_direction(self) -> bool {
        matches!(
            self,
            Self::LambertDirectional | Self::PhongDirectional | Self::PhongSpot
        )
    }

    /// Whether the light is omnidirectional.
    pub fn is_point(self) -> bool {
        matches!(self, Self::LambertPoint | Self::PhongPoint)
    }

    /// Whether the light adds a specular term.
    pub fn is_phong(self) -> bool {
        matches!(self, Self::PhongDirectional | Self::PhongPoint | Self::PhongSpot)
    }

    /// Whether the light is evaluated per pixel against the surface normal.
    pub fn is_per_pixel(self) -> bool {
        !matches!(self, Self::Ambient | Self::ShProjection)
    }
}

/// Everything the fragment stage needs to know about one light item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UberLightDesc {
    /// Light variant.
    pub kind: UberLightKind,
    /// Distance attenuation (point and spot lights).
    pub falloff: LightFalloff,
    /// Shadow map algorithm.
    pub shadow_map_algorithm: ShadowMapAlgorithm,
    /// Shadow map bias.
    pub shadow_map_bias: ShadowMapBias,
    /// Point light shadow layout.
    pub point_light_shadow_algorithm: PointLightShadowAlgorithm,
    /// Whether a shadow map is sampled for this light.
    pub is_shadow_caster: bool,
}

impl UberLightDesc {
    /// Create a non-casting light with default settings.
    pub fn new(kind: UberLightKind) -> Self {
        Self {
            kind,
            falloff: LightFalloff::Off,
            shadow_map_algorithm: ShadowMapAlgorithm::Plain,
            shadow_map_bias: ShadowMapBias::Constant,
            point_light_shadow_algorithm: PointLightShadowAlgorithm::CubeMap,
            is_shadow_caster: false,
        }
    }

    /// Take falloff and shadow settings from a scene light.
    pub fn from_scene_light(kind: UberLightKind, light: &SceneLight, is_shadow_caster: bool) -> Self {
        Self {
            kind,
            falloff: light.falloff,
            shadow_map_algorithm: light.shadow_map_algorithm,
            shadow_map_bias: light.shadow_map_bias,
            point_light_shadow_algorithm: light.point_light_shadow_algorithm,
            is_shadow_caster,
        }
    }

    /// Set the falloff.
    pub fn with_falloff(mut self, falloff: LightFalloff) -> Self {
        self.falloff = falloff;
        self
    }

    /// Make the light sample a shadow map.
    pub fn with_shadow_caster(mut self, algorithm: ShadowMapAlgorithm, bias: ShadowMapBias) -> Self {
        self.is_shadow_caster = true;
        self.shadow_map_algorithm = algorithm;
        self.shadow_map_bias = bias;
        self
    }

    /// Set the point light shadow layout.
    pub fn with_point_light_shadow_algorithm(mut self, algorithm: PointLightShadowAlgorithm) -> Self {
        self.point_light_shadow_algorithm = algorithm;
        self
    }

    /// Whether the generated shader samples a shadow map for this light.
    pub fn samples_shadow_map(&self) -> bool {
        self.is_shadow_caster && self.kind.is_per_pixel()
    }

    /// Whether the light needs a light-space coordinate from the vertex stage.
    pub fn needs_shadow_coord(&self) -> bool {
        self.samples_shadow_map() && !self.kind.is_point()
    }

    /// GLSL type of the shadow map texture.
    pub fn shadow_texture_type(&self) -> GlslType {
        if self.kind.is_point()
            && self.point_light_shadow_algorithm == PointLightShadowAlgorithm::CubeMap
        {
            GlslType::TextureCube
        } else {
            GlslType::Texture2D
        }
    }
}

/// Where a material channel value comes from in the generated shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelSource {
    /// Channel not used.
    #[default]
    None,
    /// Float member, sampled from a curve on the CPU.
    CurveFloat,
    /// vec3 member, sampled from three curves on the CPU.
    CurveVec3,
    /// Constant float member.
    Float,
    /// Texture sampled with the interpolated UV.
    Texture,
    /// Constant vec4 member.
    Vec4,
}

impl From<AttachmentKind> for ChannelSource {
    fn from(kind: AttachmentKind) -> Self {
        match kind {
            AttachmentKind::None => Self::None,
            AttachmentKind::Float => Self::Float,
            AttachmentKind::Vec4 => Self::Vec4,
            AttachmentKind::CurveFloat => Self::CurveFloat,
            AttachmentKind::CurveVec3 => Self::CurveVec3,
            AttachmentKind::Texture => Self::Texture,
        }
    }
}

impl ChannelSource {
    /// Type of the uniform block member, for sources that have one.
    pub fn member_type(self) -> Option<GlslType> {
        match self {
            Self::CurveFloat | Self::Float => Some(GlslType::Float),
            Self::CurveVec3 => Some(GlslType::Vec3),
            Self::Vec4 => Some(GlslType::Vec4),
            Self::None | Self::Texture => None,
        }
    }
}

/// Uniform block member holding a material channel value.
pub fn channel_member_name(property: ShadingProperty) -> String {
    format!("{}_material", property.name())
}

/// Texture uniform of a textured material channel.
pub fn channel_texture_name(property: ShadingProperty) -> String {
    format!("{}_material_texture", property.name())
}

/// Interpolated value the fragment stage reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FragmentInput {
    /// World-space normal.
    WorldNormal,
    /// World-space position.
    WorldVertex,
    /// First UV set.
    TexCoord,
    /// Vector from the surface to the camera.
    ViewVector,
    /// Shadow map coordinate of a light item.
    LightShadowCoord(usize),
    /// Per-vertex SH irradiance of a light item.
    LightShColor(usize),
}

impl FragmentInput {
    /// Name of the varying.
    pub fn varying_name(self) -> String {
        match self {
            Self::WorldNormal => "out_world_normal".into(),
            Self::WorldVertex => "out_world_vertex".into(),
            Self::TexCoord => "out_uv".into(),
            Self::ViewVector => "out_view_vector".into(),
            Self::LightShadowCoord(index) => format!("out_light{index}_shadow_coord"),
            Self::LightShColor(index) => format!("out_light{index}_sh_color"),
        }
    }

    /// Type of the varying.
    pub fn glsl_type(self) -> GlslType {
        match self {
            Self::TexCoord => GlslType::Vec2,
            Self::LightShadowCoord(_) => GlslType::Vec4,
            Self::WorldNormal | Self::WorldVertex | Self::ViewVector | Self::LightShColor(_) => {
                GlslType::Vec3
            }
        }
    }

    /// Interface location shared by both stages. Light inputs take two
    /// slots per item id after the fixed ones.
    pub fn location(self) -> u32 {
        match self {
            Self::WorldNormal => 0,
            Self::WorldVertex => 1,
            Self::TexCoord => 2,
            Self::ViewVector => 3,
            Self::LightShadowCoord(index) => 4 + 2 * index as u32,
            Self::LightShColor(index) => 5 + 2 * index as u32,
        }
    }
}

/// Event sent to the vertex stage when the fragment stage needs a new input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputAttributeRequest {
    /// The input to produce.
    pub input: FragmentInput,
}

/// One contribution to the fragment shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentItem {
    /// Color taken from an interpolated attribute.
    InputAttribute(InputFragmentAttribute),
    /// A light.
    Light(UberLightDesc),
}

/// Builds and compiles the fragment shader of an uber program.
pub struct FragmentUberComposer {
    context: Arc<dyn GpuContext>,
    config: UberConfig,
    resolver: IncludeResolver,
    channels: [ChannelSource; ShadingProperty::COUNT],
    items: Vec<FragmentItem>,
    inputs: Vec<FragmentInput>,
    shader: Option<ShaderHandle>,
    dirty: bool,
}

impl FragmentUberComposer {
    /// Create a composer with one data source per shading channel.
    ///
    /// Textured channels request the UV passthrough right away.
    pub fn new(
        context: Arc<dyn GpuContext>,
        config: &UberConfig,
        channels: [ChannelSource; ShadingProperty::COUNT],
        listener: &mut dyn FnMut(&InputAttributeRequest),
    ) -> Self {
        let mut composer = Self {
            context,
            config: config.clone(),
            resolver: IncludeResolver::with_standard_library(),
            channels,
            items: Vec::new(),
            inputs: Vec::new(),
            shader: None,
            dirty: true,
        };
        if channels.contains(&ChannelSource::Texture) {
            composer.request(FragmentInput::TexCoord, listener);
        }
        composer
    }

    /// Register a light. Returns its item id.
    pub fn add_light(
        &mut self,
        desc: UberLightDesc,
        listener: &mut dyn FnMut(&InputAttributeRequest),
    ) -> usize {
        let index = self.items.len();
        let kind = desc.kind;

        if kind.is_per_pixel() {
            self.request(FragmentInput::WorldNormal, listener);
        }
        if kind.has_location() || (desc.samples_shadow_map() && kind.is_point()) {
            self.request(FragmentInput::WorldVertex, listener);
        }
        if kind.is_phong() {
            self.request(FragmentInput::ViewVector, listener);
        }
        if desc.needs_shadow_coord() {
            self.request(FragmentInput::LightShadowCoord(index), listener);
        }
        if kind == UberLightKind::ShProjection {
            self.request(FragmentInput::LightShColor(index), listener);
        }

        log::debug!("Fragment uber: light item {} ({})", index, kind.name());
        self.items.push(FragmentItem::Light(desc));
        self.dirty = true;
        index
    }

    /// Register an input-attribute passthrough. Returns its item id.
    pub fn add_input_attribute_contribution(
        &mut self,
        attribute: InputFragmentAttribute,
        listener: &mut dyn FnMut(&InputAttributeRequest),
    ) -> usize {
        let index = self.items.len();
        let input = match attribute {
            InputFragmentAttribute::Normal => FragmentInput::WorldNormal,
            InputFragmentAttribute::TexCoord => FragmentInput::TexCoord,
        };
        self.request(input, listener);

        log::debug!("Fragment uber: input attribute item {} ({:?})", index, attribute);
        self.items.push(FragmentItem::InputAttribute(attribute));
        self.dirty = true;
        index
    }

    fn request(&mut self, input: FragmentInput, listener: &mut dyn FnMut(&InputAttributeRequest)) {
        if self.inputs.contains(&input) {
            return;
        }
        self.inputs.push(input);
        listener(&InputAttributeRequest { input });
    }

    /// Get the items in id order.
    pub fn items(&self) -> &[FragmentItem] {
        &self.items
    }

    /// Get the number of items.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Get the data source of a shading channel.
    pub fn channel_source(&self, property: ShadingProperty) -> ChannelSource {
        self.channels[property.index()]
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
    ///
    /// Returns whether a compilation happened. The previous shader object is
    /// kept if compilation fails.
    pub fn recompile(&mut self) -> Result<bool, GraphicsError> {
        if !self.dirty {
            return Ok(false);
        }
        profile_scope!("fragment_uber_recompile");

        let source = self.resolver.resolve_glsl(&self.source())?;
        let shader = self.context.create_shader(ShaderStage::Fragment, &source)?;
        if let Some(old) = self.shader.replace(shader) {
            self.context.destroy_shader(old);
        }
        self.dirty = false;
        log::debug!(
            "Fragment uber: compiled {} ({} items)",
            shader,
            self.items.len()
        );
        Ok(true)
    }

    /// Generate the GLSL source (with `#include` directives unresolved).
    pub fn source(&self) -> String {
        let mut constructor = ShaderConstructor::new(ShaderStage::Fragment, &self.config.glsl_version);
        let block = constructor.add_uniform_block(
            &self.config.fragment_block_name,
            self.config.fragment_block_binding,
        );

        for input in &self.inputs {
            constructor.add_input(input.glsl_type(), &input.varying_name(), input.location());
        }
        constructor.add_output(GlslType::Vec4, "result_fragment", 0);

        if self.items.iter().any(|item| matches!(item, FragmentItem::Light(_))) {
            constructor.add_include(LIGHTING_INCLUDE);
            constructor.add_include(SHADOW_INCLUDE);
        }

        self.emit_channels(&mut constructor, block);
        if self.inputs.contains(&FragmentInput::WorldNormal) {
            constructor.add_main_snippet("vec3 normal = normalize(out_world_normal);");
        }
        if self.inputs.contains(&FragmentInput::ViewVector) {
            constructor.add_main_snippet("vec3 to_eye = normalize(out_view_vector);");
        }
        constructor.add_main_snippet("vec3 color = material_luminosity;");

        for (index, item) in self.items.iter().enumerate() {
            match item {
                FragmentItem::InputAttribute(attribute) => {
                    constructor.add_main_snippet(input_attribute_snippet(*attribute));
                }
                FragmentItem::Light(desc) => {
                    emit_light(&mut constructor, block, index, desc);
                }
            }
        }

        constructor.add_main_snippet("result_fragment = vec4(color, 1.0);");
        constructor.generate()
    }

    fn emit_channels(&self, constructor: &mut ShaderConstructor, block: BlockId) {
        for property in ShadingProperty::ALL {
            let source = self.channels[property.index()];
            let member = channel_member_name(property);
            let texture = channel_texture_name(property);
            let lookup = texture_lookup(GlslType::Texture2D, &texture, "out_uv");
            if let Some(ty) = source.member_type() {
                constructor.add_block_member(block, ty, &member, None);
            }
            if source == ChannelSource::Texture {
                constructor.add_texture(GlslType::Texture2D, &texture);
            }

            let local = format!("material_{}", property.name());
            let snippet = if property == ShadingProperty::Shininess {
                let value = match source {
                    ChannelSource::None => "1.0".to_string(),
                    ChannelSource::Float | ChannelSource::CurveFloat => member,
                    ChannelSource::CurveVec3 | ChannelSource::Vec4 => format!("{member}.x"),
                    ChannelSource::Texture => format!("{lookup}.r"),
                };
                format!("float {local} = {value};")
            } else {
                let value = match source {
                    ChannelSource::None => channel_default(property).to_string(),
                    ChannelSource::Float | ChannelSource::CurveFloat => format!("vec3({member})"),
                    ChannelSource::CurveVec3 => member,
                    ChannelSource::Vec4 => format!("{member}.rgb"),
                    ChannelSource::Texture => format!("{lookup}.rgb"),
                };
                format!("vec3 {local} = {value};")
            };
            constructor.add_main_snippet(snippet);
        }
    }
}

fn channel_default(property: ShadingProperty) -> &'static str {
    match property {
        ShadingProperty::Luminosity => "vec3(0.0)",
        _ => "vec3(1.0)",
    }
}

fn input_attribute_snippet(attribute: InputFragmentAttribute) -> &'static str {
    match attribute {
        InputFragmentAttribute::Normal => "color = normalize(out_world_normal) * 0.5 + 0.5;",
        InputFragmentAttribute::TexCoord => "color = vec3(out_uv, 0.0);",
    }
}

fn emit_light(
    constructor: &mut ShaderConstructor,
    block: BlockId,
    index: usize,
    desc: &UberLightDesc,
) {
    let prefix = format!("light{index}");
    let kind = desc.kind;
    let mut body = vec![format!("// {prefix}: {}", kind.name())];

    match kind {
        UberLightKind::Ambient => {
            constructor.add_block_member(block, GlslType::Vec4, &format!("{prefix}_ambient_color"), None);
            body.push(format!("color += {prefix}_ambient_color.rgb * material_ambient;"));
            constructor.add_main_snippet(body.join("\n"));
            return;
        }
        UberLightKind::ShProjection => {
            body.push(format!("color += out_{prefix}_sh_color * material_diffuse;"));
            constructor.add_main_snippet(body.join("\n"));
            return;
        }
        _ => {}
    }

    constructor.add_block_member(block, GlslType::Vec4, &format!("{prefix}_diffuse"), None);
    if kind.has_direction() {
        constructor.add_block_member(block, GlslType::Vec3, &format!("{prefix}_direction"), None);
    }
    if kind.has_location() {
        constructor.add_block_member(block, GlslType::Vec3, &format!("{prefix}_location"), None);
    }
    if kind == UberLightKind::PhongSpot {
        constructor.add_block_member(block, GlslType::Float, &format!("{prefix}_cone_angle"), None);
        constructor.add_block_member(block, GlslType::Float, &format!("{prefix}_edge_angle"), None);
    }

    body.push("{".into());
    if kind.has_location() {
        body.push(format!(
            "    vec3 light_to_fragment = out_world_vertex - {prefix}_location;"
        ));
        body.push("    float light_distance = length(light_to_fragment);".into());
        body.push("    vec3 to_light = -light_to_fragment / max(light_distance, 0.0001);".into());
    } else {
        body.push(format!("    vec3 to_light = normalize(-{prefix}_direction);"));
    }
    body.push("    float n_dot_l = dot(normal, to_light);".into());

    let attenuation = if kind.has_location() {
        match desc.falloff {
            LightFalloff::Off => "1.0".to_string(),
            LightFalloff::Linear => {
                constructor.add_block_member(block, GlslType::Float, &format!("{prefix}_range"), None);
                format!("attenuation_linear(light_distance, {prefix}_range)")
            }
            LightFalloff::InverseSquare => "attenuation_inverse_square(light_distance)".to_string(),
            LightFalloff::Custom => {
                constructor.add_block_member(
                    block,
                    GlslType::Vec3,
                    &format!("{prefix}_attenuations"),
                    None,
                );
                format!("attenuation_custom(light_distance, {prefix}_attenuations)")
            }
        }
    } else {
        "1.0".to_string()
    };
    body.push(format!("    float attenuation = {attenuation};"));
    if kind == UberLightKind::PhongSpot {
        body.push(format!(
            "    attenuation *= spot_factor(light_to_fragment, {prefix}_direction, {prefix}_cone_angle, {prefix}_edge_angle);"
        ));
    }

    if desc.samples_shadow_map() {
        emit_shadow(constructor, block, &prefix, desc, &mut body);
    } else {
        body.push("    float visibility = 1.0;".into());
    }

    body.push(format!(
        "    vec3 light_color = visibility * attenuation * {prefix}_diffuse.rgb;"
    ));
    body.push("    color += lambert_diffuse(normal, to_light) * light_color * material_diffuse;".into());
    if kind.is_phong() {
        body.push(
            "    color += phong_specular(normal, to_light, to_eye, material_shininess) * light_color * material_specular;"
                .into(),
        );
    }
    body.push("}".into());
    constructor.add_main_snippet(body.join("\n"));
}

fn emit_shadow(
    constructor: &mut ShaderConstructor,
    block: BlockId,
    prefix: &str,
    desc: &UberLightDesc,
    body: &mut Vec<String>,
) {
    let vsm = desc.shadow_map_algorithm == ShadowMapAlgorithm::Vsm;
    let texture = if vsm {
        format!("{prefix}_shadow_map_color")
    } else {
        format!("{prefix}_shadow_map_depth")
    };
    let ty = desc.shadow_texture_type();
    constructor.add_texture(ty, &texture);
    let sample = |coord: &str| {
        format!("    vec4 shadow_sample = {};", texture_lookup(ty, &texture, coord))
    };

    if desc.kind.is_point() {
        constructor.add_block_member(block, GlslType::Float, &format!("{prefix}_near_plane"), None);
        constructor.add_block_member(block, GlslType::Float, &format!("{prefix}_far_near_diff"), None);
        match desc.point_light_shadow_algorithm {
            PointLightShadowAlgorithm::CubeMap => {
                body.push(format!(
                    "    float fragment_depth = cube_map_depth(light_to_fragment, {prefix}_near_plane, {prefix}_far_near_diff);"
                ));
                body.push(sample("light_to_fragment"));
            }
            PointLightShadowAlgorithm::DualParaboloid => {
                constructor.add_block_member(block, GlslType::Mat4, &format!("{prefix}_view"), None);
                body.push(format!(
                    "    vec3 paraboloid = dual_paraboloid_coord(({prefix}_view * vec4(out_world_vertex, 1.0)).xyz, {prefix}_near_plane, {prefix}_far_near_diff);"
                ));
                body.push("    float fragment_depth = paraboloid.z;".into());
                body.push(sample("paraboloid.xy"));
            }
        }
    } else {
        body.push(format!(
            "    vec3 shadow_coord = out_{prefix}_shadow_coord.xyz / out_{prefix}_shadow_coord.w;"
        ));
        body.push("    float fragment_depth = shadow_coord.z;".into());
        body.push(sample("shadow_coord.xy"));
    }

    if vsm {
        constructor.add_block_member(block, GlslType::Float, "max_variance", None);
        constructor.add_block_member(block, GlslType::Float, &format!("{prefix}_vsm_cutoff"), None);
        constructor.add_block_member(
            block,
            GlslType::Float,
            &format!("{prefix}_vsm_min_variance"),
            None,
        );
        body.push(format!(
            "    float visibility = shadow_vsm(shadow_sample.rg, fragment_depth, {prefix}_vsm_cutoff, {prefix}_vsm_min_variance, max_variance);"
        ));
    } else {
        let bias = match desc.shadow_map_bias {
            ShadowMapBias::None => "0.0",
            ShadowMapBias::Constant => "shadow_bias_constant()",
            ShadowMapBias::Adaptive => "shadow_bias_adaptive(n_dot_l)",
            ShadowMapBias::AdaptiveFast => "shadow_bias_adaptive_fast(n_dot_l)",
        };
        body.push(format!(
            "    float visibility = shadow_plain(shadow_sample.r, fragment_depth, {bias});"
        ));
    }
}

impl Drop for FragmentUberComposer {
    fn drop(&mut self) {
        if let Some(shader) = self.shader.take() {
            self.context.destroy_shader(shader);
        }
    }
}

impl std::fmt::Debug for FragmentUberComposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FragmentUberComposer")
            .field("channels", &self.channels)
            .field("items", &self.items)
            .field("inputs", &self.inputs)
            .field("shader", &self.shader)
            .field("dirty", &self.dirty)
            .finish()
    }
}
