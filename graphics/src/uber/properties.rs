//! Settable uber program properties and their uniform encoding.

use ragl_core::handle::{SamplerHandle, TextureHandle};
use ragl_core::math::{mat4_to_cols_array, Mat4};

use crate::backend::BlockVariable;

/// Program-wide property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeneralProperty {
    /// World-space camera location (`vec3`, uploaded as `vec4` with w = 1).
    CameraLocation,
    /// Far minus near plane of a paraboloid or cube shadow pass.
    FarNearPlaneDiff,
    /// Flip of the light-space z axis for the second paraboloid hemisphere.
    FlipZ,
    /// Near plane of a paraboloid or cube shadow pass.
    NearPlane,
    /// View-projection matrix.
    ViewProjection,
    /// Upper variance clamp of variance shadow maps. Written at `rendering_start`.
    VsmMaxVariance,
}

impl GeneralProperty {
    /// All general properties.
    pub const ALL: [GeneralProperty; 6] = [
        Self::CameraLocation,
        Self::FarNearPlaneDiff,
        Self::FlipZ,
        Self::NearPlane,
        Self::ViewProjection,
        Self::VsmMaxVariance,
    ];

    /// Name of the backing uniform.
    pub fn uniform_name(self) -> &'static str {
        match self {
            Self::CameraLocation => "world_camera",
            Self::FarNearPlaneDiff => "far_near_plane_diff",
            Self::FlipZ => "flip_z",
            Self::NearPlane => "near_plane",
            Self::ViewProjection => "vp",
            Self::VsmMaxVariance => "max_variance",
        }
    }
}

/// Per-item property. Uniforms are named `light{index}_{suffix}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemProperty {
    /// Ambient light color (sRGB, converted to linear on upload).
    AmbientColor,
    /// Diffuse light color (sRGB, converted to linear on upload).
    Diffuse,
    /// Light direction.
    Direction,
    /// Light location.
    Location,
    /// Custom attenuation coefficients.
    Attenuations,
    /// Linear falloff range.
    Range,
    /// Spot cone angle.
    ConeAngle,
    /// Spot edge angle.
    EdgeAngle,
    /// Far minus near plane of the light's shadow pass.
    FarNearDiff,
    /// Near plane of the light's shadow pass.
    NearPlane,
    /// Light view matrix (dual-paraboloid shadows).
    View,
    /// Light view-projection matrix for shadow coordinates.
    DepthViewProjection,
    /// VSM light-bleeding cutoff.
    VsmCutoff,
    /// VSM minimum variance.
    VsmMinVariance,
    /// Spherical harmonics coefficients.
    ShCoefficients,
    /// Depth shadow map (plain algorithm).
    ShadowMapDepth,
    /// Moments shadow map (VSM).
    ShadowMapColor,
}

impl ItemProperty {
    /// All item properties.
    pub const ALL: [ItemProperty; 17] = [
        Self::AmbientColor,
        Self::Diffuse,
        Self::Direction,
        Self::Location,
        Self::Attenuations,
        Self::Range,
        Self::ConeAngle,
        Self::EdgeAngle,
        Self::FarNearDiff,
        Self::NearPlane,
        Self::View,
        Self::DepthViewProjection,
        Self::VsmCutoff,
        Self::VsmMinVariance,
        Self::ShCoefficients,
        Self::ShadowMapDepth,
        Self::ShadowMapColor,
    ];

    /// Uniform name suffix.
    pub fn suffix(self) -> &'static str {
        match self {
            Self::AmbientColor => "ambient_color",
            Self::Diffuse => "diffuse",
            Self::Direction => "direction",
            Self::Location => "location",
            Self::Attenuations => "attenuations",
            Self::Range => "range",
            Self::ConeAngle => "cone_angle",
            Self::EdgeAngle => "edge_angle",
            Self::FarNearDiff => "far_near_diff",
            Self::NearPlane => "near_plane",
            Self::View => "view",
            Self::DepthViewProjection => "depth_vp",
            Self::VsmCutoff => "vsm_cutoff",
            Self::VsmMinVariance => "vsm_min_variance",
            Self::ShCoefficients => "sh_coeffs",
            Self::ShadowMapDepth => "shadow_map_depth",
            Self::ShadowMapColor => "shadow_map_color",
        }
    }

    /// Name of the uniform backing this property for item `index`.
    pub fn uniform_name(self, index: usize) -> String {
        format!("light{index}_{}", self.suffix())
    }

    /// Whether the property is a shadow map bound at `rendering_start`.
    pub fn is_texture(self) -> bool {
        matches!(self, Self::ShadowMapDepth | Self::ShadowMapColor)
    }

    /// Whether the value is an sRGB color.
    pub fn is_color(self) -> bool {
        matches!(self, Self::AmbientColor | Self::Diffuse)
    }
}

/// A texture view plus optional sampler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureBinding {
    /// Texture to bind.
    pub texture: TextureHandle,
    /// Sampler, or the texture's own state.
    pub sampler: Option<SamplerHandle>,
}

/// Value of a general or item property.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// Scalar.
    Float(f32),
    /// Three components.
    Vec3([f32; 3]),
    /// Four components.
    Vec4([f32; 4]),
    /// Column-major matrix.
    Mat4(Mat4),
    /// Array of `vec3`, padded to 16 bytes per element on upload.
    Vec3Array(Vec<[f32; 3]>),
    /// Texture bound to a sampler uniform.
    Texture(TextureBinding),
}

impl PropertyValue {
    /// Variant name for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Float(_) => "float",
            Self::Vec3(_) => "vec3",
            Self::Vec4(_) => "vec4",
            Self::Mat4(_) => "mat4",
            Self::Vec3Array(_) => "vec3[]",
            Self::Texture(_) => "texture",
        }
    }

    /// Get the texture binding, if this is a texture value.
    pub fn as_texture(&self) -> Option<TextureBinding> {
        match self {
            Self::Texture(binding) => Some(*binding),
            _ => None,
        }
    }

    /// Encode for a std140 block member of `variable.size` bytes.
    ///
    /// Floats are splatted over vector members, `vec3` values fill a `vec4`
    /// member with w = 1 and `vec4` values truncate into a `vec3` member.
    /// Returns `None` for combinations that have no sensible meaning.
    pub fn encode(&self, variable: BlockVariable) -> Option<Vec<u8>> {
        let target = (variable.size / 4) as usize;
        let floats: Vec<f32> = match self {
            Self::Float(value) if target <= 4 => vec![*value; target],
            Self::Vec3(value) => match target {
                3 => value.to_vec(),
                4 => vec![value[0], value[1], value[2], 1.0],
                _ => return None,
            },
            Self::Vec4(value) => match target {
                3 | 4 => value[..target].to_vec(),
                _ => return None,
            },
            Self::Mat4(matrix) if target == 16 => mat4_to_cols_array(matrix).to_vec(),
            Self::Vec3Array(values) => {
                let mut floats: Vec<f32> = values
                    .iter()
                    .flat_map(|v| [v[0], v[1], v[2], 0.0])
                    .collect();
                floats.resize(target, 0.0);
                floats
            }
            _ => return None,
        };
        Some(bytemuck::cast_slice(&floats).to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(size: u32) -> BlockVariable {
        BlockVariable { offset: 0, size }
    }

    fn floats(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes(chunk.try_into().unwrap()))
            .collect()
    }

    #[test]
    fn test_item_uniform_names() {
        assert_eq!(ItemProperty::Diffuse.uniform_name(3), "light3_diffuse");
        assert_eq!(
            ItemProperty::DepthViewProjection.uniform_name(0),
            "light0_depth_vp"
        );
        assert!(ItemProperty::ShadowMapColor.is_texture());
        assert!(!ItemProperty::View.is_texture());
    }

    #[test]
    fn test_vec3_fills_vec4_with_one() {
        let bytes = PropertyValue::Vec3([1.0, 2.0, 3.0]).encode(var(16)).unwrap();
        assert_eq!(floats(&bytes), vec![1.0, 2.0, 3.0, 1.0]);
    }

    #[test]
    fn test_float_splat_and_truncation() {
        let bytes = PropertyValue::Float(0.5).encode(var(4)).unwrap();
        assert_eq!(floats(&bytes), vec![0.5]);
        let bytes = PropertyValue::Vec4([1.0, 2.0, 3.0, 4.0]).encode(var(12)).unwrap();
        assert_eq!(floats(&bytes), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_vec3_array_padding() {
        let value = PropertyValue::Vec3Array(vec![[1.0, 1.0, 1.0], [2.0, 2.0, 2.0]]);
        let bytes = value.encode(var(64)).unwrap();
        let floats = floats(&bytes);
        assert_eq!(floats.len(), 16);
        assert_eq!(&floats[4..8], &[2.0, 2.0, 2.0, 0.0]);
        assert_eq!(&floats[8..], &[0.0; 8]);
    }

    #[test]
    fn test_mismatches() {
        assert!(PropertyValue::Float(1.0).encode(var(64)).is_none());
        assert!(PropertyValue::Mat4(Mat4::identity()).encode(var(16)).is_none());
        let texture = PropertyValue::Texture(TextureBinding {
            texture: TextureHandle::from_raw(1),
            sampler: None,
        });
        assert!(texture.encode(var(4)).is_none());
    }
}
