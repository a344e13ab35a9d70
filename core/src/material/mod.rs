//! CPU-side mesh materials.
//!
//! A [`Material`] names a shading algorithm and, for every
//! [`ShadingProperty`] channel, where the channel value comes from
//! ([`ShadingPropertyAttachment`]). Materials are immutable once built and
//! are shared via `Arc`; two comparisons matter to the renderer:
//!
//! - **identity** (`Arc::ptr_eq`) selects which mesh layer passes a draw
//!   call covers;
//! - **structure** ([`Material::is_a_match`]) decides whether two materials
//!   can share one uber program. Only the *kind* of each attachment is
//!   compared, since constant and curve values are uploaded as uniforms and
//!   textures are bound per draw.

use std::sync::Arc;

use crate::curve::Curve;
use crate::handle::{ProgramHandle, SamplerHandle, TextureHandle};

/// Shading algorithm of a general material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Shading {
    /// No shading. The uber program carries no items.
    None,
    /// Color is an interpolated vertex attribute (normal or texcoord preview).
    InputFragmentAttribute,
    /// Diffuse-only lighting.
    #[default]
    Lambert,
    /// Diffuse plus specular lighting.
    Phong,
}

/// Vertex attribute forwarded to the fragment stage for
/// [`Shading::InputFragmentAttribute`] materials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InputFragmentAttribute {
    /// Object-space normal.
    #[default]
    Normal,
    /// First texture coordinate set.
    TexCoord,
}

/// A shading channel of a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShadingProperty {
    /// Ambient reflectance.
    Ambient,
    /// Diffuse reflectance.
    Diffuse,
    /// Self-illumination.
    Luminosity,
    /// Specular exponent.
    Shininess,
    /// Specular reflectance.
    Specular,
}

impl ShadingProperty {
    /// Number of shading channels.
    pub const COUNT: usize = 5;

    /// All channels in declaration order.
    pub const ALL: [ShadingProperty; Self::COUNT] = [
        Self::Ambient,
        Self::Diffuse,
        Self::Luminosity,
        Self::Shininess,
        Self::Specular,
    ];

    /// Position of this channel in [`ShadingProperty::ALL`].
    pub fn index(self) -> usize {
        match self {
            Self::Ambient => 0,
            Self::Diffuse => 1,
            Self::Luminosity => 2,
            Self::Shininess => 3,
            Self::Specular => 4,
        }
    }

    /// Lower-case name used to build uniform names (`diffuse_material`, ...).
    pub fn name(self) -> &'static str {
        match self {
            Self::Ambient => "ambient",
            Self::Diffuse => "diffuse",
            Self::Luminosity => "luminosity",
            Self::Shininess => "shininess",
            Self::Specular => "specular",
        }
    }
}

/// A texture plus the sampler used to read it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialTexture {
    /// Texture view to sample.
    pub texture: TextureHandle,
    /// Sampler state.
    pub sampler: SamplerHandle,
}

impl MaterialTexture {
    /// Create a texture attachment.
    pub fn new(texture: TextureHandle, sampler: SamplerHandle) -> Self {
        Self { texture, sampler }
    }
}

/// Where the value of a shading channel comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ShadingPropertyAttachment {
    /// Channel unused.
    None,
    /// Constant scalar.
    Float(f32),
    /// Constant RGBA color (sRGB for ambient/diffuse).
    Vec4([f32; 4]),
    /// Scalar sampled from a curve.
    CurveFloat(Arc<Curve>),
    /// RGB triple sampled from three curves.
    CurveVec3([Arc<Curve>; 3]),
    /// Texture sampled with the first UV set.
    Texture(MaterialTexture),
}

/// Discriminant of a [`ShadingPropertyAttachment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentKind {
    /// See [`ShadingPropertyAttachment::None`].
    None,
    /// See [`ShadingPropertyAttachment::Float`].
    Float,
    /// See [`ShadingPropertyAttachment::Vec4`].
    Vec4,
    /// See [`ShadingPropertyAttachment::CurveFloat`].
    CurveFloat,
    /// See [`ShadingPropertyAttachment::CurveVec3`].
    CurveVec3,
    /// See [`ShadingPropertyAttachment::Texture`].
    Texture,
}

impl ShadingPropertyAttachment {
    /// Get the attachment kind.
    pub fn kind(&self) -> AttachmentKind {
        match self {
            Self::None => AttachmentKind::None,
            Self::Float(_) => AttachmentKind::Float,
            Self::Vec4(_) => AttachmentKind::Vec4,
            Self::CurveFloat(_) => AttachmentKind::CurveFloat,
            Self::CurveVec3(_) => AttachmentKind::CurveVec3,
            Self::Texture(_) => AttachmentKind::Texture,
        }
    }

    /// Clone the attachment, duplicating curve data instead of sharing it.
    pub fn deep_copy(&self) -> Self {
        match self {
            Self::CurveFloat(curve) => Self::CurveFloat(Arc::new(Curve::clone(curve))),
            Self::CurveVec3(curves) => Self::CurveVec3(
                curves
                    .each_ref()
                    .map(|curve| Arc::new(Curve::clone(curve))),
            ),
            other => other.clone(),
        }
    }
}

/// Whether a material is shaded by the uber machinery or by a caller program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MaterialType {
    /// Shaded by a composed uber program.
    #[default]
    General,
    /// Shaded by an already linked, caller-supplied program.
    Program(ProgramHandle),
}

/// An immutable mesh material.
///
/// # Example
///
/// ```
/// use ragl_core::material::*;
///
/// let material = Material::new("brick")
///     .with_shading(Shading::Phong)
///     .with_attachment(ShadingProperty::Diffuse, ShadingPropertyAttachment::Vec4([0.8, 0.2, 0.1, 1.0]))
///     .with_attachment(ShadingProperty::Shininess, ShadingPropertyAttachment::Float(32.0));
/// assert!(material.does_scene_matter());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    name: String,
    material_type: MaterialType,
    shading: Shading,
    attachments: [ShadingPropertyAttachment; ShadingProperty::COUNT],
    input_fragment_attribute: InputFragmentAttribute,
}

impl Material {
    /// Create a general Lambert material with every channel unattached.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            material_type: MaterialType::General,
            shading: Shading::default(),
            attachments: std::array::from_fn(|_| ShadingPropertyAttachment::None),
            input_fragment_attribute: InputFragmentAttribute::default(),
        }
    }

    /// Create a material that renders with a caller-supplied linked program.
    pub fn from_program(name: impl Into<String>, program: ProgramHandle) -> Self {
        Self {
            material_type: MaterialType::Program(program),
            shading: Shading::None,
            ..Self::new(name)
        }
    }

    /// Set the shading algorithm.
    #[must_use]
    pub fn with_shading(mut self, shading: Shading) -> Self {
        self.shading = shading;
        self
    }

    /// Attach a value source to a shading channel.
    #[must_use]
    pub fn with_attachment(
        mut self,
        property: ShadingProperty,
        attachment: ShadingPropertyAttachment,
    ) -> Self {
        self.attachments[property.index()] = attachment;
        self
    }

    /// Set the attribute forwarded by [`Shading::InputFragmentAttribute`].
    #[must_use]
    pub fn with_input_fragment_attribute(mut self, attribute: InputFragmentAttribute) -> Self {
        self.input_fragment_attribute = attribute;
        self
    }

    /// Get the material name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the material type.
    pub fn material_type(&self) -> MaterialType {
        self.material_type
    }

    /// Get the shading algorithm.
    pub fn shading(&self) -> Shading {
        self.shading
    }

    /// Get the attachment of a shading channel.
    pub fn attachment(&self, property: ShadingProperty) -> &ShadingPropertyAttachment {
        &self.attachments[property.index()]
    }

    /// Get the forwarded attribute for input-fragment-attribute shading.
    pub fn input_fragment_attribute(&self) -> InputFragmentAttribute {
        self.input_fragment_attribute
    }

    /// Whether the shader for this material depends on the scene lights.
    pub fn does_scene_matter(&self) -> bool {
        match self.material_type {
            MaterialType::Program(_) => false,
            MaterialType::General => matches!(self.shading, Shading::Lambert | Shading::Phong),
        }
    }

    /// Structural equality: same type, shading and attachment kinds.
    ///
    /// Names and attachment values are ignored.
    pub fn is_a_match(&self, other: &Material) -> bool {
        if self.material_type != other.material_type {
            return false;
        }
        if let MaterialType::Program(_) = self.material_type {
            return true;
        }
        if self.shading != other.shading {
            return false;
        }
        if self.shading == Shading::InputFragmentAttribute
            && self.input_fragment_attribute != other.input_fragment_attribute
        {
            return false;
        }
        self.attachments
            .iter()
            .zip(other.attachments.iter())
            .all(|(a, b)| a.kind() == b.kind())
    }

    /// Deep-copy the material under a new name.
    pub fn deep_copy(&self, name: impl Into<String>) -> Material {
        Material {
            name: name.into(),
            material_type: self.material_type,
            shading: self.shading,
            attachments: self.attachments.each_ref().map(|a| a.deep_copy()),
            input_fragment_attribute: self.input_fragment_attribute,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texture() -> MaterialTexture {
        MaterialTexture::new(TextureHandle::from_raw(1), SamplerHandle::from_raw(2))
    }

    #[test]
    fn test_default_material() {
        let material = Material::new("m");
        assert_eq!(material.shading(), Shading::Lambert);
        assert_eq!(material.material_type(), MaterialType::General);
        for property in ShadingProperty::ALL {
            assert_eq!(material.attachment(property).kind(), AttachmentKind::None);
        }
    }

    #[test]
    fn test_match_ignores_names_and_values() {
        let a = Material::new("a")
            .with_shading(Shading::Phong)
            .with_attachment(ShadingProperty::Diffuse, ShadingPropertyAttachment::Float(0.2));
        let b = Material::new("b")
            .with_shading(Shading::Phong)
            .with_attachment(ShadingProperty::Diffuse, ShadingPropertyAttachment::Float(0.9));
        assert!(a.is_a_match(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn test_match_detects_attachment_kind() {
        let a = Material::new("a")
            .with_attachment(ShadingProperty::Diffuse, ShadingPropertyAttachment::Texture(texture()));
        let b = Material::new("b")
            .with_attachment(ShadingProperty::Diffuse, ShadingPropertyAttachment::Vec4([1.0; 4]));
        assert!(!a.is_a_match(&b));
    }

    #[test]
    fn test_match_detects_shading_and_attribute() {
        let normals = Material::new("n").with_shading(Shading::InputFragmentAttribute);
        let uvs = Material::new("uv")
            .with_shading(Shading::InputFragmentAttribute)
            .with_input_fragment_attribute(InputFragmentAttribute::TexCoord);
        assert!(!normals.is_a_match(&uvs));
        assert!(!normals.is_a_match(&Material::new("lambert")));
    }

    #[test]
    fn test_program_materials() {
        let program = ProgramHandle::from_raw(4);
        let a = Material::from_program("a", program);
        let b = Material::from_program("b", program);
        let c = Material::from_program("c", ProgramHandle::from_raw(5));
        assert!(a.is_a_match(&b));
        assert!(!a.is_a_match(&c));
        assert!(!a.does_scene_matter());
    }

    #[test]
    fn test_scene_dependence() {
        assert!(Material::new("l").does_scene_matter());
        assert!(Material::new("p").with_shading(Shading::Phong).does_scene_matter());
        assert!(!Material::new("n").with_shading(Shading::None).does_scene_matter());
        assert!(!Material::new("i")
            .with_shading(Shading::InputFragmentAttribute)
            .does_scene_matter());
    }

    #[test]
    fn test_deep_copy_duplicates_curves() {
        let curve = Arc::new(Curve::new(1.0));
        let material = Material::new("orig").with_attachment(
            ShadingProperty::Luminosity,
            ShadingPropertyAttachment::CurveFloat(Arc::clone(&curve)),
        );
        let copy = material.deep_copy("orig copy");
        assert_eq!(copy.name(), "orig copy");
        assert!(copy.is_a_match(&material));
        match copy.attachment(ShadingProperty::Luminosity) {
            ShadingPropertyAttachment::CurveFloat(copied) => {
                assert!(!Arc::ptr_eq(copied, &curve));
                assert_eq!(**copied, *curve);
            }
            other => panic!("unexpected attachment {other:?}"),
        }
    }
}
