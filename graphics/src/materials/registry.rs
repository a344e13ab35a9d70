//! Cache of uber programs keyed by material structure and scene lights.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use ragl_core::material::{
    AttachmentKind, Material, MaterialType, Shading, ShadingProperty, ShadingPropertyAttachment,
};
use ragl_core::profiling::{profile_function, profile_plot};
use ragl_core::scene::{Scene, SceneLightType};

use crate::backend::GpuContext;
use crate::config::MaterialsConfig;
use crate::error::GraphicsError;
use crate::shader::{ChannelSource, UberLightDesc, UberLightKind};
use crate::uber::UberProgram;

use super::special::SpecialMaterial;

/// An uber program handed out by the registry.
pub type SharedUberProgram = Arc<Mutex<UberProgram>>;

/// A special material and the program rendering it.
#[derive(Debug, Clone)]
pub struct SpecialMaterialEntry {
    /// Material to put on mesh passes.
    pub material: Arc<Material>,
    /// Program rendering it.
    pub program: SharedUberProgram,
}

/// Uber light kind for a material shading and scene light type.
///
/// # Panics
///
/// Panics for combinations no uber light implements (Lambert spot lights)
/// and for shadings without lighting.
pub fn resolve_light_kind(shading: Shading, light_type: SceneLightType) -> UberLightKind {
    match (shading, light_type) {
        (Shading::Lambert | Shading::Phong, SceneLightType::Ambient) => UberLightKind::Ambient,
        (Shading::Lambert, SceneLightType::Directional) => UberLightKind::LambertDirectional,
        (Shading::Lambert, SceneLightType::Point) => UberLightKind::LambertPoint,
        (Shading::Phong, SceneLightType::Directional) => UberLightKind::PhongDirectional,
        (Shading::Phong, SceneLightType::Point) => UberLightKind::PhongPoint,
        (Shading::Phong, SceneLightType::Spot) => UberLightKind::PhongSpot,
        (shading, light_type) => {
            panic!("{shading:?} shading does not support {light_type:?} lights")
        }
    }
}

type ForcedKinds = [Option<AttachmentKind>; ShadingProperty::COUNT];

struct RegistryEntry {
    material: Material,
    lights: Vec<UberLightDesc>,
    use_shadow_maps: bool,
    forced: ForcedKinds,
    program: SharedUberProgram,
}

impl RegistryEntry {
    fn matches(
        &self,
        material: &Material,
        lights: &[UberLightDesc],
        use_shadow_maps: bool,
        forced: &ForcedKinds,
    ) -> bool {
        self.material.is_a_match(material)
            && (!material.does_scene_matter() || self.lights == lights)
            && self.use_shadow_maps == use_shadow_maps
            && self.forced == *forced
    }
}

/// Bakes and caches uber programs for materials.
///
/// Lookups are a linear scan. A hit requires a structurally equal material
/// ([`Material::is_a_match`]), the same light items for scene-dependent
/// shadings, the same shadow flag and the same forced attachment kinds.
/// Cached programs are never modified to fit another material.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use ragl_core::material::{Material, Shading};
/// use ragl_core::scene::{Scene, SceneLight, SceneLightType};
/// use ragl_graphics::backend::DummyContext;
/// use ragl_graphics::config::MaterialsConfig;
/// use ragl_graphics::materials::MaterialsRegistry;
///
/// let context = Arc::new(DummyContext::new());
/// let mut registry = MaterialsRegistry::new(context, MaterialsConfig::default()).unwrap();
/// let scene = Scene::new("sun").with_light(SceneLight::new("sun", SceneLightType::Directional));
/// let material = Material::new("brick").with_shading(Shading::Phong);
///
/// let first = registry.get_uber(&material, Some(&scene), false).unwrap();
/// let second = registry.get_uber(&material, Some(&scene), false).unwrap();
/// assert!(Arc::ptr_eq(&first, &second));
/// assert_eq!(first.lock().item_count(), 1);
/// ```
pub struct MaterialsRegistry {
    context: Arc<dyn GpuContext>,
    config: MaterialsConfig,
    entries: Vec<RegistryEntry>,
    forced: [Option<ShadingPropertyAttachment>; ShadingProperty::COUNT],
    special: HashMap<SpecialMaterial, SpecialMaterialEntry>,
}

impl MaterialsRegistry {
    /// Create a registry, baking the special materials unless disabled.
    pub fn new(context: Arc<dyn GpuContext>, config: MaterialsConfig) -> Result<Self, GraphicsError> {
        let mut registry = Self {
            context,
            config,
            entries: Vec::new(),
            forced: std::array::from_fn(|_| None),
            special: HashMap::new(),
        };
        if registry.config.prebake_special_materials {
            for kind in SpecialMaterial::ALL {
                registry.get_special_material(kind)?;
            }
        }
        log::debug!(
            "Materials registry ready on {} ({} special materials)",
            registry.context.name(),
            registry.special.len()
        );
        Ok(registry)
    }

    /// Get the registry configuration.
    pub fn config(&self) -> &MaterialsConfig {
        &self.config
    }

    /// Number of cached uber programs (special materials excluded).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no uber program is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the uber program for `material` lit by `scene`, baking it on a miss.
    ///
    /// A light casts shadows only if `use_shadow_maps`, the scene's shadow
    /// mapping switch and the light's own flag are all set.
    ///
    /// # Panics
    ///
    /// Panics if the scene contains a light the material's shading cannot
    /// handle (see [`resolve_light_kind`]).
    pub fn get_uber(
        &mut self,
        material: &Material,
        scene: Option<&Scene>,
        use_shadow_maps: bool,
    ) -> Result<SharedUberProgram, GraphicsError> {
        profile_function!();

        let lights = scene_light_items(material, scene, use_shadow_maps);
        let forced = self.forced_kinds();

        if let Some(entry) = self
            .entries
            .iter()
            .find(|entry| entry.matches(material, &lights, use_shadow_maps, &forced))
        {
            log::trace!("Uber cache hit for '{}' ({})", material.name(), entry.material.name());
            self.apply_overrides(&entry.program);
            return Ok(entry.program.clone());
        }

        let name = format!(
            "{} copy {} SM",
            material.name(),
            if use_shadow_maps { "with" } else { "without" }
        );
        let program = Arc::new(Mutex::new(self.bake(&name, material, &lights)?));
        log::debug!(
            "Baked uber program '{}' ({} light items, {} cached)",
            name,
            lights.len(),
            self.entries.len() + 1
        );
        self.entries.push(RegistryEntry {
            material: material.deep_copy(name),
            lights,
            use_shadow_maps,
            forced,
            program: program.clone(),
        });
        profile_plot!("uber programs", self.entries.len() as f64);
        Ok(program)
    }

    fn bake(
        &self,
        name: &str,
        material: &Material,
        lights: &[UberLightDesc],
    ) -> Result<UberProgram, GraphicsError> {
        if let MaterialType::Program(program) = material.material_type() {
            return UberProgram::from_existing_program(self.context.clone(), name, program);
        }

        let channels = ShadingProperty::ALL.map(|property| {
            let attachment = self.forced[property.index()]
                .as_ref()
                .unwrap_or_else(|| material.attachment(property));
            ChannelSource::from(attachment.kind())
        });
        let mut uber = UberProgram::new(self.context.clone(), name, &self.config.uber, channels);

        match material.shading() {
            Shading::None => {}
            Shading::InputFragmentAttribute => {
                uber.add_input_fragment_attribute_item(material.input_fragment_attribute());
            }
            Shading::Lambert | Shading::Phong => {
                for desc in lights {
                    uber.add_light_item(*desc);
                }
            }
        }
        for property in ShadingProperty::ALL {
            uber.set_channel_override(property, self.forced[property.index()].clone());
        }
        uber.link()?;
        Ok(uber)
    }

    fn forced_kinds(&self) -> ForcedKinds {
        self.forced
            .each_ref()
            .map(|attachment| attachment.as_ref().map(ShadingPropertyAttachment::kind))
    }

    fn apply_overrides(&self, program: &SharedUberProgram) {
        let mut program = program.lock();
        for property in ShadingProperty::ALL {
            if program.channel_override(property) != self.forced[property.index()].as_ref() {
                program.set_channel_override(property, self.forced[property.index()].clone());
            }
        }
    }

    /// Force an attachment on a shading channel of every material baked or
    /// drawn from now on.
    ///
    /// Programs baked under a different set of forced attachment kinds are
    /// not reused. Constant and curve values of the override are what
    /// `render_mesh` uploads for the channel.
    pub fn force_mesh_material_shading_property_attachment(
        &mut self,
        property: ShadingProperty,
        attachment: ShadingPropertyAttachment,
    ) {
        log::debug!("Forcing {:?} attachment on {}", attachment.kind(), property.name());
        self.forced[property.index()] = Some(attachment);
    }

    /// Stop forcing an attachment on a shading channel.
    pub fn clear_forced_shading_property_attachment(&mut self, property: ShadingProperty) {
        self.forced[property.index()] = None;
    }

    /// Get the forced attachment of a channel.
    pub fn forced_shading_property_attachment(
        &self,
        property: ShadingProperty,
    ) -> Option<&ShadingPropertyAttachment> {
        self.forced[property.index()].as_ref()
    }

    /// Get a special material, baking it on first use.
    pub fn get_special_material(
        &mut self,
        kind: SpecialMaterial,
    ) -> Result<SpecialMaterialEntry, GraphicsError> {
        if let Some(entry) = self.special.get(&kind) {
            return Ok(entry.clone());
        }

        let entry = match kind.build_program(&self.context, &self.config.uber)? {
            Some(program) => SpecialMaterialEntry {
                material: Arc::new(Material::from_program(kind.name(), program)),
                program: Arc::new(Mutex::new(UberProgram::adopt_program(
                    self.context.clone(),
                    kind.name(),
                    program,
                )?)),
            },
            None => {
                let material = kind.general_material().ok_or_else(|| {
                    GraphicsError::Internal(format!("special material '{}' has no definition", kind.name()))
                })?;
                let program = self.bake(kind.name(), &material, &[])?;
                SpecialMaterialEntry {
                    material: Arc::new(material),
                    program: Arc::new(Mutex::new(program)),
                }
            }
        };
        self.special.insert(kind, entry.clone());
        Ok(entry)
    }

    /// Drop every cached uber program. Special materials are kept.
    pub fn clear(&mut self) {
        log::debug!("Clearing {} cached uber programs", self.entries.len());
        self.entries.clear();
    }
}

/// Light items a material needs for `scene`, in scene order.
fn scene_light_items(
    material: &Material,
    scene: Option<&Scene>,
    use_shadow_maps: bool,
) -> Vec<UberLightDesc> {
    let Some(scene) = scene.filter(|_| material.does_scene_matter()) else {
        return Vec::new();
    };
    scene
        .lights
        .iter()
        .map(|light| {
            let kind = resolve_light_kind(material.shading(), light.light_type);
            let is_shadow_caster =
                use_shadow_maps && scene.shadow_mapping_enabled && light.uses_shadow_map;
            UberLightDesc::from_scene_light(kind, light, is_shadow_caster)
        })
        .collect()
}

impl std::fmt::Debug for MaterialsRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaterialsRegistry")
            .field("context", &self.context.name())
            .field("entries", &self.entries.len())
            .field("special", &self.special.len())
            .field("forced", &self.forced_kinds())
            .finish()
    }
}
