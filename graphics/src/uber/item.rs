//! Items of an uber program and where their uniforms live.

use std::collections::HashMap;

use ragl_core::material::InputFragmentAttribute;

use crate::backend::{BlockVariable, ProgramReflection};
use crate::shader::UberLightDesc;

use super::properties::{ItemProperty, PropertyValue, TextureBinding};

/// Where a uniform lives in a linked program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformLocation {
    /// Member of a uniform block, by block index in reflection order.
    Block {
        /// Index into the program's uniform blocks.
        block: usize,
        /// Offset and size inside the block.
        variable: BlockVariable,
    },
    /// Free sampler uniform.
    Sampler(u32),
}

impl UniformLocation {
    /// Look up a block member by name across all blocks of a program.
    pub fn find_block_member(reflection: &ProgramReflection, name: &str) -> Option<Self> {
        reflection
            .blocks()
            .iter()
            .enumerate()
            .find_map(|(block, info)| {
                info.variable(name)
                    .map(|variable| Self::Block { block, variable })
            })
    }

    /// Look up a texture uniform by name. Its sampler shares the unit.
    pub fn find_sampler(reflection: &ProgramReflection, name: &str) -> Option<Self> {
        reflection.uniform_location(name).map(Self::Sampler)
    }
}

/// What an item contributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UberItemKind {
    /// Color from an interpolated vertex attribute.
    InputFragmentAttribute(InputFragmentAttribute),
    /// A light.
    Light(UberLightDesc),
}

/// One item of an uber program.
///
/// Locations are reset and re-resolved on every link; values survive links
/// and are re-applied to the new uniform buffers.
#[derive(Debug, Clone)]
pub struct UberItem {
    kind: UberItemKind,
    locations: HashMap<ItemProperty, UniformLocation>,
    values: HashMap<ItemProperty, PropertyValue>,
}

impl UberItem {
    pub(crate) fn new(kind: UberItemKind) -> Self {
        Self {
            kind,
            locations: HashMap::new(),
            values: HashMap::new(),
        }
    }

    /// Get the item kind.
    pub fn kind(&self) -> UberItemKind {
        self.kind
    }

    /// Get the light descriptor of a light item.
    pub fn light(&self) -> Option<&UberLightDesc> {
        match &self.kind {
            UberItemKind::Light(desc) => Some(desc),
            UberItemKind::InputFragmentAttribute(_) => None,
        }
    }

    /// Where a property lives in the linked program, if it is exposed.
    pub fn location(&self, property: ItemProperty) -> Option<UniformLocation> {
        self.locations.get(&property).copied()
    }

    /// Last value set for a property.
    pub fn value(&self, property: ItemProperty) -> Option<&PropertyValue> {
        self.values.get(&property)
    }

    /// Shadow map stored for a texture property.
    pub fn texture(&self, property: ItemProperty) -> Option<TextureBinding> {
        self.values.get(&property).and_then(PropertyValue::as_texture)
    }

    pub(crate) fn set_value(&mut self, property: ItemProperty, value: PropertyValue) {
        self.values.insert(property, value);
    }

    pub(crate) fn values(&self) -> impl Iterator<Item = (ItemProperty, &PropertyValue)> {
        self.values.iter().map(|(property, value)| (*property, value))
    }

    /// Re-resolve every `light{index}_*` uniform against a linked program.
    pub(crate) fn resolve(&mut self, index: usize, reflection: &ProgramReflection) {
        self.locations.clear();
        for property in ItemProperty::ALL {
            let name = property.uniform_name(index);
            let location = if property.is_texture() {
                UniformLocation::find_sampler(reflection, &name)
            } else {
                UniformLocation::find_block_member(reflection, &name)
            };
            if let Some(location) = location {
                self.locations.insert(property, location);
            }
        }
        log::trace!(
            "Uber item {} resolved {} of {} properties",
            index,
            self.locations.len(),
            ItemProperty::ALL.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::UniformBlockInfo;
    use crate::shader::UberLightKind;

    fn reflection() -> ProgramReflection {
        ProgramReflection::new()
            .with_block(
                UniformBlockInfo::new("Vertex", 1)
                    .with_variable("light0_depth_vp", BlockVariable { offset: 0, size: 64 }),
            )
            .with_block(
                UniformBlockInfo::new("Fragment", 0)
                    .with_variable("light0_diffuse", BlockVariable { offset: 0, size: 16 })
                    .with_variable("light1_diffuse", BlockVariable { offset: 16, size: 16 }),
            )
            .with_uniform("light0_shadow_map_depth", 3)
    }

    #[test]
    fn test_resolve_searches_all_blocks() {
        let mut item = UberItem::new(UberItemKind::Light(UberLightDesc::new(
            UberLightKind::LambertDirectional,
        )));
        item.resolve(0, &reflection());

        assert_eq!(
            item.location(ItemProperty::DepthViewProjection),
            Some(UniformLocation::Block {
                block: 0,
                variable: BlockVariable { offset: 0, size: 64 }
            })
        );
        assert_eq!(
            item.location(ItemProperty::Diffuse),
            Some(UniformLocation::Block {
                block: 1,
                variable: BlockVariable { offset: 0, size: 16 }
            })
        );
        assert_eq!(
            item.location(ItemProperty::ShadowMapDepth),
            Some(UniformLocation::Sampler(3))
        );
        assert_eq!(item.location(ItemProperty::Location), None);
    }

    #[test]
    fn test_index_selects_uniforms() {
        let mut item = UberItem::new(UberItemKind::Light(UberLightDesc::new(
            UberLightKind::LambertDirectional,
        )));
        item.resolve(1, &reflection());
        assert!(matches!(
            item.location(ItemProperty::Diffuse),
            Some(UniformLocation::Block { block: 1, variable }) if variable.offset == 16
        ));
        assert_eq!(item.location(ItemProperty::ShadowMapDepth), None);
    }
}
