//! The uber program: items, composers, linked program and draw recording.

use std::collections::HashMap;
use std::sync::Arc;

use ragl_core::handle::{ProgramHandle, TextureHandle};
use ragl_core::material::{
    InputFragmentAttribute, Material, ShadingProperty, ShadingPropertyAttachment,
};
use ragl_core::math::{srgb_to_linear_rgb, srgb_to_linear_rgba, Mat4};
use ragl_core::mesh::{Mesh, MeshId, MeshStreamKind, PassDraw, StreamDrawArgs};
use ragl_core::profiling::{profile_function, profile_scope};

use crate::backend::{GpuContext, ProgramReflection};
use crate::command::{Command, CommandBuffer};
use crate::config::UberConfig;
use crate::error::GraphicsError;
use crate::present::{PresentTask, RenderTargets};
use crate::resources::UniformBlockBuffer;
use crate::shader::{
    channel_member_name, channel_texture_name, ChannelSource, FragmentUberComposer,
    UberLightDesc, VertexUberComposer,
};

use super::item::{UberItem, UberItemKind, UniformLocation};
use super::layout::{AttributeLocations, MeshLayoutCache};
use super::properties::{GeneralProperty, ItemProperty, PropertyValue};

struct Composers {
    vertex: VertexUberComposer,
    fragment: FragmentUberComposer,
}

/// Locations of one material channel.
#[derive(Debug, Clone, Copy, Default)]
struct ChannelLocations {
    member: Option<UniformLocation>,
    sampler: Option<UniformLocation>,
}

/// State between `rendering_start` and `rendering_stop`.
struct Recording {
    commands: CommandBuffer,
    outputs: Vec<TextureHandle>,
    inputs: Vec<TextureHandle>,
    material_unit_base: u32,
}

impl Recording {
    fn sample(&mut self, texture: TextureHandle) {
        if !self.inputs.contains(&texture) {
            self.inputs.push(texture);
        }
    }
}

/// A composed (or wrapped) GPU program plus everything needed to draw
/// meshes with it.
///
/// # Lifecycle
///
/// ```text
/// new ─► add_*_item (dirty) ─► link ─► rendering_start ─► render_mesh* ─► rendering_stop
///                 ▲                                                           │
///                 └───────────────────────────────────────────────────────────┘
/// ```
///
/// `rendering_start` links on demand. Property values are cached on the CPU
/// and survive relinks; setting a property the linked program does not
/// expose is a no-op.
pub struct UberProgram {
    context: Arc<dyn GpuContext>,
    name: String,
    composers: Option<Composers>,
    program: Option<ProgramHandle>,
    owns_program: bool,
    items: Vec<UberItem>,
    blocks: Vec<UniformBlockBuffer>,
    attributes: AttributeLocations,
    general_locations: HashMap<GeneralProperty, UniformLocation>,
    general_values: HashMap<GeneralProperty, PropertyValue>,
    model_location: Option<UniformLocation>,
    normal_matrix_location: Option<UniformLocation>,
    channels: [ChannelLocations; ShadingProperty::COUNT],
    channel_overrides: [Option<ShadingPropertyAttachment>; ShadingProperty::COUNT],
    layouts: MeshLayoutCache,
    recording: Option<Recording>,
    dirty: bool,
}

impl UberProgram {
    /// Create an empty uber program with one data source per shading channel.
    pub fn new(
        context: Arc<dyn GpuContext>,
        name: impl Into<String>,
        config: &UberConfig,
        channels: [ChannelSource; ShadingProperty::COUNT],
    ) -> Self {
        let name = name.into();
        let mut vertex = VertexUberComposer::new(context.clone(), config);
        let fragment = FragmentUberComposer::new(context.clone(), config, channels, &mut |request| {
            vertex.handle_request(request);
        });
        log::debug!("Created uber program '{}' with channels {:?}", name, channels);

        let mut uber = Self::empty(context, name);
        uber.composers = Some(Composers { vertex, fragment });
        uber
    }

    /// Wrap a program linked by someone else. The program is not destroyed
    /// with the uber program.
    pub fn from_existing_program(
        context: Arc<dyn GpuContext>,
        name: impl Into<String>,
        program: ProgramHandle,
    ) -> Result<Self, GraphicsError> {
        Self::wrap(context, name.into(), program, false)
    }

    /// Wrap a program and take ownership of it.
    pub fn adopt_program(
        context: Arc<dyn GpuContext>,
        name: impl Into<String>,
        program: ProgramHandle,
    ) -> Result<Self, GraphicsError> {
        Self::wrap(context, name.into(), program, true)
    }

    fn wrap(
        context: Arc<dyn GpuContext>,
        name: String,
        program: ProgramHandle,
        owned: bool,
    ) -> Result<Self, GraphicsError> {
        let reflection = context.program_reflection(program)?;
        let mut uber = Self::empty(context, name);
        uber.program = Some(program);
        uber.owns_program = owned;
        uber.dirty = false;
        uber.resolve(&reflection)?;
        log::debug!("Wrapped {} as uber program '{}'", program, uber.name);
        Ok(uber)
    }

    fn empty(context: Arc<dyn GpuContext>, name: String) -> Self {
        Self {
            layouts: MeshLayoutCache::new(context.clone()),
            context,
            name,
            composers: None,
            program: None,
            owns_program: true,
            items: Vec::new(),
            blocks: Vec::new(),
            attributes: [None; 3],
            general_locations: HashMap::new(),
            general_values: HashMap::new(),
            model_location: None,
            normal_matrix_location: None,
            channels: [ChannelLocations::default(); ShadingProperty::COUNT],
            channel_overrides: std::array::from_fn(|_| None),
            recording: None,
            dirty: true,
        }
    }

    /// Get the program name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the linked program, if any.
    pub fn program(&self) -> Option<ProgramHandle> {
        self.program
    }

    /// Whether items were added since the last link.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether the program was composed from items (as opposed to wrapped).
    pub fn is_composed(&self) -> bool {
        self.composers.is_some()
    }

    /// Get an item.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn item(&self, index: usize) -> &UberItem {
        self.check_index(index);
        &self.items[index]
    }

    /// Get all items in id order.
    pub fn items(&self) -> &[UberItem] {
        &self.items
    }

    /// Get the number of items.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Generated sources of both stages, vertex first.
    pub fn sources(&self) -> Option<(String, String)> {
        self.composers
            .as_ref()
            .map(|composers| (composers.vertex.source(), composers.fragment.source()))
    }

    fn composers_mut(&mut self) -> &mut Composers {
        assert!(
            self.recording.is_none(),
            "cannot add items to uber program '{}' while rendering",
            self.name
        );
        match self.composers.as_mut() {
            Some(composers) => composers,
            None => panic!(
                "uber program '{}' wraps an external program and takes no items",
                self.name
            ),
        }
    }

    /// Add a light. Returns its item id.
    ///
    /// # Panics
    ///
    /// Panics on wrapped programs and between `rendering_start` and
    /// `rendering_stop`.
    pub fn add_light_item(&mut self, desc: UberLightDesc) -> usize {
        let Composers { vertex, fragment } = self.composers_mut();
        let index = fragment.add_light(desc, &mut |request| {
            vertex.handle_request(request);
        });
        self.push_item(index, UberItemKind::Light(desc))
    }

    /// Add an input-attribute passthrough. Returns its item id.
    ///
    /// # Panics
    ///
    /// Same conditions as [`add_light_item`](Self::add_light_item).
    pub fn add_input_fragment_attribute_item(&mut self, attribute: InputFragmentAttribute) -> usize {
        let Composers { vertex, fragment } = self.composers_mut();
        let index = fragment.add_input_attribute_contribution(attribute, &mut |request| {
            vertex.handle_request(request);
        });
        self.push_item(index, UberItemKind::InputFragmentAttribute(attribute))
    }

    fn push_item(&mut self, index: usize, kind: UberItemKind) -> usize {
        debug_assert_eq!(index, self.items.len());
        self.items.push(UberItem::new(kind));
        self.dirty = true;
        index
    }

    /// Recompile dirty stages, link and resolve every uniform.
    ///
    /// Returns `false` without doing anything when the program is clean.
    pub fn link(&mut self) -> Result<bool, GraphicsError> {
        if !self.dirty {
            return Ok(false);
        }
        profile_function!();

        let Some(composers) = self.composers.as_mut() else {
            self.dirty = false;
            return Ok(false);
        };
        composers.vertex.recompile()?;
        composers.fragment.recompile()?;
        let shaders = [composers.vertex.shader(), composers.fragment.shader()]
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| {
                GraphicsError::Internal(format!("uber program '{}' has no shaders", self.name))
            })?;

        let linked = self.context.link_program(&shaders)?;
        if let Some(old) = self.program.replace(linked.handle) {
            self.context.destroy_program(old);
        }
        self.resolve(&linked.reflection)?;
        self.dirty = false;

        log::debug!(
            "Linked uber program '{}' as {} ({} items, {} blocks)",
            self.name,
            linked.handle,
            self.items.len(),
            self.blocks.len()
        );
        Ok(true)
    }

    /// Reset every location to absent, resolve against `reflection` and
    /// re-apply cached values.
    fn resolve(&mut self, reflection: &ProgramReflection) -> Result<(), GraphicsError> {
        profile_scope!("uber_resolve");

        self.blocks = reflection
            .blocks()
            .iter()
            .map(|block| UniformBlockBuffer::create(self.context.clone(), block))
            .collect::<Result<_, _>>()?;

        let attributes = MeshStreamKind::ALL.map(|kind| reflection.attribute_location(kind.attribute_name()));
        if attributes != self.attributes {
            self.layouts.clear();
        }
        self.attributes = attributes;

        self.general_locations = GeneralProperty::ALL
            .into_iter()
            .filter_map(|property| {
                UniformLocation::find_block_member(reflection, property.uniform_name())
                    .map(|location| (property, location))
            })
            .collect();
        self.model_location = UniformLocation::find_block_member(reflection, "model");
        self.normal_matrix_location = UniformLocation::find_block_member(reflection, "normal_matrix");

        for property in ShadingProperty::ALL {
            self.channels[property.index()] = ChannelLocations {
                member: UniformLocation::find_block_member(reflection, &channel_member_name(property)),
                sampler: UniformLocation::find_sampler(reflection, &channel_texture_name(property)),
            };
        }

        for (index, item) in self.items.iter_mut().enumerate() {
            item.resolve(index, reflection);
        }

        // Cached values go into the fresh buffers.
        for (property, value) in &self.general_values {
            if *property == GeneralProperty::VsmMaxVariance {
                continue;
            }
            if let Some(location) = self.general_locations.get(property) {
                write_value(&mut self.blocks, location, value, property.uniform_name());
            }
        }
        for (index, item) in self.items.iter().enumerate() {
            for (property, value) in item.values() {
                if let Some(location) = item.location(property) {
                    let value = linear_value(property, value);
                    write_value(&mut self.blocks, &location, &value, &property.uniform_name(index));
                }
            }
        }
        Ok(())
    }

    /// Whether the linked program exposes a general property.
    pub fn has_general_property(&self, property: GeneralProperty) -> bool {
        self.general_locations.contains_key(&property)
    }

    /// Set a program-wide property.
    ///
    /// A `vec3` camera location is uploaded as a `vec4` with w = 1. The VSM
    /// max variance is only cached here and written by `rendering_start`.
    pub fn set_shader_general_property(&mut self, property: GeneralProperty, value: PropertyValue) {
        if property != GeneralProperty::VsmMaxVariance {
            if let Some(location) = self.general_locations.get(&property) {
                write_value(&mut self.blocks, location, &value, property.uniform_name());
            }
        }
        self.general_values.insert(property, value);
    }

    /// Get the last value set for a program-wide property.
    pub fn get_shader_general_property(&self, property: GeneralProperty) -> Option<&PropertyValue> {
        self.general_values.get(&property)
    }

    /// Set a property of item `index`.
    ///
    /// Ambient and diffuse colors are sRGB and converted to linear on
    /// upload. Shadow maps are stored and bound by `rendering_start`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn set_shader_item_property(&mut self, index: usize, property: ItemProperty, value: PropertyValue) {
        self.check_index(index);
        if property.is_texture() && value.as_texture().is_none() {
            log::error!(
                "Uber program '{}': {} expects a texture, got {}",
                self.name,
                property.uniform_name(index),
                value.type_name()
            );
            return;
        }

        let item = &mut self.items[index];
        if let Some(location) = item.location(property) {
            if !property.is_texture() {
                let linear = linear_value(property, &value);
                write_value(&mut self.blocks, &location, &linear, &property.uniform_name(index));
            }
        }
        item.set_value(property, value);
    }

    /// Get the last value set for a property of item `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn get_shader_item_property(&self, index: usize, property: ItemProperty) -> Option<&PropertyValue> {
        self.check_index(index);
        self.items[index].value(property)
    }

    fn check_index(&self, index: usize) {
        assert!(
            index < self.items.len(),
            "item index {} out of range for uber program '{}' ({} items)",
            index,
            self.name,
            self.items.len()
        );
    }

    /// Replace the attachment uploaded for a channel, whatever the drawn
    /// material says. `None` restores the material's own attachment.
    pub fn set_channel_override(
        &mut self,
        property: ShadingProperty,
        attachment: Option<ShadingPropertyAttachment>,
    ) {
        self.channel_overrides[property.index()] = attachment;
    }

    /// Get the override of a channel.
    pub fn channel_override(&self, property: ShadingProperty) -> Option<&ShadingPropertyAttachment> {
        self.channel_overrides[property.index()].as_ref()
    }

    /// Whether the program is between `rendering_start` and `rendering_stop`.
    pub fn is_rendering(&self) -> bool {
        self.recording.is_some()
    }

    /// Start recording a pass into `targets`. Links first if dirty.
    ///
    /// Shadow maps of light items are bound to texture units `0..n`, material
    /// textures use the units after them.
    ///
    /// # Panics
    ///
    /// Panics if rendering already started.
    pub fn rendering_start(&mut self, targets: &RenderTargets) -> Result<(), GraphicsError> {
        assert!(
            self.recording.is_none(),
            "rendering_start called twice on uber program '{}'",
            self.name
        );
        profile_function!();

        self.link()?;
        let program = self.program.ok_or_else(|| {
            GraphicsError::Internal(format!("uber program '{}' is not linked", self.name))
        })?;

        let mut recording = Recording {
            commands: CommandBuffer::new().with_label(self.name.clone()),
            outputs: targets.outputs(),
            inputs: Vec::new(),
            material_unit_base: 0,
        };
        recording.commands.record(Command::BeginRendering {
            color_targets: targets.color.clone(),
            depth_target: targets.depth,
            viewport: targets.viewport,
            clear_color: targets.clear_color,
            clear_depth: targets.clear_depth,
        });
        recording.commands.record(Command::SetProgram(program));

        let mut unit = 0;
        for (index, item) in self.items.iter().enumerate() {
            for property in [ItemProperty::ShadowMapDepth, ItemProperty::ShadowMapColor] {
                let Some(UniformLocation::Sampler(location)) = item.location(property) else {
                    continue;
                };
                let Some(binding) = item.texture(property) else {
                    log::warn!(
                        "Uber program '{}': {} has no texture",
                        self.name,
                        property.uniform_name(index)
                    );
                    continue;
                };
                recording.commands.record(Command::BindTexture {
                    unit,
                    texture: binding.texture,
                    sampler: binding.sampler,
                });
                recording
                    .commands
                    .record(Command::SetSamplerUnit { location, unit });
                recording.sample(binding.texture);
                unit += 1;
            }
        }
        recording.material_unit_base = unit;

        if let (Some(location), Some(value)) = (
            self.general_locations.get(&GeneralProperty::VsmMaxVariance),
            self.general_values.get(&GeneralProperty::VsmMaxVariance),
        ) {
            write_value(&mut self.blocks, location, value, "max_variance");
        }
        for block in &mut self.blocks {
            block.sync(&mut recording.commands);
            block.bind(&mut recording.commands);
        }

        self.recording = Some(recording);
        Ok(())
    }

    /// Record the draws of every layer pass of `mesh` whose material is
    /// `material` (by identity), or of all passes when `material` is `None`.
    ///
    /// Curve attachments are sampled at `time`.
    ///
    /// # Panics
    ///
    /// Panics outside `rendering_start` / `rendering_stop`.
    pub fn render_mesh(
        &mut self,
        mesh: &Mesh,
        model: &Mat4,
        normal_matrix: &Mat4,
        material: Option<&Arc<Material>>,
        time: f32,
    ) -> Result<(), GraphicsError> {
        profile_scope!("render_mesh");
        let Some(recording) = self.recording.as_mut() else {
            panic!(
                "render_mesh called outside rendering_start/rendering_stop on uber program '{}'",
                self.name
            );
        };

        if let Some(location) = &self.model_location {
            write_value(&mut self.blocks, location, &PropertyValue::Mat4(*model), "model");
        }
        if let Some(location) = &self.normal_matrix_location {
            write_value(
                &mut self.blocks,
                location,
                &PropertyValue::Mat4(*normal_matrix),
                "normal_matrix",
            );
        }

        let setup = self.layouts.get_or_bake(mesh, &self.attributes)?.setup.clone();
        recording.commands.record_all(setup);

        for layer in mesh.layers() {
            for pass in layer.passes() {
                if material.is_some_and(|filter| !Arc::ptr_eq(filter, &pass.material)) {
                    continue;
                }

                for property in ShadingProperty::ALL {
                    let attachment = self.channel_overrides[property.index()]
                        .as_ref()
                        .unwrap_or_else(|| pass.material.attachment(property));
                    bind_channel(
                        &mut self.blocks,
                        recording,
                        &self.channels[property.index()],
                        property,
                        attachment,
                        time,
                    );
                }
                for block in &mut self.blocks {
                    block.sync(&mut recording.commands);
                }

                let draw = match pass.draw {
                    PassDraw::Elements(range) => match mesh.index_buffer() {
                        Some(index_buffer) => Command::DrawIndexed {
                            first: range.first,
                            count: range.count,
                            format: index_buffer.format,
                        },
                        None => Command::Draw {
                            first: range.first,
                            count: range.count,
                        },
                    },
                    PassDraw::Stream(StreamDrawArgs::Direct(range)) => Command::Draw {
                        first: range.first,
                        count: range.count,
                    },
                    PassDraw::Stream(StreamDrawArgs::Indirect { buffer, offset }) => {
                        Command::DrawIndirect { buffer, offset }
                    }
                };
                recording.commands.record(draw);
            }
        }
        Ok(())
    }

    /// Finish the pass and hand it over as a present task.
    ///
    /// # Panics
    ///
    /// Panics if rendering was not started.
    pub fn rendering_stop(&mut self) -> PresentTask {
        let Some(mut recording) = self.recording.take() else {
            panic!(
                "rendering_stop called without rendering_start on uber program '{}'",
                self.name
            );
        };
        recording.commands.record(Command::EndRendering);
        log::trace!(
            "Uber program '{}' recorded {} commands ({} draws)",
            self.name,
            recording.commands.len(),
            recording.commands.draw_count()
        );
        PresentTask {
            name: self.name.clone(),
            command_buffer: recording.commands,
            inputs: recording.inputs,
            outputs: recording.outputs,
        }
    }

    /// Drop every cached mesh layout.
    pub fn clear_mesh_cache(&mut self) {
        self.layouts.clear();
    }

    /// Drop the cached layout of one mesh. Returns whether one existed.
    pub fn forget_mesh(&mut self, mesh: MeshId) -> bool {
        self.layouts.forget(mesh)
    }

    /// Number of cached mesh layouts.
    pub fn cached_mesh_count(&self) -> usize {
        self.layouts.len()
    }

    /// Timestamp a mesh layout was baked from.
    pub fn cached_mesh_timestamp(&self, mesh: MeshId) -> Option<u64> {
        self.layouts.get(mesh).map(|layout| layout.timestamp)
    }

    /// Number of mesh layouts baked so far.
    pub fn mesh_layout_bakes(&self) -> u64 {
        self.layouts.bake_count()
    }
}

/// Convert sRGB colors to linear before upload.
fn linear_value(property: ItemProperty, value: &PropertyValue) -> PropertyValue {
    match value {
        PropertyValue::Vec3(color) if property.is_color() => {
            PropertyValue::Vec3(srgb_to_linear_rgb(*color))
        }
        PropertyValue::Vec4(color) if property.is_color() => {
            PropertyValue::Vec4(srgb_to_linear_rgba(*color))
        }
        other => other.clone(),
    }
}

fn write_value(
    blocks: &mut [UniformBlockBuffer],
    location: &UniformLocation,
    value: &PropertyValue,
    name: &str,
) {
    let UniformLocation::Block { block, variable } = *location else {
        return;
    };
    match value.encode(variable) {
        Some(bytes) => blocks[block].write(variable.offset, &bytes),
        None => log::error!(
            "Cannot store a {} value in '{}' ({} bytes)",
            value.type_name(),
            name,
            variable.size
        ),
    }
}

fn bind_channel(
    blocks: &mut [UniformBlockBuffer],
    recording: &mut Recording,
    locations: &ChannelLocations,
    property: ShadingProperty,
    attachment: &ShadingPropertyAttachment,
    time: f32,
) {
    let value = match attachment {
        ShadingPropertyAttachment::None => return,
        ShadingPropertyAttachment::Texture(texture) => {
            if let Some(UniformLocation::Sampler(location)) = locations.sampler {
                let unit = recording.material_unit_base + property.index() as u32;
                recording.commands.record(Command::BindTexture {
                    unit,
                    texture: texture.texture,
                    sampler: Some(texture.sampler),
                });
                recording
                    .commands
                    .record(Command::SetSamplerUnit { location, unit });
                recording.sample(texture.texture);
            }
            return;
        }
        ShadingPropertyAttachment::Float(value) => PropertyValue::Float(*value),
        ShadingPropertyAttachment::Vec4(value) => PropertyValue::Vec4(*value),
        ShadingPropertyAttachment::CurveFloat(curve) => PropertyValue::Float(curve.sample(time)),
        ShadingPropertyAttachment::CurveVec3(curves) => {
            PropertyValue::Vec3(curves.each_ref().map(|curve| curve.sample(time)))
        }
    };
    if let Some(location) = &locations.member {
        write_value(blocks, location, &value, &channel_member_name(property));
    }
}

impl Drop for UberProgram {
    fn drop(&mut self) {
        if let Some(program) = self.program.take() {
            if self.owns_program {
                self.context.destroy_program(program);
            }
        }
        log::trace!("Released uber program '{}'", self.name);
    }
}

impl std::fmt::Debug for UberProgram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UberProgram")
            .field("name", &self.name)
            .field("program", &self.program)
            .field("owns_program", &self.owns_program)
            .field("items", &self.items.len())
            .field("blocks", &self.blocks)
            .field("cached_meshes", &self.layouts.len())
            .field("dirty", &self.dirty)
            .field("rendering", &self.recording.is_some())
            .finish()
    }
}

// Ensure UberProgram is Send + Sync
static_assertions::assert_impl_all!(UberProgram: Send, Sync);
