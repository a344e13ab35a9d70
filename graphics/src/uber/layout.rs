//! Per-mesh GPU layout cache.
//!
//! For every mesh an uber program draws, the program keeps a graphics state
//! (culling, winding, topology and vertex attribute bindings) plus the setup
//! commands that make it current. Entries are keyed by [`MeshId`] and carry
//! the mesh modification timestamp they were baked from; a different
//! timestamp rebakes the entry, the same timestamp reuses it as is.

use std::collections::HashMap;
use std::sync::Arc;

use ragl_core::handle::GraphicsStateHandle;
use ragl_core::mesh::{Mesh, MeshId, MeshStreamKind};

use crate::backend::GpuContext;
use crate::command::Command;
use crate::error::GraphicsError;
use crate::types::{CullMode, GraphicsStateDescriptor, VertexAttributeBinding};

/// Vertex attribute locations of a linked program, indexed like
/// [`MeshStreamKind::ALL`].
pub type AttributeLocations = [Option<u32>; 3];

/// Cached GPU state for one mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshGpuLayout {
    /// Mesh modification timestamp this layout was baked from.
    pub timestamp: u64,
    /// Graphics state object.
    pub state: GraphicsStateHandle,
    /// Commands recorded before the mesh's draws.
    pub setup: Vec<Command>,
}

/// Cache of [`MeshGpuLayout`]s owned by one uber program.
pub(crate) struct MeshLayoutCache {
    context: Arc<dyn GpuContext>,
    layouts: HashMap<MeshId, MeshGpuLayout>,
    bake_count: u64,
}

impl MeshLayoutCache {
    pub(crate) fn new(context: Arc<dyn GpuContext>) -> Self {
        Self {
            context,
            layouts: HashMap::new(),
            bake_count: 0,
        }
    }

    /// Get the layout of a mesh, baking it if missing or stale.
    pub(crate) fn get_or_bake(
        &mut self,
        mesh: &Mesh,
        attributes: &AttributeLocations,
    ) -> Result<&MeshGpuLayout, GraphicsError> {
        let timestamp = mesh.modification_timestamp();
        let stale = self
            .layouts
            .get(&mesh.id())
            .map_or(true, |layout| layout.timestamp != timestamp);

        if stale {
            let layout = self.bake(mesh, attributes, timestamp)?;
            if let Some(old) = self.layouts.insert(mesh.id(), layout) {
                self.context.destroy_graphics_state(old.state);
            }
        }

        self.layouts
            .get(&mesh.id())
            .ok_or_else(|| GraphicsError::Internal(format!("layout of '{}' vanished", mesh.label())))
    }

    fn bake(
        &mut self,
        mesh: &Mesh,
        attributes: &AttributeLocations,
        timestamp: u64,
    ) -> Result<MeshGpuLayout, GraphicsError> {
        let mut descriptor = GraphicsStateDescriptor::new()
            .with_label(mesh.label())
            .with_cull_mode(CullMode::Back)
            .with_front_face(mesh.vertex_ordering().into())
            .with_topology(mesh.topology());

        for (kind, location) in MeshStreamKind::ALL.iter().zip(attributes) {
            let Some(location) = *location else {
                continue;
            };
            match mesh.stream(*kind) {
                Some(stream) => {
                    descriptor = descriptor.with_attribute(VertexAttributeBinding {
                        location,
                        buffer: stream.buffer,
                        offset: stream.offset,
                        stride: stream.stride,
                        components: stream.components,
                    });
                }
                None => log::warn!(
                    "Mesh '{}' has no {} stream but the program reads it",
                    mesh.label(),
                    kind.attribute_name()
                ),
            }
        }

        let state = self.context.create_graphics_state(&descriptor)?;
        let mut setup = vec![Command::SetGraphicsState(state)];
        if let Some(index_buffer) = mesh.index_buffer() {
            setup.push(Command::SetIndexBuffer {
                buffer: index_buffer.buffer,
                format: index_buffer.format,
            });
        }

        self.bake_count += 1;
        log::debug!(
            "Baked GPU layout for mesh '{}' (timestamp {}, {} attributes)",
            mesh.label(),
            timestamp,
            descriptor.attributes.len()
        );
        Ok(MeshGpuLayout {
            timestamp,
            state,
            setup,
        })
    }

    pub(crate) fn get(&self, id: MeshId) -> Option<&MeshGpuLayout> {
        self.layouts.get(&id)
    }

    pub(crate) fn forget(&mut self, id: MeshId) -> bool {
        match self.layouts.remove(&id) {
            Some(layout) => {
                self.context.destroy_graphics_state(layout.state);
                true
            }
            None => false,
        }
    }

    pub(crate) fn clear(&mut self) {
        for (_, layout) in self.layouts.drain() {
            self.context.destroy_graphics_state(layout.state);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.layouts.len()
    }

    /// Number of layouts baked since creation.
    pub(crate) fn bake_count(&self) -> u64 {
        self.bake_count
    }
}

impl Drop for MeshLayoutCache {
    fn drop(&mut self) {
        self.clear();
    }
}
