//! Graphics state descriptors.
//!
//! A graphics state bundles everything the fixed-function stages need for
//! one (mesh, program) pair: culling, winding, topology and the vertex
//! attribute layout. It is the counterpart of an OpenGL vertex array object
//! plus rasterizer state.

use ragl_core::handle::BufferHandle;
use ragl_core::mesh::{PrimitiveTopology, VertexOrdering};

/// Face culling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullMode {
    /// Draw both faces.
    None,
    /// Cull front faces.
    Front,
    /// Cull back faces.
    #[default]
    Back,
}

/// Winding of front faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FrontFace {
    /// Counter-clockwise triangles are front-facing.
    #[default]
    Ccw,
    /// Clockwise triangles are front-facing.
    Cw,
}

impl From<VertexOrdering> for FrontFace {
    fn from(ordering: VertexOrdering) -> Self {
        match ordering {
            VertexOrdering::CounterClockwise => Self::Ccw,
            VertexOrdering::Clockwise => Self::Cw,
        }
    }
}

/// One enabled vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttributeBinding {
    /// Attribute location in the linked program.
    pub location: u32,
    /// Source buffer.
    pub buffer: BufferHandle,
    /// Byte offset of the first element.
    pub offset: u32,
    /// Byte distance between elements.
    pub stride: u32,
    /// Number of f32 components.
    pub components: u32,
}

/// Descriptor for creating a graphics state object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct GraphicsStateDescriptor {
    /// Debug label.
    pub label: Option<String>,
    /// Face culling.
    pub cull_mode: CullMode,
    /// Front-face winding.
    pub front_face: FrontFace,
    /// Primitive topology.
    pub topology: PrimitiveTopology,
    /// Enabled vertex attributes.
    pub attributes: Vec<VertexAttributeBinding>,
}

impl GraphicsStateDescriptor {
    /// Create a descriptor with back-face culling and CCW front faces.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set face culling.
    pub fn with_cull_mode(mut self, cull_mode: CullMode) -> Self {
        self.cull_mode = cull_mode;
        self
    }

    /// Set front-face winding.
    pub fn with_front_face(mut self, front_face: FrontFace) -> Self {
        self.front_face = front_face;
        self
    }

    /// Set primitive topology.
    pub fn with_topology(mut self, topology: PrimitiveTopology) -> Self {
        self.topology = topology;
        self
    }

    /// Add a vertex attribute.
    pub fn with_attribute(mut self, attribute: VertexAttributeBinding) -> Self {
        self.attributes.push(attribute);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_front_face_from_ordering() {
        assert_eq!(FrontFace::from(VertexOrdering::Clockwise), FrontFace::Cw);
        assert_eq!(
            FrontFace::from(VertexOrdering::CounterClockwise),
            FrontFace::Ccw
        );
    }
}
