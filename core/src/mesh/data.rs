//! CPU-side mesh description.
//!
//! This module provides:
//! - [`PrimitiveTopology`] - How vertices are assembled into primitives
//! - [`IndexFormat`] - Index data width (u8, u16 or u32)
//! - [`MeshStream`] - Where one vertex attribute lives in a GPU buffer
//! - [`MeshLayer`] / [`MeshLayerPass`] - Material-tagged draw ranges
//! - [`Mesh`] - The whole mesh, with identity and a modification timestamp

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::handle::BufferHandle;
use crate::material::Material;

/// Primitive topology describing how vertices are assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    /// Each vertex is a separate point.
    PointList,
    /// Every two vertices form a line.
    LineList,
    /// Vertices form a connected strip of lines.
    LineStrip,
    /// Every three vertices form a triangle.
    #[default]
    TriangleList,
    /// Vertices form a connected strip of triangles.
    TriangleStrip,
}

impl PrimitiveTopology {
    /// Get the number of vertices per primitive (for non-strip topologies).
    pub fn vertices_per_primitive(&self) -> Option<u32> {
        match self {
            Self::PointList => Some(1),
            Self::LineList => Some(2),
            Self::TriangleList => Some(3),
            Self::LineStrip | Self::TriangleStrip => None, // Variable
        }
    }
}

/// Index format for indexed drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexFormat {
    /// 8-bit unsigned integers.
    Uint8,
    /// 16-bit unsigned integers (max 65535 vertices).
    #[default]
    Uint16,
    /// 32-bit unsigned integers (max ~4 billion vertices).
    Uint32,
}

impl IndexFormat {
    /// Get the size in bytes of each index.
    pub fn size(&self) -> usize {
        match self {
            Self::Uint8 => 1,
            Self::Uint16 => 2,
            Self::Uint32 => 4,
        }
    }
}

/// Winding of front-facing triangles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VertexOrdering {
    /// Counter-clockwise triangles face the viewer.
    #[default]
    CounterClockwise,
    /// Clockwise triangles face the viewer.
    Clockwise,
}

/// A vertex attribute stream the uber program knows how to consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MeshStreamKind {
    /// Object-space positions.
    Vertex,
    /// Object-space normals.
    Normal,
    /// First texture coordinate set.
    TexCoord,
}

impl MeshStreamKind {
    /// All stream kinds in binding order.
    pub const ALL: [MeshStreamKind; 3] = [Self::Vertex, Self::Normal, Self::TexCoord];

    /// Name of the vertex shader input fed by this stream.
    pub fn attribute_name(self) -> &'static str {
        match self {
            Self::Vertex => "object_vertex",
            Self::Normal => "object_normal",
            Self::TexCoord => "object_uv",
        }
    }

    /// Input location of that vertex shader input.
    pub fn attribute_location(self) -> u32 {
        match self {
            Self::Vertex => 0,
            Self::Normal => 1,
            Self::TexCoord => 2,
        }
    }
}

/// Location of one attribute stream inside a vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshStream {
    /// Buffer holding the stream.
    pub buffer: BufferHandle,
    /// Byte offset of the first element.
    pub offset: u32,
    /// Byte distance between consecutive elements.
    pub stride: u32,
    /// Number of f32 components per element.
    pub components: u32,
}

impl MeshStream {
    /// Create a tightly packed f32 stream.
    pub fn new(buffer: BufferHandle, components: u32) -> Self {
        Self {
            buffer,
            offset: 0,
            stride: components * 4,
            components,
        }
    }

    /// Set the byte offset of the first element.
    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    /// Set the stride between elements.
    pub fn with_stride(mut self, stride: u32) -> Self {
        self.stride = stride;
        self
    }
}

/// Index buffer of a regular mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexBuffer {
    /// Buffer holding the indices.
    pub buffer: BufferHandle,
    /// Width of one index.
    pub format: IndexFormat,
}

/// A contiguous range of elements (indices, or vertices when not indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ElementRange {
    /// First element.
    pub first: u32,
    /// Number of elements.
    pub count: u32,
}

impl ElementRange {
    /// Create a range.
    pub fn new(first: u32, count: u32) -> Self {
        Self { first, count }
    }
}

/// Draw arguments of a GPU-driven stream mesh pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamDrawArgs {
    /// Arguments known on the CPU.
    Direct(ElementRange),
    /// Arguments read from a GPU buffer at draw time.
    Indirect {
        /// Buffer holding a `DrawIndirectArgs` record.
        buffer: BufferHandle,
        /// Byte offset of the record.
        offset: u64,
    },
}

/// How a layer pass is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassDraw {
    /// Element range of a regular mesh.
    Elements(ElementRange),
    /// Draw arguments of a stream mesh.
    Stream(StreamDrawArgs),
}

/// One material-tagged draw inside a layer.
#[derive(Debug, Clone)]
pub struct MeshLayerPass {
    /// Material used by this pass. Compared by identity when filtering.
    pub material: Arc<Material>,
    /// Range to draw.
    pub draw: PassDraw,
}

impl MeshLayerPass {
    /// A pass drawing an element range.
    pub fn elements(material: Arc<Material>, range: ElementRange) -> Self {
        Self {
            material,
            draw: PassDraw::Elements(range),
        }
    }

    /// A pass of a GPU stream mesh.
    pub fn stream(material: Arc<Material>, args: StreamDrawArgs) -> Self {
        Self {
            material,
            draw: PassDraw::Stream(args),
        }
    }
}

/// A group of passes, e.g. one level of detail.
#[derive(Debug, Clone, Default)]
pub struct MeshLayer {
    passes: Vec<MeshLayerPass>,
}

impl MeshLayer {
    /// Create an empty layer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pass.
    pub fn with_pass(mut self, pass: MeshLayerPass) -> Self {
        self.passes.push(pass);
        self
    }

    /// Get the passes.
    pub fn passes(&self) -> &[MeshLayerPass] {
        &self.passes
    }
}

/// Whether a mesh owns index data or is fed by GPU-generated streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MeshKind {
    /// Vertex streams plus optional index buffer, drawn by element ranges.
    #[default]
    Regular,
    /// Streams written by the GPU, drawn by direct or indirect arguments.
    GpuStream,
}

/// Process-unique mesh identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(u64);

impl MeshId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw id.
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// A mesh as consumed by the uber program.
///
/// Every mutation bumps the modification timestamp, which is what cached GPU
/// layouts compare against. Streams living in GPU buffers can change without
/// the mesh noticing; call [`Mesh::mark_modified`] in that case.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use ragl_core::handle::BufferHandle;
/// use ragl_core::material::Material;
/// use ragl_core::mesh::*;
///
/// let buffer = BufferHandle::from_raw(1);
/// let material = Arc::new(Material::new("default"));
/// let mesh = Mesh::new("triangle")
///     .with_stream(MeshStreamKind::Vertex, MeshStream::new(buffer, 3))
///     .with_layer(MeshLayer::new().with_pass(MeshLayerPass::elements(
///         material,
///         ElementRange::new(0, 3),
///     )));
/// assert!(!mesh.is_indexed());
/// ```
#[derive(Debug)]
pub struct Mesh {
    id: MeshId,
    label: String,
    kind: MeshKind,
    topology: PrimitiveTopology,
    vertex_ordering: VertexOrdering,
    streams: [Option<MeshStream>; 3],
    index_buffer: Option<IndexBuffer>,
    layers: Vec<MeshLayer>,
    timestamp: AtomicU64,
}

impl Mesh {
    /// Create an empty regular mesh with a fresh identity.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id: MeshId::next(),
            label: label.into(),
            kind: MeshKind::Regular,
            topology: PrimitiveTopology::TriangleList,
            vertex_ordering: VertexOrdering::CounterClockwise,
            streams: [None; 3],
            index_buffer: None,
            layers: Vec::new(),
            timestamp: AtomicU64::new(1),
        }
    }

    /// Set the mesh kind.
    pub fn with_kind(mut self, kind: MeshKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the primitive topology.
    pub fn with_topology(mut self, topology: PrimitiveTopology) -> Self {
        self.topology = topology;
        self
    }

    /// Set the front-face winding.
    pub fn with_vertex_ordering(mut self, ordering: VertexOrdering) -> Self {
        self.vertex_ordering = ordering;
        self
    }

    /// Set an attribute stream.
    pub fn with_stream(mut self, kind: MeshStreamKind, stream: MeshStream) -> Self {
        self.set_stream(kind, Some(stream));
        self
    }

    /// Set the index buffer.
    pub fn with_index_buffer(mut self, buffer: BufferHandle, format: IndexFormat) -> Self {
        self.index_buffer = Some(IndexBuffer { buffer, format });
        self
    }

    /// Append a layer.
    pub fn with_layer(mut self, layer: MeshLayer) -> Self {
        self.layers.push(layer);
        self
    }

    /// Replace or clear an attribute stream.
    pub fn set_stream(&mut self, kind: MeshStreamKind, stream: Option<MeshStream>) {
        self.streams[Self::stream_slot(kind)] = stream;
        self.mark_modified();
    }

    /// Replace the layers.
    pub fn set_layers(&mut self, layers: Vec<MeshLayer>) {
        self.layers = layers;
        self.mark_modified();
    }

    /// Bump the modification timestamp.
    pub fn mark_modified(&self) {
        self.timestamp.fetch_add(1, Ordering::AcqRel);
    }

    /// Get the mesh identity.
    pub fn id(&self) -> MeshId {
        self.id
    }

    /// Get the debug label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Get the mesh kind.
    pub fn kind(&self) -> MeshKind {
        self.kind
    }

    /// Get the primitive topology.
    pub fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    /// Get the front-face winding.
    pub fn vertex_ordering(&self) -> VertexOrdering {
        self.vertex_ordering
    }

    /// Get an attribute stream.
    pub fn stream(&self, kind: MeshStreamKind) -> Option<&MeshStream> {
        self.streams[Self::stream_slot(kind)].as_ref()
    }

    /// Get the index buffer, if any.
    pub fn index_buffer(&self) -> Option<&IndexBuffer> {
        self.index_buffer.as_ref()
    }

    /// Check if this mesh uses indexed drawing.
    pub fn is_indexed(&self) -> bool {
        self.index_buffer.is_some()
    }

    /// Get the layers.
    pub fn layers(&self) -> &[MeshLayer] {
        &self.layers
    }

    /// Get the current modification timestamp.
    pub fn modification_timestamp(&self) -> u64 {
        self.timestamp.load(Ordering::Acquire)
    }

    fn stream_slot(kind: MeshStreamKind) -> usize {
        match kind {
            MeshStreamKind::Vertex => 0,
            MeshStreamKind::Normal => 1,
            MeshStreamKind::TexCoord => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(IndexFormat::Uint8, 1)]
    #[case(IndexFormat::Uint16, 2)]
    #[case(IndexFormat::Uint32, 4)]
    fn test_index_format_size(#[case] format: IndexFormat, #[case] size: usize) {
        assert_eq!(format.size(), size);
    }

    #[test]
    fn test_mesh_ids_are_unique() {
        assert_ne!(Mesh::new("a").id(), Mesh::new("b").id());
    }

    #[test]
    fn test_mutation_bumps_timestamp() {
        let mut mesh = Mesh::new("m");
        let before = mesh.modification_timestamp();
        mesh.set_stream(
            MeshStreamKind::Normal,
            Some(MeshStream::new(BufferHandle::from_raw(3), 3)),
        );
        let after = mesh.modification_timestamp();
        assert!(after > before);
        mesh.mark_modified();
        assert!(mesh.modification_timestamp() > after);
    }

    #[test]
    fn test_stream_lookup() {
        let mesh = Mesh::new("m").with_stream(
            MeshStreamKind::TexCoord,
            MeshStream::new(BufferHandle::from_raw(2), 2).with_offset(24).with_stride(32),
        );
        let uv = mesh.stream(MeshStreamKind::TexCoord).unwrap();
        assert_eq!((uv.offset, uv.stride, uv.components), (24, 32, 2));
        assert!(mesh.stream(MeshStreamKind::Vertex).is_none());
    }

    #[test]
    fn test_attribute_names() {
        assert_eq!(MeshStreamKind::Vertex.attribute_name(), "object_vertex");
        assert_eq!(MeshStreamKind::Normal.attribute_name(), "object_normal");
        assert_eq!(MeshStreamKind::TexCoord.attribute_name(), "object_uv");
    }

    #[test]
    fn test_attribute_locations_are_distinct() {
        let mut locations = MeshStreamKind::ALL.map(MeshStreamKind::attribute_location);
        locations.sort_unstable();
        assert_eq!(locations, [0, 1, 2]);
    }
}
