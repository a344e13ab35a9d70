//! CPU-side mesh types and generators.
//!
//! This module provides GPU-agnostic mesh descriptions:
//!
//! - [`Mesh`] - Attribute streams, index buffer, winding and layer passes
//! - [`MeshLayerPass`] - A material plus the element range it covers
//! - Generators for common shapes (sphere, quad)
//!
//! A mesh only references GPU buffers by handle. The uber program turns it
//! into a cached graphics state and draw commands.

mod data;
pub mod generators;

pub use data::{
    ElementRange, IndexBuffer, IndexFormat, Mesh, MeshId, MeshKind, MeshLayer, MeshLayerPass,
    MeshStream, MeshStreamKind, PassDraw, PrimitiveTopology, StreamDrawArgs, VertexOrdering,
};
