//! Mesh generators for common shapes.
//!
//! Generators produce interleaved CPU vertex data ([`MeshData`]). Upload
//! [`MeshData::vertex_bytes`] and [`MeshData::index_bytes`] into GPU buffers,
//! then call [`MeshData::build_mesh`] with the buffer handles.

use std::f32::consts::PI;
use std::sync::Arc;

use crate::handle::BufferHandle;
use crate::material::Material;

use super::data::{
    ElementRange, IndexFormat, Mesh, MeshLayer, MeshLayerPass, MeshStream, MeshStreamKind,
};

/// Interleaved vertex (position + normal + uv), 32 bytes.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PnuVertex {
    /// Object-space position.
    pub position: [f32; 3],
    /// Object-space normal.
    pub normal: [f32; 3],
    /// Texture coordinate.
    pub uv: [f32; 2],
}

impl PnuVertex {
    /// Size of one vertex in bytes.
    pub const STRIDE: u32 = std::mem::size_of::<PnuVertex>() as u32;
}

/// Generated vertex and index data.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    label: String,
    vertices: Vec<PnuVertex>,
    indices: Vec<u32>,
}

impl MeshData {
    /// Get the debug label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Get the vertices.
    pub fn vertices(&self) -> &[PnuVertex] {
        &self.vertices
    }

    /// Get the indices.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Get the number of vertices.
    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    /// Get the number of indices.
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Vertex data as bytes.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Index data as bytes (u32 indices).
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Describe the uploaded data as a single-layer, single-pass mesh.
    pub fn build_mesh(
        &self,
        vertex_buffer: BufferHandle,
        index_buffer: BufferHandle,
        material: Arc<Material>,
    ) -> Mesh {
        let stream = |components, offset| {
            MeshStream::new(vertex_buffer, components)
                .with_offset(offset)
                .with_stride(PnuVertex::STRIDE)
        };
        Mesh::new(self.label.clone())
            .with_stream(MeshStreamKind::Vertex, stream(3, 0))
            .with_stream(MeshStreamKind::Normal, stream(3, 12))
            .with_stream(MeshStreamKind::TexCoord, stream(2, 24))
            .with_index_buffer(index_buffer, IndexFormat::Uint32)
            .with_layer(MeshLayer::new().with_pass(MeshLayerPass::elements(
                material,
                ElementRange::new(0, self.index_count()),
            )))
    }
}

/// Generate a UV sphere.
///
/// # Arguments
///
/// * `radius` - Sphere radius
/// * `segments` - Number of longitudinal segments (around the equator)
/// * `rings` - Number of latitudinal rings (from pole to pole)
pub fn generate_sphere(radius: f32, segments: u32, rings: u32) -> MeshData {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for ring in 0..=rings {
        let theta = ring as f32 * PI / rings as f32;
        let sin_theta = theta.sin();
        let cos_theta = theta.cos();

        for segment in 0..=segments {
            let phi = segment as f32 * 2.0 * PI / segments as f32;
            let x = sin_theta * phi.cos();
            let y = cos_theta;
            let z = sin_theta * phi.sin();

            vertices.push(PnuVertex {
                position: [x * radius, y * radius, z * radius],
                normal: [x, y, z],
                uv: [segment as f32 / segments as f32, ring as f32 / rings as f32],
            });
        }
    }

    for ring in 0..rings {
        for segment in 0..segments {
            let current = ring * (segments + 1) + segment;
            let next = current + segments + 1;

            indices.extend_from_slice(&[current, next, current + 1]);
            indices.extend_from_slice(&[current + 1, next, next + 1]);
        }
    }

    MeshData {
        label: "sphere".into(),
        vertices,
        indices,
    }
}

/// Generate a quad on the XY plane facing +Z.
pub fn generate_quad(half_width: f32, half_height: f32) -> MeshData {
    let vertex = |x: f32, y: f32, u: f32, v: f32| PnuVertex {
        position: [x * half_width, y * half_height, 0.0],
        normal: [0.0, 0.0, 1.0],
        uv: [u, v],
    };

    MeshData {
        label: "quad".into(),
        vertices: vec![
            vertex(-1.0, -1.0, 0.0, 1.0),
            vertex(1.0, -1.0, 1.0, 1.0),
            vertex(1.0, 1.0, 1.0, 0.0),
            vertex(-1.0, 1.0, 0.0, 0.0),
        ],
        indices: vec![0, 1, 2, 2, 3, 0],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_sphere() {
        let data = generate_sphere(1.0, 8, 4);
        // (rings+1) * (segments+1) = 5 * 9 = 45 vertices
        assert_eq!(data.vertex_count(), 45);
        // rings * segments * 6 = 4 * 8 * 6 = 192 indices
        assert_eq!(data.index_count(), 192);
        assert_eq!(data.vertex_bytes().len(), 45 * 32);
    }

    #[test]
    fn test_generate_quad() {
        let data = generate_quad(0.5, 0.5);
        assert_eq!(data.vertex_count(), 4);
        assert_eq!(data.index_bytes().len(), 6 * 4);
    }

    #[test]
    fn test_build_mesh_streams() {
        let data = generate_quad(1.0, 1.0);
        let mesh = data.build_mesh(
            BufferHandle::from_raw(1),
            BufferHandle::from_raw(2),
            Arc::new(Material::new("m")),
        );
        let normal = mesh.stream(MeshStreamKind::Normal).unwrap();
        assert_eq!((normal.offset, normal.stride), (12, 32));
        assert_eq!(mesh.index_buffer().unwrap().format, IndexFormat::Uint32);
        assert_eq!(mesh.layers()[0].passes().len(), 1);
    }
}
