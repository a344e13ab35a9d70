//! Common utilities for uber program integration tests.
//!
//! Everything here goes through the public API only: programs are driven
//! through a [`DummyContext`] and uniform values are checked by executing
//! the recorded [`PresentTask`] and reading the uniform buffers back.

#![allow(dead_code)]

use std::sync::Arc;

use ragl_core::handle::{BufferHandle, SamplerHandle, TextureHandle};
use ragl_core::material::{Material, MaterialTexture, Shading, ShadingProperty, ShadingPropertyAttachment};
use ragl_core::mesh::{
    ElementRange, IndexFormat, Mesh, MeshLayer, MeshLayerPass, MeshStream, MeshStreamKind,
};
use ragl_core::scene::{Scene, SceneLight, SceneLightType};
use ragl_graphics::uber::UniformLocation;
use ragl_graphics::{
    Command, DummyContext, MaterialsConfig, MaterialsRegistry, PresentTask,
};

// ============================================================================
// Context Setup
// ============================================================================

/// A dummy context plus a registry on top of it.
pub struct TestContext {
    pub context: Arc<DummyContext>,
    pub registry: MaterialsRegistry,
}

impl TestContext {
    /// Create a registry without prebaked special materials, so GPU object
    /// counters start at zero.
    pub fn new() -> Self {
        Self::with_config(MaterialsConfig::default().with_prebaked_special_materials(false))
    }

    /// Create a registry with a custom configuration.
    pub fn with_config(config: MaterialsConfig) -> Self {
        Self::with_context(DummyContext::new(), config)
    }

    /// Create a registry whose context runs every shader through naga's
    /// validator. Special materials are prebaked.
    pub fn validating() -> Self {
        Self::with_context(DummyContext::new().with_validation(), MaterialsConfig::default())
    }

    fn with_context(context: DummyContext, config: MaterialsConfig) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let context = Arc::new(context);
        let registry =
            MaterialsRegistry::new(context.clone(), config).expect("Failed to create registry");
        Self { context, registry }
    }
}

// ============================================================================
// Scenes and Materials
// ============================================================================

/// A scene with one light per type, in the given order.
pub fn scene_with(lights: &[SceneLightType]) -> Scene {
    lights
        .iter()
        .enumerate()
        .fold(Scene::new("test scene"), |scene, (index, light_type)| {
            scene.with_light(SceneLight::new(format!("light{index}"), *light_type))
        })
}

/// A sampled texture with arbitrary handles.
pub fn texture(raw: u32) -> MaterialTexture {
    MaterialTexture::new(TextureHandle::from_raw(raw), SamplerHandle::from_raw(raw + 1))
}

/// A Phong material with a texture diffuse channel.
pub fn textured_phong(name: &str) -> Material {
    Material::new(name)
        .with_shading(Shading::Phong)
        .with_attachment(
            ShadingProperty::Diffuse,
            ShadingPropertyAttachment::Texture(texture(500)),
        )
}

// ============================================================================
// Meshes
// ============================================================================

/// An indexed triangle with positions, normals and texture coordinates,
/// drawn by one pass using `material`.
pub fn triangle(material: Arc<Material>) -> Mesh {
    let vertices = BufferHandle::from_raw(1000);
    Mesh::new("triangle")
        .with_stream(MeshStreamKind::Vertex, MeshStream::new(vertices, 3))
        .with_stream(MeshStreamKind::Normal, MeshStream::new(vertices, 3).with_offset(36))
        .with_stream(MeshStreamKind::TexCoord, MeshStream::new(vertices, 2).with_offset(72))
        .with_index_buffer(BufferHandle::from_raw(1001), IndexFormat::Uint16)
        .with_layer(MeshLayer::new().with_pass(MeshLayerPass::elements(
            material,
            ElementRange::new(0, 3),
        )))
}

// ============================================================================
// Uniform Readback
// ============================================================================

/// Execute `task` and read a block member back as floats.
///
/// Uniform blocks are bound in block order at the start of every pass, so
/// the n-th `BindUniformBuffer` command holds block n.
pub fn read_uniform(context: &DummyContext, task: &PresentTask, location: UniformLocation) -> Vec<f32> {
    let UniformLocation::Block { block, variable } = location else {
        panic!("{location:?} is not a block member");
    };
    task.execute(context).expect("Failed to execute present task");

    let buffer = task
        .command_buffer
        .commands()
        .iter()
        .filter_map(|command| match command {
            Command::BindUniformBuffer { buffer, .. } => Some(*buffer),
            _ => None,
        })
        .nth(block)
        .expect("Block was not bound");
    let bytes = context.buffer_contents(buffer).expect("Uniform buffer is gone");
    let start = variable.offset as usize;
    bytes[start..start + variable.size as usize]
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes(chunk.try_into().unwrap()))
        .collect()
}

/// Assert two floats are within `1e-3`.
pub fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-3,
        "expected {expected}, got {actual}"
    );
}
