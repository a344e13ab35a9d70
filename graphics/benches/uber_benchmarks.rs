use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use ragl_core::handle::{BufferHandle, SamplerHandle, TextureHandle};
use ragl_core::material::{
    Material, MaterialTexture, Shading, ShadingProperty, ShadingPropertyAttachment,
};
use ragl_core::math::Mat4;
use ragl_core::mesh::{
    ElementRange, IndexFormat, Mesh, MeshLayer, MeshLayerPass, MeshStream, MeshStreamKind,
};
use ragl_core::scene::{Scene, SceneLight, SceneLightType};
use ragl_graphics::shader::ChannelSource;
use ragl_graphics::{
    DummyContext, MaterialsConfig, MaterialsRegistry, RenderTargets, UberConfig, UberLightDesc,
    UberLightKind, UberProgram,
};

fn registry() -> MaterialsRegistry {
    MaterialsRegistry::new(
        Arc::new(DummyContext::new()),
        MaterialsConfig::default().with_prebaked_special_materials(false),
    )
    .unwrap()
}

fn scene() -> Scene {
    Scene::new("bench")
        .with_light(SceneLight::new("ambient", SceneLightType::Ambient))
        .with_light(SceneLight::new("sun", SceneLightType::Directional).with_shadow_map(true))
        .with_light(SceneLight::new("lamp", SceneLightType::Point))
        .with_light(SceneLight::new("spot", SceneLightType::Spot))
        .with_shadow_mapping(true)
}

fn material() -> Material {
    Material::new("brick")
        .with_shading(Shading::Phong)
        .with_attachment(
            ShadingProperty::Diffuse,
            ShadingPropertyAttachment::Texture(MaterialTexture::new(
                TextureHandle::from_raw(1),
                SamplerHandle::from_raw(2),
            )),
        )
        .with_attachment(ShadingProperty::Shininess, ShadingPropertyAttachment::Float(32.0))
}

// ---------------------------------------------------------------------------
// Source generation
// ---------------------------------------------------------------------------

fn bench_compose_sources(c: &mut Criterion) {
    let context = Arc::new(DummyContext::new());
    let mut channels = [ChannelSource::None; ShadingProperty::COUNT];
    channels[ShadingProperty::Diffuse.index()] = ChannelSource::Texture;
    let mut uber = UberProgram::new(context, "bench", &UberConfig::default(), channels);
    for kind in [
        UberLightKind::Ambient,
        UberLightKind::PhongDirectional,
        UberLightKind::PhongPoint,
        UberLightKind::PhongSpot,
    ] {
        uber.add_light_item(UberLightDesc::new(kind));
    }

    c.bench_function("uber_compose_4_lights", |b| {
        b.iter(|| black_box(uber.sources()));
    });
}

// ---------------------------------------------------------------------------
// Registry lookups
// ---------------------------------------------------------------------------

fn bench_registry_hit(c: &mut Criterion) {
    let mut registry = registry();
    let scene = scene();
    let material = material();
    registry.get_uber(&material, Some(&scene), true).unwrap();

    c.bench_function("registry_get_uber_hit", |b| {
        b.iter(|| black_box(registry.get_uber(&material, Some(&scene), true).unwrap()));
    });
}

fn bench_registry_miss(c: &mut Criterion) {
    let mut registry = registry();
    let scene = scene();
    let material = material();

    c.bench_function("registry_get_uber_miss", |b| {
        b.iter(|| {
            registry.clear();
            black_box(registry.get_uber(&material, Some(&scene), true).unwrap())
        });
    });
}

// ---------------------------------------------------------------------------
// Draw recording
// ---------------------------------------------------------------------------

fn bench_render_meshes(c: &mut Criterion) {
    let mut registry = registry();
    let material = Arc::new(material());
    let uber = registry.get_uber(&material, Some(&scene()), false).unwrap();
    let mut uber = uber.lock();

    let vertices = BufferHandle::from_raw(10);
    let meshes: Vec<Mesh> = (0..64)
        .map(|i| {
            Mesh::new(format!("mesh_{i}"))
                .with_stream(MeshStreamKind::Vertex, MeshStream::new(vertices, 3))
                .with_stream(MeshStreamKind::Normal, MeshStream::new(vertices, 3))
                .with_stream(MeshStreamKind::TexCoord, MeshStream::new(vertices, 2))
                .with_index_buffer(BufferHandle::from_raw(11), IndexFormat::Uint32)
                .with_layer(MeshLayer::new().with_pass(MeshLayerPass::elements(
                    material.clone(),
                    ElementRange::new(0, 36),
                )))
        })
        .collect();
    let model = Mat4::identity();

    c.bench_function("uber_render_64_meshes", |b| {
        b.iter(|| {
            uber.rendering_start(&RenderTargets::new()).unwrap();
            for mesh in &meshes {
                uber.render_mesh(mesh, &model, &model, Some(&material), 0.0)
                    .unwrap();
            }
            black_box(uber.rendering_stop())
        });
    });
}

criterion_group!(composition, bench_compose_sources);

criterion_group!(registry_lookups, bench_registry_hit, bench_registry_miss);

criterion_group!(recording, bench_render_meshes);

criterion_main!(composition, registry_lookups, recording);
