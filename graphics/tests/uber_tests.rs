//! Uber program integration tests.
//!
//! Programs come from a [`MaterialsRegistry`](ragl_graphics::MaterialsRegistry)
//! backed by the dummy context. Recorded present tasks are executed on the
//! dummy context, which lets the tests read uniform buffers back.
//!
//! # Test Categories
//!
//! - **Property Tests**: Values written to uniform blocks
//! - **Render Tests**: Recorded commands of a pass
//! - **Mesh Cache Tests**: Baking and invalidation of mesh layouts

mod common;

use std::sync::Arc;

use rstest::rstest;

use common::{assert_close, read_uniform, scene_with, textured_phong, triangle, TestContext};
use ragl_core::handle::{BufferHandle, TextureHandle};
use ragl_core::material::{Material, Shading, ShadingProperty, ShadingPropertyAttachment};
use ragl_core::math::Mat4;
use ragl_core::mesh::{
    ElementRange, Mesh, MeshKind, MeshLayer, MeshLayerPass, MeshStream, MeshStreamKind,
    StreamDrawArgs,
};
use ragl_core::scene::{Scene, SceneLight, SceneLightType};
use ragl_graphics::{
    Command, GeneralProperty, ItemProperty, PropertyValue, RenderTargets, TextureBinding,
};

fn identity() -> Mat4 {
    Mat4::identity()
}

// ============================================================================
// Property Tests
// ============================================================================

/// Light colors are uploaded in linear space; the cache keeps what the
/// caller set.
#[rstest]
#[case::diffuse(ItemProperty::Diffuse)]
#[case::ambient(ItemProperty::AmbientColor)]
fn test_light_colors_are_linearized(#[case] property: ItemProperty) {
    let mut ctx = TestContext::new();
    let light_type = match property {
        ItemProperty::AmbientColor => SceneLightType::Ambient,
        _ => SceneLightType::Directional,
    };
    let uber = ctx
        .registry
        .get_uber(&Material::new("m"), Some(&scene_with(&[light_type])), false)
        .unwrap();
    let mut uber = uber.lock();

    uber.set_shader_item_property(0, property, PropertyValue::Vec3([0.5, 1.0, 0.0]));
    uber.rendering_start(&RenderTargets::new()).unwrap();
    let task = uber.rendering_stop();

    let location = uber.item(0).location(property).expect("Light color is a uniform");
    let value = read_uniform(&ctx.context, &task, location);
    assert_close(value[0], 0.214);
    assert_close(value[1], 1.0);
    assert_close(value[2], 0.0);
    assert_eq!(
        uber.get_shader_item_property(0, property),
        Some(&PropertyValue::Vec3([0.5, 1.0, 0.0]))
    );
}

/// Setting a property the composed program does not declare does nothing.
#[test]
fn test_absent_uniform_is_a_noop() {
    let mut ctx = TestContext::new();
    let uber = ctx
        .registry
        .get_uber(
            &Material::new("m"),
            Some(&scene_with(&[SceneLightType::Directional])),
            false,
        )
        .unwrap();
    let mut uber = uber.lock();

    assert!(uber.item(0).location(ItemProperty::ConeAngle).is_none());
    uber.set_shader_item_property(0, ItemProperty::ConeAngle, PropertyValue::Float(0.3));
    assert!(!uber.has_general_property(GeneralProperty::FlipZ));
    uber.set_shader_general_property(GeneralProperty::FlipZ, PropertyValue::Float(-1.0));

    uber.rendering_start(&RenderTargets::new()).unwrap();
    let task = uber.rendering_stop();
    task.execute(ctx.context.as_ref()).unwrap();
}

/// Adding an item marks the program dirty; the next pass relinks it and
/// keeps cached values.
#[test]
fn test_rendering_start_relinks() {
    let mut ctx = TestContext::new();
    let uber = ctx
        .registry
        .get_uber(
            &Material::new("m").with_shading(Shading::Phong),
            Some(&scene_with(&[SceneLightType::Point])),
            false,
        )
        .unwrap();
    let mut uber = uber.lock();
    uber.set_shader_general_property(
        GeneralProperty::CameraLocation,
        PropertyValue::Vec3([4.0, 5.0, 6.0]),
    );

    let point = uber.item(0).light().copied().unwrap();
    assert_eq!(uber.add_light_item(point), 1);
    assert!(uber.is_dirty());
    uber.rendering_start(&RenderTargets::new()).unwrap();
    let task = uber.rendering_stop();
    assert!(!uber.is_dirty());
    assert_eq!(uber.item_count(), 2);
    assert_eq!(
        uber.get_shader_general_property(GeneralProperty::CameraLocation),
        Some(&PropertyValue::Vec3([4.0, 5.0, 6.0]))
    );

    let program = uber.program().unwrap();
    assert!(task.command_buffer.commands().contains(&Command::SetProgram(program)));
}

/// `link` only rebuilds after a structural change.
#[test]
fn test_link_is_idempotent() {
    let mut ctx = TestContext::new();
    let uber = ctx
        .registry
        .get_uber(&textured_phong("m"), Some(&scene_with(&[SceneLightType::Spot])), false)
        .unwrap();
    let mut uber = uber.lock();
    let stats = ctx.context.stats();

    assert!(!uber.link().unwrap());
    assert!(!uber.link().unwrap());
    assert_eq!(ctx.context.stats().program_links, stats.program_links);
    assert_eq!(ctx.context.stats().shader_compilations, stats.shader_compilations);
}

// ============================================================================
// Render Tests
// ============================================================================

/// Shadow maps take the first texture units, material textures follow.
#[test]
fn test_texture_units_after_shadow_maps() {
    let mut ctx = TestContext::new();
    let scene = Scene::new("s")
        .with_light(SceneLight::new("sun", SceneLightType::Directional).with_shadow_map(true))
        .with_shadow_mapping(true);
    let material = Arc::new(textured_phong("brick"));
    let uber = ctx.registry.get_uber(&material, Some(&scene), true).unwrap();
    let mut uber = uber.lock();

    let shadow_map = TextureHandle::from_raw(77);
    uber.set_shader_item_property(
        0,
        ItemProperty::ShadowMapDepth,
        PropertyValue::Texture(TextureBinding {
            texture: shadow_map,
            sampler: None,
        }),
    );
    uber.rendering_start(&RenderTargets::new()).unwrap();
    uber.render_mesh(&triangle(material.clone()), &identity(), &identity(), None, 0.0)
        .unwrap();
    let task = uber.rendering_stop();

    let bound: Vec<(u32, TextureHandle)> = task
        .command_buffer
        .commands()
        .iter()
        .filter_map(|command| match command {
            Command::BindTexture { unit, texture, .. } => Some((*unit, *texture)),
            _ => None,
        })
        .collect();
    assert_eq!(
        bound,
        vec![
            (0, shadow_map),
            (1 + ShadingProperty::Diffuse.index() as u32, common::texture(500).texture),
        ]
    );
    assert_eq!(task.inputs, vec![shadow_map, common::texture(500).texture]);
}

/// A pass sampling a shadow map depends on the pass rendering it.
#[test]
fn test_present_task_dependencies() {
    let mut ctx = TestContext::new();
    let depth = ctx
        .registry
        .get_special_material(ragl_graphics::SpecialMaterial::DepthClip)
        .unwrap();
    let shadow_map = TextureHandle::from_raw(300);
    let shadow_task = {
        let mut program = depth.program.lock();
        program
            .rendering_start(&RenderTargets::new().with_depth(shadow_map))
            .unwrap();
        program.rendering_stop()
    };

    let scene = Scene::new("s")
        .with_light(SceneLight::new("sun", SceneLightType::Directional).with_shadow_map(true))
        .with_shadow_mapping(true);
    let uber = ctx
        .registry
        .get_uber(&Material::new("m"), Some(&scene), true)
        .unwrap();
    let mut uber = uber.lock();
    uber.set_shader_item_property(
        0,
        ItemProperty::ShadowMapDepth,
        PropertyValue::Texture(TextureBinding {
            texture: shadow_map,
            sampler: None,
        }),
    );
    uber.rendering_start(&RenderTargets::new().with_color(TextureHandle::from_raw(301)))
        .unwrap();
    let main_task = uber.rendering_stop();

    assert!(main_task.depends_on(&shadow_task));
    assert!(!shadow_task.depends_on(&main_task));
}

/// A forced channel replaces the material's own attachment.
#[test]
fn test_forced_channel_replaces_texture() {
    let mut ctx = TestContext::new();
    ctx.registry.force_mesh_material_shading_property_attachment(
        ShadingProperty::Diffuse,
        ShadingPropertyAttachment::Vec4([1.0, 0.0, 1.0, 1.0]),
    );
    let material = Arc::new(textured_phong("brick"));
    let uber = ctx
        .registry
        .get_uber(&material, Some(&scene_with(&[SceneLightType::Directional])), false)
        .unwrap();
    let mut uber = uber.lock();

    uber.rendering_start(&RenderTargets::new()).unwrap();
    uber.render_mesh(&triangle(material.clone()), &identity(), &identity(), None, 0.0)
        .unwrap();
    let task = uber.rendering_stop();

    assert!(!task
        .command_buffer
        .commands()
        .iter()
        .any(|command| matches!(command, Command::BindTexture { .. })));
    assert!(task.inputs.is_empty());
}

/// Stream meshes draw with direct or indirect arguments.
#[rstest]
#[case::direct(
    StreamDrawArgs::Direct(ElementRange::new(0, 6)),
    Command::Draw { first: 0, count: 6 }
)]
#[case::indirect(
    StreamDrawArgs::Indirect { buffer: BufferHandle::from_raw(40), offset: 16 },
    Command::DrawIndirect { buffer: BufferHandle::from_raw(40), offset: 16 }
)]
fn test_stream_mesh_draws(#[case] args: StreamDrawArgs, #[case] expected: Command) {
    let mut ctx = TestContext::new();
    let material = Arc::new(Material::new("particles").with_shading(Shading::None));
    let mesh = Mesh::new("particles")
        .with_kind(MeshKind::GpuStream)
        .with_stream(MeshStreamKind::Vertex, MeshStream::new(BufferHandle::from_raw(41), 3))
        .with_layer(MeshLayer::new().with_pass(MeshLayerPass::stream(material.clone(), args)));

    let uber = ctx.registry.get_uber(&material, None, false).unwrap();
    let mut uber = uber.lock();
    uber.rendering_start(&RenderTargets::new()).unwrap();
    uber.render_mesh(&mesh, &identity(), &identity(), Some(&material), 0.0)
        .unwrap();
    let task = uber.rendering_stop();

    let draws: Vec<&Command> = task
        .command_buffer
        .commands()
        .iter()
        .filter(|command| command.is_draw())
        .collect();
    assert_eq!(draws, vec![&expected]);

    task.execute(ctx.context.as_ref()).unwrap();
    assert_eq!(ctx.context.stats().draws, 1);
}

#[test]
#[should_panic(expected = "outside rendering_start")]
fn test_render_mesh_outside_pass_panics() {
    let mut ctx = TestContext::new();
    let material = Arc::new(Material::new("m").with_shading(Shading::None));
    let uber = ctx.registry.get_uber(&material, None, false).unwrap();
    let mut uber = uber.lock();
    let _ = uber.render_mesh(&triangle(material.clone()), &identity(), &identity(), None, 0.0);
}

// ============================================================================
// Mesh Cache Tests
// ============================================================================

/// Layouts are baked once per mesh and rebaked after a modification.
#[test]
fn test_mesh_layout_cache() {
    let mut ctx = TestContext::new();
    let material = Arc::new(Material::new("m").with_shading(Shading::None));
    let mut mesh = triangle(material.clone());
    let uber = ctx.registry.get_uber(&material, None, false).unwrap();
    let mut uber = uber.lock();

    uber.rendering_start(&RenderTargets::new()).unwrap();
    uber.render_mesh(&mesh, &identity(), &identity(), None, 0.0).unwrap();
    uber.render_mesh(&mesh, &identity(), &identity(), None, 0.0).unwrap();
    uber.rendering_stop();
    assert_eq!(uber.mesh_layout_bakes(), 1);
    assert_eq!(uber.cached_mesh_timestamp(mesh.id()), Some(mesh.modification_timestamp()));

    mesh.set_stream(MeshStreamKind::Normal, None);
    uber.rendering_start(&RenderTargets::new()).unwrap();
    uber.render_mesh(&mesh, &identity(), &identity(), None, 0.0).unwrap();
    uber.rendering_stop();
    assert_eq!(uber.mesh_layout_bakes(), 2);
    assert_eq!(uber.cached_mesh_count(), 1);

    assert!(uber.forget_mesh(mesh.id()));
    assert!(!uber.forget_mesh(mesh.id()));
    assert_eq!(uber.cached_mesh_count(), 0);
}

/// Dropping the last handle to a registry program releases its GPU objects.
#[test]
fn test_registry_clear_releases_programs() {
    let mut ctx = TestContext::new();
    let material = Arc::new(Material::new("m").with_shading(Shading::None));
    {
        let uber = ctx.registry.get_uber(&material, None, false).unwrap();
        let mut uber = uber.lock();
        uber.rendering_start(&RenderTargets::new()).unwrap();
        uber.render_mesh(&triangle(material.clone()), &identity(), &identity(), None, 0.0)
            .unwrap();
        uber.rendering_stop();
    }
    assert!(ctx.context.live_object_count() > 0);
    ctx.registry.clear();
    assert_eq!(ctx.context.live_object_count(), 0);
}
