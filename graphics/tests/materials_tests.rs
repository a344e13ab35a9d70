//! Materials registry integration tests.
//!
//! These tests drive [`MaterialsRegistry`] through the dummy context and
//! check cache behaviour by program identity and GPU work counters.
//!
//! # Test Categories
//!
//! - **Cache Tests**: Hits return the same program without recompiling
//! - **Bake Tests**: Items and channels of freshly baked programs
//! - **Shadow Tests**: Which lights end up as shadow casters
//! - **Validation Tests**: Generated GLSL passes naga's validator

mod common;

use std::sync::Arc;

use rstest::rstest;

use common::{scene_with, textured_phong, TestContext};
use ragl_core::material::{
    InputFragmentAttribute, Material, Shading, ShadingProperty, ShadingPropertyAttachment,
};
use ragl_core::scene::{
    LightFalloff, PointLightShadowAlgorithm, Scene, SceneLight, SceneLightType, ShadowMapAlgorithm,
    ShadowMapBias,
};
use ragl_graphics::shader::channel_texture_name;
use ragl_graphics::uber::UberItemKind;
use ragl_graphics::{MaterialsConfig, SpecialMaterial, UberLightKind};

// ============================================================================
// Cache Tests
// ============================================================================

/// A requery with an equivalent material is a hit: same program, no new
/// entry, no compilation.
#[test]
fn test_requery_is_a_hit() {
    let mut ctx = TestContext::new();
    let scene = scene_with(&[SceneLightType::Directional, SceneLightType::Point]);

    let first = ctx
        .registry
        .get_uber(&textured_phong("a"), Some(&scene), false)
        .unwrap();
    let stats = ctx.context.stats();

    // Different name and texture, same structure.
    let second = ctx
        .registry
        .get_uber(
            &Material::new("b")
                .with_shading(Shading::Phong)
                .with_attachment(
                    ShadingProperty::Diffuse,
                    ShadingPropertyAttachment::Texture(common::texture(900)),
                ),
            Some(&scene),
            false,
        )
        .unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(ctx.registry.len(), 1);
    assert_eq!(ctx.context.stats().shader_compilations, stats.shader_compilations);
    assert_eq!(ctx.context.stats().program_links, stats.program_links);
}

/// Structural differences produce separate programs.
#[rstest]
#[case::shading(Material::new("m").with_shading(Shading::Lambert))]
#[case::attachment_kind(
    Material::new("m")
        .with_shading(Shading::Phong)
        .with_attachment(ShadingProperty::Diffuse, ShadingPropertyAttachment::Float(0.5))
)]
#[case::input_attribute(
    Material::new("m")
        .with_shading(Shading::InputFragmentAttribute)
        .with_input_fragment_attribute(InputFragmentAttribute::TexCoord)
)]
fn test_structural_mismatch_is_a_miss(#[case] other: Material) {
    let mut ctx = TestContext::new();
    let scene = scene_with(&[SceneLightType::Directional]);

    let first = ctx
        .registry
        .get_uber(&textured_phong("a"), Some(&scene), false)
        .unwrap();
    let second = ctx.registry.get_uber(&other, Some(&scene), false).unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(ctx.registry.len(), 2);
}

/// The shadow flag is part of the cache key even for scene-independent
/// materials.
#[test]
fn test_shadow_flag_is_part_of_the_key() {
    let mut ctx = TestContext::new();
    let material = Material::new("flat").with_shading(Shading::None);
    let with = ctx.registry.get_uber(&material, None, true).unwrap();
    let without = ctx.registry.get_uber(&material, None, false).unwrap();
    assert!(!Arc::ptr_eq(&with, &without));
    assert_eq!(with.lock().name(), "flat copy with SM");
    assert_eq!(without.lock().name(), "flat copy without SM");
}

/// Materials whose shading ignores lights match any scene, including none.
#[rstest]
#[case::no_shading(Material::new("m").with_shading(Shading::None))]
#[case::input_attribute(Material::new("m").with_shading(Shading::InputFragmentAttribute))]
fn test_scene_independent_material_matches_any_scene(#[case] material: Material) {
    let mut ctx = TestContext::new();
    let lit = scene_with(&[SceneLightType::Spot, SceneLightType::Point]);

    let without_scene = ctx.registry.get_uber(&material, None, false).unwrap();
    let with_scene = ctx.registry.get_uber(&material, Some(&lit), false).unwrap();
    let empty_scene = ctx
        .registry
        .get_uber(&material, Some(&Scene::new("empty")), false)
        .unwrap();

    assert!(Arc::ptr_eq(&without_scene, &with_scene));
    assert!(Arc::ptr_eq(&without_scene, &empty_scene));
    assert_eq!(ctx.registry.len(), 1);
}

/// Scene-dependent materials need the same light list.
#[test]
fn test_light_order_matters() {
    let mut ctx = TestContext::new();
    let material = Material::new("m").with_shading(Shading::Phong);
    let a = ctx
        .registry
        .get_uber(
            &material,
            Some(&scene_with(&[SceneLightType::Point, SceneLightType::Spot])),
            false,
        )
        .unwrap();
    let b = ctx
        .registry
        .get_uber(
            &material,
            Some(&scene_with(&[SceneLightType::Spot, SceneLightType::Point])),
            false,
        )
        .unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
}

/// `clear` drops cached programs; the next query bakes again.
#[test]
fn test_clear_forces_rebake() {
    let mut ctx = TestContext::new();
    let material = Material::new("m").with_shading(Shading::None);
    let first = ctx.registry.get_uber(&material, None, false).unwrap();
    ctx.registry.clear();
    assert!(ctx.registry.is_empty());

    let links = ctx.context.stats().program_links;
    let second = ctx.registry.get_uber(&material, None, false).unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(ctx.context.stats().program_links, links + 1);
}

// ============================================================================
// Bake Tests
// ============================================================================

/// Textured Phong material lit by a single non-casting directional light.
#[test]
fn test_basic_phong_bake() {
    let mut ctx = TestContext::new();
    let scene = Scene::new("sun")
        .with_light(SceneLight::new("sun", SceneLightType::Directional).with_shadow_map(true))
        .with_shadow_mapping(true);

    let uber = ctx
        .registry
        .get_uber(&textured_phong("brick"), Some(&scene), false)
        .unwrap();
    let uber = uber.lock();

    assert!(!uber.is_dirty());
    assert_eq!(uber.item_count(), 1);
    let light = uber.item(0).light().expect("Item 0 is a light");
    assert_eq!(light.kind, UberLightKind::PhongDirectional);
    assert!(!light.is_shadow_caster);

    let (_, fragment) = uber.sources().expect("Composed program has sources");
    assert!(fragment.contains(&channel_texture_name(ShadingProperty::Diffuse)));
    assert!(!fragment.contains("light0_shadow_map"));
}

/// Light items get ids in scene order.
#[test]
fn test_items_follow_scene_order() {
    let mut ctx = TestContext::new();
    let scene = scene_with(&[
        SceneLightType::Ambient,
        SceneLightType::Directional,
        SceneLightType::Point,
    ]);
    let uber = ctx
        .registry
        .get_uber(&Material::new("m"), Some(&scene), false)
        .unwrap();
    let uber = uber.lock();

    let kinds: Vec<UberLightKind> = uber
        .items()
        .iter()
        .map(|item| item.light().unwrap().kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            UberLightKind::Ambient,
            UberLightKind::LambertDirectional,
            UberLightKind::LambertPoint,
        ]
    );
}

#[rstest]
#[case::normal(InputFragmentAttribute::Normal)]
#[case::texcoord(InputFragmentAttribute::TexCoord)]
fn test_input_attribute_material_has_one_item(#[case] attribute: InputFragmentAttribute) {
    let mut ctx = TestContext::new();
    let material = Material::new("preview")
        .with_shading(Shading::InputFragmentAttribute)
        .with_input_fragment_attribute(attribute);
    let uber = ctx
        .registry
        .get_uber(&material, Some(&scene_with(&[SceneLightType::Point])), false)
        .unwrap();
    let uber = uber.lock();
    assert_eq!(uber.item_count(), 1);
    assert_eq!(uber.item(0).kind(), UberItemKind::InputFragmentAttribute(attribute));
}

#[test]
#[should_panic(expected = "does not support")]
fn test_lambert_with_spot_light_panics() {
    let mut ctx = TestContext::new();
    let _ = ctx.registry.get_uber(
        &Material::new("m").with_shading(Shading::Lambert),
        Some(&scene_with(&[SceneLightType::Spot])),
        false,
    );
}

/// Program materials wrap the caller's program and are never recompiled.
#[test]
fn test_program_material_wraps_existing_program() {
    let mut ctx = TestContext::new();
    let special = ctx
        .registry
        .get_special_material(SpecialMaterial::DepthClip)
        .unwrap();
    let program = special.program.lock().program().unwrap();
    let links = ctx.context.stats().program_links;

    let material = Material::from_program("custom", program);
    let uber = ctx
        .registry
        .get_uber(&material, Some(&scene_with(&[SceneLightType::Spot])), true)
        .unwrap();
    let mut uber = uber.lock();
    assert_eq!(uber.program(), Some(program));
    assert!(!uber.is_composed());
    assert!(!uber.link().unwrap());
    assert_eq!(ctx.context.stats().program_links, links);
}

// ============================================================================
// Shadow Tests
// ============================================================================

/// A light casts only when the caller, the scene and the light all agree.
#[rstest]
#[case::all_on(true, true, true, true)]
#[case::caller_off(false, true, true, false)]
#[case::scene_off(true, false, true, false)]
#[case::light_off(true, true, false, false)]
fn test_shadow_caster_gating(
    #[case] use_shadow_maps: bool,
    #[case] scene_shadows: bool,
    #[case] light_shadows: bool,
    #[case] expected: bool,
) {
    let mut ctx = TestContext::new();
    let scene = Scene::new("s")
        .with_light(SceneLight::new("sun", SceneLightType::Directional).with_shadow_map(light_shadows))
        .with_shadow_mapping(scene_shadows);

    let uber = ctx
        .registry
        .get_uber(&Material::new("m").with_shading(Shading::Phong), Some(&scene), use_shadow_maps)
        .unwrap();
    let uber = uber.lock();
    assert_eq!(uber.item(0).light().unwrap().is_shadow_caster, expected);
}

// ============================================================================
// Special Materials
// ============================================================================

#[test]
fn test_prebaked_special_materials() {
    let ctx = TestContext::with_config(MaterialsConfig::default());
    let links = ctx.context.stats().program_links;
    assert_eq!(links as usize, SpecialMaterial::ALL.len());
    assert!(ctx.registry.is_empty());
}

#[rstest]
#[case::depth_clip(SpecialMaterial::DepthClip)]
#[case::dual_paraboloid_squared(SpecialMaterial::DualParaboloidAndSquared)]
#[case::normals(SpecialMaterial::Normals)]
fn test_special_material_is_cached(#[case] kind: SpecialMaterial) {
    let mut ctx = TestContext::new();
    let first = ctx.registry.get_special_material(kind).unwrap();
    let second = ctx.registry.get_special_material(kind).unwrap();
    assert!(Arc::ptr_eq(&first.material, &second.material));
    assert!(Arc::ptr_eq(&first.program, &second.program));
}

// ============================================================================
// Validation Tests
// ============================================================================

/// The default configuration produces GLSL naga accepts, including the
/// prebaked special materials.
#[test]
fn test_default_config_passes_validation() {
    let mut ctx = TestContext::validating();
    assert_eq!(ctx.context.stats().program_links as usize, SpecialMaterial::ALL.len());

    let scene = Scene::new("sun and lamp")
        .with_light(SceneLight::new("sky", SceneLightType::Ambient))
        .with_light(SceneLight::new("sun", SceneLightType::Directional).with_shadow_map(true))
        .with_light(SceneLight::new("lamp", SceneLightType::Point).with_falloff(LightFalloff::Linear))
        .with_shadow_mapping(true);
    let uber = ctx
        .registry
        .get_uber(&textured_phong("brick"), Some(&scene), true)
        .unwrap();
    let uber = uber.lock();
    assert!(uber.item(1).light().unwrap().is_shadow_caster);
    assert!(uber.program().is_some());
}

/// Every shadow map layout samples through a valid texture and sampler pair.
#[rstest]
#[case::vsm_spot(SceneLightType::Spot, ShadowMapAlgorithm::Vsm, PointLightShadowAlgorithm::CubeMap)]
#[case::cube_map(SceneLightType::Point, ShadowMapAlgorithm::Plain, PointLightShadowAlgorithm::CubeMap)]
#[case::dual_paraboloid(
    SceneLightType::Point,
    ShadowMapAlgorithm::Plain,
    PointLightShadowAlgorithm::DualParaboloid
)]
fn test_shadow_layouts_pass_validation(
    #[case] light_type: SceneLightType,
    #[case] algorithm: ShadowMapAlgorithm,
    #[case] point_algorithm: PointLightShadowAlgorithm,
) {
    let mut ctx = TestContext::validating();
    let scene = Scene::new("s")
        .with_light(
            SceneLight::new("caster", light_type)
                .with_shadow_map(true)
                .with_shadow_map_algorithm(algorithm)
                .with_shadow_map_bias(ShadowMapBias::Adaptive)
                .with_point_light_shadow_algorithm(point_algorithm),
        )
        .with_shadow_mapping(true);
    let uber = ctx
        .registry
        .get_uber(&textured_phong("m"), Some(&scene), true)
        .unwrap();
    assert!(uber.lock().item(0).light().unwrap().is_shadow_caster);
}
