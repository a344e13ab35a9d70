//! Scene lights consumed by the materials registry.
//!
//! - [`Scene`] - Ordered light list plus the global shadow mapping switch
//! - [`SceneLight`] - A typed light with falloff and shadow settings

mod types;

pub use types::{
    LightFalloff, PointLightShadowAlgorithm, Scene, SceneLight, SceneLightType,
    ShadowMapAlgorithm, ShadowMapBias,
};
