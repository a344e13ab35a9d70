//! Scene light data types.
//!
//! Colors and vectors use plain arrays so the types stay trivially copyable
//! and independent of the math backend.

/// Type of a scene light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SceneLightType {
    /// Constant light applied everywhere.
    Ambient,
    /// Infinitely distant light with a direction only.
    #[default]
    Directional,
    /// Omnidirectional light at a location.
    Point,
    /// Cone-shaped light at a location.
    Spot,
}

/// Distance attenuation of point and spot lights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LightFalloff {
    /// No attenuation.
    #[default]
    Off,
    /// Linear fade to zero at the light range.
    Linear,
    /// Physically based inverse-square attenuation.
    InverseSquare,
    /// Constant/linear/quadratic attenuation coefficients.
    Custom,
}

/// Shadow map filtering algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShadowMapAlgorithm {
    /// Single depth comparison.
    #[default]
    Plain,
    /// Variance shadow maps (depth and squared depth moments).
    Vsm,
}

/// Depth bias applied when comparing against a plain shadow map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShadowMapBias {
    /// No bias.
    None,
    /// Fixed bias.
    #[default]
    Constant,
    /// Bias scaled by the surface slope.
    Adaptive,
    /// Cheaper slope approximation.
    AdaptiveFast,
}

/// How point lights render their omnidirectional shadow map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PointLightShadowAlgorithm {
    /// Six-face cube map.
    #[default]
    CubeMap,
    /// Two paraboloid hemispheres.
    DualParaboloid,
}

/// A light in a scene.
///
/// # Example
///
/// ```
/// use ragl_core::scene::{LightFalloff, SceneLight, SceneLightType};
///
/// let light = SceneLight::new("lamp", SceneLightType::Point)
///     .with_position([0.0, 4.0, 0.0])
///     .with_falloff(LightFalloff::InverseSquare)
///     .with_shadow_map(true);
/// assert!(light.uses_shadow_map);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SceneLight {
    /// Light name.
    pub name: String,
    /// Light type.
    pub light_type: SceneLightType,
    /// Diffuse color in sRGB.
    pub diffuse: [f32; 3],
    /// Ambient color in sRGB (ambient lights only).
    pub ambient_color: [f32; 3],
    /// World-space location (point/spot).
    pub position: [f32; 3],
    /// World-space direction the light shines towards (directional/spot).
    pub direction: [f32; 3],
    /// Spot cone half-angle in radians.
    pub cone_angle: f32,
    /// Spot penumbra width in radians.
    pub edge_angle: f32,
    /// Range used by [`LightFalloff::Linear`].
    pub range: f32,
    /// Constant, linear and quadratic coefficients for [`LightFalloff::Custom`].
    pub attenuations: [f32; 3],
    /// Distance attenuation.
    pub falloff: LightFalloff,
    /// Whether this light casts shadows.
    pub uses_shadow_map: bool,
    /// Shadow map algorithm.
    pub shadow_map_algorithm: ShadowMapAlgorithm,
    /// Shadow map depth bias.
    pub shadow_map_bias: ShadowMapBias,
    /// Point light shadow layout.
    pub point_light_shadow_algorithm: PointLightShadowAlgorithm,
    /// VSM light-bleeding cutoff.
    pub vsm_cutoff: f32,
    /// VSM minimum variance.
    pub vsm_min_variance: f32,
}

impl SceneLight {
    /// Create a white light of the given type.
    pub fn new(name: impl Into<String>, light_type: SceneLightType) -> Self {
        Self {
            name: name.into(),
            light_type,
            diffuse: [1.0, 1.0, 1.0],
            ambient_color: [0.0, 0.0, 0.0],
            position: [0.0, 0.0, 0.0],
            direction: [0.0, 0.0, -1.0],
            cone_angle: std::f32::consts::FRAC_PI_4,
            edge_angle: 0.1,
            range: 10.0,
            attenuations: [1.0, 0.0, 0.0],
            falloff: LightFalloff::Off,
            uses_shadow_map: false,
            shadow_map_algorithm: ShadowMapAlgorithm::Plain,
            shadow_map_bias: ShadowMapBias::Constant,
            point_light_shadow_algorithm: PointLightShadowAlgorithm::CubeMap,
            vsm_cutoff: 0.1,
            vsm_min_variance: 1e-5,
        }
    }

    /// Set the diffuse color (sRGB).
    #[must_use]
    pub fn with_diffuse(mut self, diffuse: [f32; 3]) -> Self {
        self.diffuse = diffuse;
        self
    }

    /// Set the ambient color (sRGB).
    #[must_use]
    pub fn with_ambient_color(mut self, color: [f32; 3]) -> Self {
        self.ambient_color = color;
        self
    }

    /// Set the world-space location.
    #[must_use]
    pub fn with_position(mut self, position: [f32; 3]) -> Self {
        self.position = position;
        self
    }

    /// Set the world-space direction.
    #[must_use]
    pub fn with_direction(mut self, direction: [f32; 3]) -> Self {
        self.direction = direction;
        self
    }

    /// Set spot cone and edge angles in radians.
    #[must_use]
    pub fn with_cone(mut self, cone_angle: f32, edge_angle: f32) -> Self {
        self.cone_angle = cone_angle;
        self.edge_angle = edge_angle;
        self
    }

    /// Set the falloff mode.
    #[must_use]
    pub fn with_falloff(mut self, falloff: LightFalloff) -> Self {
        self.falloff = falloff;
        self
    }

    /// Set the range for linear falloff.
    #[must_use]
    pub fn with_range(mut self, range: f32) -> Self {
        self.range = range;
        self
    }

    /// Set custom attenuation coefficients.
    #[must_use]
    pub fn with_attenuations(mut self, attenuations: [f32; 3]) -> Self {
        self.attenuations = attenuations;
        self
    }

    /// Enable or disable shadow casting.
    #[must_use]
    pub fn with_shadow_map(mut self, enabled: bool) -> Self {
        self.uses_shadow_map = enabled;
        self
    }

    /// Set the shadow map algorithm.
    #[must_use]
    pub fn with_shadow_map_algorithm(mut self, algorithm: ShadowMapAlgorithm) -> Self {
        self.shadow_map_algorithm = algorithm;
        self
    }

    /// Set the shadow map bias.
    #[must_use]
    pub fn with_shadow_map_bias(mut self, bias: ShadowMapBias) -> Self {
        self.shadow_map_bias = bias;
        self
    }

    /// Set the point light shadow layout.
    #[must_use]
    pub fn with_point_light_shadow_algorithm(mut self, algorithm: PointLightShadowAlgorithm) -> Self {
        self.point_light_shadow_algorithm = algorithm;
        self
    }
}

/// The lights of a scene plus global shadow state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    /// Scene name.
    pub name: String,
    /// Lights in item order.
    pub lights: Vec<SceneLight>,
    /// Global shadow mapping switch.
    pub shadow_mapping_enabled: bool,
}

impl Scene {
    /// Create an empty scene.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Append a light.
    #[must_use]
    pub fn with_light(mut self, light: SceneLight) -> Self {
        self.lights.push(light);
        self
    }

    /// Set the global shadow mapping switch.
    #[must_use]
    pub fn with_shadow_mapping(mut self, enabled: bool) -> Self {
        self.shadow_mapping_enabled = enabled;
        self
    }

    /// Get the number of lights.
    pub fn light_count(&self) -> usize {
        self.lights.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_light_defaults() {
        let light = SceneLight::new("sun", SceneLightType::Directional);
        assert!(!light.uses_shadow_map);
        assert_eq!(light.falloff, LightFalloff::Off);
        assert_eq!(light.shadow_map_algorithm, ShadowMapAlgorithm::Plain);
    }

    #[test]
    fn test_scene_builder() {
        let scene = Scene::new("s")
            .with_light(SceneLight::new("a", SceneLightType::Ambient))
            .with_light(SceneLight::new("b", SceneLightType::Spot).with_cone(0.5, 0.05))
            .with_shadow_mapping(true);
        assert_eq!(scene.light_count(), 2);
        assert!(scene.shadow_mapping_enabled);
        assert_eq!(scene.lights[1].cone_angle, 0.5);
    }
}
