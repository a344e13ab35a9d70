//! # raGL Graphics
//!
//! Uber-shader composition and caching for the raGL renderer.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`UberProgram`] - A program composed from light and input-attribute
//!   items, linked lazily and drawing meshes into a [`PresentTask`]
//! - [`MaterialsRegistry`] - Cache of uber programs keyed by material
//!   structure, scene lights and shadow flag
//! - [`GpuContext`] - Trait for graphics API implementations, with a
//!   [`DummyContext`] that reflects GLSL on the CPU
//! - [`ContextTaskQueue`] - FIFO of closures run on the rendering thread
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use ragl_core::material::{Material, Shading};
//! use ragl_core::scene::{Scene, SceneLight, SceneLightType};
//! use ragl_graphics::{DummyContext, MaterialsConfig, MaterialsRegistry, RenderTargets};
//!
//! let context = Arc::new(DummyContext::new());
//! let mut registry = MaterialsRegistry::new(context, MaterialsConfig::default()).unwrap();
//! let scene = Scene::new("sun").with_light(SceneLight::new("sun", SceneLightType::Directional));
//!
//! let uber = registry
//!     .get_uber(&Material::new("clay").with_shading(Shading::Lambert), Some(&scene), false)
//!     .unwrap();
//! let mut uber = uber.lock();
//! uber.rendering_start(&RenderTargets::new()).unwrap();
//! // render_mesh(...) for every visible mesh
//! let task = uber.rendering_stop();
//! assert_eq!(task.command_buffer.draw_count(), 0);
//! ```

pub mod backend;
pub mod command;
pub mod config;
pub mod context_thread;
pub mod error;
pub mod materials;
pub mod present;
pub mod resources;
pub mod shader;
pub mod types;
pub mod uber;

// Re-export main types for convenience
pub use backend::{DummyContext, GpuContext, ShaderStage};
pub use command::{Command, CommandBuffer};
pub use config::{MaterialsConfig, UberConfig};
pub use context_thread::{ContextTaskPoster, ContextTaskQueue, TaskTicket};
pub use error::{GraphicsError, GraphicsResult};
pub use materials::{MaterialsRegistry, SharedUberProgram, SpecialMaterial};
pub use present::{PresentTask, RenderTargets};
pub use shader::{UberLightDesc, UberLightKind};
pub use uber::{GeneralProperty, ItemProperty, PropertyValue, TextureBinding, UberProgram};

/// Graphics library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the graphics subsystem.
///
/// Only logs the version; contexts need no global setup.
pub fn init() {
    log::info!("raGL Graphics v{} initialized", VERSION);
}
