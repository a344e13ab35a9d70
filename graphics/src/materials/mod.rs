//! Materials registry.
//!
//! The registry turns CPU-side [`Material`](ragl_core::material::Material)s
//! into uber programs:
//!
//! - [`MaterialsRegistry`] - Cache keyed by material structure, scene lights
//!   and shadow flag
//! - [`SpecialMaterial`] - Built-in depth and preview materials
//! - [`SharedUberProgram`] - `Arc<Mutex<UberProgram>>`, so a cache hit hands
//!   out the very same program instance
//!
//! # Sharing via Arc
//!
//! Meshes select their passes by material *identity*, so special materials
//! are handed out as `Arc<Material>` and compared with `Arc::ptr_eq`.

mod registry;
mod special;

pub use registry::{resolve_light_kind, MaterialsRegistry, SharedUberProgram, SpecialMaterialEntry};
pub use special::SpecialMaterial;
