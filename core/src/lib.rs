//! # raGL Core
//!
//! GPU-agnostic data consumed by the raGL uber-shader machinery.
//!
//! Nothing in this crate talks to a GPU. It describes *what* should be drawn:
//!
//! - [`handle`] - Opaque GPU object names handed out by a context
//! - [`material`] - Shading algorithm and per-channel attachments
//! - [`mesh`] - Vertex streams, index data and layer passes
//! - [`scene`] - Lights and global shadow-mapping state
//! - [`curve`] - Animated scalar curves sampled at render time
//! - [`math`] - Color space and matrix helpers

pub mod curve;
pub mod handle;
pub mod material;
pub mod math;
pub mod mesh;
pub mod profiling;
pub mod scene;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the crate version. Safe to call more than once.
pub fn init() {
    log::info!("raGL Core v{} initialized", VERSION);
}
