//! # raGL Demos
//!
//! Headless demos of the uber-shader machinery, running on the dummy context.
//!
//! ## Available Demos
//!
//! - `uber_preview` - Shadowed scene rendered through the materials registry

/// Demos library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
