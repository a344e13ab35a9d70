//! Uber programs.
//!
//! An [`UberProgram`] pairs a vertex and a fragment composer, links them and
//! records draws of meshes into a [`PresentTask`](crate::present::PresentTask):
//!
//! - [`UberItem`] - One light or input-attribute contribution, with the
//!   uniform locations it resolved at link time
//! - [`GeneralProperty`] / [`ItemProperty`] - What callers can set
//! - [`PropertyValue`] - Typed values and their std140 encoding
//! - [`MeshGpuLayout`] - Per-mesh graphics state, cached by mesh identity

mod item;
mod layout;
mod program;
mod properties;

pub use item::{UberItem, UberItemKind, UniformLocation};
pub use layout::{AttributeLocations, MeshGpuLayout};
pub use program::UberProgram;
pub use properties::{GeneralProperty, ItemProperty, PropertyValue, TextureBinding};
