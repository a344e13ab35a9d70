//! Common types and descriptors for graphics resources.
//!
//! This module contains format enums, usage flags, and descriptor structs
//! used throughout the graphics system.

mod buffer;
mod common;
mod sampler;
mod state;
mod texture;

pub use buffer::{BufferDescriptor, BufferUsage, DrawIndirectArgs};
pub use common::{ClearValue, Extent3d, Viewport};
pub use sampler::{AddressMode, CompareFunction, FilterMode, SamplerDescriptor};
pub use state::{CullMode, FrontFace, GraphicsStateDescriptor, VertexAttributeBinding};
pub use texture::{TextureDescriptor, TextureFormat, TextureUsage};
