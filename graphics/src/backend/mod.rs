//! GPU context abstraction layer.
//!
//! The uber machinery never talks to a graphics API directly. Everything it
//! needs from the GPU goes through the [`GpuContext`] trait:
//!
//! - Shader and program objects, plus name-based reflection of the linked
//!   program ([`ProgramReflection`])
//! - Buffers, textures, samplers and graphics state objects
//! - Submission of recorded [`CommandBuffer`]s
//!
//! # Available Backends
//!
//! - [`DummyContext`]: records everything on the CPU. It reflects the GLSL
//!   it is given, so offsets and locations behave as they would on a driver.
//!
//! A context is owned by a single rendering thread. The trait requires
//! `Send + Sync` so it can be shared through an `Arc`, but callers are
//! expected to serialize work onto that thread (see
//! [`ContextTaskQueue`](crate::context_thread::ContextTaskQueue)).

pub mod dummy;
mod reflection;

use ragl_core::handle::{
    BufferHandle, GraphicsStateHandle, ProgramHandle, SamplerHandle, ShaderHandle, TextureHandle,
};

use crate::command::CommandBuffer;
use crate::error::GraphicsError;
use crate::types::{BufferDescriptor, GraphicsStateDescriptor, SamplerDescriptor, TextureDescriptor};

pub use dummy::{DummyContext, DummyStats};
pub use reflection::{BlockVariable, ProgramReflection, UniformBlockInfo};

/// Programmable pipeline stage of a shader object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex stage.
    Vertex,
    /// Fragment stage.
    Fragment,
}

impl ShaderStage {
    /// Lower-case stage name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
        }
    }
}

/// Result of a successful link.
#[derive(Debug, Clone)]
pub struct LinkedProgram {
    /// Program object.
    pub handle: ProgramHandle,
    /// Active attributes, uniforms and uniform blocks.
    pub reflection: ProgramReflection,
}

/// GPU context trait for abstracting the graphics API.
pub trait GpuContext: Send + Sync + 'static {
    /// Get the context name.
    fn name(&self) -> &'static str;

    /// Compile a shader object from fully resolved GLSL.
    fn create_shader(&self, stage: ShaderStage, source: &str) -> Result<ShaderHandle, GraphicsError>;

    /// Destroy a shader object.
    fn destroy_shader(&self, shader: ShaderHandle);

    /// Link shader objects into a program.
    fn link_program(&self, shaders: &[ShaderHandle]) -> Result<LinkedProgram, GraphicsError>;

    /// Get the reflection data of a linked program.
    fn program_reflection(&self, program: ProgramHandle) -> Result<ProgramReflection, GraphicsError>;

    /// Destroy a program object.
    fn destroy_program(&self, program: ProgramHandle);

    /// Create a buffer resource.
    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferHandle, GraphicsError>;

    /// Write data to a buffer immediately.
    fn write_buffer(&self, buffer: BufferHandle, offset: u64, data: &[u8]) -> Result<(), GraphicsError>;

    /// Destroy a buffer.
    fn destroy_buffer(&self, buffer: BufferHandle);

    /// Create a texture resource.
    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<TextureHandle, GraphicsError>;

    /// Destroy a texture.
    fn destroy_texture(&self, texture: TextureHandle);

    /// Create a sampler resource.
    fn create_sampler(&self, descriptor: &SamplerDescriptor) -> Result<SamplerHandle, GraphicsError>;

    /// Destroy a sampler.
    fn destroy_sampler(&self, sampler: SamplerHandle);

    /// Create a graphics state (rasterizer state plus vertex layout).
    fn create_graphics_state(
        &self,
        descriptor: &GraphicsStateDescriptor,
    ) -> Result<GraphicsStateHandle, GraphicsError>;

    /// Destroy a graphics state.
    fn destroy_graphics_state(&self, state: GraphicsStateHandle);

    /// Execute a recorded command buffer.
    fn submit(&self, command_buffer: &CommandBuffer) -> Result<(), GraphicsError>;
}
