//! Recorded GPU commands.
//!
//! Uber programs never issue GPU calls while rendering. They record
//! [`Command`]s into a [`CommandBuffer`], which is handed to the context's
//! `submit` (usually via a [`PresentTask`](crate::present::PresentTask)).

use ragl_core::handle::{
    BufferHandle, GraphicsStateHandle, ProgramHandle, SamplerHandle, TextureHandle,
};
use ragl_core::mesh::IndexFormat;

use crate::types::{ClearValue, Viewport};

/// A single recorded GPU command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Start rendering into a set of targets.
    BeginRendering {
        /// Color attachments.
        color_targets: Vec<TextureHandle>,
        /// Depth attachment.
        depth_target: Option<TextureHandle>,
        /// Viewport.
        viewport: Viewport,
        /// Color clear.
        clear_color: ClearValue,
        /// Depth clear.
        clear_depth: ClearValue,
    },
    /// Finish rendering.
    EndRendering,
    /// Make a program current.
    SetProgram(ProgramHandle),
    /// Make a graphics state current.
    SetGraphicsState(GraphicsStateHandle),
    /// Bind a uniform buffer range to a block binding point.
    BindUniformBuffer {
        /// Binding point.
        binding: u32,
        /// Buffer to bind.
        buffer: BufferHandle,
        /// Byte offset of the range.
        offset: u64,
        /// Byte size of the range.
        size: u64,
    },
    /// Copy CPU data into a buffer before subsequent commands run.
    UpdateBuffer {
        /// Destination buffer.
        buffer: BufferHandle,
        /// Destination offset.
        offset: u64,
        /// Bytes to write.
        data: Vec<u8>,
    },
    /// Bind a texture (and optional sampler) to a texture unit.
    BindTexture {
        /// Texture unit.
        unit: u32,
        /// Texture to bind.
        texture: TextureHandle,
        /// Sampler state, or the texture's own state.
        sampler: Option<SamplerHandle>,
    },
    /// Point a sampler uniform at a texture unit.
    SetSamplerUnit {
        /// Uniform location of the sampler.
        location: u32,
        /// Texture unit.
        unit: u32,
    },
    /// Bind the index buffer for subsequent indexed draws.
    SetIndexBuffer {
        /// Index buffer.
        buffer: BufferHandle,
        /// Index width.
        format: IndexFormat,
    },
    /// Non-indexed draw.
    Draw {
        /// First vertex.
        first: u32,
        /// Vertex count.
        count: u32,
    },
    /// Indexed draw using the bound index buffer.
    DrawIndexed {
        /// First index.
        first: u32,
        /// Index count.
        count: u32,
        /// Index width, also used to compute the byte offset of `first`.
        format: IndexFormat,
    },
    /// Non-indexed draw with arguments read from a buffer.
    DrawIndirect {
        /// Buffer with a `DrawIndirectArgs` record.
        buffer: BufferHandle,
        /// Byte offset of the record.
        offset: u64,
    },
}

impl Command {
    /// Whether this command issues primitives.
    pub fn is_draw(&self) -> bool {
        matches!(
            self,
            Self::Draw { .. } | Self::DrawIndexed { .. } | Self::DrawIndirect { .. }
        )
    }
}

/// An ordered list of recorded commands.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandBuffer {
    label: Option<String>,
    commands: Vec<Command>,
}

impl CommandBuffer {
    /// Create an empty command buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Get the debug label.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Append a command.
    pub fn record(&mut self, command: Command) {
        log::trace!("CommandBuffer {:?}: {:?}", self.label, command);
        self.commands.push(command);
    }

    /// Append several commands.
    pub fn record_all(&mut self, commands: impl IntoIterator<Item = Command>) {
        for command in commands {
            self.record(command);
        }
    }

    /// Get the recorded commands.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Number of recorded commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Number of draw commands.
    pub fn draw_count(&self) -> usize {
        self.commands.iter().filter(|command| command.is_draw()).count()
    }
}
