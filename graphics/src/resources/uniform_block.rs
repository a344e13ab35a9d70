//! CPU-shadowed uniform block buffer.

use std::ops::Range;
use std::sync::Arc;

use ragl_core::handle::BufferHandle;

use crate::backend::{GpuContext, UniformBlockInfo};
use crate::command::{Command, CommandBuffer};
use crate::error::GraphicsError;
use crate::types::{BufferDescriptor, BufferUsage};

/// A uniform block's GPU buffer plus a CPU copy of its contents.
///
/// Writes only touch the CPU copy and widen a dirty range. [`sync`](Self::sync)
/// records a single `UpdateBuffer` covering that range, so writes made
/// before a draw are visible to it. A fresh block is dirty over its whole
/// size: GPU memory starts undefined, so zero values must be uploaded too.
///
/// The GPU buffer is destroyed when the block is dropped.
pub struct UniformBlockBuffer {
    context: Arc<dyn GpuContext>,
    name: String,
    binding: u32,
    buffer: BufferHandle,
    data: Vec<u8>,
    dirty: Option<Range<usize>>,
}

impl UniformBlockBuffer {
    /// Allocate a buffer sized for a reflected block.
    pub fn create(
        context: Arc<dyn GpuContext>,
        block: &UniformBlockInfo,
    ) -> Result<Self, GraphicsError> {
        let size = block.size.max(16) as usize;
        let buffer = context.create_buffer(
            &BufferDescriptor::new(size as u64, BufferUsage::UNIFORM | BufferUsage::COPY_DST)
                .with_label(block.name.clone()),
        )?;
        log::trace!(
            "Allocated uniform block '{}' ({} bytes, binding {})",
            block.name,
            size,
            block.binding
        );
        Ok(Self {
            context,
            name: block.name.clone(),
            binding: block.binding,
            buffer,
            data: vec![0; size],
            dirty: Some(0..size),
        })
    }

    /// Get the block name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the binding point.
    pub fn binding(&self) -> u32 {
        self.binding
    }

    /// Get the GPU buffer.
    pub fn buffer(&self) -> BufferHandle {
        self.buffer
    }

    /// Get the block size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Whether some bytes changed since the last sync.
    pub fn is_dirty(&self) -> bool {
        self.dirty.is_some()
    }

    /// Write raw bytes at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if the write does not fit the block. Offsets come from
    /// reflection of the same block, so this is a programming error.
    pub fn write(&mut self, offset: u32, bytes: &[u8]) {
        let start = offset as usize;
        let end = start + bytes.len();
        assert!(
            end <= self.data.len(),
            "write of {} bytes at {} overflows uniform block '{}' ({} bytes)",
            bytes.len(),
            offset,
            self.name,
            self.data.len()
        );
        if self.data[start..end] == *bytes {
            return;
        }
        self.data[start..end].copy_from_slice(bytes);
        self.dirty = Some(match self.dirty.take() {
            Some(range) => range.start.min(start)..range.end.max(end),
            None => start..end,
        });
    }

    /// Write a plain value at `offset`.
    pub fn write_pod<T: bytemuck::Pod>(&mut self, offset: u32, value: &T) {
        self.write(offset, bytemuck::bytes_of(value));
    }

    /// Read back bytes from the CPU copy.
    pub fn read(&self, offset: u32, len: usize) -> &[u8] {
        &self.data[offset as usize..offset as usize + len]
    }

    /// Record an update of the dirty range, if any.
    pub fn sync(&mut self, commands: &mut CommandBuffer) {
        if let Some(range) = self.dirty.take() {
            commands.record(Command::UpdateBuffer {
                buffer: self.buffer,
                offset: range.start as u64,
                data: self.data[range].to_vec(),
            });
        }
    }

    /// Record binding the whole buffer to the block's binding point.
    pub fn bind(&self, commands: &mut CommandBuffer) {
        commands.record(Command::BindUniformBuffer {
            binding: self.binding,
            buffer: self.buffer,
            offset: 0,
            size: self.data.len() as u64,
        });
    }
}

impl Drop for UniformBlockBuffer {
    fn drop(&mut self) {
        log::trace!("Releasing uniform block '{}'", self.name);
        self.context.destroy_buffer(self.buffer);
    }
}

impl std::fmt::Debug for UniformBlockBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UniformBlockBuffer")
            .field("name", &self.name)
            .field("binding", &self.binding)
            .field("buffer", &self.buffer)
            .field("size", &self.data.len())
            .field("dirty", &self.dirty)
            .finish()
    }
}

// Ensure UniformBlockBuffer is Send + Sync
static_assertions::assert_impl_all!(UniformBlockBuffer: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BlockVariable, DummyContext};

    fn block() -> UniformBlockInfo {
        UniformBlockInfo::new("Props", 2)
            .with_variable("a", BlockVariable { offset: 0, size: 16 })
            .with_variable("b", BlockVariable { offset: 16, size: 4 })
    }

    #[test]
    fn test_dirty_range_merges() {
        let context = Arc::new(DummyContext::new());
        let mut ub = UniformBlockBuffer::create(context, &block()).unwrap();
        assert_eq!(ub.size(), 20);
        ub.sync(&mut CommandBuffer::new());
        assert!(!ub.is_dirty());

        ub.write_pod(16, &1.5f32);
        ub.write_pod(4, &2.0f32);
        let mut commands = CommandBuffer::new();
        ub.sync(&mut commands);
        match &commands.commands()[0] {
            Command::UpdateBuffer { offset, data, .. } => {
                assert_eq!(*offset, 4);
                assert_eq!(data.len(), 16);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert!(!ub.is_dirty());
    }

    #[test]
    fn test_unchanged_write_is_not_dirty() {
        let context = Arc::new(DummyContext::new());
        let mut ub = UniformBlockBuffer::create(context, &block()).unwrap();
        ub.sync(&mut CommandBuffer::new());
        ub.write_pod(0, &0.0f32);
        assert!(!ub.is_dirty());
        let mut commands = CommandBuffer::new();
        ub.sync(&mut commands);
        assert!(commands.is_empty());
    }

    #[test]
    fn test_first_sync_uploads_whole_block() {
        let context = Arc::new(DummyContext::new());
        let mut ub = UniformBlockBuffer::create(context, &block()).unwrap();
        assert!(ub.is_dirty());
        // Zero matches the CPU copy but still has to reach the GPU.
        ub.write_pod(16, &0.0f32);

        let mut commands = CommandBuffer::new();
        ub.sync(&mut commands);
        assert_eq!(
            commands.commands(),
            &[Command::UpdateBuffer {
                buffer: ub.buffer(),
                offset: 0,
                data: vec![0; 20],
            }]
        );
        assert!(!ub.is_dirty());
    }

    #[test]
    fn test_drop_destroys_buffer() {
        let context = Arc::new(DummyContext::new());
        let ub = UniformBlockBuffer::create(context.clone(), &block()).unwrap();
        assert_eq!(context.live_object_count(), 1);
        drop(ub);
        assert_eq!(context.live_object_count(), 0);
    }

    #[test]
    #[should_panic(expected = "overflows uniform block")]
    fn test_overflow_panics() {
        let context = Arc::new(DummyContext::new());
        let mut ub = UniformBlockBuffer::create(context, &block()).unwrap();
        ub.write(18, &[0; 4]);
    }
}
