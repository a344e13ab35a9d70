//! Render targets and present tasks.
//!
//! A [`PresentTask`] is the unit a frame scheduler works with: a recorded
//! command buffer plus the textures it reads and the textures it writes.
//! Declaring both sides lets the scheduler order tasks (a shadow-map pass
//! must run before the pass sampling it) without inspecting commands.

use ragl_core::handle::TextureHandle;

use crate::backend::GpuContext;
use crate::command::CommandBuffer;
use crate::error::GraphicsError;
use crate::types::{ClearValue, Viewport};

/// Attachments and clear state of a render pass.
///
/// # Example
///
/// ```
/// use ragl_core::handle::TextureHandle;
/// use ragl_graphics::present::RenderTargets;
/// use ragl_graphics::types::{ClearValue, Viewport};
///
/// let targets = RenderTargets::new()
///     .with_color(TextureHandle::from_raw(1))
///     .with_depth(TextureHandle::from_raw(2))
///     .with_viewport(Viewport::from_dimensions(640, 480))
///     .with_clear_color(ClearValue::color(0.0, 0.0, 0.0, 1.0));
/// assert_eq!(targets.outputs().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderTargets {
    /// Color attachments.
    pub color: Vec<TextureHandle>,
    /// Depth attachment.
    pub depth: Option<TextureHandle>,
    /// Viewport.
    pub viewport: Viewport,
    /// Color clear.
    pub clear_color: ClearValue,
    /// Depth clear.
    pub clear_depth: ClearValue,
}

impl RenderTargets {
    /// Create an empty target set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a color attachment.
    pub fn with_color(mut self, texture: TextureHandle) -> Self {
        self.color.push(texture);
        self
    }

    /// Set the depth attachment.
    pub fn with_depth(mut self, texture: TextureHandle) -> Self {
        self.depth = Some(texture);
        self
    }

    /// Set the viewport.
    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    /// Set the color clear.
    pub fn with_clear_color(mut self, clear: ClearValue) -> Self {
        self.clear_color = clear;
        self
    }

    /// Set the depth clear.
    pub fn with_clear_depth(mut self, clear: ClearValue) -> Self {
        self.clear_depth = clear;
        self
    }

    /// All attachments, color first.
    pub fn outputs(&self) -> Vec<TextureHandle> {
        self.color.iter().copied().chain(self.depth).collect()
    }
}

/// A recorded pass with declared texture dependencies.
#[derive(Debug, Clone, PartialEq)]
pub struct PresentTask {
    /// Task name.
    pub name: String,
    /// Recorded commands.
    pub command_buffer: CommandBuffer,
    /// Textures sampled by the task.
    pub inputs: Vec<TextureHandle>,
    /// Textures written by the task.
    pub outputs: Vec<TextureHandle>,
}

impl PresentTask {
    /// Whether this task must run after `other` (it reads something `other` writes).
    pub fn depends_on(&self, other: &PresentTask) -> bool {
        self.inputs
            .iter()
            .any(|input| other.outputs.contains(input))
    }

    /// Submit the recorded commands.
    pub fn execute(&self, context: &dyn GpuContext) -> Result<(), GraphicsError> {
        log::trace!(
            "Executing present task '{}' ({} commands)",
            self.name,
            self.command_buffer.len()
        );
        context.submit(&self.command_buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(name: &str, inputs: &[u32], outputs: &[u32]) -> PresentTask {
        PresentTask {
            name: name.into(),
            command_buffer: CommandBuffer::new(),
            inputs: inputs.iter().map(|&raw| TextureHandle::from_raw(raw)).collect(),
            outputs: outputs.iter().map(|&raw| TextureHandle::from_raw(raw)).collect(),
        }
    }

    #[test]
    fn test_dependency_through_shadow_map() {
        let shadow = task("shadow", &[], &[5]);
        let lit = task("lit", &[5], &[1]);
        assert!(lit.depends_on(&shadow));
        assert!(!shadow.depends_on(&lit));
    }

    #[test]
    fn test_outputs_order() {
        let targets = RenderTargets::new()
            .with_depth(TextureHandle::from_raw(9))
            .with_color(TextureHandle::from_raw(3));
        assert_eq!(
            targets.outputs(),
            vec![TextureHandle::from_raw(3), TextureHandle::from_raw(9)]
        );
    }
}
