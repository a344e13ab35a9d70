//! Graphics error types.

use ragl_core::handle::ProgramHandle;

use crate::backend::ShaderStage;

/// Errors reported by a GPU context.
///
/// Configuration defects (unsupported shading and light combinations,
/// reentrant rendering, bad item indices) are not represented here. Those
/// are programming errors and panic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphicsError {
    /// A shader failed to compile.
    #[error("{stage:?} shader compilation failed: {log}")]
    ShaderCompilationFailed {
        /// Stage of the failing shader.
        stage: ShaderStage,
        /// Compiler output.
        log: String,
    },
    /// An `#include` names a module nobody registered.
    #[error("include not found: \"{0}\"")]
    IncludeNotFound(String),
    /// A program failed to link.
    #[error("program link failed: {0}")]
    LinkFailed(String),
    /// Failed to create a resource.
    #[error("resource creation failed: {0}")]
    ResourceCreationFailed(String),
    /// A handle does not name a live object of this context.
    #[error("unknown {kind} handle {raw}")]
    InvalidHandle {
        /// Object kind ("buffer", "program", ...).
        kind: &'static str,
        /// Raw handle value.
        raw: u32,
    },
    /// A program handle has no reflection data.
    #[error("program {0} was not linked by this context")]
    UnknownProgram(ProgramHandle),
    /// A write went past the end of a buffer.
    #[error("write of {len} bytes at offset {offset} exceeds buffer size {size}")]
    OutOfBounds {
        /// Write offset.
        offset: u64,
        /// Write length.
        len: u64,
        /// Buffer size.
        size: u64,
    },
    /// Out of GPU memory.
    #[error("out of GPU memory")]
    OutOfMemory,
    /// The GPU device was lost.
    #[error("GPU device lost")]
    DeviceLost,
    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result alias for graphics operations.
pub type GraphicsResult<T> = Result<T, GraphicsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GraphicsError::OutOfMemory;
        assert_eq!(err.to_string(), "out of GPU memory");

        let err = GraphicsError::ShaderCompilationFailed {
            stage: ShaderStage::Fragment,
            log: "syntax error".to_string(),
        };
        assert_eq!(err.to_string(), "Fragment shader compilation failed: syntax error");

        let err = GraphicsError::InvalidHandle { kind: "buffer", raw: 9 };
        assert_eq!(err.to_string(), "unknown buffer handle 9");
    }
}
