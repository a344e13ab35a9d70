//! GPU resources owned by the uber machinery.
//!
//! - [`UniformBlockBuffer`] - Uniform buffer with a CPU shadow copy and
//!   dirty-range tracking

mod uniform_block;

pub use uniform_block::UniformBlockBuffer;
