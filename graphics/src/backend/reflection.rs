//! Linked program reflection.
//!
//! [`ProgramReflection`] is what a context reports about a linked program:
//! vertex attribute locations, texture bindings and the std140 layout of
//! every uniform block. All lookups are by name and return `None` when the
//! program does not declare the variable.
//!
//! Contexts without a driver to ask build it from the [`naga::Module`] of
//! each stage: attributes come from the vertex entry point arguments,
//! blocks from uniform-space globals with the offsets naga's std140
//! layouter assigned, and textures from image globals.

use std::collections::HashMap;

use naga::{AddressSpace, Binding, TypeInner};

use super::ShaderStage;
use crate::error::GraphicsError;

/// A variable inside a uniform block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockVariable {
    /// Byte offset from the start of the block.
    pub offset: u32,
    /// Size in bytes (including array padding).
    pub size: u32,
}

/// Layout of one uniform block.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UniformBlockInfo {
    /// Block name.
    pub name: String,
    /// Uniform buffer binding point.
    pub binding: u32,
    /// Total data size in bytes.
    pub size: u32,
    variables: HashMap<String, BlockVariable>,
}

impl UniformBlockInfo {
    /// Create an empty block.
    pub fn new(name: impl Into<String>, binding: u32) -> Self {
        Self {
            name: name.into(),
            binding,
            size: 0,
            variables: HashMap::new(),
        }
    }

    /// Add a variable, growing the block size to cover it.
    pub fn with_variable(mut self, name: impl Into<String>, variable: BlockVariable) -> Self {
        self.insert_variable(name.into(), variable);
        self
    }

    fn insert_variable(&mut self, name: String, variable: BlockVariable) {
        self.size = self.size.max(variable.offset + variable.size);
        self.variables.insert(name, variable);
    }

    /// Look up a variable.
    pub fn variable(&self, name: &str) -> Option<BlockVariable> {
        self.variables.get(name).copied()
    }

    /// Number of variables.
    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }
}

/// Active interface of a linked program.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgramReflection {
    attributes: HashMap<String, u32>,
    uniforms: HashMap<String, u32>,
    blocks: Vec<UniformBlockInfo>,
}

impl ProgramReflection {
    /// Create an empty reflection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vertex attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, location: u32) -> Self {
        self.attributes.insert(name.into(), location);
        self
    }

    /// Add a texture uniform.
    pub fn with_uniform(mut self, name: impl Into<String>, location: u32) -> Self {
        self.uniforms.insert(name.into(), location);
        self
    }

    /// Add a uniform block. A block with the same name is replaced.
    pub fn with_block(mut self, block: UniformBlockInfo) -> Self {
        self.blocks.retain(|existing| existing.name != block.name);
        self.blocks.push(block);
        self
    }

    /// Location of a vertex attribute.
    pub fn attribute_location(&self, name: &str) -> Option<u32> {
        self.attributes.get(name).copied()
    }

    /// Binding of a texture uniform.
    pub fn uniform_location(&self, name: &str) -> Option<u32> {
        self.uniforms.get(name).copied()
    }

    /// Look up a uniform block by name.
    pub fn block(&self, name: &str) -> Option<&UniformBlockInfo> {
        self.blocks.iter().find(|block| block.name == name)
    }

    /// Look up a variable of a uniform block.
    pub fn block_variable(&self, block: &str, name: &str) -> Option<BlockVariable> {
        self.block(block).and_then(|block| block.variable(name))
    }

    /// All uniform blocks.
    pub fn blocks(&self) -> &[UniformBlockInfo] {
        &self.blocks
    }

    /// Number of active vertex attributes.
    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    /// Merge the interface of one more stage into this program.
    ///
    /// Vertex inputs only count for the vertex stage. Blocks and textures
    /// already declared by an earlier stage keep their first layout.
    pub(crate) fn merge_module(&mut self, stage: ShaderStage, module: &naga::Module) {
        if stage == ShaderStage::Vertex {
            let arguments = module
                .entry_points
                .iter()
                .filter(|entry| entry.stage == naga::ShaderStage::Vertex)
                .flat_map(|entry| entry.function.arguments.iter());
            for argument in arguments {
                if let (Some(name), Some(Binding::Location { location, .. })) =
                    (&argument.name, &argument.binding)
                {
                    self.attributes.entry(name.clone()).or_insert(*location);
                }
            }
        }

        for (_, global) in module.global_variables.iter() {
            let Some(binding) = global.binding.as_ref().map(|binding| binding.binding) else {
                continue;
            };
            let ty = &module.types[global.ty];
            match (global.space, &ty.inner) {
                (AddressSpace::Uniform, TypeInner::Struct { members, span }) => {
                    let Some(name) = ty.name.as_ref().or(global.name.as_ref()) else {
                        continue;
                    };
                    if self.block(name).is_some() {
                        continue;
                    }
                    let mut block = UniformBlockInfo::new(name.clone(), binding);
                    for member in members {
                        let Some(member_name) = &member.name else {
                            continue;
                        };
                        let size = module.types[member.ty].inner.size(module.to_ctx());
                        block.insert_variable(
                            member_name.clone(),
                            BlockVariable {
                                offset: member.offset,
                                size,
                            },
                        );
                    }
                    block.size = block.size.max(*span);
                    self.blocks.push(block);
                }
                (AddressSpace::Handle, TypeInner::Image { .. }) => {
                    if let Some(name) = &global.name {
                        self.uniforms.entry(name.clone()).or_insert(binding);
                    }
                }
                _ => {}
            }
        }
    }

    /// Parse one stage and merge it. See [`merge_module`](Self::merge_module).
    #[cfg(test)]
    pub(crate) fn merge_stage(&mut self, stage: ShaderStage, source: &str) -> Result<(), GraphicsError> {
        let module = parse_glsl(stage, source)?;
        self.merge_module(stage, &module);
        Ok(())
    }
}

/// Run GLSL through naga's front-end.
pub(crate) fn parse_glsl(stage: ShaderStage, source: &str) -> Result<naga::Module, GraphicsError> {
    let naga_stage = match stage {
        ShaderStage::Vertex => naga::ShaderStage::Vertex,
        ShaderStage::Fragment => naga::ShaderStage::Fragment,
    };
    let options = naga::front::glsl::Options::from(naga_stage);
    naga::front::glsl::Frontend::default()
        .parse(&options, source)
        .map_err(|errors| GraphicsError::ShaderCompilationFailed {
            stage,
            log: format!("GLSL parse error:\n{errors}"),
        })
}
