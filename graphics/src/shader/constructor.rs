//! Incremental GLSL source builder.
//!
//! A [`ShaderConstructor`] collects declarations and main-body snippets and
//! emits them in a fixed order:
//!
//! 1. `#version` and `#define`s
//! 2. uniform blocks (std140, explicit binding), skipping empty ones
//! 3. textures, each followed by its sampler
//! 4. stage inputs, then outputs (explicit locations)
//! 5. `#include` directives (resolved later by [`IncludeResolver`](super::IncludeResolver))
//! 6. helper functions
//! 7. `void main()` with the snippets in insertion order
//!
//! Declarations are deduplicated by name, so several items can ask for the
//! same input without coordination. Generation is deterministic.
//!
//! Textures and samplers are declared separately, the way Vulkan-flavoured
//! GLSL does it. A texture named `t` gets the sampler `t_sampler`; both take
//! consecutive bindings after the highest uniform block binding of the
//! stage, and [`texture_lookup`] builds the combined sampling expression.

use std::fmt::Write;

use crate::backend::ShaderStage;

/// GLSL types used by generated declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlslType {
    /// `float`
    Float,
    /// `vec2`
    Vec2,
    /// `vec3`
    Vec3,
    /// `vec4`
    Vec4,
    /// `mat4`
    Mat4,
    /// `texture2D`
    Texture2D,
    /// `textureCube`
    TextureCube,
}

impl GlslType {
    /// GLSL spelling.
    pub fn name(self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Vec2 => "vec2",
            Self::Vec3 => "vec3",
            Self::Vec4 => "vec4",
            Self::Mat4 => "mat4",
            Self::Texture2D => "texture2D",
            Self::TextureCube => "textureCube",
        }
    }

    /// Combined sampler type a texture of this type is sampled through.
    pub fn combined_sampler(self) -> Option<&'static str> {
        match self {
            Self::Texture2D => Some("sampler2D"),
            Self::TextureCube => Some("samplerCube"),
            _ => None,
        }
    }
}

/// Name of the sampler declared next to a texture.
pub fn texture_sampler_name(texture: &str) -> String {
    format!("{texture}_sampler")
}

/// `texture()` call sampling `texture` (of type `ty`) at `coord`.
pub fn texture_lookup(ty: GlslType, texture: &str, coord: &str) -> String {
    let combined = ty.combined_sampler().unwrap_or("sampler2D");
    format!(
        "texture({combined}({texture}, {}), {coord})",
        texture_sampler_name(texture)
    )
}

/// A typed, optionally arrayed declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    /// Type.
    pub ty: GlslType,
    /// Name.
    pub name: String,
    /// Array length.
    pub array: Option<u32>,
}

impl Variable {
    fn declaration(&self) -> String {
        match self.array {
            Some(count) => format!("{} {}[{}];", self.ty.name(), self.name, count),
            None => format!("{} {};", self.ty.name(), self.name),
        }
    }
}

/// A stage input or output at an explicit location.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Interface {
    variable: Variable,
    location: u32,
}

/// Index of a uniform block inside a constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(usize);

#[derive(Debug, Clone)]
struct UniformBlockDecl {
    name: String,
    binding: u32,
    members: Vec<Variable>,
}

/// Builder of one shader stage's GLSL source.
#[derive(Debug, Clone)]
pub struct ShaderConstructor {
    stage: ShaderStage,
    version: String,
    defines: Vec<(String, String)>,
    blocks: Vec<UniformBlockDecl>,
    textures: Vec<Variable>,
    inputs: Vec<Interface>,
    outputs: Vec<Interface>,
    includes: Vec<String>,
    functions: Vec<(String, String)>,
    main: Vec<String>,
}

impl ShaderConstructor {
    /// Create an empty constructor.
    pub fn new(stage: ShaderStage, version: impl Into<String>) -> Self {
        Self {
            stage,
            version: version.into(),
            defines: Vec::new(),
            blocks: Vec::new(),
            textures: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            includes: Vec::new(),
            functions: Vec::new(),
            main: Vec::new(),
        }
    }

    /// Get the stage.
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    /// Add a `#define`. Redefinitions replace the value.
    pub fn add_define(&mut self, name: &str, value: &str) {
        match self.defines.iter_mut().find(|(existing, _)| existing == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.defines.push((name.to_string(), value.to_string())),
        }
    }

    /// Declare a uniform block, or return the existing one with that name.
    pub fn add_uniform_block(&mut self, name: &str, binding: u32) -> BlockId {
        if let Some(index) = self.blocks.iter().position(|block| block.name == name) {
            return BlockId(index);
        }
        self.blocks.push(UniformBlockDecl {
            name: name.to_string(),
            binding,
            members: Vec::new(),
        });
        BlockId(self.blocks.len() - 1)
    }

    /// Add a block member. Returns `false` if the name was already declared.
    pub fn add_block_member(
        &mut self,
        block: BlockId,
        ty: GlslType,
        name: &str,
        array: Option<u32>,
    ) -> bool {
        let members = &mut self.blocks[block.0].members;
        if members.iter().any(|member| member.name == name) {
            return false;
        }
        members.push(Variable {
            ty,
            name: name.to_string(),
            array,
        });
        true
    }

    /// Declare a texture and its sampler.
    pub fn add_texture(&mut self, ty: GlslType, name: &str) -> bool {
        debug_assert!(ty.combined_sampler().is_some(), "{ty:?} is not a texture type");
        if self.textures.iter().any(|texture| texture.name == name) {
            return false;
        }
        self.textures.push(Variable {
            ty,
            name: name.to_string(),
            array: None,
        });
        true
    }

    /// Declare a stage input at `location`.
    pub fn add_input(&mut self, ty: GlslType, name: &str, location: u32) -> bool {
        push_unique(&mut self.inputs, ty, name, location)
    }

    /// Declare a stage output at `location`.
    pub fn add_output(&mut self, ty: GlslType, name: &str, location: u32) -> bool {
        push_unique(&mut self.outputs, ty, name, location)
    }

    /// Whether an input with this name is declared.
    pub fn has_input(&self, name: &str) -> bool {
        self.inputs.iter().any(|input| input.variable.name == name)
    }

    /// Whether an output with this name is declared.
    pub fn has_output(&self, name: &str) -> bool {
        self.outputs.iter().any(|output| output.variable.name == name)
    }

    /// Binding of the first texture: one past the highest block binding.
    fn first_texture_binding(&self) -> u32 {
        self.blocks
            .iter()
            .map(|block| block.binding + 1)
            .max()
            .unwrap_or(0)
    }

    /// Add an `#include` directive.
    pub fn add_include(&mut self, path: &str) {
        if !self.includes.iter().any(|existing| existing == path) {
            self.includes.push(path.to_string());
        }
    }

    /// Add a helper function, keyed by name.
    pub fn add_function(&mut self, name: &str, source: &str) -> bool {
        if self.functions.iter().any(|(existing, _)| existing == name) {
            return false;
        }
        self.functions.push((name.to_string(), source.to_string()));
        true
    }

    /// Append a snippet to `main`.
    pub fn add_main_snippet(&mut self, snippet: impl Into<String>) {
        self.main.push(snippet.into());
    }

    /// Generate the GLSL source.
    pub fn generate(&self) -> String {
        let mut source = String::new();
        // Writing to a String cannot fail.
        let _ = self.write_source(&mut source);
        source
    }

    fn write_source(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "#version {}", self.version)?;
        for (name, value) in &self.defines {
            if value.is_empty() {
                writeln!(out, "#define {name}")?;
            } else {
                writeln!(out, "#define {name} {value}")?;
            }
        }
        writeln!(out)?;

        for block in self.blocks.iter().filter(|block| !block.members.is_empty()) {
            writeln!(
                out,
                "layout(std140, binding = {}) uniform {}",
                block.binding, block.name
            )?;
            writeln!(out, "{{")?;
            for member in &block.members {
                writeln!(out, "    {}", member.declaration())?;
            }
            writeln!(out, "}};")?;
            writeln!(out)?;
        }

        let mut binding = self.first_texture_binding();
        for texture in &self.textures {
            writeln!(out, "layout(binding = {binding}) uniform {}", texture.declaration())?;
            writeln!(
                out,
                "layout(binding = {}) uniform sampler {};",
                binding + 1,
                texture_sampler_name(&texture.name)
            )?;
            binding += 2;
        }
        for input in &self.inputs {
            writeln!(
                out,
                "layout(location = {}) in {}",
                input.location,
                input.variable.declaration()
            )?;
        }
        for output in &self.outputs {
            writeln!(
                out,
                "layout(location = {}) out {}",
                output.location,
                output.variable.declaration()
            )?;
        }
        writeln!(out)?;

        for path in &self.includes {
            writeln!(out, "#include \"{path}\"")?;
        }
        for (_, function) in &self.functions {
            writeln!(out, "{}", function.trim_end())?;
            writeln!(out)?;
        }

        writeln!(out, "void main()")?;
        writeln!(out, "{{")?;
        for snippet in &self.main {
            for line in snippet.lines() {
                writeln!(out, "    {line}")?;
            }
        }
        writeln!(out, "}}")
    }
}

fn push_unique(list: &mut Vec<Interface>, ty: GlslType, name: &str, location: u32) -> bool {
    if list.iter().any(|interface| interface.variable.name == name) {
        return false;
    }
    debug_assert!(
        list.iter().all(|interface| interface.location != location),
        "location {location} of '{name}' is already taken"
    );
    list.push(Interface {
        variable: Variable {
            ty,
            name: name.to_string(),
            array: None,
        },
        location,
    });
    true
}
