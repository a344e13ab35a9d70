//! Dummy GPU context for testing and development.
//!
//! This context doesn't perform actual GPU operations. It keeps every object
//! in CPU memory, compiles GLSL with naga's front-end so programs expose the
//! same attributes, textures and std140 offsets a driver would report, and
//! executes `UpdateBuffer` commands into CPU-side buffer storage. Counters
//! in [`DummyStats`] let tests observe how much work was done.

use std::collections::HashMap;

use parking_lot::Mutex;
use ragl_core::handle::{
    BufferHandle, GraphicsStateHandle, ProgramHandle, SamplerHandle, ShaderHandle, TextureHandle,
};

use crate::command::{Command, CommandBuffer};
use crate::error::GraphicsError;
use crate::types::{BufferDescriptor, GraphicsStateDescriptor, SamplerDescriptor, TextureDescriptor};

use super::reflection::parse_glsl;
use super::{GpuContext, LinkedProgram, ProgramReflection, ShaderStage};

/// Work counters of a [`DummyContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DummyStats {
    /// Shader objects compiled.
    pub shader_compilations: u32,
    /// Programs linked.
    pub program_links: u32,
    /// Command buffers submitted.
    pub submissions: u32,
    /// Buffer writes (immediate or recorded).
    pub buffer_writes: u32,
    /// Graphics states created.
    pub graphics_states_created: u32,
    /// Draw commands executed.
    pub draws: u32,
}

#[derive(Debug)]
struct ShaderObject {
    stage: ShaderStage,
    source: String,
    module: naga::Module,
}

#[derive(Debug, Default)]
struct DummyState {
    next_id: u32,
    shaders: HashMap<ShaderHandle, ShaderObject>,
    programs: HashMap<ProgramHandle, ProgramReflection>,
    buffers: HashMap<BufferHandle, Vec<u8>>,
    textures: HashMap<TextureHandle, TextureDescriptor>,
    samplers: HashMap<SamplerHandle, SamplerDescriptor>,
    graphics_states: HashMap<GraphicsStateHandle, GraphicsStateDescriptor>,
    submitted: Vec<CommandBuffer>,
    stats: DummyStats,
}

impl DummyState {
    fn allocate(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn execute(&mut self, command: &Command) -> Result<(), GraphicsError> {
        match command {
            Command::UpdateBuffer {
                buffer,
                offset,
                data,
            } => self.write(*buffer, *offset, data),
            Command::SetProgram(program) if !self.programs.contains_key(program) => {
                Err(GraphicsError::UnknownProgram(*program))
            }
            Command::SetGraphicsState(state) if !self.graphics_states.contains_key(state) => {
                Err(GraphicsError::InvalidHandle {
                    kind: "graphics state",
                    raw: state.raw(),
                })
            }
            command if command.is_draw() => {
                self.stats.draws += 1;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn write(&mut self, buffer: BufferHandle, offset: u64, data: &[u8]) -> Result<(), GraphicsError> {
        let storage = self
            .buffers
            .get_mut(&buffer)
            .ok_or(GraphicsError::InvalidHandle {
                kind: "buffer",
                raw: buffer.raw(),
            })?;
        let size = storage.len() as u64;
        let end = offset + data.len() as u64;
        if end > size {
            return Err(GraphicsError::OutOfBounds {
                offset,
                len: data.len() as u64,
                size,
            });
        }
        storage[offset as usize..end as usize].copy_from_slice(data);
        self.stats.buffer_writes += 1;
        Ok(())
    }
}

/// Dummy GPU context.
#[derive(Debug, Default)]
pub struct DummyContext {
    validate: bool,
    state: Mutex<DummyState>,
}

impl DummyContext {
    /// Create a new dummy context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Also run compiled shaders through naga's validator.
    ///
    /// Catches type errors and interface collisions (two inputs at one
    /// location, two resources at one binding) the front-end lets through.
    pub fn with_validation(mut self) -> Self {
        self.validate = true;
        self
    }

    /// Get a snapshot of the work counters.
    pub fn stats(&self) -> DummyStats {
        self.state.lock().stats
    }

    /// Get the current contents of a buffer.
    pub fn buffer_contents(&self, buffer: BufferHandle) -> Option<Vec<u8>> {
        self.state.lock().buffers.get(&buffer).cloned()
    }

    /// Get the GLSL a shader was compiled from.
    pub fn shader_source(&self, shader: ShaderHandle) -> Option<String> {
        self.state
            .lock()
            .shaders
            .get(&shader)
            .map(|shader| shader.source.clone())
    }

    /// Get the descriptor a graphics state was created from.
    pub fn graphics_state(&self, state: GraphicsStateHandle) -> Option<GraphicsStateDescriptor> {
        self.state.lock().graphics_states.get(&state).cloned()
    }

    /// Get the descriptor a sampler was created from.
    pub fn sampler(&self, sampler: SamplerHandle) -> Option<SamplerDescriptor> {
        self.state.lock().samplers.get(&sampler).cloned()
    }

    /// Get every command buffer submitted so far.
    pub fn submitted(&self) -> Vec<CommandBuffer> {
        self.state.lock().submitted.clone()
    }

    /// Number of live shaders, programs, buffers and graphics states.
    pub fn live_object_count(&self) -> usize {
        let state = self.state.lock();
        state.shaders.len()
            + state.programs.len()
            + state.buffers.len()
            + state.textures.len()
            + state.samplers.len()
            + state.graphics_states.len()
    }

    fn validate_module(stage: ShaderStage, module: &naga::Module) -> Result<(), GraphicsError> {
        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        validator
            .validate(module)
            .map_err(|e| GraphicsError::ShaderCompilationFailed {
                stage,
                log: format!("Validation error: {e}"),
            })?;
        Ok(())
    }
}

impl GpuContext for DummyContext {
    fn name(&self) -> &'static str {
        "Dummy Context"
    }

    fn create_shader(&self, stage: ShaderStage, source: &str) -> Result<ShaderHandle, GraphicsError> {
        let module = parse_glsl(stage, source)?;
        if self.validate {
            Self::validate_module(stage, &module)?;
        }
        let mut state = self.state.lock();
        let handle = ShaderHandle::from_raw(state.allocate());
        log::trace!(
            "DummyContext: compiling {} shader {} ({} bytes)",
            stage.name(),
            handle,
            source.len()
        );
        state.shaders.insert(
            handle,
            ShaderObject {
                stage,
                source: source.to_string(),
                module,
            },
        );
        state.stats.shader_compilations += 1;
        Ok(handle)
    }

    fn destroy_shader(&self, shader: ShaderHandle) {
        log::trace!("DummyContext: destroying {shader}");
        self.state.lock().shaders.remove(&shader);
    }

    fn link_program(&self, shaders: &[ShaderHandle]) -> Result<LinkedProgram, GraphicsError> {
        let mut state = self.state.lock();
        let mut reflection = ProgramReflection::new();

        let mut stages = Vec::with_capacity(shaders.len());
        for shader in shaders {
            let object = state
                .shaders
                .get(shader)
                .ok_or(GraphicsError::InvalidHandle {
                    kind: "shader",
                    raw: shader.raw(),
                })?;
            stages.push(object.stage);
        }
        for stage in [ShaderStage::Vertex, ShaderStage::Fragment] {
            if !stages.contains(&stage) {
                return Err(GraphicsError::LinkFailed(format!(
                    "no {} shader attached",
                    stage.name()
                )));
            }
        }
        // Vertex first so shared blocks take the vertex layout.
        for stage in [ShaderStage::Vertex, ShaderStage::Fragment] {
            for shader in shaders {
                if let Some(object) = state.shaders.get(shader).filter(|o| o.stage == stage) {
                    reflection.merge_module(stage, &object.module);
                }
            }
        }

        let handle = ProgramHandle::from_raw(state.allocate());
        log::trace!(
            "DummyContext: linked {} ({} attributes, {} blocks)",
            handle,
            reflection.attribute_count(),
            reflection.blocks().len()
        );
        state.programs.insert(handle, reflection.clone());
        state.stats.program_links += 1;
        Ok(LinkedProgram { handle, reflection })
    }

    fn program_reflection(&self, program: ProgramHandle) -> Result<ProgramReflection, GraphicsError> {
        self.state
            .lock()
            .programs
            .get(&program)
            .cloned()
            .ok_or(GraphicsError::UnknownProgram(program))
    }

    fn destroy_program(&self, program: ProgramHandle) {
        log::trace!("DummyContext: destroying {program}");
        self.state.lock().programs.remove(&program);
    }

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferHandle, GraphicsError> {
        let mut state = self.state.lock();
        let handle = BufferHandle::from_raw(state.allocate());
        log::trace!(
            "DummyContext: creating buffer {:?} (size: {})",
            descriptor.label,
            descriptor.size
        );
        state.buffers.insert(handle, vec![0; descriptor.size as usize]);
        Ok(handle)
    }

    fn write_buffer(&self, buffer: BufferHandle, offset: u64, data: &[u8]) -> Result<(), GraphicsError> {
        log::trace!(
            "DummyContext: write_buffer {} offset={} len={}",
            buffer,
            offset,
            data.len()
        );
        self.state.lock().write(buffer, offset, data)
    }

    fn destroy_buffer(&self, buffer: BufferHandle) {
        self.state.lock().buffers.remove(&buffer);
    }

    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<TextureHandle, GraphicsError> {
        let size = descriptor.size;
        if size.is_empty() {
            return Err(GraphicsError::ResourceCreationFailed(format!(
                "texture {:?} has an empty extent {}x{}x{}",
                descriptor.label, size.width, size.height, size.depth
            )));
        }
        let mut state = self.state.lock();
        let handle = TextureHandle::from_raw(state.allocate());
        log::trace!(
            "DummyContext: creating texture {:?} ({}x{}x{})",
            descriptor.label,
            descriptor.size.width,
            descriptor.size.height,
            descriptor.size.depth
        );
        state.textures.insert(handle, descriptor.clone());
        Ok(handle)
    }

    fn destroy_texture(&self, texture: TextureHandle) {
        self.state.lock().textures.remove(&texture);
    }

    fn create_sampler(&self, descriptor: &SamplerDescriptor) -> Result<SamplerHandle, GraphicsError> {
        let mut state = self.state.lock();
        let handle = SamplerHandle::from_raw(state.allocate());
        log::trace!("DummyContext: creating sampler {:?}", descriptor.label);
        state.samplers.insert(handle, descriptor.clone());
        Ok(handle)
    }

    fn destroy_sampler(&self, sampler: SamplerHandle) {
        self.state.lock().samplers.remove(&sampler);
    }

    fn create_graphics_state(
        &self,
        descriptor: &GraphicsStateDescriptor,
    ) -> Result<GraphicsStateHandle, GraphicsError> {
        let mut state = self.state.lock();
        let handle = GraphicsStateHandle::from_raw(state.allocate());
        log::trace!(
            "DummyContext: creating graphics state {:?} ({} attributes)",
            descriptor.label,
            descriptor.attributes.len()
        );
        state.graphics_states.insert(handle, descriptor.clone());
        state.stats.graphics_states_created += 1;
        Ok(handle)
    }

    fn destroy_graphics_state(&self, state: GraphicsStateHandle) {
        self.state.lock().graphics_states.remove(&state);
    }

    fn submit(&self, command_buffer: &CommandBuffer) -> Result<(), GraphicsError> {
        let mut state = self.state.lock();
        log::trace!(
            "DummyContext: executing {:?} with {} commands",
            command_buffer.label(),
            command_buffer.len()
        );
        for command in command_buffer.commands() {
            state.execute(command)?;
        }
        state.submitted.push(command_buffer.clone());
        state.stats.submissions += 1;
        Ok(())
    }
}
