//! CPU implementation of [`GraphicsApi`].
//!
//! [`SoftwareDevice`] keeps an object table, records every call in order and
//! executes compute programs through CPU kernels registered against their
//! GLSL source. Image stores land in a staging copy of the texture and only
//! become visible to sampling after a barrier that includes the texture-fetch
//! bit, which is the ordering the real frame depends on.

use std::collections::HashMap;

use gl::types::GLuint;
use trycompute_core::geometry::VertexAttribute;
use trycompute_core::shaders::{compute_placeholder, COMPUTE_SHADER, OUTPUT_IMAGE_UNIT};

use crate::api::{
    Barrier, BufferTarget, ComputeLimits, GraphicsApi, ImageAccess, ShaderStage, TextureDesc,
    TextureFormat,
};

/// CPU stand-in for a compute shader body, called once per invocation with
/// `gl_GlobalInvocationID`. Returns the texel stored at `.xy`.
pub type Kernel = fn([u32; 3]) -> [f32; 4];

/// Read `layout(local_size_x = .., local_size_y = .., local_size_z = ..) in;`
/// from a compute source. Axes that are not declared default to 1, as in GLSL.
fn declared_local_size(source: &str) -> [u32; 3] {
    ["local_size_x", "local_size_y", "local_size_z"].map(|axis| {
        source
            .find(axis)
            .and_then(|at| {
                let rest = source[at + axis.len()..].trim_start().strip_prefix('=')?;
                let rest = rest.trim_start();
                let end = rest
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(rest.len());
                rest[..end].parse().ok()
            })
            .unwrap_or(1)
    })
}

/// Kinds of GL objects tracked by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    VertexArray,
    Buffer,
    Shader,
    Program,
    Texture,
}

/// One recorded API call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateVertexArray(GLuint),
    BindVertexArray(GLuint),
    CreateBuffer {
        name: GLuint,
        target: BufferTarget,
        size: usize,
    },
    VertexAttribute(VertexAttribute),
    CompileShader {
        name: GLuint,
        stage: ShaderStage,
    },
    CreateProgram(GLuint),
    AttachShader {
        program: GLuint,
        shader: GLuint,
    },
    DetachShader {
        program: GLuint,
        shader: GLuint,
    },
    LinkProgram {
        program: GLuint,
        linked: bool,
    },
    UseProgram(GLuint),
    CreateTexture(GLuint),
    BindImageTexture {
        unit: u32,
        texture: GLuint,
        access: ImageAccess,
    },
    BindTextureUnit {
        unit: u32,
        texture: GLuint,
    },
    QueryComputeLimits,
    DispatchCompute([u32; 3]),
    MemoryBarrier(Barrier),
    Clear,
    DrawIndexed(u32),
    Delete {
        kind: ObjectKind,
        name: GLuint,
    },
    Viewport(u32, u32),
}

/// What a draw call sampled.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    pub program: GLuint,
    pub vao: GLuint,
    pub texture: GLuint,
    pub index_count: u32,
    /// The single color of the sampled texture, or `None` if it is not
    /// uniform or nothing usable was bound.
    pub uniform_color: Option<[f32; 4]>,
}

#[derive(Debug)]
struct ShaderObject {
    stage: ShaderStage,
    source: String,
    compiled: bool,
    log: String,
    local_size: [u32; 3],
}

#[derive(Debug, Default)]
struct ProgramObject {
    attached: Vec<GLuint>,
    linked: bool,
    log: String,
    stages: Vec<ShaderStage>,
    kernel: Option<Kernel>,
    local_size: [u32; 3],
}

#[derive(Debug)]
struct TextureObject {
    desc: TextureDesc,
    /// What samplers see.
    visible: Vec<f32>,
    /// Where image stores land until a barrier.
    staged: Vec<f32>,
    dirty: bool,
}

impl TextureObject {
    fn new(desc: TextureDesc) -> Self {
        let len = desc.width as usize * desc.height as usize * desc.format.channels();
        Self {
            desc,
            visible: vec![0.0; len],
            staged: vec![0.0; len],
            dirty: false,
        }
    }

    fn store(&mut self, x: u32, y: u32, texel: [f32; 4]) {
        let i = (y as usize * self.desc.width as usize + x as usize) * 4;
        self.staged[i..i + 4].copy_from_slice(&texel);
        self.dirty = true;
    }

    fn make_visible(&mut self) {
        if self.dirty {
            self.visible.copy_from_slice(&self.staged);
            self.dirty = false;
        }
    }

    fn texel(&self, x: u32, y: u32) -> [f32; 4] {
        let i = (y as usize * self.desc.width as usize + x as usize) * 4;
        [
            self.visible[i],
            self.visible[i + 1],
            self.visible[i + 2],
            self.visible[i + 3],
        ]
    }

    fn uniform_color(&self) -> Option<[f32; 4]> {
        let mut chunks = self.visible.chunks_exact(4);
        let first = chunks.next()?;
        chunks
            .all(|c| c == first)
            .then(|| [first[0], first[1], first[2], first[3]])
    }
}

/// Headless [`GraphicsApi`] that records calls and emulates compute writes.
#[derive(Debug)]
pub struct SoftwareDevice {
    next_name: GLuint,
    live: HashMap<GLuint, ObjectKind>,
    deletions: HashMap<GLuint, usize>,
    shaders: HashMap<GLuint, ShaderObject>,
    programs: HashMap<GLuint, ProgramObject>,
    textures: HashMap<GLuint, TextureObject>,
    kernels: Vec<(String, Kernel)>,
    image_units: HashMap<u32, (GLuint, ImageAccess)>,
    texture_units: HashMap<u32, GLuint>,
    current_program: GLuint,
    current_vao: GLuint,
    limits: ComputeLimits,
    calls: Vec<Call>,
    draws: Vec<DrawRecord>,
}

impl Default for SoftwareDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftwareDevice {
    /// A device with the demo's placeholder kernel registered.
    pub fn new() -> Self {
        Self {
            next_name: 1,
            live: HashMap::new(),
            deletions: HashMap::new(),
            shaders: HashMap::new(),
            programs: HashMap::new(),
            textures: HashMap::new(),
            kernels: vec![(COMPUTE_SHADER.to_string(), compute_placeholder as Kernel)],
            image_units: HashMap::new(),
            texture_units: HashMap::new(),
            current_program: 0,
            current_vao: 0,
            limits: ComputeLimits {
                max_work_group_size: [1024, 1024, 64],
                max_work_group_invocations: 1024,
                max_work_group_count: [65535, 65535, 65535],
            },
            calls: Vec::new(),
            draws: Vec::new(),
        }
    }

    /// Register `kernel` as the CPU body of compute shaders with exactly
    /// this `source`.
    pub fn with_kernel(mut self, source: &str, kernel: Kernel) -> Self {
        self.kernels.push((source.to_string(), kernel));
        self
    }

    pub fn with_limits(mut self, limits: ComputeLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn draws(&self) -> &[DrawRecord] {
        &self.draws
    }

    pub fn is_live(&self, name: GLuint) -> bool {
        self.live.contains_key(&name)
    }

    /// Live objects excluding transient shader stage objects.
    pub fn live_object_count(&self) -> usize {
        self.live
            .values()
            .filter(|k| **k != ObjectKind::Shader)
            .count()
    }

    pub fn live_shader_count(&self) -> usize {
        self.live
            .values()
            .filter(|k| **k == ObjectKind::Shader)
            .count()
    }

    pub fn live_count(&self, kind: ObjectKind) -> usize {
        self.live.values().filter(|k| **k == kind).count()
    }

    /// How many times `name` was passed to a delete call.
    pub fn deletions_of(&self, name: GLuint) -> usize {
        self.deletions.get(&name).copied().unwrap_or(0)
    }

    /// Texel as currently visible to samplers.
    pub fn texel(&self, texture: GLuint, x: u32, y: u32) -> Option<[f32; 4]> {
        let tex = self.textures.get(&texture)?;
        (x < tex.desc.width && y < tex.desc.height).then(|| tex.texel(x, y))
    }

    /// The single visible color of `texture`, if every texel matches.
    pub fn uniform_color(&self, texture: GLuint) -> Option<[f32; 4]> {
        self.textures.get(&texture)?.uniform_color()
    }

    pub fn texture_desc(&self, texture: GLuint) -> Option<TextureDesc> {
        self.textures.get(&texture).map(|t| t.desc)
    }

    fn alloc(&mut self, kind: ObjectKind) -> GLuint {
        let name = self.next_name;
        self.next_name += 1;
        self.live.insert(name, kind);
        name
    }

    fn release(&mut self, kind: ObjectKind, name: GLuint) {
        self.calls.push(Call::Delete { kind, name });
        // Like GL, deleting 0 is silently ignored.
        if name == 0 {
            return;
        }
        *self.deletions.entry(name).or_default() += 1;
        if self.live.get(&name) == Some(&kind) {
            self.live.remove(&name);
        }
    }

    fn check_source(source: &str) -> Result<(), String> {
        if !source.trim_start().starts_with("#version") {
            return Err("0:1(1): error: missing #version directive".to_string());
        }
        if !source.contains("void main") {
            return Err("0:1(1): error: no definition of main()".to_string());
        }
        Ok(())
    }

    fn link_status(&self, program: &ProgramObject) -> Result<Vec<ShaderStage>, String> {
        let mut stages = Vec::new();
        for shader in &program.attached {
            let obj = self
                .shaders
                .get(shader)
                .ok_or_else(|| format!("error: shader {shader} is not a shader object"))?;
            if !obj.compiled {
                return Err(format!("error: linking with uncompiled {} shader", obj.stage));
            }
            stages.push(obj.stage);
        }

        let has = |s| stages.contains(&s);
        if has(ShaderStage::Compute) {
            if stages.len() != 1 {
                return Err("error: compute shader mixed with other stages".to_string());
            }
        } else if !(has(ShaderStage::Vertex) && has(ShaderStage::Fragment)) {
            return Err("error: program lacks a vertex or fragment shader".to_string());
        }
        Ok(stages)
    }

    fn run_kernel(&mut self, kernel: Kernel, local_size: [u32; 3], groups: [u32; 3]) {
        let Some(&(texture, access)) = self.image_units.get(&OUTPUT_IMAGE_UNIT) else {
            tracing::warn!("dispatch with no image bound to unit {OUTPUT_IMAGE_UNIT}");
            return;
        };
        if access == ImageAccess::ReadOnly {
            tracing::warn!("dispatch writes a read-only image binding");
            return;
        }
        let Some(tex) = self.textures.get_mut(&texture) else {
            return;
        };

        // Global id = group id * local size + local id. Stores outside the
        // image are discarded, as imageStore does.
        let [lx, ly, lz] = local_size.map(|v| v.max(1));
        let width = groups[0].saturating_mul(lx).min(tex.desc.width);
        let height = groups[1].saturating_mul(ly).min(tex.desc.height);
        let depth = groups[2].saturating_mul(lz);
        for z in 0..depth {
            for y in 0..height {
                for x in 0..width {
                    tex.store(x, y, kernel([x, y, z]));
                }
            }
        }
    }
}

impl GraphicsApi for SoftwareDevice {
    fn create_vertex_array(&mut self) -> GLuint {
        let vao = self.alloc(ObjectKind::VertexArray);
        self.current_vao = vao;
        self.calls.push(Call::CreateVertexArray(vao));
        vao
    }

    fn bind_vertex_array(&mut self, vao: GLuint) {
        self.current_vao = vao;
        self.calls.push(Call::BindVertexArray(vao));
    }

    fn create_buffer(&mut self, target: BufferTarget, data: &[u8]) -> GLuint {
        let name = self.alloc(ObjectKind::Buffer);
        self.calls.push(Call::CreateBuffer {
            name,
            target,
            size: data.len(),
        });
        name
    }

    fn vertex_attribute(&mut self, attribute: VertexAttribute) {
        self.calls.push(Call::VertexAttribute(attribute));
    }

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> GLuint {
        let name = self.alloc(ObjectKind::Shader);
        let (compiled, log) = match Self::check_source(source) {
            Ok(()) => (true, String::new()),
            Err(log) => (false, log),
        };
        let local_size = match stage {
            ShaderStage::Compute => declared_local_size(source),
            _ => [1, 1, 1],
        };
        self.shaders.insert(
            name,
            ShaderObject {
                stage,
                source: source.to_string(),
                compiled,
                log,
                local_size,
            },
        );
        self.calls.push(Call::CompileShader { name, stage });
        name
    }

    fn shader_compiled(&mut self, shader: GLuint) -> bool {
        self.shaders.get(&shader).is_some_and(|s| s.compiled)
    }

    fn shader_info_log(&mut self, shader: GLuint) -> String {
        self.shaders
            .get(&shader)
            .map(|s| s.log.clone())
            .unwrap_or_default()
    }

    fn delete_shader(&mut self, shader: GLuint) {
        self.release(ObjectKind::Shader, shader);
    }

    fn create_program(&mut self) -> GLuint {
        let name = self.alloc(ObjectKind::Program);
        self.programs.insert(name, ProgramObject::default());
        self.calls.push(Call::CreateProgram(name));
        name
    }

    fn attach_shader(&mut self, program: GLuint, shader: GLuint) {
        if let Some(p) = self.programs.get_mut(&program) {
            p.attached.push(shader);
        }
        self.calls.push(Call::AttachShader { program, shader });
    }

    fn detach_shader(&mut self, program: GLuint, shader: GLuint) {
        if let Some(p) = self.programs.get_mut(&program) {
            p.attached.retain(|s| *s != shader);
        }
        self.calls.push(Call::DetachShader { program, shader });
    }

    fn link_program(&mut self, program: GLuint) -> bool {
        let Some(p) = self.programs.get(&program) else {
            self.calls.push(Call::LinkProgram {
                program,
                linked: false,
            });
            return false;
        };

        let result = self.link_status(p);
        let compute_stage = match &result {
            Ok(stages) if stages.contains(&ShaderStage::Compute) => p
                .attached
                .iter()
                .filter_map(|s| self.shaders.get(s))
                .find(|s| s.stage == ShaderStage::Compute),
            _ => None,
        };
        let local_size = compute_stage.map_or([1, 1, 1], |s| s.local_size);
        let kernel = compute_stage.and_then(|s| {
            self.kernels
                .iter()
                .find(|(src, _)| *src == s.source)
                .map(|(_, k)| *k)
        });

        let linked = result.is_ok();
        if let Some(p) = self.programs.get_mut(&program) {
            match result {
                Ok(stages) => {
                    p.linked = true;
                    p.stages = stages;
                    p.log.clear();
                    p.kernel = kernel;
                    p.local_size = local_size;
                }
                Err(log) => {
                    p.linked = false;
                    p.log = log;
                    p.kernel = None;
                }
            }
        }

        self.calls.push(Call::LinkProgram { program, linked });
        linked
    }

    fn program_info_log(&mut self, program: GLuint) -> String {
        self.programs
            .get(&program)
            .map(|p| p.log.clone())
            .unwrap_or_default()
    }

    fn use_program(&mut self, program: GLuint) {
        self.current_program = program;
        self.calls.push(Call::UseProgram(program));
    }

    fn delete_program(&mut self, program: GLuint) {
        self.release(ObjectKind::Program, program);
        if !self.live.contains_key(&program) {
            self.programs.remove(&program);
        }
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> GLuint {
        let name = self.alloc(ObjectKind::Texture);
        self.textures.insert(name, TextureObject::new(*desc));
        self.calls.push(Call::CreateTexture(name));
        name
    }

    fn bind_image_texture(
        &mut self,
        unit: u32,
        texture: GLuint,
        access: ImageAccess,
        format: TextureFormat,
    ) {
        debug_assert_eq!(format, TextureFormat::Rgba32F);
        self.image_units.insert(unit, (texture, access));
        self.calls.push(Call::BindImageTexture {
            unit,
            texture,
            access,
        });
    }

    fn bind_texture_unit(&mut self, unit: u32, texture: GLuint) {
        self.texture_units.insert(unit, texture);
        self.calls.push(Call::BindTextureUnit { unit, texture });
    }

    fn delete_texture(&mut self, texture: GLuint) {
        self.release(ObjectKind::Texture, texture);
        if !self.live.contains_key(&texture) {
            self.textures.remove(&texture);
            self.image_units.retain(|_, (t, _)| *t != texture);
            self.texture_units.retain(|_, t| *t != texture);
        }
    }

    fn delete_buffer(&mut self, buffer: GLuint) {
        self.release(ObjectKind::Buffer, buffer);
    }

    fn delete_vertex_array(&mut self, vao: GLuint) {
        self.release(ObjectKind::VertexArray, vao);
    }

    fn compute_limits(&mut self) -> ComputeLimits {
        self.calls.push(Call::QueryComputeLimits);
        self.limits
    }

    fn dispatch_compute(&mut self, groups: [u32; 3]) {
        self.calls.push(Call::DispatchCompute(groups));

        let kernel = self
            .programs
            .get(&self.current_program)
            .filter(|p| p.linked && p.stages == [ShaderStage::Compute])
            .and_then(|p| p.kernel.map(|k| (k, p.local_size)));

        match kernel {
            Some((kernel, local_size)) => self.run_kernel(kernel, local_size, groups),
            None => tracing::warn!(
                program = self.current_program,
                "dispatch without a linked compute program with a known kernel"
            ),
        }
    }

    fn memory_barrier(&mut self, barrier: Barrier) {
        self.calls.push(Call::MemoryBarrier(barrier));
        if barrier.covers_texture_fetch() {
            for tex in self.textures.values_mut() {
                tex.make_visible();
            }
        }
    }

    fn clear_color(&mut self) {
        self.calls.push(Call::Clear);
    }

    fn draw_indexed_triangles(&mut self, count: u32) {
        self.calls.push(Call::DrawIndexed(count));

        let program_ok = self
            .programs
            .get(&self.current_program)
            .is_some_and(|p| p.linked && p.stages.contains(&ShaderStage::Fragment));
        let texture = self
            .texture_units
            .get(&trycompute_core::shaders::SAMPLER_TEXTURE_UNIT)
            .copied()
            .unwrap_or(0);
        let uniform_color = if program_ok {
            self.textures.get(&texture).and_then(|t| t.uniform_color())
        } else {
            None
        };

        self.draws.push(DrawRecord {
            program: self.current_program,
            vao: self.current_vao,
            texture,
            index_count: count,
            uniform_color,
        });
    }

    fn viewport(&mut self, width: u32, height: u32) {
        self.calls.push(Call::Viewport(width, height));
    }
}
