//! Shader programs for the compute and raster passes.
//!
//! Compile and link problems are never fatal. They are logged and kept on the
//! pipeline as [`ShaderDiagnostic`]s; a broken program still gets a name and
//! the frame loop keeps running with whatever the driver does with it.

use gl::types::GLuint;
use tracing::{error, warn};

use crate::api::{GraphicsApi, ShaderStage};

/// A problem reported by the shader compiler or linker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderDiagnostic {
    /// Non-empty compiler log. `failed` is false for warnings.
    Compile {
        stage: ShaderStage,
        failed: bool,
        log: String,
    },
    /// Link status was false.
    Link { program: &'static str, log: String },
}

impl ShaderDiagnostic {
    /// Whether this diagnostic leaves the program unusable.
    pub fn is_failure(&self) -> bool {
        match self {
            ShaderDiagnostic::Compile { failed, .. } => *failed,
            ShaderDiagnostic::Link { .. } => true,
        }
    }
}

impl std::fmt::Display for ShaderDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShaderDiagnostic::Compile { stage, failed: true, log } => {
                write!(f, "Error compiling {stage} shader {log}")
            }
            ShaderDiagnostic::Compile { stage, failed: false, log } => {
                write!(f, "Warnings compiling {stage} shader {log}")
            }
            ShaderDiagnostic::Link { program, log } => {
                write!(f, "Error linking {program} program {log}")
            }
        }
    }
}

fn report(diag: &ShaderDiagnostic) {
    if diag.is_failure() {
        error!("{diag}");
    } else {
        warn!("{diag}");
    }
}

/// Compile one stage, collecting a diagnostic if the compiler said anything.
fn compile_stage<A>(
    api: &mut A,
    stage: ShaderStage,
    source: &str,
    diagnostics: &mut Vec<ShaderDiagnostic>,
) -> GLuint
where
    A: GraphicsApi + ?Sized,
{
    let shader = api.compile_shader(stage, source);
    let compiled = api.shader_compiled(shader);
    let log = api.shader_info_log(shader);

    if !compiled || !log.trim().is_empty() {
        let diag = ShaderDiagnostic::Compile {
            stage,
            failed: !compiled,
            log,
        };
        report(&diag);
        diagnostics.push(diag);
    }

    shader
}

/// Attach, link, then detach and delete the stage objects.
fn link<A>(
    api: &mut A,
    label: &'static str,
    shaders: &[GLuint],
    diagnostics: &mut Vec<ShaderDiagnostic>,
) -> GLuint
where
    A: GraphicsApi + ?Sized,
{
    let program = api.create_program();
    for &shader in shaders {
        api.attach_shader(program, shader);
    }

    if !api.link_program(program) {
        let diag = ShaderDiagnostic::Link {
            program: label,
            log: api.program_info_log(program),
        };
        report(&diag);
        diagnostics.push(diag);
    }

    // Stage objects are no longer needed once linked.
    for &shader in shaders {
        api.detach_shader(program, shader);
        api.delete_shader(shader);
    }

    program
}

/// Vertex + fragment program drawing the textured quad.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderPipeline {
    pub(crate) program: GLuint,
    pub(crate) diagnostics: Vec<ShaderDiagnostic>,
}

impl RenderPipeline {
    pub fn compile<A>(api: &mut A, vertex_src: &str, fragment_src: &str) -> Self
    where
        A: GraphicsApi + ?Sized,
    {
        let mut diagnostics = Vec::new();
        let vs = compile_stage(api, ShaderStage::Vertex, vertex_src, &mut diagnostics);
        let fs = compile_stage(api, ShaderStage::Fragment, fragment_src, &mut diagnostics);
        let program = link(api, "raster", &[vs, fs], &mut diagnostics);

        Self {
            program,
            diagnostics,
        }
    }

    pub fn program(&self) -> GLuint {
        self.program
    }

    pub fn diagnostics(&self) -> &[ShaderDiagnostic] {
        &self.diagnostics
    }

    /// False when a stage failed to compile or the program failed to link.
    pub fn is_usable(&self) -> bool {
        !self.diagnostics.iter().any(ShaderDiagnostic::is_failure)
    }
}

/// A single-stage compute program and its declared local work-group size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputePipeline {
    pub(crate) program: GLuint,
    pub(crate) local_size: [u32; 3],
    pub(crate) diagnostics: Vec<ShaderDiagnostic>,
}

impl ComputePipeline {
    /// `local_size` must match the `layout(local_size_*)` of `source`; it is
    /// what dispatch sizing divides by.
    pub fn compile<A>(api: &mut A, source: &str, local_size: [u32; 3]) -> Self
    where
        A: GraphicsApi + ?Sized,
    {
        let mut diagnostics = Vec::new();
        let cs = compile_stage(api, ShaderStage::Compute, source, &mut diagnostics);
        let program = link(api, "compute", &[cs], &mut diagnostics);

        Self {
            program,
            local_size,
            diagnostics,
        }
    }

    pub fn program(&self) -> GLuint {
        self.program
    }

    pub fn local_size(&self) -> [u32; 3] {
        self.local_size
    }

    pub fn diagnostics(&self) -> &[ShaderDiagnostic] {
        &self.diagnostics
    }

    pub fn is_usable(&self) -> bool {
        !self.diagnostics.iter().any(ShaderDiagnostic::is_failure)
    }
}
