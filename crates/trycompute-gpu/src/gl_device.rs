//! [`GlDevice`]: [`GraphicsApi`] on top of raw OpenGL.
//!
//! All calls assume a current GL 4.3 context whose function pointers have
//! been loaded with `gl::load_with` (see `trycompute-glium`).

use std::ffi::CString;
use std::ptr;

use anyhow::{bail, Result};
use gl::types::{GLchar, GLenum, GLint, GLsizei, GLsizeiptr, GLuint};
use trycompute_core::geometry::VertexAttribute;

use crate::api::{
    Barrier, BufferTarget, ComputeLimits, GraphicsApi, ImageAccess, ShaderStage, TextureDesc,
    TextureFormat,
};

/// Raw OpenGL device. Holds no state; the GL context is implicit.
#[derive(Debug)]
pub struct GlDevice {
    _private: (),
}

impl GlDevice {
    /// # Safety
    ///
    /// A GL context must be current on this thread for the lifetime of the
    /// device and GL function pointers must already be loaded.
    pub unsafe fn new() -> Result<Self> {
        let device = Self { _private: () };
        if !device.is_context_current() {
            bail!("no current OpenGL context");
        }
        Ok(device)
    }

    /// Whether a GL context appears to be current.
    pub fn is_context_current(&self) -> bool {
        unsafe { !gl::GetString(gl::VERSION).is_null() }
    }

    /// Fail if the GL error queue is non-empty, naming `stage` in the error.
    pub fn check_errors(&self, stage: &str) -> Result<()> {
        let errors = self.drain_errors();
        if errors.is_empty() {
            return Ok(());
        }
        let codes: Vec<String> = errors.iter().map(|e| format!("{e:#06x}")).collect();
        bail!("GL errors after {stage}: {}", codes.join(", "))
    }

    /// Drain the GL error queue, returning the errors seen.
    pub fn drain_errors(&self) -> Vec<GLenum> {
        let mut errors = Vec::new();
        unsafe {
            loop {
                let err = gl::GetError();
                if err == gl::NO_ERROR {
                    break;
                }
                errors.push(err);
            }
        }
        errors
    }
}

fn buffer_target(target: BufferTarget) -> GLenum {
    match target {
        BufferTarget::Vertex => gl::ARRAY_BUFFER,
        BufferTarget::Index => gl::ELEMENT_ARRAY_BUFFER,
    }
}

fn shader_type(stage: ShaderStage) -> GLenum {
    match stage {
        ShaderStage::Vertex => gl::VERTEX_SHADER,
        ShaderStage::Fragment => gl::FRAGMENT_SHADER,
        ShaderStage::Compute => gl::COMPUTE_SHADER,
    }
}

fn internal_format(format: TextureFormat) -> GLenum {
    match format {
        TextureFormat::Rgba32F => gl::RGBA32F,
    }
}

fn image_access(access: ImageAccess) -> GLenum {
    match access {
        ImageAccess::ReadOnly => gl::READ_ONLY,
        ImageAccess::WriteOnly => gl::WRITE_ONLY,
    }
}

fn barrier_bits(barrier: Barrier) -> GLenum {
    match barrier {
        Barrier::ShaderImageAccess => gl::SHADER_IMAGE_ACCESS_BARRIER_BIT,
        Barrier::TextureFetch => gl::TEXTURE_FETCH_BARRIER_BIT,
        Barrier::ImageAccessAndTextureFetch => {
            gl::SHADER_IMAGE_ACCESS_BARRIER_BIT | gl::TEXTURE_FETCH_BARRIER_BIT
        }
        Barrier::All => gl::ALL_BARRIER_BITS,
    }
}

/// Convert a size to `GLsizei`, saturating instead of wrapping negative.
fn gl_size(value: u32) -> GLsizei {
    GLsizei::try_from(value).unwrap_or(GLsizei::MAX)
}

/// Convert a GL info log buffer to a trimmed string.
fn log_to_string(mut buf: Vec<u8>, written: GLsizei) -> String {
    buf.truncate(written.max(0) as usize);
    String::from_utf8_lossy(&buf).trim_end_matches('\0').trim().to_string()
}

impl GraphicsApi for GlDevice {
    fn create_vertex_array(&mut self) -> GLuint {
        let mut vao = 0;
        unsafe {
            gl::GenVertexArrays(1, &mut vao);
            gl::BindVertexArray(vao);
        }
        vao
    }

    fn bind_vertex_array(&mut self, vao: GLuint) {
        unsafe { gl::BindVertexArray(vao) }
    }

    fn create_buffer(&mut self, target: BufferTarget, data: &[u8]) -> GLuint {
        let target = buffer_target(target);
        let mut buffer = 0;
        unsafe {
            gl::GenBuffers(1, &mut buffer);
            gl::BindBuffer(target, buffer);
            gl::BufferData(
                target,
                data.len() as GLsizeiptr,
                data.as_ptr().cast(),
                gl::STATIC_DRAW,
            );
        }
        buffer
    }

    fn vertex_attribute(&mut self, attribute: VertexAttribute) {
        unsafe {
            gl::VertexAttribPointer(
                attribute.location,
                attribute.components as GLint,
                gl::FLOAT,
                if attribute.normalized { gl::TRUE } else { gl::FALSE },
                attribute.stride as GLsizei,
                attribute.offset as usize as *const _,
            );
            gl::EnableVertexAttribArray(attribute.location);
        }
    }

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> GLuint {
        // Interior NULs cannot come from the embedded sources; strip them
        // rather than fail so the driver reports the real problem.
        let src = CString::new(source.replace('\0', "")).unwrap_or_default();
        unsafe {
            let shader = gl::CreateShader(shader_type(stage));
            gl::ShaderSource(shader, 1, &src.as_ptr(), ptr::null());
            gl::CompileShader(shader);
            shader
        }
    }

    fn shader_compiled(&mut self, shader: GLuint) -> bool {
        let mut status = GLint::from(gl::FALSE);
        unsafe { gl::GetShaderiv(shader, gl::COMPILE_STATUS, &mut status) };
        status != GLint::from(gl::FALSE)
    }

    fn shader_info_log(&mut self, shader: GLuint) -> String {
        let mut len: GLint = 0;
        unsafe { gl::GetShaderiv(shader, gl::INFO_LOG_LENGTH, &mut len) };
        if len <= 0 {
            return String::new();
        }
        let mut buf = vec![0u8; len as usize];
        let mut written: GLsizei = 0;
        unsafe {
            gl::GetShaderInfoLog(shader, len, &mut written, buf.as_mut_ptr() as *mut GLchar);
        }
        log_to_string(buf, written)
    }

    fn delete_shader(&mut self, shader: GLuint) {
        unsafe { gl::DeleteShader(shader) }
    }

    fn create_program(&mut self) -> GLuint {
        unsafe { gl::CreateProgram() }
    }

    fn attach_shader(&mut self, program: GLuint, shader: GLuint) {
        unsafe { gl::AttachShader(program, shader) }
    }

    fn detach_shader(&mut self, program: GLuint, shader: GLuint) {
        unsafe { gl::DetachShader(program, shader) }
    }

    fn link_program(&mut self, program: GLuint) -> bool {
        let mut status = GLint::from(gl::FALSE);
        unsafe {
            gl::LinkProgram(program);
            gl::GetProgramiv(program, gl::LINK_STATUS, &mut status);
        }
        status != GLint::from(gl::FALSE)
    }

    fn program_info_log(&mut self, program: GLuint) -> String {
        let mut len: GLint = 0;
        unsafe { gl::GetProgramiv(program, gl::INFO_LOG_LENGTH, &mut len) };
        if len <= 0 {
            return String::new();
        }
        let mut buf = vec![0u8; len as usize];
        let mut written: GLsizei = 0;
        unsafe {
            gl::GetProgramInfoLog(program, len, &mut written, buf.as_mut_ptr() as *mut GLchar);
        }
        log_to_string(buf, written)
    }

    fn use_program(&mut self, program: GLuint) {
        unsafe { gl::UseProgram(program) }
    }

    fn delete_program(&mut self, program: GLuint) {
        unsafe { gl::DeleteProgram(program) }
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> GLuint {
        let mut tex = 0;
        unsafe {
            gl::GenTextures(1, &mut tex);
            gl::BindTexture(gl::TEXTURE_2D, tex);
            let clamp = gl::CLAMP_TO_EDGE as GLint;
            let linear = gl::LINEAR as GLint;
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, clamp);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, clamp);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, linear);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, linear);
            gl::TexImage2D(
                gl::TEXTURE_2D,
                0,
                internal_format(desc.format) as GLint,
                gl_size(desc.width),
                gl_size(desc.height),
                0,
                gl::RGBA,
                gl::FLOAT,
                ptr::null(),
            );
        }
        tex
    }

    fn bind_image_texture(
        &mut self,
        unit: u32,
        texture: GLuint,
        access: ImageAccess,
        format: TextureFormat,
    ) {
        unsafe {
            gl::BindImageTexture(
                unit,
                texture,
                0,
                gl::FALSE,
                0,
                image_access(access),
                internal_format(format),
            );
        }
    }

    fn bind_texture_unit(&mut self, unit: u32, texture: GLuint) {
        unsafe {
            gl::ActiveTexture(gl::TEXTURE0 + unit);
            gl::BindTexture(gl::TEXTURE_2D, texture);
        }
    }

    fn delete_texture(&mut self, texture: GLuint) {
        unsafe { gl::DeleteTextures(1, &texture) }
    }

    fn delete_buffer(&mut self, buffer: GLuint) {
        unsafe { gl::DeleteBuffers(1, &buffer) }
    }

    fn delete_vertex_array(&mut self, vao: GLuint) {
        unsafe { gl::DeleteVertexArrays(1, &vao) }
    }

    fn compute_limits(&mut self) -> ComputeLimits {
        let mut size = [0 as GLint; 3];
        let mut count = [0 as GLint; 3];
        let mut invocations: GLint = 0;
        unsafe {
            for axis in 0..3 {
                gl::GetIntegeri_v(gl::MAX_COMPUTE_WORK_GROUP_SIZE, axis, &mut size[axis as usize]);
                gl::GetIntegeri_v(
                    gl::MAX_COMPUTE_WORK_GROUP_COUNT,
                    axis,
                    &mut count[axis as usize],
                );
            }
            gl::GetIntegerv(gl::MAX_COMPUTE_WORK_GROUP_INVOCATIONS, &mut invocations);
        }
        ComputeLimits {
            max_work_group_size: size.map(|v| v.max(0) as u32),
            max_work_group_invocations: invocations.max(0) as u32,
            max_work_group_count: count.map(|v| v.max(0) as u32),
        }
    }

    fn dispatch_compute(&mut self, groups: [u32; 3]) {
        unsafe { gl::DispatchCompute(groups[0], groups[1], groups[2]) }
    }

    fn memory_barrier(&mut self, barrier: Barrier) {
        unsafe { gl::MemoryBarrier(barrier_bits(barrier)) }
    }

    fn clear_color(&mut self) {
        unsafe { gl::Clear(gl::COLOR_BUFFER_BIT) }
    }

    fn draw_indexed_triangles(&mut self, count: u32) {
        unsafe {
            gl::DrawElements(gl::TRIANGLES, count as GLsizei, gl::UNSIGNED_INT, ptr::null());
        }
    }

    fn viewport(&mut self, width: u32, height: u32) {
        unsafe { gl::Viewport(0, 0, gl_size(width), gl_size(height)) }
    }
}
