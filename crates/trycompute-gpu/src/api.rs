//! The [`GraphicsApi`] trait: every GL entry point the demo uses.
//!
//! The real implementation is [`GlDevice`](crate::gl_device::GlDevice), which
//! forwards to the `gl` crate. [`SoftwareDevice`](crate::software::SoftwareDevice)
//! implements the same surface on the CPU so setup, the frame sequence and
//! teardown can run without a GL context.

use gl::types::GLuint;
use trycompute_core::geometry::VertexAttribute;

/// Buffer binding targets used for static geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// `GL_ARRAY_BUFFER`
    Vertex,
    /// `GL_ELEMENT_ARRAY_BUFFER`
    Index,
}

/// Shader stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Compute,
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
            ShaderStage::Compute => "compute",
        };
        f.write_str(name)
    }
}

/// Texel formats. Only the float format the compute shader writes is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    /// `GL_RGBA32F`
    Rgba32F,
}

impl TextureFormat {
    pub fn channels(self) -> usize {
        match self {
            TextureFormat::Rgba32F => 4,
        }
    }
}

/// Everything needed to allocate a 2D texture.
///
/// Sampling is always linear with clamp-to-edge wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

impl TextureDesc {
    /// RGBA32F: the compute output target.
    pub fn storage_image(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            format: TextureFormat::Rgba32F,
        }
    }
}

/// Access declared when binding a texture to an image unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageAccess {
    ReadOnly,
    WriteOnly,
}

/// Memory barrier kinds passed to `glMemoryBarrier`.
///
/// Image stores become visible to later image loads after
/// `ShaderImageAccess`, and to sampler fetches (`texture()`) only after a
/// barrier that includes the texture-fetch bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Barrier {
    /// `GL_SHADER_IMAGE_ACCESS_BARRIER_BIT`
    ShaderImageAccess,
    /// `GL_TEXTURE_FETCH_BARRIER_BIT`
    TextureFetch,
    /// `GL_SHADER_IMAGE_ACCESS_BARRIER_BIT | GL_TEXTURE_FETCH_BARRIER_BIT`:
    /// compute image stores followed by sampling in a later draw.
    ImageAccessAndTextureFetch,
    /// `GL_ALL_BARRIER_BITS`
    All,
}

impl Barrier {
    /// Whether image stores issued before this barrier are visible to
    /// sampler fetches after it.
    pub fn covers_texture_fetch(self) -> bool {
        matches!(
            self,
            Barrier::TextureFetch | Barrier::ImageAccessAndTextureFetch | Barrier::All
        )
    }
}

/// Compute limits reported by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComputeLimits {
    /// `GL_MAX_COMPUTE_WORK_GROUP_SIZE` for x, y, z.
    pub max_work_group_size: [u32; 3],
    /// `GL_MAX_COMPUTE_WORK_GROUP_INVOCATIONS`.
    pub max_work_group_invocations: u32,
    /// `GL_MAX_COMPUTE_WORK_GROUP_COUNT` for x, y, z.
    pub max_work_group_count: [u32; 3],
}

/// The subset of OpenGL the demo drives.
///
/// Object names are plain `GLuint`s; `0` is never a valid object. Methods that
/// wrap several GL calls (e.g. [`create_buffer`](GraphicsApi::create_buffer))
/// leave the created object bound, as the equivalent GL call sequence would.
pub trait GraphicsApi {
    /// Generate and bind a vertex array object.
    fn create_vertex_array(&mut self) -> GLuint;

    fn bind_vertex_array(&mut self, vao: GLuint);

    /// Generate a buffer, bind it to `target` and upload `data` as static draw.
    fn create_buffer(&mut self, target: BufferTarget, data: &[u8]) -> GLuint;

    /// Describe and enable a float vertex attribute on the bound VAO/VBO.
    fn vertex_attribute(&mut self, attribute: VertexAttribute);

    /// Create a shader object, set its source and compile it.
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> GLuint;

    fn shader_compiled(&mut self, shader: GLuint) -> bool;

    /// Compiler output for `shader`. Empty when there is nothing to report.
    fn shader_info_log(&mut self, shader: GLuint) -> String;

    fn delete_shader(&mut self, shader: GLuint);

    fn create_program(&mut self) -> GLuint;

    fn attach_shader(&mut self, program: GLuint, shader: GLuint);

    fn detach_shader(&mut self, program: GLuint, shader: GLuint);

    /// Link `program` and return `GL_LINK_STATUS`.
    fn link_program(&mut self, program: GLuint) -> bool;

    fn program_info_log(&mut self, program: GLuint) -> String;

    fn use_program(&mut self, program: GLuint);

    fn delete_program(&mut self, program: GLuint);

    /// Generate a 2D texture, set sampling parameters and allocate storage.
    fn create_texture(&mut self, desc: &TextureDesc) -> GLuint;

    /// Bind level 0 of `texture` to image unit `unit`.
    fn bind_image_texture(
        &mut self,
        unit: u32,
        texture: GLuint,
        access: ImageAccess,
        format: TextureFormat,
    );

    /// Activate texture unit `unit` and bind `texture` to its 2D target.
    fn bind_texture_unit(&mut self, unit: u32, texture: GLuint);

    fn delete_texture(&mut self, texture: GLuint);

    fn delete_buffer(&mut self, buffer: GLuint);

    fn delete_vertex_array(&mut self, vao: GLuint);

    fn compute_limits(&mut self) -> ComputeLimits;

    /// Launch work groups with the currently used compute program.
    fn dispatch_compute(&mut self, groups: [u32; 3]);

    fn memory_barrier(&mut self, barrier: Barrier);

    /// Clear the color buffer of the current framebuffer.
    fn clear_color(&mut self);

    /// Draw `count` unsigned-int indices from the bound EBO as triangles.
    fn draw_indexed_triangles(&mut self, count: u32);

    fn viewport(&mut self, width: u32, height: u32);
}
