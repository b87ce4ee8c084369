//! [`GpuContext`]: every GPU object the demo owns, with its setup, per-frame
//! and teardown routines.
//!
//! The context does not hold the [`GraphicsApi`]; each routine borrows it.
//! That keeps the context usable with both the GL device and the software
//! device, and keeps the "which context is current" question with the caller.

use gl::types::GLuint;
use tracing::{debug, info};
use trycompute_core::config::TextureConfig;
use trycompute_core::geometry::{POSITION_ATTRIBUTE, QUAD_INDICES, QUAD_VERTICES};
use trycompute_core::shaders::{
    COMPUTE_LOCAL_SIZE, COMPUTE_SHADER, FRAGMENT_SHADER, OUTPUT_IMAGE_UNIT,
    SAMPLER_TEXTURE_UNIT, VERTEX_SHADER,
};

use crate::api::{BufferTarget, ComputeLimits, GraphicsApi};
use crate::buffer::GpuBuffer;
use crate::dispatch::{dispatch_to_image, draw_textured_quad};
use crate::pipeline::{ComputePipeline, RenderPipeline, ShaderDiagnostic};
use crate::texture::GpuTexture;

/// Shader sources used by [`GpuContext::setup_with`].
#[derive(Debug, Clone, Copy)]
pub struct ShaderSources<'a> {
    pub vertex: &'a str,
    pub fragment: &'a str,
    pub compute: &'a str,
    pub compute_local_size: [u32; 3],
}

impl Default for ShaderSources<'static> {
    fn default() -> Self {
        Self {
            vertex: VERTEX_SHADER,
            fragment: FRAGMENT_SHADER,
            compute: COMPUTE_SHADER,
            compute_local_size: COMPUTE_LOCAL_SIZE,
        }
    }
}

/// Summary of one rendered frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    /// Work groups dispatched to the compute program.
    pub work_groups: [u32; 3],
    /// Indices drawn.
    pub indices: u32,
}

/// GPU objects for the quad, both programs and the compute target.
///
/// Created by [`setup`](GpuContext::setup), used by
/// [`render_frame`](GpuContext::render_frame) and released by
/// [`teardown`](GpuContext::teardown). Teardown can be called any number of
/// times; only the first call releases anything.
#[derive(Debug)]
pub struct GpuContext {
    vao: GLuint,
    vbo: GpuBuffer,
    ebo: GpuBuffer,
    raster: RenderPipeline,
    compute: ComputePipeline,
    output: GpuTexture,
    limits: ComputeLimits,
    released: bool,
}

impl GpuContext {
    /// Build everything with the embedded shaders.
    pub fn setup<A>(api: &mut A, texture: TextureConfig) -> Self
    where
        A: GraphicsApi + ?Sized,
    {
        Self::setup_with(api, texture, ShaderSources::default())
    }

    /// Build everything from the given shader sources.
    ///
    /// Shader compile or link failures do not stop setup; they are logged and
    /// available from [`diagnostics`](GpuContext::diagnostics).
    pub fn setup_with<A>(api: &mut A, texture: TextureConfig, sources: ShaderSources<'_>) -> Self
    where
        A: GraphicsApi + ?Sized,
    {
        // Geometry: the VAO must be bound before the buffers so it captures
        // the element buffer binding and the attribute layout.
        let vao = api.create_vertex_array();
        let vbo = GpuBuffer::upload(api, BufferTarget::Vertex, &QUAD_VERTICES);
        let ebo = GpuBuffer::upload(api, BufferTarget::Index, &QUAD_INDICES);

        let raster = RenderPipeline::compile(api, sources.vertex, sources.fragment);

        api.vertex_attribute(POSITION_ATTRIBUTE);

        let output = GpuTexture::storage_image(api, texture.width, texture.height, OUTPUT_IMAGE_UNIT);

        let limits = api.compute_limits();
        let [x, y, z] = limits.max_work_group_size;
        info!("MaxComputeWorkGroupSize: {x} {y} {z}");
        info!(
            "MaxComputeWorkGroupInvocations: {}",
            limits.max_work_group_invocations
        );

        let compute = ComputePipeline::compile(api, sources.compute, sources.compute_local_size);

        debug!(
            vao,
            vbo = vbo.name(),
            ebo = ebo.name(),
            raster = raster.program(),
            compute = compute.program(),
            texture = output.name(),
            "gpu context ready"
        );

        Self {
            vao,
            vbo,
            ebo,
            raster,
            compute,
            output,
            limits,
            released: false,
        }
    }

    /// One frame: compute dispatch, image barrier, clear, quad draw.
    ///
    /// Does nothing after teardown.
    pub fn render_frame<A>(&self, api: &mut A) -> Option<FrameStats>
    where
        A: GraphicsApi + ?Sized,
    {
        if self.released {
            return None;
        }

        let work_groups = dispatch_to_image(api, &self.compute, &self.output, Some(&self.limits));

        let indices = self.ebo.len() as u32;
        draw_textured_quad(
            api,
            &self.raster,
            self.vao,
            &self.output,
            SAMPLER_TEXTURE_UNIT,
            indices,
        );

        Some(FrameStats {
            work_groups,
            indices,
        })
    }

    /// Release every object. Returns whether anything was released.
    pub fn teardown<A>(&mut self, api: &mut A) -> bool
    where
        A: GraphicsApi + ?Sized,
    {
        if self.released {
            return false;
        }
        self.released = true;

        api.delete_buffer(self.vbo.name());
        api.delete_buffer(self.ebo.name());
        api.delete_vertex_array(self.vao);
        api.delete_program(self.raster.program());
        api.delete_program(self.compute.program());
        api.delete_texture(self.output.name());

        debug!("gpu context released");
        true
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn vertex_array(&self) -> GLuint {
        self.vao
    }

    pub fn vertex_buffer(&self) -> &GpuBuffer {
        &self.vbo
    }

    pub fn index_buffer(&self) -> &GpuBuffer {
        &self.ebo
    }

    pub fn raster_pipeline(&self) -> &RenderPipeline {
        &self.raster
    }

    pub fn compute_pipeline(&self) -> &ComputePipeline {
        &self.compute
    }

    pub fn output_texture(&self) -> &GpuTexture {
        &self.output
    }

    /// Shader problems from both programs, raster first.
    pub fn diagnostics(&self) -> impl Iterator<Item = &ShaderDiagnostic> {
        self.raster
            .diagnostics()
            .iter()
            .chain(self.compute.diagnostics())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Barrier, ImageAccess};
    use crate::software::{Call, ObjectKind, SoftwareDevice};
    use trycompute_core::shaders::FLAT_BLUE;

    fn setup() -> (SoftwareDevice, GpuContext) {
        let mut dev = SoftwareDevice::new();
        let ctx = GpuContext::setup(&mut dev, TextureConfig::default());
        (dev, ctx)
    }

    #[test]
    fn setup_creates_exactly_six_objects() {
        let (dev, ctx) = setup();

        assert_eq!(dev.live_object_count(), 6);
        assert_eq!(dev.live_count(ObjectKind::Buffer), 2);
        assert_eq!(dev.live_count(ObjectKind::VertexArray), 1);
        assert_eq!(dev.live_count(ObjectKind::Program), 2);
        assert_eq!(dev.live_count(ObjectKind::Texture), 1);
        assert_eq!(dev.live_shader_count(), 0);

        assert_eq!(ctx.diagnostics().count(), 0);
    }

    #[test]
    fn buffers_hold_quad_geometry() {
        let (dev, ctx) = setup();

        assert_eq!(ctx.vertex_buffer().size(), 48);
        assert_eq!(ctx.index_buffer().len(), 6);
        assert!(dev.calls().contains(&Call::CreateBuffer {
            name: ctx.index_buffer().name(),
            target: BufferTarget::Index,
            size: 24,
        }));
        assert!(dev.calls().contains(&Call::VertexAttribute(POSITION_ATTRIBUTE)));
    }

    #[test]
    fn output_texture_is_bound_write_only_at_unit_zero() {
        let (dev, ctx) = setup();
        let tex = ctx.output_texture().name();

        let desc = dev.texture_desc(tex).unwrap();
        assert_eq!((desc.width, desc.height), (512, 512));
        assert!(dev.calls().contains(&Call::BindImageTexture {
            unit: 0,
            texture: tex,
            access: ImageAccess::WriteOnly,
        }));
    }

    #[test]
    fn limits_are_queried_before_compute_program_is_built() {
        let (dev, ctx) = setup();
        let calls = dev.calls();
        let query = calls
            .iter()
            .position(|c| *c == Call::QueryComputeLimits)
            .unwrap();
        let compute_link = calls
            .iter()
            .position(|c| {
                *c == Call::LinkProgram {
                    program: ctx.compute_pipeline().program(),
                    linked: true,
                }
            })
            .unwrap();
        assert!(query < compute_link);
    }

    #[test]
    fn frame_runs_dispatch_barrier_clear_draw_in_order() {
        let (mut dev, ctx) = setup();
        dev.clear_calls();

        for _ in 0..3 {
            ctx.render_frame(&mut dev).unwrap();
        }

        let frame = vec![
            Call::UseProgram(ctx.compute_pipeline().program()),
            Call::DispatchCompute([512, 512, 1]),
            Call::MemoryBarrier(Barrier::ImageAccessAndTextureFetch),
            Call::Clear,
            Call::UseProgram(ctx.raster_pipeline().program()),
            Call::BindVertexArray(ctx.vertex_array()),
            Call::BindTextureUnit {
                unit: 0,
                texture: ctx.output_texture().name(),
            },
            Call::DrawIndexed(6),
        ];
        let expected: Vec<Call> = frame.iter().cloned().cycle().take(frame.len() * 3).collect();
        assert_eq!(dev.calls(), expected.as_slice());
    }

    #[test]
    fn frame_stats_report_dispatch_grid() {
        let (mut dev, ctx) = setup();
        let stats = ctx.render_frame(&mut dev).unwrap();
        assert_eq!(
            stats,
            FrameStats {
                work_groups: [512, 512, 1],
                indices: 6
            }
        );
    }

    #[test]
    fn one_frame_turns_every_texel_blue() {
        let (mut dev, ctx) = setup();
        let tex = ctx.output_texture().name();
        assert_eq!(dev.uniform_color(tex), Some([0.0; 4]));

        ctx.render_frame(&mut dev);

        assert_eq!(dev.uniform_color(tex), Some(FLAT_BLUE));
        assert_eq!(dev.texel(tex, 0, 0), Some(FLAT_BLUE));
        assert_eq!(dev.texel(tex, 511, 511), Some(FLAT_BLUE));

        let draw = dev.draws().last().unwrap();
        assert_eq!(draw.texture, tex);
        assert_eq!(draw.uniform_color, Some(FLAT_BLUE));
    }

    #[test]
    fn teardown_releases_each_object_once() {
        let (mut dev, mut ctx) = setup();

        assert!(!ctx.is_released());
        assert!(ctx.teardown(&mut dev));
        assert!(ctx.is_released());
        assert!(!ctx.teardown(&mut dev));

        for name in [
            ctx.vertex_buffer().name(),
            ctx.index_buffer().name(),
            ctx.vertex_array(),
            ctx.raster_pipeline().program(),
            ctx.compute_pipeline().program(),
            ctx.output_texture().name(),
        ] {
            assert_eq!(dev.deletions_of(name), 1, "object {name}");
        }
        assert_eq!(dev.live_object_count(), 0);
    }

    #[test]
    fn render_after_teardown_is_a_no_op() {
        let (mut dev, mut ctx) = setup();
        ctx.teardown(&mut dev);
        dev.clear_calls();

        assert_eq!(ctx.render_frame(&mut dev), None);
        assert!(dev.calls().is_empty());
    }

    #[test]
    fn broken_shader_still_produces_a_context() {
        let mut dev = SoftwareDevice::new();
        let sources = ShaderSources {
            fragment: "garbage",
            ..ShaderSources::default()
        };
        let ctx = GpuContext::setup_with(&mut dev, TextureConfig::default(), sources);

        assert!(!ctx.raster_pipeline().is_usable());
        assert!(ctx.compute_pipeline().is_usable());
        assert_eq!(dev.live_object_count(), 6);

        // The frame still runs; the draw just samples nothing useful.
        ctx.render_frame(&mut dev).unwrap();
        assert_eq!(dev.draws().last().unwrap().uniform_color, None);
    }

    #[test]
    fn dispatch_beyond_reported_limits_still_runs() {
        let mut dev = SoftwareDevice::new().with_limits(ComputeLimits {
            max_work_group_size: [1024, 1024, 64],
            max_work_group_invocations: 1024,
            max_work_group_count: [256, 256, 1],
        });
        let ctx = GpuContext::setup(&mut dev, TextureConfig::default());
        dev.clear_calls();

        let stats = ctx.render_frame(&mut dev).unwrap();

        assert_eq!(stats.work_groups, [512, 512, 1]);
        assert!(dev.calls().contains(&Call::DispatchCompute([512, 512, 1])));
        assert_eq!(dev.draws().len(), 1);
    }

    fn red(_: [u32; 3]) -> [f32; 4] {
        [1.0, 0.0, 0.0, 1.0]
    }

    #[test]
    fn tiled_compute_source_covers_the_whole_image() {
        const TILED: &str = "#version 430 core\n\
            layout(local_size_x = 16, local_size_y = 16) in;\n\
            layout(rgba32f, binding = 0) uniform image2D img_output;\n\
            void main() {}\n";

        let mut dev = SoftwareDevice::new().with_kernel(TILED, red);
        let sources = ShaderSources {
            compute: TILED,
            compute_local_size: [16, 16, 1],
            ..ShaderSources::default()
        };
        let ctx = GpuContext::setup_with(&mut dev, TextureConfig::default(), sources);

        let stats = ctx.render_frame(&mut dev).unwrap();

        assert_eq!(stats.work_groups, [32, 32, 1]);
        let tex = ctx.output_texture().name();
        assert_eq!(dev.uniform_color(tex), Some([1.0, 0.0, 0.0, 1.0]));
    }

    #[test]
    fn custom_texture_size_changes_dispatch_grid() {
        let mut dev = SoftwareDevice::new();
        let ctx = GpuContext::setup(
            &mut dev,
            TextureConfig {
                width: 64,
                height: 32,
            },
        );
        let stats = ctx.render_frame(&mut dev).unwrap();
        assert_eq!(stats.work_groups, [64, 32, 1]);
        assert_eq!(dev.uniform_color(ctx.output_texture().name()), Some(FLAT_BLUE));
    }
}
