//! Compute dispatch and quad drawing, the two halves of a frame.

use gl::types::GLuint;
use tracing::warn;

use crate::api::{Barrier, ComputeLimits, GraphicsApi};
use crate::pipeline::{ComputePipeline, RenderPipeline};
use crate::texture::GpuTexture;

/// Work groups needed to cover a `width` x `height` image with one invocation
/// per texel, rounding up on each axis.
pub fn work_groups_for(width: u32, height: u32, local_size: [u32; 3]) -> [u32; 3] {
    let [lx, ly, _] = local_size.map(|v| v.max(1));
    [width.div_ceil(lx), height.div_ceil(ly), 1]
}

/// Whether `groups` fits in the driver's per-axis work-group count limits.
pub fn fits_limits(groups: [u32; 3], limits: &ComputeLimits) -> bool {
    groups
        .iter()
        .zip(limits.max_work_group_count.iter())
        .all(|(g, max)| g <= max)
}

/// Run `pipeline` over every texel of `target`, then make the image writes
/// visible to later image loads and texture fetches. Returns the work-group
/// grid dispatched.
///
/// The barrier orders the compute writes before the sampler reads in
/// [`draw_textured_quad`]. An image-access bit alone does not cover
/// `texture()` reads.
pub fn dispatch_to_image<A>(
    api: &mut A,
    pipeline: &ComputePipeline,
    target: &GpuTexture,
    limits: Option<&ComputeLimits>,
) -> [u32; 3]
where
    A: GraphicsApi + ?Sized,
{
    let (width, height) = target.dimensions();
    let groups = work_groups_for(width, height, pipeline.local_size());

    if let Some(limits) = limits {
        if !fits_limits(groups, limits) {
            warn!(
                ?groups,
                max = ?limits.max_work_group_count,
                "dispatch exceeds MAX_COMPUTE_WORK_GROUP_COUNT"
            );
        }
    }

    api.use_program(pipeline.program());
    api.dispatch_compute(groups);
    api.memory_barrier(Barrier::ImageAccessAndTextureFetch);

    groups
}

/// Clear the framebuffer and draw the quad sampling `texture` on `unit`.
pub fn draw_textured_quad<A>(
    api: &mut A,
    pipeline: &RenderPipeline,
    vao: GLuint,
    texture: &GpuTexture,
    unit: u32,
    index_count: u32,
) where
    A: GraphicsApi + ?Sized,
{
    api.clear_color();
    api.use_program(pipeline.program());
    api.bind_vertex_array(vao);
    api.bind_texture_unit(unit, texture.name());
    api.draw_indexed_triangles(index_count);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_local_size_gives_one_group_per_texel() {
        assert_eq!(work_groups_for(512, 512, [1, 1, 1]), [512, 512, 1]);
    }

    #[test]
    fn larger_local_size_rounds_up() {
        assert_eq!(work_groups_for(512, 512, [16, 16, 1]), [32, 32, 1]);
        assert_eq!(work_groups_for(500, 33, [16, 16, 1]), [32, 3, 1]);
    }

    #[test]
    fn zero_local_size_is_treated_as_one() {
        assert_eq!(work_groups_for(8, 4, [0, 0, 0]), [8, 4, 1]);
    }

    #[test]
    fn limits_check_is_per_axis() {
        let limits = ComputeLimits {
            max_work_group_size: [1024, 1024, 64],
            max_work_group_invocations: 1024,
            max_work_group_count: [65535, 65535, 65535],
        };
        assert!(fits_limits([512, 512, 1], &limits));
        assert!(!fits_limits([70000, 1, 1], &limits));
    }
}
