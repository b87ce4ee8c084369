//! GLSL version checks.

use glium::{Api, CapabilitiesSource, Version};

/// GLSL 4.30: compute shaders, `imageStore` and explicit bindings.
pub const COMPUTE_GLSL: Version = Version(Api::Gl, 4, 3);

/// Whether any of `versions` is desktop GLSL at or above [`COMPUTE_GLSL`].
pub fn supports_compute(versions: &[Version]) -> bool {
    versions
        .iter()
        .any(|v| v.0 == Api::Gl && (v.1, v.2) >= (COMPUTE_GLSL.1, COMPUTE_GLSL.2))
}

/// Check the context's GLSL versions, logging what was found.
pub fn context_supports_compute(ctx: &impl CapabilitiesSource) -> bool {
    let versions = &ctx.get_capabilities().supported_glsl_versions;
    tracing::debug!("VALID GLSL VERSIONS: {versions:?}");
    supports_compute(versions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gl_430_and_above_support_compute() {
        assert!(supports_compute(&[Version(Api::Gl, 4, 3)]));
        assert!(supports_compute(&[Version(Api::Gl, 1, 4), Version(Api::Gl, 4, 6)]));
    }

    #[test]
    fn older_or_es_versions_do_not() {
        assert!(!supports_compute(&[]));
        assert!(!supports_compute(&[Version(Api::Gl, 4, 1), Version(Api::Gl, 3, 3)]));
        assert!(!supports_compute(&[Version(Api::GlEs, 3, 2)]));
    }
}
