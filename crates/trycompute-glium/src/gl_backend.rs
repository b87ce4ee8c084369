//! Raw OpenGL function loading for the `gl` crate.

use std::sync::Once;

use anyhow::{bail, Result};

static GL_INIT_ONCE: Once = Once::new();

/// Load `gl` function pointers from the system GL library.
///
/// Pointers are loaded exactly once via `gl_loader`; later calls only check
/// that the entry points the demo needs resolved. Must be called with the
/// window's context current.
pub fn load_gl_functions() -> Result<()> {
    GL_INIT_ONCE.call_once(|| {
        gl_loader::init_gl();
        gl::load_with(|s| gl_loader::get_proc_address(s).cast());
        tracing::debug!("GL function pointers loaded");
    });

    let missing = missing_entry_points();
    if !missing.is_empty() {
        bail!(
            "OpenGL entry points unavailable (need GL 4.3): {}",
            missing.join(", ")
        );
    }
    Ok(())
}

/// Names of required entry points that did not resolve.
fn missing_entry_points() -> Vec<&'static str> {
    let checks: [(&'static str, bool); 6] = [
        ("glGetString", gl::GetString::is_loaded()),
        ("glDispatchCompute", gl::DispatchCompute::is_loaded()),
        ("glMemoryBarrier", gl::MemoryBarrier::is_loaded()),
        ("glBindImageTexture", gl::BindImageTexture::is_loaded()),
        ("glGenVertexArrays", gl::GenVertexArrays::is_loaded()),
        ("glDrawElements", gl::DrawElements::is_loaded()),
    ];
    checks
        .into_iter()
        .filter(|(_, loaded)| !loaded)
        .map(|(name, _)| name)
        .collect()
}
