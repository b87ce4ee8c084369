//! Window + OpenGL context for the demo, built with glium's glutin backend.
//!
//! glium owns context creation, the surface and buffer swaps. All drawing goes
//! through raw `gl` calls, whose function pointers [`GlWindow::create`] loads
//! once the context is current.

use std::fmt::{Debug, Formatter};

use anyhow::Result;
use glium::backend::glutin::{Display, SimpleWindowBuilder};
use glium::backend::Facade;
use glium::glutin::surface::WindowSurface;
use winit::event_loop::EventLoop;
use winit::window::Window;

mod gl_backend;
pub mod glsl;

pub use gl_backend::load_gl_functions;

/// A winit window with a current OpenGL context.
pub struct GlWindow {
    window: Window,
    display: Display<WindowSurface>,
}

impl Debug for GlWindow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlWindow")
            .field("window", &self.window.id())
            .finish()
    }
}

impl GlWindow {
    /// Open a window of `width` x `height` and make its context current.
    pub fn create<T>(event_loop: &EventLoop<T>, title: &str, width: u32, height: u32) -> Result<Self> {
        let (window, display) = SimpleWindowBuilder::new()
            .with_title(title)
            .with_inner_size(width, height)
            .build(event_loop);

        let version = display.get_opengl_version_string();
        tracing::debug!("OPENGL_VERSION {version}");

        load_gl_functions()?;

        if !glsl::context_supports_compute(&**display.get_context()) {
            tracing::warn!(
                "context does not report GLSL 4.30; compute shaders will likely fail to compile"
            );
        }

        Ok(Self { window, display })
    }

    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }

    /// Resize the surface after a window resize.
    pub fn resize(&self, width: u32, height: u32) {
        self.display.resize((width, height));
    }

    /// Present the frame drawn with raw GL calls.
    pub fn swap_buffers(&self) -> Result<()> {
        self.display
            .swap_buffers()
            .map_err(|e| anyhow::anyhow!("swap_buffers failed: {e:?}"))
    }
}
