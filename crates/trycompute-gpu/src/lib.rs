//! GPU side of the TryCompute demo.
//!
//! # Overview
//!
//! - [`GraphicsApi`] is the seam between the demo and OpenGL.
//! - [`GlDevice`] implements it with raw `gl` calls; [`SoftwareDevice`]
//!   implements it on the CPU for headless runs and tests.
//! - [`GpuContext`] owns the quad buffers, both programs and the compute
//!   target, and exposes the setup / per-frame / teardown routines.
//! - [`dispatch`] holds the two halves of a frame: the compute dispatch with
//!   its image barrier, and the textured quad draw.

pub mod api;
pub mod buffer;
pub mod bytes;
pub mod context;
pub mod dispatch;
pub mod gl_device;
pub mod pipeline;
pub mod software;
pub mod texture;

// Re-export primary types at crate root for convenience.
pub use api::{Barrier, ComputeLimits, GraphicsApi};
pub use buffer::GpuBuffer;
pub use bytes::AsBytes;
pub use context::{FrameStats, GpuContext, ShaderSources};
pub use gl_device::GlDevice;
pub use pipeline::{ComputePipeline, RenderPipeline, ShaderDiagnostic};
pub use software::SoftwareDevice;
pub use texture::GpuTexture;
