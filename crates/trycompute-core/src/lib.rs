//! Platform-independent pieces of the TryCompute demo.
//!
//! Nothing in this crate touches OpenGL. It holds the data the GPU side
//! consumes (quad geometry, embedded GLSL) and the ambient plumbing shared by
//! the other crates (configuration, logging, keyboard input).

pub mod config;
pub mod geometry;
pub mod inputs;
pub mod logging;
pub mod shaders;

pub use config::{AppConfig, TextureConfig, WindowConfig};
pub use inputs::{InputAction, Key};
