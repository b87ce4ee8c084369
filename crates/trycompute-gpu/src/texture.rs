//! The image the compute shader writes and the fragment shader samples.

use gl::types::GLuint;

use crate::api::{GraphicsApi, ImageAccess, TextureDesc};

/// A 2D texture name and its dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuTexture {
    pub(crate) name: GLuint,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

impl GpuTexture {
    /// Allocate an RGBA32F storage image and bind it write-only to `image_unit`.
    pub fn storage_image<A>(api: &mut A, width: u32, height: u32, image_unit: u32) -> Self
    where
        A: GraphicsApi + ?Sized,
    {
        let desc = TextureDesc::storage_image(width, height);
        let name = api.create_texture(&desc);
        api.bind_image_texture(image_unit, name, ImageAccess::WriteOnly, desc.format);

        tracing::debug!(name, width, height, image_unit, "storage image created");

        Self {
            name,
            width,
            height,
        }
    }

    pub fn name(&self) -> GLuint {
        self.name
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
