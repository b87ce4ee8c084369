//! Static GPU buffers for quad geometry.

use gl::types::GLuint;

use crate::api::{BufferTarget, GraphicsApi};
use crate::bytes::{slice_as_bytes, AsBytes};

/// A buffer uploaded once and never modified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuBuffer {
    pub(crate) name: GLuint,
    /// Total size in bytes.
    pub(crate) size: usize,
    /// Number of elements uploaded.
    pub(crate) len: usize,
}

impl GpuBuffer {
    /// Create a buffer bound to `target` holding `data`.
    pub fn upload<A, T>(api: &mut A, target: BufferTarget, data: &[T]) -> Self
    where
        A: GraphicsApi + ?Sized,
        T: AsBytes,
    {
        let bytes = slice_as_bytes(data);
        let name = api.create_buffer(target, bytes);
        tracing::trace!(name, ?target, size = bytes.len(), "buffer uploaded");
        Self {
            name,
            size: bytes.len(),
            len: data.len(),
        }
    }

    pub fn name(&self) -> GLuint {
        self.name
    }

    /// Total size of this buffer in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn len(&self) -> usize {
        self.len
    }
}
