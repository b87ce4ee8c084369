//! Byte views of plain numeric data for buffer uploads.

/// A plain numeric type whose memory can be handed to `glBufferData` as is.
///
/// # Safety
///
/// Only implement on types with no padding, pointers, or invalid bit
/// patterns (f32, u32, ...).
pub unsafe trait AsBytes: Copy + Sized {
    /// View `self` as a byte slice of length `size_of::<Self>()`.
    fn as_bytes(&self) -> &[u8] {
        unsafe {
            std::slice::from_raw_parts(self as *const Self as *const u8, std::mem::size_of::<Self>())
        }
    }
}

unsafe impl AsBytes for f32 {}
unsafe impl AsBytes for u32 {}

/// View a slice of [`AsBytes`] values as raw bytes.
pub fn slice_as_bytes<T: AsBytes>(data: &[T]) -> &[u8] {
    unsafe { std::slice::from_raw_parts(data.as_ptr() as *const u8, std::mem::size_of_val(data)) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_length_is_element_size_times_count() {
        let v = [1.0f32, 2.0, 3.0];
        assert_eq!(slice_as_bytes(&v).len(), 12);
        assert_eq!(slice_as_bytes::<u32>(&[]).len(), 0);
    }

    #[test]
    fn bytes_are_native_endian_representation() {
        let v = [0x0102_0304u32];
        assert_eq!(slice_as_bytes(&v), &0x0102_0304u32.to_ne_bytes());
        assert_eq!(1.5f32.as_bytes(), &1.5f32.to_ne_bytes());
    }
}
