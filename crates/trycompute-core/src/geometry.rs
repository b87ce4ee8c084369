//! Quad geometry uploaded once at setup.

/// Floats per vertex (x, y, z).
pub const COMPONENTS_PER_VERTEX: usize = 3;

/// Four corners of the quad. The last vertex has z = 0.5, which is invisible
/// without a depth test.
pub const QUAD_VERTICES: [f32; 12] = [
    // X     Y     Z
    0.5, 0.5, 0.0, //
    0.5, -0.5, 0.0, //
    -0.5, -0.5, 0.0, //
    -0.5, 0.5, 0.5,
];

/// Two triangles sharing the 1-3 diagonal.
pub const QUAD_INDICES: [u32; 6] = [0, 1, 3, 1, 2, 3];

/// Layout of the single vertex attribute the raster program reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub location: u32,
    pub components: u32,
    /// Byte distance between consecutive vertices.
    pub stride: u32,
    pub offset: u32,
    pub normalized: bool,
}

/// Position attribute: location 0, three tightly packed floats.
pub const POSITION_ATTRIBUTE: VertexAttribute = VertexAttribute {
    location: 0,
    components: COMPONENTS_PER_VERTEX as u32,
    stride: (COMPONENTS_PER_VERTEX * std::mem::size_of::<f32>()) as u32,
    offset: 0,
    normalized: false,
};

/// Number of vertices described by [`QUAD_VERTICES`].
pub const fn vertex_count() -> usize {
    QUAD_VERTICES.len() / COMPONENTS_PER_VERTEX
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_has_four_vertices_and_two_triangles() {
        assert_eq!(vertex_count(), 4);
        assert_eq!(QUAD_INDICES.len() % 3, 0);
        assert_eq!(QUAD_INDICES.len() / 3, 2);
    }

    #[test]
    fn indices_stay_within_vertex_range() {
        assert!(QUAD_INDICES.iter().all(|&i| (i as usize) < vertex_count()));
    }

    #[test]
    fn position_attribute_is_tightly_packed() {
        assert_eq!(POSITION_ATTRIBUTE.location, 0);
        assert_eq!(POSITION_ATTRIBUTE.components, 3);
        assert_eq!(POSITION_ATTRIBUTE.stride, 12);
        assert_eq!(POSITION_ATTRIBUTE.offset, 0);
    }
}
