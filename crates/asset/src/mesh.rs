//! CPU-side mesh representation used by loaders.

use bytemuck::{Pod, Zeroable};

/// Index type shared by every mesh; the registry packs all indices into one
/// 16-bit index buffer.
pub type MeshIndex = u16;

/// Vertex as uploaded to the GPU: shader locations 0..3 in field order.
/// Positions/normals are in object space; normals are unit length by
/// construction at load time.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
    pub uv: [f32; 2],
    pub normal: [f32; 3],
}

impl Vertex {
    pub fn new(position: [f32; 3], color: [f32; 4], uv: [f32; 2], normal: [f32; 3]) -> Self {
        Self {
            position,
            color,
            uv,
            normal,
        }
    }
}

/// Indexed triangle mesh with tightly-packed vertices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<MeshIndex>,
}

impl MeshData {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<MeshIndex>) -> Self {
        Self { vertices, indices }
    }

    /// Returns `true` if both vertex and index buffers are non-empty.
    pub fn is_valid(&self) -> bool {
        !self.vertices.is_empty() && !self.indices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_is_twelve_floats() {
        // The GPU vertex layout depends on this exact packing.
        assert_eq!(std::mem::size_of::<Vertex>(), 48);
    }

    #[test]
    fn mesh_data_validity() {
        let data = MeshData::new(vec![Vertex::default()], vec![0]);
        assert!(data.is_valid());
        assert!(!MeshData::default().is_valid());
    }
}
