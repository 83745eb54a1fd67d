//! Mesh registry: packs every loaded OBJ into one shared vertex/index
//! buffer pair and hands out per-mesh draw metadata.

use std::mem;
use std::path::Path;

use anyhow::{Result, bail};
use wgpu::{
    Buffer, BufferUsages, Device, IndexFormat, RenderPass, VertexBufferLayout, VertexStepMode,
    util::DeviceExt,
};

use asset::mesh::{MeshData, MeshIndex, Vertex};
use asset::obj::load_obj;

/// GPU layout of [`Vertex`]: shader locations 0..3 in field order.
pub const VERTEX_LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
    array_stride: mem::size_of::<Vertex>() as u64,
    step_mode: VertexStepMode::Vertex,
    attributes: &wgpu::vertex_attr_array![
        0 => Float32x3, 1 => Float32x4, 2 => Float32x2, 3 => Float32x3,
    ],
};

const INDEX_SIZE: u64 = mem::size_of::<MeshIndex>() as u64;

/// A contiguous slice of the shared index buffer plus the base-vertex add
/// applied at draw time. Immutable once built; meshes are identified by
/// their position in load order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MeshDescriptor {
    pub index_count: u32,
    pub index_byte_offset: u64,
    pub base_vertex: i32,
}

impl MeshDescriptor {
    /// Position of the first index within the shared index buffer.
    #[inline]
    pub fn first_index(&self) -> u32 {
        (self.index_byte_offset / INDEX_SIZE) as u32
    }
}

/// Host-side result of packing multiple meshes into shared buffers.
#[derive(Debug, Default, PartialEq)]
pub struct PackedGeometry {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<MeshIndex>,
    pub descriptors: Vec<MeshDescriptor>,
}

/// Append each mesh to the shared accumulation buffers, recording one
/// descriptor per input in order. Indices are stored unmodified; the
/// base-vertex offset is applied by the draw call instead.
pub fn pack(meshes: &[MeshData]) -> PackedGeometry {
    let mut packed = PackedGeometry::default();
    packed.descriptors.reserve(meshes.len());

    for mesh in meshes {
        packed.descriptors.push(MeshDescriptor {
            index_count: mesh.indices.len() as u32,
            index_byte_offset: packed.indices.len() as u64 * INDEX_SIZE,
            base_vertex: packed.vertices.len() as i32,
        });
        packed.vertices.extend_from_slice(&mesh.vertices);
        packed.indices.extend_from_slice(&mesh.indices);
    }

    packed
}

/// Owns the one GPU vertex/index buffer pair all meshes are packed into,
/// plus the ordered descriptor list (descriptor i = i-th loaded file).
#[derive(Default)]
pub struct MeshRegistry {
    vertex_buffer: Option<Buffer>,
    index_buffer: Option<Buffer>,
    meshes: Vec<MeshDescriptor>,
}

impl MeshRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every OBJ path in the given order, pack the results into one
    /// buffer pair and upload it once. Frees any prior allocation first.
    ///
    /// A file that fails to load is logged and contributes an empty slice,
    /// so later meshes keep their load-order identities. Failing to load
    /// any geometry at all is an error and leaves the registry empty.
    pub fn allocate(&mut self, device: &Device, paths: &[impl AsRef<Path>]) -> Result<()> {
        self.free();

        let mut loaded = Vec::with_capacity(paths.len());
        for path in paths {
            match load_obj(path) {
                Ok(mesh) => loaded.push(mesh),
                Err(err) => {
                    log::error!("{err:#}");
                    loaded.push(MeshData::default());
                }
            }
        }

        let packed = pack(&loaded);
        drop(loaded);
        if packed.vertices.is_empty() || packed.indices.is_empty() {
            bail!("mesh registry: no geometry loaded from {} files", paths.len());
        }

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Shared VB"),
            contents: bytemuck::cast_slice(&packed.vertices),
            usage: BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Shared IB"),
            contents: bytemuck::cast_slice(&packed.indices),
            usage: BufferUsages::INDEX,
        });

        log::info!(
            "mesh registry: {} meshes, {} vertices, {} indices",
            packed.descriptors.len(),
            packed.vertices.len(),
            packed.indices.len()
        );

        self.vertex_buffer = Some(vertex_buffer);
        self.index_buffer = Some(index_buffer);
        self.meshes = packed.descriptors;
        Ok(())
    }

    /// Drop the GPU buffers and descriptors. Idempotent.
    pub fn free(&mut self) {
        self.vertex_buffer = None;
        self.index_buffer = None;
        self.meshes.clear();
    }

    pub fn is_allocated(&self) -> bool {
        self.vertex_buffer.is_some() && self.index_buffer.is_some()
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Descriptor of the `index`-th loaded mesh, in load order. Indices are
    /// load-order identities assigned by the scene; out-of-range panics.
    pub fn get(&self, index: usize) -> &MeshDescriptor {
        &self.meshes[index]
    }

    /// Bind the shared vertex/index buffer pair for drawing.
    pub fn bind(&self, rpass: &mut RenderPass<'_>) {
        let (Some(vb), Some(ib)) = (&self.vertex_buffer, &self.index_buffer) else {
            return;
        };
        rpass.set_vertex_buffer(0, vb.slice(..));
        rpass.set_index_buffer(ib.slice(..), IndexFormat::Uint16);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mesh(vertex_count: usize, indices: Vec<MeshIndex>) -> MeshData {
        MeshData::new(vec![Vertex::default(); vertex_count], indices)
    }

    #[test]
    fn packs_meshes_back_to_back() {
        let packed = pack(&[mesh(3, vec![0, 1, 2]), mesh(4, vec![0, 1, 2, 0, 2, 3])]);

        assert_eq!(packed.vertices.len(), 7);
        assert_eq!(packed.indices.len(), 9);
        assert_eq!(
            packed.descriptors[0],
            MeshDescriptor {
                index_count: 3,
                index_byte_offset: 0,
                base_vertex: 0,
            }
        );
        assert_eq!(
            packed.descriptors[1],
            MeshDescriptor {
                index_count: 6,
                index_byte_offset: 6,
                base_vertex: 3,
            }
        );
        assert_eq!(packed.descriptors[1].first_index(), 3);
        // Indices are stored unmodified; base_vertex carries the shift.
        assert_eq!(&packed.indices[3..], &[0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn index_counts_sum_to_buffer_length() {
        let packed = pack(&[
            mesh(3, vec![0, 1, 2]),
            mesh(1, vec![0, 0, 0]),
            mesh(4, vec![0, 1, 2, 0, 2, 3]),
        ]);
        let total: u32 = packed.descriptors.iter().map(|d| d.index_count).sum();
        assert_eq!(total as usize, packed.indices.len());
    }

    #[test]
    fn base_vertex_is_prefix_sum_of_vertex_counts() {
        let sizes = [3usize, 5, 2, 8];
        let meshes: Vec<MeshData> = sizes.iter().map(|&n| mesh(n, vec![0; n])).collect();
        let packed = pack(&meshes);

        let mut expected = 0i32;
        for (descriptor, &size) in packed.descriptors.iter().zip(&sizes) {
            assert_eq!(descriptor.base_vertex, expected);
            expected += size as i32;
        }
    }

    #[test]
    fn empty_input_packs_to_nothing() {
        let packed = pack(&[]);
        assert!(packed.descriptors.is_empty());
        assert!(packed.vertices.is_empty());
    }

    #[test]
    fn failed_mesh_keeps_its_slot() {
        // An unloadable file contributes an empty slice; the next mesh keeps
        // its load-order identity and offsets.
        let packed = pack(&[mesh(3, vec![0, 1, 2]), MeshData::default(), mesh(2, vec![0, 1])]);
        assert_eq!(packed.descriptors[1].index_count, 0);
        assert_eq!(packed.descriptors[1].base_vertex, 3);
        assert_eq!(packed.descriptors[2].base_vertex, 3);
        assert_eq!(packed.descriptors[2].first_index(), 3);
    }
}
