//! GPU texture upload for decoded [`TextureData`].

use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Result, bail};
use wgpu::{
    Extent3d, TexelCopyBufferLayout, TextureDescriptor, TextureDimension, TextureUsages,
    TextureView, TextureViewDescriptor,
};

use asset::tga::TextureData;

use crate::Gpu;

static NEXT_TEXTURE_ID: AtomicU64 = AtomicU64::new(1);

/// An RGBA8 texture resident on the GPU. Carries a process-unique id so the
/// shader program can cache bind groups per texture.
pub struct GpuTexture {
    _texture: wgpu::Texture,
    view: TextureView,
    id: u64,
    width: u32,
    height: u32,
}

impl GpuTexture {
    /// Upload decoded texture data. Host rows are bottom-to-top; they are
    /// flipped here because wgpu addresses textures top row first.
    pub fn upload(gpu: &Gpu, data: &TextureData) -> Result<Self> {
        if !data.is_valid() {
            bail!(
                "texture data is inconsistent: {}x{} with {} bytes",
                data.width,
                data.height,
                data.data.len()
            );
        }

        let row_len = (data.width * 4) as usize;
        let mut flipped = Vec::with_capacity(data.data.len());
        for row in data.data.chunks_exact(row_len).rev() {
            flipped.extend_from_slice(row);
        }

        let size = Extent3d {
            width: data.width,
            height: data.height,
            depth_or_array_layers: 1,
        };
        let texture = gpu.device().create_texture(&TextureDescriptor {
            label: Some("SceneTex"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
            view_formats: &[],
        });

        gpu.queue().write_texture(
            texture.as_image_copy(),
            &flipped,
            TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(data.width * 4),
                rows_per_image: Some(data.height),
            },
            size,
        );

        let view = texture.create_view(&TextureViewDescriptor::default());
        Ok(Self {
            _texture: texture,
            view,
            id: NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed),
            width: data.width,
            height: data.height,
        })
    }

    pub fn view(&self) -> &TextureView {
        &self.view
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
