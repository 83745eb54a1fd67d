//! TGA texture loader (uncompressed, 18-byte header).
//!
//! Everything decodes to tightly packed RGBA8 with rows in bottom-to-top
//! order. Supported pixel depths: 8-bit (single channel, replicated to RGB),
//! 16-bit (1-5-5-5 reversed), 24-bit BGR and 32-bit BGRA.

use std::path::Path;

use anyhow::{Context, Result};
use thiserror::Error;

const HEADER_LEN: usize = 18;

/// Descriptor bit: rows are stored top-to-bottom instead of bottom-to-top.
const DESC_TOP_TO_BOTTOM: u8 = 0x20;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TgaError {
    #[error("file shorter than the {HEADER_LEN}-byte TGA header")]
    HeaderTooShort,
    #[error("run-length encoded TGA (image type {0}) is not supported")]
    UnsupportedImageType(u8),
    #[error("unsupported TGA pixel depth {0}")]
    UnsupportedDepth(u8),
    #[error("pixel data truncated: expected {expected} bytes, found {found}")]
    Truncated { expected: usize, found: usize },
}

/// Decoded texture in CPU-friendly RGBA8 form, ready for GPU upload.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    /// RGBA8, `width * height * 4` bytes, bottom row first.
    pub data: Vec<u8>,
}

impl TextureData {
    pub fn new_rgba8(width: u32, height: u32, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), (width * height * 4) as usize);
        Self {
            width,
            height,
            data,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.data.len() == (self.width * self.height * 4) as usize
    }

    /// White/gray checkerboard used when a texture file is missing.
    pub fn checkerboard(size: u32) -> Self {
        let mut data = Vec::with_capacity((size * size * 4) as usize);
        for y in 0..size {
            for x in 0..size {
                if ((x / 8) + (y / 8)) % 2 == 0 {
                    data.extend_from_slice(&[255, 255, 255, 255]);
                } else {
                    data.extend_from_slice(&[128, 128, 128, 255]);
                }
            }
        }
        Self::new_rgba8(size, size, data)
    }
}

/// Load a TGA texture from a file path.
pub fn load_tga(path: impl AsRef<Path>) -> Result<TextureData> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to open TGA file: {}", path.display()))?;
    let texture = decode_tga(&bytes)
        .with_context(|| format!("failed to decode TGA file: {}", path.display()))?;
    log::info!(
        "{}: loaded {}x{} texture",
        path.display(),
        texture.width,
        texture.height
    );
    Ok(texture)
}

/// Decode an in-memory TGA file.
pub fn decode_tga(bytes: &[u8]) -> Result<TextureData, TgaError> {
    if bytes.len() < HEADER_LEN {
        return Err(TgaError::HeaderTooShort);
    }
    let id_length = usize::from(bytes[0]);
    let color_map_flag = bytes[1];
    let image_type = bytes[2];
    let width = u32::from(u16::from_le_bytes([bytes[12], bytes[13]]));
    let height = u32::from(u16::from_le_bytes([bytes[14], bytes[15]]));
    let depth = bytes[16];
    let descriptor = bytes[17];

    match image_type {
        1 | 2 | 3 => {}
        other => return Err(TgaError::UnsupportedImageType(other)),
    }

    // Skip the image ID and, if present, the color map.
    let mut offset = HEADER_LEN + id_length;
    if color_map_flag != 0 {
        let entries = usize::from(u16::from_le_bytes([bytes[5], bytes[6]]));
        let entry_bits = usize::from(bytes[7]);
        offset += entries * entry_bits / 8;
    }

    let bytes_per_pixel = usize::from(depth) / 8;
    let row_len = width as usize * bytes_per_pixel;
    let expected = row_len * height as usize;
    let pixels = bytes
        .get(offset..offset + expected)
        .ok_or(TgaError::Truncated {
            expected,
            found: bytes.len().saturating_sub(offset),
        })?;

    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height as usize {
        // Host convention is bottom row first; a set flip bit means the file
        // stored the top row first.
        let src_y = if descriptor & DESC_TOP_TO_BOTTOM != 0 {
            height as usize - 1 - y
        } else {
            y
        };
        let row = &pixels[src_y * row_len..(src_y + 1) * row_len];
        decode_row(row, depth, &mut data)?;
    }

    Ok(TextureData::new_rgba8(width, height, data))
}

fn decode_row(row: &[u8], depth: u8, out: &mut Vec<u8>) -> Result<(), TgaError> {
    match depth {
        // Single channel, read as (R,R,R,1).
        8 => {
            for &value in row {
                out.extend_from_slice(&[value, value, value, 255]);
            }
        }
        // 1-5-5-5 reversed: A in bit 15, then R, G, B in 5-bit fields.
        16 => {
            for chunk in row.chunks_exact(2) {
                let value = u16::from_le_bytes([chunk[0], chunk[1]]);
                let r = expand5((value >> 10) & 0x1f);
                let g = expand5((value >> 5) & 0x1f);
                let b = expand5(value & 0x1f);
                let a = if value & 0x8000 != 0 { 255 } else { 0 };
                out.extend_from_slice(&[r, g, b, a]);
            }
        }
        24 => {
            for chunk in row.chunks_exact(3) {
                out.extend_from_slice(&[chunk[2], chunk[1], chunk[0], 255]);
            }
        }
        32 => {
            for chunk in row.chunks_exact(4) {
                out.extend_from_slice(&[chunk[2], chunk[1], chunk[0], chunk[3]]);
            }
        }
        other => return Err(TgaError::UnsupportedDepth(other)),
    }
    Ok(())
}

#[inline]
fn expand5(value: u16) -> u8 {
    let v = value as u8;
    (v << 3) | (v >> 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(image_type: u8, width: u16, height: u16, depth: u8, descriptor: u8) -> Vec<u8> {
        let mut h = vec![0u8; HEADER_LEN];
        h[2] = image_type;
        h[12..14].copy_from_slice(&width.to_le_bytes());
        h[14..16].copy_from_slice(&height.to_le_bytes());
        h[16] = depth;
        h[17] = descriptor;
        h
    }

    #[test]
    fn decodes_24bit_bgr() {
        let mut bytes = header(2, 2, 1, 24, 0);
        bytes.extend_from_slice(&[255, 0, 0, 0, 0, 255]); // blue, red
        let tex = decode_tga(&bytes).unwrap();
        assert_eq!(tex.data, vec![0, 0, 255, 255, 255, 0, 0, 255]);
    }

    #[test]
    fn decodes_32bit_bgra() {
        let mut bytes = header(2, 1, 1, 32, 0);
        bytes.extend_from_slice(&[10, 20, 30, 40]);
        let tex = decode_tga(&bytes).unwrap();
        assert_eq!(tex.data, vec![30, 20, 10, 40]);
    }

    #[test]
    fn decodes_16bit_1555() {
        let mut bytes = header(2, 2, 1, 16, 0);
        bytes.extend_from_slice(&0xffffu16.to_le_bytes()); // opaque white
        bytes.extend_from_slice(&0x7c00u16.to_le_bytes()); // transparent red
        let tex = decode_tga(&bytes).unwrap();
        assert_eq!(tex.data, vec![255, 255, 255, 255, 255, 0, 0, 0]);
    }

    #[test]
    fn decodes_8bit_as_replicated_red() {
        let mut bytes = header(3, 1, 1, 8, 0);
        bytes.push(77);
        let tex = decode_tga(&bytes).unwrap();
        assert_eq!(tex.data, vec![77, 77, 77, 255]);
    }

    #[test]
    fn flips_top_to_bottom_rows() {
        let mut flipped = header(3, 1, 2, 8, DESC_TOP_TO_BOTTOM);
        flipped.extend_from_slice(&[1, 2]); // stored top first
        let tex = decode_tga(&flipped).unwrap();
        // Bottom row first: value 2 is the bottom row.
        assert_eq!(tex.data[0], 2);
        assert_eq!(tex.data[4], 1);

        let mut plain = header(3, 1, 2, 8, 0);
        plain.extend_from_slice(&[2, 1]);
        assert_eq!(decode_tga(&plain).unwrap().data, tex.data);
    }

    #[test]
    fn skips_image_id_and_color_map() {
        let mut bytes = header(1, 1, 1, 8, 0);
        bytes[0] = 3; // image ID length
        bytes[1] = 1; // color map present
        bytes[5..7].copy_from_slice(&4u16.to_le_bytes()); // 4 entries
        bytes[7] = 24; // bits per entry
        bytes.extend_from_slice(b"id!");
        bytes.extend_from_slice(&[0u8; 12]); // color map
        bytes.push(200);
        let tex = decode_tga(&bytes).unwrap();
        assert_eq!(tex.data, vec![200, 200, 200, 255]);
    }

    #[test]
    fn rejects_rle_and_odd_depths() {
        assert_eq!(
            decode_tga(&header(10, 1, 1, 24, 0)),
            Err(TgaError::UnsupportedImageType(10))
        );
        let mut bytes = header(2, 1, 1, 12, 0);
        bytes.extend_from_slice(&[0, 0]);
        assert_eq!(decode_tga(&bytes), Err(TgaError::UnsupportedDepth(12)));
    }

    #[test]
    fn reports_truncated_pixel_data() {
        let mut bytes = header(2, 4, 4, 32, 0);
        bytes.extend_from_slice(&[0u8; 10]);
        assert!(matches!(
            decode_tga(&bytes),
            Err(TgaError::Truncated { expected: 64, .. })
        ));
    }

    #[test]
    fn checkerboard_is_valid() {
        let tex = TextureData::checkerboard(32);
        assert!(tex.is_valid());
        assert_eq!(tex.data[0..4], [255, 255, 255, 255]);
    }
}
