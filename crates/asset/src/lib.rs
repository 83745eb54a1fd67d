//! Asset loading/parsers: OBJ meshes and TGA textures, decoded into
//! CPU-friendly data ready for one-shot GPU upload.

pub mod mesh;
pub mod obj;
pub mod tga;
