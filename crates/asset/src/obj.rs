//! OBJ mesh loader for single-object, triangulated `v/vt/vn` files.
//!
//! Lines are classified by strict directive patterns; anything else is
//! ignored. Face vertices referencing the same `(v,vt,vn)` triple are
//! deduplicated into a single emitted vertex. Malformed data degrades
//! instead of failing: missing attribute categories substitute one default
//! entry, out-of-range face indices clamp to 0 and tint the vertex with a
//! diagnostic color.

use std::{
    collections::HashMap,
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

use anyhow::{Context, Result, bail};

use crate::mesh::{MeshData, Vertex};

/// Vertex color for face indices that referenced a missing attribute.
pub const ERROR_COLOR: [f32; 4] = [0.5, 0.0, 0.0, 1.0];

const DEFAULT_POSITION: [f32; 3] = [0.0, 0.0, 0.0];
const DEFAULT_UV: [f32; 2] = [0.0, 0.0];
const DEFAULT_NORMAL: [f32; 3] = [0.0, 1.0, 0.0];

/// Load an OBJ mesh from a file path.
pub fn load_obj(path: impl AsRef<Path>) -> Result<MeshData> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("failed to open OBJ file: {}", path.display()))?;
    let mesh = parse_obj(BufReader::new(file), &path.display().to_string())?;
    log::info!(
        "{}: loaded {} vertices, {} indices",
        path.display(),
        mesh.vertices.len(),
        mesh.indices.len()
    );
    Ok(mesh)
}

/// Parse an OBJ mesh from a string (used by tests and generated assets).
pub fn load_obj_from_str(contents: &str) -> Result<MeshData> {
    parse_obj(io::Cursor::new(contents), "<string>")
}

/// One `v/vt/vn` reference as written in the file, 1-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct FaceRef {
    v: i32,
    vt: i32,
    vn: i32,
}

fn parse_obj<R: BufRead>(reader: R, source: &str) -> Result<MeshData> {
    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut texcoords: Vec<[f32; 2]> = Vec::new();
    let mut normals: Vec<[f32; 3]> = Vec::new();
    let mut faces: Vec<FaceRef> = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("{source}: failed to read line {}", line_no + 1))?;
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("v") => {
                if let Some(p) = parse_floats::<3>(&mut parts) {
                    positions.push(p);
                }
            }
            Some("vt") => {
                if let Some(uv) = parse_floats::<2>(&mut parts) {
                    texcoords.push(uv);
                }
            }
            Some("vn") => {
                if let Some(n) = parse_floats::<3>(&mut parts) {
                    normals.push(normalize_or_default(n, source, line_no));
                }
            }
            Some("f") => {
                if let Some(tri) = parse_triangle(&mut parts) {
                    faces.extend_from_slice(&tri);
                }
            }
            // Comments, groups, materials and anything unrecognized.
            _ => {}
        }
    }

    // An empty attribute category would make every face reference dangle;
    // substitute one default entry so lookups stay in range.
    if positions.is_empty() {
        log::warn!("{source}: no vertex positions defined");
        positions.push(DEFAULT_POSITION);
    }
    if texcoords.is_empty() {
        log::warn!("{source}: no texture coordinates defined");
        texcoords.push(DEFAULT_UV);
    }
    if normals.is_empty() {
        log::warn!("{source}: no normals defined");
        normals.push(DEFAULT_NORMAL);
    }

    // Convert face references into deduplicated vertex/index lists. The key
    // is the raw index triple, so two references to the same triple always
    // share one emitted vertex.
    let mut emitted: HashMap<FaceRef, u16> = HashMap::new();
    let mut vertices: Vec<Vertex> = Vec::with_capacity(faces.len());
    let mut indices: Vec<u16> = Vec::with_capacity(faces.len());

    for face in faces {
        if let Some(&index) = emitted.get(&face) {
            indices.push(index);
            continue;
        }

        if vertices.len() > usize::from(u16::MAX) {
            bail!("{source}: too many vertices for 16-bit indices");
        }
        let index = vertices.len() as u16;

        let mut color = [1.0, 1.0, 1.0, 1.0];
        let v = resolve_index(face.v, positions.len(), &mut color);
        let vt = resolve_index(face.vt, texcoords.len(), &mut color);
        let vn = resolve_index(face.vn, normals.len(), &mut color);

        vertices.push(Vertex::new(positions[v], color, texcoords[vt], normals[vn]));
        emitted.insert(face, index);
        indices.push(index);
    }

    Ok(MeshData::new(vertices, indices))
}

/// Parse the next `N` whitespace-separated floats, or `None` if the line
/// does not match. Surplus fields are ignored.
fn parse_floats<'a, const N: usize>(
    parts: &mut impl Iterator<Item = &'a str>,
) -> Option<[f32; N]> {
    let mut out = [0.0f32; N];
    for slot in &mut out {
        *slot = parts.next()?.parse().ok()?;
    }
    Some(out)
}

/// Parse three `v/vt/vn` references, or `None` if the line does not match.
fn parse_triangle<'a>(parts: &mut impl Iterator<Item = &'a str>) -> Option<[FaceRef; 3]> {
    let mut tri = [FaceRef { v: 0, vt: 0, vn: 0 }; 3];
    for slot in &mut tri {
        *slot = parse_face_ref(parts.next()?)?;
    }
    Some(tri)
}

fn parse_face_ref(token: &str) -> Option<FaceRef> {
    let mut split = token.split('/');
    let v = split.next()?.parse().ok()?;
    let vt = split.next()?.parse().ok()?;
    let vn = split.next()?.parse().ok()?;
    Some(FaceRef { v, vt, vn })
}

/// Convert a 1-based file index to a 0-based list index, clamping anything
/// out of range to 0 and flagging the vertex with the error color.
fn resolve_index(raw: i32, len: usize, color: &mut [f32; 4]) -> usize {
    let idx = raw as i64 - 1;
    if idx < 0 || idx >= len as i64 {
        *color = ERROR_COLOR;
        return 0;
    }
    idx as usize
}

fn normalize_or_default(n: [f32; 3], source: &str, line_no: usize) -> [f32; 3] {
    let length = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
    if length > 0.0 {
        [n[0] / length, n[1] / length, n[2] / length]
    } else {
        log::warn!(
            "{source}: zero-length normal on line {}, substituting default",
            line_no + 1
        );
        DEFAULT_NORMAL
    }
}
