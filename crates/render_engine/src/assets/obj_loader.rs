//! OBJ file loader
//!
//! Hand-rolled parser for the indexed-triangle subset the engine needs:
//! positions (with optional per-vertex colors), normals, texture
//! coordinates and triangulated faces.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::assets::AssetError;
use crate::render::mesh::{MeshData, Vertex};

/// Load an OBJ file into mesh data
pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<MeshData, AssetError> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|_| AssetError::NotFound(path.display().to_string()))?;
    parse(BufReader::new(file))
}

/// Parse OBJ text from any reader
pub fn parse<R: BufRead>(reader: R) -> Result<MeshData, AssetError> {
    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut colors: Vec<[f32; 3]> = Vec::new();
    let mut normals: Vec<[f32; 3]> = Vec::new();
    let mut uvs: Vec<[f32; 2]> = Vec::new();
    let mut mesh = MeshData::default();

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts[0] {
            "v" => {
                if parts.len() < 4 {
                    return Err(AssetError::InvalidData(format!(
                        "vertex line needs 3 coordinates: {}",
                        line
                    )));
                }
                positions.push([
                    parse_float(parts[1])?,
                    parse_float(parts[2])?,
                    parse_float(parts[3])?,
                ]);
                // Optional per-vertex color after the position
                if parts.len() >= 7 {
                    colors.push([
                        parse_float(parts[4])?,
                        parse_float(parts[5])?,
                        parse_float(parts[6])?,
                    ]);
                } else {
                    colors.push([1.0, 1.0, 1.0]);
                }
            }
            "vn" => {
                if parts.len() < 4 {
                    return Err(AssetError::InvalidData(format!(
                        "normal line needs 3 components: {}",
                        line
                    )));
                }
                normals.push([
                    parse_float(parts[1])?,
                    parse_float(parts[2])?,
                    parse_float(parts[3])?,
                ]);
            }
            "vt" => {
                if parts.len() < 3 {
                    return Err(AssetError::InvalidData(format!(
                        "texture coordinate line needs 2 components: {}",
                        line
                    )));
                }
                uvs.push([parse_float(parts[1])?, parse_float(parts[2])?]);
            }
            "f" => {
                if parts.len() < 4 {
                    return Err(AssetError::InvalidData(format!(
                        "face needs at least 3 vertices: {}",
                        line
                    )));
                }
                let mut face = Vec::with_capacity(parts.len() - 1);
                for corner in &parts[1..] {
                    face.push(parse_corner(corner, &positions, &colors, &normals, &uvs)?);
                }
                // Fan triangulation handles quads and larger polygons
                let base = mesh.vertices.len() as u32;
                mesh.vertices.extend_from_slice(&face);
                for i in 1..(face.len() as u32 - 1) {
                    mesh.indices.push(base);
                    mesh.indices.push(base + i);
                    mesh.indices.push(base + i + 1);
                }
            }
            _ => {}
        }
    }

    if mesh.vertices.is_empty() {
        return Err(AssetError::InvalidData("no faces in OBJ input".to_string()));
    }
    Ok(mesh)
}

fn parse_float(token: &str) -> Result<f32, AssetError> {
    token
        .parse()
        .map_err(|_| AssetError::InvalidData(format!("invalid number: {}", token)))
}

/// Parse a 1-based face index into a zero-based offset
fn parse_index(field: &str, corner: &str) -> Result<usize, AssetError> {
    field
        .parse::<usize>()
        .map_err(|_| AssetError::InvalidData(format!("invalid face index: {}", corner)))?
        .checked_sub(1)
        .ok_or_else(|| AssetError::InvalidData(format!("face indices are 1-based: {}", corner)))
}

/// Resolve one `v/vt/vn` face corner into a vertex
fn parse_corner(
    corner: &str,
    positions: &[[f32; 3]],
    colors: &[[f32; 3]],
    normals: &[[f32; 3]],
    uvs: &[[f32; 2]],
) -> Result<Vertex, AssetError> {
    let fields: Vec<&str> = corner.split('/').collect();

    let pos_index = parse_index(fields[0], corner)?;

    let position = *positions
        .get(pos_index)
        .ok_or_else(|| AssetError::InvalidData(format!("position index out of range: {}", corner)))?;
    let color = colors.get(pos_index).copied().unwrap_or([1.0, 1.0, 1.0]);

    let uv = match fields.get(1).filter(|s| !s.is_empty()) {
        Some(field) => *uvs
            .get(parse_index(field, corner)?)
            .ok_or_else(|| {
                AssetError::InvalidData(format!("texture coordinate index out of range: {}", corner))
            })?,
        None => [0.0, 0.0],
    };

    let normal = match fields.get(2).filter(|s| !s.is_empty()) {
        Some(field) => *normals
            .get(parse_index(field, corner)?)
            .ok_or_else(|| {
                AssetError::InvalidData(format!("normal index out of range: {}", corner))
            })?,
        None => [0.0, 1.0, 0.0],
    };

    Ok(Vertex {
        position,
        color,
        normal,
        uv,
        ..Vertex::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const TRIANGLE: &str = "\
# simple triangle
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 0.0 1.0
vn 0.0 0.0 1.0
f 1/1/1 2/2/1 3/3/1
";

    #[test]
    fn parses_positions_uvs_and_normals() {
        let mesh = parse(Cursor::new(TRIANGLE)).unwrap();
        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert_eq!(mesh.vertices[1].position, [1.0, 0.0, 0.0]);
        assert_eq!(mesh.vertices[1].uv, [1.0, 0.0]);
        assert_eq!(mesh.vertices[0].normal, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn vertex_colors_default_to_white() {
        let mesh = parse(Cursor::new(TRIANGLE)).unwrap();
        assert_eq!(mesh.vertices[0].color, [1.0, 1.0, 1.0]);
    }

    #[test]
    fn parses_per_vertex_colors() {
        let input = "\
v 0.0 0.0 0.0 0.5 0.25 0.125
v 1.0 0.0 0.0 1.0 1.0 1.0
v 0.0 1.0 0.0 0.0 0.0 0.0
f 1 2 3
";
        let mesh = parse(Cursor::new(input)).unwrap();
        assert_eq!(mesh.vertices[0].color, [0.5, 0.25, 0.125]);
    }

    #[test]
    fn quads_are_fan_triangulated() {
        let input = "\
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
f 1 2 3 4
";
        let mesh = parse(Cursor::new(input)).unwrap();
        assert_eq!(mesh.indices.len(), 6);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn position_only_corners_get_defaults() {
        let input = "\
v 0 0 0
v 1 0 0
v 0 1 0
f 1 2 3
";
        let mesh = parse(Cursor::new(input)).unwrap();
        assert_eq!(mesh.vertices[0].uv, [0.0, 0.0]);
        assert_eq!(mesh.vertices[0].normal, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let input = "\
v 0 0 0
f 1 2 3
";
        assert!(parse(Cursor::new(input)).is_err());
    }

    #[test]
    fn zero_texture_index_is_an_error() {
        let input = "\
v 0 0 0
v 1 0 0
v 0 1 0
vt 0 0
f 1/0 2 3
";
        assert!(parse(Cursor::new(input)).is_err());
    }

    #[test]
    fn zero_normal_index_is_an_error() {
        let input = "\
v 0 0 0
v 1 0 0
v 0 1 0
vn 0 1 0
f 1//0 2 3
";
        assert!(parse(Cursor::new(input)).is_err());
    }

    #[test]
    fn out_of_range_texture_index_is_an_error() {
        let input = "\
v 0 0 0
v 1 0 0
v 0 1 0
vt 0 0
f 1/1 2/2 3/1
";
        assert!(parse(Cursor::new(input)).is_err());
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(parse(Cursor::new("# nothing here\n")).is_err());
    }
}
