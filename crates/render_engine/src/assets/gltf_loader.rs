//! glTF loader
//!
//! Walks the scene's node hierarchy, baking each node's accumulated
//! transform into the vertex data so the whole file flattens into one
//! mesh. Authored tangents are kept when every primitive supplies them.

use nalgebra::{Matrix3, Matrix4, Vector3, Vector4};
use std::path::Path;

use crate::assets::AssetError;
use crate::render::mesh::{MeshData, Vertex};

/// Load a glTF or GLB file into mesh data
pub fn load_gltf<P: AsRef<Path>>(path: P) -> Result<MeshData, AssetError> {
    let path = path.as_ref();
    let (document, buffers, _images) = gltf::import(path)
        .map_err(|e| AssetError::LoadFailed(format!("{}: {}", path.display(), e)))?;

    let mut mesh = MeshData::default();
    let mut all_tangents = true;

    for scene in document.scenes() {
        for node in scene.nodes() {
            visit_node(&node, Matrix4::identity(), &buffers, &mut mesh, &mut all_tangents)?;
        }
    }

    if mesh.vertices.is_empty() {
        return Err(AssetError::InvalidData(format!(
            "no mesh primitives in {}",
            path.display()
        )));
    }

    mesh.has_tangents = all_tangents;
    Ok(mesh)
}

fn visit_node(
    node: &gltf::Node,
    parent: Matrix4<f32>,
    buffers: &[gltf::buffer::Data],
    mesh: &mut MeshData,
    all_tangents: &mut bool,
) -> Result<(), AssetError> {
    let local = Matrix4::from(node.transform().matrix());
    let world = parent * local;

    if let Some(gltf_mesh) = node.mesh() {
        for primitive in gltf_mesh.primitives() {
            read_primitive(&primitive, &world, buffers, mesh, all_tangents)?;
        }
    }

    for child in node.children() {
        visit_node(&child, world, buffers, mesh, all_tangents)?;
    }
    Ok(())
}

fn read_primitive(
    primitive: &gltf::Primitive,
    world: &Matrix4<f32>,
    buffers: &[gltf::buffer::Data],
    mesh: &mut MeshData,
    all_tangents: &mut bool,
) -> Result<(), AssetError> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|b| &b.0[..]));

    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .ok_or_else(|| AssetError::InvalidData("primitive lacks positions".to_string()))?
        .collect();
    let normals: Option<Vec<[f32; 3]>> = reader.read_normals().map(|iter| iter.collect());
    let uvs: Option<Vec<[f32; 2]>> = reader
        .read_tex_coords(0)
        .map(|iter| iter.into_f32().collect());
    let colors: Option<Vec<[f32; 3]>> = reader
        .read_colors(0)
        .map(|iter| iter.into_rgb_f32().collect());
    let tangents: Option<Vec<[f32; 4]>> = reader.read_tangents().map(|iter| iter.collect());

    if tangents.is_none() {
        *all_tangents = false;
    }

    let normal_transform = rotation_block(world);
    let base = mesh.vertices.len() as u32;

    for (i, position) in positions.iter().enumerate() {
        let p = world * Vector4::new(position[0], position[1], position[2], 1.0);

        let normal = normals
            .as_ref()
            .and_then(|n| n.get(i))
            .map(|n| {
                let transformed = normal_transform * Vector3::new(n[0], n[1], n[2]);
                let norm = transformed.norm();
                if norm > 0.0 {
                    (transformed / norm).into()
                } else {
                    [0.0, 1.0, 0.0]
                }
            })
            .unwrap_or([0.0, 1.0, 0.0]);

        let tangent = tangents
            .as_ref()
            .and_then(|t| t.get(i))
            .map(|t| {
                let transformed = normal_transform * Vector3::new(t[0], t[1], t[2]);
                [transformed.x, transformed.y, transformed.z, t[3]]
            })
            .unwrap_or(Vertex::default().tangent);

        mesh.vertices.push(Vertex {
            position: [p.x, p.y, p.z],
            color: colors
                .as_ref()
                .and_then(|c| c.get(i))
                .copied()
                .unwrap_or([1.0, 1.0, 1.0]),
            normal,
            uv: uvs.as_ref().and_then(|u| u.get(i)).copied().unwrap_or([0.0, 0.0]),
            tangent,
        });
    }

    match reader.read_indices() {
        Some(indices) => {
            append_indices(
                indices.into_u32(),
                positions.len() as u32,
                base,
                &mut mesh.indices,
            )?;
        }
        None => {
            mesh.indices.extend(base..base + positions.len() as u32);
        }
    }
    Ok(())
}

/// Rebase file-supplied indices onto the mesh, rejecting any index past
/// the primitive's vertex count
fn append_indices(
    indices: impl Iterator<Item = u32>,
    vertex_count: u32,
    base: u32,
    out: &mut Vec<u32>,
) -> Result<(), AssetError> {
    for index in indices {
        if index >= vertex_count {
            return Err(AssetError::InvalidData(format!(
                "index {} out of range for {} vertices",
                index, vertex_count
            )));
        }
        out.push(base + index);
    }
    Ok(())
}

/// Upper-left 3x3 of the world transform, for directions
fn rotation_block(world: &Matrix4<f32>) -> Matrix3<f32> {
    Matrix3::new(
        world[(0, 0)],
        world[(0, 1)],
        world[(0, 2)],
        world[(1, 0)],
        world[(1, 1)],
        world[(1, 2)],
        world[(2, 0)],
        world[(2, 1)],
        world[(2, 2)],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_are_rebased_onto_the_mesh() {
        let mut out = vec![0, 1, 2];
        append_indices([0u32, 2, 1].into_iter(), 3, 3, &mut out).unwrap();
        assert_eq!(out, vec![0, 1, 2, 3, 5, 4]);
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let mut out = Vec::new();
        assert!(append_indices([0u32, 1, 3].into_iter(), 3, 0, &mut out).is_err());
    }
}
