//! Mesh vertex data
//!
//! CPU-side vertex/index storage with deduplication and tangent-space
//! computation, shared by all geometry importers.

use ash::vk;
use bytemuck::{Pod, Zeroable};
use nalgebra::Vector3;
use std::collections::HashMap;
use std::path::Path;

use crate::assets::{gltf_loader, obj_loader, AssetError};

/// Interleaved vertex layout used by every geometry pipeline
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    /// xyz = tangent direction, w = bitangent handedness (+1 or -1)
    pub tangent: [f32; 4],
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            color: [1.0, 1.0, 1.0],
            normal: [0.0, 1.0, 0.0],
            uv: [0.0; 2],
            tangent: [1.0, 0.0, 0.0, 1.0],
        }
    }
}

impl Vertex {
    pub fn binding_descriptions() -> Vec<vk::VertexInputBindingDescription> {
        vec![vk::VertexInputBindingDescription {
            binding: 0,
            stride: std::mem::size_of::<Vertex>() as u32,
            input_rate: vk::VertexInputRate::VERTEX,
        }]
    }

    pub fn attribute_descriptions() -> Vec<vk::VertexInputAttributeDescription> {
        vec![
            vk::VertexInputAttributeDescription {
                location: 0,
                binding: 0,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: 0,
            },
            vk::VertexInputAttributeDescription {
                location: 1,
                binding: 0,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: 12,
            },
            vk::VertexInputAttributeDescription {
                location: 2,
                binding: 0,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: 24,
            },
            vk::VertexInputAttributeDescription {
                location: 3,
                binding: 0,
                format: vk::Format::R32G32_SFLOAT,
                offset: 36,
            },
            vk::VertexInputAttributeDescription {
                location: 4,
                binding: 0,
                format: vk::Format::R32G32B32A32_SFLOAT,
                offset: 44,
            },
        ]
    }

    /// Raw bit pattern, used as the deduplication key so that -0.0 and
    /// 0.0 (or NaN payload differences) are treated as distinct inputs
    fn bit_key(&self) -> [u32; 15] {
        bytemuck::cast(*self)
    }
}

/// CPU-side mesh, imported from disk and prepared for GPU upload
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    /// Set by importers that supplied authored tangents
    pub has_tangents: bool,
}

impl MeshData {
    /// Load a mesh, selecting the parser by file extension.
    ///
    /// Deduplicates vertices and computes tangents when the source format
    /// did not carry them.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        let mut mesh = match extension.as_str() {
            "obj" => obj_loader::load_obj(path)?,
            "gltf" | "glb" => gltf_loader::load_gltf(path)?,
            other => {
                return Err(AssetError::UnsupportedFormat(format!(
                    "{} ({})",
                    other,
                    path.display()
                )))
            }
        };

        mesh.deduplicate();
        if !mesh.has_tangents {
            mesh.compute_tangents();
        }

        log::info!(
            "Loaded mesh {}: {} vertices, {} indices",
            path.display(),
            mesh.vertices.len(),
            mesh.indices.len()
        );
        Ok(mesh)
    }

    /// Collapse identical vertices and remap the index buffer.
    ///
    /// Keyed on the full vertex bit pattern, so the unique-vertex count is
    /// bounded by the number of distinct attribute combinations and the
    /// result is deterministic for a given input order.
    pub fn deduplicate(&mut self) {
        let mut unique: HashMap<[u32; 15], u32> = HashMap::with_capacity(self.vertices.len());
        let mut new_vertices = Vec::with_capacity(self.vertices.len());

        if self.indices.is_empty() {
            // Unindexed input: every vertex is referenced in order
            self.indices = (0..self.vertices.len() as u32).collect();
        }

        let mut new_indices = Vec::with_capacity(self.indices.len());
        for &index in &self.indices {
            let vertex = self.vertices[index as usize];
            let new_index = *unique.entry(vertex.bit_key()).or_insert_with(|| {
                new_vertices.push(vertex);
                (new_vertices.len() - 1) as u32
            });
            new_indices.push(new_index);
        }

        self.vertices = new_vertices;
        self.indices = new_indices;
    }

    /// Compute per-vertex tangents from UV derivatives.
    ///
    /// Solves the 2x2 edge/UV system per triangle. Triangles whose UV
    /// determinant is zero or non-finite are skipped, leaving the default
    /// tangent in place. Vertices shared between triangles take the value
    /// of the last triangle that touched them.
    pub fn compute_tangents(&mut self) {
        for triangle in self.indices.chunks_exact(3) {
            let (i0, i1, i2) = (
                triangle[0] as usize,
                triangle[1] as usize,
                triangle[2] as usize,
            );

            let p0 = Vector3::from(self.vertices[i0].position);
            let p1 = Vector3::from(self.vertices[i1].position);
            let p2 = Vector3::from(self.vertices[i2].position);

            let uv0 = self.vertices[i0].uv;
            let uv1 = self.vertices[i1].uv;
            let uv2 = self.vertices[i2].uv;

            let edge1 = p1 - p0;
            let edge2 = p2 - p0;
            let duv1 = [uv1[0] - uv0[0], uv1[1] - uv0[1]];
            let duv2 = [uv2[0] - uv0[0], uv2[1] - uv0[1]];

            let det = duv1[0] * duv2[1] - duv2[0] * duv1[1];
            let inv_det = 1.0 / det;
            if !inv_det.is_finite() {
                continue;
            }

            let tangent = (edge1 * duv2[1] - edge2 * duv1[1]) * inv_det;
            let bitangent = (edge2 * duv1[0] - edge1 * duv2[0]) * inv_det;

            let tangent_norm = tangent.norm();
            if tangent_norm == 0.0 || !tangent_norm.is_finite() {
                continue;
            }
            let tangent = tangent / tangent_norm;

            for &i in &[i0, i1, i2] {
                let normal = Vector3::from(self.vertices[i].normal);
                let handedness = if normal.cross(&tangent).dot(&bitangent) < 0.0 {
                    -1.0
                } else {
                    1.0
                };
                self.vertices[i].tangent = [tangent.x, tangent.y, tangent.z, handedness];
            }
        }
        self.has_tangents = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn vertex_at(position: [f32; 3], uv: [f32; 2]) -> Vertex {
        Vertex {
            position,
            uv,
            ..Vertex::default()
        }
    }

    #[test]
    fn deduplicate_collapses_identical_vertices() {
        let v = vertex_at([1.0, 2.0, 3.0], [0.0, 0.0]);
        let mut mesh = MeshData {
            vertices: vec![v, v, v, vertex_at([4.0, 5.0, 6.0], [0.5, 0.5])],
            indices: vec![0, 1, 2, 3],
            has_tangents: false,
        };
        mesh.deduplicate();
        assert_eq!(mesh.vertices.len(), 2);
        assert_eq!(mesh.indices, vec![0, 0, 0, 1]);
    }

    #[test]
    fn deduplicate_keeps_distinct_attribute_combinations() {
        // Same position, different uv: must stay separate
        let mut mesh = MeshData {
            vertices: vec![
                vertex_at([1.0, 0.0, 0.0], [0.0, 0.0]),
                vertex_at([1.0, 0.0, 0.0], [1.0, 0.0]),
            ],
            indices: vec![0, 1],
            has_tangents: false,
        };
        mesh.deduplicate();
        assert_eq!(mesh.vertices.len(), 2);
    }

    #[test]
    fn deduplicate_is_deterministic() {
        let build = || MeshData {
            vertices: vec![
                vertex_at([0.0, 0.0, 0.0], [0.0, 0.0]),
                vertex_at([1.0, 0.0, 0.0], [1.0, 0.0]),
                vertex_at([0.0, 0.0, 0.0], [0.0, 0.0]),
                vertex_at([0.0, 1.0, 0.0], [0.0, 1.0]),
            ],
            indices: vec![0, 1, 2, 1, 2, 3],
            has_tangents: false,
        };
        let mut a = build();
        let mut b = build();
        a.deduplicate();
        b.deduplicate();
        assert_eq!(a.indices, b.indices);
        assert_eq!(a.vertices.len(), b.vertices.len());
    }

    #[test]
    fn deduplicate_produces_valid_indices() {
        let mut mesh = MeshData {
            vertices: (0..10)
                .map(|i| vertex_at([i as f32, 0.0, 0.0], [0.0, 0.0]))
                .collect(),
            indices: vec![0, 1, 2, 2, 1, 0, 3, 4, 5, 9, 8, 7],
            has_tangents: false,
        };
        mesh.deduplicate();
        for &i in &mesh.indices {
            assert!((i as usize) < mesh.vertices.len());
        }
        // Triangle count is unchanged
        assert_eq!(mesh.indices.len(), 12);
    }

    #[test]
    fn deduplicate_indexes_unindexed_input() {
        let v = vertex_at([1.0, 1.0, 1.0], [0.0, 0.0]);
        let mut mesh = MeshData {
            vertices: vec![v, v, v],
            indices: vec![],
            has_tangents: false,
        };
        mesh.deduplicate();
        assert_eq!(mesh.vertices.len(), 1);
        assert_eq!(mesh.indices, vec![0, 0, 0]);
    }

    #[test]
    fn tangents_are_unit_length() {
        let mut mesh = MeshData {
            vertices: vec![
                vertex_at([0.0, 0.0, 0.0], [0.0, 0.0]),
                vertex_at([2.0, 0.0, 0.0], [1.0, 0.0]),
                vertex_at([0.0, 2.0, 0.0], [0.0, 1.0]),
            ],
            indices: vec![0, 1, 2],
            has_tangents: false,
        };
        mesh.compute_tangents();
        for vertex in &mesh.vertices {
            let t = Vector3::new(vertex.tangent[0], vertex.tangent[1], vertex.tangent[2]);
            assert_relative_eq!(t.norm(), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn tangent_follows_uv_axis() {
        // UV u increases along +x, so the tangent must point along +x
        let mut mesh = MeshData {
            vertices: vec![
                vertex_at([0.0, 0.0, 0.0], [0.0, 0.0]),
                vertex_at([1.0, 0.0, 0.0], [1.0, 0.0]),
                vertex_at([0.0, 1.0, 0.0], [0.0, 1.0]),
            ],
            indices: vec![0, 1, 2],
            has_tangents: false,
        };
        mesh.compute_tangents();
        let t = mesh.vertices[0].tangent;
        assert_relative_eq!(t[0], 1.0, epsilon = 1e-5);
        assert_relative_eq!(t[1], 0.0, epsilon = 1e-5);
        assert_relative_eq!(t[2], 0.0, epsilon = 1e-5);
    }

    #[test]
    fn degenerate_uvs_leave_default_tangent() {
        // All three vertices share the same uv, giving a zero determinant
        let mut mesh = MeshData {
            vertices: vec![
                vertex_at([0.0, 0.0, 0.0], [0.5, 0.5]),
                vertex_at([1.0, 0.0, 0.0], [0.5, 0.5]),
                vertex_at([0.0, 1.0, 0.0], [0.5, 0.5]),
            ],
            indices: vec![0, 1, 2],
            has_tangents: false,
        };
        mesh.compute_tangents();
        for vertex in &mesh.vertices {
            assert_eq!(vertex.tangent, Vertex::default().tangent);
        }
    }

    #[test]
    fn mirrored_uvs_flip_handedness() {
        let forward = {
            let mut mesh = MeshData {
                vertices: vec![
                    vertex_at([0.0, 0.0, 0.0], [0.0, 0.0]),
                    vertex_at([1.0, 0.0, 0.0], [1.0, 0.0]),
                    vertex_at([0.0, 1.0, 0.0], [0.0, 1.0]),
                ],
                indices: vec![0, 1, 2],
                has_tangents: false,
            };
            for v in &mut mesh.vertices {
                v.normal = [0.0, 0.0, 1.0];
            }
            mesh.compute_tangents();
            mesh.vertices[0].tangent[3]
        };
        let mirrored = {
            let mut mesh = MeshData {
                vertices: vec![
                    vertex_at([0.0, 0.0, 0.0], [0.0, 0.0]),
                    vertex_at([1.0, 0.0, 0.0], [1.0, 0.0]),
                    vertex_at([0.0, 1.0, 0.0], [0.0, -1.0]),
                ],
                indices: vec![0, 1, 2],
                has_tangents: false,
            };
            for v in &mut mesh.vertices {
                v.normal = [0.0, 0.0, 1.0];
            }
            mesh.compute_tangents();
            mesh.vertices[0].tangent[3]
        };
        assert_relative_eq!(forward * mirrored, -1.0);
    }

    #[test]
    fn shared_vertex_takes_last_triangle_tangent() {
        // Vertex 0 is shared; the second triangle writes last
        let mut mesh = MeshData {
            vertices: vec![
                vertex_at([0.0, 0.0, 0.0], [0.0, 0.0]),
                vertex_at([1.0, 0.0, 0.0], [1.0, 0.0]),
                vertex_at([0.0, 1.0, 0.0], [0.0, 1.0]),
                vertex_at([0.0, 0.0, 1.0], [0.0, 1.0]),
            ],
            indices: vec![0, 1, 2, 0, 3, 1],
            has_tangents: false,
        };
        mesh.compute_tangents();

        let mut second_only = mesh.clone();
        second_only.indices = vec![0, 3, 1];
        for v in &mut second_only.vertices {
            v.tangent = Vertex::default().tangent;
        }
        second_only.compute_tangents();

        assert_eq!(mesh.vertices[0].tangent, second_only.vertices[0].tangent);
    }
}
