//! GPU geometry buffers
//!
//! A `Model` owns the device-local vertex buffer (and optional index
//! buffer) for one mesh, uploaded once through the staged path and
//! immutable afterwards. Models are shared across entities through the
//! scene's geometry arena.

use ash::{vk, Device};

use crate::render::mesh::{MeshData, Vertex};
use crate::render::vulkan::buffer::Buffer;
use crate::render::vulkan::context::{VulkanContext, VulkanError, VulkanResult};

pub struct Model {
    device: Device,
    vertex_buffer: Buffer,
    vertex_count: u32,
    index_buffer: Option<Buffer>,
    index_count: u32,
}

impl Model {
    /// Upload mesh data to device-local memory
    pub fn new(context: &VulkanContext, mesh: &MeshData) -> VulkanResult<Self> {
        if mesh.vertices.len() < 3 {
            return Err(VulkanError::InvalidOperation {
                reason: format!(
                    "model needs at least 3 vertices, got {}",
                    mesh.vertices.len()
                ),
            });
        }

        let vertex_buffer = Buffer::new_device_local(
            context,
            &mesh.vertices,
            vk::BufferUsageFlags::VERTEX_BUFFER,
        )?;

        let index_buffer = if mesh.indices.is_empty() {
            None
        } else {
            Some(Buffer::new_device_local(
                context,
                &mesh.indices,
                vk::BufferUsageFlags::INDEX_BUFFER,
            )?)
        };

        Ok(Self {
            device: context.raw_device(),
            vertex_buffer,
            vertex_count: mesh.vertices.len() as u32,
            index_buffer,
            index_count: mesh.indices.len() as u32,
        })
    }

    /// Build a model directly from vertex data, without indices
    pub fn from_vertices(context: &VulkanContext, vertices: &[Vertex]) -> VulkanResult<Self> {
        Self::new(
            context,
            &MeshData {
                vertices: vertices.to_vec(),
                indices: Vec::new(),
                has_tangents: true,
            },
        )
    }

    pub fn bind(&self, command_buffer: vk::CommandBuffer) {
        unsafe {
            self.device.cmd_bind_vertex_buffers(
                command_buffer,
                0,
                &[self.vertex_buffer.handle()],
                &[0],
            );
            if let Some(index_buffer) = &self.index_buffer {
                self.device.cmd_bind_index_buffer(
                    command_buffer,
                    index_buffer.handle(),
                    0,
                    vk::IndexType::UINT32,
                );
            }
        }
    }

    pub fn draw(&self, command_buffer: vk::CommandBuffer) {
        unsafe {
            if self.index_buffer.is_some() {
                self.device
                    .cmd_draw_indexed(command_buffer, self.index_count, 1, 0, 0, 0);
            } else {
                self.device
                    .cmd_draw(command_buffer, self.vertex_count, 1, 0, 0);
            }
        }
    }
}
