//! Opaque geometry rendering
//!
//! Draws every entity that carries a geometry handle and a built material,
//! pushing its model and normal matrices as push constants and binding the
//! material's descriptor set.

use ash::{vk, Device};
use bytemuck::{Pod, Zeroable};
use nalgebra::Matrix3;

use crate::render::frame::FrameContext;
use crate::render::mesh::Vertex;
use crate::render::vulkan::context::{VulkanContext, VulkanResult};
use crate::render::vulkan::pipeline::{GraphicsPipeline, PipelineConfig};
use crate::render::vulkan::shader::ShaderModule;
use crate::scene::{Entity, Scene};

/// Per-object data, sized to stay within the 128-byte push constant
/// minimum: 64 (model) + 48 (normal as three vec4 columns) + 16 (tint)
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct GeometryPushConstants {
    model_matrix: [[f32; 4]; 4],
    normal_matrix: [[f32; 4]; 3],
    tint: [f32; 4],
}

/// Descriptor set for the entity's material, if one is assigned and built
fn material_set_for(entity: &Entity, scene: &Scene) -> Option<vk::DescriptorSet> {
    entity
        .material
        .and_then(|handle| scene.material(handle))
        .and_then(|material| material.descriptor_set())
}

fn normal_columns(m: &Matrix3<f32>) -> [[f32; 4]; 3] {
    let mut columns = [[0.0f32; 4]; 3];
    for col in 0..3 {
        for row in 0..3 {
            columns[col][row] = m[(row, col)];
        }
    }
    columns
}

pub struct GeometrySystem {
    device: Device,
    pipeline: GraphicsPipeline,
}

impl GeometrySystem {
    /// Build the opaque pipeline against the given render pass.
    ///
    /// `set_layouts` is [global, material].
    pub fn new(
        context: &VulkanContext,
        render_pass: vk::RenderPass,
        vert_path: &str,
        frag_path: &str,
        set_layouts: &[vk::DescriptorSetLayout],
    ) -> VulkanResult<Self> {
        let vert = ShaderModule::from_file(context, vert_path)?;
        let frag = ShaderModule::from_file(context, frag_path)?;

        let push_range = vk::PushConstantRange::builder()
            .stage_flags(vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT)
            .offset(0)
            .size(std::mem::size_of::<GeometryPushConstants>() as u32)
            .build();
        let layout = GraphicsPipeline::create_layout(context, set_layouts, &[push_range])?;

        let config = PipelineConfig::default()
            .with_vertex_input(Vertex::binding_descriptions(), Vertex::attribute_descriptions());
        let pipeline = GraphicsPipeline::new(context, &vert, &frag, &config, render_pass, layout)?;

        log::debug!("Geometry system ready");
        Ok(Self {
            device: context.raw_device(),
            pipeline,
        })
    }

    pub fn render(&self, frame: &FrameContext) {
        self.pipeline.bind(frame.command_buffer);

        unsafe {
            self.device.cmd_bind_descriptor_sets(
                frame.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                self.pipeline.layout(),
                0,
                &[frame.global_descriptor_set],
                &[],
            );
        }

        for entity in frame.scene.iter() {
            let Some(geometry) = entity.geometry else { continue };
            let Some(model) = frame.scene.geometry(geometry) else {
                continue;
            };

            // The pipeline layout expects set 1; an entity whose material
            // set was never built cannot be drawn with this pipeline
            let Some(set) = material_set_for(entity, frame.scene) else {
                continue;
            };
            unsafe {
                self.device.cmd_bind_descriptor_sets(
                    frame.command_buffer,
                    vk::PipelineBindPoint::GRAPHICS,
                    self.pipeline.layout(),
                    1,
                    &[set],
                    &[],
                );
            }

            let push = GeometryPushConstants {
                model_matrix: entity.transform.matrix().into(),
                normal_matrix: normal_columns(&entity.transform.normal_matrix()),
                tint: [entity.color.x, entity.color.y, entity.color.z, 1.0],
            };
            unsafe {
                self.device.cmd_push_constants(
                    frame.command_buffer,
                    self.pipeline.layout(),
                    vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT,
                    0,
                    bytemuck::bytes_of(&push),
                );
            }

            model.bind(frame.command_buffer);
            model.draw(frame.command_buffer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{GeometryHandle, MaterialHandle};

    #[test]
    fn entities_without_a_material_have_no_set_to_bind() {
        let mut scene = Scene::new();
        let id = {
            let entity = scene.create_entity();
            entity.geometry = Some(GeometryHandle::default());
            entity.id()
        };
        let entity = scene.get(id).unwrap();
        assert!(material_set_for(entity, &scene).is_none());
    }

    #[test]
    fn stale_material_handles_have_no_set_to_bind() {
        let mut scene = Scene::new();
        let id = {
            let entity = scene.create_entity();
            entity.material = Some(MaterialHandle::default());
            entity.id()
        };
        let entity = scene.get(id).unwrap();
        assert!(material_set_for(entity, &scene).is_none());
    }

    #[test]
    fn push_constants_fit_the_guaranteed_minimum() {
        assert_eq!(std::mem::size_of::<GeometryPushConstants>(), 128);
    }

    #[test]
    fn normal_columns_preserve_matrix_entries() {
        let m = Matrix3::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0);
        let columns = normal_columns(&m);
        // Column 0 is the first column of the matrix, padded with zero
        assert_eq!(columns[0], [1.0, 4.0, 7.0, 0.0]);
        assert_eq!(columns[2], [3.0, 6.0, 9.0, 0.0]);
    }
}
