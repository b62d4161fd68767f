//! Point light billboards
//!
//! Fills the per-frame light array and draws one alpha-blended billboard
//! per light, sorted back to front so blending composes correctly.

use ash::{vk, Device};
use bytemuck::{Pod, Zeroable};

use crate::render::frame::FrameContext;
use crate::render::lighting::{GlobalUbo, PointLightData, MAX_LIGHTS};
use crate::render::vulkan::context::{VulkanContext, VulkanError, VulkanResult};
use crate::render::vulkan::pipeline::{GraphicsPipeline, PipelineConfig};
use crate::render::vulkan::shader::ShaderModule;
use crate::scene::{EntityId, Scene};

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct PointLightPushConstants {
    position: [f32; 4],
    color: [f32; 4],
    radius: f32,
}

/// Stable back-to-front ordering by the precomputed distance key.
/// Entries with equal keys keep their relative order, so coincident
/// lights are both drawn.
fn sort_back_to_front<T>(entries: &mut [(f32, T)]) {
    entries.sort_by(|a, b| b.0.total_cmp(&a.0));
}

/// Write all point lights into the UBO array, erroring past `MAX_LIGHTS`
fn fill_light_array(scene: &Scene, ubo: &mut GlobalUbo) -> VulkanResult<()> {
    let mut count = 0usize;
    for entity in scene.iter() {
        let Some(light) = entity.point_light else { continue };
        if count >= MAX_LIGHTS {
            return Err(VulkanError::InvalidOperation {
                reason: format!("scene exceeds the {} point light limit", MAX_LIGHTS),
            });
        }
        let p = entity.transform.translation;
        ubo.point_lights[count] = PointLightData {
            position: [p.x, p.y, p.z, 1.0],
            color: [entity.color.x, entity.color.y, entity.color.z, light.intensity],
        };
        count += 1;
    }
    ubo.num_lights = count as u32;
    Ok(())
}

pub struct PointLightSystem {
    device: Device,
    pipeline: GraphicsPipeline,
}

impl PointLightSystem {
    /// Build the billboard pipeline: alpha blending, no vertex input
    pub fn new(
        context: &VulkanContext,
        render_pass: vk::RenderPass,
        vert_path: &str,
        frag_path: &str,
        global_layout: vk::DescriptorSetLayout,
    ) -> VulkanResult<Self> {
        let vert = ShaderModule::from_file(context, vert_path)?;
        let frag = ShaderModule::from_file(context, frag_path)?;

        let push_range = vk::PushConstantRange::builder()
            .stage_flags(vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT)
            .offset(0)
            .size(std::mem::size_of::<PointLightPushConstants>() as u32)
            .build();
        let layout =
            GraphicsPipeline::create_layout(context, &[global_layout], &[push_range])?;

        let config = PipelineConfig::default().with_alpha_blending();
        let pipeline = GraphicsPipeline::new(context, &vert, &frag, &config, render_pass, layout)?;

        log::debug!("Point light system ready");
        Ok(Self {
            device: context.raw_device(),
            pipeline,
        })
    }

    /// Copy every light's position and color into the frame's UBO.
    ///
    /// Fails when the scene carries more lights than `MAX_LIGHTS`.
    pub fn update(&self, scene: &Scene, ubo: &mut GlobalUbo) -> VulkanResult<()> {
        fill_light_array(scene, ubo)
    }

    pub fn render(&self, frame: &FrameContext) {
        let camera_position = frame.camera.position();
        let mut order: Vec<(f32, EntityId)> = frame
            .scene
            .iter()
            .filter(|entity| entity.point_light.is_some())
            .map(|entity| {
                let offset = camera_position - entity.transform.translation;
                (offset.norm_squared(), entity.id())
            })
            .collect();
        sort_back_to_front(&mut order);

        if order.is_empty() {
            return;
        }

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

        for (_, id) in order {
            let Some(entity) = frame.scene.get(id) else { continue };
            let Some(light) = entity.point_light else { continue };

            let p = entity.transform.translation;
            let push = PointLightPushConstants {
                position: [p.x, p.y, p.z, 1.0],
                color: [entity.color.x, entity.color.y, entity.color.z, light.intensity],
                radius: entity.transform.scale.x,
            };
            unsafe {
                self.device.cmd_push_constants(
                    frame.command_buffer,
                    self.pipeline.layout(),
                    vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT,
                    0,
                    bytemuck::bytes_of(&push),
                );
                // Billboard corners are generated in the vertex shader
                self.device.cmd_draw(frame.command_buffer, 6, 1, 0, 0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn farthest_light_draws_first() {
        let mut entries = vec![(4.0, "mid"), (1.0, "near"), (9.0, "far")];
        sort_back_to_front(&mut entries);
        let order: Vec<&str> = entries.iter().map(|e| e.1).collect();
        assert_eq!(order, vec!["far", "mid", "near"]);
    }

    #[test]
    fn equal_distances_keep_both_lights_in_order() {
        let mut entries = vec![(5.0, "first"), (5.0, "second"), (2.0, "close")];
        sort_back_to_front(&mut entries);
        let order: Vec<&str> = entries.iter().map(|e| e.1).collect();
        assert_eq!(order, vec!["first", "second", "close"]);
    }

    #[test]
    fn fill_counts_only_light_entities() {
        let mut scene = Scene::new();
        scene.create_entity();
        scene
            .create_entity()
            .make_point_light(1.0, 0.1, Vector3::new(1.0, 0.0, 0.0));
        scene
            .create_entity()
            .make_point_light(2.0, 0.2, Vector3::new(0.0, 1.0, 0.0));

        let mut ubo = GlobalUbo::default();
        assert!(fill_light_array(&scene, &mut ubo).is_ok());
        assert_eq!(ubo.num_lights, 2);
    }

    #[test]
    fn fill_carries_intensity_in_color_alpha() {
        let mut scene = Scene::new();
        scene
            .create_entity()
            .make_point_light(3.5, 0.1, Vector3::new(0.2, 0.4, 0.6));

        let mut ubo = GlobalUbo::default();
        fill_light_array(&scene, &mut ubo).unwrap();
        assert_eq!(ubo.point_lights[0].color[3], 3.5);
    }

    #[test]
    fn fill_rejects_light_overflow() {
        let mut scene = Scene::new();
        for _ in 0..MAX_LIGHTS + 1 {
            scene
                .create_entity()
                .make_point_light(1.0, 0.1, Vector3::new(1.0, 1.0, 1.0));
        }
        let mut ubo = GlobalUbo::default();
        assert!(fill_light_array(&scene, &mut ubo).is_err());
    }
}
