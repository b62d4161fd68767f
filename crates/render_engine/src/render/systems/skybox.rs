//! Skybox rendering
//!
//! Draws a cubemap-textured cube behind everything else: depth compare is
//! LESS_OR_EQUAL with writes off, so geometry already drawn always wins.

use ash::{vk, Device};

use crate::render::frame::FrameContext;
use crate::render::vulkan::context::{VulkanContext, VulkanResult};
use crate::render::vulkan::pipeline::{GraphicsPipeline, PipelineConfig};
use crate::render::vulkan::shader::ShaderModule;

/// 12 triangles, positions generated in the vertex shader
const CUBE_VERTEX_COUNT: u32 = 36;

pub struct SkyboxSystem {
    device: Device,
    pipeline: GraphicsPipeline,
    skybox_set: vk::DescriptorSet,
}

impl SkyboxSystem {
    /// `set_layouts` is [global, cubemap]; `skybox_set` binds the cubemap
    pub fn new(
        context: &VulkanContext,
        render_pass: vk::RenderPass,
        vert_path: &str,
        frag_path: &str,
        set_layouts: &[vk::DescriptorSetLayout],
        skybox_set: vk::DescriptorSet,
    ) -> VulkanResult<Self> {
        let vert = ShaderModule::from_file(context, vert_path)?;
        let frag = ShaderModule::from_file(context, frag_path)?;

        let layout = GraphicsPipeline::create_layout(context, set_layouts, &[])?;

        let config = PipelineConfig::default()
            .with_background_depth()
            .with_cull_mode(vk::CullModeFlags::NONE);
        let pipeline = GraphicsPipeline::new(context, &vert, &frag, &config, render_pass, layout)?;

        log::debug!("Skybox system ready");
        Ok(Self {
            device: context.raw_device(),
            pipeline,
            skybox_set,
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
                &[frame.global_descriptor_set, self.skybox_set],
                &[],
            );
            self.device
                .cmd_draw(frame.command_buffer, CUBE_VERTEX_COUNT, 1, 0, 0);
        }
    }
}
