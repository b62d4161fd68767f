//! Materials
//!
//! A material owns a base-color texture and the descriptor set that binds
//! it; the set is built once from the shared material layout and pool.

use ash::vk;

use crate::render::vulkan::context::{VulkanContext, VulkanResult};
use crate::render::vulkan::descriptor::{DescriptorPool, DescriptorSetLayout, DescriptorWriter};
use crate::render::vulkan::texture::Texture;

pub struct Material {
    texture: Texture,
    descriptor_set: Option<vk::DescriptorSet>,
}

impl Material {
    pub fn new(texture: Texture) -> Self {
        Self {
            texture,
            descriptor_set: None,
        }
    }

    /// Allocate and write this material's descriptor set.
    ///
    /// Fails with `VulkanError::PoolExhausted` when the pool's declared
    /// capacity is spent; the material is left without a set.
    pub fn build_descriptor(
        &mut self,
        context: &VulkanContext,
        layout: &DescriptorSetLayout,
        pool: &mut DescriptorPool,
    ) -> VulkanResult<()> {
        let set = DescriptorWriter::new(layout)
            .write_image(0, self.texture.descriptor_info())
            .build(context, pool)?;
        self.descriptor_set = Some(set);
        Ok(())
    }

    pub fn descriptor_set(&self) -> Option<vk::DescriptorSet> {
        self.descriptor_set
    }
}
