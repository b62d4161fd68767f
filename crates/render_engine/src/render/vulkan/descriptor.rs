//! Descriptor set layouts, pools and writers
//!
//! The pool has a fixed capacity declared up front; allocation beyond that
//! capacity fails with an explicit error instead of relying on driver
//! behavior. Capacity accounting is done CPU-side in `PoolBudget` before
//! any Vulkan call is made.

use ash::{vk, Device};
use std::collections::HashMap;

use crate::render::vulkan::context::{VulkanContext, VulkanError, VulkanResult};

/// CPU-side capacity accounting for a descriptor pool.
///
/// Tracks remaining sets and remaining descriptors per type so exhaustion
/// is detected deterministically before the driver is asked.
#[derive(Debug, Clone)]
pub struct PoolBudget {
    remaining_sets: u32,
    remaining_descriptors: HashMap<vk::DescriptorType, u32>,
}

impl PoolBudget {
    pub fn new(max_sets: u32, pool_sizes: &[(vk::DescriptorType, u32)]) -> Self {
        let mut remaining_descriptors = HashMap::new();
        for &(ty, count) in pool_sizes {
            *remaining_descriptors.entry(ty).or_insert(0) += count;
        }
        Self {
            remaining_sets: max_sets,
            remaining_descriptors,
        }
    }

    /// Reserve one set consuming the given descriptor counts, or report
    /// what ran out
    pub fn reserve(
        &mut self,
        descriptors: &[(vk::DescriptorType, u32)],
    ) -> Result<(), String> {
        if self.remaining_sets == 0 {
            return Err("no descriptor sets remaining".to_string());
        }
        for &(ty, count) in descriptors {
            let available = self.remaining_descriptors.get(&ty).copied().unwrap_or(0);
            if available < count {
                return Err(format!(
                    "descriptor type {:?}: requested {}, {} remaining",
                    ty, count, available
                ));
            }
        }

        self.remaining_sets -= 1;
        for &(ty, count) in descriptors {
            if let Some(available) = self.remaining_descriptors.get_mut(&ty) {
                *available -= count;
            }
        }
        Ok(())
    }

    pub fn remaining_sets(&self) -> u32 {
        self.remaining_sets
    }
}

/// Descriptor set layout built from explicit bindings
pub struct DescriptorSetLayout {
    device: Device,
    layout: vk::DescriptorSetLayout,
    bindings: HashMap<u32, vk::DescriptorSetLayoutBinding>,
}

/// Builder for a descriptor set layout; rejects duplicate binding indices
pub struct DescriptorSetLayoutBuilder {
    bindings: HashMap<u32, vk::DescriptorSetLayoutBinding>,
}

impl DescriptorSetLayoutBuilder {
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    pub fn add_binding(
        mut self,
        binding: u32,
        descriptor_type: vk::DescriptorType,
        stage_flags: vk::ShaderStageFlags,
    ) -> VulkanResult<Self> {
        if self.bindings.contains_key(&binding) {
            return Err(VulkanError::DuplicateBinding { binding });
        }
        self.bindings.insert(
            binding,
            vk::DescriptorSetLayoutBinding::builder()
                .binding(binding)
                .descriptor_type(descriptor_type)
                .descriptor_count(1)
                .stage_flags(stage_flags)
                .build(),
        );
        Ok(self)
    }

    pub fn build(self, context: &VulkanContext) -> VulkanResult<DescriptorSetLayout> {
        let device = context.raw_device();
        let binding_list: Vec<vk::DescriptorSetLayoutBinding> =
            self.bindings.values().copied().collect();
        let create_info =
            vk::DescriptorSetLayoutCreateInfo::builder().bindings(&binding_list);

        let layout = unsafe {
            device
                .create_descriptor_set_layout(&create_info, None)
                .map_err(VulkanError::Api)?
        };

        Ok(DescriptorSetLayout {
            device,
            layout,
            bindings: self.bindings,
        })
    }
}

impl Default for DescriptorSetLayoutBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DescriptorSetLayout {
    pub fn builder() -> DescriptorSetLayoutBuilder {
        DescriptorSetLayoutBuilder::new()
    }

    pub fn handle(&self) -> vk::DescriptorSetLayout {
        self.layout
    }

    fn binding(&self, index: u32) -> Option<&vk::DescriptorSetLayoutBinding> {
        self.bindings.get(&index)
    }

    /// Descriptor counts one set of this layout consumes from a pool
    fn descriptor_counts(&self) -> Vec<(vk::DescriptorType, u32)> {
        self.bindings
            .values()
            .map(|b| (b.descriptor_type, b.descriptor_count))
            .collect()
    }
}

impl Drop for DescriptorSetLayout {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_descriptor_set_layout(self.layout, None);
        }
    }
}

/// Fixed-capacity descriptor pool with explicit exhaustion errors
pub struct DescriptorPool {
    device: Device,
    pool: vk::DescriptorPool,
    budget: PoolBudget,
}

impl DescriptorPool {
    pub fn new(
        context: &VulkanContext,
        max_sets: u32,
        pool_sizes: &[(vk::DescriptorType, u32)],
    ) -> VulkanResult<Self> {
        let device = context.raw_device();
        let sizes: Vec<vk::DescriptorPoolSize> = pool_sizes
            .iter()
            .map(|&(ty, count)| vk::DescriptorPoolSize {
                ty,
                descriptor_count: count,
            })
            .collect();

        let create_info = vk::DescriptorPoolCreateInfo::builder()
            .max_sets(max_sets)
            .pool_sizes(&sizes);

        let pool = unsafe {
            device
                .create_descriptor_pool(&create_info, None)
                .map_err(VulkanError::Api)?
        };

        Ok(Self {
            device,
            pool,
            budget: PoolBudget::new(max_sets, pool_sizes),
        })
    }

    /// Allocate one descriptor set of the given layout
    pub fn allocate(&mut self, layout: &DescriptorSetLayout) -> VulkanResult<vk::DescriptorSet> {
        self.budget
            .reserve(&layout.descriptor_counts())
            .map_err(VulkanError::PoolExhausted)?;

        let layouts = [layout.handle()];
        let alloc_info = vk::DescriptorSetAllocateInfo::builder()
            .descriptor_pool(self.pool)
            .set_layouts(&layouts);

        let sets = unsafe {
            self.device
                .allocate_descriptor_sets(&alloc_info)
                .map_err(VulkanError::Api)?
        };
        Ok(sets[0])
    }

    pub fn remaining_sets(&self) -> u32 {
        self.budget.remaining_sets()
    }
}

impl Drop for DescriptorPool {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_descriptor_pool(self.pool, None);
        }
    }
}

/// Batches descriptor writes for one set and flushes them in a single call
pub struct DescriptorWriter<'a> {
    layout: &'a DescriptorSetLayout,
    buffer_infos: Vec<(u32, vk::DescriptorBufferInfo)>,
    image_infos: Vec<(u32, vk::DescriptorImageInfo)>,
}

impl<'a> DescriptorWriter<'a> {
    pub fn new(layout: &'a DescriptorSetLayout) -> Self {
        Self {
            layout,
            buffer_infos: Vec::new(),
            image_infos: Vec::new(),
        }
    }

    pub fn write_buffer(mut self, binding: u32, info: vk::DescriptorBufferInfo) -> Self {
        self.buffer_infos.push((binding, info));
        self
    }

    pub fn write_image(mut self, binding: u32, info: vk::DescriptorImageInfo) -> Self {
        self.image_infos.push((binding, info));
        self
    }

    /// Allocate a set from the pool and apply all queued writes in one
    /// batch. On pool exhaustion the error propagates and no set is
    /// handed out.
    pub fn build(
        self,
        context: &VulkanContext,
        pool: &mut DescriptorPool,
    ) -> VulkanResult<vk::DescriptorSet> {
        let set = pool.allocate(self.layout)?;
        self.update(context, set)?;
        Ok(set)
    }

    /// Apply all queued writes to an existing set
    pub fn update(self, context: &VulkanContext, set: vk::DescriptorSet) -> VulkanResult<()> {
        let mut writes = Vec::new();

        for (binding, info) in &self.buffer_infos {
            let layout_binding =
                self.layout
                    .binding(*binding)
                    .ok_or(VulkanError::InvalidOperation {
                        reason: format!("binding {} not present in layout", binding),
                    })?;
            writes.push(
                vk::WriteDescriptorSet::builder()
                    .dst_set(set)
                    .dst_binding(*binding)
                    .descriptor_type(layout_binding.descriptor_type)
                    .buffer_info(std::slice::from_ref(info))
                    .build(),
            );
        }

        for (binding, info) in &self.image_infos {
            let layout_binding =
                self.layout
                    .binding(*binding)
                    .ok_or(VulkanError::InvalidOperation {
                        reason: format!("binding {} not present in layout", binding),
                    })?;
            writes.push(
                vk::WriteDescriptorSet::builder()
                    .dst_set(set)
                    .dst_binding(*binding)
                    .descriptor_type(layout_binding.descriptor_type)
                    .image_info(std::slice::from_ref(info))
                    .build(),
            );
        }

        unsafe {
            context.raw_device().update_descriptor_sets(&writes, &[]);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_exhausts_sets() {
        let mut budget =
            PoolBudget::new(2, &[(vk::DescriptorType::UNIFORM_BUFFER, 4)]);
        let want = [(vk::DescriptorType::UNIFORM_BUFFER, 1)];
        assert!(budget.reserve(&want).is_ok());
        assert!(budget.reserve(&want).is_ok());
        assert!(budget.reserve(&want).is_err());
        assert_eq!(budget.remaining_sets(), 0);
    }

    #[test]
    fn budget_exhausts_descriptors_before_sets() {
        let mut budget =
            PoolBudget::new(10, &[(vk::DescriptorType::COMBINED_IMAGE_SAMPLER, 2)]);
        let want = [(vk::DescriptorType::COMBINED_IMAGE_SAMPLER, 1)];
        assert!(budget.reserve(&want).is_ok());
        assert!(budget.reserve(&want).is_ok());
        let err = budget.reserve(&want).unwrap_err();
        assert!(err.contains("COMBINED_IMAGE_SAMPLER"));
        // Sets were still available, only the descriptor type ran out
        assert!(budget.remaining_sets() > 0);
    }

    #[test]
    fn budget_rejects_unknown_descriptor_type() {
        let mut budget =
            PoolBudget::new(4, &[(vk::DescriptorType::UNIFORM_BUFFER, 4)]);
        let want = [(vk::DescriptorType::STORAGE_BUFFER, 1)];
        assert!(budget.reserve(&want).is_err());
    }

    #[test]
    fn budget_reserves_multiple_types_atomically() {
        let mut budget = PoolBudget::new(
            4,
            &[
                (vk::DescriptorType::UNIFORM_BUFFER, 2),
                (vk::DescriptorType::COMBINED_IMAGE_SAMPLER, 1),
            ],
        );
        // First reservation takes one of each
        assert!(budget
            .reserve(&[
                (vk::DescriptorType::UNIFORM_BUFFER, 1),
                (vk::DescriptorType::COMBINED_IMAGE_SAMPLER, 1),
            ])
            .is_ok());
        // Second fails on the sampler; the uniform count must be untouched
        assert!(budget
            .reserve(&[
                (vk::DescriptorType::UNIFORM_BUFFER, 1),
                (vk::DescriptorType::COMBINED_IMAGE_SAMPLER, 1),
            ])
            .is_err());
        assert!(budget
            .reserve(&[(vk::DescriptorType::UNIFORM_BUFFER, 1)])
            .is_ok());
    }
}
