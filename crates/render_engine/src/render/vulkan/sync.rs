//! CPU/GPU synchronization primitives
//!
//! Semaphores order GPU work against presentation; fences let the CPU wait
//! for a frame slot's previous submission before reusing its resources.

use ash::{vk, Device};

use crate::render::vulkan::context::{VulkanContext, VulkanError, VulkanResult};

/// Number of frames the CPU may record ahead of the GPU
pub const MAX_FRAMES_IN_FLIGHT: usize = 2;

/// Binary semaphore with RAII cleanup
pub struct Semaphore {
    device: Device,
    semaphore: vk::Semaphore,
}

impl Semaphore {
    pub fn new(context: &VulkanContext) -> VulkanResult<Self> {
        let device = context.raw_device();
        let create_info = vk::SemaphoreCreateInfo::builder();
        let semaphore = unsafe {
            device
                .create_semaphore(&create_info, None)
                .map_err(VulkanError::Api)?
        };
        Ok(Self { device, semaphore })
    }

    pub fn handle(&self) -> vk::Semaphore {
        self.semaphore
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        unsafe { self.device.destroy_semaphore(self.semaphore, None) };
    }
}

/// Fence with RAII cleanup, created signaled so the first wait passes
pub struct Fence {
    device: Device,
    fence: vk::Fence,
}

impl Fence {
    pub fn new_signaled(context: &VulkanContext) -> VulkanResult<Self> {
        let device = context.raw_device();
        let create_info =
            vk::FenceCreateInfo::builder().flags(vk::FenceCreateFlags::SIGNALED);
        let fence = unsafe {
            device
                .create_fence(&create_info, None)
                .map_err(VulkanError::Api)?
        };
        Ok(Self { device, fence })
    }

    /// Block until the fence signals
    pub fn wait(&self) -> VulkanResult<()> {
        unsafe {
            self.device
                .wait_for_fences(&[self.fence], true, u64::MAX)
                .map_err(VulkanError::Api)
        }
    }

    pub fn reset(&self) -> VulkanResult<()> {
        unsafe {
            self.device
                .reset_fences(&[self.fence])
                .map_err(VulkanError::Api)
        }
    }

    pub fn handle(&self) -> vk::Fence {
        self.fence
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        unsafe { self.device.destroy_fence(self.fence, None) };
    }
}

/// Synchronization objects owned by one frame slot
pub struct FrameSync {
    /// Signaled when the swapchain image is ready to be rendered into
    pub image_available: Semaphore,
    /// Signaled when rendering finishes, gating presentation
    pub render_finished: Semaphore,
    /// Signaled when this slot's command buffer has fully executed
    pub in_flight: Fence,
}

impl FrameSync {
    pub fn new(context: &VulkanContext) -> VulkanResult<Self> {
        Ok(Self {
            image_available: Semaphore::new(context)?,
            render_finished: Semaphore::new(context)?,
            in_flight: Fence::new_signaled(context)?,
        })
    }
}

/// Tracks which of the in-flight frame slots is current.
///
/// Pure bookkeeping, no device handles: the renderer pairs each slot index
/// with its `FrameSync` and command buffer.
#[derive(Debug, Clone, Copy)]
pub struct FrameSlots {
    current: usize,
    capacity: usize,
}

impl FrameSlots {
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        Self {
            current: 0,
            capacity,
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Advance to the next slot, wrapping at capacity
    pub fn advance(&mut self) -> usize {
        self.current = (self.current + 1) % self.capacity;
        self.current
    }

    /// Return to slot zero, used after a swapchain rebuild
    pub fn reset(&mut self) {
        self.current = 0;
    }
}

impl Default for FrameSlots {
    fn default() -> Self {
        Self::new(MAX_FRAMES_IN_FLIGHT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_cycle_through_capacity() {
        let mut slots = FrameSlots::new(2);
        assert_eq!(slots.current(), 0);
        assert_eq!(slots.advance(), 1);
        assert_eq!(slots.advance(), 0);
        assert_eq!(slots.advance(), 1);
    }

    #[test]
    fn slots_never_exceed_capacity() {
        let mut slots = FrameSlots::new(3);
        for _ in 0..100 {
            assert!(slots.advance() < 3);
        }
    }

    #[test]
    fn reset_returns_to_slot_zero() {
        let mut slots = FrameSlots::default();
        slots.advance();
        assert_ne!(slots.current(), 0);
        slots.reset();
        assert_eq!(slots.current(), 0);
    }
}
