//! Vulkan rendering backend
//!
//! Low-level Vulkan wrappers following RAII ownership: every wrapper that
//! holds a device-dependent handle destroys it on drop, and struct field
//! order guarantees the device outlives everything created from it.

pub mod buffer;
pub mod context;
pub mod descriptor;
pub mod pipeline;
pub mod renderer;
pub mod shader;
pub mod swapchain;
pub mod sync;
pub mod texture;
pub mod window;

pub use buffer::Buffer;
pub use context::{LogicalDevice, PhysicalDeviceInfo, VulkanContext, VulkanError, VulkanInstance, VulkanResult};
pub use descriptor::{DescriptorPool, DescriptorSetLayout, DescriptorWriter};
pub use pipeline::{GraphicsPipeline, PipelineConfig};
pub use renderer::{ActiveFrame, Renderer};
pub use shader::ShaderModule;
pub use swapchain::Swapchain;
pub use sync::{Fence, FrameSlots, FrameSync, Semaphore};
pub use texture::Texture;
pub use window::{Window, WindowError};
