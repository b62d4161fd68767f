//! SPIR-V shader module loading

use ash::{vk, Device};
use std::path::Path;

use crate::render::vulkan::context::{VulkanContext, VulkanError, VulkanResult};

/// A compiled SPIR-V shader module with RAII cleanup
pub struct ShaderModule {
    device: Device,
    module: vk::ShaderModule,
}

impl ShaderModule {
    /// Load a pre-compiled SPIR-V file from disk
    pub fn from_file<P: AsRef<Path>>(context: &VulkanContext, path: P) -> VulkanResult<Self> {
        let bytes = std::fs::read(path.as_ref()).map_err(|e| {
            VulkanError::InitializationFailed(format!(
                "failed to read shader {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_bytes(context, &bytes)
    }

    /// Create a shader module from raw SPIR-V bytes
    pub fn from_bytes(context: &VulkanContext, bytes: &[u8]) -> VulkanResult<Self> {
        if bytes.len() % 4 != 0 {
            return Err(VulkanError::InvalidOperation {
                reason: "SPIR-V byte length must be a multiple of 4".to_string(),
            });
        }

        // SPIR-V is a stream of 32-bit words; the bytes may not be aligned
        let code: Vec<u32> = bytes
            .chunks_exact(4)
            .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();

        let device = context.raw_device();
        let create_info = vk::ShaderModuleCreateInfo::builder().code(&code);
        let module = unsafe {
            device
                .create_shader_module(&create_info, None)
                .map_err(VulkanError::Api)?
        };

        Ok(Self { device, module })
    }

    pub fn handle(&self) -> vk::ShaderModule {
        self.module
    }
}

impl Drop for ShaderModule {
    fn drop(&mut self) {
        unsafe { self.device.destroy_shader_module(self.module, None) };
    }
}
