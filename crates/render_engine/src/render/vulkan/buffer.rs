//! Vulkan buffer management
//!
//! A single RAII buffer type covering both staged device-local uploads
//! (vertex/index data) and persistently mapped host-visible buffers
//! (per-frame uniforms).

use ash::{vk, Device};
use std::ffi::c_void;

use crate::render::vulkan::context::{VulkanContext, VulkanError, VulkanResult};

/// A Vulkan buffer with bound device memory
pub struct Buffer {
    device: Device,
    buffer: vk::Buffer,
    memory: vk::DeviceMemory,
    size: vk::DeviceSize,
    alignment_size: vk::DeviceSize,
    mapped: Option<*mut c_void>,
}

impl Buffer {
    /// Create a buffer with the given usage and memory properties
    pub fn new(
        context: &VulkanContext,
        size: vk::DeviceSize,
        usage: vk::BufferUsageFlags,
        properties: vk::MemoryPropertyFlags,
    ) -> VulkanResult<Self> {
        let device = context.raw_device();

        let buffer_info = vk::BufferCreateInfo::builder()
            .size(size)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = unsafe {
            device
                .create_buffer(&buffer_info, None)
                .map_err(VulkanError::Api)?
        };

        let mem_requirements = unsafe { device.get_buffer_memory_requirements(buffer) };
        let memory_type_index =
            context.find_memory_type(mem_requirements.memory_type_bits, properties)?;

        let alloc_info = vk::MemoryAllocateInfo::builder()
            .allocation_size(mem_requirements.size)
            .memory_type_index(memory_type_index);

        let memory = unsafe {
            device
                .allocate_memory(&alloc_info, None)
                .map_err(VulkanError::Api)?
        };

        unsafe {
            device
                .bind_buffer_memory(buffer, memory, 0)
                .map_err(VulkanError::Api)?;
        }

        Ok(Self {
            device,
            buffer,
            memory,
            size,
            alignment_size: size,
            mapped: None,
        })
    }

    /// Create a device-local buffer filled through a temporary staging buffer.
    ///
    /// The staging buffer is host-visible, the destination lives in
    /// device-local memory; a one-shot transfer command copies between them
    /// and the staging buffer is destroyed before this returns.
    pub fn new_device_local<T: bytemuck::Pod>(
        context: &VulkanContext,
        data: &[T],
        usage: vk::BufferUsageFlags,
    ) -> VulkanResult<Self> {
        let size = std::mem::size_of_val(data) as vk::DeviceSize;
        if size == 0 {
            return Err(VulkanError::InvalidOperation {
                reason: "cannot create buffer from empty data".to_string(),
            });
        }

        let mut staging = Self::new(
            context,
            size,
            vk::BufferUsageFlags::TRANSFER_SRC,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        )?;
        staging.map()?;
        staging.write(bytemuck::cast_slice(data));
        staging.unmap();

        let device_local = Self::new(
            context,
            size,
            usage | vk::BufferUsageFlags::TRANSFER_DST,
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
        )?;

        context.copy_buffer(staging.buffer, device_local.buffer, size)?;

        Ok(device_local)
    }

    /// Create a buffer of `instance_count` instances, each padded up to
    /// `min_alignment` so instances can be bound at dynamic offsets
    pub fn new_aligned(
        context: &VulkanContext,
        instance_size: vk::DeviceSize,
        instance_count: u32,
        usage: vk::BufferUsageFlags,
        properties: vk::MemoryPropertyFlags,
        min_alignment: vk::DeviceSize,
    ) -> VulkanResult<Self> {
        let alignment_size = Self::alignment(instance_size, min_alignment);
        let mut buffer = Self::new(
            context,
            alignment_size * instance_count as vk::DeviceSize,
            usage,
            properties,
        )?;
        buffer.alignment_size = alignment_size;
        Ok(buffer)
    }

    /// Round `instance_size` up to the next multiple of `min_alignment`
    pub fn alignment(instance_size: vk::DeviceSize, min_alignment: vk::DeviceSize) -> vk::DeviceSize {
        if min_alignment > 0 {
            (instance_size + min_alignment - 1) & !(min_alignment - 1)
        } else {
            instance_size
        }
    }

    /// Map the buffer memory for host access, keeping the mapping open
    pub fn map(&mut self) -> VulkanResult<()> {
        if self.mapped.is_some() {
            return Ok(());
        }
        let ptr = unsafe {
            self.device
                .map_memory(self.memory, 0, self.size, vk::MemoryMapFlags::empty())
                .map_err(VulkanError::Api)?
        };
        self.mapped = Some(ptr);
        Ok(())
    }

    pub fn unmap(&mut self) {
        if self.mapped.take().is_some() {
            unsafe { self.device.unmap_memory(self.memory) };
        }
    }

    /// Copy bytes into a mapped buffer. No-op if the buffer is unmapped.
    pub fn write(&mut self, data: &[u8]) {
        if let Some(ptr) = self.mapped {
            let len = data.len().min(self.size as usize);
            unsafe {
                std::ptr::copy_nonoverlapping(data.as_ptr(), ptr as *mut u8, len);
            }
        }
    }

    /// Copy a Pod value into the instance slot at `index` of an aligned
    /// buffer
    pub fn write_instance<T: bytemuck::Pod>(&mut self, index: u32, value: &T) {
        if let Some(ptr) = self.mapped {
            let offset = self.alignment_size * index as vk::DeviceSize;
            let bytes = bytemuck::bytes_of(value);
            if offset + bytes.len() as vk::DeviceSize <= self.size {
                unsafe {
                    std::ptr::copy_nonoverlapping(
                        bytes.as_ptr(),
                        (ptr as *mut u8).add(offset as usize),
                        bytes.len(),
                    );
                }
            }
        }
    }

    /// Make host writes visible to the device for non-coherent memory
    pub fn flush(&self) -> VulkanResult<()> {
        let range = vk::MappedMemoryRange::builder()
            .memory(self.memory)
            .offset(0)
            .size(vk::WHOLE_SIZE);
        unsafe {
            self.device
                .flush_mapped_memory_ranges(&[range.build()])
                .map_err(VulkanError::Api)
        }
    }

    pub fn handle(&self) -> vk::Buffer {
        self.buffer
    }

    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }

    pub fn descriptor_info(&self) -> vk::DescriptorBufferInfo {
        vk::DescriptorBufferInfo {
            buffer: self.buffer,
            offset: 0,
            range: self.size,
        }
    }

    /// Descriptor info covering the instance slot at `index` of an
    /// aligned buffer
    pub fn instance_descriptor_info(&self, index: u32) -> vk::DescriptorBufferInfo {
        vk::DescriptorBufferInfo {
            buffer: self.buffer,
            offset: self.alignment_size * index as vk::DeviceSize,
            range: self.alignment_size,
        }
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        self.unmap();
        unsafe {
            self.device.destroy_buffer(self.buffer, None);
            self.device.free_memory(self.memory, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alignment_rounds_up_to_multiple() {
        assert_eq!(Buffer::alignment(200, 64), 256);
        assert_eq!(Buffer::alignment(256, 64), 256);
        assert_eq!(Buffer::alignment(1, 256), 256);
    }

    #[test]
    fn zero_alignment_leaves_size_unchanged() {
        assert_eq!(Buffer::alignment(200, 0), 200);
    }
}
