//! Sampled textures
//!
//! 2D textures and cubemaps uploaded through a staging buffer, transitioned
//! to shader-read layout, and paired with an immutable sampler.

use ash::{vk, Device};

use crate::render::vulkan::buffer::Buffer;
use crate::render::vulkan::context::{VulkanContext, VulkanError, VulkanResult};

const CUBE_FACE_COUNT: u32 = 6;

/// A sampled image with its view and sampler
pub struct Texture {
    device: Device,
    image: vk::Image,
    memory: vk::DeviceMemory,
    view: vk::ImageView,
    sampler: vk::Sampler,
}

impl Texture {
    /// Create a 2D texture from tightly packed RGBA8 pixels
    pub fn new_2d(
        context: &VulkanContext,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> VulkanResult<Self> {
        let expected = (width as usize) * (height as usize) * 4;
        if pixels.len() != expected {
            return Err(VulkanError::InvalidOperation {
                reason: format!(
                    "texture data size {} does not match {}x{} RGBA8",
                    pixels.len(),
                    width,
                    height
                ),
            });
        }

        let (image, memory, view) = Self::upload(
            context,
            pixels,
            width,
            height,
            1,
            vk::ImageViewType::TYPE_2D,
            vk::ImageCreateFlags::empty(),
        )?;
        let sampler = Self::create_sampler(context, vk::SamplerAddressMode::REPEAT)?;

        Ok(Self {
            device: context.raw_device(),
            image,
            memory,
            view,
            sampler,
        })
    }

    /// Create a cubemap from six equally sized RGBA8 faces, ordered
    /// +X, -X, +Y, -Y, +Z, -Z
    pub fn new_cubemap(
        context: &VulkanContext,
        faces: &[Vec<u8>; 6],
        width: u32,
        height: u32,
    ) -> VulkanResult<Self> {
        let face_size = (width as usize) * (height as usize) * 4;
        if faces.iter().any(|face| face.len() != face_size) {
            return Err(VulkanError::InvalidOperation {
                reason: "cubemap faces must all be the same RGBA8 size".to_string(),
            });
        }

        let mut pixels = Vec::with_capacity(face_size * 6);
        for face in faces {
            pixels.extend_from_slice(face);
        }

        let (image, memory, view) = Self::upload(
            context,
            &pixels,
            width,
            height,
            CUBE_FACE_COUNT,
            vk::ImageViewType::CUBE,
            vk::ImageCreateFlags::CUBE_COMPATIBLE,
        )?;
        // Clamp avoids seam artifacts at face edges
        let sampler = Self::create_sampler(context, vk::SamplerAddressMode::CLAMP_TO_EDGE)?;

        Ok(Self {
            device: context.raw_device(),
            image,
            memory,
            view,
            sampler,
        })
    }

    fn upload(
        context: &VulkanContext,
        pixels: &[u8],
        width: u32,
        height: u32,
        layer_count: u32,
        view_type: vk::ImageViewType,
        flags: vk::ImageCreateFlags,
    ) -> VulkanResult<(vk::Image, vk::DeviceMemory, vk::ImageView)> {
        let size = pixels.len() as vk::DeviceSize;
        let mut staging = Buffer::new(
            context,
            size,
            vk::BufferUsageFlags::TRANSFER_SRC,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        )?;
        staging.map()?;
        staging.write(pixels);
        staging.unmap();

        let format = vk::Format::R8G8B8A8_SRGB;
        let (image, memory) = context.create_image(
            width,
            height,
            layer_count,
            format,
            vk::ImageUsageFlags::TRANSFER_DST | vk::ImageUsageFlags::SAMPLED,
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
            flags,
        )?;

        context.transition_image_layout(
            image,
            vk::ImageLayout::UNDEFINED,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            layer_count,
        )?;
        context.copy_buffer_to_image(staging.handle(), image, width, height, layer_count)?;
        context.transition_image_layout(
            image,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            layer_count,
        )?;

        let view = context.create_image_view(
            image,
            view_type,
            format,
            vk::ImageAspectFlags::COLOR,
            layer_count,
        )?;

        Ok((image, memory, view))
    }

    fn create_sampler(
        context: &VulkanContext,
        address_mode: vk::SamplerAddressMode,
    ) -> VulkanResult<vk::Sampler> {
        let max_anisotropy = context
            .physical_device
            .properties
            .limits
            .max_sampler_anisotropy;

        let create_info = vk::SamplerCreateInfo::builder()
            .mag_filter(vk::Filter::LINEAR)
            .min_filter(vk::Filter::LINEAR)
            .address_mode_u(address_mode)
            .address_mode_v(address_mode)
            .address_mode_w(address_mode)
            .anisotropy_enable(true)
            .max_anisotropy(max_anisotropy)
            .border_color(vk::BorderColor::INT_OPAQUE_BLACK)
            .unnormalized_coordinates(false)
            .compare_enable(false)
            .compare_op(vk::CompareOp::ALWAYS)
            .mipmap_mode(vk::SamplerMipmapMode::LINEAR)
            .mip_lod_bias(0.0)
            .min_lod(0.0)
            .max_lod(0.0);

        unsafe {
            context
                .raw_device()
                .create_sampler(&create_info, None)
                .map_err(VulkanError::Api)
        }
    }

    pub fn descriptor_info(&self) -> vk::DescriptorImageInfo {
        vk::DescriptorImageInfo {
            sampler: self.sampler,
            image_view: self.view,
            image_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        }
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_sampler(self.sampler, None);
            self.device.destroy_image_view(self.view, None);
            self.device.destroy_image(self.image, None);
            self.device.free_memory(self.memory, None);
        }
    }
}
