//! Per-frame render context
//!
//! Bundles everything the render systems need for one frame. Built fresh
//! each frame and passed by reference; never stored.

use ash::vk;

use crate::render::camera::Camera;
use crate::scene::Scene;

pub struct FrameContext<'a> {
    /// Index of the in-flight frame slot
    pub frame_index: usize,
    /// Seconds since the previous frame
    pub frame_time: f32,
    pub command_buffer: vk::CommandBuffer,
    pub camera: &'a Camera,
    /// Set 0: the per-frame global UBO
    pub global_descriptor_set: vk::DescriptorSet,
    pub scene: &'a Scene,
}
