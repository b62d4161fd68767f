//! Frame scheduling
//!
//! Owns the swapchain, per-slot command buffers and sync objects, and
//! drives the acquire / record / submit / present cycle. A frame is
//! bracketed by `begin_frame` and `end_frame`; render passes are opened
//! explicitly in between so multiple systems can record into one pass.

use ash::{vk, Device};

use crate::render::vulkan::context::{VulkanContext, VulkanError, VulkanResult};
use crate::render::vulkan::swapchain::Swapchain;
use crate::render::vulkan::sync::{FrameSlots, FrameSync, MAX_FRAMES_IN_FLIGHT};
use crate::render::vulkan::window::Window;

/// Per-frame handles handed to render systems while a frame is open
#[derive(Debug, Clone, Copy)]
pub struct ActiveFrame {
    pub command_buffer: vk::CommandBuffer,
    /// Index of the in-flight slot, used to pick per-frame uniform buffers
    pub slot_index: usize,
    image_index: u32,
}

/// Tracks begin/end pairing for the frame and its render pass
#[derive(Debug, Default)]
struct FrameScope {
    frame_open: bool,
    in_render_pass: bool,
}

impl FrameScope {
    fn open_frame(&mut self) {
        debug_assert!(!self.frame_open, "begin_frame called while a frame is open");
        self.frame_open = true;
    }

    fn close_frame(&mut self) {
        debug_assert!(self.frame_open, "end_frame called without begin_frame");
        debug_assert!(
            !self.in_render_pass,
            "end_frame called with a render pass still open"
        );
        self.frame_open = false;
    }

    fn open_pass(&mut self) {
        debug_assert!(self.frame_open, "render pass opened outside a frame");
        debug_assert!(!self.in_render_pass, "render pass is already open");
        self.in_render_pass = true;
    }

    fn close_pass(&mut self) {
        debug_assert!(self.in_render_pass, "no render pass is open");
        self.in_render_pass = false;
    }

    fn reset(&mut self) {
        self.frame_open = false;
        self.in_render_pass = false;
    }
}

/// Drives the per-frame acquire/submit/present cycle
pub struct Renderer {
    device: Device,
    swapchain: Swapchain,
    command_buffers: Vec<vk::CommandBuffer>,
    frame_syncs: Vec<FrameSync>,
    slots: FrameSlots,
    scope: FrameScope,
}

impl Renderer {
    pub fn new(context: &VulkanContext, window: &Window) -> VulkanResult<Self> {
        let swapchain = Swapchain::new(context, window.framebuffer_extent(), None)?;

        let device = context.raw_device();
        let alloc_info = vk::CommandBufferAllocateInfo::builder()
            .command_pool(context.command_pool())
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(MAX_FRAMES_IN_FLIGHT as u32);
        let command_buffers = unsafe {
            device
                .allocate_command_buffers(&alloc_info)
                .map_err(VulkanError::Api)?
        };

        let mut frame_syncs = Vec::with_capacity(MAX_FRAMES_IN_FLIGHT);
        for _ in 0..MAX_FRAMES_IN_FLIGHT {
            frame_syncs.push(FrameSync::new(context)?);
        }

        Ok(Self {
            device,
            swapchain,
            command_buffers,
            frame_syncs,
            slots: FrameSlots::default(),
            scope: FrameScope::default(),
        })
    }

    pub fn render_pass(&self) -> vk::RenderPass {
        self.swapchain.render_pass()
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.swapchain.aspect_ratio()
    }

    pub fn current_slot(&self) -> usize {
        self.slots.current()
    }

    /// Wait for the current slot's previous submission, acquire the next
    /// swapchain image and start recording.
    ///
    /// Returns `VulkanError::SurfaceOutOfDate` when the swapchain must be
    /// rebuilt; the caller recovers by calling `rebuild_swapchain`.
    pub fn begin_frame(&mut self, context: &VulkanContext) -> VulkanResult<ActiveFrame> {
        let slot = self.slots.current();
        let sync = &self.frame_syncs[slot];
        sync.in_flight.wait()?;

        let acquire_result = unsafe {
            context.device.swapchain_loader.acquire_next_image(
                self.swapchain.handle(),
                u64::MAX,
                sync.image_available.handle(),
                vk::Fence::null(),
            )
        };

        let image_index = match acquire_result {
            Ok((index, _suboptimal)) => index,
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => return Err(VulkanError::SurfaceOutOfDate),
            Err(e) => return Err(VulkanError::Api(e)),
        };

        // Only reset the fence once we know work will be submitted
        sync.in_flight.reset()?;

        let command_buffer = self.command_buffers[slot];
        unsafe {
            self.device
                .reset_command_buffer(command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(VulkanError::Api)?;
            let begin_info = vk::CommandBufferBeginInfo::builder();
            self.device
                .begin_command_buffer(command_buffer, &begin_info)
                .map_err(VulkanError::Api)?;
        }

        self.scope.open_frame();
        Ok(ActiveFrame {
            command_buffer,
            slot_index: slot,
            image_index,
        })
    }

    /// Open the swapchain render pass with clear values and set the
    /// dynamic viewport and scissor to the full extent
    pub fn begin_render_pass(&mut self, frame: &ActiveFrame) {
        self.scope.open_pass();

        let clear_values = [
            vk::ClearValue {
                color: vk::ClearColorValue {
                    float32: [0.01, 0.01, 0.01, 1.0],
                },
            },
            vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue {
                    depth: 1.0,
                    stencil: 0,
                },
            },
        ];

        let render_pass_info = vk::RenderPassBeginInfo::builder()
            .render_pass(self.swapchain.render_pass())
            .framebuffer(self.swapchain.framebuffer(frame.image_index as usize))
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: self.swapchain.extent,
            })
            .clear_values(&clear_values);

        let viewport = vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: self.swapchain.extent.width as f32,
            height: self.swapchain.extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        };
        let scissor = vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent: self.swapchain.extent,
        };

        unsafe {
            self.device.cmd_begin_render_pass(
                frame.command_buffer,
                &render_pass_info,
                vk::SubpassContents::INLINE,
            );
            self.device
                .cmd_set_viewport(frame.command_buffer, 0, &[viewport]);
            self.device
                .cmd_set_scissor(frame.command_buffer, 0, &[scissor]);
        }
    }

    pub fn end_render_pass(&mut self, frame: &ActiveFrame) {
        self.scope.close_pass();
        unsafe {
            self.device.cmd_end_render_pass(frame.command_buffer);
        }
    }

    /// Finish recording, submit with the slot's semaphores, and present.
    ///
    /// Advances to the next frame slot on success. Reports
    /// `SurfaceOutOfDate` when presentation detects a stale surface.
    pub fn end_frame(
        &mut self,
        context: &VulkanContext,
        frame: ActiveFrame,
    ) -> VulkanResult<()> {
        self.scope.close_frame();

        let sync = &self.frame_syncs[frame.slot_index];
        unsafe {
            self.device
                .end_command_buffer(frame.command_buffer)
                .map_err(VulkanError::Api)?;
        }

        let wait_semaphores = [sync.image_available.handle()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = [frame.command_buffer];
        let signal_semaphores = [sync.render_finished.handle()];

        let submit_info = vk::SubmitInfo::builder()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            self.device
                .queue_submit(
                    context.graphics_queue(),
                    &[submit_info.build()],
                    sync.in_flight.handle(),
                )
                .map_err(VulkanError::Api)?;
        }

        let swapchains = [self.swapchain.handle()];
        let image_indices = [frame.image_index];
        let present_info = vk::PresentInfoKHR::builder()
            .wait_semaphores(&signal_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        let present_result = unsafe {
            context
                .device
                .swapchain_loader
                .queue_present(context.present_queue(), &present_info)
        };

        self.slots.advance();

        match present_result {
            Ok(false) => Ok(()),
            // Suboptimal or out of date: the caller rebuilds
            Ok(true) | Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                Err(VulkanError::SurfaceOutOfDate)
            }
            Err(e) => Err(VulkanError::Api(e)),
        }
    }

    /// Recreate the swapchain after a resize or out-of-date surface.
    ///
    /// Blocks while the window is minimized, waits for the device to go
    /// idle, then rebuilds. Frame slots restart from zero.
    pub fn rebuild_swapchain(
        &mut self,
        context: &VulkanContext,
        window: &mut Window,
    ) -> VulkanResult<()> {
        let extent = window.wait_for_valid_extent();
        context.wait_idle()?;

        let new_swapchain = Swapchain::new(context, extent, Some(&self.swapchain))?;
        if !self.swapchain.is_format_compatible(&new_swapchain) {
            return Err(VulkanError::InvalidOperation {
                reason: "swapchain surface format changed across rebuild".to_string(),
            });
        }
        self.swapchain = new_swapchain;
        self.slots.reset();
        self.scope.reset();
        window.reset_resized();

        log::debug!(
            "Swapchain rebuilt at {}x{}",
            extent.width,
            extent.height
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_scope_cycles_cleanly() {
        let mut scope = FrameScope::default();
        for _ in 0..3 {
            scope.open_frame();
            scope.open_pass();
            scope.close_pass();
            scope.close_frame();
        }
        assert!(!scope.frame_open);
        assert!(!scope.in_render_pass);
    }

    #[test]
    #[should_panic(expected = "already open")]
    fn render_pass_cannot_be_opened_twice() {
        let mut scope = FrameScope::default();
        scope.open_frame();
        scope.open_pass();
        scope.open_pass();
    }

    #[test]
    #[should_panic(expected = "outside a frame")]
    fn render_pass_requires_an_open_frame() {
        let mut scope = FrameScope::default();
        scope.open_pass();
    }

    #[test]
    #[should_panic(expected = "still open")]
    fn frame_cannot_end_inside_a_render_pass() {
        let mut scope = FrameScope::default();
        scope.open_frame();
        scope.open_pass();
        scope.close_frame();
    }

    #[test]
    fn rebuild_reset_clears_both_scopes() {
        let mut scope = FrameScope::default();
        scope.open_frame();
        scope.open_pass();
        scope.reset();
        assert!(!scope.frame_open);
        assert!(!scope.in_render_pass);
    }
}
