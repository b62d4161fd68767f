//! # Render Engine
//!
//! A Vulkan rendering engine core built around explicit resource lifetimes:
//! staged host-to-device transfers, a fixed-capacity descriptor allocator,
//! a double-buffered frame scheduler, and a small set of render systems
//! (opaque geometry, point lights, skybox) driven by a flat entity registry.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use render_engine::core::config::ApplicationConfig;
//! use render_engine::render::vulkan::{Renderer, VulkanContext, VulkanError, Window};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ApplicationConfig::load_or_default("config.toml");
//!     let mut window = Window::new(&config.window.title, config.window.width, config.window.height)?;
//!     let context = VulkanContext::new(&mut window, &config.window.title)?;
//!     let mut renderer = Renderer::new(&context, &window)?;
//!     while !window.should_close() {
//!         window.poll_events();
//!         match renderer.begin_frame(&context) {
//!             Ok(frame) => {
//!                 renderer.begin_render_pass(&frame);
//!                 // record draws...
//!                 renderer.end_render_pass(&frame);
//!                 match renderer.end_frame(&context, frame) {
//!                     Ok(()) => {}
//!                     Err(VulkanError::SurfaceOutOfDate) => {
//!                         renderer.rebuild_swapchain(&context, &mut window)?;
//!                     }
//!                     Err(e) => return Err(e.into()),
//!                 }
//!             }
//!             Err(VulkanError::SurfaceOutOfDate) => {
//!                 renderer.rebuild_swapchain(&context, &mut window)?;
//!             }
//!             Err(e) => return Err(e.into()),
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod assets;
pub mod core;
pub mod foundation;
pub mod render;
pub mod scene;
