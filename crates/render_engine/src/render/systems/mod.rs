//! Render systems
//!
//! Each system owns its pipeline and records draw commands for one slice
//! of the scene. The closed `RenderSystem` enum is the dispatch surface
//! the application drives each frame.

pub mod geometry;
pub mod point_light;
pub mod skybox;

pub use geometry::GeometrySystem;
pub use point_light::PointLightSystem;
pub use skybox::SkyboxSystem;

use crate::render::frame::FrameContext;

/// The engine's built-in render systems
pub enum RenderSystem {
    Geometry(GeometrySystem),
    PointLight(PointLightSystem),
    Skybox(SkyboxSystem),
}

impl RenderSystem {
    /// Record this system's draw commands for the current frame
    pub fn render(&self, frame: &FrameContext) {
        match self {
            RenderSystem::Geometry(system) => system.render(frame),
            RenderSystem::PointLight(system) => system.render(frame),
            RenderSystem::Skybox(system) => system.render(frame),
        }
    }
}
