//! Rendering layer
//!
//! Mid-level types shared by the render systems (meshes, models, materials,
//! camera, lighting data) on top of the low-level `vulkan` backend.

pub mod camera;
pub mod frame;
pub mod lighting;
pub mod material;
pub mod mesh;
pub mod model;
pub mod systems;
pub mod vulkan;

pub use camera::Camera;
pub use frame::FrameContext;
pub use lighting::{GlobalUbo, PointLightData, MAX_LIGHTS};
pub use material::Material;
pub use mesh::{MeshData, Vertex};
pub use model::Model;
pub use systems::{GeometrySystem, PointLightSystem, RenderSystem, SkyboxSystem};
