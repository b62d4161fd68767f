//! Per-frame lighting data
//!
//! The global uniform block shared by every render system, laid out to
//! match the std140 declaration in the shaders.

use bytemuck::{Pod, Zeroable};

/// Fixed capacity of the per-frame light array
pub const MAX_LIGHTS: usize = 10;

/// One point light as seen by the shaders
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct PointLightData {
    /// xyz = world position, w unused
    pub position: [f32; 4],
    /// rgb = color, w = intensity
    pub color: [f32; 4],
}

impl Default for PointLightData {
    fn default() -> Self {
        Self {
            position: [0.0; 4],
            color: [1.0, 1.0, 1.0, 1.0],
        }
    }
}

/// Per-frame global uniforms, written once per frame into the current
/// slot's persistently mapped buffer
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct GlobalUbo {
    pub projection: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub inverse_view: [[f32; 4]; 4],
    /// rgb = ambient color, w = ambient intensity
    pub ambient_color: [f32; 4],
    pub point_lights: [PointLightData; MAX_LIGHTS],
    pub num_lights: u32,
    pub _padding: [u32; 3],
}

impl Default for GlobalUbo {
    fn default() -> Self {
        let identity = [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ];
        Self {
            projection: identity,
            view: identity,
            inverse_view: identity,
            ambient_color: [1.0, 1.0, 1.0, 0.02],
            point_lights: [PointLightData::zeroed(); MAX_LIGHTS],
            num_lights: 0,
            _padding: [0; 3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ubo_size_is_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<GlobalUbo>() % 16, 0);
    }

    #[test]
    fn light_entry_is_two_vec4s() {
        assert_eq!(std::mem::size_of::<PointLightData>(), 32);
    }
}
