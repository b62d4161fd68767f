//! Camera view and projection matrices
//!
//! Vulkan clip-space conventions: depth 0..1, Y pointing down. The render
//! systems read the camera through `FrameContext` and never mutate it.

use nalgebra::{Matrix4, Vector3};

#[derive(Debug, Clone)]
pub struct Camera {
    projection: Matrix4<f32>,
    view: Matrix4<f32>,
    inverse_view: Matrix4<f32>,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            projection: Matrix4::identity(),
            view: Matrix4::identity(),
            inverse_view: Matrix4::identity(),
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Perspective projection with depth mapped to 0..1
    pub fn set_perspective_projection(&mut self, fov_y: f32, aspect: f32, near: f32, far: f32) {
        debug_assert!(aspect.abs() > f32::EPSILON);
        let tan_half_fov = (fov_y / 2.0).tan();

        let mut m = Matrix4::zeros();
        m[(0, 0)] = 1.0 / (aspect * tan_half_fov);
        m[(1, 1)] = 1.0 / tan_half_fov;
        m[(2, 2)] = far / (far - near);
        m[(3, 2)] = 1.0;
        m[(2, 3)] = -(far * near) / (far - near);
        self.projection = m;
    }

    /// Look along `direction` from `position`
    pub fn set_view_direction(
        &mut self,
        position: Vector3<f32>,
        direction: Vector3<f32>,
        up: Vector3<f32>,
    ) {
        let w = direction.normalize();
        let u = w.cross(&up).normalize();
        let v = w.cross(&u);
        self.set_view_basis(position, u, v, w);
    }

    /// Look from `position` toward `target`
    pub fn set_view_target(
        &mut self,
        position: Vector3<f32>,
        target: Vector3<f32>,
        up: Vector3<f32>,
    ) {
        self.set_view_direction(position, target - position, up);
    }

    /// Build the view from Tait-Bryan angles applied in Y, X, Z order
    pub fn set_view_yxz(&mut self, position: Vector3<f32>, rotation: Vector3<f32>) {
        let (s1, c1) = rotation.y.sin_cos();
        let (s2, c2) = rotation.x.sin_cos();
        let (s3, c3) = rotation.z.sin_cos();

        let u = Vector3::new(
            c1 * c3 + s1 * s2 * s3,
            c2 * s3,
            c1 * s2 * s3 - c3 * s1,
        );
        let v = Vector3::new(
            c3 * s1 * s2 - c1 * s3,
            c2 * c3,
            c1 * c3 * s2 + s1 * s3,
        );
        let w = Vector3::new(c2 * s1, -s2, c1 * c2);
        self.set_view_basis(position, u, v, w);
    }

    fn set_view_basis(
        &mut self,
        position: Vector3<f32>,
        u: Vector3<f32>,
        v: Vector3<f32>,
        w: Vector3<f32>,
    ) {
        let mut view = Matrix4::identity();
        view[(0, 0)] = u.x;
        view[(0, 1)] = u.y;
        view[(0, 2)] = u.z;
        view[(1, 0)] = v.x;
        view[(1, 1)] = v.y;
        view[(1, 2)] = v.z;
        view[(2, 0)] = w.x;
        view[(2, 1)] = w.y;
        view[(2, 2)] = w.z;
        view[(0, 3)] = -u.dot(&position);
        view[(1, 3)] = -v.dot(&position);
        view[(2, 3)] = -w.dot(&position);
        self.view = view;

        let mut inverse = Matrix4::identity();
        inverse[(0, 0)] = u.x;
        inverse[(1, 0)] = u.y;
        inverse[(2, 0)] = u.z;
        inverse[(0, 1)] = v.x;
        inverse[(1, 1)] = v.y;
        inverse[(2, 1)] = v.z;
        inverse[(0, 2)] = w.x;
        inverse[(1, 2)] = w.y;
        inverse[(2, 2)] = w.z;
        inverse[(0, 3)] = position.x;
        inverse[(1, 3)] = position.y;
        inverse[(2, 3)] = position.z;
        self.inverse_view = inverse;
    }

    pub fn projection(&self) -> &Matrix4<f32> {
        &self.projection
    }

    pub fn view(&self) -> &Matrix4<f32> {
        &self.view
    }

    pub fn inverse_view(&self) -> &Matrix4<f32> {
        &self.inverse_view
    }

    /// World-space camera position, taken from the inverse view
    pub fn position(&self) -> Vector3<f32> {
        Vector3::new(
            self.inverse_view[(0, 3)],
            self.inverse_view[(1, 3)],
            self.inverse_view[(2, 3)],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector4;

    #[test]
    fn position_round_trips_through_inverse_view() {
        let mut camera = Camera::new();
        let position = Vector3::new(1.0, -2.5, 4.0);
        camera.set_view_yxz(position, Vector3::new(0.2, 0.5, 0.0));
        let recovered = camera.position();
        assert_relative_eq!(recovered.x, position.x, epsilon = 1e-5);
        assert_relative_eq!(recovered.y, position.y, epsilon = 1e-5);
        assert_relative_eq!(recovered.z, position.z, epsilon = 1e-5);
    }

    #[test]
    fn view_maps_camera_position_to_origin() {
        let mut camera = Camera::new();
        let position = Vector3::new(3.0, 1.0, -2.0);
        camera.set_view_target(position, Vector3::zeros(), Vector3::new(0.0, -1.0, 0.0));
        let mapped = camera.view() * Vector4::new(position.x, position.y, position.z, 1.0);
        assert_relative_eq!(mapped.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(mapped.y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(mapped.z, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn view_target_looks_down_positive_z() {
        let mut camera = Camera::new();
        camera.set_view_target(
            Vector3::new(0.0, 0.0, -5.0),
            Vector3::zeros(),
            Vector3::new(0.0, -1.0, 0.0),
        );
        // The target lies ahead of the camera along view-space +z
        let mapped = camera.view() * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert!(mapped.z > 0.0);
    }

    #[test]
    fn perspective_maps_near_and_far_planes() {
        let mut camera = Camera::new();
        let (near, far) = (0.1, 100.0);
        camera.set_perspective_projection(1.0, 1.0, near, far);

        let project = |z: f32| {
            let clip = camera.projection() * Vector4::new(0.0, 0.0, z, 1.0);
            clip.z / clip.w
        };
        assert_relative_eq!(project(near), 0.0, epsilon = 1e-5);
        assert_relative_eq!(project(far), 1.0, epsilon = 1e-4);
    }
}
