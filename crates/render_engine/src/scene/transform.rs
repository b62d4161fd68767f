//! 3D transforms
//!
//! Translation, Tait-Bryan rotation (applied Y, X, Z) and non-uniform
//! scale, composed as translate * Ry * Rx * Rz * scale.

use nalgebra::{Matrix3, Matrix4, Vector3};

#[derive(Debug, Clone)]
pub struct Transform3D {
    pub translation: Vector3<f32>,
    /// Euler angles in radians, applied in Y, X, Z order
    pub rotation: Vector3<f32>,
    pub scale: Vector3<f32>,
}

impl Default for Transform3D {
    fn default() -> Self {
        Self {
            translation: Vector3::zeros(),
            rotation: Vector3::zeros(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform3D {
    /// Model matrix: translate * Ry * Rx * Rz * scale, expanded directly
    pub fn matrix(&self) -> Matrix4<f32> {
        let (s1, c1) = self.rotation.y.sin_cos();
        let (s2, c2) = self.rotation.x.sin_cos();
        let (s3, c3) = self.rotation.z.sin_cos();
        let scale = self.scale;

        let mut m = Matrix4::identity();
        m[(0, 0)] = scale.x * (c1 * c3 + s1 * s2 * s3);
        m[(1, 0)] = scale.x * (c2 * s3);
        m[(2, 0)] = scale.x * (c1 * s2 * s3 - c3 * s1);

        m[(0, 1)] = scale.y * (c3 * s1 * s2 - c1 * s3);
        m[(1, 1)] = scale.y * (c2 * c3);
        m[(2, 1)] = scale.y * (c1 * c3 * s2 + s1 * s3);

        m[(0, 2)] = scale.z * (c2 * s1);
        m[(1, 2)] = scale.z * (-s2);
        m[(2, 2)] = scale.z * (c1 * c2);

        m[(0, 3)] = self.translation.x;
        m[(1, 3)] = self.translation.y;
        m[(2, 3)] = self.translation.z;
        m
    }

    /// Inverse-transpose of the model rotation/scale block, for
    /// transforming normals under non-uniform scale
    pub fn normal_matrix(&self) -> Matrix3<f32> {
        let (s1, c1) = self.rotation.y.sin_cos();
        let (s2, c2) = self.rotation.x.sin_cos();
        let (s3, c3) = self.rotation.z.sin_cos();
        let inv_scale = Vector3::new(
            1.0 / self.scale.x,
            1.0 / self.scale.y,
            1.0 / self.scale.z,
        );

        let mut m = Matrix3::identity();
        m[(0, 0)] = inv_scale.x * (c1 * c3 + s1 * s2 * s3);
        m[(1, 0)] = inv_scale.x * (c2 * s3);
        m[(2, 0)] = inv_scale.x * (c1 * s2 * s3 - c3 * s1);

        m[(0, 1)] = inv_scale.y * (c3 * s1 * s2 - c1 * s3);
        m[(1, 1)] = inv_scale.y * (c2 * c3);
        m[(2, 1)] = inv_scale.y * (c1 * c3 * s2 + s1 * s3);

        m[(0, 2)] = inv_scale.z * (c2 * s1);
        m[(1, 2)] = inv_scale.z * (-s2);
        m[(2, 2)] = inv_scale.z * (c1 * c2);
        m
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector4;

    #[test]
    fn identity_transform_gives_identity_matrix() {
        let m = Transform3D::default().matrix();
        assert_relative_eq!(m, Matrix4::identity(), epsilon = 1e-6);
    }

    #[test]
    fn translation_moves_points() {
        let transform = Transform3D {
            translation: Vector3::new(1.0, 2.0, 3.0),
            ..Transform3D::default()
        };
        let p = transform.matrix() * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(p.x, 1.0);
        assert_relative_eq!(p.y, 2.0);
        assert_relative_eq!(p.z, 3.0);
    }

    #[test]
    fn scale_applies_before_translation() {
        let transform = Transform3D {
            translation: Vector3::new(10.0, 0.0, 0.0),
            scale: Vector3::new(2.0, 2.0, 2.0),
            ..Transform3D::default()
        };
        let p = transform.matrix() * Vector4::new(1.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(p.x, 12.0, epsilon = 1e-5);
    }

    #[test]
    fn rotation_matches_explicit_composition() {
        let transform = Transform3D {
            rotation: Vector3::new(0.3, 0.7, -0.2),
            ..Transform3D::default()
        };
        let expected = Matrix4::from_euler_angles(0.0, transform.rotation.y, 0.0)
            * Matrix4::from_euler_angles(transform.rotation.x, 0.0, 0.0)
            * Matrix4::from_euler_angles(0.0, 0.0, transform.rotation.z);
        assert_relative_eq!(transform.matrix(), expected, epsilon = 1e-5);
    }

    #[test]
    fn normal_matrix_inverts_nonuniform_scale() {
        let transform = Transform3D {
            scale: Vector3::new(2.0, 1.0, 1.0),
            ..Transform3D::default()
        };
        // A normal along x shrinks by the inverse scale
        let n = transform.normal_matrix() * Vector3::new(1.0, 0.0, 0.0);
        assert_relative_eq!(n.x, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn normal_matrix_equals_rotation_for_uniform_unit_scale() {
        let transform = Transform3D {
            rotation: Vector3::new(0.4, -0.9, 0.1),
            ..Transform3D::default()
        };
        let model = transform.matrix();
        let normal = transform.normal_matrix();
        for row in 0..3 {
            for col in 0..3 {
                assert_relative_eq!(normal[(row, col)], model[(row, col)], epsilon = 1e-5);
            }
        }
    }
}
