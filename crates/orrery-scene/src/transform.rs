//! Position / Euler rotation / scale transform.

use glam::{EulerRot, Mat4, Quat, Vec3};

/// Local transform of a scene object.
///
/// Rotation is stored as Euler angles in radians and composed in XYZ order,
/// so animating a single axis is a plain field write.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn quat(&self) -> Quat {
        Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        )
    }

    /// Local-to-parent matrix: translate * rotate * scale.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.quat(), self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_by_default() {
        assert!(Transform::default().matrix().abs_diff_eq(Mat4::IDENTITY, 1e-6));
    }

    #[test]
    fn test_translation_applied_after_rotation() {
        let t = Transform {
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Vec3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0),
            scale: Vec3::ONE,
        };
        // +X rotated a quarter turn around Y lands on -Z.
        let p = t.matrix().transform_point3(Vec3::X);
        assert!(p.abs_diff_eq(Vec3::new(1.0, 2.0, 2.0), 1e-5), "got {p}");
    }

    #[test]
    fn test_xyz_order() {
        let t = Transform {
            rotation: Vec3::new(0.3, 0.5, 0.0),
            ..Default::default()
        };
        let expected = Mat4::from_rotation_x(0.3) * Mat4::from_rotation_y(0.5);
        assert!(t.matrix().abs_diff_eq(expected, 1e-5));
    }
}
