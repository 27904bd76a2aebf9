//! Yaw/pitch pose for the scene's camera node.

use glam::{Mat4, Quat, Vec3};

const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

/// Camera pose. Yaw is measured from +X toward +Z, pitch from the horizon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
}

impl Default for Camera {
    /// At the origin, looking down -Z.
    fn default() -> Self {
        Self::new(Vec3::ZERO)
    }
}

impl Camera {
    /// Camera at `position` looking down -Z.
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            yaw: -std::f32::consts::FRAC_PI_2,
            pitch: 0.0,
        }
    }

    /// Camera at `position` facing `target`. Falls back to [`Camera::new`]
    /// when the two coincide.
    pub fn looking_at(position: Vec3, target: Vec3) -> Self {
        let dir = (target - position).normalize_or_zero();
        if dir == Vec3::ZERO {
            return Self::new(position);
        }
        Self {
            position,
            yaw: dir.z.atan2(dir.x),
            pitch: dir.y.clamp(-1.0, 1.0).asin().clamp(-PITCH_LIMIT, PITCH_LIMIT),
        }
    }

    /// Unit view direction.
    pub fn forward(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        Vec3::new(cos_yaw * cos_pitch, sin_pitch, sin_yaw * cos_pitch).normalize()
    }

    /// Orientation of the camera node: maps local -Z onto [`Camera::forward`]
    /// and keeps local +Y on the world-up side.
    pub fn rotation(&self) -> Quat {
        let view = Mat4::look_to_rh(self.position, self.forward(), Vec3::Y);
        Quat::from_mat4(&view.inverse()).normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_camera_looks_down_negative_z() {
        let camera = Camera::default();
        assert!((camera.forward() - Vec3::NEG_Z).length() < 1e-5);
        assert!((camera.rotation() * Vec3::NEG_Z - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn rotation_follows_forward() {
        let camera = Camera::looking_at(Vec3::ZERO, Vec3::new(1.0, 0.5, 0.0));
        let rotation = camera.rotation();
        assert!((rotation * Vec3::NEG_Z - camera.forward()).length() < 1e-4);
        assert!((rotation * Vec3::Y).y > 0.0);
    }

    #[test]
    fn looking_at_targets() {
        let camera = Camera::looking_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO);
        assert!((camera.forward() - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn looking_straight_up_is_clamped() {
        let camera = Camera::looking_at(Vec3::ZERO, Vec3::Y);
        assert!(camera.pitch < std::f32::consts::FRAC_PI_2);
        assert!(camera.forward().y > 0.99);
    }

    #[test]
    fn coincident_target_keeps_default_direction() {
        let camera = Camera::looking_at(Vec3::ONE, Vec3::ONE);
        assert_eq!(camera, Camera::new(Vec3::ONE));
    }
}
