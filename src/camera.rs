use nalgebra::{Matrix4, Vector3};

use crate::math;

/// Pitch is clamped short of straight up/down to keep the view matrix stable.
pub const PITCH_LIMIT: f32 = 1.5;

/// Movable perspective camera.
///
/// The rotation matrix is derived state: it is rebuilt from yaw and pitch
/// whenever either changes, as `rotation_x(pitch) · rotation_y(yaw)`.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub position: Vector3<f32>,
    pub rotation_matrix: Matrix4<f32>,
    /// Vertical field of view in degrees.
    pub fov: f32,
    yaw: f32,
    pitch: f32,
}

impl Camera {
    pub fn new() -> Camera {
        Camera {
            position: Vector3::new(0.0, 0.0, -5.0),
            rotation_matrix: Matrix4::identity(),
            fov: 90.0,
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn set_rotation(&mut self, yaw: f32, pitch: f32) {
        self.yaw = yaw;
        self.pitch = pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.rotation_matrix = math::rotation_x(self.pitch) * math::rotation_y(self.yaw);
    }

    pub fn rotate_by(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.set_rotation(self.yaw + delta_yaw, self.pitch + delta_pitch);
    }

    /// Translate along the camera's local axes (x right, y up, z forward).
    pub fn translate_local(&mut self, delta: &Vector3<f32>) {
        self.position += math::transform_direction(delta, &self.rotation_matrix);
    }
}

impl Default for Camera {
    fn default() -> Self {
        Camera::new()
    }
}
