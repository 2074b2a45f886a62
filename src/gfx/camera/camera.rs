// src/gfx/camera/camera.rs
use cgmath::{EuclideanSpace, InnerSpace, Matrix4, Point3, Vector2, Vector3};

use crate::gfx::transform::Pose;

/// First-person camera
///
/// Holds an embedded [`Pose`] rather than extending it; movement and look
/// control delegate to the pose so the camera shares the transform core's
/// axis conventions. The projection matrix lives in the renderer, not here.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub pose: Pose,
}

impl Camera {
    /// Creates a camera at `position` looking at `target`, world up +Y
    pub fn new(position: Vector3<f32>, target: Vector3<f32>) -> Self {
        let direction = (target - position).normalize();
        // Start from world up, then square it against the view direction.
        let mut up = Vector3::new(0.0, 1.0, 0.0);
        up = (up - direction * up.dot(direction)).normalize();

        Self {
            pose: Pose::new(position, direction, up, Vector3::new(1.0, 1.0, 1.0)),
        }
    }

    pub fn position(&self) -> Vector3<f32> {
        self.pose.position
    }

    pub fn direction(&self) -> Vector3<f32> {
        self.pose.direction
    }

    /// Rotates the view direction from mouse motion
    ///
    /// `delta.x` is a yaw around the camera's up axis, `delta.y` a pitch
    /// around its right axis, so dragging orbits the view around the eye.
    pub fn move_target(&mut self, delta: Vector2<f32>) {
        self.pose.rotate(Vector3::new(delta.y, delta.x, 0.0));
    }

    /// Translates along the camera's local axes (strafe/climb/walk)
    pub fn move_local(&mut self, amount: Vector3<f32>) {
        self.pose.move_local(amount);
    }

    /// Right-handed view matrix looking from the eye along the view direction
    pub fn view_matrix(&self) -> Matrix4<f32> {
        let eye = Point3::from_vec(self.pose.position);
        let center = Point3::from_vec(self.pose.position + self.pose.direction);
        Matrix4::look_at_rh(eye, center, self.pose.up)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn new_camera_looks_at_target() {
        let camera = Camera::new(Vector3::new(0.0, 4.0, -10.0), Vector3::new(0.0, 0.0, 0.0));
        let expected = (Vector3::new(0.0, 0.0, 0.0) - Vector3::new(0.0, 4.0, -10.0)).normalize();
        assert_relative_eq!(camera.direction(), expected, epsilon = 1e-5);
        assert_relative_eq!(camera.pose.up.dot(camera.direction()), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn move_target_yaws_around_up() {
        let mut camera = Camera::new(Vector3::new(0.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 0.0));
        camera.move_target(Vector2::new(std::f32::consts::FRAC_PI_2, 0.0));
        // A quarter-turn yaw leaves the direction horizontal and perpendicular
        // to the original one.
        assert_relative_eq!(camera.direction().y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(
            camera.direction().dot(Vector3::new(0.0, 0.0, 1.0)),
            0.0,
            epsilon = 1e-5
        );
    }

    #[test]
    fn move_local_walks_along_view_direction() {
        let mut camera = Camera::new(Vector3::new(0.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 0.0));
        camera.move_local(Vector3::new(0.0, 0.0, 2.0));
        assert_relative_eq!(camera.position(), Vector3::new(0.0, 0.0, -3.0), epsilon = 1e-5);
    }

    #[test]
    fn view_matrix_moves_eye_to_origin() {
        let camera = Camera::new(Vector3::new(3.0, 2.0, -7.0), Vector3::new(0.0, 0.0, 0.0));
        let view = camera.view_matrix();
        let eye = view * Vector3::new(3.0, 2.0, -7.0).extend(1.0);
        assert_relative_eq!(eye.x, 0.0, epsilon = 1e-4);
        assert_relative_eq!(eye.y, 0.0, epsilon = 1e-4);
        assert_relative_eq!(eye.z, 0.0, epsilon = 1e-4);
    }
}
