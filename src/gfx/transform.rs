// src/gfx/transform.rs
//! Position/orientation/scale transform core
//!
//! [`Pose`] represents a positioned, oriented, scaled entity and produces the
//! model matrix for every draw submission. Rotations compose axis-angle
//! matrices around the entity's own axes; `direction` and `up` are kept unit
//! length by re-normalizing after every applied rotation so repeated calls do
//! not drift.

use cgmath::{InnerSpace, Matrix, Matrix3, Matrix4, Point3, Rad, SquareMatrix, Vector3};

/// A positioned, oriented and scaled entity
///
/// `direction` is the local forward axis and `up` the local vertical axis;
/// both are unit vectors and expected to stay orthogonal. Degenerate input
/// (direction parallel to up, zero-length vectors) is a caller bug, not a
/// recoverable condition.
#[derive(Debug, Clone, Copy)]
pub struct Pose {
    pub position: Vector3<f32>,
    pub direction: Vector3<f32>,
    pub up: Vector3<f32>,
    pub scale: Vector3<f32>,
}

impl Pose {
    pub fn new(
        position: Vector3<f32>,
        direction: Vector3<f32>,
        up: Vector3<f32>,
        scale: Vector3<f32>,
    ) -> Self {
        debug_assert!(direction.magnitude2() > 0.0 && up.magnitude2() > 0.0);
        Self {
            position,
            direction: direction.normalize(),
            up: up.normalize(),
            scale,
        }
    }

    /// Local right axis, `direction x up`
    pub fn right(&self) -> Vector3<f32> {
        self.direction.cross(self.up)
    }

    /// Rotates orientation around the local axes
    ///
    /// Angle components are applied around (right, up, direction) respectively,
    /// composed as `R(right, x) * R(up, y) * R(direction, z)`. The axis order
    /// is part of the contract: rotations are not commutative.
    pub fn rotate(&mut self, angles: Vector3<f32>) {
        let right = self.right();
        debug_assert!(right.magnitude2() > 1e-12, "direction parallel to up");

        let rotation = composite_rotation(angles, right.normalize(), self.up, self.direction);
        self.up = (rotation * self.up).normalize();
        self.direction = (rotation * self.direction).normalize();
    }

    /// Rotates orientation and position around a pivot point
    ///
    /// The rotation axes are derived from the pivot-to-entity vector rather
    /// than the facing direction, so the entity orbits the pivot.
    pub fn rotate_around_point(&mut self, angles: Vector3<f32>, pivot: Vector3<f32>) {
        let offset = self.position - pivot;
        debug_assert!(offset.magnitude2() > 1e-12, "position coincides with pivot");
        let pivot_dir = offset.normalize();
        let right = pivot_dir.cross(self.up);
        debug_assert!(right.magnitude2() > 1e-12);

        let rotation = composite_rotation(angles, right.normalize(), self.up, pivot_dir);
        self.up = (rotation * self.up).normalize();
        self.direction = (rotation * self.direction).normalize();
        self.position = pivot + rotation * offset;
    }

    /// Reorients by the minimal rotation that points `direction` at `target`
    ///
    /// `up` is rotated along and then re-orthogonalized against the new
    /// direction, so repeated reorientation cannot accumulate skew.
    pub fn look_at(&mut self, target: Vector3<f32>) {
        let to_target = target - self.position;
        debug_assert!(to_target.magnitude2() > 1e-12, "target coincides with position");
        let desired = to_target.normalize();

        let dot = self.direction.dot(desired);
        // Guard against floating-point saturation above 1.
        if dot >= 1.0 {
            self.direction = desired;
            return;
        }

        let angle = dot.max(-1.0).acos();
        let axis = self.direction.cross(desired);
        debug_assert!(axis.magnitude2() > 1e-12, "target directly behind");

        let rotation = Matrix3::from_axis_angle(axis.normalize(), Rad(angle));
        self.direction = (rotation * self.direction).normalize();
        self.up = (rotation * self.up).normalize();
        // Gram-Schmidt: keep up exactly orthogonal to the new direction.
        self.up = (self.up - self.direction * self.up.dot(self.direction)).normalize();
    }

    /// Translates in the local frame: x along right, y along up, z forward
    pub fn move_local(&mut self, amount: Vector3<f32>) {
        self.position += amount.x * self.right() + amount.y * self.up + amount.z * self.direction;
    }

    /// Model matrix: `translate(position) * basis(right, up, direction) * scale`
    ///
    /// The basis matrix maps local axes to world axes with (right, up,
    /// direction) as its columns, right-handed.
    pub fn matrix(&self) -> Matrix4<f32> {
        let right = self.right();
        let basis = Matrix4::from_cols(
            right.extend(0.0),
            self.up.extend(0.0),
            self.direction.extend(0.0),
            Vector3::new(0.0, 0.0, 0.0).extend(1.0),
        );

        Matrix4::from_translation(self.position)
            * basis
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

/// Composite rotation `R(x_axis, angles.x) * R(y_axis, angles.y) * R(z_axis, angles.z)`
fn composite_rotation(
    angles: Vector3<f32>,
    x_axis: Vector3<f32>,
    y_axis: Vector3<f32>,
    z_axis: Vector3<f32>,
) -> Matrix3<f32> {
    Matrix3::from_axis_angle(x_axis, Rad(angles.x))
        * Matrix3::from_axis_angle(y_axis, Rad(angles.y))
        * Matrix3::from_axis_angle(z_axis, Rad(angles.z))
}

/// Normal matrix: transpose-inverse of the model matrix's upper 3x3 block
///
/// Falls back to the untransposed block if the matrix is singular (degenerate
/// scale), which only happens on caller error.
pub fn normal_matrix(model: Matrix4<f32>) -> Matrix3<f32> {
    let linear = Matrix3::from_cols(
        model.x.truncate(),
        model.y.truncate(),
        model.z.truncate(),
    );
    match linear.invert() {
        Some(inverse) => inverse.transpose(),
        None => linear,
    }
}

/// Applies a model matrix to a point
pub fn transform_point(matrix: Matrix4<f32>, point: Point3<f32>) -> Point3<f32> {
    let transformed = matrix * point.to_homogeneous();
    Point3::from_homogeneous(transformed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cgmath::Zero;

    fn test_pose() -> Pose {
        Pose::new(
            Vector3::new(1.0, 2.0, 3.0),
            Vector3::new(0.0, 0.0, 1.0),
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(1.0, 1.0, 1.0),
        )
    }

    #[test]
    fn rotate_round_trips_per_axis() {
        for axis in 0..3 {
            let mut pose = test_pose();
            let mut angles = Vector3::zero();
            angles[axis] = 0.7;

            pose.rotate(angles);
            pose.rotate(-angles);

            assert_relative_eq!(pose.direction, test_pose().direction, epsilon = 1e-5);
            assert_relative_eq!(pose.up, test_pose().up, epsilon = 1e-5);
        }
    }

    #[test]
    fn rotate_preserves_unit_length() {
        let mut pose = test_pose();
        for _ in 0..200 {
            pose.rotate(Vector3::new(0.13, 0.07, 0.05));
        }
        assert_relative_eq!(pose.direction.magnitude(), 1.0, epsilon = 1e-4);
        assert_relative_eq!(pose.up.magnitude(), 1.0, epsilon = 1e-4);
    }

    #[test]
    fn rotate_quarter_turn_yaw() {
        let mut pose = test_pose();
        pose.rotate(Vector3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0));
        // Forward +Z yawed a quarter turn around +Y lands on +X.
        assert_relative_eq!(pose.direction, Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(pose.up, Vector3::new(0.0, 1.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn rotate_around_point_orbits_pivot() {
        let mut pose = test_pose();
        pose.position = Vector3::new(2.0, 0.0, 0.0);
        let pivot = Vector3::zero();

        pose.rotate_around_point(Vector3::new(0.0, std::f32::consts::PI, 0.0), pivot);

        assert_relative_eq!(pose.position, Vector3::new(-2.0, 0.0, 0.0), epsilon = 1e-5);
        // Distance to pivot is invariant under the orbit.
        assert_relative_eq!(pose.position.magnitude(), 2.0, epsilon = 1e-5);
    }

    #[test]
    fn look_at_converges_and_is_idempotent() {
        let mut pose = test_pose();
        let target = Vector3::new(7.0, -2.0, 5.0);
        let desired = (target - pose.position).normalize();

        let angle_before = pose.direction.dot(desired).clamp(-1.0, 1.0).acos();
        pose.look_at(target);
        let angle_after = pose.direction.dot(desired).clamp(-1.0, 1.0).acos();
        assert!(angle_after <= angle_before);
        assert_relative_eq!(angle_after, 0.0, epsilon = 1e-4);

        // Second call with the same target leaves a near-zero residual.
        pose.look_at(target);
        let residual = pose.direction.dot(desired).clamp(-1.0, 1.0).acos();
        assert!(residual < 1e-4);
    }

    #[test]
    fn look_at_keeps_up_orthogonal() {
        let mut pose = test_pose();
        pose.look_at(Vector3::new(4.0, 9.0, -3.0));
        assert_relative_eq!(pose.direction.dot(pose.up), 0.0, epsilon = 1e-5);
        assert_relative_eq!(pose.up.magnitude(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn move_local_is_linear() {
        let a = Vector3::new(0.5, -1.0, 2.0);
        let b = Vector3::new(-0.25, 0.75, 1.0);

        let mut split = test_pose();
        split.move_local(a);
        split.move_local(b);

        let mut combined = test_pose();
        combined.move_local(a + b);

        assert_relative_eq!(split.position, combined.position, epsilon = 1e-5);
    }

    #[test]
    fn move_local_uses_local_axes() {
        let mut pose = test_pose();
        pose.rotate(Vector3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0));
        let before = pose.position;
        pose.move_local(Vector3::new(0.0, 0.0, 1.0));
        // Forward now points along world +X.
        assert_relative_eq!(pose.position - before, Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn matrix_maps_origin_and_forward() {
        let pose = test_pose();
        let m = pose.matrix();

        let origin = transform_point(m, Point3::new(0.0, 0.0, 0.0));
        assert_relative_eq!(
            Vector3::new(origin.x, origin.y, origin.z),
            pose.position,
            epsilon = 1e-5
        );

        let forward = transform_point(m, Point3::new(0.0, 0.0, 1.0));
        assert_relative_eq!(
            Vector3::new(forward.x, forward.y, forward.z),
            pose.position + pose.direction,
            epsilon = 1e-5
        );
    }

    #[test]
    fn normal_matrix_matches_rotation_for_rigid_transform() {
        let pose = test_pose();
        let n = normal_matrix(pose.matrix());
        // With unit scale the normal matrix is the rotation itself.
        let rotated = n * Vector3::new(0.0, 0.0, 1.0);
        assert_relative_eq!(rotated, pose.direction, epsilon = 1e-5);
    }

    #[test]
    fn normal_matrix_corrects_nonuniform_scale() {
        let model = Matrix4::from_nonuniform_scale(2.0, 1.0, 1.0);
        let n = normal_matrix(model);
        let normal = (n * Vector3::new(1.0, 1.0, 0.0)).normalize();
        // A plane squashed along x tilts its normal toward x less, not more.
        assert!(normal.x < normal.y);
    }
}
