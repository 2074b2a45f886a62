// src/gfx/rendering/frame.rs
//! Per-frame draw queue
//!
//! Hosts fill a [`FrameQueue`] each frame with model submissions and lamp
//! positions, then hand it to the renderer which drains it. Submissions
//! borrow their models, so nothing queued here can outlive the scene data
//! it points at.

use cgmath::{Matrix4, Point3, Vector3};

use crate::gfx::lighting::MAX_LIGHTS;
use crate::gfx::scene::ModelData;

/// One queued model draw: a borrowed model and its world transform
pub struct Submission<'scene> {
    pub model: &'scene ModelData,
    pub transform: Matrix4<f32>,
}

/// All draw submissions and point lights for a single frame
#[derive(Default)]
pub struct FrameQueue<'scene> {
    submissions: Vec<Submission<'scene>>,
    lamps: Vec<Point3<f32>>,
}

impl<'scene> FrameQueue<'scene> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes all queued submissions and lights
    pub fn clear(&mut self) {
        self.submissions.clear();
        self.lamps.clear();
    }

    /// Queues a model under an arbitrary world transform
    pub fn draw_model(&mut self, model: &'scene ModelData, transform: Matrix4<f32>) {
        self.submissions.push(Submission { model, transform });
    }

    /// Queues a model with translate/rotate/scale components
    ///
    /// Rotation angles are applied around the world x, y and z axes in that
    /// order, matching the axis-angle composition of the transform core.
    pub fn draw_model_at(
        &mut self,
        model: &'scene ModelData,
        position: Vector3<f32>,
        scale: Vector3<f32>,
        rotation: Vector3<f32>,
    ) {
        let transform = Matrix4::from_translation(position)
            * Matrix4::from_angle_x(cgmath::Rad(rotation.x))
            * Matrix4::from_angle_y(cgmath::Rad(rotation.y))
            * Matrix4::from_angle_z(cgmath::Rad(rotation.z))
            * Matrix4::from_nonuniform_scale(scale.x, scale.y, scale.z);
        self.draw_model(model, transform);
    }

    /// Registers a point light; lights past the shader limit are dropped
    pub fn add_light(&mut self, position: Point3<f32>) {
        if self.lamps.len() >= MAX_LIGHTS {
            log::warn!(
                "light limit of {} reached, dropping light at {:?}",
                MAX_LIGHTS,
                position
            );
            return;
        }
        self.lamps.push(position);
    }

    pub fn submissions(&self) -> &[Submission<'scene>] {
        &self.submissions
    }

    pub fn lamps(&self) -> &[Point3<f32>] {
        &self.lamps
    }

    pub fn is_empty(&self) -> bool {
        self.submissions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::model::Aabb;
    use cgmath::SquareMatrix;

    fn unit_model() -> ModelData {
        ModelData::without_buffers(Aabb::from_points(
            [[-1.0, -1.0, -1.0], [1.0, 1.0, 1.0]].iter(),
        ))
    }

    #[test]
    fn clear_empties_queue() {
        let model = unit_model();
        let mut frame = FrameQueue::new();
        frame.draw_model(&model, Matrix4::identity());
        frame.add_light(Point3::new(1.0, 2.0, 3.0));
        assert_eq!(frame.submissions().len(), 1);
        assert_eq!(frame.lamps().len(), 1);
        frame.clear();
        assert!(frame.is_empty());
        assert!(frame.lamps().is_empty());
    }

    #[test]
    fn n_draws_queue_n_submissions() {
        let model = unit_model();
        let mut frame = FrameQueue::new();
        assert!(frame.is_empty());
        for i in 0..5 {
            frame.draw_model(
                &model,
                Matrix4::from_translation(Vector3::new(i as f32, 0.0, 0.0)),
            );
        }
        assert_eq!(frame.submissions().len(), 5);
        assert_eq!(frame.submissions()[3].transform.w.x, 3.0);

        // The next frame starts from an emptied queue.
        frame.clear();
        assert!(frame.submissions().is_empty());
        frame.draw_model(&model, Matrix4::identity());
        assert_eq!(frame.submissions().len(), 1);
    }

    #[test]
    fn lights_truncate_at_limit() {
        let mut frame = FrameQueue::new();
        for i in 0..MAX_LIGHTS + 3 {
            frame.add_light(Point3::new(i as f32, 0.0, 0.0));
        }
        assert_eq!(frame.lamps().len(), MAX_LIGHTS);
        assert_eq!(frame.lamps()[MAX_LIGHTS - 1].x, (MAX_LIGHTS - 1) as f32);
    }

    #[test]
    fn draw_model_at_composes_transform() {
        let model = unit_model();
        let mut frame = FrameQueue::new();
        frame.draw_model_at(
            &model,
            Vector3::new(4.0, 0.0, -2.0),
            Vector3::new(1.0, 2.0, 1.0),
            Vector3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0),
        );
        let transform = frame.submissions()[0].transform;
        assert_eq!(transform.w.x, 4.0);
        assert_eq!(transform.w.z, -2.0);
        // A quarter-turn yaw maps local +X onto world -Z.
        let x_axis = transform * cgmath::Vector4::new(1.0, 0.0, 0.0, 0.0);
        assert!(x_axis.z.abs() > 0.999 && x_axis.x.abs() < 1e-5);
        // Scale survives on the rotated basis.
        let y_axis = transform * cgmath::Vector4::new(0.0, 1.0, 0.0, 0.0);
        assert!((y_axis.y - 2.0).abs() < 1e-5);
    }
}
