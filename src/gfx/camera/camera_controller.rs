// src/gfx/camera/camera_controller.rs
use std::f32::consts::TAU;

use cgmath::{Vector2, Vector3};
use winit::{
    event::{DeviceEvent, ElementState, KeyEvent},
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

use super::camera::Camera;

/// Maps window/device input onto first-person camera motion
///
/// Keyboard steps translate in the camera's local frame (W/S walk, A/D
/// strafe, Space/C climb); dragging with the left button rotates the view
/// direction, scaled so a full window width of motion is one full turn.
pub struct CameraController {
    pub move_step: f32,
    pub look_speed: f32,
    is_mouse_pressed: bool,
}

impl CameraController {
    pub fn new(move_step: f32, look_speed: f32) -> Self {
        Self {
            move_step,
            look_speed,
            is_mouse_pressed: false,
        }
    }

    pub fn process_events(&mut self, event: &DeviceEvent, window: &Window, camera: &mut Camera) {
        match event {
            DeviceEvent::Button {
                button: 0, // Left Mouse Button
                state,
            } => {
                self.is_mouse_pressed = *state == ElementState::Pressed;
            }
            DeviceEvent::MouseMotion { delta } => {
                if self.is_mouse_pressed {
                    let size = window.inner_size();
                    if size.width == 0 || size.height == 0 {
                        return;
                    }
                    let yaw = TAU * delta.0 as f32 / size.width as f32;
                    let pitch = TAU * -delta.1 as f32 / size.height as f32;
                    camera.move_target(Vector2::new(yaw, pitch) * self.look_speed);
                    window.request_redraw();
                }
            }
            _ => (),
        }
    }

    pub fn process_keyed_events(&mut self, event: &KeyEvent, camera: &mut Camera) {
        if event.state != ElementState::Pressed {
            return;
        }

        let step = match event.physical_key {
            PhysicalKey::Code(KeyCode::KeyW) => Vector3::new(0.0, 0.0, self.move_step),
            PhysicalKey::Code(KeyCode::KeyS) => Vector3::new(0.0, 0.0, -self.move_step),
            PhysicalKey::Code(KeyCode::KeyA) => Vector3::new(-self.move_step, 0.0, 0.0),
            PhysicalKey::Code(KeyCode::KeyD) => Vector3::new(self.move_step, 0.0, 0.0),
            PhysicalKey::Code(KeyCode::Space) => Vector3::new(0.0, self.move_step, 0.0),
            PhysicalKey::Code(KeyCode::KeyC) => Vector3::new(0.0, -self.move_step, 0.0),
            _ => return,
        };

        camera.move_local(step);
    }
}
