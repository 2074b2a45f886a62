// src/gfx/resources/global_bindings.rs
//! Global uniform bindings for camera, sun and lamp data
//!
//! Manages the GPU uniform buffer and bind group for per-frame global state
//! shared across all draw calls: camera matrices, the sun's light-space
//! matrix for shadow mapping, the day/night blend scalar, fog distance, and
//! the bounded lamp light array.

use cgmath::{Matrix4, Point3};

use crate::{
    gfx::lighting::{LampProfile, LightSource, MAX_LIGHTS},
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

/// Global uniform buffer content
///
/// Must match the Globals struct in scene.wgsl and shadow.wgsl exactly,
/// including the lamp array bound.
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct GlobalUBOContent {
    view_proj: [[f32; 4]; 4],
    /// Sun's view-projection for the shadow pass and shadow sampling
    light_view_proj: [[f32; 4]; 4],
    view_position: [f32; 4],
    /// xyz sun travel direction, w daylight scalar
    sun_direction: [f32; 4],
    sun_ambient: [f32; 4],
    /// rgb diffuse color, w cone half-angle (radians)
    sun_diffuse: [f32; 4],
    lamp_positions: [[f32; 4]; MAX_LIGHTS],
    /// rgb shared lamp color, w lamp intensity
    lamp_color: [f32; 4],
    /// x render distance (fog), y active lamp count
    params: [f32; 4],
}

unsafe impl bytemuck::Pod for GlobalUBOContent {}
unsafe impl bytemuck::Zeroable for GlobalUBOContent {}

/// Type alias for the global uniform buffer
pub type GlobalUBO = UniformBuffer<GlobalUBOContent>;

/// Per-frame global state gathered by the renderer before the passes run
pub struct GlobalFrameData<'a> {
    pub view_proj: Matrix4<f32>,
    pub light_view_proj: Matrix4<f32>,
    pub view_position: Point3<f32>,
    pub sun: LightSource,
    pub daylight: f32,
    pub lamp_positions: &'a [Point3<f32>],
    pub lamp_profile: LampProfile,
    pub render_distance: f32,
}

/// Uploads the frame's global state into the uniform buffer
pub fn update_global_ubo(ubo: &mut GlobalUBO, queue: &wgpu::Queue, frame: &GlobalFrameData) {
    debug_assert!(frame.lamp_positions.len() <= MAX_LIGHTS);

    let mut lamp_positions = [[0.0f32; 4]; MAX_LIGHTS];
    for (slot, lamp) in lamp_positions.iter_mut().zip(frame.lamp_positions) {
        *slot = [lamp.x, lamp.y, lamp.z, 1.0];
    }

    let content = GlobalUBOContent {
        view_proj: frame.view_proj.into(),
        light_view_proj: frame.light_view_proj.into(),
        view_position: [
            frame.view_position.x,
            frame.view_position.y,
            frame.view_position.z,
            1.0,
        ],
        sun_direction: [
            frame.sun.direction.x,
            frame.sun.direction.y,
            frame.sun.direction.z,
            frame.daylight,
        ],
        sun_ambient: [
            frame.sun.ambient[0],
            frame.sun.ambient[1],
            frame.sun.ambient[2],
            1.0,
        ],
        sun_diffuse: [
            frame.sun.diffuse[0],
            frame.sun.diffuse[1],
            frame.sun.diffuse[2],
            frame.sun.max_angle,
        ],
        lamp_positions,
        lamp_color: [
            frame.lamp_profile.color[0],
            frame.lamp_profile.color[1],
            frame.lamp_profile.color[2],
            frame.lamp_profile.intensity,
        ],
        params: [
            frame.render_distance,
            frame.lamp_positions.len() as f32,
            0.0,
            0.0,
        ],
    };

    ubo.update_content(queue, content);
}

/// Manages the bind group layout and bind group for global uniforms
///
/// Bound to slot 0 in the shadow and scene pipelines.
pub struct GlobalBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
    bind_group: Option<wgpu::BindGroup>,
}

impl GlobalBindings {
    pub fn new(device: &wgpu::Device) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .create(device, "Globals Bind Group Layout");

        GlobalBindings {
            bind_group_layout,
            bind_group: None,
        }
    }

    /// Creates the bind group; must run before the first frame
    pub fn create_bind_group(&mut self, device: &wgpu::Device, ubo: &GlobalUBO) {
        self.bind_group = Some(
            BindGroupBuilder::new(&self.bind_group_layout)
                .resource(ubo.binding_resource())
                .create(device, "Global Bind Group"),
        );
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    /// # Panics
    /// Panics if `create_bind_group()` hasn't been called yet
    pub fn bind_group(&self) -> &wgpu::BindGroup {
        self.bind_group
            .as_ref()
            .expect("Bind group has not been created yet!")
    }
}
