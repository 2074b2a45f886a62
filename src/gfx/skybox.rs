// src/gfx/skybox.rs
//! Sky background
//!
//! The sky is drawn as a fullscreen pass that unprojects each pixel back
//! into a world-space view ray and samples three equirectangular sky
//! textures (day, sunset, night), blended by the sun's elevation weights.
//! It renders after the scene at maximum depth, so only uncovered pixels
//! pay for it.

use cgmath::Matrix4;

use crate::gfx::resources::texture_resource::{TextureData, TextureResource};
use crate::wgpu_utils::{
    binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
    binding_types,
    uniform_buffer::UniformBuffer,
};

/// CPU-side sky description: one texture per phase of day
pub struct SkyboxData {
    pub day: TextureData,
    pub sunset: TextureData,
    pub night: TextureData,
}

/// Per-frame sky parameters, layout mirrored in skybox.wgsl
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SkyboxUniform {
    /// Inverse of the camera view-projection, for screen-to-ray unprojection
    pub inv_view_proj: [[f32; 4]; 4],
    /// World-space direction toward the sun, w unused
    pub sun_direction: [f32; 4],
    /// x = day weight, y = sunset weight, z = night weight, w = yaw offset
    pub blend: [f32; 4],
}

impl Default for SkyboxUniform {
    fn default() -> Self {
        Self {
            inv_view_proj: cgmath::Matrix4::from_scale(1.0f32).into(),
            sun_direction: [0.0, 1.0, 0.0, 0.0],
            blend: [1.0, 0.0, 0.0, 0.0],
        }
    }
}

/// Bind group layout for the sky pass: uniform, three textures, one sampler
pub fn skybox_bind_group_layout(device: &wgpu::Device) -> BindGroupLayoutWithDesc {
    BindGroupLayoutBuilder::new()
        .next_binding_fragment(binding_types::uniform())
        .next_binding_fragment(binding_types::texture_2d())
        .next_binding_fragment(binding_types::texture_2d())
        .next_binding_fragment(binding_types::texture_2d())
        .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Filtering))
        .create(device, "Skybox Bind Group Layout")
}

/// GPU-resident sky: textures, params buffer, and their bind group
pub struct Skybox {
    ubo: UniformBuffer<SkyboxUniform>,
    bind_group: wgpu::BindGroup,
    /// Slow yaw drift applied to the sky textures, radians
    pub rotation: f32,
    _day: TextureResource,
    _sunset: TextureResource,
    _night: TextureResource,
}

impl Skybox {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &BindGroupLayoutWithDesc,
        data: SkyboxData,
    ) -> Self {
        let day = TextureResource::from_rgba(device, queue, &data.day, "Skybox Day");
        let sunset = TextureResource::from_rgba(device, queue, &data.sunset, "Skybox Sunset");
        let night = TextureResource::from_rgba(device, queue, &data.night, "Skybox Night");

        let ubo = UniformBuffer::new(device);

        let bind_group = BindGroupBuilder::new(layout)
            .resource(ubo.binding_resource())
            .texture(&day.view)
            .texture(&sunset.view)
            .texture(&night.view)
            .sampler(&day.sampler)
            .create(device, "Skybox Bind Group");

        Self {
            ubo,
            bind_group,
            rotation: 0.0,
            _day: day,
            _sunset: sunset,
            _night: night,
        }
    }

    /// Uploads this frame's unprojection matrix and blend weights
    pub fn update(
        &mut self,
        queue: &wgpu::Queue,
        inv_view_proj: Matrix4<f32>,
        sun_direction: [f32; 3],
        weights: [f32; 3],
    ) {
        self.ubo.update_content(
            queue,
            SkyboxUniform {
                inv_view_proj: inv_view_proj.into(),
                sun_direction: [sun_direction[0], sun_direction[1], sun_direction[2], 0.0],
                blend: [weights[0], weights[1], weights[2], self.rotation],
            },
        );
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_is_tightly_packed() {
        // 64 bytes matrix + 16 sun + 16 blend
        assert_eq!(std::mem::size_of::<SkyboxUniform>(), 96);
    }

    #[test]
    fn default_uniform_is_daytime() {
        let u = SkyboxUniform::default();
        assert_eq!(u.blend[0], 1.0);
        assert_eq!(u.blend[2], 0.0);
    }
}
