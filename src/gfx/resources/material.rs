// src/gfx/resources/material.rs
//! Phong material channels for the color pass
//!
//! Each model shape carries its own material; the channels are uploaded as a
//! per-shape uniform and combined with the base texture in the fragment
//! shader.

use wgpu::Device;

use crate::wgpu_utils::{
    binding_builder::{BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
    binding_types,
};

/// GPU uniform data for a material
///
/// Must match the MaterialParams struct in scene.wgsl exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    /// rgb specular color, w shininess exponent
    pub specular: [f32; 4],
    /// x opacity, y bump-map flag (1.0 when a bump texture is bound)
    pub params: [f32; 4],
}

/// Material definition with classic lighting channels
#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    pub ambient: [f32; 3],
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
    pub shininess: f32,
    pub opacity: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: "Default".to_string(),
            ambient: [1.0, 1.0, 1.0],
            diffuse: [1.0, 1.0, 1.0],
            specular: [0.3, 0.3, 0.3],
            shininess: 32.0,
            opacity: 1.0,
        }
    }
}

impl Material {
    pub fn new(
        name: &str,
        ambient: [f32; 3],
        diffuse: [f32; 3],
        specular: [f32; 3],
        shininess: f32,
        opacity: f32,
    ) -> Self {
        Self {
            name: name.to_string(),
            ambient,
            diffuse,
            specular,
            shininess,
            opacity: opacity.clamp(0.0, 1.0),
        }
    }

    pub fn uniform(&self, has_bump: bool) -> MaterialUniform {
        MaterialUniform {
            ambient: [self.ambient[0], self.ambient[1], self.ambient[2], 1.0],
            diffuse: [self.diffuse[0], self.diffuse[1], self.diffuse[2], 1.0],
            specular: [
                self.specular[0],
                self.specular[1],
                self.specular[2],
                self.shininess,
            ],
            params: [self.opacity, if has_bump { 1.0 } else { 0.0 }, 0.0, 0.0],
        }
    }
}

/// Bind group layout shared by every shape's material bind group
///
/// Binding order: material uniform, base texture, bump texture, sampler.
pub fn material_bind_group_layout(device: &Device) -> BindGroupLayoutWithDesc {
    BindGroupLayoutBuilder::new()
        .next_binding_fragment(binding_types::uniform())
        .next_binding_fragment(binding_types::texture_2d())
        .next_binding_fragment(binding_types::texture_2d())
        .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Filtering))
        .create(device, "Material Bind Group Layout")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_packs_shininess_and_opacity() {
        let material = Material::new(
            "brick",
            [0.2, 0.2, 0.2],
            [0.9, 0.5, 0.4],
            [0.1, 0.1, 0.1],
            16.0,
            0.75,
        );
        let uniform = material.uniform(true);
        assert_eq!(uniform.specular[3], 16.0);
        assert_eq!(uniform.params[0], 0.75);
        assert_eq!(uniform.params[1], 1.0);
    }

    #[test]
    fn opacity_is_clamped() {
        let material = Material::new("glass", [0.0; 3], [1.0; 3], [1.0; 3], 8.0, 1.5);
        assert_eq!(material.opacity, 1.0);
    }
}
