// src/gfx/scene/model.rs
//! GPU-resident model data
//!
//! [`RawModelData`] is the CPU-side mesh description produced by the geometry
//! builders; [`ModelData`] is its immutable GPU form: one vertex/index buffer
//! and one material bind group per shape, plus a local bounding box for the
//! collision query. A ModelData is owned by whoever constructs it; the
//! renderer only borrows it per draw submission, so the host must keep it
//! alive for every frame it is submitted in.

use cgmath::{Matrix4, Point3, Vector3};
use wgpu::util::DeviceExt;

use crate::gfx::{
    geometry::GeometryData,
    rendering::renderer::Renderer,
    resources::{
        material::Material,
        texture_resource::{TextureData, TextureResource},
    },
};
use crate::wgpu_utils::{
    binding_builder::{BindGroupBuilder, BindGroupLayoutWithDesc},
    uniform_buffer::UniformBuffer,
};


/// One textured shape of a raw model
#[derive(Debug, Clone)]
pub struct RawShape {
    pub geometry: GeometryData,
    pub texture: TextureData,
    /// Optional bump map enabling tangent-space normal perturbation
    pub bump: Option<TextureData>,
    pub material: Material,
}

impl RawShape {
    pub fn new(geometry: GeometryData, texture: TextureData) -> Self {
        Self {
            geometry,
            texture,
            bump: None,
            material: Material::default(),
        }
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn with_bump(mut self, bump: TextureData) -> Self {
        self.bump = Some(bump);
        self
    }
}

/// CPU-side model description, a list of shapes
#[derive(Debug, Clone, Default)]
pub struct RawModelData {
    pub shapes: Vec<RawShape>,
}

impl RawModelData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_shape(&mut self, shape: RawShape) {
        self.shapes.push(shape);
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy)]
pub struct Aabb {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl Aabb {
    /// Smallest box containing every point; empty input yields a degenerate
    /// box at the origin
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a [f32; 3]>) -> Self {
        let mut min = Vector3::new(f32::MAX, f32::MAX, f32::MAX);
        let mut max = Vector3::new(f32::MIN, f32::MIN, f32::MIN);
        let mut any = false;
        for p in points {
            any = true;
            min.x = min.x.min(p[0]);
            min.y = min.y.min(p[1]);
            min.z = min.z.min(p[2]);
            max.x = max.x.max(p[0]);
            max.y = max.y.max(p[1]);
            max.z = max.z.max(p[2]);
        }
        if !any {
            return Self {
                min: Vector3::new(0.0, 0.0, 0.0),
                max: Vector3::new(0.0, 0.0, 0.0),
            };
        }
        Self { min, max }
    }

    pub fn contains(&self, point: Point3<f32>) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Box containing this box's eight corners under `matrix`
    pub fn transformed(&self, matrix: Matrix4<f32>) -> Self {
        let corners = [
            [self.min.x, self.min.y, self.min.z],
            [self.max.x, self.min.y, self.min.z],
            [self.min.x, self.max.y, self.min.z],
            [self.max.x, self.max.y, self.min.z],
            [self.min.x, self.min.y, self.max.z],
            [self.max.x, self.min.y, self.max.z],
            [self.min.x, self.max.y, self.max.z],
            [self.max.x, self.max.y, self.max.z],
        ];
        let transformed: Vec<[f32; 3]> = corners
            .iter()
            .map(|c| {
                let v = matrix * cgmath::Vector4::new(c[0], c[1], c[2], 1.0);
                [v.x, v.y, v.z]
            })
            .collect();
        Self::from_points(transformed.iter())
    }
}

/// One GPU-resident shape: buffers plus its material bind group
pub struct GpuShape {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    bind_group: wgpu::BindGroup,
    // Bound textures and the material UBO must outlive the bind group.
    _texture: TextureResource,
    _bump: TextureResource,
    _material_ubo: UniformBuffer<crate::gfx::resources::material::MaterialUniform>,
}

/// GPU-resident vertex/index/texture handles for a model
///
/// Immutable after construction. Buffers are freed when the ModelData drops.
pub struct ModelData {
    shapes: Vec<GpuShape>,
    aabb: Aabb,
}

impl ModelData {
    /// Uploads a raw model through the renderer's device and material layout
    pub fn new(raw: RawModelData, renderer: &Renderer) -> Self {
        Self::upload(
            renderer.device(),
            renderer.queue(),
            renderer.material_layout(),
            raw,
        )
    }

    pub(crate) fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        material_layout: &BindGroupLayoutWithDesc,
        raw: RawModelData,
    ) -> Self {
        let aabb = Aabb::from_points(
            raw.shapes
                .iter()
                .flat_map(|shape| shape.geometry.positions.iter()),
        );

        let shapes = raw
            .shapes
            .into_iter()
            .map(|shape| Self::upload_shape(device, queue, material_layout, shape))
            .collect();

        Self { shapes, aabb }
    }

    fn upload_shape(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        material_layout: &BindGroupLayoutWithDesc,
        shape: RawShape,
    ) -> GpuShape {
        let vertices = shape.geometry.vertices();
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Model Vertex Buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Model Index Buffer"),
            contents: bytemuck::cast_slice(&shape.geometry.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let has_bump = shape.bump.is_some();
        let texture = TextureResource::from_rgba(device, queue, &shape.texture, "Model Texture");
        // A bump slot is always bound; a flat placeholder keeps the layout
        // uniform when no bump map exists.
        let bump_data = shape
            .bump
            .unwrap_or_else(|| TextureData::solid(128, 128, 255, 255));
        let bump = TextureResource::from_rgba(device, queue, &bump_data, "Model Bump Texture");

        let mut material_ubo = UniformBuffer::new(device);
        material_ubo.update_content(queue, shape.material.uniform(has_bump));

        let bind_group = BindGroupBuilder::new(material_layout)
            .resource(material_ubo.binding_resource())
            .texture(&texture.view)
            .texture(&bump.view)
            .sampler(&texture.sampler)
            .create(device, "Model Material Bind Group");

        GpuShape {
            vertex_buffer,
            index_buffer,
            index_count: shape.geometry.indices.len() as u32,
            bind_group,
            _texture: texture,
            _bump: bump,
            _material_ubo: material_ubo,
        }
    }

    /// Buffer-less model for exercising submission bookkeeping without a GPU
    #[cfg(test)]
    pub(crate) fn without_buffers(aabb: Aabb) -> Self {
        Self {
            shapes: Vec::new(),
            aabb,
        }
    }

    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    /// Local-space bounding box over all shapes
    pub fn aabb(&self) -> Aabb {
        self.aabb
    }
}

/// Draw-call helpers binding each shape's buffers on a render pass
pub trait DrawModel<'a> {
    /// Issues one indexed draw per shape, binding its material at
    /// `material_group` when given
    fn draw_model(&mut self, model: &'a ModelData, material_group: Option<u32>);
}

impl<'a, 'b> DrawModel<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_model(&mut self, model: &'b ModelData, material_group: Option<u32>) {
        for shape in &model.shapes {
            if let Some(group) = material_group {
                self.set_bind_group(group, &shape.bind_group, &[]);
            }
            self.set_vertex_buffer(0, shape.vertex_buffer.slice(..));
            self.set_index_buffer(shape.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            self.draw_indexed(0..shape.index_count, 0, 0..1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aabb_bounds_points() {
        let points = [[-1.0, 0.0, 2.0], [3.0, -2.0, 0.5], [0.0, 1.0, 1.0]];
        let aabb = Aabb::from_points(points.iter());
        assert!(aabb.contains(Point3::new(0.0, 0.0, 1.0)));
        assert!(!aabb.contains(Point3::new(4.0, 0.0, 1.0)));
        assert!(!aabb.contains(Point3::new(0.0, -3.0, 1.0)));
    }

    #[test]
    fn transformed_aabb_follows_translation_and_scale() {
        let aabb = Aabb::from_points([[-1.0, -1.0, -1.0], [1.0, 1.0, 1.0]].iter());
        let m = Matrix4::from_translation(Vector3::new(10.0, 0.0, 0.0))
            * Matrix4::from_nonuniform_scale(2.0, 1.0, 1.0);
        let moved = aabb.transformed(m);
        assert!(moved.contains(Point3::new(11.5, 0.0, 0.0)));
        assert!(!moved.contains(Point3::new(7.5, 0.0, 0.0)));
        assert!(!moved.contains(Point3::new(0.0, 0.0, 0.0)));
    }
}
