//! Core renderer
//!
//! Owns the wgpu surface, device, and the three pipelines of a frame:
//! a depth-only shadow pass from the sun's point of view, a color pass
//! sampling that shadow map, and a final skybox pass filling the
//! uncovered background. Hosts submit work through a [`FrameQueue`] and
//! call [`Renderer::render_scene`] once per frame.

use std::sync::Arc;

use cgmath::{
    EuclideanSpace, InnerSpace, Matrix4, Point3, SquareMatrix, Vector3,
};
use thiserror::Error;

use crate::gfx::{
    camera::Camera,
    lighting::Sun,
    resources::{
        global_bindings::{update_global_ubo, GlobalBindings, GlobalFrameData, GlobalUBO},
        material::material_bind_group_layout,
        texture_resource::TextureResource,
    },
    scene::{model::Aabb, DrawModel, ModelData, RawModelData},
    skybox::{skybox_bind_group_layout, Skybox, SkyboxData},
    transform::normal_matrix,
};
use crate::wgpu_utils::{
    binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
    binding_types,
    uniform_buffer::{DynamicUniformBuffer, UniformBuffer},
};

use super::frame::FrameQueue;
use super::pipeline_manager::{PipelineConfig, PipelineManager};

/// Fatal renderer construction failures; no partial renderer exists after any
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no suitable graphics adapter: {0}")]
    NoAdapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to acquire device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("failed to build pipeline '{name}': {reason}")]
    Pipeline { name: String, reason: String },
}

/// Maps OpenGL clip space (z in -1..1) to wgpu clip space (z in 0..1)
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

const VERTICAL_FOV_DEG: f32 = 60.0;
const NEAR_PLANE: f32 = 0.1;
const SHADOW_MAP_SIZE: u32 = 2048;

/// Camera projection for the current surface size; only aspect-dependent
/// terms change on resize
pub fn perspective_matrix(width: u32, height: u32, render_distance: f32) -> Matrix4<f32> {
    let aspect = width.max(1) as f32 / height.max(1) as f32;
    OPENGL_TO_WGPU_MATRIX
        * cgmath::perspective(
            cgmath::Deg(VERTICAL_FOV_DEG),
            aspect,
            NEAR_PLANE,
            render_distance,
        )
}

/// Orthographic view-projection from the sun, covering a cube of
/// `render_distance` half-extent around the origin
pub fn sun_light_matrix(sun_direction: Vector3<f32>, render_distance: f32) -> Matrix4<f32> {
    let eye = Point3::from_vec(-sun_direction.normalize() * render_distance);
    // Fall back when the sun is straight overhead.
    let up = if sun_direction.x.abs() < 1e-4 && sun_direction.z.abs() < 1e-4 {
        Vector3::unit_z()
    } else {
        Vector3::unit_y()
    };
    let view = Matrix4::look_at_rh(eye, Point3::new(0.0, 0.0, 0.0), up);
    let proj = cgmath::ortho(
        -render_distance,
        render_distance,
        -render_distance,
        render_distance,
        0.0,
        2.0 * render_distance,
    );
    OPENGL_TO_WGPU_MATRIX * proj * view
}

/// Per-submission transform data, one dynamic-offset slot per draw
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
struct DrawUniform {
    model: [[f32; 4]; 4],
    /// Inverse-transpose of the model matrix, padded to mat4 for WGSL layout
    normal: [[f32; 4]; 4],
}

fn draw_uniform(transform: Matrix4<f32>) -> DrawUniform {
    let n = normal_matrix(transform);
    let normal = Matrix4::new(
        n.x.x, n.x.y, n.x.z, 0.0,
        n.y.x, n.y.y, n.y.z, 0.0,
        n.z.x, n.z.y, n.z.z, 0.0,
        0.0, 0.0, 0.0, 1.0,
    );
    DrawUniform {
        model: transform.into(),
        normal: normal.into(),
    }
}

const SHADOW_PIPELINE: &str = "shadow";
const SCENE_PIPELINE: &str = "scene";
const SKYBOX_PIPELINE: &str = "skybox";

/// Stateful scene renderer
///
/// `camera` and `sun` are public and swappable between frames; everything
/// else is managed internally.
pub struct Renderer {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_texture: TextureResource,
    shadow_map: TextureResource,
    shadow_bind_group: wgpu::BindGroup,
    pipeline_manager: PipelineManager,

    global_ubo: GlobalUBO,
    global_bindings: GlobalBindings,
    draw_ubo: DynamicUniformBuffer<DrawUniform>,
    draw_layout: BindGroupLayoutWithDesc,
    draw_bind_group: wgpu::BindGroup,
    material_layout: BindGroupLayoutWithDesc,
    skybox_layout: BindGroupLayoutWithDesc,
    skybox: Option<Skybox>,

    projection: Matrix4<f32>,
    render_distance: f32,
    /// World-space bounds of last frame's submissions, for collision queries
    collision_boxes: Vec<Aabb>,

    pub camera: Camera,
    pub sun: Sun,
}

impl Renderer {
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        render_distance: f32,
        camera: Camera,
        sun: Sun,
    ) -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        log::info!("using adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Cityscape Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: 4096,
                    ..wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;
        let device = Arc::new(device);
        let queue = Arc::new(queue);

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_capabilities.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_capabilities.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture = TextureResource::create_depth_texture(&device, &config, "Scene Depth");
        let shadow_map = TextureResource::create_shadow_map(&device, SHADOW_MAP_SIZE);

        let global_ubo = UniformBuffer::new(&device);
        let mut global_bindings = GlobalBindings::new(&device);
        global_bindings.create_bind_group(&device, &global_ubo);

        let draw_layout = BindGroupLayoutBuilder::new()
            .next_binding_vertex(binding_types::uniform_dynamic())
            .create(&device, "Per-Draw Bind Group Layout");
        let draw_ubo = DynamicUniformBuffer::new(&device, 256);
        let draw_bind_group = BindGroupBuilder::new(&draw_layout)
            .resource(draw_ubo.binding_resource())
            .create(&device, "Per-Draw Bind Group");

        let material_layout = material_bind_group_layout(&device);
        let skybox_layout = skybox_bind_group_layout(&device);

        let shadow_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::texture_depth_2d())
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Comparison))
            .create(&device, "Shadow Map Bind Group Layout");
        let shadow_bind_group = BindGroupBuilder::new(&shadow_layout)
            .texture(&shadow_map.view)
            .sampler(&shadow_map.sampler)
            .create(&device, "Shadow Map Bind Group");

        let mut pipeline_manager = PipelineManager::new(device.clone());
        pipeline_manager.load_shader("scene.wgsl", include_str!("scene.wgsl"));
        pipeline_manager.load_shader("shadow.wgsl", include_str!("shadow.wgsl"));
        pipeline_manager.load_shader("skybox.wgsl", include_str!("skybox.wgsl"));

        let pipeline_error = |name: &'static str| {
            move |reason: String| RenderError::Pipeline {
                name: name.to_string(),
                reason,
            }
        };

        pipeline_manager
            .register_pipeline(
                SHADOW_PIPELINE,
                &PipelineConfig::default_with_shader("shadow.wgsl")
                    .with_label("Shadow Pipeline")
                    .with_bind_group_layouts(vec![
                        global_bindings.bind_group_layout().clone(),
                        draw_layout.layout.clone(),
                    ])
                    .with_vertex_only()
                    // Front-face culling reduces shadow acne on closed meshes.
                    .with_cull_mode(Some(wgpu::Face::Front))
                    .with_depth(TextureResource::DEPTH_FORMAT),
            )
            .map_err(pipeline_error(SHADOW_PIPELINE))?;

        pipeline_manager
            .register_pipeline(
                SCENE_PIPELINE,
                &PipelineConfig::default_with_shader("scene.wgsl")
                    .with_label("Scene Pipeline")
                    .with_bind_group_layouts(vec![
                        global_bindings.bind_group_layout().clone(),
                        draw_layout.layout.clone(),
                        material_layout.layout.clone(),
                        shadow_layout.layout.clone(),
                    ])
                    .with_depth(TextureResource::DEPTH_FORMAT)
                    .with_color_targets(vec![Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })]),
            )
            .map_err(pipeline_error(SCENE_PIPELINE))?;

        pipeline_manager
            .register_pipeline(
                SKYBOX_PIPELINE,
                &PipelineConfig::default_with_shader("skybox.wgsl")
                    .with_label("Skybox Pipeline")
                    .with_bind_group_layouts(vec![skybox_layout.layout.clone()])
                    .with_no_vertex_buffers()
                    .with_cull_mode(None)
                    // Drawn at the far plane after the geometry.
                    .with_depth_read_only(
                        TextureResource::DEPTH_FORMAT,
                        wgpu::CompareFunction::LessEqual,
                    )
                    .with_color_targets(vec![Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })]),
            )
            .map_err(pipeline_error(SKYBOX_PIPELINE))?;

        let projection = perspective_matrix(width, height, render_distance);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth_texture,
            shadow_map,
            shadow_bind_group,
            pipeline_manager,
            global_ubo,
            global_bindings,
            draw_ubo,
            draw_layout,
            draw_bind_group,
            material_layout,
            skybox_layout,
            skybox: None,
            projection,
            render_distance,
            collision_boxes: Vec::new(),
            camera,
            sun,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub(crate) fn material_layout(&self) -> &BindGroupLayoutWithDesc {
        &self.material_layout
    }

    pub fn render_distance(&self) -> f32 {
        self.render_distance
    }

    /// Uploads a raw model into GPU buffers owned by the caller
    pub fn create_model(&self, raw: RawModelData) -> ModelData {
        ModelData::upload(&self.device, &self.queue, &self.material_layout, raw)
    }

    /// Uploads the sky textures; replaces any previously attached sky
    pub fn attach_skybox(&mut self, data: SkyboxData) {
        self.skybox = Some(Skybox::new(
            &self.device,
            &self.queue,
            &self.skybox_layout,
            data,
        ));
    }

    /// Reconfigures the surface and projection; camera pose is unaffected
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            TextureResource::create_depth_texture(&self.device, &self.config, "Scene Depth");
        self.projection = perspective_matrix(width, height, self.render_distance);
    }

    /// True if `point` is underground or inside any model submitted in the
    /// previous frame
    pub fn check_collision(&self, point: Point3<f32>) -> bool {
        if point.y <= 0.0 {
            return true;
        }
        self.collision_boxes.iter().any(|aabb| aabb.contains(point))
    }

    /// Renders the queued frame: shadow pass, color pass, sky pass. Drains
    /// the queue on success.
    pub fn render_scene(&mut self, frame: &mut FrameQueue<'_>) {
        let view_proj = self.projection * self.camera.view_matrix();
        let light_view_proj = sun_light_matrix(self.sun.direction(), self.render_distance);

        update_global_ubo(
            &mut self.global_ubo,
            &self.queue,
            &GlobalFrameData {
                view_proj,
                light_view_proj,
                view_position: Point3::from_vec(self.camera.position()),
                sun: self.sun.light(),
                daylight: self.sun.daylight(),
                lamp_positions: frame.lamps(),
                lamp_profile: Default::default(),
                render_distance: self.render_distance,
            },
        );

        let submissions = frame.submissions();
        if submissions.len() > self.draw_ubo.capacity() {
            self.draw_ubo =
                DynamicUniformBuffer::new(&self.device, submissions.len().next_power_of_two());
            self.draw_bind_group = BindGroupBuilder::new(&self.draw_layout)
                .resource(self.draw_ubo.binding_resource())
                .create(&self.device, "Per-Draw Bind Group");
        }
        let draw_uniforms: Vec<DrawUniform> = submissions
            .iter()
            .map(|s| draw_uniform(s.transform))
            .collect();
        self.draw_ubo.update_content(&self.queue, &draw_uniforms);

        self.collision_boxes.clear();
        self.collision_boxes.extend(
            submissions
                .iter()
                .map(|s| s.model.aabb().transformed(s.transform)),
        );

        if let Some(skybox) = &mut self.skybox {
            let inv_view_proj = view_proj
                .invert()
                .unwrap_or_else(Matrix4::identity);
            let sun_pos = self.sun.position().normalize();
            skybox.update(
                &self.queue,
                inv_view_proj,
                [sun_pos.x, sun_pos.y, sun_pos.z],
                self.sun.skin_weights(),
            );
        }

        let surface_texture = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(e) => {
                // Lost/outdated surfaces recover on the next resize.
                log::error!("failed to acquire surface frame: {e}");
                frame.clear();
                return;
            }
        };
        let surface_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.shadow_map.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            shadow_pass.set_pipeline(self.pipeline_manager.pipeline(SHADOW_PIPELINE));
            shadow_pass.set_bind_group(0, self.global_bindings.bind_group(), &[]);
            for (index, submission) in submissions.iter().enumerate() {
                shadow_pass.set_bind_group(
                    1,
                    &self.draw_bind_group,
                    &[self.draw_ubo.offset(index)],
                );
                shadow_pass.draw_model(submission.model, None);
            }
        }

        {
            let mut color_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Color Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.02,
                            g: 0.02,
                            b: 0.04,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            color_pass.set_pipeline(self.pipeline_manager.pipeline(SCENE_PIPELINE));
            color_pass.set_bind_group(0, self.global_bindings.bind_group(), &[]);
            color_pass.set_bind_group(3, &self.shadow_bind_group, &[]);
            for (index, submission) in submissions.iter().enumerate() {
                color_pass.set_bind_group(
                    1,
                    &self.draw_bind_group,
                    &[self.draw_ubo.offset(index)],
                );
                color_pass.draw_model(submission.model, Some(2));
            }

            if let Some(skybox) = &self.skybox {
                color_pass.set_pipeline(self.pipeline_manager.pipeline(SKYBOX_PIPELINE));
                color_pass.set_bind_group(0, skybox.bind_group(), &[]);
                color_pass.draw(0..3, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();

        frame.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cgmath::Vector4;

    #[test]
    fn resize_changes_only_aspect_terms() {
        let a = perspective_matrix(800, 600, 200.0);
        let b = perspective_matrix(400, 600, 200.0);
        // x scale follows aspect, y scale and depth terms do not.
        assert!(a.x.x != b.x.x);
        assert_relative_eq!(a.y.y, b.y.y);
        assert_relative_eq!(a.z.z, b.z.z);
        assert_relative_eq!(a.w.z, b.w.z);
    }

    #[test]
    fn perspective_maps_into_wgpu_depth_range() {
        let proj = perspective_matrix(800, 600, 200.0);
        // A point on the near plane lands at z = 0 after perspective divide.
        let near = proj * Vector4::new(0.0, 0.0, -0.1, 1.0);
        assert_relative_eq!(near.z / near.w, 0.0, epsilon = 1e-5);
        let far = proj * Vector4::new(0.0, 0.0, -200.0, 1.0);
        assert_relative_eq!(far.z / far.w, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn sun_matrix_centers_origin() {
        let m = sun_light_matrix(Vector3::new(-1.0, -1.0, 0.0).normalize(), 100.0);
        let origin = m * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(origin.x / origin.w, 0.0, epsilon = 1e-5);
        assert_relative_eq!(origin.y / origin.w, 0.0, epsilon = 1e-5);
        // Origin is mid-way through the ortho volume.
        assert_relative_eq!(origin.z / origin.w, 0.5, epsilon = 1e-5);
    }

    #[test]
    fn sun_matrix_covers_render_distance() {
        let distance = 100.0;
        let m = sun_light_matrix(Vector3::new(0.0, -1.0, 0.2).normalize(), distance);
        for p in [
            Vector4::new(distance * 0.7, 0.0, 0.0, 1.0),
            Vector4::new(0.0, 0.0, distance * 0.7, 1.0),
            Vector4::new(-distance * 0.7, 10.0, -distance * 0.7, 1.0),
        ] {
            let clip = m * p;
            let ndc = clip / clip.w;
            assert!(ndc.x.abs() <= 1.0 && ndc.y.abs() <= 1.0, "point {p:?} outside");
            assert!(ndc.z >= 0.0 && ndc.z <= 1.0);
        }
    }

    #[test]
    fn overhead_sun_matrix_is_finite() {
        let m = sun_light_matrix(Vector3::new(0.0, -1.0, 0.0), 50.0);
        let v = m * Vector4::new(1.0, 0.0, 1.0, 1.0);
        assert!(v.x.is_finite() && v.y.is_finite() && v.z.is_finite());
    }

    #[test]
    fn draw_uniform_packs_matrices() {
        assert_eq!(std::mem::size_of::<DrawUniform>(), 128);
        let u = draw_uniform(Matrix4::from_translation(Vector3::new(1.0, 2.0, 3.0)));
        assert_eq!(u.model[3][0], 1.0);
        // Pure translation leaves the normal matrix at identity.
        assert_relative_eq!(u.normal[0][0], 1.0);
        assert_relative_eq!(u.normal[1][1], 1.0);
    }
}
