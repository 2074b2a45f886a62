//! Host application
//!
//! Owns the winit event loop and wires the pieces together: window,
//! renderer, procedurally generated city, skybox, and the first-person
//! camera controller. All state lives in this context struct; nothing is
//! global.

use std::sync::Arc;
use std::time::Instant;

use cgmath::{Point3, Vector3};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowAttributes},
};

use crate::gfx::{
    camera::{camera_controller::CameraController, Camera},
    city::City,
    geometry,
    lighting::Sun,
    rendering::{FrameQueue, Renderer},
    resources::{material::Material, texture_resource::TextureData},
    scene::{ModelData, RawModelData, RawShape},
    skybox::SkyboxData,
};

const RENDER_DISTANCE: f32 = 200.0;
const CITY_SEED: u64 = 1804289383;
const CITY_CELLS: u32 = 12;
const CITY_SPACING: f32 = 14.0;
const DAY_CYCLE_SECONDS: f32 = 120.0;

pub struct CityApp {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState,
}

struct SceneModels {
    terrain: ModelData,
    building: ModelData,
}

struct AppState {
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    models: Option<SceneModels>,
    controller: CameraController,
    city: City,
    last_frame: Instant,
}

impl CityApp {
    /// Create a new city application with default settings
    pub fn new() -> Self {
        let event_loop = EventLoop::new().expect("Failed to create event loop");

        Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                window: None,
                renderer: None,
                models: None,
                controller: CameraController::new(0.2, 1.0),
                city: City::generate(CITY_SEED, CITY_CELLS, CITY_SPACING),
                last_frame: Instant::now(),
            },
        }
    }

    /// Run the application (consumes self and starts the event loop)
    pub fn run(mut self) -> anyhow::Result<()> {
        let event_loop = self.event_loop.take().expect("Event loop already consumed");
        event_loop.set_control_flow(ControlFlow::Poll);

        event_loop.run_app(&mut self.app_state)?;
        Ok(())
    }
}

impl Default for CityApp {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    fn build_models(renderer: &Renderer) -> SceneModels {
        let half = CITY_CELLS as f32 * CITY_SPACING;

        let mut terrain = RawModelData::new();
        terrain.push_shape(
            RawShape::new(
                geometry::primitives::terrain(half, half / 4.0),
                asphalt_texture(),
            )
            .with_material(Material::new(
                "asphalt",
                [0.35, 0.35, 0.35],
                [0.8, 0.8, 0.8],
                [0.05, 0.05, 0.05],
                4.0,
                1.0,
            )),
        );

        let mut building = RawModelData::new();
        building.push_shape(
            RawShape::new(geometry::primitives::cube(), facade_texture())
                .with_material(Material::new(
                    "facade",
                    [0.3, 0.3, 0.32],
                    [0.9, 0.9, 0.9],
                    [0.3, 0.3, 0.3],
                    16.0,
                    1.0,
                )),
        );

        SceneModels {
            terrain: renderer.create_model(terrain),
            building: renderer.create_model(building),
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Ok(window) = event_loop.create_window(
            WindowAttributes::default()
                .with_title("cityscape")
                .with_inner_size(winit::dpi::LogicalSize::new(1200, 800)),
        ) {
            let window_handle = Arc::new(window);
            self.window = Some(window_handle.clone());

            let (width, height) = window_handle.inner_size().into();

            let camera = Camera::new(Vector3::new(0.0, 2.0, -6.0), Vector3::new(0.0, 2.0, 0.0));
            let sun = Sun::new(DAY_CYCLE_SECONDS, RENDER_DISTANCE);

            let window_clone = window_handle.clone();
            let renderer = pollster::block_on(async move {
                Renderer::new(window_clone, width, height, RENDER_DISTANCE, camera, sun).await
            });
            let mut renderer = match renderer {
                Ok(renderer) => renderer,
                Err(e) => {
                    log::error!("failed to initialize renderer: {e}");
                    event_loop.exit();
                    return;
                }
            };

            renderer.attach_skybox(SkyboxData {
                day: sky_texture([90, 150, 230], [170, 210, 250]),
                sunset: sky_texture([60, 45, 90], [250, 140, 70]),
                night: sky_texture([4, 5, 14], [18, 20, 40]),
            });

            self.models = Some(Self::build_models(&renderer));
            self.renderer = Some(renderer);
            self.last_frame = Instant::now();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        let Some(window) = self.window.as_ref() else {
            return;
        };

        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if matches!(
                    event.physical_key,
                    winit::keyboard::PhysicalKey::Code(winit::keyboard::KeyCode::Escape)
                ) {
                    event_loop.exit();
                    return;
                }
                // Walking through buildings or the ground reverts the step.
                let previous = renderer.camera.pose;
                self.controller.process_keyed_events(&event, &mut renderer.camera);
                let eye = renderer.camera.position();
                if renderer.check_collision(Point3::new(eye.x, eye.y, eye.z)) {
                    renderer.camera.pose = previous;
                }
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                renderer.resize(width, height);
            }
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let dt = now.duration_since(self.last_frame).as_secs_f32();
                self.last_frame = now;
                renderer.sun.advance(dt);

                let Some(models) = self.models.as_ref() else {
                    return;
                };

                let mut frame = FrameQueue::new();
                frame.draw_model_at(
                    &models.terrain,
                    Vector3::new(0.0, 0.0, 0.0),
                    Vector3::new(1.0, 1.0, 1.0),
                    Vector3::new(0.0, 0.0, 0.0),
                );
                self.city.draw(&mut frame, &models.building);
                let eye = renderer.camera.position();
                self.city
                    .submit_lamps(&mut frame, Point3::new(eye.x, eye.y, eye.z));

                renderer.render_scene(&mut frame);
                window.request_redraw();
            }
            _ => (),
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: winit::event::DeviceEvent,
    ) {
        let Some(window) = self.window.as_ref() else {
            return;
        };
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        self.controller
            .process_events(&event, window, &mut renderer.camera);
    }
}

/// Vertical sky gradient from horizon color to zenith color
fn sky_texture(zenith: [u8; 3], horizon: [u8; 3]) -> TextureData {
    let (width, height) = (4u32, 256u32);
    let mut rgba = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        // Equirectangular v: 0 at the top of the sky.
        let t = (y as f32 / (height - 1) as f32 * 2.0 - 1.0).abs();
        for _ in 0..width {
            for c in 0..3 {
                let value = zenith[c] as f32 * (1.0 - t) + horizon[c] as f32 * t;
                rgba.push(value as u8);
            }
            rgba.push(255);
        }
    }
    TextureData {
        width,
        height,
        rgba,
    }
}

/// Window grid on a dark facade
fn facade_texture() -> TextureData {
    let size = 64u32;
    let mut rgba = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let window = x % 8 >= 2 && x % 8 <= 5 && y % 8 >= 2 && y % 8 <= 5;
            let lit = (x / 8 * 31 + y / 8 * 17) % 7 < 2;
            let color: [u8; 3] = if window && lit {
                [240, 220, 150]
            } else if window {
                [40, 50, 60]
            } else {
                [90, 88, 84]
            };
            rgba.extend_from_slice(&color);
            rgba.push(255);
        }
    }
    TextureData {
        width: size,
        height: size,
        rgba,
    }
}

/// Asphalt with a faint tile seam
fn asphalt_texture() -> TextureData {
    let size = 64u32;
    let mut rgba = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let seam = x == 0 || y == 0;
            let noise = ((x * 7 + y * 13) % 5) as u8 * 3;
            let base = if seam { 50 } else { 70 + noise };
            rgba.extend_from_slice(&[base, base, base + 2, 255]);
        }
    }
    TextureData {
        width: size,
        height: size,
        rgba,
    }
}
