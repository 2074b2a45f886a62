// src/lib.rs
//! Cityscape renderer
//!
//! A real-time renderer for a procedurally generated city: cube buildings on
//! a street grid, a first-person camera, a day/night sun with shadow
//! mapping, and a skybox blended across three times of day. Built on wgpu
//! and winit.

pub mod app;
pub mod gfx;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::CityApp;
pub use gfx::rendering::{FrameQueue, RenderError, Renderer};

/// Creates a default city application instance
pub fn default() -> CityApp {
    CityApp::new()
}
