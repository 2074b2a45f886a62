//! # Graphics Module
//!
//! Everything the city scene needs to get on screen:
//!
//! - **Transform core** ([`transform`]) - pose math shared by camera and models
//! - **Camera** ([`camera`]) - first-person camera and its input controller
//! - **Rendering** ([`rendering`]) - shadow/color/sky passes and the frame queue
//! - **Scene data** ([`scene`]) - GPU model data and the vertex format
//! - **Resources** ([`resources`]) - materials, textures, global bindings
//! - **World building** ([`city`], [`geometry`], [`skybox`], [`lighting`])

pub mod camera;
pub mod city;
pub mod geometry;
pub mod lighting;
pub mod rendering;
pub mod resources;
pub mod scene;
pub mod skybox;
pub mod transform;

// Re-export commonly used types
pub use camera::Camera;
pub use rendering::renderer::Renderer;
