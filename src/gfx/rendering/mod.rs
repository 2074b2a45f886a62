// src/gfx/rendering/mod.rs
//! Core rendering functionality
//!
//! Render pipelines, the per-frame submission queue, and the renderer that
//! composes the shadow, color, and sky passes.

pub mod frame;
pub mod pipeline_manager;
pub mod renderer;

// Re-export main types
pub use frame::FrameQueue;
pub use pipeline_manager::{PipelineConfig, PipelineManager};
pub use renderer::{perspective_matrix, sun_light_matrix, RenderError, Renderer};
