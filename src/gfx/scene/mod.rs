//! # Scene Data Module
//!
//! CPU- and GPU-side model data plus the vertex format. Models are built
//! once from procedural geometry, uploaded into [`ModelData`], and then
//! submitted to the renderer by reference each frame.

pub mod model;
pub mod vertex;

// Re-export main types
pub use model::{Aabb, DrawModel, ModelData, RawModelData, RawShape};
pub use vertex::Vertex3D;
