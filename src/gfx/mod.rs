//! # Graphics Module
//!
//! Everything the widget needs to put the chinchilla on screen: the fixed
//! orthographic camera, pointer picking, the scene and its single object,
//! and the wgpu render engine.

pub mod camera;
pub mod global_bindings;
pub mod object;
pub mod picking;
pub mod render_engine;
pub mod scene;
pub mod texture_resource;
pub mod vertex;

// Re-export commonly used types
pub use camera::OrthoCamera;
pub use render_engine::RenderEngine;
pub use scene::Scene;
