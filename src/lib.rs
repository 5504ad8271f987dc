// src/lib.rs
//! Chinchilla
//!
//! An interactive 3D desktop toy built on wgpu and winit: a chinchilla in
//! an orthographic scene that can be grabbed, dragged, flung into a trash
//! can, and watched respawning. Clicking it makes it spin faster.

pub mod app;
pub mod assets;
pub mod gfx;
pub mod interaction;
pub mod ui;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::ChinchillaApp;

/// Creates the widget application with the default assets and trash style.
pub fn default() -> anyhow::Result<ChinchillaApp> {
    ChinchillaApp::new()
}
