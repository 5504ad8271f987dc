//! Global uniform bindings: camera matrices plus the scene lighting.
//!
//! Bound at group 0 in the render pipeline. The light setup mirrors the
//! widget's look: one dim directional light plus an ambient term of the
//! same color, each at half intensity.

use crate::{
    gfx::camera::CameraUniform,
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

/// Global uniform buffer content. Must match the `Globals` struct in the
/// shader exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
    /// xyz: direction the light travels, w: intensity.
    light_direction: [f32; 4],
    /// rgb: directional light color, a: ambient intensity.
    light_color: [f32; 4],
    /// rgb: ambient color, a unused.
    ambient_color: [f32; 4],
}

/// Scene lighting configuration.
#[derive(Copy, Clone, Debug)]
pub struct LightConfig {
    pub direction: [f32; 3],
    pub color: [f32; 3],
    pub intensity: f32,
    pub ambient_color: [f32; 3],
    pub ambient_intensity: f32,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            direction: [-0.4, -0.8, -0.3],
            color: [1.0, 1.0, 1.0],
            intensity: 0.5,
            ambient_color: [1.0, 1.0, 1.0],
            ambient_intensity: 0.5,
        }
    }
}

pub type GlobalUBO = UniformBuffer<GlobalUniform>;

/// Updates the global uniform buffer with camera and light data. Called
/// once per frame.
pub fn update_global_ubo(
    ubo: &mut GlobalUBO,
    queue: &wgpu::Queue,
    camera: CameraUniform,
    light: LightConfig,
) {
    let content = GlobalUniform {
        view_position: camera.view_position,
        view_proj: camera.view_proj,
        light_direction: [
            light.direction[0],
            light.direction[1],
            light.direction[2],
            light.intensity,
        ],
        light_color: [
            light.color[0],
            light.color[1],
            light.color[2],
            light.ambient_intensity,
        ],
        ambient_color: [
            light.ambient_color[0],
            light.ambient_color[1],
            light.ambient_color[2],
            0.0,
        ],
    };

    ubo.update_content(queue, content);
}

/// Manages the bind group layout and bind group for global uniforms,
/// bound at slot 0 in the render pipeline.
pub struct GlobalBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
    bind_group: Option<wgpu::BindGroup>,
}

impl GlobalBindings {
    pub fn new(device: &wgpu::Device) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .create(device, "Globals Bind Group");

        GlobalBindings {
            bind_group_layout,
            bind_group: None,
        }
    }

    /// Must be called once the uniform buffer exists, before rendering.
    pub fn create_bind_group(&mut self, device: &wgpu::Device, ubo: &GlobalUBO) {
        self.bind_group = Some(
            BindGroupBuilder::new(&self.bind_group_layout)
                .resource(ubo.binding_resource())
                .create(device, "Global Bind Group"),
        );
    }

    pub fn bind_group_layouts(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    /// # Panics
    /// Panics if `create_bind_group()` hasn't been called yet.
    pub fn bind_groups(&self) -> &wgpu::BindGroup {
        self.bind_group
            .as_ref()
            .expect("Bind group has not been created yet!")
    }
}
