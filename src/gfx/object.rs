//! The renderable chinchilla: meshes, transform, and their GPU resources.

use std::ops::Range;

use cgmath::{Matrix4, SquareMatrix};
use wgpu::Device;

use crate::assets::ModelData;
use crate::gfx::picking::Aabb;
use crate::gfx::vertex::Vertex3D;
use crate::wgpu_utils::{BindGroupBuilder, BindGroupLayoutWithDesc, UniformBuffer};

/// Per-object uniform data, bound at group 1.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TransformUniform {
    pub model: [[f32; 4]; 4],
}

/// Per-mesh uniform data, bound at group 2.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub base_color: [f32; 4],
}

pub struct Mesh {
    vertices: Vec<Vertex3D>,
    indices: Vec<u32>,
    color: [f32; 4],
    index_count: u32,
    vertex_buffer: Option<wgpu::Buffer>,
    index_buffer: Option<wgpu::Buffer>,
    material_ubo: Option<UniformBuffer<MaterialUniform>>,
    material_bind_group: Option<wgpu::BindGroup>,
}

impl Mesh {
    /// Builds a mesh from flat position/normal/index arrays. Normals are
    /// recomputed from the faces when the source had none.
    pub fn new(positions: Vec<f32>, normals: Vec<f32>, indices: Vec<u32>, color: [f32; 4]) -> Self {
        let normals = if !normals.is_empty() && normals.len() == positions.len() {
            normals
        } else {
            Self::calculate_face_normals(&positions, &indices)
        };

        let index_count = indices.len() as u32;
        let mut vertices = Vec::with_capacity(positions.len() / 3);
        for i in 0..positions.len() / 3 {
            vertices.push(Vertex3D {
                position: [positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2]],
                normal: [normals[i * 3], normals[i * 3 + 1], normals[i * 3 + 2]],
            });
        }

        Self {
            vertices,
            indices,
            color,
            index_count,
            vertex_buffer: None,
            index_buffer: None,
            material_ubo: None,
            material_bind_group: None,
        }
    }

    pub fn vertices(&self) -> &[Vertex3D] {
        &self.vertices
    }

    /// Area-weighted vertex normals from face cross products.
    fn calculate_face_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
        let vertex_count = positions.len() / 3;
        let mut normals = vec![0.0; positions.len()];

        for triangle in indices.chunks(3) {
            let [i0, i1, i2] = [
                triangle[0] as usize,
                triangle[1] as usize,
                triangle[2] as usize,
            ];

            let v0 = [
                positions[i0 * 3],
                positions[i0 * 3 + 1],
                positions[i0 * 3 + 2],
            ];
            let v1 = [
                positions[i1 * 3],
                positions[i1 * 3 + 1],
                positions[i1 * 3 + 2],
            ];
            let v2 = [
                positions[i2 * 3],
                positions[i2 * 3 + 1],
                positions[i2 * 3 + 2],
            ];

            let edge1 = [v1[0] - v0[0], v1[1] - v0[1], v1[2] - v0[2]];
            let edge2 = [v2[0] - v0[0], v2[1] - v0[1], v2[2] - v0[2]];
            let face_normal = [
                edge1[1] * edge2[2] - edge1[2] * edge2[1],
                edge1[2] * edge2[0] - edge1[0] * edge2[2],
                edge1[0] * edge2[1] - edge1[1] * edge2[0],
            ];

            for &vertex in &[i0, i1, i2] {
                normals[vertex * 3] += face_normal[0];
                normals[vertex * 3 + 1] += face_normal[1];
                normals[vertex * 3 + 2] += face_normal[2];
            }
        }

        for i in 0..vertex_count {
            let length = (normals[i * 3].powi(2)
                + normals[i * 3 + 1].powi(2)
                + normals[i * 3 + 2].powi(2))
            .sqrt();
            if length > 0.0 {
                normals[i * 3] /= length;
                normals[i * 3 + 1] /= length;
                normals[i * 3 + 2] /= length;
            }
        }

        normals
    }

    fn init_gpu_resources(&mut self, device: &Device, material_layout: &BindGroupLayoutWithDesc) {
        let vertex_buffer = wgpu::util::DeviceExt::create_buffer_init(
            device,
            &wgpu::util::BufferInitDescriptor {
                label: Some("Vertex Buffer"),
                contents: bytemuck::cast_slice(&self.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            },
        );
        let index_buffer = wgpu::util::DeviceExt::create_buffer_init(
            device,
            &wgpu::util::BufferInitDescriptor {
                label: Some("Index Buffer"),
                contents: bytemuck::cast_slice(&self.indices),
                usage: wgpu::BufferUsages::INDEX,
            },
        );

        let material_ubo = UniformBuffer::new_with_data(
            device,
            &MaterialUniform {
                base_color: self.color,
            },
        );
        let material_bind_group = BindGroupBuilder::new(material_layout)
            .resource(material_ubo.binding_resource())
            .create(device, "Material Bind Group");

        self.vertex_buffer = Some(vertex_buffer);
        self.index_buffer = Some(index_buffer);
        self.material_ubo = Some(material_ubo);
        self.material_bind_group = Some(material_bind_group);
    }
}

struct ObjectGpuResources {
    transform_ubo: UniformBuffer<TransformUniform>,
    transform_bind_group: wgpu::BindGroup,
}

pub struct Object {
    pub meshes: Vec<Mesh>,
    pub transform: Matrix4<f32>,
    local_bounds: Aabb,
    gpu_resources: Option<ObjectGpuResources>,
}

impl Object {
    /// Builds the object from loaded model data with an identity transform.
    pub fn from_model(model: ModelData) -> Self {
        let meshes: Vec<Mesh> = model
            .meshes
            .into_iter()
            .map(|mesh| Mesh::new(mesh.positions, mesh.normals, mesh.indices, mesh.color))
            .collect();

        let mut all_positions = Vec::new();
        for mesh in &meshes {
            all_positions.extend(mesh.vertices().iter().map(|v| v.position));
        }
        let local_bounds = Aabb::from_vertices(&all_positions);

        Self {
            meshes,
            transform: Matrix4::identity(),
            local_bounds,
            gpu_resources: None,
        }
    }

    /// Bounding box of the raw mesh data, before any transform.
    pub fn local_bounds(&self) -> &Aabb {
        &self.local_bounds
    }

    pub fn init_gpu_resources(
        &mut self,
        device: &Device,
        transform_layout: &BindGroupLayoutWithDesc,
        material_layout: &BindGroupLayoutWithDesc,
    ) {
        for mesh in &mut self.meshes {
            mesh.init_gpu_resources(device, material_layout);
        }

        let transform_ubo = UniformBuffer::new_with_data(
            device,
            &TransformUniform {
                model: self.transform.into(),
            },
        );
        let transform_bind_group = BindGroupBuilder::new(transform_layout)
            .resource(transform_ubo.binding_resource())
            .create(device, "Transform Bind Group");

        self.gpu_resources = Some(ObjectGpuResources {
            transform_ubo,
            transform_bind_group,
        });
    }

    /// Syncs the current transform matrix to the GPU.
    pub fn update_transform(&mut self, queue: &wgpu::Queue) {
        let model = self.transform.into();
        if let Some(gpu) = &mut self.gpu_resources {
            gpu.transform_ubo
                .update_content(queue, TransformUniform { model });
        }
    }
}

pub trait DrawObject<'a> {
    fn draw_mesh(&mut self, mesh: &'a Mesh);
    fn draw_mesh_instanced(&mut self, mesh: &'a Mesh, instances: Range<u32>);
    fn draw_object(&mut self, object: &'a Object);
}

impl<'a, 'b> DrawObject<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_mesh(&mut self, mesh: &'b Mesh) {
        self.draw_mesh_instanced(mesh, 0..1);
    }

    fn draw_mesh_instanced(&mut self, mesh: &'b Mesh, instances: Range<u32>) {
        let (Some(vertex_buffer), Some(index_buffer), Some(material)) = (
            &mesh.vertex_buffer,
            &mesh.index_buffer,
            &mesh.material_bind_group,
        ) else {
            return; // Skip drawing if not uploaded
        };

        self.set_bind_group(2, material, &[]);
        self.set_vertex_buffer(0, vertex_buffer.slice(..));
        self.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..mesh.index_count, 0, instances);
    }

    fn draw_object(&mut self, object: &'b Object) {
        let Some(gpu) = &object.gpu_resources else {
            return;
        };
        self.set_bind_group(1, &gpu.transform_bind_group, &[]);
        for mesh in &object.meshes {
            self.draw_mesh(mesh);
        }
    }
}
