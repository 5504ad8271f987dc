//! Scene: the fixed camera plus the (optional) chinchilla.
//!
//! The chinchilla slot stays empty until the background asset load
//! delivers model data; an empty slot renders nothing and answers every
//! pick query with a miss.

use cgmath::{Matrix4, Vector2, Vector3};

use crate::assets::ModelData;
use crate::gfx::camera::OrthoCamera;
use crate::gfx::object::Object;
use crate::gfx::picking;
use crate::interaction::controller::RigTransform;
use crate::interaction::PickSurface;

/// Offset baked into the loaded mesh so it pivots near its visual center.
pub const MODEL_BASE_OFFSET: [f32; 3] = [-0.5, -0.5, -0.25];
/// Scale baked into the loaded mesh.
pub const MODEL_BASE_SCALE: f32 = 0.5;

pub struct Scene {
    pub camera: OrthoCamera,
    pub chinchilla: Option<Object>,
}

impl Scene {
    pub fn new(camera: OrthoCamera) -> Self {
        Self {
            camera,
            chinchilla: None,
        }
    }

    /// Installs the loaded model as the scene's chinchilla.
    pub fn install_chinchilla(&mut self, model: ModelData) -> &mut Object {
        let mut object = Object::from_model(model);
        object.transform = RigTransform::at_rest().matrix() * Self::base_transform();
        self.chinchilla.insert(object)
    }

    /// Innermost node of the hierarchy: the fixed offset and scale applied
    /// to the mesh as loaded.
    fn base_transform() -> Matrix4<f32> {
        Matrix4::from_translation(Vector3::from(MODEL_BASE_OFFSET))
            * Matrix4::from_scale(MODEL_BASE_SCALE)
    }

    /// Writes the controller's rig state into the scene graph. The only
    /// transform write path, called once per tick.
    pub fn apply_rig(&mut self, rig: &RigTransform) {
        if let Some(object) = self.chinchilla.as_mut() {
            object.transform = rig.matrix() * Self::base_transform();
        }
    }

    /// Refreshes camera matrices.
    pub fn update(&mut self) {
        self.camera.update_view_proj();
    }
}

impl PickSurface for Scene {
    fn pick(&self, ndc: Vector2<f32>) -> Option<Vector3<f32>> {
        let object = self.chinchilla.as_ref()?;
        let ray = picking::screen_to_ray(ndc, &self.camera);
        picking::pick(&ray, object.local_bounds(), &object.transform).map(|hit| hit.point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MeshData;
    use cgmath::Vector2;

    fn cube_model() -> ModelData {
        // Axis-aligned cube spanning [0, 2]^3, which the base transform
        // maps to [-0.5, 0.5] x [-0.5, 0.5] x [-0.25, 0.75].
        let positions = vec![
            0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 2.0, 2.0, 0.0, 0.0, 2.0, 0.0, //
            0.0, 0.0, 2.0, 2.0, 0.0, 2.0, 2.0, 2.0, 2.0, 0.0, 2.0, 2.0,
        ];
        let indices = vec![
            0, 1, 2, 0, 2, 3, 4, 6, 5, 4, 7, 6, 0, 4, 5, 0, 5, 1, //
            3, 2, 6, 3, 6, 7, 0, 3, 7, 0, 7, 4, 1, 5, 6, 1, 6, 2,
        ];
        ModelData {
            meshes: vec![MeshData {
                positions,
                normals: Vec::new(),
                indices,
                color: [0.5, 0.5, 0.5, 1.0],
            }],
        }
    }

    #[test]
    fn test_empty_scene_never_picks() {
        let scene = Scene::new(OrthoCamera::new(800, 600));
        assert!(scene.pick(Vector2::new(0.0, 0.0)).is_none());
    }

    #[test]
    fn test_installed_chinchilla_is_pickable_at_center() {
        let mut scene = Scene::new(OrthoCamera::new(800, 600));
        scene.install_chinchilla(cube_model());

        let hit = scene.pick(Vector2::new(0.0, 0.0)).expect("must hit");
        // The transformed cube straddles the origin, so the hit point is
        // within its half-unit extent of the view axis.
        assert!(hit.x.abs() <= 1.0);
        assert!(hit.y.abs() <= 1.0);

        // Far off to the side there is nothing to hit.
        assert!(scene.pick(Vector2::new(0.9, 0.9)).is_none());
    }

    #[test]
    fn test_apply_rig_moves_the_pick_target() {
        let mut scene = Scene::new(OrthoCamera::new(800, 600));
        scene.install_chinchilla(cube_model());

        let mut rig = RigTransform::at_rest();
        rig.group_position = Vector3::new(50.0, 0.0, 0.0);
        scene.apply_rig(&rig);

        assert!(scene.pick(Vector2::new(0.0, 0.0)).is_none());
    }
}
