//! Asset loading: the chinchilla's material library and geometry.
//!
//! Loading happens on a background thread so the window opens immediately;
//! the result arrives over an mpsc channel the event loop polls each frame.
//! The material library is loaded before the geometry — the model is only
//! usable with its colors resolved, and a broken library should fail the
//! whole load rather than produce an uncolored chinchilla.
//!
//! A failed load is not fatal: the receiver logs it and the scene simply
//! never gets an object.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::thread;

use thiserror::Error;

/// Directory the model resources are loaded from.
pub const MODEL_BASE_PATH: &str = "assets";
pub const MODEL_MATERIAL_FILE: &str = "chinchilla.mtl";
pub const MODEL_GEOMETRY_FILE: &str = "chinchilla.obj";

const DEFAULT_DIFFUSE: [f32; 3] = [0.8, 0.8, 0.8];

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to load material library {path}: {source}")]
    Material {
        path: PathBuf,
        source: tobj::LoadError,
    },
    #[error("failed to load model {path}: {source}")]
    Geometry {
        path: PathBuf,
        source: tobj::LoadError,
    },
}

/// One mesh of the loaded model: flat vertex arrays plus the resolved
/// material color.
#[derive(Debug)]
pub struct MeshData {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub indices: Vec<u32>,
    pub color: [f32; 4],
}

/// The combined result of the material + geometry loads.
#[derive(Debug)]
pub struct ModelData {
    pub meshes: Vec<MeshData>,
}

/// Spawns the loader thread and returns the channel its result arrives on.
pub fn load_in_background(base: impl Into<PathBuf>) -> Receiver<Result<ModelData, AssetError>> {
    let base = base.into();
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        // The receiver may be gone if the app shut down mid-load.
        let _ = tx.send(load_model(&base));
    });
    rx
}

/// Loads the material library, then the geometry, and combines them.
pub fn load_model(base: &Path) -> Result<ModelData, AssetError> {
    let material_path = base.join(MODEL_MATERIAL_FILE);
    let (materials, _) = tobj::load_mtl(&material_path).map_err(|source| AssetError::Material {
        path: material_path.clone(),
        source,
    })?;
    log::info!(
        "loaded {} materials from {}",
        materials.len(),
        material_path.display()
    );

    let geometry_path = base.join(MODEL_GEOMETRY_FILE);
    let (models, _) = tobj::load_obj(
        &geometry_path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .map_err(|source| AssetError::Geometry {
        path: geometry_path.clone(),
        source,
    })?;
    log::info!(
        "loaded {} meshes from {}",
        models.len(),
        geometry_path.display()
    );

    let meshes = models
        .into_iter()
        .map(|model| {
            let color = model
                .mesh
                .material_id
                .and_then(|id| materials.get(id))
                .map(|material| {
                    let diffuse = material.diffuse.unwrap_or(DEFAULT_DIFFUSE);
                    [
                        diffuse[0],
                        diffuse[1],
                        diffuse[2],
                        material.dissolve.unwrap_or(1.0),
                    ]
                })
                .unwrap_or([
                    DEFAULT_DIFFUSE[0],
                    DEFAULT_DIFFUSE[1],
                    DEFAULT_DIFFUSE[2],
                    1.0,
                ]);

            MeshData {
                positions: model.mesh.positions,
                normals: model.mesh.normals,
                indices: model.mesh.indices,
                color,
            }
        })
        .collect();

    Ok(ModelData { meshes })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_model_loads() {
        let model = load_model(Path::new(MODEL_BASE_PATH)).expect("bundled assets must load");
        assert!(!model.meshes.is_empty());

        for mesh in &model.meshes {
            assert_eq!(mesh.positions.len() % 3, 0);
            assert_eq!(mesh.indices.len() % 3, 0);
            assert!(!mesh.indices.is_empty());
            // Colors come from the material library.
            assert!(mesh.color.iter().all(|c| (0.0..=1.0).contains(c)));
        }
    }

    #[test]
    fn test_missing_material_library_fails_first() {
        let err = load_model(Path::new("does-not-exist")).unwrap_err();
        assert!(matches!(err, AssetError::Material { .. }));
    }

    #[test]
    fn test_background_load_delivers_on_the_channel() {
        let rx = load_in_background(MODEL_BASE_PATH);
        let result = rx
            .recv_timeout(std::time::Duration::from_secs(10))
            .expect("loader thread must answer");
        assert!(result.is_ok());
    }
}
