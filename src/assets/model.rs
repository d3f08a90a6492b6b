use std::fmt;

use glam::Vec3;
use serde::Deserialize;

use crate::assets::server::{AssetServer, MeshHandle};
use crate::scene::Node;

/// CPU-side triangle mesh.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Mesh {
    #[serde(default)]
    pub name: Option<String>,
    pub positions: Vec<Vec3>,
    #[serde(default)]
    pub indices: Vec<u32>,
}

impl Mesh {
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Triangle count, treating a non-indexed mesh as a triangle list.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        if self.indices.is_empty() {
            self.positions.len() / 3
        } else {
            self.indices.len() / 3
        }
    }

    /// Radius of the origin-centred sphere enclosing every vertex.
    #[must_use]
    pub fn bounding_radius(&self) -> f32 {
        self.positions
            .iter()
            .map(|p| p.length())
            .fold(0.0, f32::max)
    }
}

/// Parsed model data, before its meshes are handed to an [`AssetServer`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelData {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub meshes: Vec<Mesh>,
}

/// A loaded detail model: a scene node plus the mesh resources it owns.
///
/// The model releases its meshes from the owning [`AssetServer`] when it is
/// dropped or explicitly [`release`](Self::release)d, so replacing a LOD
/// level frees the previous level's resources.
pub struct Model {
    pub node: Node,
    /// Identifier the model was fetched from.
    pub source: String,
    meshes: Vec<MeshHandle>,
    server: Option<AssetServer>,
}

impl Model {
    /// Creates a model that owns no mesh resources.
    #[must_use]
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            node: Node::new(name.into()),
            source: source.into(),
            meshes: Vec::new(),
            server: None,
        }
    }

    /// Stores the meshes of `data` in `server` and wraps them in a model.
    #[must_use]
    pub fn from_data(server: &AssetServer, data: ModelData, source: impl Into<String>) -> Self {
        let source = source.into();
        let name = data.name.unwrap_or_else(|| source.clone());
        let meshes = data
            .meshes
            .into_iter()
            .map(|mesh| server.meshes.add(mesh))
            .collect();

        Self {
            node: Node::new(name),
            source,
            meshes,
            server: Some(server.clone()),
        }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.node.name
    }

    #[inline]
    #[must_use]
    pub fn meshes(&self) -> &[MeshHandle] {
        &self.meshes
    }

    /// Returns the model's meshes to its server. Returns how many were freed.
    pub fn release(&mut self) -> usize {
        let Some(server) = &self.server else {
            return 0;
        };
        let released = self
            .meshes
            .drain(..)
            .filter(|&handle| server.meshes.remove(handle).is_some())
            .count();
        if released > 0 {
            log::trace!("Released {released} mesh(es) of '{}'", self.source);
        }
        released
    }
}

impl Drop for Model {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.node.name)
            .field("source", &self.source)
            .field("visible", &self.node.visible)
            .field("meshes", &self.meshes.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Mesh {
        Mesh {
            name: Some("tri".into()),
            positions: vec![Vec3::X, Vec3::Y, Vec3::new(0.0, 0.0, 2.0)],
            indices: vec![],
        }
    }

    #[test]
    fn test_mesh_stats() {
        let mesh = triangle();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
        assert!((mesh.bounding_radius() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_drop_releases_meshes() {
        let server = AssetServer::new();
        let data = ModelData {
            name: None,
            meshes: vec![triangle(), triangle()],
        };

        let model = Model::from_data(&server, data, "tri_LOD0.json");
        assert_eq!(model.name(), "tri_LOD0.json");
        assert_eq!(server.meshes.len(), 2);

        drop(model);
        assert!(server.meshes.is_empty());
    }

    #[test]
    fn test_release_is_idempotent() {
        let server = AssetServer::new();
        let mut model = Model::from_data(
            &server,
            ModelData {
                name: Some("a".into()),
                meshes: vec![triangle()],
            },
            "a.json",
        );
        assert_eq!(model.release(), 1);
        assert_eq!(model.release(), 0);
        assert!(model.meshes().is_empty());
    }
}
