use slotmap::new_key_type;
use std::sync::Arc;

use crate::assets::model::Mesh;
use crate::assets::storage::AssetStorage;

use std::sync::OnceLock;
use tokio::runtime::Runtime;

/// Shared runtime used when no tokio runtime is active on the calling thread.
pub fn asset_runtime() -> &'static Runtime {
    static RUNTIME: OnceLock<Runtime> = OnceLock::new();
    RUNTIME.get_or_init(|| Runtime::new().expect("Failed to create asset loader runtime"))
}

// Strongly-typed handles
new_key_type! {
    pub struct MeshHandle;
}

/// Owner of the CPU-side resources referenced by loaded models.
///
/// Releasing a model returns its handles here, which is what frees the
/// renderer-side resources keyed by them.
#[derive(Clone)] // Lightweight, can be cloned freely
pub struct AssetServer {
    pub meshes: Arc<AssetStorage<MeshHandle, Mesh>>,
}

impl Default for AssetServer {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetServer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            meshes: Arc::new(AssetStorage::new()),
        }
    }
}
