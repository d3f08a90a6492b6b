//! Per-call load configuration.

use std::fmt;
use std::sync::Arc;

use glam::{Quat, Vec3};

use crate::config::LodSettings;
use crate::lod::group::{LodHandle, LodId};
use crate::lod::level::{LodLevelDesc, default_levels};
use crate::scene::Node;

/// Progress report emitted after a background tier has been inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct TierProgress {
    pub lod: LodId,
    /// Tier index that was inserted.
    pub index: usize,
    /// URL the tier was fetched from.
    pub source: String,
    pub message: String,
    /// Tiers present in the group so far, including this one.
    pub loaded: usize,
    /// Tiers configured for the group.
    pub total: usize,
}

pub type TierLoadedCallback = Arc<dyn Fn(&TierProgress) + Send + Sync>;
pub type ReadyCallback = Arc<dyn Fn(&LodHandle) + Send + Sync>;

/// Options for [`LodLoader`](crate::lod::LodLoader) calls.
///
/// | Field | Default |
/// |---|---|
/// | `name` | base name of the asset |
/// | `position` / `rotation` / `scale` | identity transform |
/// | `levels` | [`default_levels`]: thresholds 0, 10, 20 |
/// | `progressive` | `true` |
/// | `base_name` | derived from the URL |
/// | `default_extension` | `"glb"` |
///
/// `on_tier_loaded` fires after every background tier insertion; `on_ready`
/// fires once every tier has been attempted.
#[derive(Clone)]
pub struct LoadOptions {
    pub name: Option<String>,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub levels: Vec<LodLevelDesc>,
    pub progressive: bool,
    pub base_name: Option<String>,
    pub default_extension: String,
    pub on_tier_loaded: Option<TierLoadedCallback>,
    pub on_ready: Option<ReadyCallback>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            name: None,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            levels: default_levels(),
            progressive: true,
            base_name: None,
            default_extension: "glb".to_string(),
            on_tier_loaded: None,
            on_ready: None,
        }
    }
}

impl LoadOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Options seeded from configured defaults.
    #[must_use]
    pub fn from_settings(settings: &LodSettings) -> Self {
        Self {
            levels: settings.levels.clone(),
            progressive: settings.progressive,
            default_extension: settings.default_extension.clone(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    #[must_use]
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    #[must_use]
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    #[must_use]
    pub fn with_uniform_scale(self, scale: f32) -> Self {
        self.with_scale(Vec3::splat(scale))
    }

    #[must_use]
    pub fn with_levels(mut self, levels: impl Into<Vec<LodLevelDesc>>) -> Self {
        self.levels = levels.into();
        self
    }

    #[must_use]
    pub fn progressive(mut self, progressive: bool) -> Self {
        self.progressive = progressive;
        self
    }

    #[must_use]
    pub fn with_base_name(mut self, base_name: impl Into<String>) -> Self {
        self.base_name = Some(base_name.into());
        self
    }

    #[must_use]
    pub fn on_tier_loaded(mut self, f: impl Fn(&TierProgress) + Send + Sync + 'static) -> Self {
        self.on_tier_loaded = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn on_ready(mut self, f: impl Fn(&LodHandle) + Send + Sync + 'static) -> Self {
        self.on_ready = Some(Arc::new(f));
        self
    }

    /// Writes the configured TRS into `node`.
    pub fn apply_transform(&self, node: &mut Node) {
        node.transform.position = self.position;
        node.transform.rotation = self.rotation;
        node.transform.scale = self.scale;
    }
}

impl fmt::Debug for LoadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadOptions")
            .field("name", &self.name)
            .field("position", &self.position)
            .field("rotation", &self.rotation)
            .field("scale", &self.scale)
            .field("levels", &self.levels)
            .field("progressive", &self.progressive)
            .field("base_name", &self.base_name)
            .field("default_extension", &self.default_extension)
            .field("on_tier_loaded", &self.on_tier_loaded.is_some())
            .field("on_ready", &self.on_ready.is_some())
            .finish()
    }
}
