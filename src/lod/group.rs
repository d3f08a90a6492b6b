//! Composite multi-tier node.
//!
//! A [`LodGroup`] owns every loaded tier of one logical asset as a list of
//! [`LodLevel`]s kept sorted by ascending distance threshold. At most one
//! level is visible at a time. Groups are shared between the loader's
//! background task and the render loop through [`LodHandle`].

use std::borrow::Cow;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use glam::Vec3;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::assets::Model;
use crate::lod::level::LodLevelDesc;
use crate::scene::Node;

static NEXT_LOD_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a LOD group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LodId(u64);

impl LodId {
    fn next() -> Self {
        Self(NEXT_LOD_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for LodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lod#{}", self.0)
    }
}

/// One inserted tier.
#[derive(Debug)]
pub struct LodLevel {
    pub tier: usize,
    pub distance: f32,
    pub simplification_ratio: Option<f32>,
    pub simplification_error: Option<f32>,
    pub model: Model,
}

/// Aggregate node holding all loaded tiers of one asset.
#[derive(Debug)]
pub struct LodGroup {
    pub node: Node,
    levels: Vec<LodLevel>,
}

impl LodGroup {
    #[must_use]
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            node: Node::new(name),
            levels: Vec::new(),
        }
    }

    /// Inserts `model` as tier `desc.index`, keeping levels sorted by distance.
    ///
    /// An existing level for the same tier is replaced and its model released.
    /// The first level of an empty group becomes visible; a replacement
    /// inherits the visibility of the level it replaces; any other new level
    /// starts hidden until the tracker selects it.
    ///
    /// Returns `true` if an existing level was replaced.
    pub fn insert_level(&mut self, desc: &LodLevelDesc, mut model: Model) -> bool {
        let replaced = self.take_level(desc.index);
        let replaced_visible = replaced.as_ref().is_some_and(|l| l.model.node.visible);

        model.node.visible = self.levels.is_empty() || replaced_visible;

        // Equal thresholds keep insertion order
        let at = self.levels.partition_point(|l| l.distance <= desc.distance);
        self.levels.insert(
            at,
            LodLevel {
                tier: desc.index,
                distance: desc.distance,
                simplification_ratio: desc.simplification_ratio,
                simplification_error: desc.simplification_error,
                model,
            },
        );

        if let Some(mut old) = replaced {
            old.model.release();
            return true;
        }
        false
    }

    /// Removes tier `tier`, releasing its model.
    pub fn remove_level(&mut self, tier: usize) -> bool {
        match self.take_level(tier) {
            Some(mut level) => {
                level.model.release();
                true
            }
            None => false,
        }
    }

    /// Removes every level, releasing their models. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let count = self.levels.len();
        for mut level in self.levels.drain(..) {
            level.model.release();
        }
        count
    }

    fn take_level(&mut self, tier: usize) -> Option<LodLevel> {
        let pos = self.levels.iter().position(|l| l.tier == tier)?;
        Some(self.levels.remove(pos))
    }

    /// Levels in ascending distance order.
    #[inline]
    #[must_use]
    pub fn levels(&self) -> &[LodLevel] {
        &self.levels
    }

    #[must_use]
    pub fn level(&self, tier: usize) -> Option<&LodLevel> {
        self.levels.iter().find(|l| l.tier == tier)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Tier indices in ascending distance order.
    pub fn tiers(&self) -> impl Iterator<Item = usize> + '_ {
        self.levels.iter().map(|l| l.tier)
    }

    /// Picks the tier for a viewer at `distance`.
    ///
    /// The level with the greatest threshold `<= distance` wins, so a viewer
    /// exactly on a threshold gets that threshold's (coarser) tier. When no
    /// inserted level qualifies, the nearest-sorted level is used. Returns
    /// `None` only for an empty group.
    #[must_use]
    pub fn select(&self, distance: f32) -> Option<usize> {
        let first = self.levels.first()?;
        let chosen = self
            .levels
            .iter()
            .take_while(|l| l.distance <= distance)
            .last()
            .unwrap_or(first);
        Some(chosen.tier)
    }

    /// Makes tier `tier` the only visible level.
    pub fn show_only(&mut self, tier: usize) {
        for level in &mut self.levels {
            level.model.node.visible = level.tier == tier;
        }
    }

    /// The currently visible tier, if any.
    #[must_use]
    pub fn visible_tier(&self) -> Option<usize> {
        self.levels
            .iter()
            .find(|l| l.model.node.visible)
            .map(|l| l.tier)
    }

    /// Refreshes the group's world matrix and returns its world position.
    pub fn world_position(&mut self) -> Vec3 {
        self.node.sync_transform();
        self.node.transform.world_position()
    }
}

struct LodShared {
    id: LodId,
    group: RwLock<LodGroup>,
    disposed: AtomicBool,
}

/// Shared, thread-safe reference to a [`LodGroup`].
///
/// Cloning is cheap; all clones refer to the same group.
#[derive(Clone)]
pub struct LodHandle {
    inner: Arc<LodShared>,
}

impl LodHandle {
    #[must_use]
    pub fn new(group: LodGroup) -> Self {
        Self {
            inner: Arc::new(LodShared {
                id: LodId::next(),
                group: RwLock::new(group),
                disposed: AtomicBool::new(false),
            }),
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> LodId {
        self.inner.id
    }

    pub fn read(&self) -> RwLockReadGuard<'_, LodGroup> {
        self.inner.group.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, LodGroup> {
        self.inner.group.write()
    }

    /// Marks the group disposed and releases every level.
    ///
    /// Background loading for this group stops at its next checkpoint.
    /// Returns `false` if the group was already disposed.
    pub fn dispose(&self) -> bool {
        // The flag flips under the write lock so inserts can check it atomically
        let mut group = self.write();
        if self.inner.disposed.swap(true, Ordering::AcqRel) {
            return false;
        }
        let released = group.clear();
        drop(group);
        log::debug!("Disposed {} ({released} level(s) released)", self.id());
        true
    }

    /// Inserts a level unless the group has been disposed.
    ///
    /// Returns the level count after insertion, or hands `model` back when
    /// the group is disposed.
    pub fn insert_if_live(&self, desc: &LodLevelDesc, model: Model) -> Result<usize, Model> {
        let mut group = self.write();
        if self.is_disposed() {
            return Err(model);
        }
        group.insert_level(desc, model);
        Ok(group.len())
    }

    #[inline]
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn downgrade(&self) -> WeakLodHandle {
        WeakLodHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

impl fmt::Debug for LodHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LodHandle")
            .field("id", &self.inner.id)
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}

/// Non-owning reference held by background loaders.
#[derive(Clone)]
pub struct WeakLodHandle {
    inner: Weak<LodShared>,
}

impl WeakLodHandle {
    /// Returns the group if it is still alive and not disposed.
    #[must_use]
    pub fn upgrade(&self) -> Option<LodHandle> {
        let handle = LodHandle {
            inner: self.inner.upgrade()?,
        };
        (!handle.is_disposed()).then_some(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetServer, Mesh, ModelData};

    fn model(name: &str) -> Model {
        Model::new(name, format!("{name}.glb"))
    }

    fn group_with(thresholds: &[(usize, f32)]) -> LodGroup {
        let mut group = LodGroup::new("test");
        for &(tier, distance) in thresholds {
            group.insert_level(&LodLevelDesc::new(tier, distance), model(&format!("t{tier}")));
        }
        group
    }

    #[test]
    fn test_levels_stay_sorted() {
        let group = group_with(&[(2, 20.0), (0, 0.0), (1, 10.0)]);
        let distances: Vec<f32> = group.levels().iter().map(|l| l.distance).collect();
        assert_eq!(distances, vec![0.0, 10.0, 20.0]);
        assert_eq!(group.tiers().collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn test_first_level_visible_others_hidden() {
        let group = group_with(&[(2, 20.0), (0, 0.0)]);
        assert_eq!(group.visible_tier(), Some(2));
        assert!(!group.level(0).unwrap().model.node.visible);
    }

    #[test]
    fn test_select_greatest_threshold_not_exceeding_distance() {
        let group = group_with(&[(0, 0.0), (1, 10.0), (2, 20.0)]);
        assert_eq!(group.select(5.0), Some(0));
        assert_eq!(group.select(15.0), Some(1));
        assert_eq!(group.select(25.0), Some(2));
    }

    #[test]
    fn test_select_exact_threshold_picks_coarser_tier() {
        let group = group_with(&[(0, 0.0), (1, 10.0), (2, 20.0)]);
        assert_eq!(group.select(10.0), Some(1));
        assert_eq!(group.select(20.0), Some(2));
        assert_eq!(group.select(0.0), Some(0));
    }

    #[test]
    fn test_select_falls_back_to_nearest_available() {
        // Only the coarsest tier loaded so far
        let group = group_with(&[(2, 20.0)]);
        assert_eq!(group.select(1.0), Some(2));

        // Tier 1 still loading
        let group = group_with(&[(0, 0.0), (2, 20.0)]);
        assert_eq!(group.select(15.0), Some(0));

        assert_eq!(LodGroup::new("empty").select(3.0), None);
    }

    #[test]
    fn test_show_only() {
        let mut group = group_with(&[(0, 0.0), (1, 10.0), (2, 20.0)]);
        group.show_only(1);
        assert_eq!(group.visible_tier(), Some(1));
        assert_eq!(group.levels().iter().filter(|l| l.model.node.visible).count(), 1);
    }

    #[test]
    fn test_replace_releases_previous_model() {
        let server = AssetServer::new();
        let data = || ModelData {
            name: None,
            meshes: vec![Mesh::default()],
        };

        let mut group = LodGroup::new("ship");
        group.insert_level(&LodLevelDesc::new(0, 0.0), Model::from_data(&server, data(), "a"));
        let old_handle = group.level(0).unwrap().model.meshes()[0];

        let replaced =
            group.insert_level(&LodLevelDesc::new(0, 0.0), Model::from_data(&server, data(), "b"));
        assert!(replaced);
        assert_eq!(group.len(), 1);
        assert!(!server.meshes.contains(old_handle));
        assert_eq!(server.meshes.len(), 1);
        assert_eq!(group.visible_tier(), Some(0));
    }

    #[test]
    fn test_remove_and_clear() {
        let mut group = group_with(&[(0, 0.0), (1, 10.0), (2, 20.0)]);
        assert!(group.remove_level(1));
        assert!(!group.remove_level(1));
        assert_eq!(group.clear(), 2);
        assert!(group.is_empty());
    }

    #[test]
    fn test_world_position_follows_transform() {
        let mut group = LodGroup::new("moved");
        group.node.transform.position = Vec3::new(3.0, 0.0, 4.0);
        assert!((group.world_position() - Vec3::new(3.0, 0.0, 4.0)).length() < 1e-6);
    }

    #[test]
    fn test_dispose_handle() {
        let handle = LodHandle::new(group_with(&[(0, 0.0), (1, 10.0)]));
        let weak = handle.downgrade();
        assert!(weak.upgrade().is_some());

        assert!(handle.dispose());
        assert!(!handle.dispose());
        assert!(handle.read().is_empty());
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_insert_after_dispose_is_refused() {
        let server = AssetServer::new();
        let handle = LodHandle::new(group_with(&[(2, 20.0)]));
        handle.dispose();

        let model = Model::from_data(
            &server,
            ModelData {
                name: None,
                meshes: vec![Mesh::default()],
            },
            "late",
        );
        let refused = handle.insert_if_live(&LodLevelDesc::new(0, 0.0), model).unwrap_err();
        assert!(handle.read().is_empty());

        drop(refused);
        assert!(server.meshes.is_empty());
    }

    #[test]
    fn test_dispose_waits_for_in_flight_insert() {
        let handle = LodHandle::new(group_with(&[(2, 20.0)]));
        let guard = handle.write();

        let disposer = {
            let handle = handle.clone();
            std::thread::spawn(move || handle.dispose())
        };
        std::thread::sleep(std::time::Duration::from_millis(50));
        // Still blocked on the lock, so an insert holding it sees a live group
        assert!(!handle.is_disposed());
        drop(guard);

        assert!(disposer.join().unwrap());
        assert!(handle.is_disposed());
        assert_eq!(
            handle.insert_if_live(&LodLevelDesc::new(0, 0.0), model("t0")).map_err(|_| ()),
            Err(())
        );
        assert!(handle.read().is_empty());
    }

    #[test]
    fn test_insert_if_live() {
        let handle = LodHandle::new(group_with(&[(2, 20.0)]));
        assert_eq!(
            handle.insert_if_live(&LodLevelDesc::new(0, 0.0), model("t0")).map_err(|_| ()),
            Ok(2)
        );
    }

    #[test]
    fn test_ids_are_unique() {
        let a = LodHandle::new(LodGroup::new("a"));
        let b = LodHandle::new(LodGroup::new("b"));
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone().id(), a.id());
    }
}
