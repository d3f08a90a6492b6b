//! LOD switch tracking.
//!
//! [`LodTracker`] is the registry of every LOD group currently in the world.
//! The render loop calls [`LodTracker::update`] once per frame with the
//! viewer position; the tracker re-selects each group's tier and reports the
//! groups whose active tier changed.
//!
//! Transition bookkeeping lives in the tracker's own side table keyed by
//! [`LodId`], not on the groups. The tracker is cheap to clone and all clones
//! share the same registry, so the loader can register groups from its own
//! task while the render thread drives updates.

use std::sync::Arc;

use glam::Vec3;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::errors::EvaluationError;
use crate::lod::group::{LodHandle, LodId};

/// A change of active tier on one LOD group.
#[derive(Debug, Clone, PartialEq)]
pub struct LodTransition {
    pub lod: LodId,
    pub name: String,
    /// Previously active tier, `None` on the group's first evaluation.
    pub previous: Option<usize>,
    pub current: usize,
    /// Viewer distance that triggered the switch.
    pub distance: f32,
}

#[derive(Debug, Default, Clone, Copy)]
struct TrackedState {
    active: Option<usize>,
    switches: u64,
    faulted: bool,
}

#[derive(Default)]
struct Registry {
    entries: Vec<LodHandle>,
    states: FxHashMap<LodId, TrackedState>,
    subscribers: Vec<flume::Sender<LodTransition>>,
}

#[derive(Default)]
struct Shared {
    registry: Mutex<Registry>,
    /// Serializes `update` passes; the registry itself is not held while
    /// groups are evaluated.
    updating: Mutex<()>,
}

/// Registry of LOD groups evaluated every frame.
#[derive(Clone, Default)]
pub struct LodTracker {
    inner: Arc<Shared>,
}

impl LodTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `lod` to the registry with no active tier.
    ///
    /// Returns `false` (and changes nothing) if it was already registered.
    pub fn register(&self, lod: &LodHandle) -> bool {
        let mut registry = self.inner.registry.lock();
        if registry.states.contains_key(&lod.id()) {
            return false;
        }
        registry.states.insert(lod.id(), TrackedState::default());
        registry.entries.push(lod.clone());
        log::debug!("Tracking {} '{}'", lod.id(), lod.read().node.name);
        true
    }

    /// Removes `lod` from the registry. The group itself is left untouched.
    ///
    /// Returns `false` if it was not registered.
    pub fn unregister(&self, lod: &LodHandle) -> bool {
        let mut registry = self.inner.registry.lock();
        Self::remove_entry(&mut registry, lod.id())
    }

    /// Unregisters `lod` and disposes it, releasing every level.
    pub fn dispose(&self, lod: &LodHandle) -> bool {
        let was_registered = self.unregister(lod);
        let disposed = lod.dispose();
        was_registered || disposed
    }

    fn remove_entry(registry: &mut Registry, id: LodId) -> bool {
        if registry.states.remove(&id).is_none() {
            return false;
        }
        registry.entries.retain(|entry| entry.id() != id);
        true
    }

    #[must_use]
    pub fn contains(&self, lod: &LodHandle) -> bool {
        self.inner.registry.lock().states.contains_key(&lod.id())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.registry.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.registry.lock().entries.is_empty()
    }

    /// Tier the tracker last activated for `lod`.
    #[must_use]
    pub fn active_level(&self, lod: &LodHandle) -> Option<usize> {
        self.inner.registry.lock().states.get(&lod.id()).and_then(|s| s.active)
    }

    /// Number of transitions reported for `lod` since registration.
    #[must_use]
    pub fn switch_count(&self, lod: &LodHandle) -> u64 {
        self.inner.registry.lock().states.get(&lod.id()).map_or(0, |s| s.switches)
    }

    /// Returns a channel receiving every future transition.
    ///
    /// Dropping the receiver unsubscribes it.
    #[must_use]
    pub fn subscribe(&self) -> flume::Receiver<LodTransition> {
        let (tx, rx) = flume::unbounded();
        self.inner.registry.lock().subscribers.push(tx);
        rx
    }

    /// Re-selects the active tier of every registered group for a viewer at
    /// `viewer` and returns the transitions, in registration order.
    ///
    /// A group that cannot be evaluated is logged and skipped; it never
    /// prevents the other groups from being evaluated. Disposed groups are
    /// dropped from the registry. Groups are evaluated on a snapshot of the
    /// registry, so registration from other threads is never blocked by a
    /// group lock.
    pub fn update(&self, viewer: Vec3) -> Vec<LodTransition> {
        let _pass = self.inner.updating.lock();

        // Snapshot, then evaluate without blocking registration
        let snapshot: Vec<(LodHandle, TrackedState)> = {
            let registry = self.inner.registry.lock();
            registry
                .entries
                .iter()
                .map(|lod| {
                    let state = registry.states.get(&lod.id()).copied().unwrap_or_default();
                    (lod.clone(), state)
                })
                .collect()
        };

        let mut transitions = Vec::new();
        let mut disposed = Vec::new();
        let mut evaluated = Vec::with_capacity(snapshot.len());

        for (lod, mut state) in snapshot {
            match evaluate(&lod, &mut state, viewer) {
                Ok(transition) => {
                    if state.faulted {
                        log::info!("{} evaluates again", lod.id());
                        state.faulted = false;
                    }
                    transitions.extend(transition);
                }
                Err(EvaluationError::Disposed) => {
                    disposed.push(lod.id());
                    continue;
                }
                Err(err) => {
                    if !state.faulted {
                        log::warn!("Skipping {} in LOD update: {err}", lod.id());
                        state.faulted = true;
                    }
                }
            }
            evaluated.push((lod.id(), state));
        }

        let mut guard = self.inner.registry.lock();
        let registry = &mut *guard;

        // Groups unregistered during the pass keep no state
        for (id, state) in evaluated {
            if let Some(slot) = registry.states.get_mut(&id) {
                *slot = state;
            }
        }

        for id in disposed {
            log::debug!("Dropping disposed {id} from the LOD registry");
            Self::remove_entry(registry, id);
        }

        if !transitions.is_empty() && !registry.subscribers.is_empty() {
            registry
                .subscribers
                .retain(|tx| transitions.iter().all(|t| tx.send(t.clone()).is_ok()));
        }

        transitions
    }
}

fn evaluate(
    lod: &LodHandle,
    state: &mut TrackedState,
    viewer: Vec3,
) -> Result<Option<LodTransition>, EvaluationError> {
    if lod.is_disposed() {
        return Err(EvaluationError::Disposed);
    }

    let mut group = lod.write();
    let distance = viewer.distance(group.world_position());
    if !distance.is_finite() {
        return Err(EvaluationError::NonFiniteDistance(distance));
    }

    let current = group.select(distance).ok_or(EvaluationError::NoLevels)?;
    if state.active == Some(current) {
        return Ok(None);
    }

    let previous = state.active.replace(current);
    state.switches += 1;
    group.show_only(current);

    log::debug!(
        "{} '{}': LOD {} -> {current} at distance {distance:.2}",
        lod.id(),
        group.node.name,
        previous.map_or_else(|| "none".to_string(), |p| p.to_string()),
    );

    Ok(Some(LodTransition {
        lod: lod.id(),
        name: group.node.name.to_string(),
        previous,
        current,
        distance,
    }))
}
