use parking_lot::{RwLock, RwLockReadGuard};
use slotmap::{Key, SlotMap};
use std::sync::Arc;

// Thread-safe container exposed to external consumers.
pub struct AssetStorage<H: Key, T> {
    inner: RwLock<SlotMap<H, Arc<T>>>,
}

impl<H: Key, T> Default for AssetStorage<H, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Key, T> AssetStorage<H, T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(SlotMap::with_key()),
        }
    }

    /// [Write] Adds a resource and returns a Handle.
    pub fn add(&self, asset: impl Into<T>) -> H {
        self.inner.write().insert(Arc::new(asset.into()))
    }

    /// [Write] Releases a resource. Stale handles are ignored.
    pub fn remove(&self, handle: H) -> Option<Arc<T>> {
        self.inner.write().remove(handle)
    }

    /// [Read] Gets a single resource.
    pub fn get(&self, handle: H) -> Option<Arc<T>> {
        self.inner.read().get(handle).cloned()
    }

    #[must_use]
    pub fn contains(&self, handle: H) -> bool {
        self.inner.read().contains_key(handle)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// [Read - Advanced] Acquires a read-lock guard for batch access.
    pub fn read_lock(&self) -> RwLockReadGuard<'_, SlotMap<H, Arc<T>>> {
        self.inner.read()
    }
}
