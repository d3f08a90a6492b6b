//! Level-of-detail loading and switching.
//!
//! - [`LodLoader`]: progressive and all-at-once loading of tiered assets
//! - [`LodGroup`] / [`LodHandle`]: the composite node holding loaded tiers
//! - [`LodTracker`]: per-frame distance-based tier selection
//! - [`LodLevelDesc`]: tier configuration

pub mod group;
pub mod level;
pub mod loader;
pub mod naming;
pub mod options;
pub mod tracker;

pub use group::{LodGroup, LodHandle, LodId, LodLevel, WeakLodHandle};
pub use level::{DEFAULT_LEVELS, LodLevelDesc, default_levels, validate_levels};
pub use loader::{BackgroundLoad, BackgroundReport, LodLoad, LodLoader};
pub use naming::TierNaming;
pub use options::{LoadOptions, ReadyCallback, TierLoadedCallback, TierProgress};
pub use tracker::{LodTracker, LodTransition};
