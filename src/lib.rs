//! Progressive level-of-detail model loading and runtime LOD switching.
//!
//! A LOD asset is a set of detail tiers named `<base>_LOD<N>.<ext>`, tier 0
//! being the most detailed. [`LodLoader`] shows the coarsest tier as soon as
//! it arrives and streams the finer tiers in behind it; [`LodTracker`] picks
//! the tier to display for each group from the viewer distance every frame.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod assets;
pub mod config;
pub mod errors;
pub mod lod;
pub mod scene;

pub use assets::{AssetFetcher, AssetServer, Model, ReaderFetcher};
pub use config::LodSettings;
pub use errors::{Error, Result};
pub use lod::{LoadOptions, LodGroup, LodHandle, LodLevelDesc, LodLoader, LodTracker, LodTransition};
pub use scene::{Node, Transform};
