//! Progressive LOD loading.
//!
//! [`LodLoader::load_progressive`] awaits only the coarsest tier, hands back a
//! usable [`LodHandle`] and keeps fetching the finer tiers on a background
//! task. Background tiers are fetched one at a time, highest detail first, and
//! inserted into the group as each arrives. A tier that fails to load is
//! logged and skipped.
//!
//! ```rust,ignore
//! let tracker = LodTracker::new();
//! let loader = LodLoader::new(ReaderFetcher::json("assets/", AssetServer::new())?, tracker.clone());
//!
//! let load = loader.load_lod("ship_LOD0.json", LoadOptions::default()).await?;
//! scene_root.push(load.lod.clone());
//!
//! // Every frame
//! for transition in tracker.update(camera_position) {
//!     log::info!("{} switched to LOD{}", transition.name, transition.current);
//! }
//! ```

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::assets::{AssetFetcher, Model, asset_runtime};
use crate::errors::{ConfigError, Result};
use crate::lod::group::{LodGroup, LodHandle, LodId, WeakLodHandle};
use crate::lod::level::{LodLevelDesc, validate_levels};
use crate::lod::naming::TierNaming;
use crate::lod::options::{LoadOptions, ReadyCallback, TierLoadedCallback, TierProgress};
use crate::lod::tracker::LodTracker;

/// Outcome of a background tier load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackgroundReport {
    /// Tiers inserted, in insertion order.
    pub loaded: Vec<usize>,
    /// Tiers that failed, with the failure message.
    pub failed: Vec<(usize, String)>,
    /// The group was disposed or dropped before every tier was attempted.
    pub cancelled: bool,
}

impl BackgroundReport {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && !self.cancelled
    }
}

/// Handle to the task loading the remaining tiers of one group.
///
/// Dropping it detaches the task; loading continues.
#[derive(Debug)]
pub struct BackgroundLoad {
    lod: LodId,
    task: JoinHandle<BackgroundReport>,
}

impl BackgroundLoad {
    #[inline]
    #[must_use]
    pub fn lod(&self) -> LodId {
        self.lod
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for every remaining tier to be attempted.
    pub async fn finish(self) -> Result<BackgroundReport> {
        Ok(self.task.await?)
    }

    /// Blocking variant of [`finish`](Self::finish). Must not be called from
    /// inside an async context.
    pub fn wait(self) -> Result<BackgroundReport> {
        futures::executor::block_on(self.finish())
    }

    /// Aborts the task, dropping any in-flight fetch.
    pub fn abort(&self) {
        self.task.abort();
    }
}

/// Result of a LOD load.
#[derive(Debug)]
pub struct LodLoad {
    pub lod: LodHandle,
    /// Present while finer tiers are still being loaded.
    pub background: Option<BackgroundLoad>,
}

#[derive(Debug, Clone)]
struct PlannedTier {
    desc: LodLevelDesc,
    url: String,
}

/// Validated tier list with resolved URLs, in configuration order.
#[derive(Debug)]
struct TierPlan {
    name: String,
    tiers: Vec<PlannedTier>,
}

impl TierPlan {
    fn new(url: &str, options: &LoadOptions) -> std::result::Result<Self, ConfigError> {
        validate_levels(&options.levels)?;
        let naming = TierNaming::resolve(
            url,
            options.base_name.as_deref(),
            &options.default_extension,
        )?;

        let name = options.name.clone().unwrap_or_else(|| {
            let base = naming.base();
            base.rsplit('/').next().unwrap_or(base).to_string()
        });
        let tiers = options
            .levels
            .iter()
            .map(|desc| PlannedTier {
                desc: *desc,
                url: naming.tier_url(desc.index),
            })
            .collect();

        Ok(Self { name, tiers })
    }

    /// Splits off the coarsest tier (the last configured one); the rest are
    /// returned highest detail first.
    fn split_lowest(mut self) -> Option<(String, PlannedTier, Vec<PlannedTier>)> {
        let lowest = self.tiers.pop()?;
        self.tiers.sort_by_key(|tier| tier.desc.index);
        Some((self.name, lowest, self.tiers))
    }
}

struct LoadHooks {
    on_tier_loaded: Option<TierLoadedCallback>,
    on_ready: Option<ReadyCallback>,
}

/// Loads single models and multi-tier LOD groups through an [`AssetFetcher`].
///
/// Groups produced by LOD loads are registered with the loader's tracker.
pub struct LodLoader<F> {
    fetcher: Arc<F>,
    tracker: LodTracker,
    runtime: Handle,
}

impl<F: AssetFetcher> LodLoader<F> {
    /// Creates a loader spawning background work on the current tokio
    /// runtime, or on the shared asset runtime when called outside one.
    pub fn new(fetcher: F, tracker: LodTracker) -> Self {
        Self::from_shared(Arc::new(fetcher), tracker)
    }

    pub fn from_shared(fetcher: Arc<F>, tracker: LodTracker) -> Self {
        let runtime = Handle::try_current().unwrap_or_else(|_| asset_runtime().handle().clone());
        Self {
            fetcher,
            tracker,
            runtime,
        }
    }

    /// Spawns background loads on `runtime` instead.
    #[must_use]
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = runtime;
        self
    }

    #[inline]
    #[must_use]
    pub fn tracker(&self) -> &LodTracker {
        &self.tracker
    }

    #[inline]
    #[must_use]
    pub fn fetcher(&self) -> &Arc<F> {
        &self.fetcher
    }

    /// Loads a single model with the configured transform. Not tracked.
    pub async fn load(&self, url: &str, options: &LoadOptions) -> Result<Model> {
        let mut model = self.fetcher.fetch_and_parse(url).await?;
        options.apply_transform(&mut model.node);
        if let Some(name) = &options.name {
            model.node.name = name.clone().into();
        }
        Ok(model)
    }

    /// Loads a LOD group, progressively unless `options.progressive` is off.
    pub async fn load_lod(&self, url: &str, options: LoadOptions) -> Result<LodLoad> {
        if options.progressive {
            self.load_progressive(url, options).await
        } else {
            self.load_all(url, options).await
        }
    }

    /// Blocking variant of [`load_lod`](Self::load_lod), driven by the shared
    /// asset runtime. Must not be called from inside an async context.
    pub fn load_lod_blocking(&self, url: &str, options: LoadOptions) -> Result<LodLoad> {
        asset_runtime().block_on(self.load_lod(url, options))
    }

    /// Loads the coarsest tier, returns the group, and loads the other tiers
    /// in the background.
    ///
    /// Fails only if the configuration is invalid or the coarsest tier cannot
    /// be loaded.
    pub async fn load_progressive(&self, url: &str, options: LoadOptions) -> Result<LodLoad> {
        let plan = TierPlan::new(url, &options)?;
        let total = plan.tiers.len();
        let (name, lowest, remaining) = plan.split_lowest().ok_or(ConfigError::EmptyLevels)?;

        log::debug!("Loading '{name}': LOD{} first", lowest.desc.index);
        let model = self.fetcher.fetch_and_parse(&lowest.url).await?;

        let lod = self.new_group(&name, &options);
        lod.write().insert_level(&lowest.desc, model);
        self.tracker.register(&lod);

        let hooks = LoadHooks {
            on_tier_loaded: options.on_tier_loaded,
            on_ready: options.on_ready,
        };

        if remaining.is_empty() {
            log::info!("LOD '{name}' loaded (1 tier)");
            if let Some(on_ready) = &hooks.on_ready {
                on_ready(&lod);
            }
            return Ok(LodLoad {
                lod,
                background: None,
            });
        }

        let task = load_remaining_tiers(
            Arc::clone(&self.fetcher),
            lod.downgrade(),
            name,
            remaining,
            total,
            hooks,
        );
        let background = BackgroundLoad {
            lod: lod.id(),
            task: self.runtime.spawn(task),
        };

        Ok(LodLoad {
            lod,
            background: Some(background),
        })
    }

    /// Fetches every tier concurrently and returns once all are inserted.
    ///
    /// Any tier failure fails the whole load.
    pub async fn load_all(&self, url: &str, options: LoadOptions) -> Result<LodLoad> {
        let plan = TierPlan::new(url, &options)?;
        log::debug!("Loading '{}': {} tier(s) at once", plan.name, plan.tiers.len());

        let fetches = plan
            .tiers
            .iter()
            .map(|tier| self.fetcher.fetch_and_parse(&tier.url));
        let models = futures::future::try_join_all(fetches).await?;

        let mut loaded: Vec<(&PlannedTier, Model)> = plan.tiers.iter().zip(models).collect();
        loaded.sort_by(|a, b| a.0.desc.distance.total_cmp(&b.0.desc.distance));

        let lod = self.new_group(&plan.name, &options);
        {
            let mut group = lod.write();
            for (tier, model) in loaded {
                group.insert_level(&tier.desc, model);
            }
        }
        self.tracker.register(&lod);

        log::info!("LOD '{}' loaded ({} tiers)", plan.name, plan.tiers.len());
        if let Some(on_ready) = &options.on_ready {
            on_ready(&lod);
        }

        Ok(LodLoad {
            lod,
            background: None,
        })
    }

    fn new_group(&self, name: &str, options: &LoadOptions) -> LodHandle {
        let mut group = LodGroup::new(name.to_string());
        options.apply_transform(&mut group.node);
        LodHandle::new(group)
    }
}

async fn load_remaining_tiers<F: AssetFetcher>(
    fetcher: Arc<F>,
    lod: WeakLodHandle,
    name: String,
    tiers: Vec<PlannedTier>,
    total: usize,
    hooks: LoadHooks,
) -> BackgroundReport {
    let mut report = BackgroundReport::default();

    for tier in tiers {
        if lod.upgrade().is_none() {
            report.cancelled = true;
            break;
        }

        let model = match fetcher.fetch_and_parse(&tier.url).await {
            Ok(model) => model,
            Err(err) => {
                log::warn!("Skipping LOD{} of '{name}' ({}): {err}", tier.desc.index, tier.url);
                report.failed.push((tier.desc.index, err.to_string()));
                continue;
            }
        };

        // Re-check: the group may have been disposed while fetching
        let Some(handle) = lod.upgrade() else {
            report.cancelled = true;
            break;
        };

        // Disposal can still land between the upgrade and the insert
        let Ok(loaded) = handle.insert_if_live(&tier.desc, model) else {
            report.cancelled = true;
            break;
        };
        report.loaded.push(tier.desc.index);

        let progress = TierProgress {
            lod: handle.id(),
            index: tier.desc.index,
            source: tier.url,
            message: format!("Loaded LOD{} of '{name}' ({loaded}/{total})", tier.desc.index),
            loaded,
            total,
        };
        log::debug!("{}", progress.message);
        if let Some(on_tier_loaded) = &hooks.on_tier_loaded {
            on_tier_loaded(&progress);
        }
    }

    if report.cancelled {
        log::debug!("Stopped loading '{name}': group disposed");
        return report;
    }

    log::info!(
        "LOD '{name}' loaded ({}/{} background tier(s), {} failed)",
        report.loaded.len(),
        report.loaded.len() + report.failed.len(),
        report.failed.len()
    );
    if let (Some(on_ready), Some(handle)) = (&hooks.on_ready, lod.upgrade()) {
        on_ready(&handle);
    }
    report
}
