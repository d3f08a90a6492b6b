//! Shared test fixtures: a scripted in-memory fetcher.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock};

use glam::Vec3;
use myth_lod::assets::{AssetFetcher, AssetServer, Mesh, Model, ModelData};
use myth_lod::errors::{AssetError, Error, Result};
use parking_lot::Mutex;
use tokio::sync::Notify;

/// Test logger: forwards to `env_logger` and keeps every warning and error.
struct CaptureLogger {
    inner: env_logger::Logger,
    captured: Mutex<Vec<(log::Level, String)>>,
}

impl log::Log for CaptureLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::Level::Warn || self.inner.enabled(metadata)
    }

    fn log(&self, record: &log::Record) {
        if record.level() <= log::Level::Warn {
            self.captured
                .lock()
                .push((record.level(), record.args().to_string()));
        }
        if self.inner.enabled(record.metadata()) {
            self.inner.log(record);
        }
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

static LOGGER: OnceLock<&'static CaptureLogger> = OnceLock::new();

pub fn init_logger() {
    LOGGER.get_or_init(|| {
        let inner = env_logger::Builder::from_default_env().is_test(true).build();
        let max_level = inner.filter().max(log::LevelFilter::Warn);
        let logger: &'static CaptureLogger = Box::leak(Box::new(CaptureLogger {
            inner,
            captured: Mutex::new(Vec::new()),
        }));
        if log::set_logger(logger).is_ok() {
            log::set_max_level(max_level);
        }
        logger
    });
}

/// Warnings logged so far whose message contains `needle`.
///
/// Tests in one binary share the logger, so match on something unique.
pub fn warnings_containing(needle: &str) -> Vec<String> {
    init_logger();
    LOGGER.get().map_or_else(Vec::new, |logger| {
        logger
            .captured
            .lock()
            .iter()
            .filter(|(level, message)| *level == log::Level::Warn && message.contains(needle))
            .map(|(_, message)| message.clone())
            .collect()
    })
}

/// Fetcher serving one single-mesh model per URL.
///
/// URLs can be made to fail, or held back until their gate is opened.
#[derive(Default)]
pub struct ScriptedFetcher {
    server: AssetServer,
    failing: Mutex<HashSet<String>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    requested: Mutex<Vec<String>>,
    after_fetch: Mutex<HashMap<String, FetchHook>>,
}

type FetchHook = Arc<dyn Fn() + Send + Sync>;

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(self, url: &str) -> Self {
        self.failing.lock().insert(url.to_string());
        self
    }

    /// Holds fetches of `url` until the returned gate is notified.
    pub fn gate(&self, url: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates.lock().insert(url.to_string(), Arc::clone(&gate));
        gate
    }

    /// Runs `hook` once the fetch of `url` has produced its model.
    pub fn after_fetch(&self, url: &str, hook: impl Fn() + Send + Sync + 'static) {
        self.after_fetch.lock().insert(url.to_string(), Arc::new(hook));
    }

    /// URLs in the order their fetches started.
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().clone()
    }

    pub fn server(&self) -> &AssetServer {
        &self.server
    }
}

impl AssetFetcher for ScriptedFetcher {
    async fn fetch_and_parse(&self, url: &str) -> Result<Model> {
        self.requested.lock().push(url.to_string());

        let gate = self.gates.lock().get(url).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if self.failing.lock().contains(url) {
            return Err(Error::Asset(AssetError::NotFound(url.to_string())));
        }

        let data = ModelData {
            name: Some(url.to_string()),
            meshes: vec![Mesh {
                name: None,
                positions: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
                indices: vec![0, 1, 2],
            }],
        };
        let model = Model::from_data(&self.server, data, url);

        let hook = self.after_fetch.lock().get(url).cloned();
        if let Some(hook) = hook {
            hook();
        }
        Ok(model)
    }
}
