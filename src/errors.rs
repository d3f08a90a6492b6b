//! Error Types
//!
//! This module defines the error types used throughout the crate.
//!
//! # Overview
//!
//! The main error type [`Error`] covers all failure modes including:
//! - Invalid load configuration (empty level sets, undecidable base names)
//! - Asset fetching and parsing errors
//! - I/O, JSON and background task errors
//!
//! Per-node failures inside [`LodTracker::update`](crate::lod::LodTracker::update)
//! are reported as [`EvaluationError`] and never leave the update call.
//!
//! # Usage
//!
//! All public APIs return [`Result<T>`] which is an alias for `std::result::Result<T, Error>`.
//!
//! ```rust,ignore
//! use myth_lod::errors::Result;
//!
//! async fn spawn_ship(loader: &LodLoader<MyFetcher>) -> Result<()> {
//!     let load = loader.load_lod("ship_LOD0.glb", LoadOptions::default()).await?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The main error type for LOD loading.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// The load options were rejected before any fetch started.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    // ========================================================================
    // Asset Loading Errors
    // ========================================================================
    /// Fetching or parsing an asset failed.
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    // ========================================================================
    // I/O & Format Errors
    // ========================================================================
    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    // ========================================================================
    // Async & Platform Errors
    // ========================================================================
    /// A background task panicked or was aborted.
    #[error("Task join error: {0}")]
    TaskJoin(String),

    /// Feature not enabled.
    #[error("Feature not enabled: {0}")]
    FeatureNotEnabled(String),
}

/// Rejected load configuration. Raised synchronously, before any I/O.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("LOD level set must not be empty")]
    EmptyLevels,

    #[error("LOD level {index} has an invalid distance threshold: {distance}")]
    InvalidDistance { index: usize, distance: f32 },

    #[error("LOD level index {0} appears more than once")]
    DuplicateTier(usize),

    #[error("cannot derive a LOD base name from '{0}'")]
    UndecidableBaseName(String),
}

/// Asset fetching and parsing failures.
#[derive(Error, Debug)]
pub enum AssetError {
    /// The requested asset was not found.
    #[error("Asset not found: {0}")]
    NotFound(String),

    /// The asset bytes could not be parsed.
    #[error("Invalid asset format: {0}")]
    Format(String),

    /// Transport-level fetch failure.
    #[error("Failed to fetch '{url}': {reason}")]
    Fetch { url: String, reason: String },

    /// HTTP response error with status code.
    #[error("HTTP response error for '{url}': status {status}")]
    HttpStatus { url: String, status: u16 },
}

/// Failure evaluating a single registered LOD node during a tracker update.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    #[error("LOD node has no loaded levels")]
    NoLevels,

    #[error("LOD node was disposed while still registered")]
    Disposed,

    #[error("distance to LOD node is not finite ({0})")]
    NonFiniteDistance(f32),
}

// ============================================================================
// Convenient conversion implementations
// ============================================================================

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::TaskJoin(err.to_string())
    }
}

/// Alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
