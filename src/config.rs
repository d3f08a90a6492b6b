//! LOD Loading Configuration
//!
//! [`LodSettings`] holds the project-wide defaults applied to every load:
//! the tier set, whether loads are progressive, and the extension used when
//! a URL does not carry one. Settings are plain serde data and are usually
//! read from a JSON file shipped next to the assets.
//!
//! # Example
//!
//! ```rust,ignore
//! use myth_lod::config::LodSettings;
//! use myth_lod::lod::LoadOptions;
//!
//! let settings = LodSettings::from_json_str(r#"{
//!     "levels": [
//!         { "index": 0, "distance": 0 },
//!         { "index": 1, "distance": 25, "simplification_ratio": 0.5 },
//!         { "index": 2, "distance": 60, "simplification_ratio": 0.1 }
//!     ],
//!     "progressive": true
//! }"#)?;
//!
//! let options = LoadOptions::from_settings(&settings).with_uniform_scale(2.0);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::lod::level::{LodLevelDesc, default_levels, validate_levels};

/// Project-wide LOD defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LodSettings {
    pub levels: Vec<LodLevelDesc>,
    pub progressive: bool,
    pub default_extension: String,
}

impl Default for LodSettings {
    fn default() -> Self {
        Self {
            levels: default_levels(),
            progressive: true,
            default_extension: "glb".to_string(),
        }
    }
}

impl LodSettings {
    /// Parses and validates settings from JSON text. Missing fields keep their defaults.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads settings from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        validate_levels(&self.levels)?;
        Ok(())
    }
}
