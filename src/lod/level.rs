//! LOD tier descriptors.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Configuration of one detail tier.
///
/// Tier 0 is the highest detail. `distance` is the viewer distance from which
/// this tier becomes the preferred representation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LodLevelDesc {
    pub index: usize,
    pub distance: f32,
    /// Target triangle ratio the tier was simplified to, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simplification_ratio: Option<f32>,
    /// Maximum simplification error the tier was built with, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simplification_error: Option<f32>,
}

impl LodLevelDesc {
    #[must_use]
    pub const fn new(index: usize, distance: f32) -> Self {
        Self {
            index,
            distance,
            simplification_ratio: None,
            simplification_error: None,
        }
    }

    #[must_use]
    pub fn with_simplification(mut self, ratio: f32, error: f32) -> Self {
        self.simplification_ratio = Some(ratio);
        self.simplification_error = Some(error);
        self
    }
}

/// The built-in three tier set: thresholds 0, 10 and 20.
pub const DEFAULT_LEVELS: [LodLevelDesc; 3] = [
    LodLevelDesc::new(0, 0.0),
    LodLevelDesc::new(1, 10.0),
    LodLevelDesc::new(2, 20.0),
];

#[must_use]
pub fn default_levels() -> Vec<LodLevelDesc> {
    DEFAULT_LEVELS.to_vec()
}

/// Checks that a level set can be loaded.
///
/// The set must be non-empty, every distance finite and non-negative, and
/// every tier index unique.
pub fn validate_levels(levels: &[LodLevelDesc]) -> Result<(), ConfigError> {
    if levels.is_empty() {
        return Err(ConfigError::EmptyLevels);
    }

    let mut seen = FxHashSet::default();
    for level in levels {
        if !level.distance.is_finite() || level.distance < 0.0 {
            return Err(ConfigError::InvalidDistance {
                index: level.index,
                distance: level.distance,
            });
        }
        if !seen.insert(level.index) {
            return Err(ConfigError::DuplicateTier(level.index));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_levels() {
        let levels = default_levels();
        assert_eq!(levels.len(), 3);
        assert_eq!(levels[0], LodLevelDesc::new(0, 0.0));
        assert_eq!(levels[2].distance, 20.0);
        assert!(validate_levels(&levels).is_ok());
    }

    #[test]
    fn test_empty_levels_rejected() {
        assert_eq!(validate_levels(&[]), Err(ConfigError::EmptyLevels));
    }

    #[test]
    fn test_invalid_distance_rejected() {
        let levels = [LodLevelDesc::new(0, 0.0), LodLevelDesc::new(1, f32::NAN)];
        assert!(matches!(
            validate_levels(&levels),
            Err(ConfigError::InvalidDistance { index: 1, .. })
        ));

        let negative = [LodLevelDesc::new(0, -1.0)];
        assert!(validate_levels(&negative).is_err());
    }

    #[test]
    fn test_duplicate_tier_rejected() {
        let levels = [LodLevelDesc::new(1, 0.0), LodLevelDesc::new(1, 5.0)];
        assert_eq!(validate_levels(&levels), Err(ConfigError::DuplicateTier(1)));
    }

    #[test]
    fn test_deserialize_without_simplification() {
        let level: LodLevelDesc = serde_json::from_str(r#"{"index": 2, "distance": 40}"#).unwrap();
        assert_eq!(level, LodLevelDesc::new(2, 40.0));

        let level: LodLevelDesc = serde_json::from_str(
            r#"{"index": 1, "distance": 10, "simplification_ratio": 0.5, "simplification_error": 0.01}"#,
        )
        .unwrap();
        assert_eq!(level.simplification_ratio, Some(0.5));
    }
}
