//! Tier file naming: `<base>_LOD<N>.<ext>`.

use crate::errors::ConfigError;

/// Base name and extension shared by every tier of one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierNaming {
    base: String,
    extension: String,
    /// `?query` / `#fragment` carried over to every tier URL.
    suffix: String,
}

impl TierNaming {
    /// Derives the naming scheme from a tier URL.
    ///
    /// `models/ship_LOD0.glb` yields base `models/ship` and extension `glb`.
    /// A URL without a tier suffix (`models/ship.glb`) uses its stem as base.
    /// An explicit `base_name` wins over the derived one; the extension still
    /// comes from `url`, or `default_extension` when `url` has none.
    /// A query string or fragment on `url` is kept on every tier URL.
    pub fn resolve(
        url: &str,
        base_name: Option<&str>,
        default_extension: &str,
    ) -> Result<Self, ConfigError> {
        let undecidable = || ConfigError::UndecidableBaseName(url.to_string());

        let (path, suffix) = url.split_at(url.find(['?', '#']).unwrap_or(url.len()));
        let (dir, file) = match path.rfind('/') {
            Some(pos) => path.split_at(pos + 1),
            None => ("", path),
        };
        let (stem, extension) = match file.rfind('.') {
            Some(pos) if pos > 0 && pos + 1 < file.len() => (&file[..pos], Some(&file[pos + 1..])),
            _ => (file, None),
        };

        if let Some(base) = base_name.map(str::trim) {
            if base.is_empty() {
                return Err(undecidable());
            }
            return Ok(Self {
                base: base.to_string(),
                extension: extension.unwrap_or(default_extension).to_string(),
                suffix: suffix.to_string(),
            });
        }

        let extension = extension.ok_or_else(undecidable)?;
        let stem = split_tier_suffix(stem).map_or(stem, |(base, _)| base);
        if stem.is_empty() {
            return Err(undecidable());
        }

        Ok(Self {
            base: format!("{dir}{stem}"),
            extension: extension.to_string(),
            suffix: suffix.to_string(),
        })
    }

    #[inline]
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    #[inline]
    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// URL of tier `index`.
    #[must_use]
    pub fn tier_url(&self, index: usize) -> String {
        format!("{}_LOD{index}.{}{}", self.base, self.extension, self.suffix)
    }
}

/// Splits `ship_LOD2` into (`ship`, 2). The `_LOD` marker is case-insensitive.
#[must_use]
pub fn split_tier_suffix(stem: &str) -> Option<(&str, usize)> {
    let pos = stem.to_ascii_uppercase().rfind("_LOD")?;
    let digits = &stem[pos + 4..];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((&stem[..pos], digits.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_tier_suffix() {
        let naming = TierNaming::resolve("models/ship_LOD0.glb", None, "glb").unwrap();
        assert_eq!(naming.base(), "models/ship");
        assert_eq!(naming.extension(), "glb");
        assert_eq!(naming.tier_url(2), "models/ship_LOD2.glb");
    }

    #[test]
    fn test_plain_file_uses_stem() {
        let naming = TierNaming::resolve("https://cdn.example.com/a/rock.gltf", None, "glb").unwrap();
        assert_eq!(naming.tier_url(1), "https://cdn.example.com/a/rock_LOD1.gltf");
    }

    #[test]
    fn test_query_and_fragment_are_kept() {
        let naming =
            TierNaming::resolve("https://cdn.example.com/m/ship_LOD0.glb?v=1.2", None, "glb").unwrap();
        assert_eq!(naming.base(), "https://cdn.example.com/m/ship");
        assert_eq!(naming.extension(), "glb");
        assert_eq!(naming.tier_url(1), "https://cdn.example.com/m/ship_LOD1.glb?v=1.2");

        let naming =
            TierNaming::resolve("https://cdn.example.com/m/ship_LOD0.glb?dir=a/b", None, "glb").unwrap();
        assert_eq!(naming.tier_url(2), "https://cdn.example.com/m/ship_LOD2.glb?dir=a/b");

        let naming = TierNaming::resolve("models/rock.gltf#scene0", None, "glb").unwrap();
        assert_eq!(naming.tier_url(0), "models/rock_LOD0.gltf#scene0");

        let naming = TierNaming::resolve("preview.glb?token=x.y", Some("hq/tree"), "glb").unwrap();
        assert_eq!(naming.tier_url(1), "hq/tree_LOD1.glb?token=x.y");

        assert_eq!(
            TierNaming::resolve("models/?v=1.2", None, "glb"),
            Err(ConfigError::UndecidableBaseName("models/?v=1.2".to_string()))
        );
    }

    #[test]
    fn test_base_name_override() {
        let naming = TierNaming::resolve("whatever_LOD3.json", Some("tree"), "glb").unwrap();
        assert_eq!(naming.tier_url(0), "tree_LOD0.json");

        let naming = TierNaming::resolve("", Some("tree"), "glb").unwrap();
        assert_eq!(naming.tier_url(0), "tree_LOD0.glb");
    }

    #[test]
    fn test_undecidable_base_names() {
        for url in ["", "models/", "_LOD0.glb", "noextension", ".glb"] {
            assert_eq!(
                TierNaming::resolve(url, None, "glb"),
                Err(ConfigError::UndecidableBaseName(url.to_string())),
                "url: {url:?}"
            );
        }
        assert!(TierNaming::resolve("ship.glb", Some("  "), "glb").is_err());
    }

    #[test]
    fn test_split_tier_suffix() {
        assert_eq!(split_tier_suffix("ship_LOD12"), Some(("ship", 12)));
        assert_eq!(split_tier_suffix("ship_lod1"), Some(("ship", 1)));
        assert_eq!(split_tier_suffix("ship_LOD"), None);
        assert_eq!(split_tier_suffix("ship_LODx"), None);
        assert_eq!(split_tier_suffix("ship"), None);
    }
}
