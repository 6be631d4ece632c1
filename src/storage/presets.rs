//! Saved crop/page region pairs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::imaging::PixelRect;

/// A named pair of regions for the batch cropper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionPreset {
    /// Preset name
    pub name: String,
    /// Region kept in the output image
    pub crop: PixelRect,
    /// Region holding the page number
    pub page: PixelRect,
}

/// Default location of the preset file
pub fn presets_path() -> Result<PathBuf> {
    Ok(super::get_data_dir()?.join("presets.json"))
}

/// Load presets; a missing file is an empty list
pub fn load_presets(path: &Path) -> Result<Vec<RegionPreset>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read presets from {}", path.display()))?;
    let presets: Vec<RegionPreset> = serde_json::from_str(&content)
        .with_context(|| format!("Invalid preset file {}", path.display()))?;
    Ok(presets)
}

/// Save presets
pub fn save_presets(presets: &[RegionPreset], path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(presets)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn find_preset<'a>(presets: &'a [RegionPreset], name: &str) -> Option<&'a RegionPreset> {
    presets.iter().find(|p| p.name == name)
}

/// Insert a preset, replacing any existing preset with the same name
pub fn upsert_preset(presets: &mut Vec<RegionPreset>, preset: RegionPreset) {
    if let Some(existing) = presets.iter_mut().find(|p| p.name == preset.name) {
        *existing = preset;
    } else {
        presets.push(preset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preset(name: &str, x: u32) -> RegionPreset {
        RegionPreset {
            name: name.to_string(),
            crop: PixelRect::new(x, 0, 100, 100),
            page: PixelRect::new(0, 0, 20, 20),
        }
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let presets = load_presets(&dir.path().join("presets.json")).unwrap();
        assert!(presets.is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("presets.json");
        save_presets(&[preset("book", 5)], &path).unwrap();

        let loaded = load_presets(&path).unwrap();
        assert_eq!(loaded, vec![preset("book", 5)]);
        assert_eq!(find_preset(&loaded, "book").unwrap().crop.x, 5);
        assert!(find_preset(&loaded, "other").is_none());
    }

    #[test]
    fn test_upsert_replaces_by_name() {
        let mut presets = vec![preset("a", 1), preset("b", 2)];
        upsert_preset(&mut presets, preset("a", 9));
        upsert_preset(&mut presets, preset("c", 3));

        assert_eq!(presets.len(), 3);
        assert_eq!(find_preset(&presets, "a").unwrap().crop.x, 9);
    }

    #[test]
    fn test_invalid_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("presets.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(load_presets(&path).is_err());
    }
}
