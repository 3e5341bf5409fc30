//! Rendition catalog and ladder selection.

use std::collections::HashSet;

use regex_lite::Regex;

use super::types::RenditionSpec;
use super::LadderError;

/// Ordered, validated set of candidate renditions, highest resolution first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenditionCatalog {
    entries: Vec<RenditionSpec>,
}

impl Default for RenditionCatalog {
    fn default() -> Self {
        Self {
            entries: default_renditions(),
        }
    }
}

/// The built-in four-rung catalog.
pub fn default_renditions() -> Vec<RenditionSpec> {
    vec![
        RenditionSpec::new("1080p", 1920, 1080, "5000k"),
        RenditionSpec::new("720p", 1280, 720, "2800k"),
        RenditionSpec::new("480p", 854, 480, "1400k"),
        RenditionSpec::new("360p", 640, 360, "800k"),
    ]
}

impl RenditionCatalog {
    /// Builds a catalog, rejecting empty, duplicate or malformed entries.
    pub fn new(entries: Vec<RenditionSpec>) -> Result<Self, LadderError> {
        if entries.is_empty() {
            return Err(LadderError::EmptyCatalog);
        }

        let bitrate = Regex::new(r"^\d+[kM]$").map_err(|e| LadderError::InvalidRendition {
            name: String::new(),
            reason: e.to_string(),
        })?;

        let mut seen = HashSet::new();
        for entry in &entries {
            if entry.name.trim().is_empty() {
                return Err(LadderError::InvalidRendition {
                    name: entry.name.clone(),
                    reason: "name must not be empty".to_string(),
                });
            }
            if entry.frame_size.width == 0 || entry.frame_size.height == 0 {
                return Err(LadderError::InvalidRendition {
                    name: entry.name.clone(),
                    reason: format!("invalid frame size {}", entry.frame_size),
                });
            }
            if !bitrate.is_match(&entry.video_bitrate) {
                return Err(LadderError::InvalidRendition {
                    name: entry.name.clone(),
                    reason: format!("invalid bitrate '{}'", entry.video_bitrate),
                });
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(LadderError::DuplicateRendition(entry.name.clone()));
            }
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[RenditionSpec] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Selects the renditions this catalog can produce for a source height.
    pub fn select(&self, source_height: u32) -> Vec<RenditionSpec> {
        select_ladder(&self.entries, source_height)
    }
}

/// Keeps every rendition whose frame height is at most `source_height`,
/// preserving catalog order. Never upscales.
pub fn select_ladder(catalog: &[RenditionSpec], source_height: u32) -> Vec<RenditionSpec> {
    catalog
        .iter()
        .filter(|spec| spec.height() <= source_height)
        .cloned()
        .collect()
}
