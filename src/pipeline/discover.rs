//! Input tile discovery.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use super::ImageItem;

/// Enumerate tiles in `dir` (non-recursive) with the given extension.
///
/// Filesystem listing order is not guaranteed, so items are sorted by id to
/// make shard assignment reproducible across runs. The id is the file stem.
pub fn discover_items(dir: &Path, extension: &str) -> Result<Vec<ImageItem>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read input directory {}", dir.display()))?;

    let mut items = Vec::new();
    for entry in entries {
        let entry = entry.context("failed to read directory entry")?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let matches_ext = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(extension));
        if !matches_ext {
            continue;
        }
        let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        items.push(ImageItem {
            id: id.to_string(),
            path,
        });
    }

    items.sort_by(|a, b| a.id.cmp(&b.id));
    info!(count = items.len(), dir = %dir.display(), "discovered input tiles");
    Ok(items)
}
