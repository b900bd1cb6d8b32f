//! Ground-truth label lookup, joined onto metadata records by tile id.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// Read-only mapping from tile identifier to label, built once before any
/// shard is processed.
#[derive(Debug, Default)]
pub struct LabelIndex {
    labels: HashMap<String, String>,
}

impl LabelIndex {
    /// Build the index from a two-column `id,label` CSV.
    ///
    /// `None` (or a path that does not exist) yields an empty index: the run
    /// proceeds and every metadata record's label is null. A leading
    /// `id,label` header row and lines without a comma are skipped.
    pub fn load(source: Option<&Path>) -> Result<Self> {
        let Some(path) = source else {
            info!("no label source configured, labels will be null");
            return Ok(Self::default());
        };

        if !path.exists() {
            warn!(path = %path.display(), "label source not found, labels will be null");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read label source {}", path.display()))?;

        let mut labels = HashMap::new();
        for (line_no, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Some((id, label)) = line.split_once(',') else {
                warn!(line = line_no + 1, "label line has no comma, skipping");
                continue;
            };
            let (id, label) = (id.trim(), label.trim());
            if line_no == 0 && id.eq_ignore_ascii_case("id") && label.eq_ignore_ascii_case("label")
            {
                continue;
            }
            labels.insert(id.to_string(), label.to_string());
        }

        info!(count = labels.len(), path = %path.display(), "label index loaded");
        Ok(Self { labels })
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.labels.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
