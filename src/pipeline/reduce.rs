//! Master index reduction.
//!
//! After all shards complete, their metadata tables are concatenated into
//! one master JSONL index. The concatenation streams line by line — the
//! corpus is never materialized in memory — and preserves shard order then
//! intra-shard order, so re-running it over the same artifacts is
//! byte-for-byte idempotent.

use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use super::store::METADATA_SUFFIX;
use crate::error::PipelineError;

/// File name of the consolidated metadata index.
pub const MASTER_INDEX: &str = "master_index.jsonl";

/// List the per-shard metadata artifacts under `dir`, sorted by file name.
///
/// Shard names are zero-padded ordinals, so the sorted listing is exactly
/// the processing order.
pub fn collect_metadata_artifacts(dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    let fail = |message: String| PipelineError::Reduction {
        path: dir.to_path_buf(),
        message,
    };

    let entries = std::fs::read_dir(dir)
        .map_err(|e| fail(format!("failed to list output directory: {e}")))?;

    let mut artifacts = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| fail(format!("failed to read directory entry: {e}")))?;
        let path = entry.path();
        let is_metadata = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(METADATA_SUFFIX));
        if is_metadata {
            artifacts.push(path);
        }
    }

    artifacts.sort();
    Ok(artifacts)
}

/// Concatenate the given metadata artifacts, in order, into `dir/master_index.jsonl`.
///
/// Returns the master index path, or `None` when there are no artifacts to
/// reduce (zero input items, or every shard failed) — an informational
/// outcome, not an error.
pub fn reduce(artifacts: &[PathBuf], dir: &Path) -> Result<Option<PathBuf>, PipelineError> {
    if artifacts.is_empty() {
        info!("no shard metadata artifacts, master index not written");
        return Ok(None);
    }

    let dest = dir.join(MASTER_INDEX);
    let fail = |message: String| PipelineError::Reduction {
        path: dest.clone(),
        message,
    };

    let tmp = dir.join(format!("{MASTER_INDEX}.tmp"));
    let out = std::fs::File::create(&tmp)
        .map_err(|e| fail(format!("failed to create {}: {e}", tmp.display())))?;
    let mut writer = std::io::BufWriter::new(out);

    let mut rows = 0usize;
    for artifact in artifacts {
        let file = std::fs::File::open(artifact)
            .map_err(|e| fail(format!("failed to open {}: {e}", artifact.display())))?;
        for line in BufReader::new(file).lines() {
            let line =
                line.map_err(|e| fail(format!("failed to read {}: {e}", artifact.display())))?;
            writer
                .write_all(line.as_bytes())
                .map_err(|e| fail(format!("failed to write master index: {e}")))?;
            writer
                .write_all(b"\n")
                .map_err(|e| fail(format!("failed to write master index: {e}")))?;
            rows += 1;
        }
    }

    writer
        .flush()
        .map_err(|e| fail(format!("failed to flush master index: {e}")))?;
    std::fs::rename(&tmp, &dest)
        .map_err(|e| fail(format!("failed to rename {} into place: {e}", tmp.display())))?;

    info!(rows, shards = artifacts.len(), path = %dest.display(), "master index written");
    Ok(Some(dest))
}
