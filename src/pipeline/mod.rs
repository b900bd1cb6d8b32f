//! Batch orchestration and storage.
//!
//! The pipeline partitions the discovered tile list into fixed-size shards,
//! drives preprocessing and inference per item with per-item failure
//! isolation, persists one artifact pair per shard (a columnar embedding
//! matrix and a row-oriented metadata table), and finally reduces all shard
//! metadata into one master index.
//!
//! - [`discover`] — non-recursive tile enumeration, sorted by id
//! - [`shard`] — the batch orchestrator
//! - [`store`] — per-shard artifact writer
//! - [`reduce`] — master index reduction

pub mod discover;
pub mod reduce;
pub mod shard;
pub mod store;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One input tile, created at discovery time. The id is the file stem and
/// is the join key against the label index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageItem {
    pub id: String,
    pub path: PathBuf,
}

/// One row of a shard's metadata table, emitted for successfully processed
/// items only.
///
/// `embedding_index` is the item's dispatch position within the shard, so
/// the values in a table with failures are not contiguous: a skipped slot
/// keeps its all-zero matrix row and simply has no record here. The
/// metadata table, not the matrix, is the source of truth for which rows
/// hold real embeddings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// Tile identifier (file stem).
    pub file_id: String,
    /// Original path of the tile.
    pub file_path: String,
    /// Name of the shard holding this item's embedding row.
    pub embedding_batch: String,
    /// Row position within the shard's embedding matrix.
    pub embedding_index: usize,
    /// Ground-truth label, if the tile id is present in the label index.
    pub label: Option<String>,
}

/// Outcome of a full pipeline run.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Items discovered and dispatched.
    pub total_items: usize,
    /// Items that produced an embedding row and a metadata record.
    pub embedded: usize,
    /// Items skipped due to decode or inference failures.
    pub failed_items: usize,
    /// Shards whose artifact pair was persisted.
    pub shards_written: usize,
    /// Shards that failed to persist, with the failure.
    pub failed_shards: Vec<(String, crate::error::PipelineError)>,
    /// Metadata artifacts of successfully persisted shards, in shard order.
    pub metadata_paths: Vec<PathBuf>,
}
