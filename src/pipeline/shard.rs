//! Batch orchestrator.
//!
//! Partitions the discovered item list into contiguous, order-preserving
//! shards and drives preprocess → embed → persist for each one. Shards are
//! processed strictly sequentially, items within a shard strictly
//! sequentially; the embedder handle and label index are shared read-only.

use indicatif::{ProgressBar, ProgressStyle};
use ndarray::{Array2, ArrayView1};
use tracing::{error, info, warn};

use super::store::ShardStore;
use super::{ImageItem, MetadataRecord, RunSummary};
use crate::embedding::ImageEmbedder;
use crate::error::PipelineError;
use crate::labels::LabelIndex;
use crate::preprocess::preprocess;

/// Everything the orchestrator needs, passed in explicitly. The embedder
/// is loaded once by the caller and the label index is read-only for the
/// whole run.
pub struct PipelineContext<'a> {
    pub embedder: &'a dyn ImageEmbedder,
    pub labels: &'a LabelIndex,
    pub store: &'a ShardStore,
    /// Spatial input size the embedder expects.
    pub image_size: u32,
}

/// Run the full pipeline over `items` in shards of `shard_size`.
///
/// Per-item decode and inference failures are logged and skipped: the
/// item's matrix row stays zeroed and no metadata record is emitted. A
/// shard whose artifact pair fails to persist is recorded in the summary
/// and does not block the remaining shards.
pub fn run_pipeline(
    ctx: &PipelineContext<'_>,
    items: &[ImageItem],
    shard_size: usize,
) -> RunSummary {
    assert!(shard_size > 0, "shard_size must be positive");

    let mut summary = RunSummary {
        total_items: items.len(),
        ..RunSummary::default()
    };
    if items.is_empty() {
        info!("no input items, nothing to do");
        return summary;
    }

    let dim = ctx.embedder.dimensions();
    let shard_count = items.len().div_ceil(shard_size);
    info!(
        items = items.len(),
        shards = shard_count,
        shard_size,
        "starting embedding run"
    );

    let pb = ProgressBar::new(items.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  {bar:40.cyan/blue} {pos}/{len} ({eta})")
            .expect("valid template")
            .progress_chars("##-"),
    );

    for (shard_index, shard_items) in items.chunks(shard_size).enumerate() {
        let shard = ShardStore::shard_name(shard_index);
        let mut matrix = Array2::<f32>::zeros((shard_items.len(), dim));
        let mut records = Vec::with_capacity(shard_items.len());

        for (slot, item) in shard_items.iter().enumerate() {
            match embed_item(ctx, item) {
                Ok(vector) => {
                    matrix
                        .row_mut(slot)
                        .assign(&ArrayView1::from(vector.as_slice()));
                    records.push(MetadataRecord {
                        file_id: item.id.clone(),
                        file_path: item.path.to_string_lossy().into_owned(),
                        embedding_batch: shard.clone(),
                        embedding_index: slot,
                        label: ctx.labels.get(&item.id).map(String::from),
                    });
                }
                Err(err) => {
                    warn!(path = %item.path.display(), %err, "skipping item");
                    summary.failed_items += 1;
                }
            }
            pb.inc(1);
        }

        summary.embedded += records.len();
        match ctx.store.write_shard(&shard, &matrix, &records) {
            Ok(metadata_path) => {
                info!(
                    %shard,
                    rows = shard_items.len(),
                    records = records.len(),
                    "shard persisted"
                );
                summary.shards_written += 1;
                summary.metadata_paths.push(metadata_path);
            }
            Err(err) => {
                error!(%shard, %err, "shard failed to persist, continuing");
                summary.failed_shards.push((shard, err));
            }
        }
    }

    pb.finish_and_clear();
    info!(
        embedded = summary.embedded,
        failed_items = summary.failed_items,
        shards_written = summary.shards_written,
        "embedding run complete"
    );
    summary
}

/// Preprocess and embed one item. Both failure modes come back as typed
/// errors for the orchestrator to inspect, never as a propagated abort.
fn embed_item(
    ctx: &PipelineContext<'_>,
    item: &ImageItem,
) -> Result<Vec<f32>, PipelineError> {
    let tensor = preprocess(&item.path, ctx.image_size)?;
    let vector = ctx.embedder.embed(&tensor, &item.path)?;
    if vector.len() != ctx.embedder.dimensions() {
        return Err(PipelineError::Inference {
            path: item.path.clone(),
            message: format!(
                "embedder returned {} dimensions, expected {}",
                vector.len(),
                ctx.embedder.dimensions()
            ),
        });
    }
    Ok(vector)
}
