//! CLI `run` command — the full discover → embed → reduce pipeline.

use anyhow::{Context, Result};

use crate::config::TilevecConfig;
use crate::embedding;
use crate::labels::LabelIndex;
use crate::pipeline::discover::discover_items;
use crate::pipeline::reduce;
use crate::pipeline::shard::{run_pipeline, PipelineContext};
use crate::pipeline::store::ShardStore;

/// Execute the pipeline with the given configuration.
pub fn run(config: &TilevecConfig) -> Result<()> {
    let input_dir = config.resolved_input_dir();
    let items = discover_items(&input_dir, &config.pipeline.image_extension)?;

    let labels_path = config.resolved_labels_path();
    let labels =
        LabelIndex::load(labels_path.as_deref()).context("failed to load label source")?;

    let embedder = embedding::create_embedder(&config.embedding)
        .context("failed to create embedding provider")?;

    let output_dir = config.resolved_output_dir();
    let store = ShardStore::create(&output_dir)?;

    let ctx = PipelineContext {
        embedder: embedder.as_ref(),
        labels: &labels,
        store: &store,
        image_size: config.embedding.image_size,
    };
    let summary = run_pipeline(&ctx, &items, config.pipeline.shard_size);

    let master = reduce::reduce(&summary.metadata_paths, store.root())
        .context("failed to reduce shard metadata")?;

    println!(
        "Embedded {} of {} tiles across {} shard(s); {} item failure(s).",
        summary.embedded, summary.total_items, summary.shards_written, summary.failed_items
    );
    for (shard, err) in &summary.failed_shards {
        eprintln!("shard {shard} failed: {err}");
    }
    match master {
        Some(path) => println!("Master index written to {}", path.display()),
        None => println!("No shard metadata produced, master index not written."),
    }

    anyhow::ensure!(
        summary.failed_shards.is_empty(),
        "{} shard(s) failed to persist",
        summary.failed_shards.len()
    );
    Ok(())
}
