//! Image-to-vector embedding pipeline.
//!
//! Provides the [`ImageEmbedder`] trait and a local implementation backed by
//! a DINOv2-small ONNX export (384 dimensions). The embedder is created via
//! [`create_embedder`] from configuration, loaded exactly once per process,
//! and shared read-only by the batch orchestrator.

pub mod local;

use std::path::Path;

use ndarray::Array4;

use crate::error::PipelineError;

/// Number of dimensions in the embedding vectors (DINOv2-small).
pub const EMBEDDING_DIM: usize = 384;

/// Trait for embedding a preprocessed image tensor into a vector.
///
/// Implementations take a `(1, 3, size, size)` tensor in `[0, 1]` and return
/// exactly [`EMBEDDING_DIM`] floats. `path` identifies the source tile for
/// error reporting only. All methods are synchronous.
pub trait ImageEmbedder: Send + Sync {
    /// Embed a single preprocessed tensor.
    fn embed(&self, pixels: &Array4<f32>, path: &Path) -> Result<Vec<f32>, PipelineError>;

    /// Return the number of dimensions this embedder produces.
    fn dimensions(&self) -> usize {
        EMBEDDING_DIM
    }
}

/// Create an embedder from config.
///
/// Currently only `"local"` is supported (ONNX Runtime + DINOv2-small).
/// Returns [`PipelineError::ModelLoad`] if model files are not found — run
/// `tilevec model download` first.
pub fn create_embedder(
    config: &crate::config::EmbeddingConfig,
) -> Result<Box<dyn ImageEmbedder>, PipelineError> {
    match config.provider.as_str() {
        "local" => {
            let embedder = local::LocalImageEmbedder::load(config)?;
            Ok(Box::new(embedder))
        }
        other => Err(PipelineError::ModelLoad {
            message: format!("unknown embedding provider: {other}. Supported: local"),
        }),
    }
}
