//! Pipeline error taxonomy.
//!
//! Per-item failures ([`PipelineError::Decode`], [`PipelineError::Inference`])
//! are recovered inside the batch orchestrator: the item is skipped and its
//! matrix row stays zeroed. [`PipelineError::ShardWrite`] is fatal for one
//! shard only. [`PipelineError::ModelLoad`] aborts the run before any shard
//! is attempted, and [`PipelineError::Reduction`] is surfaced to the caller
//! with all shard artifacts left valid.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The image file was unreadable, corrupt, or not a supported format.
    #[error("failed to decode {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// The embedding model could not be initialized.
    #[error("embedding model failed to load: {message}")]
    ModelLoad { message: String },

    /// The model raised on a valid, preprocessed tensor.
    #[error("inference failed for {path}: {message}")]
    Inference { path: PathBuf, message: String },

    /// A shard's artifact pair could not be created or written.
    #[error("failed to write shard {shard}: {message}")]
    ShardWrite { shard: String, message: String },

    /// The master index could not be written. Per-shard artifacts remain valid.
    #[error("failed to write master index {path}: {message}")]
    Reduction { path: PathBuf, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_offending_path() {
        let err = PipelineError::Inference {
            path: "tiles/t_0042.tif".into(),
            message: "shape mismatch".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("t_0042.tif"));
        assert!(msg.contains("shape mismatch"));
    }
}
