//! Local ONNX Runtime embedding provider.
//!
//! Implements [`ImageEmbedder`] using a DINOv2-small vision encoder via
//! `ort`. The session is loaded once at startup and guarded by a mutex for
//! exclusive access during inference.

use std::path::Path;
use std::sync::Mutex;

use ndarray::Array4;
use ort::session::Session;
use ort::value::Tensor;

use super::{ImageEmbedder, EMBEDDING_DIM};
use crate::config::EmbeddingConfig;
use crate::error::PipelineError;

/// Local ONNX-based image embedder.
pub struct LocalImageEmbedder {
    session: Mutex<Session>,
}

// Safety: the Session is behind a Mutex. The Mutex guarantees exclusive
// access during run().
unsafe impl Send for LocalImageEmbedder {}
unsafe impl Sync for LocalImageEmbedder {}

impl LocalImageEmbedder {
    /// Load the encoder from the model cache directory.
    ///
    /// Fails with [`PipelineError::ModelLoad`] if the model file is absent
    /// or cannot be initialized — the run cannot proceed without it.
    pub fn load(config: &EmbeddingConfig) -> Result<Self, PipelineError> {
        let cache_dir = crate::config::expand_tilde(&config.cache_dir);
        let model_path = cache_dir.join(&config.model).join("model.onnx");

        if !model_path.exists() {
            return Err(PipelineError::ModelLoad {
                message: format!(
                    "ONNX model not found at {}. Run `tilevec model download` first.",
                    model_path.display()
                ),
            });
        }

        let session = create_session(&model_path).map_err(|e| PipelineError::ModelLoad {
            message: format!("failed to load ONNX model: {e}"),
        })?;

        tracing::info!(model = %model_path.display(), "ONNX model loaded");

        Ok(Self {
            session: Mutex::new(session),
        })
    }
}

fn create_session(model_path: &Path) -> ort::Result<Session> {
    Session::builder()?
        .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
        .with_intra_threads(4)?
        .commit_from_file(model_path)
}

impl ImageEmbedder for LocalImageEmbedder {
    fn embed(&self, pixels: &Array4<f32>, path: &Path) -> Result<Vec<f32>, PipelineError> {
        let inference = |message: String| PipelineError::Inference {
            path: path.to_path_buf(),
            message,
        };

        let shape: Vec<i64> = pixels.shape().iter().map(|&d| d as i64).collect();
        let data: Vec<f32> = pixels.iter().copied().collect();
        let input_tensor = Tensor::from_array((shape, data.into_boxed_slice()))
            .map_err(|e| inference(format!("failed to build input tensor: {e}")))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| inference(format!("session lock poisoned: {e}")))?;

        let outputs = session
            .run(ort::inputs! { "pixel_values" => input_tensor })
            .map_err(|e| inference(e.to_string()))?;

        // The output name varies by ONNX export. Try common names, fall back
        // to index 0.
        let value = outputs
            .get("pooler_output")
            .or_else(|| outputs.get("last_hidden_state"))
            .unwrap_or_else(|| &outputs[0]);

        let (shape, data) = value
            .try_extract_tensor::<f32>()
            .map_err(|e| inference(format!("failed to extract output tensor: {e}")))?;

        let dims: &[i64] = &shape;
        // Accept [1, 384] pooled output or [1, seq, 384] token output, in
        // which case the CLS token at position 0 is the embedding.
        match dims {
            [1, d] if *d == EMBEDDING_DIM as i64 => Ok(data[..EMBEDDING_DIM].to_vec()),
            [1, _, d] if *d == EMBEDDING_DIM as i64 => Ok(data[..EMBEDDING_DIM].to_vec()),
            _ => Err(inference(format!(
                "unexpected output shape {dims:?}, expected trailing dimension {EMBEDDING_DIM}"
            ))),
        }
    }
}
