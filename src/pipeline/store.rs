//! Per-shard artifact writer.
//!
//! Each shard persists as a pair of uniquely-named artifacts: a safetensors
//! file holding the shard's embedding matrix as one named F32 dataset, and
//! a JSONL metadata table with one record per successfully processed item.
//! Shard names are zero-padded ordinals so lexicographic order equals
//! processing order, which the reducer relies on.
//!
//! Both artifacts are written to a `.tmp` sibling and renamed into place,
//! so an aborted run leaves only complete pairs behind.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ndarray::Array2;
use safetensors::tensor::TensorView;
use safetensors::Dtype;

use super::MetadataRecord;
use crate::error::PipelineError;

/// Name of the matrix dataset inside each shard's safetensors artifact.
pub const EMBEDDINGS_TENSOR: &str = "embeddings";

/// Suffix of per-shard metadata artifacts.
pub const METADATA_SUFFIX: &str = ".meta.jsonl";

/// Writes shard artifact pairs under one output directory.
#[derive(Debug, Clone)]
pub struct ShardStore {
    root: PathBuf,
}

impl ShardStore {
    /// Create the store, ensuring the output directory exists.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("failed to create output directory {}", root.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Name of the shard with the given zero-based index: `batch_00001` for
    /// index 0, and so on.
    pub fn shard_name(index: usize) -> String {
        format!("batch_{:05}", index + 1)
    }

    pub fn embeddings_path(&self, shard: &str) -> PathBuf {
        self.root.join(format!("{shard}.safetensors"))
    }

    pub fn metadata_path(&self, shard: &str) -> PathBuf {
        self.root.join(format!("{shard}{METADATA_SUFFIX}"))
    }

    /// Persist one shard's artifact pair. Returns the metadata artifact path.
    ///
    /// A failure here is fatal for this shard only; the caller continues
    /// with the next shard.
    pub fn write_shard(
        &self,
        shard: &str,
        matrix: &Array2<f32>,
        records: &[MetadataRecord],
    ) -> Result<PathBuf, PipelineError> {
        let fail = |message: String| PipelineError::ShardWrite {
            shard: shard.to_string(),
            message,
        };

        self.write_embeddings(shard, matrix).map_err(&fail)?;
        self.write_metadata(shard, records).map_err(&fail)?;
        Ok(self.metadata_path(shard))
    }

    fn write_embeddings(&self, shard: &str, matrix: &Array2<f32>) -> Result<(), String> {
        let dest = self.embeddings_path(shard);
        let tmp = self.root.join(format!("{shard}.safetensors.tmp"));

        let (rows, dim) = matrix.dim();
        let flat: Vec<f32> = matrix.iter().copied().collect();
        let view = TensorView::new(Dtype::F32, vec![rows, dim], bytemuck::cast_slice(&flat))
            .map_err(|e| format!("failed to build tensor view: {e}"))?;

        safetensors::tensor::serialize_to_file(
            [(EMBEDDINGS_TENSOR.to_string(), view)],
            &None::<HashMap<String, String>>,
            &tmp,
        )
        .map_err(|e| format!("failed to write {}: {e}", tmp.display()))?;

        std::fs::rename(&tmp, &dest)
            .map_err(|e| format!("failed to rename {} into place: {e}", tmp.display()))
    }

    fn write_metadata(&self, shard: &str, records: &[MetadataRecord]) -> Result<(), String> {
        let dest = self.metadata_path(shard);
        let tmp = self.root.join(format!("{shard}{METADATA_SUFFIX}.tmp"));

        let file = std::fs::File::create(&tmp)
            .map_err(|e| format!("failed to create {}: {e}", tmp.display()))?;
        let mut writer = std::io::BufWriter::new(file);
        for record in records {
            serde_json::to_writer(&mut writer, record)
                .map_err(|e| format!("failed to serialize metadata record: {e}"))?;
            writer
                .write_all(b"\n")
                .map_err(|e| format!("failed to write {}: {e}", tmp.display()))?;
        }
        writer
            .flush()
            .map_err(|e| format!("failed to flush {}: {e}", tmp.display()))?;

        std::fs::rename(&tmp, &dest)
            .map_err(|e| format!("failed to rename {} into place: {e}", tmp.display()))
    }
}
