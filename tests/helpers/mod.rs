#![allow(dead_code)]

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use ndarray::Array4;
use tilevec::embedding::ImageEmbedder;
use tilevec::error::PipelineError;
use tilevec::labels::LabelIndex;
use tilevec::pipeline::store::ShardStore;
use tilevec::pipeline::ImageItem;

/// Tile edge length used by test fixtures. Matches the stub embedder's
/// expected input so no resizing happens in tests unless a fixture wants it.
pub const TILE_SIZE: u32 = 8;

/// Model-free embedder for pipeline tests: returns a constant-filled vector
/// of a configurable width, so tests can tell real rows (all 1.0) from the
/// zero rows left by skipped items.
pub struct StubEmbedder {
    pub dim: usize,
}

impl StubEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl ImageEmbedder for StubEmbedder {
    fn embed(&self, _pixels: &Array4<f32>, _path: &Path) -> Result<Vec<f32>, PipelineError> {
        Ok(vec![1.0; self.dim])
    }

    fn dimensions(&self) -> usize {
        self.dim
    }
}

/// Embedder that raises an inference failure for specific tile ids and
/// behaves like [`StubEmbedder`] otherwise.
pub struct FlakyEmbedder {
    pub dim: usize,
    pub fail_ids: HashSet<String>,
}

impl ImageEmbedder for FlakyEmbedder {
    fn embed(&self, _pixels: &Array4<f32>, path: &Path) -> Result<Vec<f32>, PipelineError> {
        let id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        if self.fail_ids.contains(id) {
            return Err(PipelineError::Inference {
                path: path.to_path_buf(),
                message: "injected failure".into(),
            });
        }
        Ok(vec![1.0; self.dim])
    }

    fn dimensions(&self) -> usize {
        self.dim
    }
}

/// Write a valid tile at `dir/<id>.tif`.
pub fn write_tile(dir: &Path, id: &str) -> PathBuf {
    let path = dir.join(format!("{id}.tif"));
    RgbImage::from_pixel(TILE_SIZE, TILE_SIZE, Rgb([120, 90, 60]))
        .save(&path)
        .unwrap();
    path
}

/// Write a file at `dir/<id>.tif` that is not a decodable image.
pub fn write_corrupt_tile(dir: &Path, id: &str) -> PathBuf {
    let path = dir.join(format!("{id}.tif"));
    std::fs::write(&path, b"definitely not a tiff").unwrap();
    path
}

/// Build a sorted item list for ids `t_000 .. t_<count-1>`, writing a valid
/// tile for each unless its index is in `corrupt`.
pub fn make_items(dir: &Path, count: usize, corrupt: &[usize]) -> Vec<ImageItem> {
    (0..count)
        .map(|i| {
            let id = format!("t_{i:03}");
            let path = if corrupt.contains(&i) {
                write_corrupt_tile(dir, &id)
            } else {
                write_tile(dir, &id)
            };
            ImageItem { id, path }
        })
        .collect()
}

/// Load a shard's embedding matrix back: `(shape, row-major values)`.
pub fn read_matrix(path: &Path) -> (Vec<usize>, Vec<f32>) {
    let bytes = std::fs::read(path).unwrap();
    let tensors = safetensors_deserialize(&bytes);
    let tensor = tensors.tensor("embeddings").unwrap();
    let shape = tensor.shape().to_vec();
    let values = tensor
        .data()
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    (shape, values)
}

fn safetensors_deserialize(bytes: &[u8]) -> safetensors::SafeTensors<'_> {
    safetensors::SafeTensors::deserialize(bytes).unwrap()
}

/// Load a metadata artifact back as records.
pub fn read_records(path: &Path) -> Vec<tilevec::pipeline::MetadataRecord> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

/// Open a store over a fresh subdirectory of `dir`.
pub fn test_store(dir: &Path) -> ShardStore {
    ShardStore::create(dir.join("out")).unwrap()
}

/// An empty label index.
pub fn no_labels() -> LabelIndex {
    LabelIndex::load(None).unwrap()
}
