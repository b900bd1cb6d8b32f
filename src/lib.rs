//! Batch embedding extraction for microscopy image tiles.
//!
//! tilevec walks a directory of image tiles, runs each tile through a local
//! ONNX vision encoder, and persists the resulting vectors as a sharded,
//! queryable dataset joined with optional ground-truth labels.
//!
//! # Architecture
//!
//! - **Sharding**: the sorted tile list is split into fixed-size,
//!   order-preserving shards; each shard is an independent unit of work
//! - **Storage**: one safetensors matrix (`embeddings`, F32, one row per
//!   dispatched item) plus one JSONL metadata table per shard, then a
//!   single consolidated `master_index.jsonl`
//! - **Failure isolation**: a corrupt tile or a failed inference skips that
//!   item only; a shard that fails to persist never blocks other shards
//! - **Embeddings**: local ONNX Runtime with DINOv2-small (384 dimensions)
//!
//! # Modules
//!
//! - [`config`] — Configuration loading from TOML files and environment variables
//! - [`embedding`] — Image-to-vector embedding via ONNX Runtime
//! - [`labels`] — Optional ground-truth label index
//! - [`pipeline`] — Batch orchestration, shard storage, and master index reduction
//! - [`preprocess`] — Tile decode, resize, and tensor normalization

pub mod config;
pub mod embedding;
pub mod error;
pub mod labels;
pub mod pipeline;
pub mod preprocess;
