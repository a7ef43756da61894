//! # ONNX Model Management
//!
//! Text-to-vector encoding behind the [`Embedder`] trait.

pub mod manager;
pub mod text;

pub use manager::Models;

use anyhow::Result;

use crate::core::Embedding;

pub trait Embedder {
	/// Identifier stamped on cached vectors
	fn model_id(&self) -> &str;

	fn dimension(&self) -> usize;

	/// One embedding per input, same order, deterministic for a fixed model
	fn encode_batch(&mut self, texts: &[&str]) -> Result<Vec<Embedding>>;
}
