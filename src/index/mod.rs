//! # Similarity Index
//!
//! Stores one catalog's vectors and answers top-k cosine queries.
//! Two backends share the [`SimilarityIndex`] contract: an exact in-process
//! matrix search and a Qdrant collection reached over HTTP.

pub mod memory;
pub mod qdrant;

pub use memory::MemoryIndex;
pub use qdrant::{QdrantIndex, QdrantSettings};

use std::cmp::Ordering;

use crate::core::{DescribedProduct, Embedding, Payload};
use crate::error::Result;

/// An embedding tagged with its positional id and identifying payload
#[derive(Debug, Clone)]
pub struct IndexedVector {
	pub id: u64,
	pub vector: Embedding,
	pub payload: Payload,
}

impl IndexedVector {
	pub fn from_product(product: &DescribedProduct, vector: Embedding) -> Self {
		Self {
			id: product.id,
			vector,
			payload: product.payload(),
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
	pub id: u64,
	pub score: f32,
	pub payload: Payload,
}

pub trait SimilarityIndex {
	/// Create or repopulate `collection` with cosine distance
	fn build(&mut self, collection: &str, dimension: usize, points: Vec<IndexedVector>) -> Result<()>;

	/// Top-k hits by descending score, ties by ascending id
	fn query(&self, collection: &str, vector: &Embedding, k: usize) -> Result<Vec<Hit>>;

	/// One hit list per query vector, in query order
	fn query_batch(&self, collection: &str, vectors: &[Embedding], k: usize) -> Result<Vec<Vec<Hit>>> {
		vectors.iter().map(|v| self.query(collection, v, k)).collect()
	}
}

/// Descending score, then ascending id
pub(crate) fn rank(a_score: f32, a_id: u64, b_score: f32, b_id: u64) -> Ordering {
	b_score
		.partial_cmp(&a_score)
		.unwrap_or(Ordering::Equal)
		.then(a_id.cmp(&b_id))
}

pub(crate) fn sort_hits(hits: &mut [Hit]) {
	hits.sort_by(|a, b| rank(a.score, a.id, b.score, b.id));
}

#[cfg(test)]
mod tests {
	use super::*;

	fn hit(id: u64, score: f32) -> Hit {
		Hit {
			id,
			score,
			payload: Payload {
				key: id.to_string(),
				full_description: String::new(),
				fields: Default::default(),
			},
		}
	}

	#[test]
	fn sort_orders_by_score_then_id() {
		let mut hits = vec![hit(4, 0.5), hit(2, 0.9), hit(3, 0.5), hit(1, 0.1)];
		sort_hits(&mut hits);
		let ids: Vec<u64> = hits.iter().map(|h| h.id).collect();
		assert_eq!(ids, vec![2, 3, 4, 1]);
	}
}
