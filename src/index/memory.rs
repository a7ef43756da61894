//! Exact in-process index backed by a dense cosine-similarity matrix

use ndarray::Array2;
use rayon::prelude::*;
use std::collections::HashMap;

use super::{rank, Hit, IndexedVector, SimilarityIndex};
use crate::core::{Embedding, Payload};
use crate::error::{Error, Result};

struct Collection {
	dimension: usize,
	ids: Vec<u64>,
	payloads: Vec<Payload>,
	/// One normalized vector per row
	matrix: Array2<f32>,
}

#[derive(Default)]
pub struct MemoryIndex {
	collections: HashMap<String, Collection>,
}

impl MemoryIndex {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self, collection: &str) -> Option<usize> {
		self.collections.get(collection).map(|c| c.ids.len())
	}

	fn collection(&self, name: &str) -> Result<&Collection> {
		self.collections
			.get(name)
			.ok_or_else(|| Error::CollectionNotFound(name.to_string()))
	}
}

impl SimilarityIndex for MemoryIndex {
	fn build(&mut self, collection: &str, dimension: usize, points: Vec<IndexedVector>) -> Result<()> {
		let mut ids = Vec::with_capacity(points.len());
		let mut payloads = Vec::with_capacity(points.len());
		let mut flat = Vec::with_capacity(points.len() * dimension);

		for point in points {
			check_dimension(dimension, &point.vector)?;
			ids.push(point.id);
			payloads.push(point.payload);
			flat.extend_from_slice(point.vector.as_slice());
		}

		let matrix = Array2::from_shape_vec((ids.len(), dimension), flat).map_err(|_| {
			Error::InvalidDimension {
				expected: dimension,
				actual: 0,
			}
		})?;

		self.collections.insert(
			collection.to_string(),
			Collection {
				dimension,
				ids,
				payloads,
				matrix,
			},
		);
		Ok(())
	}

	fn query(&self, collection: &str, vector: &Embedding, k: usize) -> Result<Vec<Hit>> {
		let mut batch = self.query_batch(collection, std::slice::from_ref(vector), k)?;
		Ok(batch.pop().unwrap_or_default())
	}

	fn query_batch(&self, collection: &str, vectors: &[Embedding], k: usize) -> Result<Vec<Vec<Hit>>> {
		let target = self.collection(collection)?;

		let mut flat = Vec::with_capacity(vectors.len() * target.dimension);
		for vector in vectors {
			check_dimension(target.dimension, vector)?;
			flat.extend_from_slice(vector.as_slice());
		}
		let queries = Array2::from_shape_vec((vectors.len(), target.dimension), flat).map_err(|_| {
			Error::InvalidDimension {
				expected: target.dimension,
				actual: 0,
			}
		})?;

		// (queries x targets) cosine matrix; rows are ranked independently
		let scores = queries.dot(&target.matrix.t());

		let hits: Vec<Vec<Hit>> = (0..vectors.len())
			.into_par_iter()
			.map(|row| {
				top_k(scores.row(row).to_vec(), &target.ids, k)
					.into_iter()
					.map(|(pos, score)| Hit {
						id: target.ids[pos],
						score,
						payload: target.payloads[pos].clone(),
					})
					.collect::<Vec<Hit>>()
			})
			.collect();

		Ok(hits)
	}
}

fn check_dimension(expected: usize, vector: &Embedding) -> Result<()> {
	if vector.dimension() != expected {
		return Err(Error::InvalidDimension {
			expected,
			actual: vector.dimension(),
		});
	}
	Ok(())
}

/// Positions and scores of the `k` best entries of one score row
fn top_k(scores: Vec<f32>, ids: &[u64], k: usize) -> Vec<(usize, f32)> {
	let mut ranked: Vec<(usize, f32)> = scores.into_iter().enumerate().collect();
	let cmp = |a: &(usize, f32), b: &(usize, f32)| rank(a.1, ids[a.0], b.1, ids[b.0]);

	if k == 0 {
		return Vec::new();
	}
	if k < ranked.len() {
		ranked.select_nth_unstable_by(k - 1, cmp);
		ranked.truncate(k);
	}
	ranked.sort_by(cmp);
	ranked
}

#[cfg(test)]
mod tests {
	use super::*;

	fn point(id: u64, v: &[f32]) -> IndexedVector {
		IndexedVector {
			id,
			vector: Embedding::new(v.to_vec()),
			payload: Payload {
				key: format!("K{}", id),
				full_description: format!("item {}", id),
				fields: Default::default(),
			},
		}
	}

	fn index(points: Vec<IndexedVector>) -> MemoryIndex {
		let mut index = MemoryIndex::new();
		index.build("target", 2, points).unwrap();
		index
	}

	#[test]
	fn results_are_descending_with_ties_by_id() {
		let index = index(vec![
			point(0, &[0.0, 1.0]),
			point(1, &[1.0, 1.0]),
			point(2, &[1.0, 0.0]),
			point(3, &[1.0, 1.0]),
		]);

		let hits = index.query("target", &Embedding::new(vec![1.0, 1.0]), 4).unwrap();
		let ids: Vec<u64> = hits.iter().map(|h| h.id).collect();

		assert_eq!(ids, vec![1, 3, 0, 2]);
		assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
		assert!((hits[0].score - 1.0).abs() < 1e-6);
		assert_eq!(hits[0].payload.key, "K1");
	}

	#[test]
	fn limit_truncates_and_small_collections_return_all() {
		let index = index(vec![point(0, &[1.0, 0.0]), point(1, &[0.0, 1.0]), point(2, &[1.0, 0.2])]);
		let q = Embedding::new(vec![1.0, 0.0]);

		let top1 = index.query("target", &q, 1).unwrap();
		assert_eq!(top1.len(), 1);
		assert_eq!(top1[0].id, 0);

		assert_eq!(index.query("target", &q, 10).unwrap().len(), 3);
	}

	#[test]
	fn batch_keeps_query_order() {
		let index = index(vec![point(0, &[1.0, 0.0]), point(1, &[0.0, 1.0])]);
		let queries = vec![Embedding::new(vec![0.0, 1.0]), Embedding::new(vec![1.0, 0.0])];

		let batch = index.query_batch("target", &queries, 1).unwrap();
		assert_eq!(batch[0][0].id, 1);
		assert_eq!(batch[1][0].id, 0);
	}

	#[test]
	fn empty_collection_answers_with_no_hits() {
		let index = index(Vec::new());
		assert_eq!(index.len("target"), Some(0));
		assert!(index.query("target", &Embedding::new(vec![1.0, 0.0]), 5).unwrap().is_empty());
	}

	#[test]
	fn unknown_collection_fails() {
		let index = MemoryIndex::new();
		let err = index.query("nope", &Embedding::new(vec![1.0, 0.0]), 5).unwrap_err();
		assert!(matches!(err, Error::CollectionNotFound(ref name) if name == "nope"));
	}

	#[test]
	fn rebuild_replaces_previous_points() {
		let mut index = index(vec![point(0, &[1.0, 0.0]), point(1, &[0.0, 1.0])]);
		index.build("target", 2, vec![point(0, &[0.0, 1.0])]).unwrap();
		assert_eq!(index.len("target"), Some(1));
	}

	#[test]
	fn dimension_mismatch_is_rejected() {
		let mut index = MemoryIndex::new();
		let err = index.build("target", 3, vec![point(0, &[1.0, 0.0])]).unwrap_err();
		assert!(matches!(err, Error::InvalidDimension { expected: 3, actual: 2 }));
	}
}
