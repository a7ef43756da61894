//! Threshold-based cross-catalog match selection

use crate::core::MatchRecord;
use crate::error::Result;
use crate::index::{IndexedVector, SimilarityIndex};

/// Source vectors sent to the index per query batch
const QUERY_CHUNK: usize = 512;

#[derive(Debug, Clone, Copy)]
pub struct MatchParams {
	/// Inclusive lower bound on the similarity score
	pub threshold: f32,
	/// Neighbors retrieved per source product
	pub top_k: usize,
}

/// Look up every source product in `collection` and keep the neighbors
/// scoring at or above the threshold.
///
/// Records are grouped by source in source order; within a group they
/// follow the index ranking (descending score, then ascending id).
pub fn find_matches(
	index: &dyn SimilarityIndex,
	collection: &str,
	sources: &[IndexedVector],
	params: MatchParams,
) -> Result<Vec<MatchRecord>> {
	let mut matches = Vec::new();

	for chunk in sources.chunks(QUERY_CHUNK) {
		let queries: Vec<_> = chunk.iter().map(|s| s.vector.clone()).collect();
		let results = index.query_batch(collection, &queries, params.top_k)?;

		for (source, hits) in chunk.iter().zip(results) {
			matches.extend(
				hits.into_iter()
					.filter(|hit| hit.score >= params.threshold)
					.map(|hit| MatchRecord {
						source: source.payload.clone(),
						target: hit.payload,
						score: hit.score,
					}),
			);
		}
	}

	Ok(matches)
}
