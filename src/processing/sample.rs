//! Reproducible row sampling

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::core::RawTable;

pub const SAMPLE_SEED: u64 = 42;

/// Draw `size` rows with a fixed seed. `0` keeps the whole table.
///
/// Sampled rows keep their original relative order, so positional ids
/// assigned afterwards follow the file order.
pub fn sample_rows(table: &RawTable, size: usize) -> RawTable {
	if size == 0 || size >= table.len() {
		return table.clone();
	}

	let mut rng = StdRng::seed_from_u64(SAMPLE_SEED);
	let mut picked = rand::seq::index::sample(&mut rng, table.len(), size).into_vec();
	picked.sort_unstable();

	table.select(&picked)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn numbered(n: usize) -> RawTable {
		let mut table = RawTable::new(vec!["N".to_string()]);
		for i in 0..n {
			table.push_row(vec![Some(i.to_string())]);
		}
		table
	}

	fn values(table: &RawTable) -> Vec<usize> {
		table
			.rows
			.iter()
			.map(|r| r[0].as_deref().unwrap().parse().unwrap())
			.collect()
	}

	#[test]
	fn zero_keeps_everything() {
		assert_eq!(sample_rows(&numbered(5), 0).len(), 5);
	}

	#[test]
	fn oversized_sample_keeps_everything() {
		assert_eq!(sample_rows(&numbered(3), 10).len(), 3);
	}

	#[test]
	fn sample_is_sorted_unique_and_reproducible() {
		let table = numbered(100);
		let first = values(&sample_rows(&table, 10));
		let second = values(&sample_rows(&table, 10));

		assert_eq!(first.len(), 10);
		assert_eq!(first, second);
		assert!(first.windows(2).all(|w| w[0] < w[1]));
	}
}
