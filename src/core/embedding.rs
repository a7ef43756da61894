//! Normalized embedding vectors for semantic similarity

#[derive(Debug, Clone, PartialEq)]
pub struct Embedding(Vec<f32>);

impl Embedding {
	/// Create normalized embedding from raw data
	pub fn new(data: Vec<f32>) -> Self {
		Self(normalize(&data))
	}

	/// Create from pre-normalized data (cache loads)
	pub fn raw(data: Vec<f32>) -> Self {
		Self(data)
	}

	pub fn as_slice(&self) -> &[f32] {
		&self.0
	}

	pub fn dimension(&self) -> usize {
		self.0.len()
	}

	/// Cosine similarity [-1.0, 1.0]
	pub fn similarity(&self, other: &Self) -> f32 {
		self.0.iter().zip(other.0.iter()).map(|(a, b)| a * b).sum()
	}
}

fn normalize(v: &[f32]) -> Vec<f32> {
	let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
	if norm > 0.0 {
		v.iter().map(|x| x / norm).collect()
	} else {
		v.to_vec()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn new_normalizes_to_unit_length() {
		let emb = Embedding::new(vec![3.0, 4.0]);
		assert_eq!(emb.as_slice(), &[0.6, 0.8]);
		assert!((emb.similarity(&emb) - 1.0).abs() < 1e-6);
	}

	#[test]
	fn zero_vector_stays_zero() {
		let emb = Embedding::new(vec![0.0; 4]);
		assert_eq!(emb.similarity(&Embedding::new(vec![1.0, 0.0, 0.0, 0.0])), 0.0);
	}

	#[test]
	fn opposite_vectors_score_minus_one() {
		let a = Embedding::new(vec![1.0, 1.0]);
		let b = Embedding::new(vec![-2.0, -2.0]);
		assert!((a.similarity(&b) + 1.0).abs() < 1e-6);
	}
}
