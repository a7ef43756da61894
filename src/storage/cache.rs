//! Per-catalog embedding cache (MessagePack)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::{CatalogKind, Embedding, TextHash};
use crate::ui;

const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const CACHE_EXT: &str = "msgpack";

/// Vectors keyed by the hash of the description they were computed from
#[derive(Debug, Serialize, Deserialize)]
pub struct EmbeddingCache {
	version: String,
	model: String,
	entries: HashMap<String, Vec<f32>>,
	#[serde(skip)]
	dirty: bool,
}

impl EmbeddingCache {
	pub fn new(model: &str) -> Self {
		Self {
			version: VERSION.to_string(),
			model: model.to_string(),
			entries: HashMap::new(),
			dirty: false,
		}
	}

	/// Load the cache for `catalog`, starting empty when the file is
	/// missing, unreadable, or was written by another version or model
	pub fn load_or_new(dir: &Path, catalog: CatalogKind, model: &str) -> Self {
		let path = build_path(dir, catalog);
		if !path.exists() {
			return Self::new(model);
		}

		match load(&path) {
			Ok(cache) if cache.is_current(model) => {
				ui::debug(&format!("Loaded {} cached embeddings from {}", cache.len(), path.display()));
				cache
			}
			Ok(_) => {
				ui::debug(&format!("Ignoring outdated cache {}", path.display()));
				Self::new(model)
			}
			Err(e) => {
				ui::warn(&format!("Ignoring unreadable cache {}: {}", path.display(), e));
				Self::new(model)
			}
		}
	}

	pub fn is_current(&self, model: &str) -> bool {
		self.version == VERSION && self.model == model
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn get(&self, hash: &TextHash) -> Option<Embedding> {
		self.entries
			.get(hash.as_str())
			.filter(|v| !v.is_empty())
			.map(|v| Embedding::raw(v.clone()))
	}

	pub fn insert(&mut self, hash: &TextHash, embedding: &Embedding) {
		self.entries
			.insert(hash.as_str().to_string(), embedding.as_slice().to_vec());
		self.dirty = true;
	}

	/// Write the cache if anything was added since it was loaded
	pub fn save(&mut self, dir: &Path, catalog: CatalogKind) -> Result<()> {
		if !self.dirty {
			return Ok(());
		}

		fs::create_dir_all(dir).context("Failed to create cache directory")?;
		let bytes = rmp_serde::to_vec(self).context("Failed to serialize embedding cache")?;
		fs::write(build_path(dir, catalog), bytes).context("Failed to write embedding cache")?;
		self.dirty = false;
		Ok(())
	}
}

fn load(path: &Path) -> Result<EmbeddingCache> {
	let bytes = fs::read(path).context("Failed to read cache")?;
	rmp_serde::from_slice(&bytes).context("Failed to deserialize cache")
}

pub fn build_path(dir: &Path, catalog: CatalogKind) -> PathBuf {
	dir.join(format!("{}.{}", catalog.tag().to_lowercase(), CACHE_EXT))
}

/// Cache files present in `dir`
pub fn list(dir: &Path) -> Vec<PathBuf> {
	let Ok(entries) = fs::read_dir(dir) else {
		return Vec::new();
	};

	entries
		.filter_map(|e| e.ok())
		.map(|e| e.path())
		.filter(|p| p.extension().and_then(|s| s.to_str()) == Some(CACHE_EXT))
		.collect()
}
