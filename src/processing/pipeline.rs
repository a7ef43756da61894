//! End-to-end matching run: load, normalize, describe, embed, index, match, save

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;
use std::time::Instant;

use super::{describe_catalog, find_matches, normalize, sample_rows, MatchParams};
use crate::config::Config;
use crate::core::{CatalogKind, DescribedProduct, Embedding, MatchRecord, RawTable, TextHash};
use crate::index::{IndexedVector, SimilarityIndex};
use crate::models::Embedder;
use crate::storage::{self, EmbeddingCache};
use crate::ui;

/// Rows shown in the end-of-run preview
pub const PREVIEW_ROWS: usize = 5;

pub struct MatchRun {
	pub source: CatalogKind,
	pub target: CatalogKind,
	pub source_count: usize,
	pub target_count: usize,
	pub matches: Vec<MatchRecord>,
	/// `None` when the results could not be written
	pub output: Option<PathBuf>,
}

/// Sample, normalize and describe one raw catalog
pub fn prepare(table: &RawTable, kind: CatalogKind, sample_size: usize) -> Result<Vec<DescribedProduct>> {
	let sampled = sample_rows(table, sample_size);
	let catalog = normalize(&sampled, kind)?;
	Ok(describe_catalog(&catalog))
}

/// Embed every product description, reusing cached vectors when available
pub fn embed(
	products: &[DescribedProduct],
	embedder: &mut dyn Embedder,
	batch_size: usize,
	mut cache: Option<&mut EmbeddingCache>,
) -> Result<Vec<Embedding>> {
	let dimension = embedder.dimension();
	let hashes: Vec<TextHash> = products
		.iter()
		.map(|p| TextHash::compute(&p.full_description))
		.collect();

	let mut embeddings: Vec<Option<Embedding>> = hashes
		.iter()
		.map(|h| {
			cache
				.as_deref()
				.and_then(|c| c.get(h))
				.filter(|e| e.dimension() == dimension)
		})
		.collect();

	let missing: Vec<usize> = (0..products.len()).filter(|&i| embeddings[i].is_none()).collect();
	if missing.len() < products.len() {
		ui::debug(&format!("{} descriptions served from cache", products.len() - missing.len()));
	}

	let total_batches = missing.len().div_ceil(batch_size.max(1));
	for (batch_no, batch) in missing.chunks(batch_size.max(1)).enumerate() {
		let texts: Vec<&str> = batch.iter().map(|&i| products[i].full_description.as_str()).collect();
		let start = Instant::now();
		let vectors = embedder
			.encode_batch(&texts)
			.with_context(|| format!("Embedding batch {} of {} failed", batch_no + 1, total_batches))?;
		anyhow::ensure!(
			vectors.len() == batch.len(),
			"embedder returned {} vectors for {} descriptions",
			vectors.len(),
			batch.len()
		);

		for (&i, vector) in batch.iter().zip(vectors) {
			anyhow::ensure!(
				vector.dimension() == dimension,
				"embedder returned a {}-dimensional vector, expected {}",
				vector.dimension(),
				dimension
			);
			if let Some(cache) = cache.as_deref_mut() {
				cache.insert(&hashes[i], &vector);
			}
			embeddings[i] = Some(vector);
		}

		ui::debug(&format!(
			"[{}/{}] {} descriptions {}",
			batch_no + 1,
			total_batches,
			batch.len(),
			format!("{}ms", start.elapsed().as_millis()).dimmed()
		));
	}

	embeddings
		.into_iter()
		.enumerate()
		.map(|(i, e)| e.with_context(|| format!("No embedding produced for product {}", i)))
		.collect()
}

fn embed_catalog(
	config: &Config,
	kind: CatalogKind,
	products: &[DescribedProduct],
	embedder: &mut dyn Embedder,
) -> Result<Vec<Embedding>> {
	ui::info(&format!(
		"Generating embeddings for {} {} products...",
		products.len(),
		kind.display_name()
	));

	let Some(dir) = &config.cache_dir else {
		return embed(products, embedder, config.batch_size, None);
	};

	let mut cache = EmbeddingCache::load_or_new(dir, kind, embedder.model_id());
	let embeddings = embed(products, embedder, config.batch_size, Some(&mut cache))?;
	if let Err(e) = cache.save(dir, kind) {
		ui::warn(&format!("Could not update embedding cache: {:#}", e));
	}
	Ok(embeddings)
}

fn load(config: &Config, kind: CatalogKind) -> Result<Vec<DescribedProduct>> {
	let path = config.catalog_path(kind);
	let table = storage::read_catalog(path)?;
	ui::debug(&format!("Read {} rows from {}", table.len(), path.display()));

	let products = prepare(&table, kind, config.sample_size)
		.with_context(|| format!("Failed to preprocess {} catalog", kind.display_name()))?;
	if config.sample_size > 0 {
		ui::debug(&format!("Sampled {} of {} {} rows", products.len(), table.len(), kind.display_name()));
	}
	Ok(products)
}

fn indexed(products: &[DescribedProduct], embeddings: Vec<Embedding>) -> Vec<IndexedVector> {
	products
		.iter()
		.zip(embeddings)
		.map(|(p, e)| IndexedVector::from_product(p, e))
		.collect()
}

/// Run the full pipeline with the given collaborators.
///
/// Failing to write the result file is reported but does not fail the run;
/// the matches are still returned.
pub fn run(config: &Config, embedder: &mut dyn Embedder, index: &mut dyn SimilarityIndex) -> Result<MatchRun> {
	config.validate()?;
	let source_kind = config.source;
	let target_kind = config.target();

	ui::header("Preprocessing");
	let sources = load(config, source_kind)?;
	let targets = load(config, target_kind)?;
	ui::success(&format!(
		"{} {} and {} {} products ready",
		sources.len(),
		source_kind.display_name(),
		targets.len(),
		target_kind.display_name()
	));

	ui::header("Embedding");
	let start = Instant::now();
	let source_vectors = embed_catalog(config, source_kind, &sources, embedder)?;
	let target_vectors = embed_catalog(config, target_kind, &targets, embedder)?;
	ui::success(&format!("Embeddings ready in {:.2}s", start.elapsed().as_secs_f32()));

	ui::header("Indexing");
	let collection = config.collection(target_kind);
	ui::info(&format!(
		"Uploading {} embeddings to collection {}...",
		target_kind.display_name(),
		collection
	));
	index
		.build(collection, embedder.dimension(), indexed(&targets, target_vectors))
		.with_context(|| format!("Failed to populate collection {}", collection))?;

	ui::header("Matching");
	let params = MatchParams {
		threshold: config.threshold,
		top_k: config.top_k,
	};
	let start = Instant::now();
	let matches = find_matches(&*index, collection, &indexed(&sources, source_vectors), params)
		.context("Similarity search failed")?;
	ui::success(&format!(
		"Found {} matches above the similarity threshold of {} in {:.2}s",
		matches.len(),
		config.threshold,
		start.elapsed().as_secs_f32()
	));

	let output = match storage::save_matches(&matches, &config.output_dir, source_kind, target_kind) {
		Ok(path) => Some(path),
		Err(e) => {
			ui::error(&format!("Error saving matching: {:#}", e));
			None
		}
	};

	Ok(MatchRun {
		source: source_kind,
		target: target_kind,
		source_count: sources.len(),
		target_count: targets.len(),
		matches,
		output,
	})
}

/// Print match count, a preview of the first rows and the output location
pub fn report(run: &MatchRun) {
	ui::header("Results");

	if run.matches.is_empty() {
		ui::warn("No matches found");
	}

	for (i, record) in run.matches.iter().take(PREVIEW_ROWS).enumerate() {
		println!(
			"{} {} {} {} {}",
			format!("{:2}.", i + 1).bright_blue().bold(),
			record.source.full_description.bright_white(),
			"→".dimmed(),
			record.target.full_description.bright_white(),
			format!("{:.0}%", record.score * 100.0).dimmed()
		);
	}
	if run.matches.len() > PREVIEW_ROWS {
		println!("    {}", format!("... and {} more", run.matches.len() - PREVIEW_ROWS).dimmed());
	}
	println!();

	match &run.output {
		Some(path) => ui::success(&format!("Matching saved to {}", ui::path_link(path, 60))),
		None => ui::warn("Matches were not saved"),
	}
}
