//! Match command - pair products across the two catalogs

use anyhow::Result;
use std::time::Instant;

use crate::config::{Backend, Config};
use crate::index::{MemoryIndex, QdrantIndex, SimilarityIndex};
use crate::models::Models;
use crate::processing::pipeline;
use crate::ui;

pub fn run(config: &Config) -> Result<()> {
	let start = Instant::now();
	config.validate()?;

	ui::info(&format!(
		"Matching {} → {} (threshold {}, top {})",
		config.source.display_name(),
		config.target().display_name(),
		config.threshold,
		config.top_k
	));

	let mut models = Models::new(config)?;
	let mut index: Box<dyn SimilarityIndex> = match config.backend {
		Backend::Memory => {
			ui::debug("Using in-memory index");
			Box::new(MemoryIndex::new())
		}
		Backend::Qdrant => {
			ui::debug(&format!("Using Qdrant at {}:{}", config.qdrant.host, config.qdrant.port));
			Box::new(QdrantIndex::new(&config.qdrant)?)
		}
	};

	let run = pipeline::run(config, &mut models, index.as_mut())?;
	pipeline::report(&run);

	ui::success(&format!(
		"Compared {} × {} products in {:.1}s",
		run.source_count,
		run.target_count,
		start.elapsed().as_secs_f32()
	));

	Ok(())
}
