//! Normalize command - clean a single catalog for inspection

use anyhow::{Context, Result};
use std::fs::File;
use std::path::Path;

use crate::core::CatalogKind;
use crate::processing::{describe_catalog, normalize_tagged};
use crate::storage::{self, table::CATALOG_DELIMITER};
use crate::ui;

pub fn run(catalog: &str, input: &Path, output: &Path) -> Result<()> {
	let kind: CatalogKind = catalog.parse()?;
	ui::info(&format!("Normalizing {} catalog: {}", kind.display_name(), input.display()));

	let raw = storage::read_catalog(input)?;
	let normalized = normalize_tagged(&raw, kind.tag())?;
	let described = describe_catalog(&normalized);

	let mut table = normalized.to_table();
	table.headers.push("full_description".to_string());
	for (row, product) in table.rows.iter_mut().zip(&described) {
		row.push(Some(product.full_description.clone()));
	}

	if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
		std::fs::create_dir_all(parent)?;
	}
	let file = File::create(output)
		.with_context(|| format!("Failed to create {}", output.display()))?;
	storage::write_table(file, &table, CATALOG_DELIMITER)?;

	let extracted = normalized
		.records
		.iter()
		.filter(|r| !r.get(kind.extracted_field()).is_empty())
		.count();
	ui::debug(&format!("{} rows carry {}", extracted, kind.extracted_field()));
	ui::success(&format!(
		"Wrote {} normalized rows to {}",
		table.len(),
		ui::path_link(output, 60)
	));

	Ok(())
}
