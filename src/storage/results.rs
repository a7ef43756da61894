//! Match result files

use anyhow::{Context, Result};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::{CatalogKind, MatchRecord, Payload};

/// Column headers for a source → target result file
pub fn headers(source: CatalogKind, target: CatalogKind) -> Vec<String> {
	let mut headers = side_headers(source);
	headers.extend(side_headers(target));
	headers.push("Similarity Score".to_string());
	headers
}

fn side_headers(kind: CatalogKind) -> Vec<String> {
	let name = kind.display_name();
	kind.report_fields()
		.iter()
		.map(|(label, _)| format!("{} {}", name, label))
		.chain([format!("{} Description", name), format!("{} ID", name)])
		.collect()
}

pub fn row(record: &MatchRecord, source: CatalogKind, target: CatalogKind) -> Vec<String> {
	let mut row = side_values(&record.source, source);
	row.extend(side_values(&record.target, target));
	row.push(record.score.to_string());
	row
}

fn side_values(payload: &Payload, kind: CatalogKind) -> Vec<String> {
	kind.report_fields()
		.iter()
		.map(|(_, field)| payload.field(field).to_string())
		.chain([payload.full_description.clone(), payload.key.clone()])
		.collect()
}

/// `matching_<timestamp>.csv` inside `dir`, stamped to the second
pub fn output_path(dir: &Path) -> PathBuf {
	let timestamp = Local::now().format("%Y-%m-%dT%H%M%S");
	dir.join(format!("matching_{}.csv", timestamp))
}

/// Write all matches to a fresh timestamped CSV file under `dir`
pub fn save_matches(
	records: &[MatchRecord],
	dir: &Path,
	source: CatalogKind,
	target: CatalogKind,
) -> Result<PathBuf> {
	fs::create_dir_all(dir)
		.with_context(|| format!("Failed to create results directory {}", dir.display()))?;

	let path = output_path(dir);
	let mut writer = csv::Writer::from_path(&path)
		.with_context(|| format!("Failed to create {}", path.display()))?;

	writer.write_record(headers(source, target))?;
	for record in records {
		writer.write_record(row(record, source, target))?;
	}
	writer.flush().context("Failed to flush results")?;

	Ok(path)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn payload(key: &str, fields: &[(&str, &str)]) -> Payload {
		Payload {
			key: key.to_string(),
			full_description: format!("{} description", key),
			fields: fields.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
		}
	}

	#[test]
	fn headers_cover_both_sides() {
		let headers = headers(CatalogKind::Alm, CatalogKind::DanMurphys);
		assert_eq!(headers.first().map(String::as_str), Some("ALM Product"));
		assert!(headers.contains(&"ALM ID".to_string()));
		assert!(headers.contains(&"Dan Murphy's Price".to_string()));
		assert!(headers.contains(&"Dan Murphy's ID".to_string()));
		assert_eq!(headers.last().map(String::as_str), Some("Similarity Score"));
	}

	#[test]
	fn rows_line_up_with_headers() {
		let record = MatchRecord {
			source: payload("A1", &[("ITEM_DESCRIPTION", "vodka"), ("ITEM_BRAND", "absolut")]),
			target: payload("D9", &[("PRODUCT_NAME", "absolut vodka"), ("PRICE", "45")]),
			score: 0.5,
		};
		let headers = headers(CatalogKind::Alm, CatalogKind::DanMurphys);
		let row = row(&record, CatalogKind::Alm, CatalogKind::DanMurphys);
		assert_eq!(headers.len(), row.len());

		let cell = |name: &str| &row[headers.iter().position(|h| h == name).unwrap()];
		assert_eq!(cell("ALM Brand"), "absolut");
		assert_eq!(cell("ALM ID"), "A1");
		assert_eq!(cell("Dan Murphy's Price"), "45");
		assert_eq!(cell("Dan Murphy's Description"), "D9 description");
		assert_eq!(cell("Similarity Score"), "0.5");
	}

	#[test]
	fn saves_timestamped_file() {
		let dir = tempfile::tempdir().unwrap();
		let out = dir.path().join("matchings");
		let path = save_matches(&[], &out, CatalogKind::DanMurphys, CatalogKind::Alm).unwrap();

		let name = path.file_name().unwrap().to_string_lossy().to_string();
		assert!(name.starts_with("matching_") && name.ends_with(".csv"));
		let content = fs::read_to_string(&path).unwrap();
		assert!(content.starts_with("Dan Murphy's Product,"));
		assert_eq!(content.lines().count(), 1);
	}
}
