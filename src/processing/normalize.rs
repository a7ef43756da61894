//! Field cleanup and sub-field extraction for raw catalog tables

use regex::Regex;
use std::sync::LazyLock;

use crate::core::{Catalog, CatalogKind, ProductRecord, RawTable};
use crate::error::{Error, Result};

// <digits><optional space><unit>, unit in {ml, l, g}. No leading boundary so
// multipack text like "24x375ml" still yields "375ml".
static SIZE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)\d+(?:\.\d+)?\s?(?:ml|l|g)\b").unwrap());

// <digits>% or %<digits>, optionally space separated
static PERCENT: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?\s?%|%\s?\d+(?:\.\d+)?").unwrap());

static PACKAGING: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)\b(?:bottle|can|pack|box|carton)\b").unwrap());

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Normalize a raw table for the catalog identified by `tag`.
///
/// Fails with [`Error::UnsupportedCatalog`] before any row is touched
/// when the tag is not recognized.
pub fn normalize_tagged(table: &RawTable, tag: &str) -> Result<Catalog> {
	let kind: CatalogKind = tag.parse()?;
	normalize(table, kind)
}

/// Normalize a raw table: trim and lowercase every value, fill missing
/// cells with "", then run the catalog's extraction rules on its
/// free-text field.
pub fn normalize(table: &RawTable, kind: CatalogKind) -> Result<Catalog> {
	for column in kind.required_fields() {
		if !table.has_column(column) {
			return Err(Error::MissingColumn {
				catalog: kind.tag().to_string(),
				column: column.to_string(),
			});
		}
	}

	let mut columns = table.headers.clone();
	if !table.has_column(kind.extracted_field()) {
		columns.push(kind.extracted_field().to_string());
	}

	let records = table
		.rows
		.iter()
		.map(|row| {
			let mut record = clean_row(&table.headers, row);
			if !record.contains(kind.extracted_field()) {
				record.set(kind.extracted_field(), String::new());
			}
			match kind {
				CatalogKind::Alm => extract_alm(&mut record),
				CatalogKind::DanMurphys => extract_danmurphys(&mut record)?,
			}
			Ok(record)
		})
		.collect::<Result<Vec<_>>>()?;

	Ok(Catalog { kind, columns, records })
}

fn clean_row(headers: &[String], row: &[Option<String>]) -> ProductRecord {
	headers
		.iter()
		.zip(row.iter())
		.map(|(header, cell)| {
			let value = cell
				.as_deref()
				.map(|v| v.trim().to_lowercase())
				.unwrap_or_default();
			(header.clone(), value)
		})
		.collect()
}

fn extract_alm(record: &mut ProductRecord) {
	let kind = CatalogKind::Alm;
	let (size, text) = settle(record.get(kind.text_field()), &SIZE, &[&*PACKAGING]);
	if let Some(size) = size {
		record.set(kind.extracted_field(), size);
	}
	record.set(kind.text_field(), text);
}

fn extract_danmurphys(record: &mut ProductRecord) -> Result<()> {
	let kind = CatalogKind::DanMurphys;

	let package_size = record.get("PACKAGE_SIZE");
	let package_size = if package_size.is_empty() {
		None
	} else {
		Some(exact_phrase(package_size)?)
	};

	let mut noise: Vec<&Regex> = vec![&*PACKAGING];
	noise.extend(package_size.as_ref());

	let (volume, text) = settle(record.get(kind.text_field()), &PERCENT, &noise);
	if let Some(volume) = volume {
		record.set(kind.extracted_field(), volume);
	}
	record.set(kind.text_field(), text);
	Ok(())
}

/// Extracts `pattern` and strips every `noise` match until the text stops
/// changing. A removal can join a number to its unit ("700 bottle ml"), so
/// a single pass would leave tokens for the next normalization to find.
///
/// Returns the first token found and the settled, whitespace-collapsed text.
fn settle(text: &str, pattern: &Regex, noise: &[&Regex]) -> (Option<String>, String) {
	let mut first = None;
	let mut text = collapse_whitespace(text);

	loop {
		let (token, mut next) = take_token(pattern, &text);
		first = first.or(token);
		for re in noise {
			next = re.replace_all(&next, "").into_owned();
		}

		let next = collapse_whitespace(&next);
		if next == text {
			return (first, text);
		}
		text = next;
	}
}

/// Returns the first match of `pattern` and `text` with every match removed
fn take_token(pattern: &Regex, text: &str) -> (Option<String>, String) {
	let token = pattern.find(text).map(|m| m.as_str().to_string());
	match token {
		Some(token) => (Some(token), pattern.replace_all(text, "").into_owned()),
		None => (None, text.to_string()),
	}
}

/// Pattern for `phrase` as a whole word: boundaries are only asserted on
/// sides where the phrase starts or ends with a word character.
fn exact_phrase(phrase: &str) -> Result<Regex> {
	let is_word = |c: char| c.is_alphanumeric() || c == '_';
	let lead = if phrase.starts_with(is_word) { r"\b" } else { "" };
	let tail = if phrase.ends_with(is_word) { r"\b" } else { "" };
	Ok(Regex::new(&format!("{}{}{}", lead, regex::escape(phrase), tail))?)
}

fn collapse_whitespace(text: &str) -> String {
	WHITESPACE.replace_all(text, " ").trim().to_string()
}
