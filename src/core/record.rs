//! Product records as they move through the pipeline

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::CatalogKind;

/// Tabular data as read from disk. `None` marks a missing cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
	pub headers: Vec<String>,
	pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
	pub fn new(headers: Vec<String>) -> Self {
		Self { headers, rows: Vec::new() }
	}

	/// Appends a row, padding or truncating it to the header width
	pub fn push_row(&mut self, mut row: Vec<Option<String>>) {
		row.resize(self.headers.len(), None);
		self.rows.push(row);
	}

	pub fn len(&self) -> usize {
		self.rows.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}

	pub fn has_column(&self, name: &str) -> bool {
		self.headers.iter().any(|h| h == name)
	}

	/// Keeps only the rows at `indices`, in the given order
	pub fn select(&self, indices: &[usize]) -> Self {
		Self {
			headers: self.headers.clone(),
			rows: indices.iter().filter_map(|&i| self.rows.get(i).cloned()).collect(),
		}
	}
}

/// One normalized catalog row. Values are trimmed, lowercased and never missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductRecord {
	fields: BTreeMap<String, String>,
}

impl ProductRecord {
	/// Value of `field`, or "" when the column does not exist
	pub fn get(&self, field: &str) -> &str {
		self.fields.get(field).map(String::as_str).unwrap_or("")
	}

	pub fn set(&mut self, field: &str, value: String) {
		self.fields.insert(field.to_string(), value);
	}

	pub fn contains(&self, field: &str) -> bool {
		self.fields.contains_key(field)
	}

	pub fn len(&self) -> usize {
		self.fields.len()
	}

	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
	}
}

impl FromIterator<(String, String)> for ProductRecord {
	fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
		Self { fields: iter.into_iter().collect() }
	}
}

/// A normalized catalog: records plus the column order they were read in
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
	pub kind: CatalogKind,
	pub columns: Vec<String>,
	pub records: Vec<ProductRecord>,
}

impl Catalog {
	pub fn len(&self) -> usize {
		self.records.len()
	}

	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}

	/// Re-expresses the catalog as a raw table so it can be fed back
	/// through normalization or written to disk
	pub fn to_table(&self) -> RawTable {
		let mut table = RawTable::new(self.columns.clone());
		for record in &self.records {
			let row = self
				.columns
				.iter()
				.map(|c| {
					let value = record.get(c);
					(!value.is_empty()).then(|| value.to_string())
				})
				.collect();
			table.push_row(row);
		}
		table
	}
}

/// A record with its synthesized description and positional id
#[derive(Debug, Clone, PartialEq)]
pub struct DescribedProduct {
	pub id: u64,
	pub kind: CatalogKind,
	pub record: ProductRecord,
	pub full_description: String,
}

impl DescribedProduct {
	pub fn key(&self) -> &str {
		self.record.get(self.kind.key_field())
	}

	/// Identifying metadata stored next to the vector in the index
	pub fn payload(&self) -> Payload {
		let fields = self
			.kind
			.report_fields()
			.iter()
			.map(|(_, field)| (field.to_string(), self.record.get(field).to_string()))
			.collect();

		Payload {
			key: self.key().to_string(),
			full_description: self.full_description.clone(),
			fields,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
	pub key: String,
	pub full_description: String,
	#[serde(default)]
	pub fields: BTreeMap<String, String>,
}

impl Payload {
	pub fn field(&self, name: &str) -> &str {
		self.fields.get(name).map(String::as_str).unwrap_or("")
	}
}

/// One accepted cross-catalog pair
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
	pub source: Payload,
	pub target: Payload,
	pub score: f32,
}
