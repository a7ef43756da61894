//! Description synthesis

use crate::core::{Catalog, DescribedProduct, ProductRecord};

/// Join the values of `fields` with single spaces, skipping empty values.
pub fn describe(record: &ProductRecord, fields: &[&str]) -> String {
	fields
		.iter()
		.map(|field| record.get(field))
		.filter(|value| !value.is_empty())
		.collect::<Vec<_>>()
		.join(" ")
}

/// Attach a `full_description` and a positional id to every record
pub fn describe_catalog(catalog: &Catalog) -> Vec<DescribedProduct> {
	let fields = catalog.kind.description_fields();
	catalog
		.records
		.iter()
		.enumerate()
		.map(|(id, record)| DescribedProduct {
			id: id as u64,
			kind: catalog.kind,
			record: record.clone(),
			full_description: describe(record, fields),
		})
		.collect()
}
