//! Retailer catalogs and their column layouts

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogKind {
	/// ALM wholesale catalog ("A")
	Alm,
	/// Dan Murphy's retail catalog ("B")
	DanMurphys,
}

impl CatalogKind {
	/// Canonical tag, as used in collection and cache names
	pub fn tag(self) -> &'static str {
		match self {
			CatalogKind::Alm => "ALM",
			CatalogKind::DanMurphys => "DANMURPHYS",
		}
	}

	/// Human-facing name used in reports and result headers
	pub fn display_name(self) -> &'static str {
		match self {
			CatalogKind::Alm => "ALM",
			CatalogKind::DanMurphys => "Dan Murphy's",
		}
	}

	/// Primary key column carried through the pipeline in each payload
	pub fn key_field(self) -> &'static str {
		match self {
			CatalogKind::Alm => "ITEM_NUMBER",
			CatalogKind::DanMurphys => "STOCKCODE",
		}
	}

	/// Free-text column that sub-fields are extracted from
	pub fn text_field(self) -> &'static str {
		match self {
			CatalogKind::Alm => "ITEM_DESCRIPTION",
			CatalogKind::DanMurphys => "PRODUCT_NAME",
		}
	}

	/// Column receiving the extracted size or strength token
	pub fn extracted_field(self) -> &'static str {
		match self {
			CatalogKind::Alm => "ITEM_SIZE",
			CatalogKind::DanMurphys => "ALCOHOL_VOLUME",
		}
	}

	/// Ordered fields concatenated into `full_description`
	pub fn description_fields(self) -> &'static [&'static str] {
		match self {
			CatalogKind::Alm => &[
				"ITEM_DESCRIPTION",
				"ITEM_BRAND",
				"ITEM_SIZE",
				"RETAIL_UNIT_LUC_PACK",
				"CATEGORY",
				"ALCOHOL_STRENGTH_PERC",
			],
			CatalogKind::DanMurphys => &[
				"PRODUCT_NAME",
				"BRAND",
				"PACKAGE_SIZE",
				"PACK_FORMAT",
				"CATEGORY",
				"ALCOHOL_VOLUME",
			],
		}
	}

	/// (column label, field) pairs written to the match report
	pub fn report_fields(self) -> &'static [(&'static str, &'static str)] {
		match self {
			CatalogKind::Alm => &[
				("Product", "ITEM_DESCRIPTION"),
				("Brand", "ITEM_BRAND"),
				("Pack Size", "ITEM_SIZE"),
				("Pack Format", "RETAIL_UNIT_LUC_PACK"),
			],
			CatalogKind::DanMurphys => &[
				("Product", "PRODUCT_NAME"),
				("Brand", "BRAND"),
				("Pack Size", "PACKAGE_SIZE"),
				("Pack Format", "PACK_FORMAT"),
				("Price", "PRICE"),
			],
		}
	}

	/// Columns that must be present in the raw table
	pub fn required_fields(self) -> [&'static str; 2] {
		[self.key_field(), self.text_field()]
	}
}

impl FromStr for CatalogKind {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_uppercase().as_str() {
			"ALM" | "A" => Ok(CatalogKind::Alm),
			"DANMURPHYS" | "DAN_MURPHYS" | "B" => Ok(CatalogKind::DanMurphys),
			_ => Err(Error::UnsupportedCatalog(s.to_string())),
		}
	}
}

impl fmt::Display for CatalogKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.tag())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_known_tags_case_insensitively() {
		assert_eq!("alm".parse::<CatalogKind>().unwrap(), CatalogKind::Alm);
		assert_eq!(" DanMurphys ".parse::<CatalogKind>().unwrap(), CatalogKind::DanMurphys);
		assert_eq!("b".parse::<CatalogKind>().unwrap(), CatalogKind::DanMurphys);
	}

	#[test]
	fn rejects_unknown_tag() {
		let err = "BWS".parse::<CatalogKind>().unwrap_err();
		assert!(matches!(err, Error::UnsupportedCatalog(ref tag) if tag == "BWS"));
	}

	#[test]
	fn extracted_field_is_part_of_description() {
		for kind in [CatalogKind::Alm, CatalogKind::DanMurphys] {
			assert!(kind.description_fields().contains(&kind.extracted_field()));
			assert_eq!(kind.description_fields()[0], kind.text_field());
		}
	}
}
