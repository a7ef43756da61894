//! Typed failures raised by the matching core

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
	#[error("Unsupported catalog: {0}")]
	UnsupportedCatalog(String),

	#[error("Catalog {catalog} is missing required column {column}")]
	MissingColumn { catalog: String, column: String },

	#[error("Collection not found: {0}")]
	CollectionNotFound(String),

	#[error("Invalid vector dimension: expected {expected}, got {actual}")]
	InvalidDimension { expected: usize, actual: usize },

	#[error("Index service error: {0}")]
	Upstream(String),

	#[error("Invalid pattern: {0}")]
	Pattern(#[from] regex::Error),
}
