//! Core domain types

pub mod catalog;
pub mod embedding;
pub mod hash;
pub mod record;

pub use catalog::CatalogKind;
pub use embedding::Embedding;
pub use hash::TextHash;
pub use record::{Catalog, DescribedProduct, MatchRecord, Payload, ProductRecord, RawTable};
