//! Catalog, cache and result file storage

pub mod cache;
pub mod results;
pub mod table;

pub use cache::EmbeddingCache;
pub use results::save_matches;
pub use table::{read_catalog, read_table, write_table};
