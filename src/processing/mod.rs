//! # Matching Pipeline
//!
//! Normalization, description synthesis, sampling and match selection,
//! plus the driver that runs them in order.

pub mod describe;
pub mod matcher;
pub mod normalize;
pub mod pipeline;
pub mod sample;

pub use describe::{describe, describe_catalog};
pub use matcher::{find_matches, MatchParams};
pub use normalize::{normalize, normalize_tagged};
pub use sample::sample_rows;
