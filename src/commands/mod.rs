//! # Command Implementations
//!
//! Each submodule handles one CLI command (match, normalize, clean).

pub mod clean;
pub mod matching;
pub mod normalize;
