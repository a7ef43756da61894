//! # Shelfmatch Library
//!
//! Semantic product matching between two retailer catalogs (ALM and
//! Dan Murphy's) using MiniLM sentence embeddings and cosine similarity.
//! Provides catalog normalization, description synthesis, an in-memory and
//! a Qdrant-backed similarity index, and CSV result export.

pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod error;
pub mod index;
pub mod models;
pub mod processing;
pub mod runtime;
pub mod storage;
pub mod ui;
