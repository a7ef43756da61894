//! Application configuration and constants
//!
//! A [`Config`] is built once at startup from the environment (a `.env`
//! file is loaded first when present), overridden by command-line flags and
//! then passed down explicitly.

use anyhow::{Context, Result};
use clap::ValueEnum;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::cli::{MatchArgs, Provider};
use crate::core::CatalogKind;
use crate::index::QdrantSettings;

// === Model Files ===
pub const TEXT_MODEL: &str = "model.onnx";
pub const TOKENIZER: &str = "tokenizer.json";
pub const MODEL_ID: &str = "all-MiniLM-L6-v2";

// === Model Parameters ===
pub const EMBEDDING_DIM: usize = 384;
pub const MAX_TOKENS: usize = 256;

// === Environment ===
pub const ENV_MODELS_DIR: &str = "SHELFMATCH_MODELS_DIR";

// === Defaults ===
pub const DEFAULT_ALM_FILE: &str = "products/20241101_ALM_PRODUCTS.csv";
pub const DEFAULT_DANMURPHYS_FILE: &str = "products/20241101_DANMURPHYS_PRODUCTS.csv";
pub const DEFAULT_QDRANT_HOST: &str = "localhost";
pub const DEFAULT_QDRANT_PORT: u16 = 6333;
pub const DEFAULT_ALM_COLLECTION: &str = "alm_products";
pub const DEFAULT_DANMURPHYS_COLLECTION: &str = "danmurphys_products";
pub const DEFAULT_THRESHOLD: f32 = 0.8;
pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_BATCH_SIZE: usize = 64;
pub const DEFAULT_OUTPUT_DIR: &str = "matchings";
pub const DEFAULT_CACHE_DIR: &str = ".shelfmatch";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_RETRIES: usize = 4;

/// Where target vectors are stored and searched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Backend {
	/// Exact brute-force search in process
	#[default]
	Memory,
	/// Qdrant vector database
	Qdrant,
}

impl FromStr for Backend {
	type Err = anyhow::Error;

	fn from_str(s: &str) -> Result<Self> {
		match s.trim().to_ascii_lowercase().as_str() {
			"memory" | "mem" => Ok(Backend::Memory),
			"qdrant" => Ok(Backend::Qdrant),
			other => anyhow::bail!("unknown index backend '{}'", other),
		}
	}
}

#[derive(Debug, Clone)]
pub struct Config {
	pub alm_path: PathBuf,
	pub danmurphys_path: PathBuf,
	/// Catalog whose products are looked up in the other one
	pub source: CatalogKind,
	pub backend: Backend,
	pub qdrant: QdrantSettings,
	pub alm_collection: String,
	pub danmurphys_collection: String,
	/// 0 = use the full dataset
	pub sample_size: usize,
	pub threshold: f32,
	pub top_k: usize,
	pub batch_size: usize,
	pub output_dir: PathBuf,
	/// `None` disables the embedding cache
	pub cache_dir: Option<PathBuf>,
	pub models_dir: Option<PathBuf>,
	pub provider: Provider,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			alm_path: PathBuf::from(DEFAULT_ALM_FILE),
			danmurphys_path: PathBuf::from(DEFAULT_DANMURPHYS_FILE),
			source: CatalogKind::Alm,
			backend: Backend::Memory,
			qdrant: QdrantSettings {
				host: DEFAULT_QDRANT_HOST.to_string(),
				port: DEFAULT_QDRANT_PORT,
				timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
				max_retries: DEFAULT_MAX_RETRIES,
				upsert_batch: 256,
			},
			alm_collection: DEFAULT_ALM_COLLECTION.to_string(),
			danmurphys_collection: DEFAULT_DANMURPHYS_COLLECTION.to_string(),
			sample_size: 0,
			threshold: DEFAULT_THRESHOLD,
			top_k: DEFAULT_TOP_K,
			batch_size: DEFAULT_BATCH_SIZE,
			output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
			cache_dir: Some(PathBuf::from(DEFAULT_CACHE_DIR)),
			models_dir: None,
			provider: Provider::Auto,
		}
	}
}

impl Config {
	/// Reads the process environment
	pub fn from_env() -> Result<Self> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Builds a config from any variable source, falling back to defaults
	pub fn from_lookup<F>(lookup: F) -> Result<Self>
	where
		F: Fn(&str) -> Option<String>,
	{
		let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
		let mut config = Self::default();

		if let Some(v) = var("ALM_FILE_PATH") {
			config.alm_path = PathBuf::from(v);
		}
		if let Some(v) = var("DANMURPHYS_FILE_PATH") {
			config.danmurphys_path = PathBuf::from(v);
		}
		if let Some(v) = var("INDEX_BACKEND") {
			config.backend = v.parse()?;
		}
		if let Some(v) = var("QDRANT_HOST") {
			config.qdrant.host = v;
		}
		if let Some(v) = var("QDRANT_PORT") {
			config.qdrant.port = parse_var("QDRANT_PORT", &v)?;
		}
		if let Some(v) = var("QDRANT_TIMEOUT_SECS") {
			config.qdrant.timeout = Duration::from_secs(parse_var("QDRANT_TIMEOUT_SECS", &v)?);
		}
		if let Some(v) = var("QDRANT_MAX_RETRIES") {
			config.qdrant.max_retries = parse_var("QDRANT_MAX_RETRIES", &v)?;
		}
		if let Some(v) = var("ALM_COLLECTION_NAME") {
			config.alm_collection = v;
		}
		if let Some(v) = var("DANMURPHYS_COLLECTION_NAME") {
			config.danmurphys_collection = v;
		}
		if let Some(v) = var("SAMPLE_SIZE") {
			config.sample_size = parse_var("SAMPLE_SIZE", &v)?;
		}
		if let Some(v) = var("SIMILARITY_THRESHOLD") {
			config.threshold = parse_var("SIMILARITY_THRESHOLD", &v)?;
		}
		if let Some(v) = var("TOP_K_RESULTS") {
			config.top_k = parse_var("TOP_K_RESULTS", &v)?;
		}
		if let Some(v) = var("MATCHINGS_DIR") {
			config.output_dir = PathBuf::from(v);
		}
		if let Some(v) = var("SHELFMATCH_CACHE_DIR") {
			config.cache_dir = Some(PathBuf::from(v));
		}
		if let Some(v) = var(ENV_MODELS_DIR) {
			config.models_dir = Some(PathBuf::from(v));
		}

		Ok(config)
	}

	/// Applies `match` subcommand flags on top of the environment
	pub fn apply(&mut self, args: &MatchArgs) {
		if let Some(path) = &args.alm {
			self.alm_path = path.clone();
		}
		if let Some(path) = &args.danmurphys {
			self.danmurphys_path = path.clone();
		}
		if let Some(backend) = args.backend {
			self.backend = backend;
		}
		if let Some(threshold) = args.threshold {
			self.threshold = threshold;
		}
		if let Some(top_k) = args.top_k {
			self.top_k = top_k;
		}
		if let Some(sample) = args.sample {
			self.sample_size = sample;
		}
		if let Some(batch_size) = args.batch_size {
			self.batch_size = batch_size;
		}
		if let Some(dir) = &args.output {
			self.output_dir = dir.clone();
		}
		if args.no_cache {
			self.cache_dir = None;
		}
		if args.reverse {
			self.source = CatalogKind::DanMurphys;
		}
	}

	pub fn validate(&self) -> Result<()> {
		anyhow::ensure!(
			(0.0..=1.0).contains(&self.threshold),
			"similarity threshold must be between 0.0 and 1.0, got {}",
			self.threshold
		);
		anyhow::ensure!(self.top_k >= 1, "top-k must be at least 1");
		anyhow::ensure!(self.batch_size >= 1, "batch size must be at least 1");
		anyhow::ensure!(
			self.alm_collection != self.danmurphys_collection,
			"catalog collections must have distinct names"
		);
		Ok(())
	}

	pub fn target(&self) -> CatalogKind {
		match self.source {
			CatalogKind::Alm => CatalogKind::DanMurphys,
			CatalogKind::DanMurphys => CatalogKind::Alm,
		}
	}

	pub fn catalog_path(&self, kind: CatalogKind) -> &PathBuf {
		match kind {
			CatalogKind::Alm => &self.alm_path,
			CatalogKind::DanMurphys => &self.danmurphys_path,
		}
	}

	pub fn collection(&self, kind: CatalogKind) -> &str {
		match kind {
			CatalogKind::Alm => &self.alm_collection,
			CatalogKind::DanMurphys => &self.danmurphys_collection,
		}
	}

	/// Models directory: configured path, or `models/` next to the executable
	pub fn resolved_models_dir(&self) -> Option<PathBuf> {
		if let Some(custom) = &self.models_dir {
			crate::ui::debug(&format!("Using models dir: {}", custom.display()));
			return Some(custom.clone());
		}

		let exe = std::env::current_exe().ok()?;
		let models = exe.parent()?.join("models");
		if models.is_dir() {
			crate::ui::debug(&format!("Found models at: {}", models.display()));
			return Some(models);
		}
		None
	}

	pub fn text_model_path(&self) -> Option<PathBuf> {
		self.resolved_models_dir().map(|d| d.join(TEXT_MODEL))
	}

	pub fn tokenizer_path(&self) -> Option<PathBuf> {
		self.resolved_models_dir().map(|d| d.join(TOKENIZER))
	}
}

fn parse_var<T>(name: &str, value: &str) -> Result<T>
where
	T: FromStr,
	T::Err: std::error::Error + Send + Sync + 'static,
{
	value
		.trim()
		.parse()
		.with_context(|| format!("invalid value for {}: '{}'", name, value))
}
