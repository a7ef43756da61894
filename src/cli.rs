use clap::builder::styling::{AnsiColor, Color, Style, Styles};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;

use crate::config::Backend;

/// Execution provider for ONNX Runtime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Provider {
	/// Auto-detect best available (TensorRT → CUDA → CoreML → XNNPACK → CPU)
	#[default]
	Auto,
	/// CPU only
	Cpu,
	/// NVIDIA CUDA GPU
	Cuda,
	/// NVIDIA TensorRT (optimized inference)
	Tensorrt,
	/// Apple CoreML (macOS only)
	Coreml,
	/// XNNPACK CPU acceleration
	Xnnpack,
}

fn parse_threshold(s: &str) -> Result<f32, String> {
	let val: f32 = s.parse().map_err(|_| format!("'{}' is not a valid number", s))?;
	if !(0.0..=1.0).contains(&val) {
		Err(format!("threshold must be between 0.0 and 1.0, got {}", val))
	} else {
		Ok(val)
	}
}

fn parse_positive(s: &str) -> Result<usize, String> {
	match s.parse::<usize>() {
		Ok(0) => Err("value must be at least 1".to_string()),
		Ok(v) => Ok(v),
		Err(_) => Err(format!("'{}' is not a valid count", s)),
	}
}

fn styles() -> Styles {
	let blue = Some(Color::Ansi(AnsiColor::Blue));
	Styles::styled()
		.header(Style::new().bold().fg_color(blue))
		.usage(Style::new().bold().fg_color(blue))
		.literal(Style::new().fg_color(blue))
		.placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow))))
		.valid(Style::new().fg_color(blue))
		.invalid(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Red))))
}

#[derive(Parser, Debug)]
#[command(
	name = "shelfmatch",
	author,
	version,
	about = "Semantic product matching across retailer catalogs",
	styles = styles(),
	disable_help_subcommand = true,
	after_help = format!(
		"{title}
  {bin} {run}      {run_args}   {run_desc}
  {bin} {run}      {qdrant_args}     {qdrant_desc}
  {bin} {norm}  {norm_args}   {norm_desc}
  {bin} {help}       {help_args}                     {help_desc}",
		title = "Examples:".bright_blue().bold(),
		bin = "shelfmatch".bright_blue(),
		run = "match".yellow(),
		run_args = "-t 0.85 -k 3 --sample 500",
		run_desc = "Match a 500-row sample".dimmed(),
		qdrant_args = "--backend qdrant --reverse",
		qdrant_desc = "Dan Murphy's → ALM via Qdrant".dimmed(),
		norm = "normalize".yellow(),
		norm_args = "-c alm -i alm.csv -o out.csv",
		norm_desc = "Inspect normalized catalog".dimmed(),
		help = "help".yellow(),
		help_args = "match",
		help_desc = "Show help for match".dimmed(),
	),
)]
pub struct Cli {
	/// Enable verbose debug output
	#[arg(short = 'v', long = "verbose", global = true)]
	pub verbose: bool,

	/// Execution provider: auto, cpu, cuda, tensorrt, coreml, xnnpack
	#[arg(short = 'p', long = "provider", global = true, default_value = "auto")]
	pub provider: Provider,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Match products of one catalog against the other
	Match(MatchArgs),

	/// Normalize a single catalog and write it back out
	Normalize {
		/// Catalog type: ALM or DANMURPHYS
		#[arg(short = 'c', long = "catalog")]
		catalog: String,

		/// Pipe-delimited input file
		#[arg(short = 'i', long = "input", value_name = "PATH")]
		input: PathBuf,

		/// Output file (pipe-delimited, adds full_description)
		#[arg(short = 'o', long = "output", value_name = "PATH")]
		output: PathBuf,
	},

	/// Delete cached embeddings
	Clean {
		/// Cache directory (defaults to SHELFMATCH_CACHE_DIR or .shelfmatch)
		#[arg(short = 'd', long = "dir")]
		directory: Option<PathBuf>,

		/// Skip confirmation prompt
		#[arg(short = 'y', long = "yes")]
		auto_confirm: bool,
	},

	/// Show help for a subcommand
	Help {
		/// Subcommand name
		subcommand: Option<String>,
	},
}

/// Flags for `match`; each one overrides its environment variable
#[derive(Args, Debug, Clone, Default)]
pub struct MatchArgs {
	/// ALM catalog file (ALM_FILE_PATH)
	#[arg(long = "alm", value_name = "PATH")]
	pub alm: Option<PathBuf>,

	/// Dan Murphy's catalog file (DANMURPHYS_FILE_PATH)
	#[arg(long = "danmurphys", value_name = "PATH")]
	pub danmurphys: Option<PathBuf>,

	/// Index backend (INDEX_BACKEND)
	#[arg(short = 'b', long = "backend")]
	pub backend: Option<Backend>,

	/// Minimum similarity score, inclusive (SIMILARITY_THRESHOLD)
	#[arg(short = 't', long = "threshold", value_parser = parse_threshold)]
	pub threshold: Option<f32>,

	/// Neighbors considered per product (TOP_K_RESULTS)
	#[arg(short = 'k', long = "top-k", value_parser = parse_positive)]
	pub top_k: Option<usize>,

	/// Rows sampled from each catalog, 0 = all (SAMPLE_SIZE)
	#[arg(short = 's', long = "sample")]
	pub sample: Option<usize>,

	/// Descriptions per embedding batch
	#[arg(long = "batch-size", value_parser = parse_positive)]
	pub batch_size: Option<usize>,

	/// Results directory (MATCHINGS_DIR)
	#[arg(short = 'o', long = "output", value_name = "DIR")]
	pub output: Option<PathBuf>,

	/// Always re-embed, ignoring and not writing the cache
	#[arg(long = "no-cache")]
	pub no_cache: bool,

	/// Use Dan Murphy's as the source catalog
	#[arg(short = 'r', long = "reverse")]
	pub reverse: bool,
}
