//! Shelfmatch - semantic product matching across retailer catalogs
//!
//! Normalizes the ALM and Dan Murphy's catalogs, embeds a synthesized
//! description per product and pairs products whose cosine similarity
//! clears a threshold.

use anyhow::Result;
use clap::{CommandFactory, Parser};
use std::path::PathBuf;

use shelfmatch::cli::{Cli, Command};
use shelfmatch::commands;
use shelfmatch::config::{Config, DEFAULT_CACHE_DIR};
use shelfmatch::ui::{self, Log};

fn main() -> Result<()> {
	dotenv::dotenv().ok();
	let cli = Cli::parse();

	Log::set_verbose(cli.verbose);

	let mut config = Config::from_env()?;
	config.provider = cli.provider;

	match cli.command {
		Command::Match(args) => {
			ui::print_logo();
			config.apply(&args);
			commands::matching::run(&config)
		}
		Command::Normalize { catalog, input, output } => commands::normalize::run(&catalog, &input, &output),
		Command::Clean { directory, auto_confirm } => {
			let dir = directory
				.or(config.cache_dir)
				.unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR));
			commands::clean::run(&dir, auto_confirm)
		}
		Command::Help { subcommand } => {
			let mut cmd = Cli::command();
			if let Some(sub) = subcommand {
				if let Some(sub_cmd) = cmd.find_subcommand_mut(&sub) {
					sub_cmd.print_help()?;
				} else {
					ui::error(&format!("Unknown subcommand: {}", sub));
					cmd.print_help()?;
				}
			} else {
				cmd.print_help()?;
			}
			Ok(())
		}
	}
}
