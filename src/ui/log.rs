//! Unified logging system

use chrono::{Datelike, Local};
use colored::*;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

static VERBOSE: AtomicBool = AtomicBool::new(false);

const LOGO: &str = r#"
       __         ______              __      __
  ___ / /  ___ __/ / _/_ _  ___ _____/ /_____/ /
 (_-</ _ \/ -_) / / _/  ' \/ _ `/ __/ __/ __/ _ \
/___/_//_/\__/_/_/_//_/_/_/\_,_/\__/\__/\__/_//_/ "#;

const SLOGANS: &[&str] = &[
	"Same gin, different shelf",
	"700ml by any other name",
	"Cosine says they're twins",
	"Two catalogs walk into a bar",
	"Normalizing your SKUs since today",
	"\"Trust me bro, it's the same vodka\"",
	"Bottle, can, pack, box, carton. Gone.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
	Info,
	Success,
	Warning,
	Error,
	Debug,
}

/// Slogan of the day
pub fn slogan() -> &'static str {
	SLOGANS[Local::now().ordinal() as usize % SLOGANS.len()]
}

pub fn print_logo() {
	println!("{}", LOGO.bright_blue().bold());
	println!("{}", slogan().dimmed().italic());
}

pub struct Log;

impl Log {
	pub fn set_verbose(enabled: bool) {
		VERBOSE.store(enabled, Ordering::Relaxed);
	}

	pub fn is_verbose() -> bool {
		VERBOSE.load(Ordering::Relaxed)
	}
}

/// Prints an icon-prefixed message; verbose runs also get a timestamp.
pub fn log(level: Level, msg: &str) {
	if level == Level::Debug && !Log::is_verbose() {
		return;
	}

	let icon = match level {
		Level::Info => "ℹ".bright_blue().bold(),
		Level::Success => "✓".bright_green().bold(),
		Level::Warning => "⚠".bright_yellow().bold(),
		Level::Error => "✗".bright_red().bold(),
		Level::Debug => "⚙".bright_black().bold(),
	};
	let text = match level {
		Level::Debug => msg.dimmed(),
		_ => msg.bright_white(),
	};

	if Log::is_verbose() {
		let time = Local::now().format("%H:%M:%S").to_string().dimmed();
		println!("[{}] {} {}", time, icon, text);
	} else {
		println!("{} {}", icon, text);
	}
}

pub fn info(msg: &str) {
	log(Level::Info, msg);
}

pub fn success(msg: &str) {
	log(Level::Success, msg);
}

pub fn warn(msg: &str) {
	log(Level::Warning, msg);
}

pub fn error(msg: &str) {
	log(Level::Error, msg);
}

pub fn debug(msg: &str) {
	log(Level::Debug, msg);
}

pub fn header(text: &str) {
	println!("\n{}", format!("─── {} ───", text).bright_blue().bold());
}

/// Clickable file path (OSC 8 terminal hyperlink) showing the file name
pub fn path_link(path: &Path, max_len: usize) -> String {
	let absolute = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

	let uri = if cfg!(windows) {
		let path_str = absolute.to_string_lossy();
		let cleaned = path_str.strip_prefix(r"\\?\").unwrap_or(&path_str);
		format!("file:///{}", cleaned.replace('\\', "/"))
	} else {
		format!("file://{}", absolute.display())
	};

	let display = path.display().to_string();
	format!("\x1b]8;;{}\x1b\\{}\x1b]8;;\x1b\\", uri, shorten(&display, max_len))
}

/// Keeps head and tail of long names, joined by "..."
fn shorten(text: &str, max_len: usize) -> String {
	let chars: Vec<char> = text.chars().collect();
	if chars.len() <= max_len || max_len < 8 {
		return text.to_string();
	}
	let head = max_len / 2;
	let tail = max_len - head - 3;
	let start: String = chars[..head].iter().collect();
	let end: String = chars[chars.len() - tail..].iter().collect();
	format!("{}...{}", start, end)
}
