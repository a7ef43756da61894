//! Clean command - remove cached embeddings

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crate::storage::cache;
use crate::ui;

pub fn run(dir: &Path, auto_confirm: bool) -> anyhow::Result<()> {
    ui::info(&format!("Cache: {}", dir.display()));

    let files = cache::list(dir);
    if files.is_empty() {
        ui::success("No cached embeddings found");
        return Ok(());
    }

    ui::warn(&format!("Found {} cache files", files.len()));

    if !auto_confirm {
        print!("\nDelete them? [y/N]: ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            ui::info("Cancelled");
            return Ok(());
        }
    }

    for path in &files {
        fs::remove_file(path)?;
        ui::debug(&format!("Deleted: {}", path.display()));
    }

    ui::success(&format!("Cleaned {} cache files", files.len()));

    Ok(())
}
