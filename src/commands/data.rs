//! Backup export and import, and the full reset.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use colored::Colorize;
use serde_json::Value;

use crate::cli::context::RunContext;
use crate::output::json::to_json;
use crate::output::table;
use crate::store::Store;

pub fn export(store: &Store, output: Option<&Path>) -> Result<()> {
    let document = to_json(&store.export());
    match output {
        Some(path) => {
            fs::write(path, document + "\n").with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("[kbv] Exported to {}", path.display());
        }
        None => println!("{}", document),
    }
    Ok(())
}

pub fn import(store: &mut Store, file: &Path, ctx: &RunContext) -> Result<()> {
    let content = fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let document: Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a valid JSON backup", file.display()))?;

    let summary = store.import(document)?;
    ctx.output_mode.emit(&summary, || table::format_import_summary(&summary));
    Ok(())
}

pub fn reset(store: &mut Store, yes: bool) -> Result<()> {
    if !yes {
        bail!("This deletes every speaker, host, visit, template and sync setting. Run again with --yes to confirm.");
    }
    store.reset()?;
    eprintln!("{} All data deleted.", "✓".green());
    Ok(())
}
