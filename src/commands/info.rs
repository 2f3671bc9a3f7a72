use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use crate::cli::context::RunContext;
use crate::db::legacy::CURRENT_SCHEMA_VERSION;
use crate::db::migrations::get_schema_version;
use crate::output::format::OutputMode;
use crate::output::json::{EntryJson, InfoJson, to_json};
use crate::store::Store;

/// Run info command
pub fn run(store: &Store, db_path: &Path, ctx: &RunContext) -> Result<()> {
    let info = InfoJson {
        version: env!("KBV_VERSION"),
        db_path: db_path.display().to_string(),
        db_size_bytes: std::fs::metadata(db_path).map(|m| m.len()).unwrap_or(0),
        table_schema_version: get_schema_version(store.connection())?,
        data_schema_version: CURRENT_SCHEMA_VERSION,
        speakers: store.speakers().len(),
        hosts: store.hosts().len(),
        visits: store.visits().len(),
        archived_visits: store.archived_visits().len(),
        google_sheet_configured: !store.google_sheet_id().is_empty(),
        google_api_key_configured: !store.google_api_key().is_empty(),
        entries: store
            .storage_entries()?
            .into_iter()
            .map(|(key, bytes)| EntryJson { key, bytes })
            .collect(),
    };

    match ctx.output_mode {
        OutputMode::Json => println!("{}", to_json(&info)),
        OutputMode::Tty => print_tty(&info),
    }

    Ok(())
}

fn print_tty(info: &InfoJson) {
    println!("{}", "Content".bold());
    println!("{}", "───────".dimmed());
    println!("Speakers:         {}", info.speakers);
    println!("Hosts:            {}", info.hosts);
    println!("Visits:           {}", info.visits);
    println!("Archived visits:  {}", info.archived_visits);
    println!(
        "Spreadsheet sync: {}",
        if info.google_sheet_configured && info.google_api_key_configured {
            "configured".green().to_string()
        } else {
            "not configured".dimmed().to_string()
        }
    );

    println!();
    println!("{}", "Database".bold());
    println!("{}", "────────".dimmed());
    println!("Path:           {}", info.db_path);
    println!("Size:           {}", format_size(info.db_size_bytes));
    println!("Schema version: {} (data format {})", info.table_schema_version, info.data_schema_version);
    for entry in &info.entries {
        println!("  {:<28} {}", entry.key, format_size(entry.bytes as u64).dimmed());
    }
    println!("Version:        {}", info.version);
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::format_size;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}
