use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use crate::cli::context::RunContext;
use crate::store::Store;

/// Only the last characters of the key are shown.
fn mask(key: &str) -> String {
    let count = key.chars().count();
    if count <= 4 {
        return "*".repeat(count);
    }
    let tail: String = key.chars().skip(count - 4).collect();
    format!("{}{}", "*".repeat(count - 4), tail)
}

pub fn show(store: &Store, ctx: &RunContext) -> Result<()> {
    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Settings {
        google_sheet_id: String,
        google_api_key: String,
    }
    let settings = Settings {
        google_sheet_id: store.google_sheet_id().to_string(),
        google_api_key: mask(store.google_api_key()),
    };

    ctx.output_mode.emit(&settings, || {
        let unset = || "(not set)".dimmed().to_string();
        let id = Some(settings.google_sheet_id.clone()).filter(|s| !s.is_empty());
        let key = Some(settings.google_api_key.clone()).filter(|s| !s.is_empty());
        format!(
            "{}  {}\n{} {}",
            "Sheet ID:".dimmed(),
            id.unwrap_or_else(unset),
            "API key:".dimmed(),
            key.unwrap_or_else(unset)
        )
    });
    Ok(())
}

pub fn set_sheet(store: &mut Store, id: &str) -> Result<()> {
    store.set_google_sheet_id(id)?;
    eprintln!("{} Spreadsheet ID saved.", "✓".green());
    Ok(())
}

pub fn set_key(store: &mut Store, key: &str) -> Result<()> {
    store.set_google_api_key(key)?;
    eprintln!("{} API key saved.", "✓".green());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::mask;

    #[test]
    fn mask_keeps_last_four() {
        assert_eq!(mask("AIzaSyABCDEF1234"), "************1234");
        assert_eq!(mask("abc"), "***");
        assert_eq!(mask(""), "");
    }
}
