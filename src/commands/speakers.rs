use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;

use crate::cli::context::RunContext;
use crate::commands::resolve;
use crate::models::{Speaker, Visit};
use crate::output::format::OutputMode;
use crate::output::json::to_json;
use crate::output::table;
use crate::query::filter::{SpeakerSort, filter_speakers};
use crate::store::Store;

pub fn list(
    store: &Store,
    search: Option<&str>,
    congregation: Option<&str>,
    sort: SpeakerSort,
    ctx: &RunContext,
) -> Result<()> {
    let speakers = filter_speakers(store.speakers(), search, congregation, sort);

    match ctx.output_mode {
        OutputMode::Json => println!("{}", to_json(&speakers)),
        OutputMode::Tty => {
            if speakers.is_empty() {
                println!("No speakers found.");
                return Ok(());
            }
            for speaker in &speakers {
                println!("{}", table::format_speaker_row(speaker));
            }
        }
    }

    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeakerDetail<'a> {
    #[serde(flatten)]
    speaker: &'a Speaker,
    scheduled_visits: Vec<&'a Visit>,
}

pub fn show(store: &Store, query: &str, ctx: &RunContext) -> Result<()> {
    let speaker = resolve::speaker(store.speakers(), query)?;
    let mut scheduled: Vec<&Visit> = store.visits().iter().filter(|v| v.id == speaker.id).collect();
    scheduled.sort_by_key(|v| v.visit_date);

    let detail = SpeakerDetail {
        speaker,
        scheduled_visits: scheduled,
    };
    ctx.output_mode
        .emit(&detail, || table::format_speaker_detail(detail.speaker, &detail.scheduled_visits));
    Ok(())
}

pub fn add(
    store: &mut Store,
    name: &str,
    congregation: &str,
    phone: Option<&str>,
    notes: Option<&str>,
    ctx: &RunContext,
) -> Result<()> {
    let mut speaker = Speaker::new(name.trim(), congregation.trim());
    speaker.telephone = non_empty(phone);
    speaker.notes = non_empty(notes);

    store.add_speaker(speaker.clone()).context("Failed to add speaker")?;

    ctx.output_mode.emit(&speaker, || {
        format!("{} Added {} ({})", "✓".green(), speaker.nom.bold(), speaker.id.dimmed())
    });
    Ok(())
}

/// Fields of `kbv speakers edit`. `None` keeps the current value.
pub struct SpeakerEdit<'a> {
    pub name: Option<&'a str>,
    pub congregation: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub notes: Option<&'a str>,
}

pub fn edit(store: &mut Store, query: &str, changes: SpeakerEdit, ctx: &RunContext) -> Result<()> {
    let mut speaker = resolve::speaker(store.speakers(), query)?.clone();
    if let Some(name) = changes.name {
        speaker.nom = name.trim().to_string();
    }
    if let Some(congregation) = changes.congregation {
        speaker.congregation = congregation.trim().to_string();
    }
    if changes.phone.is_some() {
        speaker.telephone = non_empty(changes.phone);
    }
    if changes.notes.is_some() {
        speaker.notes = non_empty(changes.notes);
    }

    store.update_speaker(speaker.clone())?;

    ctx.output_mode
        .emit(&speaker, || format!("{} Updated {}", "✓".green(), speaker.nom.bold()));
    Ok(())
}

pub fn remove(store: &mut Store, query: &str, ctx: &RunContext) -> Result<()> {
    let speaker = resolve::speaker(store.speakers(), query)?.clone();
    let removed_visits = store.delete_speaker(&speaker.id)?;

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Removed<'a> {
        id: &'a str,
        nom: &'a str,
        removed_visits: usize,
    }
    let result = Removed {
        id: &speaker.id,
        nom: &speaker.nom,
        removed_visits,
    };
    ctx.output_mode.emit(&result, || {
        let visits = match removed_visits {
            0 => String::new(),
            1 => " and 1 scheduled visit".to_string(),
            n => format!(" and {} scheduled visits", n),
        };
        format!("{} Removed {}{}", "✓".green(), speaker.nom.bold(), visits)
    });
    Ok(())
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}
