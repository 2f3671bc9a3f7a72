use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::NaiveDate;
use colored::Colorize;
use log::warn;

use crate::cli::context::RunContext;
use crate::commands::resolve;
use crate::models::{
    Attachment, LocationType, MessageRole, MessageType, NO_HOST_NEEDED, RESERVED_HOST_NAMES, STREAMING_HOST,
    UNASSIGNED_HOST, Visit, VisitStatus, ZOOM_HOST,
};
use crate::output::format::OutputMode;
use crate::output::json::to_json;
use crate::output::table;
use crate::query::filter::{DateWindow, StatusFilter, filter_visits};
use crate::query::views::find_date_conflict;
use crate::store::{MAX_ATTACHMENT_BYTES, Store};

pub fn list(store: &Store, status: StatusFilter, window: DateWindow, ctx: &RunContext) -> Result<()> {
    let mut all: Vec<&Visit> = store.visits().iter().collect();
    all.sort_by_key(|v| v.visit_date);
    let visits = filter_visits(&all, status, window, ctx.today);
    print_visits(&visits, ctx.output_mode, "No visits found.");
    Ok(())
}

pub(crate) fn print_visits(visits: &[&Visit], mode: OutputMode, empty_message: &str) {
    match mode {
        OutputMode::Json => println!("{}", to_json(visits)),
        OutputMode::Tty => {
            if visits.is_empty() {
                println!("{}", empty_message);
                return;
            }
            for visit in visits {
                println!("{}", table::format_visit_row(visit));
            }
        }
    }
}

pub fn show(store: &Store, query: &str, ctx: &RunContext) -> Result<()> {
    let visit = match resolve::visit(store.visits(), query, "visit") {
        Ok(v) => v,
        Err(_) => resolve::visit(store.archived_visits(), query, "visit")?,
    };
    ctx.output_mode.emit(visit, || table::format_visit_detail(visit));
    Ok(())
}

/// Map a user-supplied host to a stored host name or a reserved value.
fn host_value(store: &Store, name: &str) -> Result<String> {
    if let Some(reserved) = RESERVED_HOST_NAMES
        .iter()
        .find(|r| r.to_lowercase() == name.trim().to_lowercase())
    {
        return Ok(reserved.to_string());
    }
    match store.host(name) {
        Some(host) => Ok(host.nom.clone()),
        None => bail!(
            "No host found matching \"{}\". Add it with `kbv hosts add`, or use {}, {}, {} or {}.",
            name,
            UNASSIGNED_HOST,
            ZOOM_HOST,
            STREAMING_HOST,
            NO_HOST_NEEDED
        ),
    }
}

fn warn_on_conflict(store: &Store, visit: &Visit, exclude: Option<&str>) {
    if let Some(other) = find_date_conflict(store.visits(), &visit.id, visit.visit_date, exclude) {
        warn!("Date conflict with visit {}", other.visit_id);
        eprintln!(
            "[kbv] Warning: {} already has a visit on {} ({})",
            visit.nom,
            table::format_date(visit.visit_date),
            other.visit_id
        );
    }
}

/// Fields of `kbv visits schedule` beyond the speaker and date.
pub struct ScheduleOptions<'a> {
    pub time: Option<&'a str>,
    pub host: Option<&'a str>,
    pub location: LocationType,
    pub status: VisitStatus,
    pub talk: Option<&'a str>,
    pub theme: Option<&'a str>,
}

pub fn schedule(
    store: &mut Store,
    speaker_query: &str,
    date: NaiveDate,
    options: ScheduleOptions,
    ctx: &RunContext,
) -> Result<()> {
    let speaker = resolve::speaker(store.speakers(), speaker_query)?.clone();
    let mut visit = Visit::for_speaker(
        &speaker,
        date,
        options.time.unwrap_or(&ctx.config.default_visit_time).trim(),
    );
    visit.location_type = options.location;
    visit.host = match (options.host, options.location) {
        (Some(name), _) => host_value(store, name)?,
        (None, LocationType::Zoom) => ZOOM_HOST.to_string(),
        (None, LocationType::Streaming) => STREAMING_HOST.to_string(),
        (None, LocationType::Physical) => UNASSIGNED_HOST.to_string(),
    };
    visit.status = options.status;
    visit.talk_no_or_type = non_empty(options.talk);
    visit.talk_theme = non_empty(options.theme);

    warn_on_conflict(store, &visit, None);
    store.add_visit(visit.clone())?;

    ctx.output_mode.emit(&visit, || {
        format!(
            "{} Scheduled {} on {} ({})",
            "✓".green(),
            visit.nom.bold(),
            table::format_date(visit.visit_date),
            visit.visit_id.dimmed()
        )
    });
    Ok(())
}

/// Fields of `kbv visits edit`. `None` keeps the current value.
#[derive(Default)]
pub struct VisitEdit<'a> {
    pub date: Option<NaiveDate>,
    pub time: Option<&'a str>,
    pub host: Option<&'a str>,
    pub location: Option<LocationType>,
    pub status: Option<VisitStatus>,
    pub talk: Option<&'a str>,
    pub theme: Option<&'a str>,
    pub accommodation: Option<&'a str>,
    pub meals: Option<&'a str>,
    pub notes: Option<&'a str>,
}

pub fn edit(store: &mut Store, query: &str, changes: VisitEdit, ctx: &RunContext) -> Result<()> {
    let mut visit = resolve::visit(store.visits(), query, "visit")?.clone();

    if let Some(date) = changes.date {
        visit.visit_date = date;
    }
    if let Some(time) = changes.time {
        visit.visit_time = time.trim().to_string();
    }
    if let Some(host) = changes.host {
        visit.host = host_value(store, host)?;
    }
    if let Some(location) = changes.location {
        visit.location_type = location;
    }
    if let Some(status) = changes.status {
        if status == VisitStatus::Completed {
            bail!("Use `kbv visits complete` to mark a visit as held");
        }
        visit.status = status;
    }
    if changes.talk.is_some() {
        visit.talk_no_or_type = non_empty(changes.talk);
    }
    if changes.theme.is_some() {
        visit.talk_theme = non_empty(changes.theme);
    }
    if let Some(accommodation) = changes.accommodation {
        visit.accommodation = accommodation.trim().to_string();
    }
    if let Some(meals) = changes.meals {
        visit.meals = meals.trim().to_string();
    }
    if changes.notes.is_some() {
        visit.notes = non_empty(changes.notes);
    }

    if changes.date.is_some() {
        warn_on_conflict(store, &visit, Some(&visit.visit_id));
    }
    store.update_visit(visit.clone())?;

    ctx.output_mode.emit(&visit, || {
        format!(
            "{} Updated visit of {} on {}",
            "✓".green(),
            visit.nom.bold(),
            table::format_date(visit.visit_date)
        )
    });
    Ok(())
}

fn mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "txt" => "text/plain",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}

/// Encode a file as an inline attachment.
pub fn read_attachment(path: &Path) -> Result<Attachment> {
    let size = fs::metadata(path)
        .with_context(|| format!("Failed to read {}", path.display()))?
        .len();
    if size > MAX_ATTACHMENT_BYTES {
        bail!(
            "{} is {} bytes; attachments are limited to {} bytes",
            path.display(),
            size,
            MAX_ATTACHMENT_BYTES
        );
    }
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "attachment".to_string());

    Ok(Attachment {
        name,
        data_url: format!("data:{};base64,{}", mime_type(path), STANDARD.encode(&bytes)),
        size: bytes.len() as u64,
    })
}

pub fn attach(store: &mut Store, query: &str, file: &Path, ctx: &RunContext) -> Result<()> {
    let visit_id = resolve::visit(store.visits(), query, "visit")?.visit_id.clone();
    let attachment = read_attachment(file)?;
    store.add_attachment(&visit_id, attachment.clone())?;

    ctx.output_mode.emit(&attachment, || {
        format!(
            "{} Attached {} ({} bytes)",
            "✓".green(),
            attachment.name.bold(),
            attachment.size
        )
    });
    Ok(())
}

pub fn complete(store: &mut Store, query: &str, ctx: &RunContext) -> Result<()> {
    let visit_id = resolve::visit(store.visits(), query, "visit")?.visit_id.clone();
    let visit = store.complete_visit(&visit_id)?;

    ctx.output_mode.emit(&visit, || {
        format!(
            "{} Archived the visit of {} on {}",
            "✓".green(),
            visit.nom.bold(),
            table::format_date(visit.visit_date)
        )
    });
    Ok(())
}

pub fn remove(store: &mut Store, query: &str, ctx: &RunContext) -> Result<()> {
    let visit_id = resolve::visit(store.visits(), query, "visit")?.visit_id.clone();
    let visit = store.delete_visit(&visit_id)?;

    ctx.output_mode.emit(&visit, || {
        format!(
            "{} Removed the visit of {} on {}",
            "✓".green(),
            visit.nom.bold(),
            table::format_date(visit.visit_date)
        )
    });
    Ok(())
}

pub fn log(store: &mut Store, query: &str, message: MessageType, role: MessageRole, ctx: &RunContext) -> Result<()> {
    let visit_id = resolve::visit(store.visits(), query, "visit")?.visit_id.clone();
    store.log_communication(&visit_id, message, role)?;

    let visit = resolve::visit(store.visits(), &visit_id, "visit")?;
    ctx.output_mode.emit(&visit.communication_status, || {
        format!("{} Logged {} message to the {} of {}", "✓".green(), message, role, visit.nom.bold())
    });
    Ok(())
}

pub fn archive_list(store: &Store, ctx: &RunContext) -> Result<()> {
    let archived: Vec<&Visit> = store.archived_visits().iter().collect();
    print_visits(&archived, ctx.output_mode, "The archive is empty.");
    Ok(())
}

pub fn archive_remove(store: &mut Store, query: &str, ctx: &RunContext) -> Result<()> {
    let visit_id = resolve::visit(store.archived_visits(), query, "archived visit")?
        .visit_id
        .clone();
    let visit = store.delete_archived_visit(&visit_id)?;

    ctx.output_mode.emit(&visit, || {
        format!(
            "{} Deleted the archived visit of {} on {}",
            "✓".green(),
            visit.nom.bold(),
            table::format_date(visit.visit_date)
        )
    });
    Ok(())
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn attachment_is_a_base64_data_url() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plan.pdf");
        fs::write(&path, b"hello").unwrap();

        let attachment = read_attachment(&path).unwrap();
        assert_eq!(attachment.name, "plan.pdf");
        assert_eq!(attachment.size, 5);
        assert_eq!(attachment.data_url, "data:application/pdf;base64,aGVsbG8=");
    }

    #[test]
    fn oversized_attachment_is_rejected_before_reading() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("big.bin");
        let file = fs::File::create(&path).unwrap();
        file.set_len(MAX_ATTACHMENT_BYTES + 1).unwrap();

        let err = read_attachment(&path).unwrap_err().to_string();
        assert!(err.contains("limited to"), "got: {}", err);
    }

    #[test]
    fn unknown_extension_is_octet_stream() {
        assert_eq!(mime_type(Path::new("notes.xyz")), "application/octet-stream");
        assert_eq!(mime_type(Path::new("PHOTO.JPG")), "image/jpeg");
    }
}
