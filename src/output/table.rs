use chrono::NaiveDate;
use colored::Colorize;

use crate::models::{Host, Speaker, Visit, VisitStatus};
use crate::query::calendar::CalendarDay;
use crate::query::dashboard::{QuickStats, Ranked, TimelineEvent, TimelineKind};
use crate::query::search::SearchResults;
use crate::sheets::SyncPlan;
use crate::store::{ImportSummary, SyncStats};

const SEPARATOR_WIDTH: usize = 60;

pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

fn format_status(status: VisitStatus) -> String {
    let label = status.to_string();
    match status {
        VisitStatus::Confirmed => label.green().to_string(),
        VisitStatus::Pending => label.yellow().to_string(),
        VisitStatus::Cancelled => label.red().to_string(),
        VisitStatus::Completed => label.blue().to_string(),
    }
}

fn section_header(title: &str) -> String {
    let fill = SEPARATOR_WIDTH.saturating_sub(title.chars().count() + 4);
    format!("{} {} {}", "──".dimmed(), title.bold(), "─".repeat(fill).dimmed())
}

/// Format a speaker list entry for TTY display.
pub fn format_speaker_row(speaker: &Speaker) -> String {
    let last = speaker
        .last_talk_date()
        .map(|d| format!(" (last visit {})", format_date(d)))
        .unwrap_or_default();
    format!(
        "{} {} {}{}",
        short_id(&speaker.id).dimmed(),
        speaker.nom.bold(),
        speaker.congregation.dimmed(),
        last.dimmed()
    )
}

/// Format a speaker with contact details, talk history and scheduled visits.
pub fn format_speaker_detail(speaker: &Speaker, visits: &[&Visit]) -> String {
    let mut lines = Vec::new();
    lines.push(speaker.nom.bold().to_string());
    lines.push("─".repeat(speaker.nom.chars().count()));
    lines.push(format!("{}           {}", "ID:".dimmed(), speaker.id));
    lines.push(format!("{} {}", "Congregation:".dimmed(), speaker.congregation));
    if let Some(phone) = &speaker.telephone {
        lines.push(format!("{}        {}", "Phone:".dimmed(), phone));
    }
    if let Some(notes) = speaker.notes.as_deref().filter(|n| !n.is_empty()) {
        lines.push(format!("{}        {}", "Notes:".dimmed(), notes));
    }

    if !visits.is_empty() {
        lines.push(String::new());
        lines.push("Scheduled:".dimmed().to_string());
        for visit in visits {
            lines.push(format!("  {} {}", "•".dimmed(), format_visit_summary(visit)));
        }
    }

    if !speaker.talk_history.is_empty() {
        lines.push(String::new());
        lines.push("Talk history:".dimmed().to_string());
        for talk in &speaker.talk_history {
            let theme = match (talk.talk_no.as_deref(), talk.theme.as_deref()) {
                (Some(no), Some(theme)) => format!("#{} {}", no, theme),
                (Some(no), None) => format!("#{}", no),
                (None, Some(theme)) => theme.to_string(),
                (None, None) => String::new(),
            };
            lines.push(format!("  {} {} {}", "•".dimmed(), format_date(talk.date), theme));
        }
    }

    lines.join("\n")
}

/// Format a host list entry. `on` decides the availability marker and
/// `assigned` is the number of active visits the host receives.
pub fn format_host_row(host: &Host, on: NaiveDate, assigned: usize) -> String {
    let marker = if host.is_unavailable_on(on) {
        "✗".red().to_string()
    } else {
        "✓".green().to_string()
    };
    let visits = match assigned {
        0 => String::new(),
        1 => " 1 visit".to_string(),
        n => format!(" {} visits", n),
    };
    format!(
        "{} {} {} {}{}",
        marker,
        host.nom.bold(),
        host.telephone.dimmed(),
        host.gender.to_string().dimmed(),
        visits.cyan()
    )
}

/// Format a host with address and unavailability periods.
pub fn format_host_detail(host: &Host) -> String {
    let mut lines = vec![format!("{} {} {}", host.nom.bold(), host.telephone, host.gender.to_string().dimmed())];
    if let Some(address) = &host.address {
        lines.push(format!("  {} {}", "Address:".dimmed(), address));
    }
    for period in &host.unavailability {
        let reason = period.reason.as_deref().map(|r| format!(" {}", r)).unwrap_or_default();
        lines.push(format!(
            "  {} {} → {}{} {}",
            "Away:".dimmed(),
            format_date(period.start_date),
            format_date(period.end_date),
            reason,
            format!("[{}]", short_id(&period.id)).dimmed()
        ));
    }
    lines.join("\n")
}

fn format_visit_summary(visit: &Visit) -> String {
    format!(
        "{} {} {} {}",
        format_date(visit.visit_date),
        visit.visit_time,
        visit.host,
        format_status(visit.status)
    )
}

/// Format a visit list entry for TTY display.
pub fn format_visit_row(visit: &Visit) -> String {
    let host = if visit.has_unassigned_host() {
        visit.host.red().to_string()
    } else {
        visit.host.clone()
    };
    format!(
        "{} {} {} {} {} {} {}",
        short_id(&visit.visit_id).dimmed(),
        format_date(visit.visit_date),
        visit.visit_time.dimmed(),
        visit.nom.bold(),
        visit.congregation.dimmed(),
        host,
        format_status(visit.status)
    )
}

/// Format a full visit view for TTY.
pub fn format_visit_detail(visit: &Visit) -> String {
    let mut lines = Vec::new();
    let title = format!("{} {}", visit.nom, format_date(visit.visit_date));
    lines.push(title.bold().to_string());
    lines.push("─".repeat(title.chars().count()));
    lines.push(format!("{}            {}", "ID:".dimmed(), visit.visit_id));
    lines.push(format!("{}  {}", "Congregation:".dimmed(), visit.congregation));
    lines.push(format!("{}          {}", "Time:".dimmed(), visit.visit_time));
    lines.push(format!("{}          {}", "Host:".dimmed(), visit.host));
    lines.push(format!("{}      {}", "Location:".dimmed(), visit.location_type));
    lines.push(format!("{}        {}", "Status:".dimmed(), format_status(visit.status)));
    if let Some(talk) = &visit.talk_no_or_type {
        lines.push(format!("{}          {}", "Talk:".dimmed(), talk));
    }
    if let Some(theme) = &visit.talk_theme {
        lines.push(format!("{}         {}", "Theme:".dimmed(), theme));
    }
    if !visit.accommodation.is_empty() {
        lines.push(format!("{} {}", "Accommodation:".dimmed(), visit.accommodation));
    }
    if !visit.meals.is_empty() {
        lines.push(format!("{}         {}", "Meals:".dimmed(), visit.meals));
    }
    if let Some(notes) = visit.notes.as_deref().filter(|n| !n.is_empty()) {
        lines.push(format!("{}         {}", "Notes:".dimmed(), notes));
    }
    if !visit.attachments.is_empty() {
        lines.push(String::new());
        lines.push("Attachments:".dimmed().to_string());
        for a in &visit.attachments {
            lines.push(format!("  {} {} {}", "•".dimmed(), a.name, format!("({} bytes)", a.size).dimmed()));
        }
    }
    lines.join("\n")
}

/// Format the non-empty days of a month.
pub fn format_calendar(month: NaiveDate, days: &[CalendarDay]) -> String {
    let mut lines = vec![section_header(&month.format("%B %Y").to_string())];
    let mut any = false;
    for day in days.iter().filter(|d| !d.is_empty()) {
        any = true;
        let label = day.date.format("%a %d").to_string();
        if let Some(visit) = day.visit {
            lines.push(format!(
                "{} {} {} {}",
                label.bold(),
                visit.nom,
                visit.congregation.dimmed(),
                format_status(visit.status)
            ));
        }
        for talk in &day.history {
            lines.push(format!(
                "{} {} {} {}",
                label.dimmed(),
                talk.nom,
                talk.congregation.dimmed(),
                "(history)".dimmed()
            ));
        }
    }
    if !any {
        lines.push("No visits this month.".dimmed().to_string());
    }
    lines.join("\n")
}

pub fn format_timeline_event(event: &TimelineEvent) -> String {
    match event.kind {
        TimelineKind::Visit => format!(
            "{} {} {}",
            format_date(event.date),
            event.visit.nom.bold(),
            event.visit.congregation.dimmed()
        ),
        TimelineKind::Reminder => format!(
            "{} {} {}",
            format_date(event.date),
            "Reminder:".yellow(),
            format!("send preparation to {}", event.visit.nom)
        ),
    }
}

pub fn format_dashboard(
    stats: &QuickStats,
    top_speakers: &[Ranked<&Speaker>],
    top_hosts: &[Ranked<&Host>],
    timeline: &[TimelineEvent],
) -> String {
    let mut lines = vec![section_header("Overview")];
    lines.push(format!("{}        {}", "Speakers:".dimmed(), stats.speakers));
    lines.push(format!("{}           {}", "Hosts:".dimmed(), stats.hosts));
    lines.push(format!("{} {}", "Upcoming visits:".dimmed(), stats.upcoming_visits));
    lines.push(format!("{}  {}", "Archived visits:".dimmed(), stats.archived_visits));
    if let (Some(next), Some(days)) = (stats.next_visit, stats.days_until_next) {
        let when = match days {
            0 => "today".to_string(),
            1 => "tomorrow".to_string(),
            n => format!("in {} days", n),
        };
        lines.push(format!(
            "{}      {} {} ({})",
            "Next visit:".dimmed(),
            format_date(next.visit_date),
            next.nom.bold(),
            when
        ));
    }

    if !timeline.is_empty() {
        lines.push(String::new());
        lines.push(section_header("Coming up"));
        lines.extend(timeline.iter().map(format_timeline_event));
    }
    if !top_speakers.is_empty() {
        lines.push(String::new());
        lines.push(section_header("Most frequent speakers"));
        for r in top_speakers {
            lines.push(format!("  {} {}", r.item.nom, format!("×{}", r.count).cyan()));
        }
    }
    if !top_hosts.is_empty() {
        lines.push(String::new());
        lines.push(section_header("Most frequent hosts"));
        for r in top_hosts {
            lines.push(format!("  {} {}", r.item.nom, format!("×{}", r.count).cyan()));
        }
    }
    lines.join("\n")
}

pub fn format_search_results(term: &str, results: &SearchResults) -> String {
    if results.is_empty() {
        return format!("No matches for \"{}\".", term).dimmed().to_string();
    }
    let mut lines = Vec::new();
    if !results.speakers.is_empty() {
        lines.push(section_header(&format!("Speakers ({})", results.speakers.len())));
        lines.extend(results.speakers.iter().map(|s| format_speaker_row(s)));
    }
    if !results.visits.is_empty() {
        lines.push(section_header(&format!("Visits ({})", results.visits.len())));
        lines.extend(results.visits.iter().map(|v| format_visit_row(v)));
    }
    if !results.hosts.is_empty() {
        lines.push(section_header(&format!("Hosts ({})", results.hosts.len())));
        lines.extend(results.hosts.iter().map(|h| format!("{} {}", h.nom.bold(), h.telephone.dimmed())));
    }
    lines.push(format!("{} match(es) for \"{}\"", results.total(), term).dimmed().to_string());
    lines.join("\n")
}

/// Summarize what a sync would change.
pub fn format_sync_plan(plan: &SyncPlan) -> String {
    let mut lines = vec![format!(
        "{} rows read, {} duplicates ignored",
        plan.rows_read, plan.duplicate_rows
    )];
    if plan.is_empty() {
        lines.push("Already up to date.".green().to_string());
        return lines.join("\n");
    }
    for speaker in &plan.new_speakers {
        lines.push(format!("{} speaker {} {}", "+".green(), speaker.nom, speaker.congregation.dimmed()));
    }
    for update in &plan.congregation_updates {
        lines.push(format!(
            "{} speaker {} {} → {}",
            "~".yellow(),
            update.nom,
            update.from.dimmed(),
            update.to
        ));
    }
    for visit in &plan.new_visits {
        lines.push(format!("{} visit {} {}", "+".green(), format_date(visit.visit_date), visit.nom));
    }
    for r in &plan.reassigned_visits {
        lines.push(format!(
            "{} visit {} {} → {}",
            "~".yellow(),
            format_date(r.date),
            r.previous_speaker.dimmed(),
            r.speaker.nom
        ));
    }
    for visit in &plan.deleted_visits {
        lines.push(format!("{} visit {} {}", "-".red(), format_date(visit.visit_date), visit.nom));
    }
    lines.join("\n")
}

pub fn format_sync_stats(stats: &SyncStats) -> String {
    format!(
        "{} Speakers: {} added, {} updated. Visits: {} added, {} updated, {} deleted.",
        "✓".green(),
        stats.speakers_added,
        stats.speakers_updated,
        stats.visits_added,
        stats.visits_updated,
        stats.visits_deleted
    )
}

pub fn format_import_summary(summary: &ImportSummary) -> String {
    let mut line = format!(
        "{} Imported {} speakers, {} hosts, {} visits and {} archived visits.",
        "✓".green(),
        summary.speakers,
        summary.hosts,
        summary.visits,
        summary.archived_visits
    );
    if summary.upgraded {
        line.push_str(&" (upgraded from an older format)".dimmed().to_string());
    }
    line
}
