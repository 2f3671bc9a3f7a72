//! Turning spreadsheet rows into a set of store changes.
//!
//! Rows are matched to speakers by normalized name and to visits by date.
//! Nothing is written here: [`plan`] produces a [`SyncPlan`] that the store
//! applies in one transaction, or that a dry run prints.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use log::{debug, info, warn};
use serde::Serialize;

use crate::models::{Speaker, UNKNOWN_CONGREGATION, Visit};
use crate::query::dates::parse_day_month_year;
use crate::query::text::normalize_name;

use super::{SheetSource, SheetsError};

/// One schedule entry read from the spreadsheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetRow {
    pub tab: String,
    pub date: NaiveDate,
    pub speaker: String,
    pub congregation: Option<String>,
}

/// Extract `(date, speaker, congregation)` from a row of cells.
///
/// The first cell holding a `DD/MM/YYYY` date anchors the row; the next
/// non-empty cell is the speaker, and the cell right after the speaker, when
/// not empty, is the congregation.
pub fn parse_row(cells: &[String]) -> Option<(NaiveDate, String, Option<String>)> {
    let (date_idx, date) = cells
        .iter()
        .enumerate()
        .find_map(|(i, c)| parse_day_month_year(c).map(|d| (i, d)))?;

    let (speaker_idx, speaker) = cells
        .iter()
        .enumerate()
        .skip(date_idx + 1)
        .map(|(i, c)| (i, c.trim()))
        .find(|(_, c)| !c.is_empty())?;

    let congregation = cells
        .get(speaker_idx + 1)
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .map(str::to_string);

    Some((date, speaker.to_string(), congregation))
}

/// Read every tab and keep the rows that describe a visit.
///
/// Failing to list the tabs aborts; a tab that cannot be read is skipped.
pub fn collect_rows(source: &dyn SheetSource) -> Result<Vec<SheetRow>, SheetsError> {
    let titles = source.sheet_titles()?;
    info!("Spreadsheet tabs: {}", titles.join(", "));

    let mut rows = Vec::new();
    for title in &titles {
        let grid = match source.sheet_values(title) {
            Ok(grid) => grid,
            Err(e) => {
                warn!("Skipping tab \"{}\": {}", title, e);
                continue;
            }
        };
        let before = rows.len();
        for cells in &grid {
            match parse_row(cells) {
                Some((date, speaker, congregation)) => rows.push(SheetRow {
                    tab: title.clone(),
                    date,
                    speaker,
                    congregation,
                }),
                None => debug!("Ignoring row in \"{}\": {:?}", title, cells),
            }
        }
        info!("{} schedule rows in \"{}\"", rows.len() - before, title);
    }

    if rows.is_empty() {
        return Err(SheetsError::NoData(titles));
    }
    Ok(rows)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CongregationUpdate {
    pub speaker_id: String,
    pub nom: String,
    pub from: String,
    pub to: String,
}

/// An existing visit whose date now belongs to another speaker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitReassignment {
    pub visit_id: String,
    pub date: NaiveDate,
    pub previous_speaker: String,
    pub speaker: Speaker,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPlan {
    pub rows_read: usize,
    pub duplicate_rows: usize,
    pub new_speakers: Vec<Speaker>,
    pub congregation_updates: Vec<CongregationUpdate>,
    pub new_visits: Vec<Visit>,
    pub reassigned_visits: Vec<VisitReassignment>,
    pub deleted_visits: Vec<Visit>,
}

impl SyncPlan {
    pub fn is_empty(&self) -> bool {
        self.new_speakers.is_empty()
            && self.congregation_updates.is_empty()
            && self.new_visits.is_empty()
            && self.reassigned_visits.is_empty()
            && self.deleted_visits.is_empty()
    }
}

/// Compute the changes that bring the store in line with `rows`.
///
/// - Rows repeating a (date, speaker) pair are counted once.
/// - Unknown speakers are created; a known speaker's congregation follows the
///   sheet when the row names one.
/// - A visit on the row's date with the same speaker is kept as is. Otherwise an
///   unclaimed visit on that date is reassigned to the row's speaker, or a new
///   pending visit is created.
/// - Visits from `today` on, on a date the sheet lists, that no row claimed are
///   deleted. Dates the sheet does not mention are never touched.
pub fn plan(
    rows: &[SheetRow],
    speakers: &[Speaker],
    visits: &[Visit],
    today: NaiveDate,
    default_time: &str,
) -> SyncPlan {
    let mut plan = SyncPlan {
        rows_read: rows.len(),
        ..Default::default()
    };

    // Deduplicate on (date, normalized name), keeping the first occurrence.
    let mut seen = HashSet::new();
    let mut unique: Vec<(&SheetRow, String)> = Vec::new();
    for row in rows {
        let key = normalize_name(&row.speaker);
        if key.is_empty() || !seen.insert((row.date, key.clone())) {
            plan.duplicate_rows += 1;
            continue;
        }
        unique.push((row, key));
    }

    // Speakers, after this sync, keyed by normalized name.
    let mut roster: HashMap<String, Speaker> = HashMap::new();
    for speaker in speakers {
        roster.entry(normalize_name(&speaker.nom)).or_insert_with(|| speaker.clone());
    }
    let mut handled_names = HashSet::new();
    for (row, key) in &unique {
        if !handled_names.insert(key.clone()) {
            continue;
        }
        match roster.get_mut(key) {
            Some(existing) => {
                if let Some(congregation) = &row.congregation {
                    if &existing.congregation != congregation {
                        plan.congregation_updates.push(CongregationUpdate {
                            speaker_id: existing.id.clone(),
                            nom: existing.nom.clone(),
                            from: existing.congregation.clone(),
                            to: congregation.clone(),
                        });
                        existing.congregation = congregation.clone();
                    }
                }
            }
            None => {
                let congregation = row.congregation.clone().unwrap_or_else(|| UNKNOWN_CONGREGATION.to_string());
                let speaker = Speaker::new(row.speaker.clone(), congregation);
                plan.new_speakers.push(speaker.clone());
                roster.insert(key.clone(), speaker);
            }
        }
    }

    // First pass: rows already matching a visit on their date.
    let mut claimed: HashSet<&str> = HashSet::new();
    let mut pending_rows = Vec::new();
    for (row, key) in &unique {
        let exact = visits
            .iter()
            .find(|v| v.visit_date == row.date && !claimed.contains(v.visit_id.as_str()) && &normalize_name(&v.nom) == key);
        match exact {
            Some(visit) => {
                claimed.insert(&visit.visit_id);
            }
            None => pending_rows.push((*row, key)),
        }
    }

    // Second pass: reuse a free visit on the date, else schedule a new one.
    for (row, key) in pending_rows {
        let Some(speaker) = roster.get(key) else { continue };
        let free = visits
            .iter()
            .find(|v| v.visit_date == row.date && !claimed.contains(v.visit_id.as_str()));
        match free {
            Some(visit) => {
                claimed.insert(&visit.visit_id);
                plan.reassigned_visits.push(VisitReassignment {
                    visit_id: visit.visit_id.clone(),
                    date: visit.visit_date,
                    previous_speaker: visit.nom.clone(),
                    speaker: speaker.clone(),
                });
            }
            None => plan.new_visits.push(Visit::for_speaker(speaker, row.date, default_time)),
        }
    }

    let sheet_dates: HashSet<NaiveDate> = unique.iter().map(|(row, _)| row.date).collect();
    plan.deleted_visits = visits
        .iter()
        .filter(|v| {
            v.visit_date >= today && sheet_dates.contains(&v.visit_date) && !claimed.contains(v.visit_id.as_str())
        })
        .cloned()
        .collect();

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_fixtures::{date, speaker, visit};
    use crate::models::{LocationType, UNASSIGNED_HOST, VisitStatus};
    use crate::sheets::fake::FakeSheet;

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(|c| c.to_string()).collect()
    }

    fn row(on: &str, name: &str, congregation: Option<&str>) -> SheetRow {
        SheetRow {
            tab: "Juillet".into(),
            date: date(on),
            speaker: name.into(),
            congregation: congregation.map(str::to_string),
        }
    }

    #[test]
    fn parse_row_finds_date_speaker_and_congregation() {
        let parsed = parse_row(&cells(&["Dimanche", "06/07/2025", "", " Jean Dupont ", "Nice KBV", "12"]));
        assert_eq!(
            parsed,
            Some((date("2025-07-06"), "Jean Dupont".to_string(), Some("Nice KBV".to_string())))
        );
    }

    #[test]
    fn parse_row_without_congregation() {
        let parsed = parse_row(&cells(&["06/07/2025", "Jean", ""]));
        assert_eq!(parsed, Some((date("2025-07-06"), "Jean".to_string(), None)));
    }

    #[test]
    fn parse_row_requires_date_and_speaker() {
        assert_eq!(parse_row(&cells(&["Date", "Orateur", "Congrégation"])), None);
        assert_eq!(parse_row(&cells(&["06/07/2025", "", "  "])), None);
        assert_eq!(parse_row(&cells(&["6/7/2025", "Jean"])), None);
    }

    #[test]
    fn collect_rows_skips_failing_tabs() {
        let sheet = FakeSheet::default()
            .with_tab("Juillet", &[&["Date", "Orateur"], &["06/07/2025", "Jean", "Nice KBV"]])
            .with_failing_tab("Archive")
            .with_tab("Août", &[&["03/08/2025", "Paul"]]);

        let rows = collect_rows(&sheet).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].tab, "Août");
    }

    #[test]
    fn collect_rows_without_schedule_is_no_data() {
        let sheet = FakeSheet::default().with_tab("Notes", &[&["rien"]]);
        assert!(matches!(collect_rows(&sheet), Err(SheetsError::NoData(tabs)) if tabs == vec!["Notes"]));
    }

    #[test]
    fn collect_rows_aborts_when_unreachable() {
        let sheet = FakeSheet {
            unreachable: true,
            ..Default::default()
        };
        assert!(matches!(collect_rows(&sheet), Err(SheetsError::Network(_))));
    }

    #[test]
    fn new_speaker_and_visit_are_created() {
        let rows = vec![row("2025-07-06", "Paul Martin", None)];
        let plan = plan(&rows, &[], &[], date("2025-07-01"), "14:30");

        assert_eq!(plan.new_speakers.len(), 1);
        assert_eq!(plan.new_speakers[0].congregation, UNKNOWN_CONGREGATION);
        assert_eq!(plan.new_visits.len(), 1);
        let visit = &plan.new_visits[0];
        assert_eq!(visit.id, plan.new_speakers[0].id);
        assert_eq!(visit.visit_time, "14:30");
        assert_eq!(visit.host, UNASSIGNED_HOST);
        assert_eq!(visit.status, VisitStatus::Pending);
        assert_eq!(visit.location_type, LocationType::Physical);
    }

    #[test]
    fn names_match_ignoring_accents_case_and_punctuation() {
        let jean = speaker("s-jean", "Jean-Luc Émond", "Nice KBV");
        let existing = vec![visit("v1", &jean, "2025-07-06")];
        let rows = vec![row("2025-07-06", "JEAN LUC EMOND", Some("Nice KBV"))];

        let plan = plan(&rows, &[jean], &existing, date("2025-07-01"), "14:30");
        assert!(plan.is_empty(), "{:?}", plan);
    }

    #[test]
    fn duplicate_rows_count_once() {
        let rows = vec![
            row("2025-07-06", "Paul", None),
            row("2025-07-06", "paul", None),
            row("2025-07-13", "Paul", None),
        ];
        let plan = plan(&rows, &[], &[], date("2025-07-01"), "14:30");
        assert_eq!(plan.duplicate_rows, 1);
        assert_eq!(plan.new_speakers.len(), 1);
        assert_eq!(plan.new_visits.len(), 2);
    }

    #[test]
    fn congregation_follows_sheet_only_when_present() {
        let jean = speaker("s-jean", "Jean", "Nice KBV");
        let paul = speaker("s-paul", "Paul", "Porto KBV");
        let rows = vec![row("2025-07-06", "Jean", Some("Toulon KBV")), row("2025-07-13", "Paul", None)];

        let plan = plan(&rows, &[jean, paul], &[], date("2025-07-01"), "14:30");

        assert_eq!(plan.congregation_updates.len(), 1);
        assert_eq!(plan.congregation_updates[0].to, "Toulon KBV");
        let jean_visit = plan.new_visits.iter().find(|v| v.id == "s-jean").unwrap();
        assert_eq!(jean_visit.congregation, "Toulon KBV");
    }

    #[test]
    fn changed_speaker_updates_visit_in_place() {
        let jean = speaker("s-jean", "Jean", "Nice KBV");
        let paul = speaker("s-paul", "Paul", "Porto KBV");
        let mut existing = visit("v1", &jean, "2025-07-06");
        existing.host = "Marc".into();

        let rows = vec![row("2025-07-06", "Paul", None)];
        let plan = plan(&rows, &[jean, paul], &[existing], date("2025-07-01"), "14:30");

        assert_eq!(plan.reassigned_visits.len(), 1);
        assert_eq!(plan.reassigned_visits[0].visit_id, "v1");
        assert_eq!(plan.reassigned_visits[0].speaker.id, "s-paul");
        assert!(plan.new_visits.is_empty());
        assert!(plan.deleted_visits.is_empty());
    }

    #[test]
    fn exact_matches_are_claimed_before_reassignment() {
        let jean = speaker("s-jean", "Jean", "Nice KBV");
        let paul = speaker("s-paul", "Paul", "Porto KBV");
        // Both visits share a date; the sheet lists Paul first.
        let existing = vec![visit("v-jean", &jean, "2025-07-06"), visit("v-paul", &paul, "2025-07-06")];
        let rows = vec![row("2025-07-06", "Paul", None), row("2025-07-06", "Jean", None)];

        let plan = plan(&rows, &[jean, paul], &existing, date("2025-07-01"), "14:30");
        assert!(plan.is_empty(), "{:?}", plan);
    }

    #[test]
    fn unclaimed_future_visit_on_sheet_date_is_deleted() {
        let jean = speaker("s-jean", "Jean", "Nice KBV");
        let paul = speaker("s-paul", "Paul", "Porto KBV");
        let existing = vec![
            visit("keep", &paul, "2025-07-06"),
            visit("extra", &jean, "2025-07-06"),
            visit("elsewhere", &jean, "2025-07-20"),
            visit("past", &jean, "2025-06-01"),
        ];
        let rows = vec![row("2025-07-06", "Paul", None), row("2025-06-01", "Paul", None)];

        let plan = plan(&rows, &[jean, paul], &existing, date("2025-07-01"), "14:30");

        let deleted: Vec<&str> = plan.deleted_visits.iter().map(|v| v.visit_id.as_str()).collect();
        assert_eq!(deleted, vec!["extra"]);
        // The past visit is reassigned to Paul rather than deleted.
        assert_eq!(plan.reassigned_visits[0].visit_id, "past");
    }
}
