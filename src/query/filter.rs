use std::cmp::Ordering;

use chrono::NaiveDate;

use crate::models::{Host, Speaker, Visit, VisitStatus};
use crate::query::dates::{end_of_month, end_of_week};
use crate::query::text::{collate, contains_ignore_case};

/// Which visits a listing shows by status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum StatusFilter {
    /// Confirmed or pending
    #[default]
    Active,
    /// Active with no host assigned yet
    NeedsHost,
    Confirmed,
    Pending,
    Cancelled,
    /// Every status
    All,
}

impl StatusFilter {
    pub fn matches(self, visit: &Visit) -> bool {
        match self {
            StatusFilter::Active => matches!(visit.status, VisitStatus::Confirmed | VisitStatus::Pending),
            StatusFilter::NeedsHost => {
                matches!(visit.status, VisitStatus::Confirmed | VisitStatus::Pending) && visit.has_unassigned_host()
            }
            StatusFilter::Confirmed => visit.status == VisitStatus::Confirmed,
            StatusFilter::Pending => visit.status == VisitStatus::Pending,
            StatusFilter::Cancelled => visit.status == VisitStatus::Cancelled,
            StatusFilter::All => true,
        }
    }
}

/// Date window, always starting today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum DateWindow {
    #[default]
    All,
    /// Through the end of the current week (Sunday)
    Week,
    /// Through the end of the current month
    Month,
}

impl DateWindow {
    pub fn contains(self, date: NaiveDate, today: NaiveDate) -> bool {
        match self {
            DateWindow::All => true,
            DateWindow::Week => today <= date && date <= end_of_week(today),
            DateWindow::Month => today <= date && date <= end_of_month(today),
        }
    }
}

pub fn filter_visits<'a>(
    visits: &[&'a Visit],
    status: StatusFilter,
    window: DateWindow,
    today: NaiveDate,
) -> Vec<&'a Visit> {
    visits
        .iter()
        .copied()
        .filter(|v| status.matches(v) && window.contains(v.visit_date, today))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SpeakerSort {
    #[default]
    Name,
    Congregation,
    /// Never-visited first, then the longest since their last talk
    LastVisit,
}

pub fn filter_speakers<'a>(
    speakers: &'a [Speaker],
    term: Option<&str>,
    congregation: Option<&str>,
    sort: SpeakerSort,
) -> Vec<&'a Speaker> {
    let mut found: Vec<&Speaker> = speakers
        .iter()
        .filter(|s| {
            term.is_none_or(|t| contains_ignore_case(&s.nom, t) || contains_ignore_case(&s.congregation, t))
        })
        .filter(|s| congregation.is_none_or(|c| s.congregation.eq_ignore_ascii_case(c.trim())))
        .collect();

    match sort {
        SpeakerSort::Name => found.sort_by(|a, b| collate(&a.nom, &b.nom)),
        SpeakerSort::Congregation => found.sort_by(|a, b| {
            collate(&a.congregation, &b.congregation).then_with(|| collate(&a.nom, &b.nom))
        }),
        SpeakerSort::LastVisit => found.sort_by(|a, b| {
            let by_date = match (a.last_talk_date(), b.last_talk_date()) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(x), Some(y)) => x.cmp(&y),
            };
            by_date.then_with(|| collate(&a.nom, &b.nom))
        }),
    }
    found
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum HostSort {
    #[default]
    Name,
    /// Hosts free on the reference date first
    Availability,
}

pub fn filter_hosts<'a>(hosts: &'a [Host], term: Option<&str>, sort: HostSort, on: NaiveDate) -> Vec<&'a Host> {
    let mut found: Vec<&Host> = hosts
        .iter()
        .filter(|h| term.is_none_or(|t| contains_ignore_case(&h.nom, t) || h.telephone.contains(t.trim())))
        .collect();
    match sort {
        HostSort::Name => found.sort_by(|a, b| collate(&a.nom, &b.nom)),
        HostSort::Availability => found.sort_by(|a, b| {
            a.is_unavailable_on(on)
                .cmp(&b.is_unavailable_on(on))
                .then_with(|| collate(&a.nom, &b.nom))
        }),
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_fixtures::{date, host, speaker, visit};
    use crate::models::{TalkHistory, UnavailabilityPeriod};

    #[test]
    fn status_filters() {
        let jean = speaker("s", "Jean", "Nice KBV");
        let pending = visit("p", &jean, "2025-07-01");
        let mut confirmed = visit("c", &jean, "2025-07-02");
        confirmed.status = VisitStatus::Confirmed;
        confirmed.host = "Marc".into();
        let mut cancelled = visit("x", &jean, "2025-07-03");
        cancelled.status = VisitStatus::Cancelled;

        assert!(StatusFilter::Active.matches(&pending));
        assert!(StatusFilter::Active.matches(&confirmed));
        assert!(!StatusFilter::Active.matches(&cancelled));
        assert!(StatusFilter::NeedsHost.matches(&pending));
        assert!(!StatusFilter::NeedsHost.matches(&confirmed));
        assert!(!StatusFilter::NeedsHost.matches(&cancelled));
        assert!(StatusFilter::Cancelled.matches(&cancelled));
        assert!(StatusFilter::All.matches(&cancelled));
    }

    #[test]
    fn week_window_ends_on_sunday() {
        // 2025-07-02 is a Wednesday
        let today = date("2025-07-02");
        assert!(DateWindow::Week.contains(date("2025-07-06"), today));
        assert!(!DateWindow::Week.contains(date("2025-07-07"), today));
        assert!(DateWindow::Month.contains(date("2025-07-31"), today));
        assert!(!DateWindow::Month.contains(date("2025-08-01"), today));
        assert!(!DateWindow::Month.contains(date("2025-07-01"), today));
    }

    #[test]
    fn speaker_search_matches_name_or_congregation() {
        let speakers = vec![
            speaker("1", "Jean Dupont", "Nice KBV"),
            speaker("2", "Paul Martin", "Porto KBV"),
        ];
        let found = filter_speakers(&speakers, Some("porto"), None, SpeakerSort::Name);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].nom, "Paul Martin");

        let found = filter_speakers(&speakers, None, Some("nice kbv"), SpeakerSort::Name);
        assert_eq!(found[0].nom, "Jean Dupont");
    }

    #[test]
    fn last_visit_sort_puts_never_visited_first() {
        let mut old = speaker("1", "Ancien", "A");
        old.talk_history.push(TalkHistory {
            date: date("2023-01-01"),
            talk_no: None,
            theme: None,
        });
        let mut recent = speaker("2", "Récent", "A");
        recent.talk_history.push(TalkHistory {
            date: date("2025-01-01"),
            talk_no: None,
            theme: None,
        });
        let never = speaker("3", "Zéro", "A");
        let speakers = vec![recent, old, never];

        let names: Vec<&str> = filter_speakers(&speakers, None, None, SpeakerSort::LastVisit)
            .iter()
            .map(|s| s.nom.as_str())
            .collect();
        assert_eq!(names, vec!["Zéro", "Ancien", "Récent"]);
    }

    #[test]
    fn congregation_sort_breaks_ties_by_name() {
        let speakers = vec![
            speaker("1", "Yves", "Nice KBV"),
            speaker("2", "Bruno", "Porto KBV"),
            speaker("3", "Aline", "Nice KBV"),
        ];
        let names: Vec<&str> = filter_speakers(&speakers, None, None, SpeakerSort::Congregation)
            .iter()
            .map(|s| s.nom.as_str())
            .collect();
        assert_eq!(names, vec!["Aline", "Yves", "Bruno"]);
    }

    #[test]
    fn host_availability_sort() {
        let mut busy = host("Anne");
        busy.unavailability.push(UnavailabilityPeriod {
            id: "p".into(),
            start_date: date("2025-06-01"),
            end_date: date("2025-06-30"),
            reason: None,
        });
        let hosts = vec![busy, host("Marc"), host("Bruno")];

        let names: Vec<&str> = filter_hosts(&hosts, None, HostSort::Availability, date("2025-06-15"))
            .iter()
            .map(|h| h.nom.as_str())
            .collect();
        assert_eq!(names, vec!["Bruno", "Marc", "Anne"]);
    }

    #[test]
    fn host_search_matches_phone() {
        let mut marc = host("Marc");
        marc.telephone = "0611223344".into();
        let hosts = vec![marc, host("Anne")];
        let found = filter_hosts(&hosts, Some("1122"), HostSort::Name, date("2025-06-15"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].nom, "Marc");
    }
}
