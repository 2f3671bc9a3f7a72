//! Read-only projections over a store snapshot.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::models::{Host, LocationType, Visit};
use crate::query::dates::add_months;
use crate::query::text::{collate, contains_ignore_case};

/// Visits on or after `today`, earliest first. Visits sharing a date keep
/// their stored order.
pub fn upcoming(visits: &[Visit], today: NaiveDate) -> Vec<&Visit> {
    let mut upcoming: Vec<&Visit> = visits.iter().filter(|v| v.visit_date >= today).collect();
    upcoming.sort_by_key(|v| v.visit_date);
    upcoming
}

/// Whether a visiting speaker comes from the home congregation.
pub fn is_local(visit: &Visit, home_congregation: &str) -> bool {
    !home_congregation.trim().is_empty() && contains_ignore_case(&visit.congregation, home_congregation.trim())
}

/// Upcoming visits that still need someone to receive the speaker: not
/// cancelled, not from the home congregation, held in person, host still
/// unassigned, and no later than `months` from today.
pub fn needing_host<'a>(
    visits: &'a [Visit],
    today: NaiveDate,
    home_congregation: &str,
    months: u32,
) -> Vec<&'a Visit> {
    let horizon = add_months(today, months);
    upcoming(visits, today)
        .into_iter()
        .filter(|v| {
            !v.is_cancelled()
                && !is_local(v, home_congregation)
                && v.location_type == LocationType::Physical
                && v.has_unassigned_host()
                && v.visit_date <= horizon
        })
        .collect()
}

/// Another active visit of the same speaker on the same date, if any.
pub fn find_date_conflict<'a>(
    visits: &'a [Visit],
    speaker_id: &str,
    date: NaiveDate,
    exclude_visit_id: Option<&str>,
) -> Option<&'a Visit> {
    visits.iter().find(|v| {
        v.id == speaker_id
            && v.visit_date == date
            && !v.is_cancelled()
            && Some(v.visit_id.as_str()) != exclude_visit_id
    })
}

/// Hosts free on `date`, by name.
pub fn available_hosts(hosts: &[Host], date: NaiveDate) -> Vec<&Host> {
    let mut free: Vec<&Host> = hosts.iter().filter(|h| !h.is_unavailable_on(date)).collect();
    free.sort_by(|a, b| collate(&a.nom, &b.nom));
    free
}

pub fn unavailable_hosts(hosts: &[Host], date: NaiveDate) -> Vec<&Host> {
    let mut busy: Vec<&Host> = hosts.iter().filter(|h| h.is_unavailable_on(date)).collect();
    busy.sort_by(|a, b| collate(&a.nom, &b.nom));
    busy
}

/// Number of non-cancelled active visits assigned to each host name.
pub fn assigned_visit_counts(visits: &[Visit]) -> HashMap<&str, usize> {
    let mut counts = HashMap::new();
    for visit in visits.iter().filter(|v| !v.is_cancelled()) {
        *counts.entry(visit.host.as_str()).or_insert(0) += 1;
    }
    counts
}
