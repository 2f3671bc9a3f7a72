use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::models::{Host, MessageRole, MessageType, Speaker, Visit};
use crate::query::views::upcoming;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickStats<'a> {
    pub speakers: usize,
    pub hosts: usize,
    pub upcoming_visits: usize,
    pub archived_visits: usize,
    pub next_visit: Option<&'a Visit>,
    pub days_until_next: Option<i64>,
}

pub fn quick_stats<'a>(
    speakers: &[Speaker],
    hosts: &[Host],
    visits: &'a [Visit],
    archived: &[Visit],
    today: NaiveDate,
) -> QuickStats<'a> {
    let upcoming = upcoming(visits, today);
    let next_visit = upcoming.first().copied();
    QuickStats {
        speakers: speakers.len(),
        hosts: hosts.len(),
        upcoming_visits: upcoming.len(),
        archived_visits: archived.len(),
        next_visit,
        days_until_next: next_visit.map(|v| (v.visit_date - today).num_days()),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranked<T> {
    pub item: T,
    pub count: usize,
}

/// Count occurrences by key, most frequent first. Ties go to the key seen
/// first, so the result does not depend on hash order.
fn rank<'k>(keys: impl Iterator<Item = &'k str>) -> Vec<(&'k str, usize)> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for key in keys {
        let count = counts.entry(key).or_insert(0);
        if *count == 0 {
            order.push(key);
        }
        *count += 1;
    }
    let mut ranked: Vec<(&str, usize)> = order.into_iter().map(|k| (k, counts[k])).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}

/// Speakers with the most completed visits. Archived visits whose speaker no
/// longer exists are not listed.
pub fn top_speakers<'a>(archived: &[Visit], speakers: &'a [Speaker], n: usize) -> Vec<Ranked<&'a Speaker>> {
    rank(archived.iter().map(|v| v.id.as_str()))
        .into_iter()
        .filter_map(|(id, count)| speakers.iter().find(|s| s.id == id).map(|item| Ranked { item, count }))
        .take(n)
        .collect()
}

/// Hosts who received the most completed visits. Visit host values that are
/// not a current host (including the reserved ones) are not listed.
pub fn top_hosts<'a>(archived: &[Visit], hosts: &'a [Host], n: usize) -> Vec<Ranked<&'a Host>> {
    rank(archived.iter().map(|v| v.host.as_str()))
        .into_iter()
        .filter_map(|(name, count)| hosts.iter().find(|h| h.nom == name).map(|item| Ranked { item, count }))
        .take(n)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimelineKind {
    Visit,
    Reminder,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEvent<'a> {
    pub kind: TimelineKind,
    pub date: NaiveDate,
    pub visit: &'a Visit,
}

/// Upcoming visits merged with a reminder one week before each visit whose
/// preparation message has not been sent to the speaker. Reminders already in
/// the past are dropped. Returns at most `limit` events, earliest first.
pub fn timeline(visits: &[Visit], today: NaiveDate, limit: usize) -> Vec<TimelineEvent<'_>> {
    let mut events = Vec::new();
    for visit in upcoming(visits, today) {
        events.push(TimelineEvent {
            kind: TimelineKind::Visit,
            date: visit.visit_date,
            visit,
        });
        let reminder = visit.visit_date - Duration::days(7);
        let prepared = visit
            .communication_status
            .sent_at(MessageType::Preparation, MessageRole::Speaker)
            .is_some();
        if reminder >= today && !prepared {
            events.push(TimelineEvent {
                kind: TimelineKind::Reminder,
                date: reminder,
                visit,
            });
        }
    }
    events.sort_by_key(|e| e.date);
    events.truncate(limit);
    events
}
