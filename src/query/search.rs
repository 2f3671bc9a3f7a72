use serde::Serialize;

use crate::models::{Host, Speaker, Visit};
use crate::query::text::contains_ignore_case;

/// Matches for a free-text search across the store.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchResults<'a> {
    pub speakers: Vec<&'a Speaker>,
    pub visits: Vec<&'a Visit>,
    pub hosts: Vec<&'a Host>,
}

impl SearchResults<'_> {
    pub fn is_empty(&self) -> bool {
        self.speakers.is_empty() && self.visits.is_empty() && self.hosts.is_empty()
    }

    pub fn total(&self) -> usize {
        self.speakers.len() + self.visits.len() + self.hosts.len()
    }
}

/// Case-insensitive search over speakers (name, congregation), active visits
/// (speaker name, host) and hosts (name, phone). A blank term matches nothing.
pub fn search<'a>(term: &str, speakers: &'a [Speaker], visits: &'a [Visit], hosts: &'a [Host]) -> SearchResults<'a> {
    let term = term.trim();
    if term.is_empty() {
        return SearchResults::default();
    }
    SearchResults {
        speakers: speakers
            .iter()
            .filter(|s| contains_ignore_case(&s.nom, term) || contains_ignore_case(&s.congregation, term))
            .collect(),
        visits: visits
            .iter()
            .filter(|v| contains_ignore_case(&v.nom, term) || contains_ignore_case(&v.host, term))
            .collect(),
        hosts: hosts
            .iter()
            .filter(|h| contains_ignore_case(&h.nom, term) || h.telephone.contains(term))
            .collect(),
    }
}
