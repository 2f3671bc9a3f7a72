//! Shared test fixtures for store and view tests.

use chrono::NaiveDate;

use crate::db::migrations::open_in_memory;
use crate::models::{Host, Speaker, Visit};
use crate::store::Store;

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// An empty store backed by an in-memory database.
pub fn empty_store() -> Store {
    Store::open(open_in_memory().unwrap()).unwrap()
}

pub fn speaker(id: &str, nom: &str, congregation: &str) -> Speaker {
    Speaker {
        id: id.to_string(),
        ..Speaker::new(nom, congregation)
    }
}

pub fn host(nom: &str) -> Host {
    Host {
        nom: nom.to_string(),
        telephone: "0600000000".to_string(),
        gender: Default::default(),
        address: None,
        unavailability: Vec::new(),
        photo_url: None,
    }
}

pub fn visit(visit_id: &str, speaker: &Speaker, on: &str) -> Visit {
    Visit {
        visit_id: visit_id.to_string(),
        ..Visit::for_speaker(speaker, date(on), "14:30")
    }
}

/// A store with two speakers, one host and two scheduled visits:
/// `v1` (Jean, 2025-07-01, host Marc) and `v2` (Paul, 2025-07-08, unassigned).
pub fn seeded_store() -> Store {
    let mut store = empty_store();
    let jean = speaker("s-jean", "Jean Dupont", "Marseille KBV");
    let paul = speaker("s-paul", "Paul Martin", "Porto KBV");
    store.add_speaker(jean.clone()).unwrap();
    store.add_speaker(paul.clone()).unwrap();
    assert!(store.add_host(host("Marc")).unwrap());

    let mut v1 = visit("v1", &jean, "2025-07-01");
    v1.host = "Marc".to_string();
    store.add_visit(v1).unwrap();
    store.add_visit(visit("v2", &paul, "2025-07-08")).unwrap();
    store
}
