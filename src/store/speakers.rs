use crate::models::Speaker;
use crate::query::text::collate;

use super::{Slot, Store, StoreError, StoreResult};

impl Store {
    #[cfg(test)]
    pub fn speaker(&self, id: &str) -> Option<&Speaker> {
        self.speakers.iter().find(|s| s.id == id)
    }

    /// Add `speaker` and keep the collection ordered by name. Names are not
    /// required to be unique.
    pub fn add_speaker(&mut self, speaker: Speaker) -> StoreResult<()> {
        if speaker.nom.trim().is_empty() {
            return Err(StoreError::Invalid("speaker name must not be empty".into()));
        }
        self.speakers.push(speaker);
        sort_speakers(&mut self.speakers);
        self.persist(&[Slot::Speakers])
    }

    /// Replace the speaker with the same id.
    pub fn update_speaker(&mut self, speaker: Speaker) -> StoreResult<()> {
        let slot = self
            .speakers
            .iter_mut()
            .find(|s| s.id == speaker.id)
            .ok_or_else(|| StoreError::not_found("speaker", speaker.id.clone()))?;
        *slot = speaker;
        sort_speakers(&mut self.speakers);
        self.persist(&[Slot::Speakers])
    }

    /// Remove a speaker together with every active visit scheduled for them.
    /// Returns the number of visits removed.
    pub fn delete_speaker(&mut self, id: &str) -> StoreResult<usize> {
        let before = self.speakers.len();
        self.speakers.retain(|s| s.id != id);
        if self.speakers.len() == before {
            return Err(StoreError::not_found("speaker", id));
        }
        let visits_before = self.visits.len();
        self.visits.retain(|v| v.id != id);
        self.persist(&[Slot::Speakers, Slot::Visits])?;
        Ok(visits_before - self.visits.len())
    }
}

pub(crate) fn sort_speakers(speakers: &mut [Speaker]) {
    speakers.sort_by(|a, b| collate(&a.nom, &b.nom));
}

#[cfg(test)]
mod tests {
    use crate::db::test_fixtures::{empty_store, seeded_store, speaker, visit};
    use crate::store::StoreError;

    #[test]
    fn add_keeps_speakers_sorted_by_folded_name() {
        let mut store = empty_store();
        for (id, nom) in [("1", "Zoé Bernard"), ("2", "émile Costa"), ("3", "Adrien Noël"), ("4", "Eric Lima")] {
            store.add_speaker(speaker(id, nom, "Nice KBV")).unwrap();
        }
        let names: Vec<&str> = store.speakers().iter().map(|s| s.nom.as_str()).collect();
        assert_eq!(names, vec!["Adrien Noël", "émile Costa", "Eric Lima", "Zoé Bernard"]);
    }

    #[test]
    fn add_allows_duplicate_names() {
        let mut store = empty_store();
        store.add_speaker(speaker("1", "Jean", "Nice KBV")).unwrap();
        store.add_speaker(speaker("2", "Jean", "Porto KBV")).unwrap();
        assert_eq!(store.speakers().len(), 2);
    }

    #[test]
    fn add_rejects_blank_name() {
        let mut store = empty_store();
        let err = store.add_speaker(speaker("1", "  ", "Nice KBV")).unwrap_err();
        assert!(matches!(err, StoreError::Invalid(_)));
        assert!(store.speakers().is_empty());
    }

    #[test]
    fn update_resorts_after_rename() {
        let mut store = seeded_store();
        let mut jean = store.speaker("s-jean").unwrap().clone();
        jean.nom = "Victor Jean".to_string();
        store.update_speaker(jean).unwrap();

        let names: Vec<&str> = store.speakers().iter().map(|s| s.nom.as_str()).collect();
        assert_eq!(names, vec!["Paul Martin", "Victor Jean"]);
    }

    #[test]
    fn update_does_not_touch_visit_snapshot() {
        let mut store = seeded_store();
        let mut jean = store.speaker("s-jean").unwrap().clone();
        jean.congregation = "Toulon KBV".to_string();
        store.update_speaker(jean).unwrap();

        let v1 = store.visit("v1").unwrap();
        assert_eq!(v1.congregation, "Marseille KBV");
    }

    #[test]
    fn update_unknown_speaker_is_not_found() {
        let mut store = empty_store();
        let err = store.update_speaker(speaker("nope", "X", "Y")).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { kind: "speaker", .. }));
    }

    #[test]
    fn delete_cascades_to_every_visit_of_that_speaker() {
        let mut store = seeded_store();
        let jean = store.speaker("s-jean").unwrap().clone();
        store.add_visit(visit("v3", &jean, "2025-09-01")).unwrap();

        let removed = store.delete_speaker("s-jean").unwrap();

        assert_eq!(removed, 2);
        assert!(store.speaker("s-jean").is_none());
        assert!(store.visits().iter().all(|v| v.id != "s-jean"));
        assert_eq!(store.visits().len(), 1);
    }

    #[test]
    fn delete_cascade_is_persisted() {
        let mut store = seeded_store();
        store.delete_speaker("s-jean").unwrap();

        let raw = store.kv.get_raw(crate::store::VISITS_KEY).unwrap().unwrap();
        assert!(!raw.contains("s-jean"));
    }

    #[test]
    fn delete_unknown_speaker_is_not_found_and_changes_nothing() {
        let mut store = seeded_store();
        assert!(store.delete_speaker("missing").is_err());
        assert_eq!(store.speakers().len(), 2);
        assert_eq!(store.visits().len(), 2);
    }
}
