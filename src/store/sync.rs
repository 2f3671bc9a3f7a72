use log::info;
use serde::Serialize;

use crate::sheets::SyncPlan;

use super::speakers::sort_speakers;
use super::{Slot, Store, StoreResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStats {
    pub speakers_added: usize,
    pub speakers_updated: usize,
    pub visits_added: usize,
    pub visits_updated: usize,
    pub visits_deleted: usize,
}

impl Store {
    /// Apply a reconciliation plan. Speakers and visits are written together.
    ///
    /// Entries referring to records that no longer exist are skipped.
    pub fn apply_sync_plan(&mut self, plan: &SyncPlan) -> StoreResult<SyncStats> {
        let mut stats = SyncStats::default();

        for update in &plan.congregation_updates {
            if let Some(speaker) = self.speakers.iter_mut().find(|s| s.id == update.speaker_id) {
                speaker.congregation = update.to.clone();
                stats.speakers_updated += 1;
            }
        }
        for speaker in &plan.new_speakers {
            self.speakers.push(speaker.clone());
            stats.speakers_added += 1;
        }
        sort_speakers(&mut self.speakers);

        for reassignment in &plan.reassigned_visits {
            if let Some(visit) = self.visits.iter_mut().find(|v| v.visit_id == reassignment.visit_id) {
                visit.assign_speaker(&reassignment.speaker);
                stats.visits_updated += 1;
            }
        }
        let before = self.visits.len();
        self.visits
            .retain(|v| !plan.deleted_visits.iter().any(|d| d.visit_id == v.visit_id));
        stats.visits_deleted = before - self.visits.len();
        for visit in &plan.new_visits {
            self.visits.push(visit.clone());
            stats.visits_added += 1;
        }

        self.persist(&[Slot::Speakers, Slot::Visits])?;
        info!("Applied sync plan: {:?}", stats);
        Ok(stats)
    }
}
