use chrono::{DateTime, Utc};

use crate::models::{
    Attachment, CommunicationStatus, MessageRole, MessageType, TalkHistory, Visit, VisitStatus,
};

use super::{Slot, Store, StoreError, StoreResult};

/// Largest file accepted as a visit attachment.
pub const MAX_ATTACHMENT_BYTES: u64 = 2 * 1024 * 1024;

impl Store {
    pub fn visit(&self, visit_id: &str) -> Option<&Visit> {
        self.visits.iter().find(|v| v.visit_id == visit_id)
    }

    pub fn archived_visit(&self, visit_id: &str) -> Option<&Visit> {
        self.archived_visits.iter().find(|v| v.visit_id == visit_id)
    }

    fn visit_mut(&mut self, visit_id: &str) -> StoreResult<&mut Visit> {
        self.visits
            .iter_mut()
            .find(|v| v.visit_id == visit_id)
            .ok_or_else(|| StoreError::not_found("visit", visit_id))
    }

    /// Schedule a new visit. Its communication tracking always starts empty.
    pub fn add_visit(&mut self, mut visit: Visit) -> StoreResult<()> {
        if self.visit(&visit.visit_id).is_some() || self.archived_visit(&visit.visit_id).is_some() {
            return Err(StoreError::DuplicateVisit(visit.visit_id));
        }
        visit.communication_status = CommunicationStatus::default();
        self.visits.push(visit);
        self.persist(&[Slot::Visits])
    }

    /// Replace the active visit with the same `visit_id`.
    pub fn update_visit(&mut self, visit: Visit) -> StoreResult<()> {
        let slot = self.visit_mut(&visit.visit_id)?;
        *slot = visit;
        self.persist(&[Slot::Visits])
    }

    /// Remove an active visit. The archive is never touched here.
    pub fn delete_visit(&mut self, visit_id: &str) -> StoreResult<Visit> {
        let index = self
            .visits
            .iter()
            .position(|v| v.visit_id == visit_id)
            .ok_or_else(|| StoreError::not_found("visit", visit_id))?;
        let removed = self.visits.remove(index);
        self.persist(&[Slot::Visits])?;
        Ok(removed)
    }

    /// Mark a visit as held: the speaker gains a talk history entry for the
    /// visit date and the visit moves to the head of the archive.
    ///
    /// History keeps one entry per date (the newest wins) ordered newest
    /// first. A visit whose speaker no longer exists is still archived.
    pub fn complete_visit(&mut self, visit_id: &str) -> StoreResult<Visit> {
        let index = self
            .visits
            .iter()
            .position(|v| v.visit_id == visit_id)
            .ok_or_else(|| StoreError::not_found("visit", visit_id))?;

        let mut visit = self.visits.remove(index);
        visit.status = VisitStatus::Completed;

        let mut slots = vec![Slot::Visits, Slot::ArchivedVisits];
        if let Some(speaker) = self.speakers.iter_mut().find(|s| s.id == visit.id) {
            speaker.talk_history.retain(|h| h.date != visit.visit_date);
            speaker.talk_history.push(TalkHistory {
                date: visit.visit_date,
                talk_no: visit.talk_no_or_type.clone(),
                theme: visit.talk_theme.clone(),
            });
            speaker.talk_history.sort_by(|a, b| b.date.cmp(&a.date));
            slots.push(Slot::Speakers);
        }

        self.archived_visits.insert(0, visit.clone());
        self.persist(&slots)?;
        Ok(visit)
    }

    /// Permanently remove an archived visit.
    pub fn delete_archived_visit(&mut self, visit_id: &str) -> StoreResult<Visit> {
        let index = self
            .archived_visits
            .iter()
            .position(|v| v.visit_id == visit_id)
            .ok_or_else(|| StoreError::not_found("archived visit", visit_id))?;
        let removed = self.archived_visits.remove(index);
        self.persist(&[Slot::ArchivedVisits])?;
        Ok(removed)
    }

    /// Record that `message` was sent to `role` for this visit, now.
    pub fn log_communication(&mut self, visit_id: &str, message: MessageType, role: MessageRole) -> StoreResult<()> {
        self.log_communication_at(visit_id, message, role, Utc::now())
    }

    pub fn log_communication_at(
        &mut self,
        visit_id: &str,
        message: MessageType,
        role: MessageRole,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        self.visit_mut(visit_id)?.communication_status.stamp(message, role, at);
        self.persist(&[Slot::Visits])
    }

    pub fn add_attachment(&mut self, visit_id: &str, attachment: Attachment) -> StoreResult<()> {
        if attachment.size > MAX_ATTACHMENT_BYTES {
            return Err(StoreError::Invalid(format!(
                "attachment \"{}\" is {} bytes; the limit is {} bytes",
                attachment.name, attachment.size, MAX_ATTACHMENT_BYTES
            )));
        }
        self.visit_mut(visit_id)?.attachments.push(attachment);
        self.persist(&[Slot::Visits])
    }
}
