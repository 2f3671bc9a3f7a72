use chrono::NaiveDate;
use log::debug;

use crate::models::{Host, HostUpdate, UNASSIGNED_HOST, UnavailabilityPeriod, is_reserved_host_name};
use crate::query::text::collate;

use super::{Slot, Store, StoreError, StoreResult};

impl Store {
    /// Find a host by name, ignoring case.
    pub fn host(&self, name: &str) -> Option<&Host> {
        let wanted = name.trim().to_lowercase();
        self.hosts.iter().find(|h| h.nom.to_lowercase() == wanted)
    }

    fn host_index(&self, name: &str) -> StoreResult<usize> {
        let wanted = name.trim().to_lowercase();
        self.hosts
            .iter()
            .position(|h| h.nom.to_lowercase() == wanted)
            .ok_or_else(|| StoreError::not_found("host", name))
    }

    /// Add a host. Returns `false` without changing anything when the name is
    /// blank, reserved, or already taken (case-insensitively).
    pub fn add_host(&mut self, mut host: Host) -> StoreResult<bool> {
        host.nom = host.nom.trim().to_string();
        if host.nom.is_empty() || is_reserved_host_name(&host.nom) || self.host(&host.nom).is_some() {
            debug!("Rejected host \"{}\"", host.nom);
            return Ok(false);
        }
        self.hosts.push(host);
        sort_hosts(&mut self.hosts);
        self.persist(&[Slot::Hosts])?;
        Ok(true)
    }

    /// Merge the fields set in `update` into the host named `name`.
    pub fn update_host(&mut self, name: &str, update: HostUpdate) -> StoreResult<()> {
        let index = self.host_index(name)?;
        let host = &mut self.hosts[index];
        if let Some(telephone) = update.telephone {
            host.telephone = telephone;
        }
        if let Some(gender) = update.gender {
            host.gender = gender;
        }
        if let Some(address) = update.address {
            host.address = Some(address).filter(|a| !a.trim().is_empty());
        }
        if let Some(unavailability) = update.unavailability {
            host.unavailability = unavailability;
        }
        if let Some(photo_url) = update.photo_url {
            host.photo_url = Some(photo_url).filter(|p| !p.trim().is_empty());
        }
        self.persist(&[Slot::Hosts])
    }

    /// Remove a host. Visits still expecting that host (anything not
    /// cancelled) go back to the unassigned value; cancelled visits keep the
    /// name they were recorded with. Returns the number of visits reassigned.
    pub fn delete_host(&mut self, name: &str) -> StoreResult<usize> {
        let index = self.host_index(name)?;
        let removed = self.hosts.remove(index);

        let mut reassigned = 0;
        for visit in self.visits.iter_mut() {
            if visit.host == removed.nom && !visit.is_cancelled() {
                visit.host = UNASSIGNED_HOST.to_string();
                reassigned += 1;
            }
        }
        self.persist(&[Slot::Hosts, Slot::Visits])?;
        Ok(reassigned)
    }

    /// Record a period during which the host cannot receive anyone.
    pub fn add_unavailability(
        &mut self,
        name: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        reason: Option<String>,
    ) -> StoreResult<UnavailabilityPeriod> {
        if end_date < start_date {
            return Err(StoreError::Invalid(format!(
                "unavailability ends ({}) before it starts ({})",
                end_date, start_date
            )));
        }
        let index = self.host_index(name)?;
        let period = UnavailabilityPeriod {
            id: uuid::Uuid::new_v4().to_string(),
            start_date,
            end_date,
            reason: reason.filter(|r| !r.trim().is_empty()),
        };
        let mut unavailability = self.hosts[index].unavailability.clone();
        unavailability.push(period.clone());
        unavailability.sort_by_key(|p| p.start_date);

        let nom = self.hosts[index].nom.clone();
        self.update_host(
            &nom,
            HostUpdate {
                unavailability: Some(unavailability),
                ..Default::default()
            },
        )?;
        Ok(period)
    }

    pub fn remove_unavailability(&mut self, name: &str, period_id: &str) -> StoreResult<()> {
        let index = self.host_index(name)?;
        let host = &self.hosts[index];
        if !host.unavailability.iter().any(|p| p.id == period_id) {
            return Err(StoreError::not_found("unavailability period", period_id));
        }
        let unavailability = host.unavailability.iter().filter(|p| p.id != period_id).cloned().collect();
        let nom = host.nom.clone();
        self.update_host(
            &nom,
            HostUpdate {
                unavailability: Some(unavailability),
                ..Default::default()
            },
        )
    }
}

pub(super) fn sort_hosts(hosts: &mut [Host]) {
    hosts.sort_by(|a, b| collate(&a.nom, &b.nom));
}

#[cfg(test)]
mod tests {
    use crate::db::test_fixtures::{date, empty_store, host, seeded_store};
    use crate::models::{Gender, HostUpdate, UNASSIGNED_HOST, VisitStatus};
    use crate::store::StoreError;

    #[test]
    fn add_rejects_case_insensitive_duplicates() {
        let mut store = empty_store();
        assert!(store.add_host(host("Jean")).unwrap());
        assert!(!store.add_host(host("JEAN")).unwrap());
        assert!(!store.add_host(host(" jean ")).unwrap());
        assert_eq!(store.hosts().len(), 1);
    }

    #[test]
    fn add_rejects_reserved_and_blank_names() {
        let mut store = empty_store();
        assert!(!store.add_host(host(UNASSIGNED_HOST)).unwrap());
        assert!(!store.add_host(host("zoom")).unwrap());
        assert!(!store.add_host(host("")).unwrap());
        assert!(store.hosts().is_empty());
    }

    #[test]
    fn add_keeps_hosts_sorted() {
        let mut store = empty_store();
        for name in ["Sylvie", "Élise", "Bruno"] {
            store.add_host(host(name)).unwrap();
        }
        let names: Vec<&str> = store.hosts().iter().map(|h| h.nom.as_str()).collect();
        assert_eq!(names, vec!["Bruno", "Élise", "Sylvie"]);
    }

    #[test]
    fn update_merges_only_given_fields() {
        let mut store = seeded_store();
        store
            .update_host(
                "marc",
                HostUpdate {
                    gender: Some(Gender::Female),
                    address: Some("3 rue des Lilas".into()),
                    ..Default::default()
                },
            )
            .unwrap();

        let marc = store.host("Marc").unwrap();
        assert_eq!(marc.gender, Gender::Female);
        assert_eq!(marc.address.as_deref(), Some("3 rue des Lilas"));
        assert_eq!(marc.telephone, "0600000000");
    }

    #[test]
    fn update_unknown_host_is_not_found() {
        let mut store = empty_store();
        let err = store.update_host("Nobody", HostUpdate::default()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { kind: "host", .. }));
    }

    #[test]
    fn delete_reassigns_visits_instead_of_removing_them() {
        let mut store = seeded_store();
        let total = store.visits().len();

        let reassigned = store.delete_host("Marc").unwrap();

        assert_eq!(reassigned, 1);
        assert_eq!(store.visits().len(), total);
        assert_eq!(store.visit("v1").unwrap().host, UNASSIGNED_HOST);
        assert!(store.host("Marc").is_none());
    }

    #[test]
    fn delete_leaves_cancelled_visits_untouched() {
        let mut store = seeded_store();
        let mut v1 = store.visit("v1").unwrap().clone();
        v1.status = VisitStatus::Cancelled;
        store.update_visit(v1).unwrap();

        let reassigned = store.delete_host("Marc").unwrap();

        assert_eq!(reassigned, 0);
        assert_eq!(store.visit("v1").unwrap().host, "Marc");
    }

    #[test]
    fn unavailability_periods_can_be_added_and_removed() {
        let mut store = seeded_store();
        let period = store
            .add_unavailability("Marc", date("2025-06-01"), date("2025-06-10"), Some("Vacances".into()))
            .unwrap();

        let marc = store.host("Marc").unwrap();
        assert!(marc.is_unavailable_on(date("2025-06-01")));
        assert!(marc.is_unavailable_on(date("2025-06-10")));
        assert!(!marc.is_unavailable_on(date("2025-05-31")));
        assert!(!marc.is_unavailable_on(date("2025-06-11")));

        store.remove_unavailability("Marc", &period.id).unwrap();
        assert!(store.host("Marc").unwrap().unavailability.is_empty());
    }

    #[test]
    fn unavailability_must_not_end_before_it_starts() {
        let mut store = seeded_store();
        let err = store
            .add_unavailability("Marc", date("2025-06-10"), date("2025-06-01"), None)
            .unwrap_err();
        assert!(matches!(err, StoreError::Invalid(_)));
    }

    #[test]
    fn removing_unknown_period_is_not_found() {
        let mut store = seeded_store();
        assert!(matches!(
            store.remove_unavailability("Marc", "nope"),
            Err(StoreError::NotFound { .. })
        ));
    }
}
