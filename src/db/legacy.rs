//! Upgrades of stored JSON documents written by older versions.
//!
//! Each pass inspects the records for the fields that only the old shape
//! carried and rewrites them in place. Legacy fields are removed once
//! consumed, so running a pass against current data changes nothing.
//!
//! Passes are dispatched by the persisted `schemaVersion`: documents below
//! [`CURRENT_SCHEMA_VERSION`] (or without a version) go through all of them.

use log::info;
use serde_json::{Map, Value, json};

/// Version written alongside the data once every pass has been applied.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

const LEGACY_UNAVAILABILITY_START: &str = "2024-01-01";
const LEGACY_UNAVAILABILITY_REASON: &str = "Importé depuis l'ancien système";

/// The mutable collections a migration run operates on.
pub struct LegacyCollections<'a> {
    pub speakers: &'a mut Vec<Value>,
    pub hosts: &'a mut Vec<Value>,
    pub visits: &'a mut Vec<Value>,
    pub archived_visits: &'a mut Vec<Value>,
}

/// Which collections were rewritten by [`upgrade`].
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct UpgradeReport {
    pub speakers: bool,
    pub hosts: bool,
    pub visits: bool,
    pub archived_visits: bool,
}

impl UpgradeReport {
    pub fn any(&self) -> bool {
        self.speakers || self.hosts || self.visits || self.archived_visits
    }
}

/// Run every pass needed to bring data stored at `from_version` up to date.
pub fn upgrade(from_version: Option<u32>, data: LegacyCollections<'_>) -> UpgradeReport {
    let mut report = UpgradeReport::default();
    if from_version.is_some_and(|v| v >= CURRENT_SCHEMA_VERSION) {
        return report;
    }

    report.speakers = migrate_speakers(data.speakers);
    let status = migrate_host_status(data.hosts);
    let gender = migrate_host_gender(data.hosts);
    report.hosts = status || gender;
    report.visits = migrate_visits(data.visits);
    report.archived_visits = migrate_visits(data.archived_visits);

    if report.any() {
        info!("Upgraded stored data to schema version {}: {:?}", CURRENT_SCHEMA_VERSION, report);
    }
    report
}

/// Both visit passes, in order.
pub fn migrate_visits(visits: &mut [Value]) -> bool {
    let flat = migrate_visit_fields(visits);
    let comm = migrate_communication_status(visits);
    flat || comm
}

fn first_object(records: &[Value]) -> Option<&Map<String, Value>> {
    records.first().and_then(Value::as_object)
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

/// Copy `keys` from `from` into `to` when present.
fn copy_fields(from: &Map<String, Value>, to: &mut Map<String, Value>, keys: &[&str]) {
    for key in keys {
        if let Some(v) = from.get(*key) {
            to.insert((*key).to_string(), v.clone());
        }
    }
}

/// Speakers stored before talk history existed carried a single last visit.
pub fn migrate_speakers(speakers: &mut [Value]) -> bool {
    match first_object(speakers) {
        Some(first) if !first.contains_key("talkHistory") => {}
        _ => return false,
    }

    for speaker in speakers.iter_mut() {
        let Some(old) = speaker.as_object() else { continue };
        if old.contains_key("talkHistory") {
            continue;
        }

        let mut new = Map::new();
        copy_fields(old, &mut new, &["id", "nom", "congregation", "telephone", "notes", "photoUrl"]);

        let mut history = Vec::new();
        if is_truthy(old.get("lastVisitDate")) {
            history.push(json!({
                "date": old["lastVisitDate"],
                "talkNo": old.get("lastTalkNoOrType").cloned().unwrap_or(Value::Null),
                "theme": old.get("latestDPTheme").cloned().unwrap_or(Value::Null),
            }));
        }
        new.insert("talkHistory".to_string(), Value::Array(history));
        *speaker = Value::Object(new);
    }
    true
}

/// Hosts used to have a single `status` flag with an optional end date.
pub fn migrate_host_status(hosts: &mut [Value]) -> bool {
    match first_object(hosts) {
        Some(first) if first.contains_key("status") => {}
        _ => return false,
    }

    for host in hosts.iter_mut() {
        let Some(old) = host.as_object() else { continue };
        if !old.contains_key("status") {
            continue;
        }

        let mut new = Map::new();
        copy_fields(old, &mut new, &["nom", "telephone", "address", "photoUrl"]);
        let gender = old
            .get("gender")
            .filter(|g| is_truthy(Some(*g)))
            .cloned()
            .unwrap_or_else(|| json!("male"));
        new.insert("gender".to_string(), gender);

        let mut periods = old
            .get("unavailability")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let is_unavailable = old.get("status").and_then(Value::as_str) == Some("unavailable");
        if is_unavailable && is_truthy(old.get("unavailableUntil")) {
            periods.push(json!({
                "id": uuid::Uuid::new_v4().to_string(),
                "startDate": LEGACY_UNAVAILABILITY_START,
                "endDate": old["unavailableUntil"],
                "reason": LEGACY_UNAVAILABILITY_REASON,
            }));
        }
        new.insert("unavailability".to_string(), Value::Array(periods));
        *host = Value::Object(new);
    }
    true
}

/// Hosts stored before gender was recorded default to male.
pub fn migrate_host_gender(hosts: &mut [Value]) -> bool {
    match first_object(hosts) {
        Some(first) if !first.contains_key("gender") => {}
        _ => return false,
    }

    for host in hosts.iter_mut() {
        if let Some(obj) = host.as_object_mut() {
            obj.entry("gender").or_insert_with(|| json!("male"));
        }
    }
    true
}

/// Visits used to mix speaker history fields into the visit record. Talk
/// details cannot be recovered from that shape, so they start out empty.
pub fn migrate_visit_fields(visits: &mut [Value]) -> bool {
    match first_object(visits) {
        Some(first) if first.contains_key("latestDPTheme") => {}
        _ => return false,
    }

    for visit in visits.iter_mut() {
        let Some(old) = visit.as_object() else { continue };
        if !old.contains_key("latestDPTheme") {
            continue;
        }

        let mut new = Map::new();
        copy_fields(
            old,
            &mut new,
            &[
                "id",
                "nom",
                "congregation",
                "telephone",
                "photoUrl",
                "visitId",
                "visitDate",
                "visitTime",
                "host",
                "accommodation",
                "meals",
                "notes",
                "status",
                "attachments",
                "locationType",
                "communicationStatus",
                "preparationMessageSentOn",
            ],
        );
        new.insert("talkNoOrType".to_string(), Value::Null);
        new.insert("talkTheme".to_string(), Value::Null);
        *visit = Value::Object(new);
    }
    true
}

/// A single `preparationMessageSentOn` timestamp predates per-role tracking;
/// it is assumed to cover both the speaker and the host.
pub fn migrate_communication_status(visits: &mut [Value]) -> bool {
    let needed = visits
        .iter()
        .any(|v| v.as_object().is_some_and(|o| o.contains_key("preparationMessageSentOn")));
    if !needed {
        return false;
    }

    for visit in visits.iter_mut() {
        let Some(obj) = visit.as_object_mut() else { continue };
        let sent_on = obj.remove("preparationMessageSentOn");

        let status = obj
            .entry("communicationStatus")
            .or_insert_with(|| Value::Object(Map::new()));
        if !status.is_object() {
            *status = Value::Object(Map::new());
        }

        if let Some(sent_on) = sent_on.filter(|s| is_truthy(Some(s))) {
            if let Some(status) = status.as_object_mut() {
                let prep = status
                    .entry("preparation")
                    .or_insert_with(|| Value::Object(Map::new()));
                if !prep.is_object() {
                    *prep = Value::Object(Map::new());
                }
                if let Some(prep) = prep.as_object_mut() {
                    prep.insert("speaker".to_string(), sent_on.clone());
                    prep.insert("host".to_string(), sent_on);
                }
            }
        }
    }
    true
}
