//! The domain store: every live collection, loaded once and written through
//! to the key/value table on each mutation.
//!
//! A `Store` is an explicit value owned by the command being run. Anything that
//! needs data receives it by reference; there is no global state.

mod backup;
mod hosts;
mod speakers;
mod sync;
mod templates;
mod visits;

pub use backup::ImportSummary;
pub use sync::SyncStats;
pub use visits::MAX_ATTACHMENT_BYTES;

use log::{debug, warn};
use rusqlite::Connection;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::db::kv::KvStore;
use crate::db::legacy::{self, CURRENT_SCHEMA_VERSION, LegacyCollections};
use crate::models::{CustomHostRequestTemplates, CustomMessageTemplates, Host, Speaker, Visit};

pub const SPEAKERS_KEY: &str = "speakers";
pub const VISITS_KEY: &str = "visits";
pub const HOSTS_KEY: &str = "hosts";
pub const ARCHIVED_VISITS_KEY: &str = "archivedVisits";
pub const CUSTOM_TEMPLATES_KEY: &str = "customMessageTemplates";
pub const HOST_REQUEST_TEMPLATES_KEY: &str = "customHostRequestTemplates";
pub const GOOGLE_SHEET_ID_KEY: &str = "googleSheetId";
pub const GOOGLE_API_KEY_KEY: &str = "googleApiKey";
pub const SCHEMA_VERSION_KEY: &str = "schemaVersion";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("No {kind} found matching \"{key}\"")]
    NotFound { kind: &'static str, key: String },

    #[error("A visit with id \"{0}\" already exists")]
    DuplicateVisit(String),

    #[error("Invalid value: {0}")]
    Invalid(String),

    #[error("Invalid or corrupted backup file: {0}")]
    InvalidBackup(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        StoreError::NotFound {
            kind,
            key: key.into(),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A persisted collection or scalar, used to name what a mutation must write.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Slot {
    Speakers,
    Visits,
    Hosts,
    ArchivedVisits,
    CustomTemplates,
    HostRequestTemplates,
    GoogleSheetId,
    GoogleApiKey,
}

impl Slot {
    pub(crate) const ALL: [Slot; 8] = [
        Slot::Speakers,
        Slot::Visits,
        Slot::Hosts,
        Slot::ArchivedVisits,
        Slot::CustomTemplates,
        Slot::HostRequestTemplates,
        Slot::GoogleSheetId,
        Slot::GoogleApiKey,
    ];

    fn key(self) -> &'static str {
        match self {
            Slot::Speakers => SPEAKERS_KEY,
            Slot::Visits => VISITS_KEY,
            Slot::Hosts => HOSTS_KEY,
            Slot::ArchivedVisits => ARCHIVED_VISITS_KEY,
            Slot::CustomTemplates => CUSTOM_TEMPLATES_KEY,
            Slot::HostRequestTemplates => HOST_REQUEST_TEMPLATES_KEY,
            Slot::GoogleSheetId => GOOGLE_SHEET_ID_KEY,
            Slot::GoogleApiKey => GOOGLE_API_KEY_KEY,
        }
    }
}

pub struct Store {
    kv: KvStore,
    speakers: Vec<Speaker>,
    visits: Vec<Visit>,
    hosts: Vec<Host>,
    archived_visits: Vec<Visit>,
    custom_templates: CustomMessageTemplates,
    host_request_templates: CustomHostRequestTemplates,
    google_sheet_id: String,
    google_api_key: String,
}

impl Store {
    /// Load every collection from `conn`, upgrading stored data written by
    /// older versions first.
    pub fn open(conn: Connection) -> StoreResult<Self> {
        let kv = KvStore::new(conn);

        let stored_version = kv.read::<Option<u32>, _>(SCHEMA_VERSION_KEY, || None)?;
        let mut speakers = kv.read::<Vec<Value>, _>(SPEAKERS_KEY, Vec::new)?;
        let mut hosts = kv.read::<Vec<Value>, _>(HOSTS_KEY, Vec::new)?;
        let mut visits = kv.read::<Vec<Value>, _>(VISITS_KEY, Vec::new)?;
        let mut archived = kv.read::<Vec<Value>, _>(ARCHIVED_VISITS_KEY, Vec::new)?;

        let report = legacy::upgrade(
            stored_version,
            LegacyCollections {
                speakers: &mut speakers,
                hosts: &mut hosts,
                visits: &mut visits,
                archived_visits: &mut archived,
            },
        );
        if report.speakers {
            eprintln!("[kbv] Migrated speaker records to the talk history format.");
            kv.write(SPEAKERS_KEY, &speakers)?;
        }
        if report.hosts {
            eprintln!("[kbv] Migrated host records to the availability format.");
            kv.write(HOSTS_KEY, &hosts)?;
        }
        if report.visits {
            eprintln!("[kbv] Migrated visit records to the current format.");
            kv.write(VISITS_KEY, &visits)?;
        }
        if report.archived_visits {
            kv.write(ARCHIVED_VISITS_KEY, &archived)?;
        }
        if stored_version != Some(CURRENT_SCHEMA_VERSION) {
            kv.write(SCHEMA_VERSION_KEY, &CURRENT_SCHEMA_VERSION)?;
        }

        let store = Store {
            speakers: typed_keeping_readable(&kv, SPEAKERS_KEY, speakers)?,
            hosts: typed_keeping_readable(&kv, HOSTS_KEY, hosts)?,
            visits: typed_keeping_readable(&kv, VISITS_KEY, visits)?,
            archived_visits: typed_keeping_readable(&kv, ARCHIVED_VISITS_KEY, archived)?,
            custom_templates: kv.read(CUSTOM_TEMPLATES_KEY, CustomMessageTemplates::new)?,
            host_request_templates: kv.read(HOST_REQUEST_TEMPLATES_KEY, CustomHostRequestTemplates::new)?,
            google_sheet_id: kv.read(GOOGLE_SHEET_ID_KEY, String::new)?,
            google_api_key: kv.read(GOOGLE_API_KEY_KEY, String::new)?,
            kv,
        };
        debug!(
            "Store loaded: {} speakers, {} hosts, {} visits, {} archived",
            store.speakers.len(),
            store.hosts.len(),
            store.visits.len(),
            store.archived_visits.len()
        );
        Ok(store)
    }

    // --- Snapshot accessors ---

    pub fn speakers(&self) -> &[Speaker] {
        &self.speakers
    }

    pub fn visits(&self) -> &[Visit] {
        &self.visits
    }

    pub fn hosts(&self) -> &[Host] {
        &self.hosts
    }

    pub fn archived_visits(&self) -> &[Visit] {
        &self.archived_visits
    }

    pub fn custom_templates(&self) -> &CustomMessageTemplates {
        &self.custom_templates
    }

    pub fn host_request_templates(&self) -> &CustomHostRequestTemplates {
        &self.host_request_templates
    }

    pub fn google_sheet_id(&self) -> &str {
        &self.google_sheet_id
    }

    pub fn google_api_key(&self) -> &str {
        &self.google_api_key
    }

    /// Stored keys and their sizes, for diagnostics.
    pub fn storage_entries(&self) -> StoreResult<Vec<(String, usize)>> {
        Ok(self.kv.entries()?)
    }

    pub fn connection(&self) -> &Connection {
        self.kv.connection()
    }

    // --- Sync configuration ---

    pub fn set_google_sheet_id(&mut self, id: &str) -> StoreResult<()> {
        self.google_sheet_id = id.trim().to_string();
        self.persist(&[Slot::GoogleSheetId])
    }

    pub fn set_google_api_key(&mut self, key: &str) -> StoreResult<()> {
        self.google_api_key = key.trim().to_string();
        self.persist(&[Slot::GoogleApiKey])
    }

    // --- Persistence ---

    fn slot_value(&self, slot: Slot) -> StoreResult<Value> {
        let value = match slot {
            Slot::Speakers => serde_json::to_value(&self.speakers)?,
            Slot::Visits => serde_json::to_value(&self.visits)?,
            Slot::Hosts => serde_json::to_value(&self.hosts)?,
            Slot::ArchivedVisits => serde_json::to_value(&self.archived_visits)?,
            Slot::CustomTemplates => serde_json::to_value(&self.custom_templates)?,
            Slot::HostRequestTemplates => serde_json::to_value(&self.host_request_templates)?,
            Slot::GoogleSheetId => Value::String(self.google_sheet_id.clone()),
            Slot::GoogleApiKey => Value::String(self.google_api_key.clone()),
        };
        Ok(value)
    }

    /// Write the given slots. Several slots are written in one transaction.
    pub(crate) fn persist(&self, slots: &[Slot]) -> StoreResult<()> {
        let mut entries = Vec::with_capacity(slots.len());
        for slot in slots {
            entries.push((slot.key(), self.slot_value(*slot)?));
        }
        self.kv.write_batch(&entries)?;
        Ok(())
    }
}

/// Deserialize a migrated collection record by record. Records that do not
/// fit the current types are dropped from the collection and appended to the
/// `<key>.rejected` entry.
fn typed_keeping_readable<T>(kv: &KvStore, key: &str, raw: Vec<Value>) -> StoreResult<Vec<T>>
where
    T: Serialize + DeserializeOwned,
{
    let mut items = Vec::with_capacity(raw.len());
    let mut rejected = Vec::new();
    for record in raw {
        match T::deserialize(&record) {
            Ok(item) => items.push(item),
            Err(e) => {
                warn!("Skipping unreadable \"{}\" record ({})", key, e);
                rejected.push(record);
            }
        }
    }
    if rejected.is_empty() {
        return Ok(items);
    }

    let rejected_key = format!("{}.rejected", key);
    let moved = rejected.len();
    let mut kept: Vec<Value> = kv.read(&rejected_key, Vec::new)?;
    kept.extend(rejected);
    kv.write_batch(&[
        (rejected_key.as_str(), serde_json::to_value(&kept)?),
        (key, serde_json::to_value(&items)?),
    ])?;
    warn!("Moved {} unreadable \"{}\" record(s) to \"{}\"", moved, key, rejected_key);
    Ok(items)
}
