//! Whole-store export, import and reset.

use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::db::legacy::{self, CURRENT_SCHEMA_VERSION, LegacyCollections};
use crate::models::{CustomHostRequestTemplates, CustomMessageTemplates, Host, Speaker, Visit};

use super::hosts::sort_hosts;
use super::speakers::sort_speakers;
use super::{Slot, Store, StoreError, StoreResult};

const REQUIRED_KEYS: [&str; 3] = ["speakers", "visits", "hosts"];

/// The exported JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    pub speakers: Vec<Speaker>,
    pub visits: Vec<Visit>,
    pub hosts: Vec<Host>,
    #[serde(default)]
    pub archived_visits: Vec<Visit>,
    #[serde(default)]
    pub custom_templates: CustomMessageTemplates,
    #[serde(default)]
    pub custom_host_request_templates: CustomHostRequestTemplates,
    #[serde(default)]
    pub google_sheet_id: String,
    #[serde(default)]
    pub google_api_key: String,
    #[serde(default)]
    pub schema_version: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub speakers: usize,
    pub visits: usize,
    pub hosts: usize,
    pub archived_visits: usize,
    pub upgraded: bool,
}

impl Store {
    pub fn export(&self) -> BackupDocument {
        BackupDocument {
            speakers: self.speakers.clone(),
            visits: self.visits.clone(),
            hosts: self.hosts.clone(),
            archived_visits: self.archived_visits.clone(),
            custom_templates: self.custom_templates.clone(),
            custom_host_request_templates: self.host_request_templates.clone(),
            google_sheet_id: self.google_sheet_id.clone(),
            google_api_key: self.google_api_key.clone(),
            schema_version: Some(CURRENT_SCHEMA_VERSION),
        }
    }

    /// Replace the whole store with the contents of a backup document.
    ///
    /// The document is validated, upgraded and fully parsed before anything is
    /// touched; on error the store is left exactly as it was.
    pub fn import(&mut self, document: Value) -> StoreResult<ImportSummary> {
        let Value::Object(mut doc) = document else {
            return Err(StoreError::InvalidBackup("the document is not a JSON object".into()));
        };
        for key in REQUIRED_KEYS {
            match doc.get(key) {
                Some(Value::Array(_)) => {}
                Some(_) => return Err(StoreError::InvalidBackup(format!("\"{}\" must be an array", key))),
                None => return Err(StoreError::InvalidBackup(format!("missing \"{}\"", key))),
            }
        }

        let mut speakers = take_array(&mut doc, "speakers");
        let mut visits = take_array(&mut doc, "visits");
        let mut hosts = take_array(&mut doc, "hosts");
        let mut archived = take_array(&mut doc, "archivedVisits");

        let version = doc.get("schemaVersion").and_then(Value::as_u64).map(|v| v as u32);
        let report = legacy::upgrade(
            version,
            LegacyCollections {
                speakers: &mut speakers,
                hosts: &mut hosts,
                visits: &mut visits,
                archived_visits: &mut archived,
            },
        );
        hosts.iter_mut().for_each(sanitize_host);
        speakers.iter_mut().for_each(sanitize_speaker);

        let parse_err = |what: &str, e: serde_json::Error| StoreError::InvalidBackup(format!("{}: {}", what, e));
        let speakers: Vec<Speaker> =
            serde_json::from_value(Value::Array(speakers)).map_err(|e| parse_err("speakers", e))?;
        let visits: Vec<Visit> = serde_json::from_value(Value::Array(visits)).map_err(|e| parse_err("visits", e))?;
        let hosts: Vec<Host> = serde_json::from_value(Value::Array(hosts)).map_err(|e| parse_err("hosts", e))?;
        let archived: Vec<Visit> =
            serde_json::from_value(Value::Array(archived)).map_err(|e| parse_err("archivedVisits", e))?;
        let custom_templates: CustomMessageTemplates = optional_object(&mut doc, "customTemplates")
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| parse_err("customTemplates", e))?
            .unwrap_or_default();
        let host_request_templates: CustomHostRequestTemplates =
            optional_object(&mut doc, "customHostRequestTemplates")
                .map(serde_json::from_value)
                .transpose()
                .map_err(|e| parse_err("customHostRequestTemplates", e))?
                .unwrap_or_default();
        let google_sheet_id = optional_string(&doc, "googleSheetId")
            .or_else(|| optional_string(&doc, "googleSheetUrl"))
            .unwrap_or_default();
        let google_api_key = optional_string(&doc, "googleApiKey").unwrap_or_default();

        let summary = ImportSummary {
            speakers: speakers.len(),
            visits: visits.len(),
            hosts: hosts.len(),
            archived_visits: archived.len(),
            upgraded: report.any(),
        };

        self.speakers = speakers;
        sort_speakers(&mut self.speakers);
        self.visits = visits;
        self.hosts = hosts;
        sort_hosts(&mut self.hosts);
        self.archived_visits = archived;
        self.custom_templates = custom_templates;
        self.host_request_templates = host_request_templates;
        self.google_sheet_id = google_sheet_id;
        self.google_api_key = google_api_key;
        self.persist(&Slot::ALL)?;

        info!("Imported backup: {:?}", summary);
        Ok(summary)
    }

    /// Erase every collection, template and sync setting.
    pub fn reset(&mut self) -> StoreResult<()> {
        self.speakers.clear();
        self.visits.clear();
        self.hosts.clear();
        self.archived_visits.clear();
        self.custom_templates.clear();
        self.host_request_templates.clear();
        self.google_sheet_id.clear();
        self.google_api_key.clear();
        self.persist(&Slot::ALL)?;
        info!("Store reset");
        Ok(())
    }
}

fn take_array(doc: &mut Map<String, Value>, key: &str) -> Vec<Value> {
    match doc.remove(key) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}

fn optional_object(doc: &mut Map<String, Value>, key: &str) -> Option<Value> {
    doc.remove(key).filter(Value::is_object)
}

fn optional_string(doc: &Map<String, Value>, key: &str) -> Option<String> {
    doc.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Text value for a field that must be a string; other scalars are stringified.
fn coerce_string(record: &mut Map<String, Value>, key: &str) {
    let coerced = match record.get(key) {
        Some(Value::String(_)) => return,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    };
    record.insert(key.to_string(), Value::String(coerced));
}

fn sanitize_host(host: &mut Value) {
    if let Value::Object(record) = host {
        coerce_string(record, "nom");
        if !record.get("unavailability").is_some_and(Value::is_array) {
            record.insert("unavailability".to_string(), Value::Array(Vec::new()));
        }
    }
}

fn sanitize_speaker(speaker: &mut Value) {
    if let Value::Object(record) = speaker {
        coerce_string(record, "nom");
        coerce_string(record, "congregation");
    }
}
