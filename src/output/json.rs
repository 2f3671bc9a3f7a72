use serde::Serialize;

use crate::models::{Host, Speaker, Visit};
use crate::query::dashboard::{QuickStats, Ranked, TimelineEvent};

/// Serialize any serializable value to pretty JSON string.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

/// JSON shape of the dashboard command.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardJson<'a> {
    pub stats: QuickStats<'a>,
    pub top_speakers: Vec<Ranked<&'a Speaker>>,
    pub top_hosts: Vec<Ranked<&'a Host>>,
    pub timeline: Vec<TimelineEvent<'a>>,
}

/// A visit listed together with the hosts free on its date.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NeedsHostJson<'a> {
    #[serde(flatten)]
    pub visit: &'a Visit,
    pub available_hosts: Vec<&'a str>,
}

/// Host availability on one date.
#[derive(Debug, Serialize)]
pub struct AvailabilityJson<'a> {
    pub date: chrono::NaiveDate,
    pub available: Vec<&'a Host>,
    pub unavailable: Vec<&'a Host>,
}

/// Storage summary printed by `kbv info`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoJson {
    pub version: &'static str,
    pub db_path: String,
    pub db_size_bytes: u64,
    pub table_schema_version: usize,
    pub data_schema_version: u32,
    pub speakers: usize,
    pub hosts: usize,
    pub visits: usize,
    pub archived_visits: usize,
    pub google_sheet_configured: bool,
    pub google_api_key_configured: bool,
    pub entries: Vec<EntryJson>,
}

#[derive(Debug, Serialize)]
pub struct EntryJson {
    pub key: String,
    pub bytes: usize,
}
