//! Domain types for kbv.
//!
//! These types are the single source of truth for persisted data. Field names
//! follow the persisted JSON document (camelCase), so a backup written by any
//! earlier version deserializes directly once the legacy passes in
//! `db::legacy` have run.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// Reserved host values
// ============================================================================

/// Host value meaning "no host chosen yet".
pub const UNASSIGNED_HOST: &str = "À définir";
pub const ZOOM_HOST: &str = "Zoom";
pub const STREAMING_HOST: &str = "Streaming";
pub const NO_HOST_NEEDED: &str = "PAS BESOIN";

/// Host values with a special meaning. A real host may never use one of these names.
pub const RESERVED_HOST_NAMES: [&str; 4] = [UNASSIGNED_HOST, ZOOM_HOST, STREAMING_HOST, NO_HOST_NEEDED];

/// Congregation recorded for speakers created from a sheet row without one.
pub const UNKNOWN_CONGREGATION: &str = "Non spécifiée";

/// Older writers stored `null` for blank text fields.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub fn is_reserved_host_name(name: &str) -> bool {
    let lower = name.trim().to_lowercase();
    RESERVED_HOST_NAMES.iter().any(|r| r.to_lowercase() == lower)
}

// ============================================================================
// Speakers
// ============================================================================

/// A past, completed talk attached to a speaker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TalkHistory {
    pub date: NaiveDate,
    #[serde(default)]
    pub talk_no: Option<String>,
    #[serde(default)]
    pub theme: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Speaker {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub nom: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub congregation: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub talk_history: Vec<TalkHistory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telephone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

impl Speaker {
    pub fn new(nom: impl Into<String>, congregation: impl Into<String>) -> Self {
        Speaker {
            id: uuid::Uuid::new_v4().to_string(),
            nom: nom.into(),
            congregation: congregation.into(),
            talk_history: Vec::new(),
            telephone: None,
            notes: None,
            photo_url: None,
        }
    }

    /// Most recent talk date, if the speaker has ever visited.
    pub fn last_talk_date(&self) -> Option<NaiveDate> {
        self.talk_history.iter().map(|h| h.date).max()
    }
}

// ============================================================================
// Hosts
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Male,
    Female,
}

impl Gender {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "male" | "m" | "frère" => Some(Gender::Male),
            "female" | "f" | "soeur" | "sœur" => Some(Gender::Female),
            _ => None,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "male"),
            Gender::Female => write!(f, "female"),
        }
    }
}

/// An inclusive date range during which a host cannot receive a speaker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnavailabilityPeriod {
    pub id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl UnavailabilityPeriod {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// A host is identified by its name (`nom`); there is no separate id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Host {
    #[serde(default, deserialize_with = "null_as_default")]
    pub nom: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub telephone: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub gender: Gender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub unavailability: Vec<UnavailabilityPeriod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

impl Host {
    pub fn is_unavailable_on(&self, date: NaiveDate) -> bool {
        self.unavailability.iter().any(|p| p.contains(date))
    }
}

/// Fields that may be merged into an existing host. The name is not part of
/// the update: a host keeps the name it was created with.
#[derive(Debug, Clone, Default)]
pub struct HostUpdate {
    pub telephone: Option<String>,
    pub gender: Option<Gender>,
    pub address: Option<String>,
    pub unavailability: Option<Vec<UnavailabilityPeriod>>,
    pub photo_url: Option<String>,
}

// ============================================================================
// Visits
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisitStatus {
    Confirmed,
    #[default]
    Pending,
    Cancelled,
    Completed,
}

impl VisitStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "confirmed" => Some(VisitStatus::Confirmed),
            "pending" => Some(VisitStatus::Pending),
            "cancelled" | "canceled" => Some(VisitStatus::Cancelled),
            "completed" => Some(VisitStatus::Completed),
            _ => None,
        }
    }
}

impl fmt::Display for VisitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VisitStatus::Confirmed => "confirmed",
            VisitStatus::Pending => "pending",
            VisitStatus::Cancelled => "cancelled",
            VisitStatus::Completed => "completed",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationType {
    #[default]
    Physical,
    Zoom,
    Streaming,
}

impl LocationType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "physical" => Some(LocationType::Physical),
            "zoom" => Some(LocationType::Zoom),
            "streaming" => Some(LocationType::Streaming),
            _ => None,
        }
    }
}

impl fmt::Display for LocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LocationType::Physical => "physical",
            LocationType::Zoom => "zoom",
            LocationType::Streaming => "streaming",
        };
        write!(f, "{}", s)
    }
}

/// A file stored inline on a visit as a base64 data URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub name: String,
    pub data_url: String,
    pub size: u64,
}

/// When a message was sent to each role.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleStamps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<DateTime<Utc>>,
}

impl RoleStamps {
    pub fn get(&self, role: MessageRole) -> Option<DateTime<Utc>> {
        match role {
            MessageRole::Speaker => self.speaker,
            MessageRole::Host => self.host,
        }
    }

    fn set(&mut self, role: MessageRole, at: DateTime<Utc>) {
        match role {
            MessageRole::Speaker => self.speaker = Some(at),
            MessageRole::Host => self.host = Some(at),
        }
    }
}

/// Sparse record of sent messages, one slot per (message type × role).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommunicationStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preparation: Option<RoleStamps>,
    #[serde(rename = "reminder7days", default, skip_serializing_if = "Option::is_none")]
    pub reminder_7_days: Option<RoleStamps>,
    #[serde(rename = "reminder2days", default, skip_serializing_if = "Option::is_none")]
    pub reminder_2_days: Option<RoleStamps>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thanks: Option<RoleStamps>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub needs: Option<RoleStamps>,
}

impl CommunicationStatus {
    fn slot(&self, message: MessageType) -> &Option<RoleStamps> {
        match message {
            MessageType::Preparation => &self.preparation,
            MessageType::Reminder7 => &self.reminder_7_days,
            MessageType::Reminder2 => &self.reminder_2_days,
            MessageType::Thanks => &self.thanks,
            MessageType::Needs => &self.needs,
        }
    }

    fn slot_mut(&mut self, message: MessageType) -> &mut Option<RoleStamps> {
        match message {
            MessageType::Preparation => &mut self.preparation,
            MessageType::Reminder7 => &mut self.reminder_7_days,
            MessageType::Reminder2 => &mut self.reminder_2_days,
            MessageType::Thanks => &mut self.thanks,
            MessageType::Needs => &mut self.needs,
        }
    }

    pub fn sent_at(&self, message: MessageType, role: MessageRole) -> Option<DateTime<Utc>> {
        self.slot(message).as_ref().and_then(|s| s.get(role))
    }

    pub fn stamp(&mut self, message: MessageType, role: MessageRole, at: DateTime<Utc>) {
        self.slot_mut(message).get_or_insert_with(RoleStamps::default).set(role, at);
    }
}

/// A scheduled engagement. The speaker fields are a snapshot taken when the
/// visit was created and are not kept in sync with the speaker record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    /// Speaker id.
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub nom: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub congregation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telephone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,

    pub visit_id: String,
    pub visit_date: NaiveDate,
    #[serde(default, deserialize_with = "null_as_default")]
    pub visit_time: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub accommodation: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub meals: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: VisitStatus,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub location_type: LocationType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub communication_status: CommunicationStatus,

    #[serde(default)]
    pub talk_no_or_type: Option<String>,
    #[serde(default)]
    pub talk_theme: Option<String>,
}

fn default_host() -> String {
    UNASSIGNED_HOST.to_string()
}

impl Visit {
    /// Build a new visit for `speaker`, copying the speaker's identity fields.
    pub fn for_speaker(speaker: &Speaker, visit_date: NaiveDate, visit_time: impl Into<String>) -> Self {
        Visit {
            id: speaker.id.clone(),
            nom: speaker.nom.clone(),
            congregation: speaker.congregation.clone(),
            telephone: speaker.telephone.clone(),
            photo_url: speaker.photo_url.clone(),
            visit_id: uuid::Uuid::new_v4().to_string(),
            visit_date,
            visit_time: visit_time.into(),
            host: UNASSIGNED_HOST.to_string(),
            accommodation: String::new(),
            meals: String::new(),
            notes: None,
            status: VisitStatus::Pending,
            attachments: Vec::new(),
            location_type: LocationType::Physical,
            communication_status: CommunicationStatus::default(),
            talk_no_or_type: None,
            talk_theme: None,
        }
    }

    /// Replace the speaker snapshot with the current fields of `speaker`.
    pub fn assign_speaker(&mut self, speaker: &Speaker) {
        self.id = speaker.id.clone();
        self.nom = speaker.nom.clone();
        self.congregation = speaker.congregation.clone();
        self.telephone = speaker.telephone.clone();
        self.photo_url = speaker.photo_url.clone();
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == VisitStatus::Cancelled
    }

    pub fn has_unassigned_host(&self) -> bool {
        self.host == UNASSIGNED_HOST
    }
}

// ============================================================================
// Message templates
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// French
    Fr,
    /// Cape Verdean Creole
    Cv,
}

impl Language {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "fr" => Some(Language::Fr),
            "cv" => Some(Language::Cv),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::Fr => write!(f, "fr"),
            Language::Cv => write!(f, "cv"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MessageType {
    #[serde(rename = "preparation")]
    Preparation,
    #[serde(rename = "reminder-7")]
    Reminder7,
    #[serde(rename = "reminder-2")]
    Reminder2,
    #[serde(rename = "thanks")]
    Thanks,
    #[serde(rename = "needs")]
    Needs,
}

impl MessageType {
    pub const ALL: [MessageType; 5] = [
        MessageType::Preparation,
        MessageType::Reminder7,
        MessageType::Reminder2,
        MessageType::Thanks,
        MessageType::Needs,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        MessageType::ALL.into_iter().find(|m| m.as_str() == s.to_lowercase())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Preparation => "preparation",
            MessageType::Reminder7 => "reminder-7",
            MessageType::Reminder2 => "reminder-2",
            MessageType::Thanks => "thanks",
            MessageType::Needs => "needs",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    Speaker,
    Host,
}

impl MessageRole {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "speaker" => Some(MessageRole::Speaker),
            "host" => Some(MessageRole::Host),
            _ => None,
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::Speaker => write!(f, "speaker"),
            MessageRole::Host => write!(f, "host"),
        }
    }
}

/// Per (language × message type × role) overrides of the built-in message texts.
pub type CustomMessageTemplates = BTreeMap<Language, BTreeMap<MessageType, BTreeMap<MessageRole, String>>>;

/// Per-language overrides of the host-request message.
pub type CustomHostRequestTemplates = BTreeMap<Language, String>;
