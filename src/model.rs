//! Entity types shared by the store, the assistant and the shell commands.
//!
//! Everything here serializes with camelCase field names so the persisted
//! blobs and the IPC payloads use the same shape the web UI expects.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub type EntityId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: EntityId,
    pub title: String,
    pub description: String,
    pub due_date: Option<String>,
    pub priority: Priority,
    pub status: TaskStatus,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A task as submitted by the UI, before the store assigns id and timestamps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub due_date: Option<String>,
    pub priority: Priority,
    pub status: TaskStatus,
    pub tags: Vec<String>,
}

/// Partial update for a task. `None` leaves the field untouched; for nullable
/// fields `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub due_date: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub status: Option<TaskStatus>,
    pub tags: Option<Vec<String>>,
}

impl Task {
    pub(crate) fn from_draft(id: EntityId, draft: NewTask, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: draft.title,
            description: draft.description,
            due_date: draft.due_date,
            priority: draft.priority,
            status: draft.status,
            tags: draft.tags,
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn apply(&mut self, patch: TaskPatch, now: DateTime<Utc>) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
        self.updated_at = now;
    }

    pub fn is_open(&self) -> bool {
        self.status != TaskStatus::Completed
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: EntityId,
    pub title: String,
    pub description: String,
    pub start_time: String,
    pub end_time: String,
    pub recurrence: Option<String>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub start_time: String,
    pub end_time: String,
    pub recurrence: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub recurrence: Option<Option<String>>,
    #[serde(deserialize_with = "nullable")]
    pub location: Option<Option<String>>,
}

impl CalendarEvent {
    pub(crate) fn from_draft(id: EntityId, draft: NewEvent, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: draft.title,
            description: draft.description,
            start_time: draft.start_time,
            end_time: draft.end_time,
            recurrence: draft.recurrence,
            location: draft.location,
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn apply(&mut self, patch: EventPatch, now: DateTime<Utc>) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(start_time) = patch.start_time {
            self.start_time = start_time;
        }
        if let Some(end_time) = patch.end_time {
            self.end_time = end_time;
        }
        if let Some(recurrence) = patch.recurrence {
            self.recurrence = recurrence;
        }
        if let Some(location) = patch.location {
            self.location = location;
        }
        self.updated_at = now;
    }

    /// Parsed start time, `None` when the stored string is not a date we know.
    pub fn starts_at(&self) -> Option<DateTime<Utc>> {
        parse_event_time(&self.start_time)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileItem {
    pub id: EntityId,
    pub path: String,
    pub name: String,
    pub content_hash: Option<String>,
    pub tags: Vec<String>,
    pub indexed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub id: EntityId,
    pub name: String,
    pub description: String,
    pub enabled: bool,
    pub config: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: EntityId,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub voice_enabled: bool,
    pub wake_word: String,
    pub llm_model: String,
    pub theme: Theme,
    pub start_minimized: bool,
    pub auto_start: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            voice_enabled: false,
            wake_word: "hey jarvis".to_string(),
            llm_model: "llama2".to_string(),
            theme: Theme::Dark,
            start_minimized: false,
            auto_start: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
    pub voice_enabled: Option<bool>,
    pub wake_word: Option<String>,
    pub llm_model: Option<String>,
    pub theme: Option<Theme>,
    pub start_minimized: Option<bool>,
    pub auto_start: Option<bool>,
}

impl Settings {
    /// Shallow merge: every field present in the patch wins.
    pub(crate) fn merge(&mut self, patch: SettingsPatch) {
        if let Some(v) = patch.voice_enabled {
            self.voice_enabled = v;
        }
        if let Some(v) = patch.wake_word {
            self.wake_word = v;
        }
        if let Some(v) = patch.llm_model {
            self.llm_model = v;
        }
        if let Some(v) = patch.theme {
            self.theme = v;
        }
        if let Some(v) = patch.start_minimized {
            self.start_minimized = v;
        }
        if let Some(v) = patch.auto_start {
            self.auto_start = v;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceStatus {
    #[default]
    Idle,
    Listening,
    Processing,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmStatus {
    #[default]
    Offline,
    Loading,
    Ready,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    #[default]
    Home,
    Tasks,
    Files,
    Calendar,
    Skills,
    Settings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskFilter {
    #[default]
    All,
    Pending,
    Completed,
}

impl TaskFilter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Pending => task.is_open(),
            Self::Completed => !task.is_open(),
        }
    }
}

// distinguishes an absent field from an explicit null in patches
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Parse the date strings the UI produces into an instant.
///
/// RFC 3339 carries its own offset. `datetime-local` values (with or without
/// seconds) are wall-clock times in the local zone; a nonexistent local time
/// (spring-forward gap) yields `None`. A bare date is midnight UTC.
pub fn parse_event_time(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc));
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
