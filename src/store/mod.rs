//! App Store - the single state container behind the UI
//!
//! Holds every entity collection plus the voice/LLM/page status values.
//! Persisted collections are written through to the key-value store on every
//! mutation: the new collection is serialized and saved first, and only
//! replaces the in-memory copy once the write succeeded.
//!
//! Readers get clones, never references into the live record.

mod events;
mod ids;
mod library;
mod settings;
mod tasks;

pub use ids::IdGenerator;
pub use library::default_skills;

use crate::model::{
    CalendarEvent, EntityId, FileItem, LlmStatus, Message, Page, Role, Settings, Skill, Task,
    VoiceStatus,
};
use crate::storage::{KeyValueStore, StorageError};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

pub const TASKS_KEY: &str = "jarvis-tasks";
pub const EVENTS_KEY: &str = "jarvis-events";
pub const SETTINGS_KEY: &str = "jarvis-settings";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub struct AppStore {
    storage: Arc<dyn KeyValueStore>,
    ids: IdGenerator,
    current_page: Page,
    tasks: Vec<Task>,
    selected_task: Option<EntityId>,
    events: Vec<CalendarEvent>,
    selected_event: Option<EntityId>,
    files: Vec<FileItem>,
    indexed_folders: Vec<String>,
    skills: Vec<Skill>,
    messages: Vec<Message>,
    voice_status: VoiceStatus,
    voice_session: u64,
    llm_status: LlmStatus,
    llm_model: String,
    chat_session: u64,
    /// Status to restore when the pending chat ends without a result.
    /// `Some` exactly while a chat is pending.
    status_before_chat: Option<LlmStatus>,
    settings: Settings,
}

/// Point-in-time copy of the whole record, as sent to the UI.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSnapshot {
    pub current_page: Page,
    pub tasks: Vec<Task>,
    pub selected_task: Option<Task>,
    pub events: Vec<CalendarEvent>,
    pub selected_event: Option<CalendarEvent>,
    pub files: Vec<FileItem>,
    pub indexed_folders: Vec<String>,
    pub skills: Vec<Skill>,
    pub messages: Vec<Message>,
    pub voice_status: VoiceStatus,
    pub llm_status: LlmStatus,
    pub llm_model: String,
    pub settings: Settings,
}

/// Counters shown on the home page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub pending_tasks: usize,
    pub upcoming_events: usize,
}

impl AppStore {
    /// Empty collections and default settings; call [`AppStore::initialize`]
    /// to pull persisted state in.
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            storage,
            ids: IdGenerator::new(),
            current_page: Page::Home,
            tasks: Vec::new(),
            selected_task: None,
            events: Vec::new(),
            selected_event: None,
            files: Vec::new(),
            indexed_folders: Vec::new(),
            skills: Vec::new(),
            messages: Vec::new(),
            voice_status: VoiceStatus::Idle,
            voice_session: 0,
            llm_status: LlmStatus::Offline,
            llm_model: String::new(),
            chat_session: 0,
            status_before_chat: None,
            settings: Settings::default(),
        }
    }

    /// Load settings, tasks and events from storage and install the built-in
    /// skills. Unreadable blobs are logged and leave the defaults in place.
    pub fn initialize(&mut self) {
        self.load_settings();
        self.load_tasks();
        self.load_events();
        self.load_skills();
        tracing::info!(
            tasks = self.tasks.len(),
            events = self.events.len(),
            skills = self.skills.len(),
            "store initialized"
        );
    }

    pub fn snapshot(&self) -> AppSnapshot {
        AppSnapshot {
            current_page: self.current_page,
            tasks: self.tasks.clone(),
            selected_task: self.selected_task(),
            events: self.events.clone(),
            selected_event: self.selected_event(),
            files: self.files.clone(),
            indexed_folders: self.indexed_folders.clone(),
            skills: self.skills.clone(),
            messages: self.messages.clone(),
            voice_status: self.voice_status,
            llm_status: self.llm_status,
            llm_model: self.llm_model.clone(),
            settings: self.settings.clone(),
        }
    }

    pub fn set_current_page(&mut self, page: Page) {
        self.current_page = page;
    }

    pub fn dashboard(&self, now: DateTime<Utc>) -> Dashboard {
        Dashboard {
            pending_tasks: self.tasks.iter().filter(|t| t.is_open()).count(),
            upcoming_events: self
                .events
                .iter()
                .filter(|e| e.starts_at().is_some_and(|start| start > now))
                .count(),
        }
    }

    // --- chat and status ---

    pub fn messages(&self) -> Vec<Message> {
        self.messages.clone()
    }

    /// Append a chat message. Chat history lives in memory only.
    pub fn push_message(&mut self, role: Role, content: String) -> Message {
        let message = Message {
            id: self.ids.next_id(),
            role,
            content,
            timestamp: Utc::now(),
        };
        self.messages.push(message.clone());
        message
    }

    pub fn voice_status(&self) -> VoiceStatus {
        self.voice_status
    }

    pub fn set_voice_status(&mut self, status: VoiceStatus) {
        if self.voice_status != status {
            tracing::debug!(from = ?self.voice_status, to = ?status, "voice status");
        }
        self.voice_status = status;
    }

    /// Start a voice session in the listening state. Any older session loses
    /// the right to publish status.
    pub fn begin_voice(&mut self) -> u64 {
        self.voice_session += 1;
        self.set_voice_status(VoiceStatus::Listening);
        self.voice_session
    }

    /// Publish `status` for `session`. Returns `false`, writing nothing, when
    /// a newer session has started since.
    pub fn set_voice_status_for(&mut self, session: u64, status: VoiceStatus) -> bool {
        if session != self.voice_session {
            tracing::debug!(session, current = self.voice_session, "stale voice session");
            return false;
        }
        self.set_voice_status(status);
        true
    }

    pub fn llm_status(&self) -> LlmStatus {
        self.llm_status
    }

    pub fn llm_model(&self) -> &str {
        &self.llm_model
    }

    /// Publish a status check result. While a chat is pending the status
    /// stays `Loading` and the value is kept for when the chat ends.
    pub fn set_llm_status(&mut self, status: LlmStatus) {
        if let Some(before) = self.status_before_chat.as_mut() {
            *before = status;
            return;
        }
        self.write_llm_status(status);
    }

    /// Mark a chat as pending and return its session. A chat started while
    /// another is pending supersedes it.
    pub fn begin_chat(&mut self) -> u64 {
        self.chat_session += 1;
        if self.status_before_chat.is_none() {
            self.status_before_chat = Some(self.llm_status);
        }
        self.write_llm_status(LlmStatus::Loading);
        self.chat_session
    }

    /// End `session` with `outcome`, or restore the pre-chat status when
    /// `outcome` is `None`. Superseded sessions write nothing and get `false`.
    pub fn end_chat(&mut self, session: u64, outcome: Option<LlmStatus>) -> bool {
        if session != self.chat_session {
            tracing::debug!(session, current = self.chat_session, "stale chat session");
            return false;
        }
        let before = self.status_before_chat.take();
        if let Some(status) = outcome.or(before) {
            self.write_llm_status(status);
        }
        true
    }

    fn write_llm_status(&mut self, status: LlmStatus) {
        if self.llm_status != status {
            tracing::debug!(from = ?self.llm_status, to = ?status, "llm status");
        }
        self.llm_status = status;
    }

    pub fn set_llm_model(&mut self, model: impl Into<String>) {
        self.llm_model = model.into();
    }

    // --- persistence helpers ---

    fn persist<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let json = serde_json::to_string(value)?;
        self.storage.set(key, &json).map_err(|e| {
            tracing::error!(key, error = %e, "failed to persist collection");
            StoreError::from(e)
        })
    }

    /// Read and decode a blob. Missing keys are `None`; read or decode
    /// failures are logged and also come back as `None`.
    fn load_blob<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.storage.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::error!(key, error = %e, "failed to read persisted state");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!(key, error = %e, "failed to parse persisted state");
                None
            }
        }
    }
}
