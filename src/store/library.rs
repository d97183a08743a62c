//! Files and skills. Neither is persisted: folder indexing only records the
//! folder path, and skill toggles reset to the built-in list on restart.

use super::AppStore;
use crate::model::{EntityId, FileItem, Skill};
use serde_json::{json, Map, Value};

/// The built-in skill list.
pub fn default_skills() -> Vec<Skill> {
    let skill = |id, name: &str, description: &str, enabled, config: Map<String, Value>| Skill {
        id,
        name: name.to_string(),
        description: description.to_string(),
        enabled,
        config,
    };
    let mut weather_config = Map::new();
    weather_config.insert("location".to_string(), json!(""));

    vec![
        skill(1, "Calculator", "Perform mathematical calculations", true, Map::new()),
        skill(2, "Timer", "Set timers and alarms", true, Map::new()),
        skill(3, "Notes", "Take and manage notes", true, Map::new()),
        skill(4, "Weather", "Get weather information (cached)", false, weather_config),
    ]
}

impl AppStore {
    pub fn files(&self) -> Vec<FileItem> {
        self.files.clone()
    }

    pub fn indexed_folders(&self) -> Vec<String> {
        self.indexed_folders.clone()
    }

    /// Remember a folder for indexing. No scan happens, so `files` stays empty.
    pub fn index_folder(&mut self, path: impl Into<String>) {
        let path = path.into();
        tracing::info!(path = %path, "folder queued for indexing");
        self.indexed_folders.push(path);
    }

    /// Case-insensitive substring match on file names.
    pub fn search_files(&self, query: &str) -> Vec<FileItem> {
        let query = query.to_lowercase();
        self.files
            .iter()
            .filter(|f| f.name.to_lowercase().contains(&query))
            .cloned()
            .collect()
    }

    pub fn load_skills(&mut self) {
        self.skills = default_skills();
    }

    pub fn skills(&self) -> Vec<Skill> {
        self.skills.clone()
    }

    /// Flip a skill's `enabled` flag; returns the new state, `None` for
    /// unknown ids.
    pub fn toggle_skill(&mut self, id: EntityId) -> Option<bool> {
        let skill = self.skills.iter_mut().find(|s| s.id == id)?;
        skill.enabled = !skill.enabled;
        Some(skill.enabled)
    }
}
