//! Runtime configuration: `.env` file first, then process environment.

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackendKind {
    Demo,
    Ollama,
}

impl LlmBackendKind {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "demo" => Some(Self::Demo),
            "ollama" => Some(Self::Ollama),
            _ => None,
        }
    }
}

/// Fixed delays used by the placeholder chat and voice flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceholderTimings {
    pub reply: Duration,
    pub status_check: Duration,
    pub listen: Duration,
    pub process: Duration,
}

impl Default for PlaceholderTimings {
    fn default() -> Self {
        Self {
            reply: Duration::from_millis(1000),
            status_check: Duration::from_millis(500),
            listen: Duration::from_millis(2000),
            process: Duration::from_millis(1000),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub llm_backend: LlmBackendKind,
    pub ollama_url: String,
    pub log_filter: String,
    pub timings: PlaceholderTimings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            llm_backend: LlmBackendKind::Demo,
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            log_filter: "info".to_string(),
            timings: PlaceholderTimings::default(),
        }
    }
}

impl AppConfig {
    /// Load `.env` (current dir, then parent) and read `JARVIS_*` overrides.
    pub fn load() -> Self {
        if dotenvy::dotenv().is_err() {
            let _ = dotenvy::from_filename("../.env");
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(dir) = non_empty("JARVIS_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(kind) = non_empty("JARVIS_LLM_BACKEND") {
            match LlmBackendKind::parse(&kind) {
                Some(kind) => config.llm_backend = kind,
                None => eprintln!("[jarvis] unknown JARVIS_LLM_BACKEND '{kind}', using demo"),
            }
        }
        if let Some(url) = non_empty("OLLAMA_URL") {
            config.ollama_url = url.trim_end_matches('/').to_string();
        }
        if let Some(filter) = non_empty("JARVIS_LOG") {
            config.log_filter = filter;
        }
        config
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("jarvis.db")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

pub fn default_data_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    let base = dirs::data_dir();
    #[cfg(not(target_os = "macos"))]
    let base = dirs::data_local_dir();

    base.unwrap_or_else(|| PathBuf::from(".")).join("jarvis-local")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[]));
        assert_eq!(config.llm_backend, LlmBackendKind::Demo);
        assert_eq!(config.ollama_url, "http://localhost:11434");
        assert!(config.data_dir.ends_with("jarvis-local"));
        assert_eq!(config.timings.reply, Duration::from_millis(1000));
    }

    #[test]
    fn test_env_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("JARVIS_DATA_DIR", "/tmp/jarvis"),
            ("JARVIS_LLM_BACKEND", "Ollama"),
            ("OLLAMA_URL", "http://gpu-box:11434/"),
            ("JARVIS_LOG", "debug"),
        ]));
        assert_eq!(config.database_path(), PathBuf::from("/tmp/jarvis/jarvis.db"));
        assert_eq!(config.llm_backend, LlmBackendKind::Ollama);
        assert_eq!(config.ollama_url, "http://gpu-box:11434");
        assert_eq!(config.log_filter, "debug");
    }

    #[test]
    fn test_unknown_backend_falls_back() {
        let config = AppConfig::from_lookup(lookup(&[
            ("JARVIS_LLM_BACKEND", "gpt"),
            ("JARVIS_DATA_DIR", " "),
        ]));
        assert_eq!(config.llm_backend, LlmBackendKind::Demo);
        assert!(config.data_dir.ends_with("jarvis-local"));
    }
}
