//! Shell host - native window, tray and control requests.
//!
//! The decisions the shell makes (close-to-hide, named path lookup) live here
//! so they can be tested without a webview; the Tauri wiring is in
//! `desktop`, compiled only with the `desktop` feature.

#[cfg(feature = "desktop")]
mod commands;
#[cfg(feature = "desktop")]
mod desktop;

#[cfg(feature = "desktop")]
pub use desktop::run;

use crate::config::AppConfig;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShellError {
    #[error("Unknown path name: {0}")]
    UnknownPath(String),
    #[error("Path '{0}' is not available on this system")]
    Unresolved(String),
}

/// Set once a real shutdown starts; until then closing the window only hides it.
#[derive(Debug, Default)]
pub struct QuitFlag(AtomicBool);

impl QuitFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseAction {
    /// Keep the process alive in the tray.
    Hide,
    Close,
}

pub fn close_action(quit: &QuitFlag) -> CloseAction {
    if quit.is_set() {
        CloseAction::Close
    } else {
        CloseAction::Hide
    }
}

/// Resolve the well-known directory names the UI asks for.
pub fn named_path(name: &str, config: &AppConfig) -> Result<PathBuf, ShellError> {
    let resolved = match name {
        "home" => dirs::home_dir(),
        "appData" => dirs::config_dir(),
        "userData" => Some(config.data_dir.clone()),
        "logs" => Some(config.log_dir()),
        "temp" => Some(std::env::temp_dir()),
        "exe" => std::env::current_exe().ok(),
        "desktop" => dirs::desktop_dir(),
        "documents" => dirs::document_dir(),
        "downloads" => dirs::download_dir(),
        "music" => dirs::audio_dir(),
        "pictures" => dirs::picture_dir(),
        "videos" => dirs::video_dir(),
        other => return Err(ShellError::UnknownPath(other.to_string())),
    };
    resolved.ok_or_else(|| ShellError::Unresolved(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_hides_until_quitting() {
        let quit = QuitFlag::new();
        assert_eq!(close_action(&quit), CloseAction::Hide);
        quit.set();
        assert_eq!(close_action(&quit), CloseAction::Close);
        quit.set();
        assert_eq!(close_action(&quit), CloseAction::Close);
    }

    #[test]
    fn test_named_paths() {
        let config = AppConfig {
            data_dir: PathBuf::from("/tmp/jarvis-test"),
            ..AppConfig::default()
        };
        assert_eq!(named_path("userData", &config).unwrap(), PathBuf::from("/tmp/jarvis-test"));
        assert_eq!(named_path("logs", &config).unwrap(), PathBuf::from("/tmp/jarvis-test/logs"));
        assert_eq!(named_path("temp", &config).unwrap(), std::env::temp_dir());
        assert!(matches!(
            named_path("cookies", &config),
            Err(ShellError::UnknownPath(name)) if name == "cookies"
        ));
    }
}
