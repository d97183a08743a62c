//! Jarvis Local - a privacy-focused personal assistant shell.
//!
//! The library holds everything that does not need a webview: the persisted
//! app store, the placeholder assistant and voice flows, configuration and
//! logging. The native window and tray live in [`shell`] behind the
//! `desktop` feature.

pub mod assistant;
pub mod capability;
pub mod config;
pub mod logging;
pub mod model;
pub mod shell;
pub mod storage;
pub mod store;
pub mod voice;

use std::sync::Arc;
use tokio::sync::Mutex;

/// The single store shared by every command and background flow.
pub type SharedStore = Arc<Mutex<store::AppStore>>;
