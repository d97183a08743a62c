//! Boundary channels the UI declares but the host does not back yet.
//!
//! Every method returns [`CapabilityError::Unavailable`] until a real
//! implementation is registered, so the UI can tell a missing feature apart
//! from a failed operation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Capability {
    Database,
    FileDialog,
    FileAccess,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Database => "database",
            Self::FileDialog => "file dialog",
            Self::FileAccess => "file access",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CapabilityError {
    #[error("{capability} is not available yet")]
    Unavailable { capability: Capability },
}

impl CapabilityError {
    pub fn unavailable(capability: Capability) -> Self {
        Self::Unavailable { capability }
    }
}

/// File-type filter for the open dialog, e.g. `{ name: "Text", extensions: ["txt"] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFilter {
    pub name: String,
    pub extensions: Vec<String>,
}

pub trait DataChannel: Send + Sync {
    fn query(&self, sql: &str, params: &[Value]) -> Result<Value, CapabilityError>;
    fn run(&self, sql: &str, params: &[Value]) -> Result<Value, CapabilityError>;
    fn get_all(&self, sql: &str, params: &[Value]) -> Result<Vec<Value>, CapabilityError>;
    fn get(&self, sql: &str, params: &[Value]) -> Result<Option<Value>, CapabilityError>;
}

pub trait FileChannel: Send + Sync {
    fn select_directory(&self) -> Result<Option<String>, CapabilityError>;
    fn select_file(&self, filters: &[FileFilter]) -> Result<Option<String>, CapabilityError>;
    fn read_file(&self, path: &str) -> Result<String, CapabilityError>;
    fn write_file(&self, path: &str, content: &str) -> Result<(), CapabilityError>;
}

/// Placeholder for both channels.
#[derive(Debug, Default, Clone, Copy)]
pub struct NotAvailable;

impl DataChannel for NotAvailable {
    fn query(&self, _sql: &str, _params: &[Value]) -> Result<Value, CapabilityError> {
        Err(CapabilityError::unavailable(Capability::Database))
    }

    fn run(&self, _sql: &str, _params: &[Value]) -> Result<Value, CapabilityError> {
        Err(CapabilityError::unavailable(Capability::Database))
    }

    fn get_all(&self, _sql: &str, _params: &[Value]) -> Result<Vec<Value>, CapabilityError> {
        Err(CapabilityError::unavailable(Capability::Database))
    }

    fn get(&self, _sql: &str, _params: &[Value]) -> Result<Option<Value>, CapabilityError> {
        Err(CapabilityError::unavailable(Capability::Database))
    }
}

impl FileChannel for NotAvailable {
    fn select_directory(&self) -> Result<Option<String>, CapabilityError> {
        Err(CapabilityError::unavailable(Capability::FileDialog))
    }

    fn select_file(&self, _filters: &[FileFilter]) -> Result<Option<String>, CapabilityError> {
        Err(CapabilityError::unavailable(Capability::FileDialog))
    }

    fn read_file(&self, _path: &str) -> Result<String, CapabilityError> {
        Err(CapabilityError::unavailable(Capability::FileAccess))
    }

    fn write_file(&self, _path: &str, _content: &str) -> Result<(), CapabilityError> {
        Err(CapabilityError::unavailable(Capability::FileAccess))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_placeholder_channels_are_unavailable() {
        let data: &dyn DataChannel = &NotAvailable;
        let database = CapabilityError::unavailable(Capability::Database);
        assert_eq!(data.query("SELECT 1", &[]).unwrap_err(), database);
        assert_eq!(data.get_all("SELECT 1", &[json!(1)]).unwrap_err(), database);

        let files: &dyn FileChannel = &NotAvailable;
        assert_eq!(
            files.read_file("/etc/hosts").unwrap_err(),
            CapabilityError::unavailable(Capability::FileAccess)
        );
        assert_eq!(
            files.select_directory().unwrap_err(),
            CapabilityError::unavailable(Capability::FileDialog)
        );
    }

    #[test]
    fn test_error_wire_shape() {
        let err = CapabilityError::unavailable(Capability::FileDialog);
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"kind": "unavailable", "capability": "fileDialog"})
        );
        assert_eq!(err.to_string(), "file dialog is not available yet");
    }
}
