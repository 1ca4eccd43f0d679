//! Error taxonomy shared by the scan and clean engines.
//!
//! Per-item filesystem failures never escape an operation. They are recorded
//! as [`ToleratedFailure`] values and surfaced in aggregate. Only the
//! conditions in [`CleanError`] and [`RegistryError`] abort a call.

use serde::Serialize;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Kind of a per-item failure that was caught and skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// A file or directory could not be statted or enumerated during a scan.
    PathUnreadable,
    /// Removal was refused for lack of permission.
    DeleteDenied,
    /// Removal failed because the entry is busy or otherwise in use.
    DeleteInUse,
    /// The platform empty-trash command failed.
    TrashPurgeFailed,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::PathUnreadable => "unreadable",
            FailureKind::DeleteDenied => "permission denied",
            FailureKind::DeleteInUse => "in use",
            FailureKind::TrashPurgeFailed => "trash purge failed",
        }
    }

    /// Classify an I/O error raised while removing an entry.
    pub fn from_delete_error(err: &io::Error) -> Self {
        if err.kind() == io::ErrorKind::PermissionDenied {
            return FailureKind::DeleteDenied;
        }
        // ERROR_ACCESS_DENIED is reported as PermissionDenied above;
        // sharing and lock violations land here as in-use.
        FailureKind::DeleteInUse
    }
}

/// A failure that was absorbed at the item level.
#[derive(Debug, Clone, Serialize)]
pub struct ToleratedFailure {
    pub path: PathBuf,
    pub kind: FailureKind,
    pub message: String,
}

impl ToleratedFailure {
    pub fn new(path: impl Into<PathBuf>, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            message: message.into(),
        }
    }

    pub fn from_io(path: impl Into<PathBuf>, kind: FailureKind, err: &io::Error) -> Self {
        Self::new(path, kind, err.to_string())
    }
}

/// Errors that abort a clean invocation before anything is touched.
#[derive(Debug, Error)]
pub enum CleanError {
    #[error("elevated privileges are required to clean: {}", labels.join(", "))]
    NotAuthorized { labels: Vec<String> },

    #[error("no location named '{0}'")]
    UnknownLabel(String),
}

/// Errors raised while building the location registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("could not resolve the current user's home directory")]
    NoHomeDirectory,

    #[error("location label must not be empty")]
    EmptyLabel,

    #[error("duplicate location label '{0}'")]
    DuplicateLabel(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_permission_denied() {
        let err = io::Error::from(io::ErrorKind::PermissionDenied);
        assert_eq!(FailureKind::from_delete_error(&err), FailureKind::DeleteDenied);
    }

    #[test]
    fn test_classify_other_errors_as_in_use() {
        let err = io::Error::new(io::ErrorKind::Other, "sharing violation");
        assert_eq!(FailureKind::from_delete_error(&err), FailureKind::DeleteInUse);
    }

    #[test]
    fn test_not_authorized_message_lists_labels() {
        let err = CleanError::NotAuthorized {
            labels: vec!["Prefetch".to_string(), "System logs".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "elevated privileges are required to clean: Prefetch, System logs"
        );
    }
}
