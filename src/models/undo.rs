//! Undo log data model.

use crate::models::media::MoveKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Action recorded in the undo log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UndoAction {
    /// File moved from `original_path` to `new_path`.
    Move,
}

/// A single undo log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UndoLogEntry {
    /// When the move happened.
    pub timestamp: DateTime<Utc>,
    /// Path before the move.
    pub original_path: PathBuf,
    /// Path after the move.
    pub new_path: PathBuf,
    /// Recorded action.
    pub action_type: UndoAction,
    /// Primary file or sidecar.
    #[serde(default)]
    pub kind: MoveKind,
    /// Run that produced this entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<uuid::Uuid>,
}

impl UndoLogEntry {
    /// Create a move entry stamped with the current time.
    pub fn moved(original_path: PathBuf, new_path: PathBuf, kind: MoveKind) -> Self {
        Self {
            timestamp: Utc::now(),
            original_path,
            new_path,
            action_type: UndoAction::Move,
            kind,
            run_id: None,
        }
    }
}

/// Result of reversing undo log entries.
#[derive(Debug, Default)]
pub struct UndoReport {
    /// Entries whose file was moved back.
    pub restored: Vec<PathBuf>,
    /// Entries whose `new_path` no longer exists.
    pub missing: Vec<PathBuf>,
    /// Entries whose original location is occupied.
    pub conflicts: Vec<PathBuf>,
    /// Error messages for entries that failed to move back.
    pub errors: Vec<String>,
    /// Entries left in the log afterwards.
    pub remaining: usize,
}

impl UndoReport {
    /// Check if every entry was either restored or already gone.
    pub fn is_success(&self) -> bool {
        self.conflicts.is_empty() && self.errors.is_empty()
    }
}
