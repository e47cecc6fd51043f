//! Run report data model.

use chrono::{DateTime, Local};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Per-run counters, reset at the start of every run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    /// Files dispatched for processing.
    pub processed: usize,
    /// Primary files moved.
    pub moved: usize,
    /// Files left untouched (unresolved or conflicting).
    pub skipped: usize,
    /// Files whose move failed.
    pub errors: usize,
    /// Backup copies written.
    pub backups_created: usize,
    /// Files skipped because their destination was taken.
    pub conflicts: usize,
    /// Sidecar files moved alongside their episode.
    pub sidecars_moved: usize,
}

/// Final state of one collected file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    /// Preview only: would be moved.
    Planned,
    /// Moved to its destination.
    Moved,
    /// Parser could not resolve title and episode.
    Unresolved,
    /// Destination already taken.
    Conflict,
    /// Move failed after retries and fallback.
    Failed,
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FileStatus::Planned => "planned",
            FileStatus::Moved => "moved",
            FileStatus::Unresolved => "unresolved",
            FileStatus::Conflict => "conflict",
            FileStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Outcome record for one collected file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    /// Source path.
    pub source: PathBuf,
    /// Planned destination, if the file was resolved.
    pub destination: Option<PathBuf>,
    /// Final status.
    pub status: FileStatus,
    /// Error or conflict detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Sidecars moved (or planned, in preview) with this file.
    #[serde(default)]
    pub sidecars: Vec<PathBuf>,
    /// Backup copies written for this file and its sidecars.
    #[serde(default)]
    pub backups: usize,
    /// Non-fatal problems (backup, sidecar).
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Destination collision found before any file was touched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictRecord {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub reason: String,
}

/// Summary of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Run identifier, also stamped on undo log entries.
    pub run_id: uuid::Uuid,
    /// Start time.
    pub started_at: DateTime<Local>,
    /// End time.
    pub finished_at: DateTime<Local>,
    /// Whether this was a dry run.
    pub preview: bool,
    /// Source root as scanned.
    pub source_root: PathBuf,
    /// Output root.
    pub output_root: PathBuf,
    /// Aggregated counters.
    pub counters: Counters,
    /// Files skipped during collection because they were checkpointed.
    pub checkpointed: usize,
    /// Pre-scan conflicts.
    pub conflicts: Vec<ConflictRecord>,
    /// One record per processed file.
    pub files: Vec<FileRecord>,
    /// Set when an interrupt stopped dispatching.
    pub cancelled: bool,
    /// Checkpoint/undo log write failures.
    pub persistence_warnings: Vec<String>,
}

impl RunReport {
    /// Create an empty report for a run starting now.
    pub fn new(preview: bool, source_root: PathBuf, output_root: PathBuf) -> Self {
        let now = Local::now();
        Self {
            run_id: uuid::Uuid::new_v4(),
            started_at: now,
            finished_at: now,
            preview,
            source_root,
            output_root,
            counters: Counters::default(),
            checkpointed: 0,
            conflicts: Vec::new(),
            files: Vec::new(),
            cancelled: false,
            persistence_warnings: Vec::new(),
        }
    }

    /// Fold one file record into the counters and the file list.
    pub fn record(&mut self, record: FileRecord) {
        let c = &mut self.counters;
        c.processed += 1;
        c.backups_created += record.backups;
        match record.status {
            FileStatus::Planned => {}
            FileStatus::Moved => {
                c.moved += 1;
                c.sidecars_moved += record.sidecars.len();
            }
            FileStatus::Unresolved => c.skipped += 1,
            FileStatus::Conflict => {
                c.skipped += 1;
                c.conflicts += 1;
            }
            FileStatus::Failed => c.errors += 1,
        }
        self.files.push(record);
    }

    /// Files with the given status.
    pub fn files_with(&self, status: FileStatus) -> impl Iterator<Item = &FileRecord> {
        self.files.iter().filter(move |f| f.status == status)
    }

    /// Whether checkpoint and undo log were written reliably.
    pub fn is_resumable(&self) -> bool {
        self.persistence_warnings.is_empty()
    }

    /// Print summary.
    pub fn print_summary(&self) {
        let c = &self.counters;
        let title = if self.preview {
            "[Preview Summary]"
        } else {
            "[Run Summary]"
        };
        println!("{}", title.bold().green());
        println!("  {} {}", "Run ID:".bold(), self.run_id);
        println!("  {} {}", "Processed:".bold(), c.processed);
        if self.preview {
            println!(
                "  {} {}",
                "Would move:".bold(),
                self.files_with(FileStatus::Planned).count()
            );
        }
        println!("  {} {}", "Moved:".bold(), c.moved);
        println!("  {} {}", "Sidecars moved:".bold(), c.sidecars_moved);
        println!("  {} {}", "Skipped:".bold(), c.skipped);
        println!("  {} {}", "Conflicts:".bold(), c.conflicts);
        println!("  {} {}", "Errors:".bold(), c.errors);
        println!("  {} {}", "Backups created:".bold(), c.backups_created);
        if self.checkpointed > 0 {
            println!(
                "  {} {}",
                "Already processed (checkpoint):".bold(),
                self.checkpointed
            );
        }

        if self.cancelled {
            println!();
            println!(
                "{}",
                "[CANCELLED] Run interrupted; re-run to resume from the checkpoint"
                    .bold()
                    .yellow()
            );
        }

        let failed: Vec<_> = self.files_with(FileStatus::Failed).collect();
        if !failed.is_empty() {
            println!();
            println!("{}", "[Errors]".bold().red());
            for f in failed {
                println!(
                    "  - {}: {}",
                    f.source.display(),
                    f.detail.as_deref().unwrap_or("unknown error")
                );
            }
        }

        let conflicts: Vec<_> = self.files_with(FileStatus::Conflict).collect();
        if !conflicts.is_empty() {
            println!();
            println!("{}", "[Conflicts]".bold().yellow());
            for f in conflicts {
                println!(
                    "  - {} -> {}",
                    f.source.display(),
                    f.destination
                        .as_ref()
                        .map(|d| d.display().to_string())
                        .unwrap_or_default()
                );
            }
        }

        if !self.persistence_warnings.is_empty() {
            println!();
            println!(
                "{}",
                "[WARNING] State files could not be written; this run cannot be resumed or fully undone"
                    .bold()
                    .red()
            );
            for w in &self.persistence_warnings {
                println!("  - {}", w);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(status: FileStatus, sidecars: usize) -> FileRecord {
        FileRecord {
            source: PathBuf::from("/src/a.mkv"),
            destination: None,
            status,
            detail: None,
            sidecars: (0..sidecars).map(|i| PathBuf::from(format!("/s{}", i))).collect(),
            backups: 0,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_record_updates_counters() {
        let mut report = RunReport::new(false, "/src".into(), "/out".into());
        report.record(record(FileStatus::Moved, 2));
        report.record(record(FileStatus::Unresolved, 0));
        report.record(record(FileStatus::Conflict, 0));
        report.record(record(FileStatus::Failed, 0));

        let c = report.counters;
        assert_eq!(c.processed, 4);
        assert_eq!(c.moved, 1);
        assert_eq!(c.sidecars_moved, 2);
        assert_eq!(c.skipped, 2);
        assert_eq!(c.conflicts, 1);
        assert_eq!(c.errors, 1);
        assert!(report.is_resumable());
    }

    #[test]
    fn test_planned_does_not_count_as_moved() {
        let mut report = RunReport::new(true, "/src".into(), "/out".into());
        report.record(record(FileStatus::Planned, 1));
        assert_eq!(report.counters.moved, 0);
        assert_eq!(report.counters.sidecars_moved, 0);
        assert_eq!(report.files_with(FileStatus::Planned).count(), 1);
    }
}
