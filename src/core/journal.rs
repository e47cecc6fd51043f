//! Undo log.
//!
//! Append-only record of every successful move. `undo(n)` reverses the most
//! recent `n` entries, newest first, and rewrites the log without them.

use crate::models::undo::{UndoLogEntry, UndoReport};
use crate::utils::fs::{ensure_parent, move_file, write_json_atomic};
use crate::Result;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};

/// Persisted undo log.
#[derive(Debug, Clone, Default)]
pub struct UndoJournal {
    path: PathBuf,
    entries: Vec<UndoLogEntry>,
}

impl UndoJournal {
    /// Load the log at `path`. A missing file is an empty log.
    pub fn load(path: &Path) -> Result<Self> {
        let entries = if path.exists() {
            let content = fs::read_to_string(path)?;
            if content.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&content).map_err(|e| {
                    crate::Error::InvalidUndoLog(format!("{}: {}", path.display(), e))
                })?
            }
        } else {
            Vec::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    /// Entries in chronological order.
    pub fn entries(&self) -> &[UndoLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append an entry and persist.
    ///
    /// The entry is kept in memory even if the write fails, so a later
    /// successful write still records it.
    pub fn append(&mut self, entry: UndoLogEntry) -> Result<()> {
        self.entries.push(entry);
        self.save()
    }

    /// Write the log to disk.
    pub fn save(&self) -> Result<()> {
        write_json_atomic(&self.entries, &self.path)
    }

    /// Reverse the most recent `n` entries.
    ///
    /// Each file is moved from `new_path` back to `original_path`, newest
    /// first. Entries whose `new_path` is gone are reported as missing, and
    /// an occupied original location is reported as a conflict and left
    /// alone. All `n` entries are removed from the log afterwards.
    pub fn undo(&mut self, n: usize, verify_checksum: bool) -> Result<UndoReport> {
        let n = n.min(self.entries.len());
        let split = self.entries.len() - n;
        let popped: Vec<UndoLogEntry> = self.entries.drain(split..).collect();

        let mut report = UndoReport::default();

        let pb = ProgressBar::new(popped.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );

        for entry in popped.iter().rev() {
            pb.set_message(
                entry
                    .new_path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            );
            pb.inc(1);

            if !entry.new_path.exists() {
                tracing::warn!("File not found at {:?}, skipping", entry.new_path);
                report.missing.push(entry.new_path.clone());
                continue;
            }
            if entry.original_path.exists() {
                tracing::warn!("Original location occupied: {:?}", entry.original_path);
                report.conflicts.push(entry.original_path.clone());
                continue;
            }

            let restored = ensure_parent(&entry.original_path)
                .and_then(|_| move_file(&entry.new_path, &entry.original_path, verify_checksum));
            match restored {
                Ok(()) => {
                    tracing::debug!("Moved back: {:?} -> {:?}", entry.new_path, entry.original_path);
                    report.restored.push(entry.original_path.clone());
                }
                Err(e) => {
                    let msg = format!("{}: {}", entry.new_path.display(), e);
                    tracing::error!("Undo failed: {}", msg);
                    report.errors.push(msg);
                }
            }
        }

        pb.finish_and_clear();

        self.save()?;
        report.remaining = self.entries.len();
        Ok(report)
    }
}

impl UndoReport {
    /// Print summary.
    pub fn print_summary(&self) {
        println!("{}", "[Undo Summary]".bold().green());
        println!("  {} {}", "Restored:".bold(), self.restored.len());
        println!("  {} {}", "Missing:".bold(), self.missing.len());
        println!("  {} {}", "Conflicts:".bold(), self.conflicts.len());
        println!("  {} {}", "Failed:".bold(), self.errors.len());
        println!("  {} {}", "Entries left in log:".bold(), self.remaining);

        if !self.missing.is_empty() {
            println!();
            println!("{}", "[Missing]".bold().yellow());
            for path in &self.missing {
                println!("  - {}", path.display());
            }
        }
        if !self.conflicts.is_empty() {
            println!();
            println!("{}", "[Original location occupied]".bold().yellow());
            for path in &self.conflicts {
                println!("  - {}", path.display());
            }
        }
        if !self.errors.is_empty() {
            println!();
            println!("{}", "[Errors]".bold().red());
            for error in &self.errors {
                println!("  - {}", error);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::media::MoveKind;
    use tempfile::TempDir;

    fn moved(dir: &Path, name: &str) -> UndoLogEntry {
        let original = dir.join("src").join(name);
        let new_path = dir.join("out").join(name);
        fs::create_dir_all(new_path.parent().unwrap()).unwrap();
        fs::write(&new_path, name.as_bytes()).unwrap();
        UndoLogEntry::moved(original, new_path, MoveKind::PrimaryFile)
    }

    #[test]
    fn test_append_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("undo.json");

        let mut journal = UndoJournal::load(&path).unwrap();
        journal.append(moved(dir.path(), "a.mkv")).unwrap();
        journal.append(moved(dir.path(), "b.mkv")).unwrap();

        let reloaded = UndoJournal::load(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert!(reloaded.entries()[1].new_path.ends_with("b.mkv"));
    }

    #[test]
    fn test_undo_last_entry_only() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("undo.json");
        let mut journal = UndoJournal::load(&path).unwrap();
        journal.append(moved(dir.path(), "a.mkv")).unwrap();
        journal.append(moved(dir.path(), "b.mkv")).unwrap();

        let report = journal.undo(1, true).unwrap();
        assert_eq!(report.restored, vec![dir.path().join("src/b.mkv")]);
        assert!(dir.path().join("src/b.mkv").exists());
        assert!(dir.path().join("out/a.mkv").exists());
        assert_eq!(report.remaining, 1);
        assert_eq!(UndoJournal::load(&path).unwrap().len(), 1);
    }

    #[test]
    fn test_undo_missing_and_conflict() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("undo.json");
        let mut journal = UndoJournal::load(&path).unwrap();

        let gone = moved(dir.path(), "gone.mkv");
        fs::remove_file(&gone.new_path).unwrap();
        journal.append(gone).unwrap();

        let blocked = moved(dir.path(), "blocked.mkv");
        fs::create_dir_all(blocked.original_path.parent().unwrap()).unwrap();
        fs::write(&blocked.original_path, b"someone else").unwrap();
        journal.append(blocked).unwrap();

        let report = journal.undo(5, true).unwrap();
        assert_eq!(report.missing.len(), 1);
        assert_eq!(report.conflicts.len(), 1);
        assert!(report.restored.is_empty());
        assert!(!report.is_success());
        assert_eq!(fs::read(dir.path().join("src/blocked.mkv")).unwrap(), b"someone else");
        assert!(journal.is_empty());
    }

    #[test]
    fn test_malformed_log() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("undo.json");
        fs::write(&path, "[{\"broken\": ").unwrap();
        assert!(matches!(
            UndoJournal::load(&path),
            Err(crate::Error::InvalidUndoLog(_))
        ));
    }
}
