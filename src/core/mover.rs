//! File mover and backup engine.
//!
//! Performs the filesystem side of a run:
//! - best-effort backup copy before a move
//! - rename (or verified copy + delete across filesystems) with bounded retry
//! - a staging-directory fallback when retries are exhausted
//! - discovery and destination naming of metadata sidecars

use crate::models::config::Config;
use crate::models::media::{MoveKind, MoveOperation};
use crate::utils::fs::{dotted_extension, ensure_parent, move_file};
use crate::Result;
use chrono::Local;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Name of the staging directory created next to a destination.
pub const STAGING_DIR: &str = ".tvshow-staging";

/// Mover configuration.
#[derive(Debug, Clone)]
pub struct MoverConfig {
    /// Report only, never touch the filesystem.
    pub preview: bool,
    /// Backup directory, if backups are enabled.
    pub backup_dir: Option<PathBuf>,
    /// Append a timestamp to backup names.
    pub backup_timestamp: bool,
    /// Attempts before the staging fallback.
    pub max_retry: u32,
    /// Delay between attempts.
    pub retry_delay: Duration,
    /// Verify cross-filesystem copies.
    pub verify_checksum: bool,
}

impl Default for MoverConfig {
    fn default() -> Self {
        Self {
            preview: true,
            backup_dir: None,
            backup_timestamp: false,
            max_retry: 3,
            retry_delay: Duration::from_millis(500),
            verify_checksum: true,
        }
    }
}

impl MoverConfig {
    /// Build from the application config.
    pub fn from_config(config: &Config, preview: bool) -> Self {
        Self {
            preview,
            backup_dir: config.paths.backup_dir.clone(),
            backup_timestamp: config.rules.backup_timestamp,
            max_retry: config.rules.max_retry.max(1),
            retry_delay: Duration::from_millis(config.rules.retry_delay_ms),
            verify_checksum: config.rules.verify_checksum,
        }
    }
}

/// What happened during a successful move.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    /// Backup copy, if one was written.
    pub backup: Option<PathBuf>,
    /// Backup failure message (the move still went ahead).
    pub backup_error: Option<String>,
    /// Attempts used by the direct move.
    pub attempts: u32,
    /// Whether the staging fallback was needed.
    pub via_staging: bool,
}

/// Single-hop move primitive: `(from, to, verify_checksum)`.
pub type MoveFn = Arc<dyn Fn(&Path, &Path, bool) -> Result<()> + Send + Sync>;

/// File mover.
#[derive(Clone)]
pub struct FileMover {
    config: MoverConfig,
    move_fn: MoveFn,
}

impl fmt::Debug for FileMover {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileMover")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl FileMover {
    /// Create a new mover backed by [`move_file`].
    pub fn new(config: MoverConfig) -> Self {
        Self {
            config,
            move_fn: Arc::new(move_file),
        }
    }

    /// Replace the primitive used for every hop (direct, staging, restore).
    pub fn with_move_fn(mut self, move_fn: MoveFn) -> Self {
        self.move_fn = move_fn;
        self
    }

    /// Whether this mover only previews.
    pub fn is_preview(&self) -> bool {
        self.config.preview
    }

    /// Execute a move operation.
    ///
    /// In preview mode nothing is touched. An existing destination is never
    /// overwritten.
    pub fn execute(&self, op: &MoveOperation) -> Result<MoveOutcome> {
        if self.config.preview {
            tracing::debug!("[PREVIEW] {:?} -> {:?}", op.source, op.destination);
            return Ok(MoveOutcome::default());
        }

        if op.destination.exists() {
            return Err(crate::Error::DestinationExists(
                op.destination.display().to_string(),
            ));
        }

        ensure_parent(&op.destination)?;

        let mut outcome = MoveOutcome::default();
        if self.config.backup_dir.is_some() {
            match self.backup(&op.source) {
                Ok(path) => outcome.backup = path,
                Err(e) => {
                    // backups are best-effort
                    tracing::warn!("Backup failed for {:?}: {}", op.source, e);
                    outcome.backup_error = Some(e.to_string());
                }
            }
        }

        let (attempts, direct) = self.move_with_retry(&op.source, &op.destination);
        outcome.attempts = attempts;
        if let Err(e) = direct {
            tracing::warn!(
                "Direct move failed after {} attempt(s), trying staging: {:?}: {}",
                attempts,
                op.source,
                e
            );
            if let Err(fallback) = self.move_via_staging(&op.source, &op.destination) {
                if let Some(backup) = outcome.backup.take() {
                    self.discard_backup(&backup);
                }
                return Err(crate::Error::MoveFailed {
                    from: op.source.display().to_string(),
                    to: op.destination.display().to_string(),
                    reason: format!("{}; staging fallback: {}", e, fallback),
                });
            }
            outcome.via_staging = true;
        }

        let kind = match op.kind {
            MoveKind::PrimaryFile => "file",
            MoveKind::MetadataSidecar => "sidecar",
        };
        tracing::debug!("Moved {}: {:?} -> {:?}", kind, op.source, op.destination);
        Ok(outcome)
    }

    /// Copy `source` into the backup directory.
    ///
    /// Returns `None` when backups are disabled.
    pub fn backup(&self, source: &Path) -> Result<Option<PathBuf>> {
        let Some(backup_dir) = &self.config.backup_dir else {
            return Ok(None);
        };
        fs::create_dir_all(backup_dir)?;

        let file_name = source
            .file_name()
            .ok_or_else(|| crate::Error::other(format!("No file name: {}", source.display())))?
            .to_string_lossy()
            .into_owned();

        let mut target = if self.config.backup_timestamp {
            backup_dir.join(timestamped(&file_name))
        } else {
            backup_dir.join(&file_name)
        };
        if target.exists() {
            target = backup_dir.join(timestamped(&file_name));
        }
        if target.exists() {
            return Err(crate::Error::DestinationExists(target.display().to_string()));
        }

        fs::copy(source, &target)?;
        tracing::debug!("Backup: {:?} -> {:?}", source, target);
        Ok(Some(target))
    }

    /// Try the move up to `max_retry` times. Only transient errors are retried.
    ///
    /// Returns the number of attempts made alongside the final result.
    fn move_with_retry(&self, from: &Path, to: &Path) -> (u32, Result<()>) {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match (self.move_fn)(from, to, self.config.verify_checksum) {
                Ok(()) => return (attempt, Ok(())),
                Err(e) if e.is_transient() && attempt < self.config.max_retry => {
                    tracing::debug!(
                        "Move attempt {}/{} failed for {:?}: {}",
                        attempt,
                        self.config.max_retry,
                        from,
                        e
                    );
                    std::thread::sleep(self.config.retry_delay);
                }
                Err(e) => return (attempt, Err(e)),
            }
        }
    }

    /// Remove a backup whose source never left its place.
    fn discard_backup(&self, backup: &Path) {
        match fs::remove_file(backup) {
            Ok(()) => tracing::debug!("Removed backup of failed move: {:?}", backup),
            Err(e) => tracing::warn!("Could not remove backup {:?}: {}", backup, e),
        }
    }

    /// Move through a staging directory next to the destination.
    ///
    /// If the second hop fails the file is put back where it came from.
    fn move_via_staging(&self, from: &Path, to: &Path) -> Result<()> {
        let parent = to
            .parent()
            .ok_or_else(|| crate::Error::other(format!("No parent: {}", to.display())))?;
        let staging_dir = parent.join(STAGING_DIR);
        fs::create_dir_all(&staging_dir)?;

        let file_name = from
            .file_name()
            .ok_or_else(|| crate::Error::other(format!("No file name: {}", from.display())))?;
        let staged = staging_dir.join(file_name);

        let result = self.hop_through(from, &staged, to);

        // only removed when empty
        let _ = fs::remove_dir(&staging_dir);
        result
    }

    fn hop_through(&self, from: &Path, staged: &Path, to: &Path) -> Result<()> {
        let verify = self.config.verify_checksum;
        (self.move_fn)(from, staged, verify)?;

        if let Err(e) = (self.move_fn)(staged, to, verify) {
            if let Err(restore) = (self.move_fn)(staged, from, verify) {
                tracing::error!(
                    "Could not restore {:?} from staging {:?}: {}",
                    from,
                    staged,
                    restore
                );
            }
            return Err(e);
        }
        Ok(())
    }
}

/// `name.ext` -> `name_YYYYmmdd_HHMMSS.ext`
fn timestamped(file_name: &str) -> String {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => format!("{}_{}{}", &file_name[..idx], stamp, &file_name[idx..]),
        _ => format!("{}_{}", file_name, stamp),
    }
}

/// Find sidecar files belonging to `primary`.
///
/// A sidecar lives in the same directory and is named `<stem><ext>` or
/// `<stem>.<tag><ext>` where `ext` is one of `extensions` (compared
/// case-insensitively). A candidate whose `<stem>.<tag>` is itself the stem of
/// another video (one of `video_extensions`) in the directory belongs to that
/// video instead. Returns each sidecar with the suffix that follows the stem,
/// e.g. `.zh.srt`.
pub fn find_sidecars(
    primary: &Path,
    extensions: &[String],
    video_extensions: &[String],
) -> Vec<(PathBuf, String)> {
    let (Some(dir), Some(stem)) = (primary.parent(), primary.file_stem().and_then(|s| s.to_str()))
    else {
        return Vec::new();
    };
    let extensions: Vec<String> = extensions.iter().map(|e| normalize_extension(e)).collect();
    let video_extensions: Vec<String> =
        video_extensions.iter().map(|e| normalize_extension(e)).collect();

    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|entry| entry.path())
        .collect();

    let video_stems: HashSet<String> = files
        .iter()
        .filter(|path| *path != primary)
        .filter(|path| {
            dotted_extension(path)
                .map(|ext| video_extensions.contains(&ext))
                .unwrap_or(false)
        })
        .filter_map(|path| path.file_stem()?.to_str().map(str::to_lowercase))
        .collect();

    let mut sidecars: Vec<(PathBuf, String)> = files
        .into_iter()
        .filter_map(|path| {
            if path == primary {
                return None;
            }
            let name = path.file_name()?.to_str()?.to_string();
            let suffix = name.strip_prefix(stem)?;
            if !suffix.starts_with('.') {
                return None;
            }
            let lower = suffix.to_lowercase();
            let ext = extensions.iter().find(|ext| lower.ends_with(ext.as_str()))?;
            // `.zh.srt` is fine, `.part2.mkv.srt`-style chains are not
            let tag = &suffix[..suffix.len() - ext.len()];
            if tag.matches('.').count() > 1 {
                return None;
            }
            let owner = format!("{}{}", stem, tag).to_lowercase();
            if !tag.is_empty() && video_stems.contains(&owner) {
                return None;
            }
            Some((path, suffix.to_string()))
        })
        .collect();

    sidecars.sort();
    sidecars
}

/// Destination for a sidecar: the new primary stem plus the original suffix.
pub fn sidecar_destination(primary_destination: &Path, suffix: &str) -> PathBuf {
    let stem = primary_destination
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    primary_destination.with_file_name(format!("{}{}", stem, suffix))
}

/// Lowercase with a leading dot.
pub fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{}", ext)
    }
}
