//! Media-related data models.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which step of the parser produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseStrategy {
    /// Season from the enclosing directory, episode from the filename.
    Directory,
    /// Title and season from the filename itself.
    Filename,
    /// Title cut at the first release token, season 1.
    Fallback,
}

impl std::fmt::Display for ParseStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseStrategy::Directory => write!(f, "directory"),
            ParseStrategy::Filename => write!(f, "filename"),
            ParseStrategy::Fallback => write!(f, "fallback"),
        }
    }
}

/// Structured information parsed from an episode file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedMediaInfo {
    /// Cleaned show title (never empty).
    pub title: String,
    /// Season number, at least 1.
    pub season: u32,
    /// Episode number, at least 1.
    pub episode: u32,
    /// Release year.
    pub year: Option<u16>,
    /// Resolution tag (e.g., "1080p").
    pub resolution: Option<String>,
    /// Original extension including the dot, as found on disk.
    pub extension: String,
    /// Parser step that resolved this record.
    pub strategy: ParseStrategy,
}

/// Directory names surrounding a file, used by the directory parsing step.
///
/// Only directories below the source root are filled in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirContext {
    /// Name of the directory containing the file.
    pub immediate: Option<String>,
    /// Name of the directory above that.
    pub parent: Option<String>,
}

impl DirContext {
    /// Build the context for `file` relative to `root`.
    pub fn for_file(file: &std::path::Path, root: &std::path::Path) -> Self {
        let mut names: Vec<String> = file
            .strip_prefix(root)
            .ok()
            .and_then(|rel| rel.parent())
            .map(|dir| {
                dir.components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();

        let immediate = names.pop();
        let parent = names.pop();
        Self { immediate, parent }
    }
}

/// Kind of file being moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveKind {
    /// The episode video itself.
    #[default]
    PrimaryFile,
    /// Subtitle, NFO or artwork next to the episode.
    MetadataSidecar,
}

/// One planned move, consumed immediately by the mover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOperation {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub kind: MoveKind,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_dir_context_below_root() {
        let ctx = DirContext::for_file(
            Path::new("/src/Breaking Bad/Season 2/e03.mkv"),
            Path::new("/src"),
        );
        assert_eq!(ctx.immediate.as_deref(), Some("Season 2"));
        assert_eq!(ctx.parent.as_deref(), Some("Breaking Bad"));
    }

    #[test]
    fn test_dir_context_at_root() {
        let ctx = DirContext::for_file(Path::new("/src/e03.mkv"), Path::new("/src"));
        assert_eq!(ctx, DirContext::default());

        let ctx = DirContext::for_file(Path::new("/src/Show S01/e03.mkv"), Path::new("/src"));
        assert_eq!(ctx.immediate.as_deref(), Some("Show S01"));
        assert_eq!(ctx.parent, None);
    }
}
