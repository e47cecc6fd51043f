//! Directory scanner module.
//!
//! Collects candidate episode files under the source root, pruning excluded
//! directories and filtering by keyword, extension, size and checkpoint.

use crate::core::checkpoint::Checkpoint;
use crate::core::mover::{normalize_extension, STAGING_DIR};
use crate::models::config::RulesConfig;
use crate::utils::fs::{absolute, dotted_extension, ensure_directory};
use crate::Result;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// File selection options.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Lowercase extensions with leading dot.
    pub extensions: Vec<String>,
    /// Lowercase filename keywords to exclude.
    pub exclude_keywords: Vec<String>,
    /// Lowercase directory name fragments to prune.
    pub exclude_dirs: Vec<String>,
    /// Minimum size in bytes.
    pub min_size: u64,
    /// Descend into subdirectories.
    pub recursive: bool,
    /// Absolute directories never descended into (output, backup).
    pub prune: Vec<PathBuf>,
}

impl ScanOptions {
    /// Build from the rules section plus directories to prune.
    pub fn from_rules(rules: &RulesConfig, prune: Vec<PathBuf>) -> Self {
        let lower = |items: &[String]| -> Vec<String> {
            items
                .iter()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect()
        };

        Self {
            extensions: rules.extensions.iter().map(|e| normalize_extension(e)).collect(),
            exclude_keywords: lower(&rules.exclude_keywords),
            exclude_dirs: lower(&rules.exclude_dirs),
            min_size: rules.min_size_bytes(),
            recursive: rules.recursive,
            prune: prune.iter().map(|p| absolute(p)).collect(),
        }
    }
}

/// Result of scanning a directory.
#[derive(Debug, Default)]
pub struct ScanResult {
    /// Canonical source root.
    pub root: PathBuf,
    /// Candidate files, sorted.
    pub files: Vec<PathBuf>,
    /// Files skipped because they are in the checkpoint.
    pub checkpointed: usize,
    /// Files skipped by keyword.
    pub excluded: usize,
    /// Files below the size threshold.
    pub too_small: usize,
    /// Directories pruned.
    pub pruned_dirs: usize,
    /// Total files scanned.
    pub total_files_scanned: usize,
}

/// Scan a directory for candidate files.
pub fn scan_directory(
    root: &Path,
    options: &ScanOptions,
    checkpoint: Option<&Checkpoint>,
) -> Result<ScanResult> {
    ensure_directory(root)?;
    let root = root.canonicalize()?;

    let mut result = ScanResult {
        root: root.clone(),
        ..Default::default()
    };

    let mut walker = WalkDir::new(&root).follow_links(false);
    if !options.recursive {
        walker = walker.max_depth(1);
    }

    let mut pruned = 0usize;
    let entries = walker.into_iter().filter_entry(|entry| {
        let keep = entry.depth() == 0 || !entry.file_type().is_dir() || !is_pruned_dir(entry, options);
        if !keep {
            tracing::debug!("Pruned directory: {}", entry.path().display());
            pruned += 1;
        }
        keep
    });

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Failed to read entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        result.total_files_scanned += 1;

        let path = entry.path();
        let name = entry.file_name().to_string_lossy().to_lowercase();

        let Some(ext) = dotted_extension(path) else {
            continue;
        };
        if !options.extensions.contains(&ext) {
            continue;
        }
        if options.exclude_keywords.iter().any(|k| name.contains(k.as_str())) {
            tracing::debug!("Excluded by keyword: {}", path.display());
            result.excluded += 1;
            continue;
        }

        let size = match entry.metadata() {
            Ok(meta) => meta.len(),
            Err(e) => {
                tracing::warn!("Failed to stat {:?}: {}", path, e);
                continue;
            }
        };
        if size < options.min_size {
            result.too_small += 1;
            continue;
        }

        if checkpoint.is_some_and(|cp| cp.contains(path)) {
            result.checkpointed += 1;
            continue;
        }

        result.files.push(path.to_path_buf());
    }

    result.pruned_dirs = pruned;
    result.files.sort();

    tracing::info!(
        "Scanned {} files: {} candidates, {} excluded, {} too small, {} already processed",
        result.total_files_scanned,
        result.files.len(),
        result.excluded,
        result.too_small,
        result.checkpointed
    );

    Ok(result)
}

fn is_pruned_dir(entry: &DirEntry, options: &ScanOptions) -> bool {
    let name = entry.file_name().to_string_lossy();
    if name == STAGING_DIR {
        return true;
    }
    let lower = name.to_lowercase();
    if options.exclude_dirs.iter().any(|d| lower.contains(d.as_str())) {
        return true;
    }
    options.prune.iter().any(|p| entry.path() == p.as_path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn options() -> ScanOptions {
        let mut rules = RulesConfig::default();
        rules.min_size_mb = 0.0;
        ScanOptions::from_rules(&rules, Vec::new())
    }

    #[test]
    fn test_extension_filter_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.S01E01.MKV"), b"x").unwrap();
        fs::write(dir.path().join("a.S01E01.nfo"), b"x").unwrap();

        let result = scan_directory(dir.path(), &options(), None).unwrap();
        assert_eq!(result.files.len(), 1);
    }

    #[test]
    fn test_exclude_dirs_substring() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("Show.Extras-GRP")).unwrap();
        fs::create_dir_all(dir.path().join("@eaDir")).unwrap();
        fs::write(dir.path().join("Show.Extras-GRP/e01.mkv"), b"x").unwrap();
        fs::write(dir.path().join("@eaDir/e01.mkv"), b"x").unwrap();
        fs::write(dir.path().join("e01.mkv"), b"x").unwrap();

        let result = scan_directory(dir.path(), &options(), None).unwrap();
        assert_eq!(result.files.len(), 1);
        assert_eq!(result.pruned_dirs, 2);
    }

    #[test]
    fn test_non_recursive() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("Season 1")).unwrap();
        fs::write(dir.path().join("Season 1/e01.mkv"), b"x").unwrap();
        fs::write(dir.path().join("e02.mkv"), b"x").unwrap();

        let mut opts = options();
        opts.recursive = false;
        let result = scan_directory(dir.path(), &opts, None).unwrap();
        assert_eq!(result.files.len(), 1);
        assert!(result.files[0].ends_with("e02.mkv"));
    }

    #[test]
    fn test_min_size() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("small.mkv"), vec![0u8; 10]).unwrap();
        fs::write(dir.path().join("large.mkv"), vec![0u8; 2048]).unwrap();

        let mut opts = options();
        opts.min_size = 1024;
        let result = scan_directory(dir.path(), &opts, None).unwrap();
        assert_eq!(result.files.len(), 1);
        assert_eq!(result.too_small, 1);
    }
}
