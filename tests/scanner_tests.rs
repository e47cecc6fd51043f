//! Integration tests for the scanner module.
//!
//! Tests cover:
//! - Directory scanning with episode files
//! - Excluded folders, keywords and pruned output trees
//! - Checkpointed files
//! - Error handling for non-existent paths

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tvshow_renamer::core::checkpoint::Checkpoint;
use tvshow_renamer::core::scanner::{scan_directory, ScanOptions};
use tvshow_renamer::models::config::RulesConfig;

fn options(prune: Vec<PathBuf>) -> ScanOptions {
    let mut rules = RulesConfig::default();
    rules.min_size_mb = 0.0;
    ScanOptions::from_rules(&rules, prune)
}

fn touch(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, "fake video content").unwrap();
}

#[test]
fn test_scan_empty_directory() {
    let temp_dir = TempDir::new().unwrap();
    let result = scan_directory(temp_dir.path(), &options(Vec::new()), None).unwrap();

    assert_eq!(result.files.len(), 0);
    assert_eq!(result.total_files_scanned, 0);
}

#[test]
fn test_scan_with_episode_files() {
    let temp_dir = TempDir::new().unwrap();
    touch(&temp_dir.path().join("Show/Season 1/Show.S01E02.mkv"));
    touch(&temp_dir.path().join("Show/Season 1/Show.S01E01.mkv"));
    touch(&temp_dir.path().join("Show/Season 1/Show.S01E01.srt"));

    let result = scan_directory(temp_dir.path(), &options(Vec::new()), None).unwrap();

    assert_eq!(result.files.len(), 2);
    assert_eq!(result.total_files_scanned, 3);
    // sorted
    assert!(result.files[0].ends_with("Show.S01E01.mkv"));
    assert!(result.files[0].is_absolute());
}

#[test]
fn test_scan_skips_sample_folder_and_keywords() {
    let temp_dir = TempDir::new().unwrap();
    touch(&temp_dir.path().join("Show.S01E01.mkv"));
    touch(&temp_dir.path().join("Sample/Show.S01E01.mkv"));
    touch(&temp_dir.path().join("Show.S01E01.trailer.mkv"));

    let result = scan_directory(temp_dir.path(), &options(Vec::new()), None).unwrap();

    assert_eq!(result.files.len(), 1);
    assert_eq!(result.excluded, 1);
    assert_eq!(result.pruned_dirs, 1);
}

#[test]
fn test_scan_prunes_output_tree() {
    let temp_dir = TempDir::new().unwrap();
    let library = temp_dir.path().join("Library");
    touch(&library.join("Show/Season 01/Show.S01.E01.mkv"));
    touch(&temp_dir.path().join("Show.S01E02.mkv"));

    let result = scan_directory(temp_dir.path(), &options(vec![library]), None).unwrap();

    assert_eq!(result.files.len(), 1);
    assert!(result.files[0].ends_with("Show.S01E02.mkv"));
}

#[test]
fn test_scan_skips_checkpointed() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("src");
    touch(&root.join("Show.S01E01.mkv"));
    touch(&root.join("Show.S01E02.mkv"));

    let mut checkpoint = Checkpoint::load(&temp_dir.path().join("checkpoint.json")).unwrap();
    checkpoint
        .mark(&root.canonicalize().unwrap().join("Show.S01E01.mkv"))
        .unwrap();

    let result = scan_directory(&root, &options(Vec::new()), Some(&checkpoint)).unwrap();

    assert_eq!(result.files.len(), 1);
    assert_eq!(result.checkpointed, 1);
}

#[test]
fn test_scan_nonexistent_directory() {
    let result = scan_directory(
        &PathBuf::from("/nonexistent/path/12345"),
        &options(Vec::new()),
        None,
    );
    assert!(result.is_err());
}
