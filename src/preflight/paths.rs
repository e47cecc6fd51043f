//! Directory and state file checks.

use super::{CheckResult, CheckStatus};
use crate::core::checkpoint::Checkpoint;
use crate::core::journal::UndoJournal;
use crate::utils::fs::absolute;
use crate::Result;
use std::path::Path;

/// Source root must be an existing directory.
pub fn check_source(path: &Path) -> CheckResult {
    if path.as_os_str().is_empty() {
        return CheckResult::fail(
            "source",
            "not configured",
            "Set paths.source_dir or pass --source",
        );
    }
    if path.is_dir() {
        CheckResult::pass("source", path.display().to_string())
    } else {
        CheckResult::fail(
            "source",
            format!("{} is not a directory", path.display()),
            "Check the path and mount point",
        )
    }
}

/// Output root must be usable. Living inside the source tree only warns.
pub fn check_output(path: &Path, source: &Path) -> CheckResult {
    if path.as_os_str().is_empty() {
        return CheckResult::fail(
            "output",
            "not configured",
            "Set paths.output_dir or pass --output",
        );
    }
    let result = check_directory("output", path);
    if result.status != CheckStatus::Pass || source.as_os_str().is_empty() {
        return result;
    }

    if absolute(path).starts_with(absolute(source)) {
        CheckResult::warn(
            "output",
            result.message,
            "Keep the library outside the source tree",
        )
        .with_detail("inside the source tree; it is left out of every scan")
    } else {
        result
    }
}

/// Backups are optional; without them only the undo log can restore files.
pub fn check_backup(path: Option<&Path>) -> CheckResult {
    match path {
        None => CheckResult::warn(
            "backup",
            "disabled",
            "Set paths.backup_dir or pass --backup to keep copies",
        ),
        Some(path) => check_directory("backup", path),
    }
}

/// A log directory that cannot be used only costs the log files.
pub fn check_log_dir(path: &Path) -> CheckResult {
    if path.as_os_str().is_empty() {
        return CheckResult::pass("logs", "file logging disabled");
    }
    let result = check_directory("logs", path);
    if result.status == CheckStatus::Fail {
        CheckResult::warn(
            "logs",
            result.message,
            "Fix paths.log_dir; only console logging will be available",
        )
    } else {
        result
    }
}

/// Undo log must be writable and, if present, readable.
pub fn check_undo_log(path: &Path) -> CheckResult {
    check_state_file("undo log", path, |p| Ok(UndoJournal::load(p)?.len()))
}

/// Checkpoint must be writable and, if present, readable.
pub fn check_checkpoint(path: &Path) -> CheckResult {
    check_state_file("checkpoint", path, |p| Ok(Checkpoint::load(p)?.len()))
}

fn check_state_file(
    name: &str,
    path: &Path,
    entries: impl Fn(&Path) -> Result<usize>,
) -> CheckResult {
    if path.as_os_str().is_empty() {
        return CheckResult::fail(name, "not configured", "Set the path in [paths]");
    }
    if path.is_dir() {
        return CheckResult::fail(
            name,
            format!("{} is a directory", path.display()),
            "Point the setting at a file",
        );
    }

    let writable = path
        .ancestors()
        .skip(1)
        .find(|a| a.is_dir())
        .is_some_and(is_writable_dir);
    if !writable {
        return CheckResult::fail(
            name,
            format!("{} is not writable", path.display()),
            "Check permissions on the state directory",
        );
    }

    if !path.exists() {
        return CheckResult::pass(name, path.display().to_string())
            .with_detail("will be created on the first move");
    }
    match entries(path) {
        Ok(count) => CheckResult::pass(name, path.display().to_string())
            .with_detail(format!("{} entries", count)),
        Err(e) => CheckResult::fail(
            name,
            e.to_string(),
            "Repair or remove the file; runs refuse to start with it",
        ),
    }
}

/// Existing directory, or one that can be created under an existing ancestor.
fn check_directory(name: &str, path: &Path) -> CheckResult {
    if path.is_dir() {
        return CheckResult::pass(name, path.display().to_string());
    }
    if path.exists() {
        return CheckResult::fail(
            name,
            format!("{} exists and is not a directory", path.display()),
            "Choose another directory",
        );
    }

    match path.ancestors().skip(1).find(|a| a.is_dir()) {
        Some(ancestor) if is_writable_dir(ancestor) => {
            CheckResult::pass(name, path.display().to_string()).with_detail("will be created")
        }
        _ => CheckResult::fail(
            name,
            format!("{} cannot be created", path.display()),
            "Check permissions on the parent directory",
        ),
    }
}

fn is_writable_dir(dir: &Path) -> bool {
    std::fs::metadata(dir)
        .map(|m| m.is_dir() && !m.permissions().readonly())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_output_can_be_created() {
        let dir = TempDir::new().unwrap();
        let result = check_output(&dir.path().join("a/b"), &dir.path().join("src"));
        assert_eq!(result.status, CheckStatus::Pass);
        assert_eq!(result.details, vec!["will be created".to_string()]);
    }

    #[test]
    fn test_output_is_a_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file");
        std::fs::write(&file, b"x").unwrap();
        assert_eq!(check_output(&file, dir.path()).status, CheckStatus::Fail);
    }

    #[test]
    fn test_output_inside_source_warns() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("src");
        std::fs::create_dir_all(source.join("Library")).unwrap();
        let result = check_output(&source.join("Library"), &source);
        assert_eq!(result.status, CheckStatus::Warn);
        assert_eq!(result.details.len(), 1);
    }

    #[test]
    fn test_unusable_log_dir_only_warns() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("logs");
        std::fs::write(&file, b"x").unwrap();
        assert_eq!(check_log_dir(&file).status, CheckStatus::Warn);
        assert_eq!(check_log_dir(Path::new("")).status, CheckStatus::Pass);
    }

    #[test]
    fn test_state_file_is_directory() {
        let dir = TempDir::new().unwrap();
        assert_eq!(check_undo_log(dir.path()).status, CheckStatus::Fail);
    }

    #[test]
    fn test_state_file_entries_are_counted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("checkpoint.json");
        std::fs::write(&path, r#"["/src/a.mkv", "/src/b.mkv"]"#).unwrap();

        let result = check_checkpoint(&path);
        assert_eq!(result.status, CheckStatus::Pass);
        assert_eq!(result.details, vec!["2 entries".to_string()]);
    }

    #[test]
    fn test_damaged_undo_log_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("undo.json");
        std::fs::write(&path, "[{").unwrap();
        assert_eq!(check_undo_log(&path).status, CheckStatus::Fail);
    }
}
