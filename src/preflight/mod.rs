//! Preflight checks.
//!
//! Everything a run depends on is checked before the first file is touched:
//! source and output trees, backup and log directories, the state files
//! (which must parse, since a damaged one aborts a run) and the configured
//! patterns and templates. Warnings are shown but do not block a run.

mod paths;
mod patterns;

use crate::models::config::Config;
use colored::Colorize;

/// Outcome of one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a preflight check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    /// What to change, for warnings and failures.
    pub hint: Option<String>,
    /// Extra lines shown under the message.
    pub details: Vec<String>,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            hint: None,
            details: Vec::new(),
        }
    }

    pub fn pass(name: &str, message: impl Into<String>) -> Self {
        Self::new(name, CheckStatus::Pass, message)
    }

    pub fn warn(name: &str, message: impl Into<String>, hint: &str) -> Self {
        Self::new(name, CheckStatus::Warn, message).with_hint(hint)
    }

    pub fn fail(name: &str, message: impl Into<String>, hint: &str) -> Self {
        Self::new(name, CheckStatus::Fail, message).with_hint(hint)
    }

    fn with_hint(mut self, hint: &str) -> Self {
        self.hint = Some(hint.to_string());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.details.push(detail.into());
        self
    }
}

/// All results of one preflight pass.
#[derive(Debug, Clone, Default)]
pub struct PreflightReport {
    pub results: Vec<CheckResult>,
}

impl PreflightReport {
    /// No check failed. Warnings are allowed.
    pub fn passed(&self) -> bool {
        self.count(CheckStatus::Fail) == 0
    }

    /// Results with the given status.
    pub fn with_status(&self, status: CheckStatus) -> impl Iterator<Item = &CheckResult> {
        self.results.iter().filter(move |r| r.status == status)
    }

    fn count(&self, status: CheckStatus) -> usize {
        self.with_status(status).count()
    }

    /// Print every result followed by a tally.
    pub fn print(&self) {
        for result in &self.results {
            let tag = match result.status {
                CheckStatus::Pass => "[OK]".green(),
                CheckStatus::Warn => "[WARN]".yellow(),
                CheckStatus::Fail => "[FAIL]".red(),
            };
            println!("{} {}: {}", tag, result.name.bold(), result.message);
            for detail in &result.details {
                println!("       {}", detail.dimmed());
            }
            if let Some(hint) = &result.hint {
                println!("  {} {}", "->".yellow(), hint);
            }
        }

        let summary = format!(
            "{} passed, {} warning(s), {} failed",
            self.count(CheckStatus::Pass),
            self.count(CheckStatus::Warn),
            self.count(CheckStatus::Fail)
        );
        println!();
        if self.passed() {
            println!("{}", summary.green());
        } else {
            println!("{}", summary.red());
        }
    }
}

/// Run all preflight checks against a loaded configuration.
pub fn run_preflight_checks(config: &Config) -> PreflightReport {
    let p = &config.paths;
    let results = vec![
        paths::check_source(&p.source_dir),
        paths::check_output(&p.output_dir, &p.source_dir),
        paths::check_backup(p.backup_dir.as_deref()),
        paths::check_log_dir(&p.log_dir),
        paths::check_undo_log(&p.undo_log_path),
        paths::check_checkpoint(&p.checkpoint_path),
        patterns::check_patterns(config),
        patterns::check_templates(config),
    ];
    PreflightReport { results }
}
