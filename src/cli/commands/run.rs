//! Run command implementation.
//!
//! Applies CLI overrides to the configuration, plans the run, asks for
//! confirmation once the plan and its conflicts are on screen, then previews
//! or executes it, prints the summary and writes the requested reports.

use crate::core::coordinator::{RunCoordinator, RunPlan};
use crate::generators::{html, tree};
use crate::models::config::Config;
use crate::models::report::{FileStatus, RunReport};
use crate::utils::fs::write_json_atomic;
use crate::Result;
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;

/// Options collected from the `run` subcommand.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub execute: bool,
    pub preview: bool,
    pub yes: bool,
    pub source: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub backup: Option<PathBuf>,
    pub parallel: bool,
    pub sequential: bool,
    pub workers: Option<usize>,
    pub report: Option<PathBuf>,
    pub report_json: Option<PathBuf>,
}

impl RunOptions {
    /// Apply command line overrides on top of the loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(source) = &self.source {
            config.paths.source_dir = source.clone();
        }
        if let Some(output) = &self.output {
            config.paths.output_dir = output.clone();
        }
        if let Some(backup) = &self.backup {
            config.paths.backup_dir = Some(backup.clone());
        }
        if self.parallel {
            config.rules.parallel_processing = true;
        }
        if self.sequential {
            config.rules.parallel_processing = false;
        }
        if self.workers.is_some() {
            config.rules.max_workers = self.workers;
        }
        if self.execute {
            config.rules.preview_only = false;
        } else if self.preview {
            config.rules.preview_only = true;
        }
    }
}

/// Preview or execute a run.
pub async fn run(config: Config, options: &RunOptions) -> Result<()> {
    let preview = config.rules.preview_only;
    if preview {
        println!("{}", "[PREVIEW] No files will be changed".bold().cyan());
    } else {
        println!("{}", "[EXEC] Renaming episodes...".bold().cyan());
    }
    println!();
    println!("  {} {}", "Source:".bold(), config.paths.source_dir.display());
    println!("  {} {}", "Output:".bold(), config.paths.output_dir.display());
    if let Some(backup) = &config.paths.backup_dir {
        println!("  {} {}", "Backups:".bold(), backup.display());
    }
    let mode = if config.rules.parallel_processing {
        format!("parallel ({} workers)", config.rules.worker_count())
    } else {
        "sequential".to_string()
    };
    println!("  {} {}", "Mode:".bold(), mode);
    println!();

    let show_tree = config.rules.show_tree && !preview;
    let tree_depth = config.rules.tree_depth;
    let extensions = config.rules.extensions.clone();
    let output_dir = config.paths.output_dir.clone();

    let coordinator = RunCoordinator::new(config)?.with_progress(!preview);
    let plan = coordinator.prepare()?;
    print_plan(&plan);

    if !preview {
        println!("{}", "[WARNING] This will move files!".bold().yellow());
        if !options.yes && !super::confirm("Continue?") {
            println!("{}", "[ABORT] Nothing was changed".yellow());
            return Ok(());
        }
        println!();
    }

    if show_tree {
        print_tree("[Library Before]", &output_dir, tree_depth, &extensions);
    }

    // Ctrl-C stops dispatching; moves already running complete
    let cancel = coordinator.cancel_flag();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight files");
            cancel.store(true, Ordering::SeqCst);
        }
    });

    let result = coordinator.run_plan(plan, preview).await;
    interrupt.abort();
    let report = result?;

    if show_tree {
        print_tree("[Library After]", &output_dir, tree_depth, &extensions);
    }
    if preview {
        print_preview(&report);
    }
    report.print_summary();
    println!();

    if let Some(path) = &options.report {
        html::write_report(&report, path)?;
        println!("{} {}", "[OK] HTML report:".bold().green(), path.display());
    }
    if let Some(path) = &options.report_json {
        write_json_atomic(&report, path)?;
        println!("{} {}", "[OK] JSON report:".bold().green(), path.display());
    }

    print_next_steps(&report);
    Ok(())
}

/// Counts and conflicts known before anything moves.
fn print_plan(plan: &RunPlan) {
    println!("{}", "[Plan]".bold().cyan());
    println!("  {} {}", "Candidates:".bold(), plan.files.len());
    println!("  {} {}", "To move:".bold(), plan.movable());
    println!("  {} {}", "Unresolved:".bold(), plan.unresolved());
    if plan.checkpointed > 0 {
        println!("  {} {}", "Already processed:".bold(), plan.checkpointed);
    }
    if !plan.conflicts.is_empty() {
        println!("  {} {}", "Conflicts:".bold().yellow(), plan.conflicts.len());
        for conflict in &plan.conflicts {
            println!(
                "    {} {} ({})",
                "[CONFLICT]".yellow(),
                display_relative(&conflict.source, &plan.scan_root),
                conflict.reason
            );
        }
    }
    println!();
}

fn print_tree(title: &str, root: &Path, depth: usize, extensions: &[String]) {
    println!("{}", title.bold().cyan());
    match tree::render_tree(root, depth, extensions) {
        Ok(rendered) => print!("{}", rendered),
        Err(crate::Error::PathNotFound(_)) => {
            println!("  {}", format!("{} does not exist yet", root.display()).dimmed())
        }
        Err(e) => println!("  {} {}", "[WARN]".yellow(), e),
    }
    println!();
}

fn print_preview(report: &RunReport) {
    println!("{}", "[Planned Actions]".bold().cyan());
    for file in &report.files {
        let source = display_relative(&file.source, &report.source_root);
        match (file.status, &file.destination) {
            (FileStatus::Planned, Some(dest)) => {
                println!(
                    "  {} {} -> {}",
                    "[MOVE]".green(),
                    source,
                    display_relative(dest, &report.output_root)
                );
                for sidecar in &file.sidecars {
                    println!(
                        "         + {}",
                        display_relative(sidecar, &report.output_root).dimmed()
                    );
                }
            }
            (FileStatus::Conflict, Some(dest)) => println!(
                "  {} {} -> {}",
                "[CONFLICT]".yellow(),
                source,
                display_relative(dest, &report.output_root)
            ),
            (FileStatus::Failed, _) => println!(
                "  {} {}: {}",
                "[FAIL]".red(),
                source,
                file.detail.as_deref().unwrap_or("unknown error")
            ),
            _ => println!("  {} {}", "[SKIP]".dimmed(), source),
        }
    }
    println!();
}

fn print_next_steps(report: &RunReport) {
    println!("{}", "[Next Steps]".bold().yellow());
    if report.preview {
        if report.files_with(FileStatus::Planned).count() > 0 {
            println!(
                "  To apply these changes: {}",
                "tvshow-renamer run --execute".cyan()
            );
        } else {
            println!("  Nothing to do.");
        }
    } else {
        if report.counters.moved > 0 {
            println!("  To undo this run: {}", "tvshow-renamer undo <N>".cyan());
        }
        if report.cancelled {
            println!(
                "  To resume: {}",
                "tvshow-renamer run --execute".cyan()
            );
        }
    }
}

fn display_relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides() {
        let mut config = Config::default();
        config.rules.parallel_processing = true;

        let options = RunOptions {
            execute: true,
            source: Some(PathBuf::from("/in")),
            backup: Some(PathBuf::from("/bak")),
            sequential: true,
            workers: Some(2),
            ..Default::default()
        };
        options.apply(&mut config);

        assert_eq!(config.paths.source_dir, PathBuf::from("/in"));
        assert_eq!(config.paths.backup_dir, Some(PathBuf::from("/bak")));
        assert!(!config.rules.parallel_processing);
        assert_eq!(config.rules.max_workers, Some(2));
        assert!(!config.rules.preview_only);
    }

    #[test]
    fn test_preview_follows_config_without_flags() {
        let mut config = Config::default();
        config.rules.preview_only = false;
        RunOptions::default().apply(&mut config);
        assert!(!config.rules.preview_only);

        let options = RunOptions {
            preview: true,
            ..Default::default()
        };
        options.apply(&mut config);
        assert!(config.rules.preview_only);
    }

    #[test]
    fn test_display_relative() {
        assert_eq!(
            display_relative(Path::new("/out/Show/a.mkv"), Path::new("/out")),
            "Show/a.mkv"
        );
        assert_eq!(
            display_relative(Path::new("/elsewhere/a.mkv"), Path::new("/out")),
            "/elsewhere/a.mkv"
        );
    }
}
