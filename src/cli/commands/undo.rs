//! Undo command implementation.
//!
//! Reverses the most recent entries of the undo log and drops restored
//! files from the checkpoint so a later run picks them up again.

use crate::core::checkpoint::Checkpoint;
use crate::core::journal::UndoJournal;
use crate::models::config::Config;
use crate::Result;
use colored::Colorize;

/// Reverse the last `count` moves.
pub async fn undo(config: &Config, count: usize, yes: bool) -> Result<()> {
    println!("{}", "[UNDO] Undo command".bold().cyan());
    println!();

    let log_path = &config.paths.undo_log_path;
    println!("[INFO] Loading undo log: {}", log_path.display());
    let mut journal = UndoJournal::load(log_path)?;

    if journal.is_empty() {
        println!("{}", "[OK] Undo log is empty, nothing to undo".green());
        return Ok(());
    }

    let count = count.min(journal.len());
    println!("  {} {}", "Entries in log:".bold(), journal.len());
    println!("  {} {}", "To reverse:".bold(), count);
    println!();

    println!("{}", "[Most recent first]".bold());
    for entry in journal.entries().iter().rev().take(count) {
        println!(
            "  {} -> {}",
            entry.new_path.display(),
            entry.original_path.display()
        );
    }
    println!();

    println!(
        "{}",
        "[WARNING] Files will be moved back to their original locations!"
            .bold()
            .yellow()
    );
    if !yes && !super::confirm("Continue?") {
        println!("{}", "[ABORT] Nothing was changed".yellow());
        return Ok(());
    }
    println!();

    let report = journal.undo(count, config.rules.verify_checksum)?;

    if !report.restored.is_empty() {
        let mut checkpoint = Checkpoint::load(&config.paths.checkpoint_path)?;
        let forgotten = checkpoint.forget(&report.restored)?;
        tracing::debug!("Removed {} restored files from checkpoint", forgotten);
    }

    report.print_summary();
    println!();

    if report.is_success() {
        println!("{}", "[OK] Undo completed successfully!".green());
    } else {
        println!(
            "{}",
            "[WARNING] Some entries could not be reversed, see above".yellow()
        );
    }

    Ok(())
}
