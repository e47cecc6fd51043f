//! Run coordinator.
//!
//! Drives one batch run:
//! - collect candidate files (scanner, checkpoint)
//! - parse and plan every file, then flag destination conflicts up front
//! - preview: report only; execute: move files sequentially or on a bounded
//!   worker pool, recording undo entries and checkpointing after each file
//!
//! Planning ([`RunCoordinator::prepare`]) and acting
//! ([`RunCoordinator::run_plan`]) are separate steps so a caller can show the
//! plan before anything moves. Files the pre-scan marks as conflicting are
//! never dispatched, so the winner of a shared destination does not depend
//! on worker scheduling.
//!
//! Checkpoint, undo log and the set of claimed destinations are shared by
//! all workers behind one lock, and every update is persisted before the
//! lock is released.

use crate::core::checkpoint::Checkpoint;
use crate::core::journal::UndoJournal;
use crate::core::mover::{find_sidecars, sidecar_destination, FileMover, MoverConfig};
use crate::core::parser::FilenameParser;
use crate::core::patterns::PatternSet;
use crate::core::planner::{find_duplicate_targets, PathPlanner};
use crate::core::scanner::{scan_directory, ScanOptions};
use crate::models::config::Config;
use crate::models::media::{MoveKind, MoveOperation, ParsedMediaInfo};
use crate::models::report::{ConflictRecord, FileRecord, FileStatus, RunReport};
use crate::models::undo::UndoLogEntry;
use crate::utils::fs::{absolute, ensure_directory};
use crate::Result;
use chrono::Local;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A collected file after parsing and planning.
#[derive(Debug, Clone)]
pub struct PlannedFile {
    pub source: PathBuf,
    pub info: Option<ParsedMediaInfo>,
    pub destination: Option<PathBuf>,
    /// Planning failed for a resolved file (e.g. empty rendered name).
    pub plan_error: Option<String>,
}

/// Everything decided before a file is touched.
pub struct RunPlan {
    /// Canonical source root that was scanned.
    pub scan_root: PathBuf,
    /// Files skipped because the checkpoint lists them.
    pub checkpointed: usize,
    /// Parsed and planned files, in scan order.
    pub files: Vec<PlannedFile>,
    /// Pre-scan conflicts; these files are not moved.
    pub conflicts: Vec<ConflictRecord>,
    checkpoint: Checkpoint,
}

impl RunPlan {
    /// Files with a destination and no conflict.
    pub fn movable(&self) -> usize {
        let conflicted: HashSet<&Path> = self.conflicts.iter().map(|c| c.source.as_path()).collect();
        self.files
            .iter()
            .filter(|pf| pf.destination.is_some() && !conflicted.contains(pf.source.as_path()))
            .count()
    }

    /// Files no strategy could resolve.
    pub fn unresolved(&self) -> usize {
        self.files
            .iter()
            .filter(|pf| pf.info.is_none())
            .count()
    }
}

/// Run coordinator.
pub struct RunCoordinator {
    config: Config,
    source_root: PathBuf,
    output_root: PathBuf,
    parser: FilenameParser,
    planner: PathPlanner,
    cancel: Arc<AtomicBool>,
    show_progress: bool,
}

impl RunCoordinator {
    /// Validate the configuration and compile patterns and templates.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let patterns = Arc::new(PatternSet::compile(&config.patterns, &config.cleanup)?);
        let output_root = absolute(&config.paths.output_dir);
        let planner = PathPlanner::new(&config.naming, &output_root)?;

        Ok(Self {
            source_root: config.paths.source_dir.clone(),
            output_root,
            parser: FilenameParser::new(patterns),
            planner,
            config,
            cancel: Arc::new(AtomicBool::new(false)),
            show_progress: false,
        })
    }

    /// Share a cancellation flag (set by an interrupt handler).
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Show a progress bar while executing.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Cancellation flag checked between files.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// Parser used by this run.
    pub fn parser(&self) -> &FilenameParser {
        &self.parser
    }

    /// Planner used by this run.
    pub fn planner(&self) -> &PathPlanner {
        &self.planner
    }

    /// Scan, plan and pre-scan the source tree, then preview or execute.
    pub async fn run(&self, preview: bool) -> Result<RunReport> {
        let plan = self.prepare()?;
        self.run_plan(plan, preview).await
    }

    /// Scan the source tree, parse and plan every file and flag conflicts.
    ///
    /// Reads the checkpoint but writes nothing.
    pub fn prepare(&self) -> Result<RunPlan> {
        ensure_directory(&self.source_root)?;

        let checkpoint = Checkpoint::load(&self.config.paths.checkpoint_path)?;

        let mut prune = vec![self.output_root.clone()];
        if let Some(backup) = &self.config.paths.backup_dir {
            prune.push(backup.clone());
        }
        let options = ScanOptions::from_rules(&self.config.rules, prune);
        let scan = scan_directory(&self.source_root, &options, Some(&checkpoint))?;

        let files: Vec<PlannedFile> = scan
            .files
            .iter()
            .map(|file| self.plan_file(file, &scan.root))
            .collect();

        let conflicts = prescan_conflicts(&files);
        for conflict in &conflicts {
            tracing::warn!(
                "Conflict: {} -> {} ({})",
                conflict.source.display(),
                conflict.destination.display(),
                conflict.reason
            );
        }

        Ok(RunPlan {
            scan_root: scan.root,
            checkpointed: scan.checkpointed,
            files,
            conflicts,
            checkpoint,
        })
    }

    /// Preview or execute a prepared plan.
    pub async fn run_plan(&self, plan: RunPlan, preview: bool) -> Result<RunReport> {
        let mut report = RunReport::new(preview, plan.scan_root, self.output_root.clone());
        report.checkpointed = plan.checkpointed;
        report.conflicts = plan.conflicts;

        if preview {
            self.preview(plan.files, &mut report);
        } else {
            let journal = UndoJournal::load(&self.config.paths.undo_log_path)?;
            self.execute(plan.files, plan.checkpoint, journal, &mut report).await;
        }

        report.files.sort_by(|a, b| a.source.cmp(&b.source));
        report.finished_at = Local::now();

        let c = &report.counters;
        tracing::info!(
            "Run {} finished: processed={} moved={} skipped={} errors={} backups={}",
            report.run_id,
            c.processed,
            c.moved,
            c.skipped,
            c.errors,
            c.backups_created
        );
        Ok(report)
    }

    /// Parse and plan one file.
    pub fn plan_file(&self, file: &Path, root: &Path) -> PlannedFile {
        let info = self.parser.parse_path(file, root);
        let (destination, plan_error) = match &info {
            Some(info) => match self.planner.plan(info) {
                Ok(dest) => (Some(dest), None),
                Err(e) => (None, Some(e.to_string())),
            },
            None => (None, None),
        };

        PlannedFile {
            source: file.to_path_buf(),
            info,
            destination,
            plan_error,
        }
    }

    /// Report what would happen. Touches nothing on disk.
    fn preview(&self, planned: Vec<PlannedFile>, report: &mut RunReport) {
        let conflicted = conflict_reasons(&report.conflicts);

        for pf in planned {
            if self.cancel.load(Ordering::SeqCst) {
                report.cancelled = true;
                break;
            }

            let mut record = base_record(&pf);
            match (&pf.destination, &pf.plan_error) {
                (_, Some(error)) => {
                    record.status = FileStatus::Failed;
                    record.detail = Some(error.clone());
                }
                (None, None) => record.status = FileStatus::Unresolved,
                (Some(_), None) if conflicted.contains_key(&pf.source) => {
                    record.status = FileStatus::Conflict;
                    record.detail = conflicted.get(&pf.source).cloned();
                }
                (Some(destination), None) => {
                    record.status = FileStatus::Planned;
                    record.sidecars = find_sidecars(
                        &pf.source,
                        &self.config.rules.metadata_extensions,
                        &self.config.rules.extensions,
                    )
                    .into_iter()
                        .map(|(_, suffix)| sidecar_destination(destination, &suffix))
                        .collect();
                }
            }
            report.record(record);
        }
    }

    /// Move files, sequentially or with a worker pool.
    async fn execute(
        &self,
        planned: Vec<PlannedFile>,
        checkpoint: Checkpoint,
        journal: UndoJournal,
        report: &mut RunReport,
    ) {
        let workers = if self.config.rules.parallel_processing {
            self.config.rules.worker_count()
        } else {
            1
        };
        tracing::info!(
            "Executing {} files with {} worker(s)",
            planned.len(),
            workers
        );

        let processor = Arc::new(FileProcessor {
            mover: FileMover::new(MoverConfig::from_config(&self.config, false)),
            metadata_extensions: self.config.rules.metadata_extensions.clone(),
            video_extensions: self.config.rules.extensions.clone(),
            conflicted: conflict_reasons(&report.conflicts),
            run_id: report.run_id,
            state: Mutex::new(SharedState {
                checkpoint,
                journal,
                reserved: HashSet::new(),
                persistence_warnings: Vec::new(),
            }),
        });

        let pb = if self.show_progress {
            let pb = ProgressBar::new(planned.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("█▓░"),
            );
            pb
        } else {
            ProgressBar::hidden()
        };

        let mut results = stream::iter(planned)
            .map(|pf| {
                let processor = processor.clone();
                let cancel = self.cancel.clone();
                async move {
                    // checked at dispatch; a move already running completes
                    if cancel.load(Ordering::SeqCst) {
                        return None;
                    }
                    let source = pf.source.clone();
                    let destination = pf.destination.clone();
                    let record = match tokio::task::spawn_blocking(move || processor.process(pf)).await {
                        Ok(record) => record,
                        Err(e) => FileRecord {
                            source,
                            destination,
                            status: FileStatus::Failed,
                            detail: Some(format!("worker failed: {}", e)),
                            sidecars: Vec::new(),
                            backups: 0,
                            warnings: Vec::new(),
                        },
                    };
                    Some(record)
                }
            })
            .buffer_unordered(workers);

        while let Some(result) = results.next().await {
            match result {
                Some(record) => {
                    pb.set_message(
                        record
                            .source
                            .file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or_default(),
                    );
                    pb.inc(1);
                    report.record(record);
                }
                None => report.cancelled = true,
            }
        }
        pb.finish_and_clear();

        if report.cancelled {
            tracing::warn!("Run cancelled; remaining files were not dispatched");
        }

        // destinations lost to something outside the pre-scan
        let known: HashSet<PathBuf> = report.conflicts.iter().map(|c| c.source.clone()).collect();
        let late: Vec<ConflictRecord> = report
            .files
            .iter()
            .filter(|f| f.status == FileStatus::Conflict && !known.contains(&f.source))
            .filter_map(|f| {
                Some(ConflictRecord {
                    source: f.source.clone(),
                    destination: f.destination.clone()?,
                    reason: f.detail.clone().unwrap_or_default(),
                })
            })
            .collect();
        report.conflicts.extend(late);

        let state = processor.state.lock();
        report
            .persistence_warnings
            .extend(state.persistence_warnings.iter().cloned());
    }
}

/// Convenience entry point: run over `source_root` into `output_root`.
pub async fn run(
    source_root: &Path,
    output_root: &Path,
    config: &Config,
    preview: bool,
) -> Result<RunReport> {
    let mut config = config.clone();
    config.paths.source_dir = source_root.to_path_buf();
    config.paths.output_dir = output_root.to_path_buf();
    RunCoordinator::new(config)?.run(preview).await
}

/// Destinations that already exist or are claimed by more than one file.
pub fn prescan_conflicts(planned: &[PlannedFile]) -> Vec<ConflictRecord> {
    let mut conflicts: Vec<ConflictRecord> = planned
        .iter()
        .filter_map(|pf| {
            let destination = pf.destination.as_ref()?;
            destination.exists().then(|| ConflictRecord {
                source: pf.source.clone(),
                destination: destination.clone(),
                reason: "destination already exists".to_string(),
            })
        })
        .collect();

    let existing: HashSet<PathBuf> = conflicts.iter().map(|c| c.source.clone()).collect();
    let pairs: Vec<(PathBuf, PathBuf)> = planned
        .iter()
        .filter(|pf| !existing.contains(&pf.source))
        .filter_map(|pf| Some((pf.source.clone(), pf.destination.clone()?)))
        .collect();
    conflicts.extend(find_duplicate_targets(&pairs));
    conflicts
}

fn conflict_reasons(conflicts: &[ConflictRecord]) -> HashMap<PathBuf, String> {
    conflicts
        .iter()
        .map(|c| (c.source.clone(), c.reason.clone()))
        .collect()
}

fn base_record(pf: &PlannedFile) -> FileRecord {
    FileRecord {
        source: pf.source.clone(),
        destination: pf.destination.clone(),
        status: FileStatus::Unresolved,
        detail: None,
        sidecars: Vec::new(),
        backups: 0,
        warnings: Vec::new(),
    }
}

/// State shared by all workers.
struct SharedState {
    checkpoint: Checkpoint,
    journal: UndoJournal,
    /// Destinations claimed during this run.
    reserved: HashSet<PathBuf>,
    persistence_warnings: Vec<String>,
}

/// Per-file pipeline executed on a worker.
struct FileProcessor {
    mover: FileMover,
    metadata_extensions: Vec<String>,
    video_extensions: Vec<String>,
    /// Pre-scan conflicts by source, with their reason.
    conflicted: HashMap<PathBuf, String>,
    run_id: uuid::Uuid,
    state: Mutex<SharedState>,
}

impl FileProcessor {
    /// Process one file end to end, then checkpoint it whatever the outcome.
    fn process(&self, pf: PlannedFile) -> FileRecord {
        let record = self.move_planned(&pf);
        self.mark_processed(&pf.source);
        record
    }

    fn move_planned(&self, pf: &PlannedFile) -> FileRecord {
        let mut record = base_record(pf);

        if let Some(error) = &pf.plan_error {
            record.status = FileStatus::Failed;
            record.detail = Some(error.clone());
            return record;
        }
        let Some(destination) = pf.destination.clone() else {
            tracing::info!("Unresolved, skipping: {}", pf.source.display());
            return record;
        };
        if let Some(reason) = self.conflicted.get(&pf.source) {
            tracing::info!("Conflict, skipping: {} ({})", pf.source.display(), reason);
            record.status = FileStatus::Conflict;
            record.detail = Some(reason.clone());
            return record;
        }

        if !self.claim(&destination) {
            tracing::warn!(
                "Destination taken, skipping: {} -> {}",
                pf.source.display(),
                destination.display()
            );
            record.status = FileStatus::Conflict;
            record.detail = Some("destination already taken".to_string());
            return record;
        }

        let op = MoveOperation {
            source: pf.source.clone(),
            destination: destination.clone(),
            kind: MoveKind::PrimaryFile,
        };
        let outcome = match self.mover.execute(&op) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Move failed: {}: {}", pf.source.display(), e);
                record.status = match e {
                    crate::Error::DestinationExists(_) => FileStatus::Conflict,
                    _ => FileStatus::Failed,
                };
                record.detail = Some(e.to_string());
                return record;
            }
        };

        tracing::info!("Moved: {} -> {}", pf.source.display(), destination.display());
        record.status = FileStatus::Moved;
        if outcome.backup.is_some() {
            record.backups += 1;
        }
        if let Some(error) = outcome.backup_error {
            record.warnings.push(format!("backup failed: {}", error));
        }
        self.journal(&op);

        self.move_sidecars(pf, &destination, &mut record);
        record
    }

    /// Move sidecars next to the new primary. Failures only warn.
    fn move_sidecars(&self, pf: &PlannedFile, destination: &Path, record: &mut FileRecord) {
        for (sidecar, suffix) in
            find_sidecars(&pf.source, &self.metadata_extensions, &self.video_extensions)
        {
            let target = sidecar_destination(destination, &suffix);
            if !self.claim(&target) {
                let msg = format!("sidecar destination exists: {}", target.display());
                tracing::warn!("{}", msg);
                record.warnings.push(msg);
                continue;
            }

            let op = MoveOperation {
                source: sidecar.clone(),
                destination: target.clone(),
                kind: MoveKind::MetadataSidecar,
            };
            match self.mover.execute(&op) {
                Ok(outcome) => {
                    if outcome.backup.is_some() {
                        record.backups += 1;
                    }
                    self.journal(&op);
                    record.sidecars.push(target);
                }
                Err(e) => {
                    let msg = format!("sidecar {} not moved: {}", sidecar.display(), e);
                    tracing::warn!("{}", msg);
                    record.warnings.push(msg);
                }
            }
        }
    }

    /// Reserve a destination unless it exists or another file claimed it.
    fn claim(&self, destination: &Path) -> bool {
        let mut state = self.state.lock();
        if destination.exists() || state.reserved.contains(destination) {
            return false;
        }
        state.reserved.insert(destination.to_path_buf());
        true
    }

    fn journal(&self, op: &MoveOperation) {
        let mut entry = UndoLogEntry::moved(op.source.clone(), op.destination.clone(), op.kind);
        entry.run_id = Some(self.run_id);

        let mut state = self.state.lock();
        if let Err(e) = state.journal.append(entry) {
            let msg = format!("undo log write failed: {}", e);
            tracing::error!("{}", msg);
            state.persistence_warnings.push(msg);
        }
    }

    fn mark_processed(&self, source: &Path) {
        let mut state = self.state.lock();
        if let Err(e) = state.checkpoint.mark(source) {
            let msg = format!("checkpoint write failed: {}", e);
            tracing::error!("{}", msg);
            state.persistence_warnings.push(msg);
        }
    }
}
