//! Checkpoint of processed source files.
//!
//! A JSON list of absolute source paths. Loaded once per run, updated in
//! memory and rewritten atomically after every file.

use crate::utils::fs::write_json_atomic;
use crate::Result;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Persisted set of processed source paths.
#[derive(Debug, Clone, Default)]
pub struct Checkpoint {
    path: PathBuf,
    processed: BTreeSet<PathBuf>,
}

impl Checkpoint {
    /// Load the checkpoint at `path`. A missing file is an empty checkpoint.
    pub fn load(path: &Path) -> Result<Self> {
        let processed = if path.exists() {
            let content = fs::read_to_string(path)?;
            if content.trim().is_empty() {
                BTreeSet::new()
            } else {
                serde_json::from_str(&content).map_err(|e| {
                    crate::Error::InvalidCheckpoint(format!("{}: {}", path.display(), e))
                })?
            }
        } else {
            BTreeSet::new()
        };

        tracing::debug!("Checkpoint {:?}: {} entries", path, processed.len());
        Ok(Self {
            path: path.to_path_buf(),
            processed,
        })
    }

    /// Whether `source` has been processed.
    pub fn contains(&self, source: &Path) -> bool {
        self.processed.contains(source)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.processed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processed.is_empty()
    }

    /// Record `source` as processed and persist.
    pub fn mark(&mut self, source: &Path) -> Result<()> {
        if self.processed.insert(source.to_path_buf()) {
            self.save()?;
        }
        Ok(())
    }

    /// Forget `sources` (e.g. after undo restored them) and persist.
    pub fn forget<'a, I>(&mut self, sources: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a PathBuf>,
    {
        let removed = sources
            .into_iter()
            .filter(|p| self.processed.remove(p.as_path()))
            .count();
        if removed > 0 {
            self.save()?;
        }
        Ok(removed)
    }

    /// Write the checkpoint to disk.
    pub fn save(&self) -> Result<()> {
        write_json_atomic(&self.processed, &self.path)
    }
}
