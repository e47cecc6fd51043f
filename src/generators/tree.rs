//! Plain-text directory tree of a library.
//!
//! Lists directories and video files below a root, sorted by name and cut
//! off at a fixed depth. Hidden entries (including the staging directory)
//! are left out.

use crate::core::mover::normalize_extension;
use crate::utils::fs::{dotted_extension, ensure_directory};
use crate::Result;
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

/// Depth used when none is configured.
pub const DEFAULT_TREE_DEPTH: usize = 3;

struct Line {
    depth: usize,
    name: String,
    last: bool,
}

/// Render the tree under `root`, `max_depth` levels deep.
///
/// Only files whose extension is in `extensions` are listed. Fails when
/// `root` is missing or not a directory.
pub fn render_tree(root: &Path, max_depth: usize, extensions: &[String]) -> Result<String> {
    ensure_directory(root)?;
    let extensions: Vec<String> = extensions.iter().map(|e| normalize_extension(e)).collect();

    let mut lines: Vec<Line> = WalkDir::new(root)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_hidden(entry))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!("Tree walk error: {}", e);
                None
            }
        })
        .filter(|entry| {
            entry.file_type().is_dir()
                || dotted_extension(entry.path())
                    .map(|ext| extensions.contains(&ext))
                    .unwrap_or(false)
        })
        .map(|entry| {
            let mut name = entry.file_name().to_string_lossy().into_owned();
            if entry.file_type().is_dir() {
                name.push('/');
            }
            Line {
                depth: entry.depth(),
                name,
                last: false,
            }
        })
        .collect();

    // walking backwards, an entry is last unless a sibling follows it
    let mut sibling_after = vec![false; max_depth + 2];
    for line in lines.iter_mut().rev() {
        line.last = !sibling_after[line.depth];
        sibling_after[line.depth] = true;
        for deeper in sibling_after.iter_mut().skip(line.depth + 1) {
            *deeper = false;
        }
    }

    let root_name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string());
    let mut out = format!("{}/\n", root_name);

    let mut open: Vec<bool> = Vec::new();
    for line in &lines {
        open.truncate(line.depth - 1);
        for ancestor_last in &open {
            out.push_str(if *ancestor_last { "    " } else { "│   " });
        }
        out.push_str(if line.last { "└── " } else { "├── " });
        out.push_str(&line.name);
        out.push('\n');
        open.push(line.last);
    }
    Ok(out)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}
