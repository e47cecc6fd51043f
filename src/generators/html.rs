//! HTML run report generator.

use crate::models::report::{FileStatus, RunReport};
use crate::utils::fs::ensure_parent;
use crate::Result;
use std::path::Path;

/// Render a self-contained HTML page for a run.
pub fn render_report(report: &RunReport) -> String {
    let c = &report.counters;
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("  <meta charset=\"utf-8\">\n");
    html.push_str(&format!(
        "  <title>TV show renamer report {}</title>\n",
        report.run_id
    ));
    html.push_str("  <style>\n");
    html.push_str("    body { font-family: sans-serif; margin: 2em; }\n");
    html.push_str("    table { border-collapse: collapse; width: 100%; }\n");
    html.push_str("    th, td { border: 1px solid #ccc; padding: 4px 8px; text-align: left; }\n");
    html.push_str("    .moved, .planned { color: #2a7a2a; }\n");
    html.push_str("    .unresolved, .conflict { color: #a36b00; }\n");
    html.push_str("    .failed { color: #b00020; }\n");
    html.push_str("  </style>\n</head>\n<body>\n");

    let mode = if report.preview { "Preview" } else { "Run" };
    html.push_str(&format!("<h1>{} report</h1>\n", mode));
    html.push_str("<ul>\n");
    html.push_str(&format!("  <li>Run ID: {}</li>\n", report.run_id));
    html.push_str(&format!(
        "  <li>Started: {}</li>\n",
        report.started_at.format("%Y-%m-%d %H:%M:%S")
    ));
    html.push_str(&format!(
        "  <li>Finished: {}</li>\n",
        report.finished_at.format("%Y-%m-%d %H:%M:%S")
    ));
    html.push_str(&format!(
        "  <li>Source: {}</li>\n",
        escape_html(&report.source_root.display().to_string())
    ));
    html.push_str(&format!(
        "  <li>Output: {}</li>\n",
        escape_html(&report.output_root.display().to_string())
    ));
    if report.cancelled {
        html.push_str("  <li class=\"failed\">Cancelled before all files were processed</li>\n");
    }
    html.push_str("</ul>\n");

    // Counters
    html.push_str("<h2>Summary</h2>\n<table>\n");
    let rows = [
        ("Processed", c.processed),
        ("Moved", c.moved),
        ("Sidecars moved", c.sidecars_moved),
        ("Skipped", c.skipped),
        ("Conflicts", c.conflicts),
        ("Errors", c.errors),
        ("Backups created", c.backups_created),
        ("Already processed", report.checkpointed),
    ];
    for (label, value) in rows {
        html.push_str(&format!("  <tr><th>{}</th><td>{}</td></tr>\n", label, value));
    }
    if report.preview {
        html.push_str(&format!(
            "  <tr><th>Would move</th><td>{}</td></tr>\n",
            report.files_with(FileStatus::Planned).count()
        ));
    }
    html.push_str("</table>\n");

    if !report.conflicts.is_empty() {
        html.push_str("<h2>Conflicts</h2>\n<table>\n");
        html.push_str("  <tr><th>Source</th><th>Destination</th><th>Reason</th></tr>\n");
        for conflict in &report.conflicts {
            html.push_str(&format!(
                "  <tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                escape_html(&conflict.source.display().to_string()),
                escape_html(&conflict.destination.display().to_string()),
                escape_html(&conflict.reason)
            ));
        }
        html.push_str("</table>\n");
    }

    html.push_str("<h2>Files</h2>\n<table>\n");
    html.push_str("  <tr><th>Status</th><th>Source</th><th>Destination</th><th>Notes</th></tr>\n");
    for file in &report.files {
        let destination = file
            .destination
            .as_ref()
            .map(|d| d.display().to_string())
            .unwrap_or_default();

        let mut notes: Vec<String> = Vec::new();
        if let Some(detail) = &file.detail {
            notes.push(detail.clone());
        }
        for sidecar in &file.sidecars {
            notes.push(format!("+ {}", sidecar.display()));
        }
        notes.extend(file.warnings.iter().cloned());
        let notes: Vec<String> = notes.iter().map(|n| escape_html(n)).collect();

        html.push_str(&format!(
            "  <tr class=\"{status}\"><td>{status}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape_html(&file.source.display().to_string()),
            escape_html(&destination),
            notes.join("<br>"),
            status = file.status,
        ));
    }
    html.push_str("</table>\n");

    if !report.persistence_warnings.is_empty() {
        html.push_str("<h2 class=\"failed\">State files not fully written</h2>\n<ul>\n");
        for warning in &report.persistence_warnings {
            html.push_str(&format!("  <li>{}</li>\n", escape_html(warning)));
        }
        html.push_str("</ul>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

/// Render and write the report to `path`.
pub fn write_report(report: &RunReport, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    std::fs::write(path, render_report(report))?;
    tracing::info!("HTML report written to {}", path.display());
    Ok(())
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::report::FileRecord;
    use std::path::PathBuf;

    fn record(source: &str, status: FileStatus) -> FileRecord {
        FileRecord {
            source: PathBuf::from(source),
            destination: Some(PathBuf::from("/out/Show/Season 01/Show.S01.E01.mkv")),
            status,
            detail: None,
            sidecars: Vec::new(),
            backups: 0,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a & 'b'>"), "&lt;a &amp; &#39;b&#39;&gt;");
    }

    #[test]
    fn test_render_report_lists_files() {
        let mut report = RunReport::new(false, PathBuf::from("/src"), PathBuf::from("/out"));
        report.record(record("/src/Show.S01E01.mkv", FileStatus::Moved));
        report.record(record("/src/Tom & Jerry <1>.mkv", FileStatus::Failed));

        let html = render_report(&report);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<h1>Run report</h1>"));
        assert!(html.contains("<tr class=\"moved\"><td>moved</td>"));
        assert!(html.contains("Tom &amp; Jerry &lt;1&gt;.mkv"));
        assert!(!html.contains("Tom & Jerry"));
    }

    #[test]
    fn test_preview_report_counts_planned() {
        let mut report = RunReport::new(true, PathBuf::from("/src"), PathBuf::from("/out"));
        report.record(record("/src/a.mkv", FileStatus::Planned));

        let html = render_report(&report);
        assert!(html.contains("<h1>Preview report</h1>"));
        assert!(html.contains("<tr><th>Would move</th><td>1</td></tr>"));
    }
}
