//! Title normalizer.
//!
//! Turns a raw title fragment such as `[Group] Show.Name.1080p.x264-GRP` into
//! a display title. Cleanup rules run in configured order; if the result
//! contains Chinese text, only the Chinese runs plus any meaningful remainder
//! are kept.

use crate::core::patterns::PatternSet;
use crate::utils::chinese;

/// Normalize a raw title.
///
/// Returns an empty string when nothing meaningful is left.
pub fn normalize_title(raw: &str, patterns: &PatternSet) -> String {
    let mut text = raw.to_string();
    for rule in &patterns.cleanup {
        text = rule
            .regex
            .replace_all(&text, rule.replacement.as_str())
            .into_owned();
    }

    let text = collapse_whitespace(&text);

    if !chinese::contains_chinese(&text) {
        return text;
    }

    let (runs, remainder) = chinese::split_chinese_runs(&text);
    let mut title = runs.concat();

    let remainder = collapse_whitespace(&remainder);
    let remainder = remainder.trim_matches(|c: char| !c.is_alphanumeric());
    if !remainder.is_empty() {
        title.push(' ');
        title.push_str(remainder);
    }

    title
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
