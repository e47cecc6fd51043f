//! Path planner module.
//!
//! Renders the directory and filename templates for a parsed episode and
//! produces a sanitized destination under the output root. The same input
//! always yields the same path.

use crate::generators::template::Template;
use crate::models::config::NamingConfig;
use crate::models::media::ParsedMediaInfo;
use crate::models::report::ConflictRecord;
use crate::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Characters that are not allowed in a path component.
const FORBIDDEN: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Destination path planner.
#[derive(Debug, Clone)]
pub struct PathPlanner {
    output_root: PathBuf,
    dir_templates: Vec<Template>,
    file_template: Template,
    max_component_bytes: usize,
}

impl PathPlanner {
    /// Create a planner, parsing both templates.
    pub fn new(naming: &NamingConfig, output_root: &Path) -> Result<Self> {
        let dir_templates = naming
            .dir_pattern
            .split('/')
            .filter(|part| !part.trim().is_empty())
            .map(Template::parse)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            output_root: output_root.to_path_buf(),
            dir_templates,
            file_template: Template::parse(&naming.pattern)?,
            max_component_bytes: naming.max_component_bytes,
        })
    }

    /// Output root all destinations are placed under.
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Destination relative to the output root.
    pub fn relative_path(&self, info: &ParsedMediaInfo) -> Result<PathBuf> {
        let mut path = PathBuf::new();

        // each directory component is rendered on its own so a '/' in a
        // title can never add a level
        for template in &self.dir_templates {
            let component = sanitize_component(&template.render(info));
            if component.is_empty() || component.chars().all(|c| c == '.') {
                continue;
            }
            path.push(truncate_bytes(&component, self.max_component_bytes));
        }

        let file_name = sanitize_component(&self.file_template.render(info));
        let file_name = truncate_file_name(&file_name, &info.extension, self.max_component_bytes);
        if file_name.is_empty() || file_name.chars().all(|c| c == '.') {
            return Err(crate::Error::InvalidTemplate {
                template: self.file_template.as_str().to_string(),
                reason: format!("renders to an empty filename for '{}'", info.title),
            });
        }
        path.push(file_name);

        Ok(path)
    }

    /// Absolute destination for a parsed episode.
    pub fn plan(&self, info: &ParsedMediaInfo) -> Result<PathBuf> {
        Ok(self.output_root.join(self.relative_path(info)?))
    }
}

/// Strip forbidden and control characters and collapse whitespace.
pub fn sanitize_component(s: &str) -> String {
    let cleaned: String = s
        .chars()
        .filter(|c| !FORBIDDEN.contains(c) && !c.is_control())
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate to at most `max` bytes on a character boundary.
fn truncate_bytes(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].trim_end().to_string()
}

/// Truncate a file name to `max` bytes, keeping `extension` intact.
fn truncate_file_name(name: &str, extension: &str, max: usize) -> String {
    if name.len() <= max {
        return name.to_string();
    }
    let ext = if !extension.is_empty() && name.ends_with(extension) && extension.len() < max {
        extension
    } else {
        ""
    };
    let stem = &name[..name.len() - ext.len()];
    let stem = truncate_bytes(stem, max - ext.len());
    format!("{}{}", stem.trim_end_matches(['.', ' ']), ext)
}

/// Find destinations claimed by more than one source.
pub fn find_duplicate_targets(planned: &[(PathBuf, PathBuf)]) -> Vec<ConflictRecord> {
    let mut target_to_sources: HashMap<&Path, Vec<&Path>> = HashMap::new();
    for (source, destination) in planned {
        target_to_sources
            .entry(destination.as_path())
            .or_default()
            .push(source.as_path());
    }

    let mut conflicts: Vec<ConflictRecord> = target_to_sources
        .into_iter()
        .filter(|(_, sources)| sources.len() > 1)
        .flat_map(|(target, sources)| {
            let count = sources.len();
            // the first claimant is allowed to proceed
            sources.into_iter().skip(1).map(move |source| ConflictRecord {
                source: source.to_path_buf(),
                destination: target.to_path_buf(),
                reason: format!("{} files resolve to this destination", count),
            })
        })
        .collect();
    conflicts.sort_by(|a, b| a.source.cmp(&b.source));
    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::media::ParseStrategy;

    fn info(title: &str) -> ParsedMediaInfo {
        ParsedMediaInfo {
            title: title.to_string(),
            season: 1,
            episode: 1,
            year: None,
            resolution: None,
            extension: ".mkv".to_string(),
            strategy: ParseStrategy::Filename,
        }
    }

    fn planner() -> PathPlanner {
        PathPlanner::new(&NamingConfig::default(), Path::new("/library")).unwrap()
    }

    #[test]
    fn test_default_layout() {
        let path = planner().plan(&info("Game of Thrones")).unwrap();
        assert_eq!(
            path,
            PathBuf::from("/library/Game of Thrones/Season 01/Game of Thrones.S01.E01.mkv")
        );
    }

    #[test]
    fn test_plan_is_deterministic() {
        let p = planner();
        let i = info("庆余年");
        assert_eq!(p.plan(&i).unwrap(), p.plan(&i).unwrap());
    }

    #[test]
    fn test_forbidden_characters_stripped() {
        let path = planner().relative_path(&info("AC/DC: Live?")).unwrap();
        assert_eq!(path, PathBuf::from("ACDC Live/Season 01/ACDC Live.S01.E01.mkv"));
    }

    #[test]
    fn test_long_names_truncated_keeping_extension() {
        let mut naming = NamingConfig::default();
        naming.max_component_bytes = 40;
        let p = PathPlanner::new(&naming, Path::new("/lib")).unwrap();

        let rel = p.relative_path(&info(&"很长的标题".repeat(10))).unwrap();
        for component in rel.components() {
            assert!(component.as_os_str().len() <= 40);
        }
        assert!(rel.to_string_lossy().ends_with(".mkv"));
    }

    #[test]
    fn test_empty_components_dropped() {
        let mut naming = NamingConfig::default();
        naming.dir_pattern = "{resolution}/{title}".to_string();
        let p = PathPlanner::new(&naming, Path::new("/lib")).unwrap();
        let rel = p.relative_path(&info("Dark")).unwrap();
        assert_eq!(rel, PathBuf::from("Dark/Dark.S01.E01.mkv"));
    }

    #[test]
    fn test_find_duplicate_targets() {
        let planned = vec![
            (PathBuf::from("/src/a.mkv"), PathBuf::from("/out/x.mkv")),
            (PathBuf::from("/src/b.mkv"), PathBuf::from("/out/x.mkv")),
            (PathBuf::from("/src/c.mkv"), PathBuf::from("/out/y.mkv")),
        ];
        let conflicts = find_duplicate_targets(&planned);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].source, PathBuf::from("/src/b.mkv"));
    }
}
