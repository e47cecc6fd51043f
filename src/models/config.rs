//! Configuration model.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Source, output and state file locations.
    pub paths: PathsConfig,
    /// File selection and execution rules.
    pub rules: RulesConfig,
    /// Filename parsing patterns.
    pub patterns: PatternsConfig,
    /// Title cleanup rules.
    pub cleanup: CleanupConfig,
    /// Naming templates.
    pub naming: NamingConfig,
}

/// Path configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory tree to scan for episode files.
    pub source_dir: PathBuf,
    /// Root of the organized library.
    pub output_dir: PathBuf,
    /// Backup directory. Backups are disabled when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_dir: Option<PathBuf>,
    /// Undo log location.
    pub undo_log_path: PathBuf,
    /// Checkpoint location.
    pub checkpoint_path: PathBuf,
    /// Directory for daily text and JSON log files. Empty disables file logs.
    pub log_dir: PathBuf,
}

/// File selection and execution rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Video extensions to process (with leading dot).
    pub extensions: Vec<String>,
    /// Sidecar extensions that travel with a video.
    pub metadata_extensions: Vec<String>,
    /// Minimum file size in megabytes.
    pub min_size_mb: f64,
    /// Descend into subdirectories.
    pub recursive: bool,
    /// Skip files whose name contains any of these (case-insensitive).
    pub exclude_keywords: Vec<String>,
    /// Prune directories whose name contains any of these (case-insensitive).
    pub exclude_dirs: Vec<String>,
    /// Default to preview mode when neither --preview nor --execute is given.
    pub preview_only: bool,
    /// Attempts for a move before the staging fallback is tried.
    pub max_retry: u32,
    /// Delay between move attempts in milliseconds.
    pub retry_delay_ms: u64,
    /// Process files with a worker pool in execute mode.
    pub parallel_processing: bool,
    /// Worker count. Defaults to the number of CPUs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_workers: Option<usize>,
    /// Append a timestamp to backup file names.
    pub backup_timestamp: bool,
    /// Verify SHA-256 when a move has to copy across filesystems.
    pub verify_checksum: bool,
    /// Print the output tree before and after an executed run.
    pub show_tree: bool,
    /// Levels below the output root shown in the tree.
    pub tree_depth: usize,
}

/// A single parsing rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternRule {
    /// Regular expression.
    pub pattern: String,
    /// Human readable description.
    #[serde(default)]
    pub description: String,
}

/// Ordered parsing rules per category.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternsConfig {
    /// Capture (1) raw title and (2) season token from a filename.
    pub title_season: Vec<PatternRule>,
    /// Capture (1) the episode number.
    pub episode: Vec<PatternRule>,
    /// Capture (1) the season number from a directory name.
    pub dir_season: Vec<PatternRule>,
}

/// A single title cleanup rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplacementRule {
    /// Regular expression to match.
    pub pattern: String,
    /// Replacement text (supports `$1` style group references).
    #[serde(default)]
    pub replacement: String,
    /// Human readable description.
    #[serde(default)]
    pub description: String,
}

/// Ordered title cleanup rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    pub rules: Vec<ReplacementRule>,
}

/// Naming templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    /// Filename template.
    pub pattern: String,
    /// Directory template, `/` separated.
    pub dir_pattern: String,
    /// Maximum bytes per path component.
    pub max_component_bytes: usize,
}

impl Default for PathsConfig {
    fn default() -> Self {
        let base = dirs_config_path();
        Self {
            source_dir: PathBuf::new(),
            output_dir: PathBuf::new(),
            backup_dir: None,
            undo_log_path: base.join("undo_log.json"),
            checkpoint_path: base.join("checkpoint.json"),
            log_dir: base.join("logs"),
        }
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            extensions: strings(&[
                ".mp4", ".mkv", ".avi", ".mov", ".wmv", ".flv", ".ts", ".m2ts", ".rmvb", ".m4v",
                ".webm",
            ]),
            metadata_extensions: strings(&[
                ".nfo", ".srt", ".ass", ".ssa", ".vsmeta", ".jpg", ".png",
            ]),
            min_size_mb: 50.0,
            recursive: true,
            exclude_keywords: strings(&["sample", "trailer", "预告"]),
            exclude_dirs: strings(&["@eaDir", "extras", "sample", "temp"]),
            preview_only: true,
            max_retry: 3,
            retry_delay_ms: 500,
            parallel_processing: false,
            max_workers: None,
            backup_timestamp: false,
            verify_checksum: true,
            show_tree: true,
            tree_depth: 3,
        }
    }
}

impl Default for PatternsConfig {
    fn default() -> Self {
        Self {
            title_season: rules(&[
                (
                    r"^(.+?)(?:[.\s_-](?:19|20)\d{2})?[.\s_-]([Ss]\d{1,2})(?:[Ee.\s_\-\[]|$)",
                    "Title.S01E01 / Title.2019.S01",
                ),
                (
                    r"^(.+?)[.\s_-]+(?i:season|saison)[.\s_-]*(\d{1,2})(?:\D|$)",
                    "Title Season 1",
                ),
                (r"^(.+?)[.\s_-]*第(\d{1,2})季", "标题.第1季"),
                (
                    r"^(.+?)[.\s_-]*第?([一二三四五六七八九十]+)[季部]",
                    "标题.第一季 / 标题二部",
                ),
                (r"^(.+?)[.\s_-]+(\d{1,2})[季部]", "标题 2季"),
            ]),
            episode: rules(&[
                (r"(?i)(?:^|[^a-z])ep?(\d{1,3})(?:\D|$)", "E01 / EP01"),
                (r"第(\d{1,3})[集话話]", "第01集"),
                (r"第([零一二两三四五六七八九十百]+)[集话話]", "第十二集"),
                (r"\[(\d{1,3})(?:[vV]\d)?\]", "[01] / [01v2]"),
                (r"(?i)episode[.\s_-]*(\d{1,3})", "Episode 1"),
                (r"-\s*(\d{1,3})(?:[\s.\[]|$)", "Title - 01"),
                (r"^(\d{1,3})(?:[.\s_-]|$)", "01.mkv"),
                (r"集(\d{1,3})", "集01"),
            ]),
            dir_season: rules(&[
                (r"(?:^|[.\s_\-\[(])[Ss](\d{1,2})(?:[^0-9A-Za-z]|$)", "Title S01"),
                (r"(?i)season[.\s_-]*(\d{1,2})", "Season 1"),
                (r"第(\d{1,2})季", "第1季"),
                (r"第([零一二两三四五六七八九十]+)季", "第一季"),
                (r"(?i)season[.\s_-]*([一二三四五六七八九十]+)", "Season 一"),
            ]),
        }
    }
}

impl Default for CleanupConfig {
    fn default() -> Self {
        let rules = [
            (r"\[[^\]]*\]", " ", "bracketed tags"),
            (r"【[^】]*】", " ", "full-width bracketed tags"),
            (r"[(（]\s*(?:19|20)\d{2}\s*[)）]", " ", "parenthesized year"),
            (r"[._]+", " ", "separators"),
            (
                r"(?i)\b(?:2160p|1080p|1080i|720p|576p|480p|4k|uhd|hdr10\+?|hdr|web-?dl|webrip|bluray|blu-ray|bdrip|brrip|hdtv|dvdrip|hdrip|remux|x26[45]|h ?26[45]|hevc|avc|aac(?: ?[25] [01])?|ac3|dts(?:-hd)?|ddp?(?:[25] [01])?|atmos|10bit|8bit|proper|repack|internal|subbed|dubbed)\b",
                " ",
                "quality, source and codec tags",
            ),
            (
                r"(?i)\b(?:extended|uncut|unrated|director'?s cut|remastered)\b",
                " ",
                "edition markers",
            ),
            (r"导演剪辑版|加长版|未删减版|完整版", " ", "Chinese edition markers"),
            (
                r"中英双字|简繁中字|国语中字|国粤双语|国语|粤语|中字|双语|内封|外挂",
                " ",
                "Chinese audio and subtitle markers",
            ),
            (r"(?:^|\s)-[A-Za-z0-9]{2,}\s*$", " ", "trailing release group"),
            (r"^[\s\-]+|[\s\-]+$", "", "edge dashes"),
        ];

        Self {
            rules: rules
                .iter()
                .map(|(pattern, replacement, description)| ReplacementRule {
                    pattern: pattern.to_string(),
                    replacement: replacement.to_string(),
                    description: description.to_string(),
                })
                .collect(),
        }
    }
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            pattern: "{title}.S{season:02d}.E{episode:02d}{ext}".to_string(),
            dir_pattern: "{title}/Season {season:02d}".to_string(),
            max_component_bytes: 255,
        }
    }
}

impl RulesConfig {
    /// Effective worker count.
    pub fn worker_count(&self) -> usize {
        self.max_workers.unwrap_or_else(num_cpus::get).max(1)
    }

    /// Minimum file size in bytes.
    pub fn min_size_bytes(&self) -> u64 {
        (self.min_size_mb.max(0.0) * 1024.0 * 1024.0) as u64
    }
}

impl Config {
    /// Check required fields and numeric ranges.
    ///
    /// Patterns and templates are validated when they are compiled.
    pub fn validate(&self) -> Result<()> {
        if self.paths.source_dir.as_os_str().is_empty() {
            return Err(invalid("paths.source_dir is not set"));
        }
        if self.paths.output_dir.as_os_str().is_empty() {
            return Err(invalid("paths.output_dir is not set"));
        }
        if self.paths.undo_log_path.as_os_str().is_empty() {
            return Err(invalid("paths.undo_log_path is not set"));
        }
        if self.paths.checkpoint_path.as_os_str().is_empty() {
            return Err(invalid("paths.checkpoint_path is not set"));
        }
        if self.rules.extensions.is_empty() {
            return Err(invalid("rules.extensions must not be empty"));
        }
        if !self.rules.min_size_mb.is_finite() || self.rules.min_size_mb < 0.0 {
            return Err(invalid("rules.min_size_mb must be a non-negative number"));
        }
        if self.rules.max_retry == 0 {
            return Err(invalid("rules.max_retry must be at least 1"));
        }
        if self.rules.tree_depth == 0 {
            return Err(invalid("rules.tree_depth must be at least 1"));
        }
        if self.rules.max_workers == Some(0) {
            return Err(invalid("rules.max_workers must be at least 1"));
        }
        if self.naming.max_component_bytes < 16 {
            return Err(invalid("naming.max_component_bytes must be at least 16"));
        }
        Ok(())
    }
}

fn invalid(msg: &str) -> crate::Error {
    crate::Error::InvalidConfig(msg.to_string())
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn rules(items: &[(&str, &str)]) -> Vec<PatternRule> {
    items
        .iter()
        .map(|(pattern, description)| PatternRule {
            pattern: pattern.to_string(),
            description: description.to_string(),
        })
        .collect()
}

/// Get the configuration directory path.
pub fn dirs_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tvshow_renamer")
}

/// Default configuration file location.
pub fn default_config_path() -> PathBuf {
    dirs_config_path().join("config.toml")
}

/// Load configuration.
///
/// An explicit path must exist and parse. Without one, the default location
/// is used when present and built-in defaults otherwise.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(crate::Error::ConfigNotFound(path.display().to_string()));
            }
            path.to_path_buf()
        }
        None => {
            let path = default_config_path();
            if !path.exists() {
                tracing::debug!("No config at {:?}, using defaults", path);
                return Ok(Config::default());
            }
            path
        }
    };

    let content = std::fs::read_to_string(&path)?;
    let config: Config = toml::from_str(&content)?;
    tracing::debug!("Loaded config from {:?}", path);
    Ok(config)
}

/// Write a configuration document.
pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    crate::utils::fs::ensure_parent(path)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_fail_validation_without_paths() {
        let config = Config::default();
        assert!(matches!(
            config.validate(),
            Err(crate::Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_partial_document_gets_defaults() {
        let config: Config = toml::from_str(
            r#"
            [paths]
            source_dir = "/media/incoming"
            output_dir = "/media/tv"

            [rules]
            min_size_mb = 0
            parallel_processing = true
            "#,
        )
        .unwrap();

        assert_eq!(config.paths.source_dir, PathBuf::from("/media/incoming"));
        assert!(config.rules.parallel_processing);
        assert_eq!(config.rules.max_retry, 3);
        assert_eq!(config.naming.dir_pattern, "{title}/Season {season:02d}");
        assert!(!config.patterns.episode.is_empty());
        assert!(config.rules.show_tree);
        assert_eq!(config.rules.tree_depth, 3);
        assert!(config.paths.log_dir.ends_with("logs"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.paths.source_dir = "/a".into();
        config.paths.output_dir = "/b".into();
        config.paths.backup_dir = Some("/c".into());
        save_config(&config, &path).unwrap();

        let loaded = load_config(Some(&path)).unwrap();
        assert_eq!(loaded.paths.backup_dir, Some(PathBuf::from("/c")));
        assert_eq!(loaded.patterns.title_season, config.patterns.title_season);
        assert_eq!(loaded.cleanup.rules, config.cleanup.rules);
    }

    #[test]
    fn test_missing_explicit_config_is_error() {
        let dir = TempDir::new().unwrap();
        let result = load_config(Some(&dir.path().join("nope.toml")));
        assert!(matches!(result, Err(crate::Error::ConfigNotFound(_))));
    }

    #[test]
    fn test_malformed_config_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[rules\nmin_size_mb = ").unwrap();
        assert!(matches!(
            load_config(Some(&path)),
            Err(crate::Error::TomlDe(_))
        ));
    }

    #[test]
    fn test_min_size_bytes() {
        let mut rules = RulesConfig::default();
        rules.min_size_mb = 1.5;
        assert_eq!(rules.min_size_bytes(), 1_572_864);
    }
}
