//! Filename parser module.
//!
//! Extracts title, season and episode from episode filenames using an ordered
//! fallback chain:
//! - Directory: season from the enclosing directory (`Show/Season 2/05.mkv`)
//! - Filename: title and season from the name itself (`Show.S02E05.mkv`)
//! - Fallback: title up to the first release token, season 1, loose `E05`
//!
//! A file only resolves when a non-empty title and an episode number are both
//! found. Nothing is guessed.

use crate::core::normalizer::normalize_title;
use crate::core::patterns::PatternSet;
use crate::models::media::{DirContext, ParseStrategy, ParsedMediaInfo};
use crate::utils::chinese::{parse_chinese_number, parse_number_token};
use std::path::Path;
use std::sync::Arc;

/// Separators trimmed from the front of a filename remainder.
const SEPARATORS: &[char] = &['.', ' ', '_', '-'];

/// Title, season, episode and the step that found them.
type Resolved = (String, u32, u32, ParseStrategy);

/// Rule-based filename parser.
#[derive(Debug, Clone)]
pub struct FilenameParser {
    patterns: Arc<PatternSet>,
}

impl FilenameParser {
    /// Create a parser over a compiled pattern table.
    pub fn new(patterns: Arc<PatternSet>) -> Self {
        Self { patterns }
    }

    /// Pattern table used by this parser.
    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    /// Parse a file name, with optional surrounding directory names.
    ///
    /// Returns `None` when the file cannot be resolved.
    pub fn parse(&self, file_name: &str, ctx: &DirContext) -> Option<ParsedMediaInfo> {
        let (stem, extension) = split_extension(file_name);

        let (title, season, episode, strategy) = self
            .from_directory(stem, ctx)
            .or_else(|| self.from_filename(stem))
            .or_else(|| self.from_fallback(stem))?;

        let year = self.year(stem).or_else(|| {
            [ctx.immediate.as_deref(), ctx.parent.as_deref()]
                .into_iter()
                .flatten()
                .find_map(|name| self.year(name))
        });

        let info = ParsedMediaInfo {
            title,
            season,
            episode,
            year,
            resolution: self.resolution(stem),
            extension: extension.to_string(),
            strategy,
        };
        tracing::debug!(
            "Parsed {:?} via {}: {} S{:02}E{:02}",
            file_name,
            info.strategy,
            info.title,
            info.season,
            info.episode
        );
        Some(info)
    }

    /// Parse the file at `path`, using directories below `root` as context.
    pub fn parse_path(&self, path: &Path, root: &Path) -> Option<ParsedMediaInfo> {
        let file_name = path.file_name()?.to_str()?;
        self.parse(file_name, &DirContext::for_file(path, root))
    }

    /// Season from the immediate directory, then the parent directory.
    fn from_directory(&self, stem: &str, ctx: &DirContext) -> Option<Resolved> {
        let immediate = ctx
            .immediate
            .as_deref()
            .and_then(|name| self.dir_season(name).map(|(s, i)| (s, &name[..i])));

        let (season, title) = if let Some((season, prefix)) = immediate {
            let mut title = self.clean(prefix);
            // `Show/Season 2/...`: the season directory carries no title
            if title.is_empty() {
                if let Some(parent) = ctx.parent.as_deref() {
                    title = self.clean(self.strip_dir_season(parent));
                }
            }
            (season, title)
        } else {
            let parent = ctx.parent.as_deref()?;
            let (season, start) = self.dir_season(parent)?;
            (season, self.clean(&parent[..start]))
        };

        if title.is_empty() {
            return None;
        }
        let episode = self.episode(stem)?;
        Some((title, season, episode, ParseStrategy::Directory))
    }

    /// Title and season captured from the filename; episode from what follows.
    fn from_filename(&self, stem: &str) -> Option<Resolved> {
        for rule in &self.patterns.title_season {
            let Some(caps) = rule.regex.captures(stem) else {
                continue;
            };
            let (Some(raw_title), Some(season_token)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            let Some(season) = parse_number_token(season_token.as_str()).filter(|s| *s >= 1) else {
                continue;
            };
            let title = self.clean(raw_title.as_str());
            if title.is_empty() {
                continue;
            }

            tracing::trace!("title_season rule matched: {}", rule.description);
            let remainder = stem[season_token.end()..].trim_start_matches(SEPARATORS);
            let Some(episode) = self.episode(remainder) else {
                continue;
            };
            return Some((title, season, episode, ParseStrategy::Filename));
        }
        None
    }

    /// Title up to the first release token, season 1, loose episode marker.
    fn from_fallback(&self, stem: &str) -> Option<Resolved> {
        let cut = self
            .patterns
            .release_token
            .find(stem)
            .map(|m| m.start())
            .unwrap_or(stem.len());
        let title = self.clean(&stem[..cut]);
        if title.is_empty() {
            return None;
        }

        let episode = self
            .patterns
            .loose_episode
            .captures(stem)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .filter(|e| *e >= 1)?;

        Some((title, 1, episode, ParseStrategy::Fallback))
    }

    /// First directory-season rule that yields a season, with the match start.
    fn dir_season(&self, name: &str) -> Option<(u32, usize)> {
        self.patterns.dir_season.iter().find_map(|rule| {
            let caps = rule.regex.captures(name)?;
            let season = parse_number_token(caps.get(1)?.as_str()).filter(|s| *s >= 1)?;
            Some((season, caps.get(0)?.start()))
        })
    }

    fn strip_dir_season<'a>(&self, name: &'a str) -> &'a str {
        match self.dir_season(name) {
            Some((_, start)) => &name[..start],
            None => name,
        }
    }

    /// First episode rule that yields an episode number.
    pub fn episode(&self, text: &str) -> Option<u32> {
        self.patterns.episode.iter().find_map(|rule| {
            let token = rule.regex.captures(text)?.get(1)?.as_str();
            let value = if token.chars().all(|c| c.is_ascii_digit()) {
                token.parse().ok()
            } else {
                parse_chinese_number(token)
            };
            value.filter(|e| *e >= 1)
        })
    }

    fn year(&self, text: &str) -> Option<u16> {
        self.patterns
            .year
            .captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }

    fn resolution(&self, text: &str) -> Option<String> {
        let token = self.patterns.resolution.captures(text)?.get(1)?.as_str();
        let lower = token.to_lowercase();
        Some(match lower.as_str() {
            "4k" | "uhd" => lower.to_uppercase(),
            _ => lower,
        })
    }

    fn clean(&self, raw: &str) -> String {
        normalize_title(raw, &self.patterns)
    }
}

/// Split a file name into stem and dotted extension.
///
/// Anything after the last dot that does not look like an extension (too
/// long or containing punctuation) stays part of the stem.
pub fn split_extension(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => {
            let ext = &file_name[idx + 1..];
            if !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
                (&file_name[..idx], &file_name[idx..])
            } else {
                (file_name, "")
            }
        }
        _ => (file_name, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::{CleanupConfig, PatternRule, PatternsConfig};

    fn parser() -> FilenameParser {
        let patterns = PatternSet::compile(&PatternsConfig::default(), &CleanupConfig::default()).unwrap();
        FilenameParser::new(Arc::new(patterns))
    }

    fn parse(name: &str) -> Option<ParsedMediaInfo> {
        parser().parse(name, &DirContext::default())
    }

    fn dirs(immediate: &str, parent: Option<&str>) -> DirContext {
        DirContext {
            immediate: Some(immediate.to_string()),
            parent: parent.map(str::to_string),
        }
    }

    #[test]
    fn test_rule_without_episode_falls_through() {
        let mut config = PatternsConfig::default();
        config.title_season.insert(
            0,
            PatternRule {
                pattern: r"^(.+?)\.(\d{1,2})$".to_string(),
                description: "trailing number as season".to_string(),
            },
        );
        let patterns = PatternSet::compile(&config, &CleanupConfig::default()).unwrap();
        let parser = FilenameParser::new(Arc::new(patterns));

        let info = parser
            .parse("Show.S02E05.Extra.1.mkv", &DirContext::default())
            .unwrap();
        assert_eq!(info.title, "Show");
        assert_eq!(info.season, 2);
        assert_eq!(info.episode, 5);
        assert_eq!(info.strategy, ParseStrategy::Filename);
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("a.S01E01.mkv"), ("a.S01E01", ".mkv"));
        assert_eq!(split_extension("Show.MP4"), ("Show", ".MP4"));
        assert_eq!(split_extension("Show.x264-GROUP"), ("Show.x264-GROUP", ""));
        assert_eq!(split_extension(".hidden"), (".hidden", ""));
    }

    #[test]
    fn test_standard_sxxexx() {
        let info = parse("Game.of.Thrones.S01E01.1080p.BluRay.x264-DEMAND.mkv").unwrap();
        assert_eq!(info.title, "Game of Thrones");
        assert_eq!(info.season, 1);
        assert_eq!(info.episode, 1);
        assert_eq!(info.resolution.as_deref(), Some("1080p"));
        assert_eq!(info.year, None);
        assert_eq!(info.extension, ".mkv");
        assert_eq!(info.strategy, ParseStrategy::Filename);
    }

    #[test]
    fn test_year_between_title_and_season() {
        let info = parse("The.Mandalorian.2019.S02E05.2160p.WEB-DL.mkv").unwrap();
        assert_eq!(info.title, "The Mandalorian");
        assert_eq!(info.season, 2);
        assert_eq!(info.episode, 5);
        assert_eq!(info.year, Some(2019));
        assert_eq!(info.resolution.as_deref(), Some("2160p"));
    }

    #[test]
    fn test_chinese_season_and_episode() {
        let info = parse("庆余年.第一季.第01集.1080p.WEB-DL.x264.mp4").unwrap();
        assert_eq!(info.title, "庆余年");
        assert_eq!(info.season, 1);
        assert_eq!(info.episode, 1);

        let info = parse("三体.第二季.第十二集.mp4").unwrap();
        assert_eq!(info.title, "三体");
        assert_eq!(info.season, 2);
        assert_eq!(info.episode, 12);
    }

    #[test]
    fn test_season_word() {
        let info = parse("Friends Season 3 Episode 12.avi").unwrap();
        assert_eq!(info.title, "Friends");
        assert_eq!(info.season, 3);
        assert_eq!(info.episode, 12);
    }

    #[test]
    fn test_extension_preserved_verbatim() {
        let info = parse("Dark.S01E03.MKV").unwrap();
        assert_eq!(info.extension, ".MKV");
    }

    #[test]
    fn test_directory_season_with_title_in_parent() {
        let info = parser()
            .parse("05.mkv", &dirs("Season 2", Some("Breaking Bad")))
            .unwrap();
        assert_eq!(info.title, "Breaking Bad");
        assert_eq!(info.season, 2);
        assert_eq!(info.episode, 5);
        assert_eq!(info.strategy, ParseStrategy::Directory);
    }

    #[test]
    fn test_directory_season_chinese() {
        let info = parser()
            .parse("第05集.mp4", &dirs("庆余年 第二季", None))
            .unwrap();
        assert_eq!(info.title, "庆余年");
        assert_eq!(info.season, 2);
        assert_eq!(info.episode, 5);
    }

    #[test]
    fn test_directory_wins_over_filename() {
        let info = parser()
            .parse("Other.S05E03.mkv", &dirs("Show Name S02", None))
            .unwrap();
        assert_eq!(info.strategy, ParseStrategy::Directory);
        assert_eq!(info.title, "Show Name");
        assert_eq!(info.season, 2);
        assert_eq!(info.episode, 3);
    }

    #[test]
    fn test_directory_without_episode_falls_through() {
        // no episode in the stem, so no step can resolve it
        let result = parser().parse("Extras.mkv", &dirs("Show S02", None));
        assert!(result.is_none());
    }

    #[test]
    fn test_fallback_loose_episode() {
        let info = parse("Some Show E07 720p.mkv").unwrap();
        assert_eq!(info.strategy, ParseStrategy::Fallback);
        assert_eq!(info.title, "Some Show");
        assert_eq!(info.season, 1);
        assert_eq!(info.episode, 7);
    }

    #[test]
    fn test_unresolvable_names() {
        assert!(parse("random_video_clip.mp4").is_none());
        assert!(parse("Show.S02.1080p.mkv").is_none());
        assert!(parse("S01E01.mkv").is_none());
    }

    #[test]
    fn test_episode_patterns() {
        let p = parser();
        assert_eq!(p.episode("E12.1080p"), Some(12));
        assert_eq!(p.episode("EP03"), Some(3));
        assert_eq!(p.episode("第08话"), Some(8));
        assert_eq!(p.episode("[07v2]"), Some(7));
        assert_eq!(p.episode("Show - 11 [720p]"), Some(11));
        assert_eq!(p.episode("1080p.WEB"), None);
        assert_eq!(p.episode("E00"), None);
    }
}
