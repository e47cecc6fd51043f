//! Compiled pattern table.
//!
//! Every regular expression the parser and normalizer use is compiled once
//! here, from configuration, and handed around by reference.

use crate::models::config::{CleanupConfig, PatternRule, PatternsConfig};
use crate::Result;
use regex::Regex;

/// A compiled parsing rule.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub regex: Regex,
    pub description: String,
}

/// A compiled cleanup rule.
#[derive(Debug, Clone)]
pub struct CompiledReplacement {
    pub regex: Regex,
    pub replacement: String,
}

/// All compiled patterns for one run.
#[derive(Debug, Clone)]
pub struct PatternSet {
    pub title_season: Vec<CompiledRule>,
    pub episode: Vec<CompiledRule>,
    pub dir_season: Vec<CompiledRule>,
    pub cleanup: Vec<CompiledReplacement>,
    pub year: Regex,
    pub resolution: Regex,
    /// First release token (year, season/episode marker, quality) in a name.
    pub release_token: Regex,
    /// Loose `E<digits>` used by the fallback step.
    pub loose_episode: Regex,
}

const YEAR: &str = r"(?:^|[^0-9A-Za-z])((?:19|20)\d{2})(?:[^0-9A-Za-z]|$)";

const RESOLUTION: &str = r"(?i)(?:^|[^0-9A-Za-z])(2160p|1440p|1080p|1080i|720p|576p|480p|4k|uhd)(?:[^0-9A-Za-z]|$)";

const RELEASE_TOKEN: &str = r"(?i)(?:^|[.\s_\-\[(])(?:(?:19|20)\d{2}|s\d{1,2}(?:e\d{1,4})?|ep?\d{1,4}|\d{3,4}[pi]|4k|uhd|hdtv|bluray|blu-ray|bdrip|brrip|web-?dl|webrip|dvdrip|hdrip|x26[45]|h\.?26[45]|hevc)(?:[^0-9a-z]|$)";

const LOOSE_EPISODE: &str = r"(?i)(?:^|[^a-z])ep?(\d{1,4})(?:\D|$)";

impl PatternSet {
    /// Compile patterns and cleanup rules, failing on the first bad regex.
    pub fn compile(patterns: &PatternsConfig, cleanup: &CleanupConfig) -> Result<Self> {
        let cleanup = cleanup
            .rules
            .iter()
            .map(|rule| {
                Ok(CompiledReplacement {
                    regex: compile_one("cleanup", &rule.pattern)?,
                    replacement: rule.replacement.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            title_season: compile_rules("title_season", &patterns.title_season)?,
            episode: compile_rules("episode", &patterns.episode)?,
            dir_season: compile_rules("dir_season", &patterns.dir_season)?,
            cleanup,
            year: compile_one("builtin", YEAR)?,
            resolution: compile_one("builtin", RESOLUTION)?,
            release_token: compile_one("builtin", RELEASE_TOKEN)?,
            loose_episode: compile_one("builtin", LOOSE_EPISODE)?,
        })
    }
}

fn compile_rules(category: &str, rules: &[PatternRule]) -> Result<Vec<CompiledRule>> {
    let compiled = rules
        .iter()
        .map(|rule| {
            let regex = compile_one(category, &rule.pattern)?;
            if regex.captures_len() < 2 {
                return Err(crate::Error::InvalidPattern {
                    category: category.to_string(),
                    pattern: rule.pattern.clone(),
                    reason: "pattern needs at least one capture group".to_string(),
                });
            }
            Ok(CompiledRule {
                regex,
                description: rule.description.clone(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    // title_season rules capture both title and season
    if category == "title_season" {
        if let Some(rule) = compiled.iter().find(|r| r.regex.captures_len() < 3) {
            return Err(crate::Error::InvalidPattern {
                category: category.to_string(),
                pattern: rule.regex.as_str().to_string(),
                reason: "pattern needs title and season capture groups".to_string(),
            });
        }
    }

    Ok(compiled)
}

fn compile_one(category: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| crate::Error::InvalidPattern {
        category: category.to_string(),
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_patterns_compile() {
        let set = PatternSet::compile(&PatternsConfig::default(), &CleanupConfig::default()).unwrap();
        assert_eq!(set.title_season.len(), 5);
        assert!(!set.episode.is_empty());
        assert!(!set.cleanup.is_empty());
    }

    #[test]
    fn test_malformed_pattern_is_reported() {
        let mut patterns = PatternsConfig::default();
        patterns.episode.push(PatternRule {
            pattern: r"E(\d+".to_string(),
            description: "broken".to_string(),
        });

        let err = PatternSet::compile(&patterns, &CleanupConfig::default()).unwrap_err();
        match err {
            crate::Error::InvalidPattern { category, .. } => assert_eq!(category, "episode"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_title_season_needs_two_groups() {
        let mut patterns = PatternsConfig::default();
        patterns.title_season = vec![PatternRule {
            pattern: r"^(.+)S\d+".to_string(),
            description: String::new(),
        }];
        assert!(PatternSet::compile(&patterns, &CleanupConfig::default()).is_err());
    }

    #[test]
    fn test_year_and_resolution() {
        let set = PatternSet::compile(&PatternsConfig::default(), &CleanupConfig::default()).unwrap();
        let caps = set.year.captures("Show.2019.S01E01.1080p").unwrap();
        assert_eq!(&caps[1], "2019");
        assert!(set.year.captures("Show.S01E01.1080p.x264").is_none());

        let caps = set.resolution.captures("Show.S01E01.1080p.WEB").unwrap();
        assert_eq!(&caps[1], "1080p");
    }
}
