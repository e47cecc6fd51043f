//! Pattern and template compilation checks.

use super::CheckResult;
use crate::core::patterns::PatternSet;
use crate::core::planner::PathPlanner;
use crate::models::config::Config;

/// All configured patterns compile.
pub fn check_patterns(config: &Config) -> CheckResult {
    match PatternSet::compile(&config.patterns, &config.cleanup) {
        Ok(set) => CheckResult::pass(
            "patterns",
            format!(
                "{} rules compiled",
                set.title_season.len() + set.episode.len() + set.dir_season.len() + set.cleanup.len()
            ),
        )
        .with_detail(format!("title/season: {}", set.title_season.len()))
        .with_detail(format!("episode: {}", set.episode.len()))
        .with_detail(format!("directory season: {}", set.dir_season.len()))
        .with_detail(format!("cleanup: {}", set.cleanup.len())),
        Err(e) => CheckResult::fail(
            "patterns",
            e.to_string(),
            "Fix the regex in [patterns] or [cleanup]",
        ),
    }
}

/// Both naming templates parse.
pub fn check_templates(config: &Config) -> CheckResult {
    match PathPlanner::new(&config.naming, &config.paths.output_dir) {
        Ok(_) => CheckResult::pass("naming", "templates parsed")
            .with_detail(format!("directory: {}", config.naming.dir_pattern))
            .with_detail(format!("file: {}", config.naming.pattern)),
        Err(e) => CheckResult::fail(
            "naming",
            e.to_string(),
            "Fields: title, season, episode, year, resolution, ext",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preflight::CheckStatus;

    #[test]
    fn test_bad_regex_fails() {
        let mut config = Config::default();
        config.patterns.dir_season[0].pattern = "[".to_string();
        assert_eq!(check_patterns(&config).status, CheckStatus::Fail);
    }

    #[test]
    fn test_template_details() {
        let result = check_templates(&Config::default());
        assert_eq!(result.status, CheckStatus::Pass);
        assert_eq!(
            result.details,
            vec![
                "directory: {title}/Season {season:02d}".to_string(),
                "file: {title}.S{season:02d}.E{episode:02d}{ext}".to_string(),
            ]
        );
    }
}
