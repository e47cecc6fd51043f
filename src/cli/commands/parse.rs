//! Parse command implementation.
//!
//! Shows how names would be parsed and where they would be placed,
//! without touching the file system.

use crate::core::parser::FilenameParser;
use crate::core::patterns::PatternSet;
use crate::core::planner::PathPlanner;
use crate::models::config::Config;
use crate::models::media::DirContext;
use crate::Result;
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;

/// Parse each name and print the result.
///
/// A name containing path separators uses its last two directories as
/// directory context.
pub fn parse(config: &Config, names: &[String]) -> Result<()> {
    let patterns = Arc::new(PatternSet::compile(&config.patterns, &config.cleanup)?);
    let parser = FilenameParser::new(patterns);
    let planner = PathPlanner::new(&config.naming, &config.paths.output_dir)?;

    for name in names {
        let path = Path::new(name);
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.clone());
        let ctx = context_from_path(path);

        println!("{}", name.bold());
        match parser.parse(&file_name, &ctx) {
            Some(info) => {
                println!("  {} {}", "Strategy:".bold(), info.strategy);
                println!("  {} {}", "Title:".bold(), info.title);
                println!("  {} {}", "Season:".bold(), info.season);
                println!("  {} {}", "Episode:".bold(), info.episode);
                if let Some(year) = info.year {
                    println!("  {} {}", "Year:".bold(), year);
                }
                if let Some(ref resolution) = info.resolution {
                    println!("  {} {}", "Resolution:".bold(), resolution);
                }
                match planner.relative_path(&info) {
                    Ok(rel) => println!("  {} {}", "Destination:".bold(), rel.display().to_string().green()),
                    Err(e) => println!("  {} {}", "Destination:".bold(), e.to_string().red()),
                }
            }
            None => println!("  {}", "[UNRESOLVED] no title/season/episode found".yellow()),
        }
        println!();
    }

    Ok(())
}

fn context_from_path(path: &Path) -> DirContext {
    let mut dirs = path
        .parent()
        .into_iter()
        .flat_map(|p| p.components())
        .filter_map(|c| match c {
            std::path::Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>();

    let immediate = dirs.pop();
    let parent = dirs.pop();
    DirContext { immediate, parent }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_from_path() {
        let ctx = context_from_path(Path::new("Breaking Bad/Season 2/e03.mkv"));
        assert_eq!(ctx.immediate.as_deref(), Some("Season 2"));
        assert_eq!(ctx.parent.as_deref(), Some("Breaking Bad"));

        assert_eq!(context_from_path(Path::new("e03.mkv")), DirContext::default());
    }
}
