//! Init-config command implementation.

use crate::models::config::{default_config_path, save_config, Config};
use crate::Result;
use colored::Colorize;
use std::path::Path;

/// Write the default configuration document.
pub fn init_config(path: Option<&Path>, force: bool) -> Result<()> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(default_config_path);

    if path.exists() && !force {
        return Err(crate::Error::DestinationExists(format!(
            "{} (use --force to overwrite)",
            path.display()
        )));
    }

    save_config(&Config::default(), &path)?;
    println!(
        "{} {}",
        "[OK] Configuration written to:".bold().green(),
        path.display()
    );
    println!();
    println!("{}", "[Next Steps]".bold().yellow());
    println!("  Set paths.source_dir and paths.output_dir, then preview with:");
    println!("     {}", "tvshow-renamer run".bold());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_config_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        init_config(Some(&path), false).unwrap();
        let written: Config = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.naming.pattern, Config::default().naming.pattern);

        assert!(init_config(Some(&path), false).is_err());
        assert!(init_config(Some(&path), true).is_ok());
    }
}
