//! TV Show Renamer CLI
//!
//! A command-line tool for renaming and reorganizing TV episode files.

use clap::Parser;
use tvshow_renamer::cli::{
    args::{Cli, Commands},
    commands::{init, parse, run, undo},
};
use tvshow_renamer::models::config::{load_config, Config};
use tvshow_renamer::preflight;
use tvshow_renamer::utils::logging::{self, LogOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Config first: it names the log directory
    let config = match cli.command {
        Commands::InitConfig { .. } => None,
        _ => Some(load_config(cli.config.as_deref())?),
    };

    let mut log_options = LogOptions {
        verbose: cli.verbose,
        json_console: cli.log_json,
        log_dir: None,
    };
    if let Some(config) = &config {
        log_options = log_options.with_log_dir(&config.paths.log_dir);
    }
    let _log_guards = logging::init(&log_options)?;

    // Run the appropriate command
    match cli.command {
        Commands::Run {
            execute,
            preview,
            yes,
            source,
            output,
            backup,
            parallel,
            sequential,
            workers,
            report,
            report_json,
        } => {
            let options = run::RunOptions {
                execute,
                preview,
                yes,
                source,
                output,
                backup,
                parallel,
                sequential,
                workers,
                report,
                report_json,
            };
            let mut config = config.unwrap_or_default();
            options.apply(&mut config);

            if !cli.skip_preflight {
                run_preflight_checks(&config)?;
            }
            run::run(config, &options).await?;
        }

        Commands::Undo { count, yes } => {
            let config = config.unwrap_or_default();
            undo::undo(&config, count, yes).await?;
        }

        Commands::Parse { names } => {
            let config = config.unwrap_or_default();
            parse::parse(&config, &names)?;
        }

        Commands::Check => {
            let config = config.unwrap_or_default();
            run_preflight_checks(&config)?;
        }

        Commands::InitConfig { path, force } => {
            init::init_config(path.as_deref(), force)?;
        }
    }

    Ok(())
}

/// Run preflight checks and exit if any fail.
fn run_preflight_checks(config: &Config) -> anyhow::Result<()> {
    use colored::Colorize;

    println!("{}", "Running preflight checks...".bold());
    println!();

    let report = preflight::run_preflight_checks(config);
    report.print();

    println!();

    if !report.passed() {
        anyhow::bail!("Preflight checks failed. Fix the issues above and try again.");
    }

    Ok(())
}
