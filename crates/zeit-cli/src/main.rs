use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use zeit_cli::commands::{annotate, edit, import_git, status, track, verify};
use zeit_cli::{Cli, Commands, Config, ImportSource};
use zeit_core::SystemClock;

/// Load config and open the database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(zeit_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = zeit_db::Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let clock = SystemClock;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match &cli.command {
        Some(Commands::Start { name }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            track::start(&mut out, &mut db, &clock, name.as_deref())?;
        }
        Some(Commands::Stop) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            track::stop(&mut out, &mut db, &clock)?;
        }
        Some(Commands::Lunch) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            track::lunch(&mut out, &mut db, &clock)?;
        }
        Some(Commands::Add { name, time }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            track::add(&mut out, &mut db, &clock, name, time)?;
        }
        Some(Commands::Sub { name, note }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            annotate::sub(&mut out, &mut db, &clock, name, note.clone())?;
        }
        Some(Commands::Note { text }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            annotate::note(&mut out, &mut db, &clock, text)?;
        }
        Some(Commands::Status { day, json }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            status::run(&mut out, &db, &clock, day.resolve(&clock), *json)?;
        }
        Some(Commands::Verify { day }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            verify::run(&mut out, &db, day.resolve(&clock))?;
        }
        Some(Commands::Remove) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            edit::remove(&mut out, &mut db, &clock)?;
        }
        Some(Commands::Change { name }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            edit::change(&mut out, &mut db, &clock, name)?;
        }
        Some(Commands::Clear { day }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            edit::clear(&mut out, &mut db, day.resolve(&clock))?;
        }
        Some(Commands::Clean { day }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            edit::clean(&mut out, &mut db, day.resolve(&clock))?;
        }
        Some(Commands::Import { source }) => match source {
            ImportSource::Git {
                directory,
                since,
                author,
                limit,
                project,
                as_subtasks,
            } => {
                let (mut db, _config) = open_database(cli.config.as_deref())?;
                let options = import_git::GitImportOptions {
                    directory: directory.clone(),
                    since: since.clone(),
                    author: author.clone(),
                    limit: *limit,
                    project: project.clone(),
                    as_subtasks: *as_subtasks,
                };
                import_git::run(&mut out, &mut db, &options)?;
            }
        },
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
