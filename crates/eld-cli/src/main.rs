use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use eld_cli::commands::{amend, duty, export, init, log, reject, status};
use eld_cli::{Cli, Commands, Config, driver};
use eld_core::DriverId;

/// Load configuration for commands that need it.
fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

/// Open the configured database, ensuring the parent directory exists.
fn open_database(config: &Config) -> Result<eld_db::Database> {
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }
    eld_db::Database::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))
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

    match cli.command {
        Some(Commands::Init { driver, label }) => {
            init::run(&driver, label.as_deref())?;
        }
        Some(Commands::Duty {
            status,
            location,
            odometer,
            engine_hours,
            note,
        }) => {
            let config = load_config(cli.config.as_deref())?;
            let identity = driver::require_driver_identity()?;
            duty::run(
                &config,
                &identity,
                duty::DutyArgs {
                    status,
                    location,
                    odometer,
                    engine_hours,
                    note,
                },
            )?;
        }
        Some(Commands::Amend {
            status,
            from,
            to,
            horizon,
            location,
            odometer,
            engine_hours,
            note,
        }) => {
            let config = load_config(cli.config.as_deref())?;
            let identity = driver::require_driver_identity()?;
            amend::run(
                &config,
                &identity,
                amend::AmendArgs {
                    status,
                    from,
                    to,
                    horizon,
                    location,
                    odometer,
                    engine_hours,
                    note,
                },
            )?;
        }
        Some(Commands::Reject { event_id }) => {
            let config = load_config(cli.config.as_deref())?;
            let identity = driver::require_driver_identity()?;
            reject::run(&config, &identity, &event_id)?;
        }
        Some(Commands::Log { json }) => {
            let config = load_config(cli.config.as_deref())?;
            let identity = driver::require_driver_identity()?;
            let db = open_database(&config)?;
            let driver = DriverId::new(identity.driver_id.as_str())
                .context("driver identity is invalid")?;
            log::run(&mut std::io::stdout(), &db, &driver, json)?;
        }
        Some(Commands::Status) => {
            let config = load_config(cli.config.as_deref())?;
            let identity = driver::load_driver_identity()?;
            status::run(&mut std::io::stdout(), &config, identity.as_ref())?;
        }
        Some(Commands::Export) => {
            let config = load_config(cli.config.as_deref())?;
            export::run(&mut std::io::stdout(), &config)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
