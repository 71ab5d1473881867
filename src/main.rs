mod api;
mod cli;
mod config;
mod db;
mod streak;

use crate::cli::{Cli, Commands, ConfigCommands};
use crate::config::{Config, Deployment};
use crate::db::{Database, StoreError};
use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::Parser;
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();
    let serverless = cli.serverless;

    match cli.command {
        Commands::Serve { host, port } => {
            let mut config = load_config(serverless)?;
            if let Some(host) = host {
                config.api_host = host;
            }
            if let Some(port) = port {
                config.api_port = port;
            }
            run_service(config).await
        }
        Commands::Checkin { date, missed, note } => {
            handle_checkin(serverless, date, !missed, note.as_deref())
        }
        Commands::History { limit } => handle_history(serverless, limit),
        Commands::Streak => handle_streak(serverless),
        Commands::Config { command } => handle_config_command(command),
        Commands::Doctor => handle_doctor(serverless),
    }
}

async fn run_service(config: Config) -> Result<()> {
    let settings = config.settings();
    let _ = Database::open(&settings.db_path)?;

    let addr = SocketAddr::new(config.api_host, config.api_port);
    info!(deployment = ?config.deployment, "Streak Habits service started");

    api::run_server(addr, settings).await
}

fn handle_checkin(
    serverless: bool,
    date: Option<String>,
    completed: bool,
    note: Option<&str>,
) -> Result<()> {
    let config = load_config(serverless)?;
    let settings = config.settings();
    let date = parse_optional_date(date, || settings.clock.today())?;

    let database = Database::open(&settings.db_path)?;
    match database.insert_checkin(date, completed, note) {
        Ok(()) => {
            println!("Check-in saved: {date} (completed: {completed})");
            Ok(())
        }
        Err(StoreError::DuplicateDate(date)) => {
            let existing = database
                .checkin(date)?
                .map(|row| format!(" (completed: {})", row.completed))
                .unwrap_or_default();
            bail!("A check-in for {date} is already recorded{existing}")
        }
        Err(error) => Err(error).context("Failed to save check-in"),
    }
}

fn handle_history(serverless: bool, limit: Option<u32>) -> Result<()> {
    let settings = load_config(serverless)?.settings();
    let database = Database::open(&settings.db_path)?;
    let rows = database.recent_checkins(limit.unwrap_or(settings.list_limit))?;

    if rows.is_empty() {
        println!("No check-ins recorded yet");
        return Ok(());
    }

    for row in rows {
        let mark = if row.completed { "x" } else { " " };
        if row.note.is_empty() {
            println!("[{mark}] {}", row.date);
        } else {
            println!("[{mark}] {}  {}", row.date, row.note);
        }
    }

    Ok(())
}

fn handle_streak(serverless: bool) -> Result<()> {
    let settings = load_config(serverless)?.settings();
    let database = Database::open(&settings.db_path)?;
    let completed = database.completed_dates_desc()?;
    let stats = streak::compute_streaks(&completed, settings.clock.today());

    println!("Current streak: {} day(s)", stats.current_streak);
    println!("Best streak: {} day(s)", stats.best_streak);

    Ok(())
}

fn handle_config_command(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Set { key, value } => {
            let mut config = Config::load_or_default()?;
            config.set_value(&key, &value)?;
            config.save()?;

            println!("Config saved: {key} = {value}");
            Ok(())
        }
        ConfigCommands::Get { key } => {
            let config = Config::load_or_default()?;
            let value = config
                .get_value(&key)
                .with_context(|| format!("Unsupported config key: {key}"))?;

            println!("{value}");
            Ok(())
        }
    }
}

fn handle_doctor(serverless: bool) -> Result<()> {
    let config_path = Config::config_path()?;
    let mut issues = Vec::new();

    if config_path.exists() {
        println!("[OK] config.json found: {}", config_path.display());
    } else {
        println!("[WARN] config.json not found: {}", config_path.display());
        issues.push("config missing");
    }

    let config = load_config(serverless)?;
    let settings = config.settings();
    println!("[OK] deployment: {:?}", config.deployment);

    match Database::open(&settings.db_path) {
        Ok(_) => println!("[OK] SQLite reachable: {}", settings.db_path.display()),
        Err(error) => {
            println!("[WARN] SQLite check failed: {error:#}");
            issues.push("db unreachable");
        }
    }

    if settings.serve_static {
        println!("[OK] landing page served at /");
    } else {
        println!("[OK] landing page disabled");
    }

    if issues.is_empty() {
        println!("doctor result: no issues");
    } else {
        println!("doctor result: {} warning(s)", issues.len());
    }

    Ok(())
}

fn parse_optional_date(
    input: Option<String>,
    today: impl FnOnce() -> NaiveDate,
) -> Result<NaiveDate> {
    input
        .as_deref()
        .map(|date| {
            streak::parse_day(date)
                .with_context(|| format!("Invalid date format: {date}. Example: 2024-01-05"))
        })
        .transpose()?
        .map_or_else(|| Ok(today()), Ok)
}

/// A missing config file falls back to defaults without writing one.
fn load_config(serverless: bool) -> Result<Config> {
    let config_path = Config::config_path()?;
    let mut config = if config_path.exists() {
        Config::load_from(&config_path)?
    } else {
        Config::default()
    };

    if serverless {
        config.deployment = Deployment::Serverless;
    }

    Ok(config)
}
